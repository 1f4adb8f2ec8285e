//! Direct3D 11: the device, its immediate context and the resources it creates.

use log::{debug, info};
use windows::Win32::Foundation::HINSTANCE;
use windows::Win32::Graphics::Direct3D::{
    ID3DBlob, D3D_DRIVER_TYPE, D3D_DRIVER_TYPE_HARDWARE, D3D_DRIVER_TYPE_REFERENCE,
    D3D_DRIVER_TYPE_UNKNOWN, D3D_DRIVER_TYPE_WARP, D3D_FEATURE_LEVEL, D3D_FEATURE_LEVEL_11_0,
    D3D_PRIMITIVE_TOPOLOGY, D3D11_SRV_DIMENSION_TEXTURE2D,
};
use windows::Win32::Graphics::Direct3D11::{
    D3D11CreateDevice, ID3D11Buffer, ID3D11ComputeShader, ID3D11DepthStencilView, ID3D11Device,
    ID3D11DeviceContext, ID3D11DomainShader, ID3D11GeometryShader, ID3D11HullShader,
    ID3D11InputLayout, ID3D11PixelShader, ID3D11RenderTargetView, ID3D11ShaderResourceView,
    ID3D11Texture2D, ID3D11VertexShader, D3D11_BIND_DEPTH_STENCIL, D3D11_BIND_FLAG,
    D3D11_BIND_SHADER_RESOURCE, D3D11_BIND_VERTEX_BUFFER, D3D11_BUFFER_DESC, D3D11_CLEAR_DEPTH,
    D3D11_CLEAR_FLAG, D3D11_CLEAR_STENCIL, D3D11_CPU_ACCESS_FLAG, D3D11_CREATE_DEVICE_BGRA_SUPPORT,
    D3D11_CREATE_DEVICE_DEBUG, D3D11_CREATE_DEVICE_FLAG, D3D11_DEPTH_STENCIL_VIEW_DESC,
    D3D11_DSV_DIMENSION_TEXTURE2D, D3D11_DSV_DIMENSION_TEXTURE2DMS, D3D11_INPUT_ELEMENT_DESC,
    D3D11_SDK_VERSION, D3D11_SHADER_RESOURCE_VIEW_DESC, D3D11_SHADER_RESOURCE_VIEW_DESC_0,
    D3D11_SUBRESOURCE_DATA, D3D11_TEX2D_SRV, D3D11_TEXTURE2D_DESC, D3D11_USAGE,
    D3D11_USAGE_DEFAULT, D3D11_VIEWPORT,
};
use windows::Win32::Graphics::Dxgi::Common::{
    DXGI_FORMAT, DXGI_FORMAT_B8G8R8A8_UNORM, DXGI_FORMAT_D24_UNORM_S8_UINT,
    DXGI_FORMAT_D32_FLOAT, DXGI_FORMAT_R16_UINT, DXGI_FORMAT_R32G32B32A32_FLOAT,
    DXGI_FORMAT_R32_FLOAT, DXGI_FORMAT_R32_UINT, DXGI_FORMAT_R8G8B8A8_UNORM, DXGI_FORMAT_R8_UNORM,
    DXGI_SAMPLE_DESC,
};
use windows::Win32::Graphics::Dxgi::IDXGIDevice;

use crate::common::Dimensions;
use crate::dxgi;
use crate::error::{codes, NativeError, Result};
use crate::handle::{adopt, com_wrapper, sealed, try_adopt, Com};

com_wrapper! {
    /// Compiled shader bytecode produced by an external compiler.
    pub struct Blob(ID3DBlob);
}

com_wrapper! {
    pub struct Texture2D(ID3D11Texture2D);
}

com_wrapper! {
    pub struct RenderTargetView(ID3D11RenderTargetView);
}

com_wrapper! {
    pub struct DepthStencilView(ID3D11DepthStencilView);
}

com_wrapper! {
    pub struct ShaderResourceView(ID3D11ShaderResourceView);
}

com_wrapper! {
    pub struct Buffer(ID3D11Buffer);
}

com_wrapper! {
    pub struct InputLayout(ID3D11InputLayout);
}

com_wrapper! {
    pub struct VertexShader(ID3D11VertexShader);
}

com_wrapper! {
    pub struct HullShader(ID3D11HullShader);
}

com_wrapper! {
    pub struct DomainShader(ID3D11DomainShader);
}

com_wrapper! {
    pub struct GeometryShader(ID3D11GeometryShader);
}

com_wrapper! {
    pub struct PixelShader(ID3D11PixelShader);
}

com_wrapper! {
    pub struct ComputeShader(ID3D11ComputeShader);
}

com_wrapper! {
    pub struct DeviceContext(ID3D11DeviceContext);
}

static_assertions::assert_eq_size!(Texture2D, *const ());

/// Shader bytecode, accepted as opaque bytes.
pub trait Bytecode {
    fn bytecode(&self) -> &[u8];
}

impl Bytecode for [u8] {
    fn bytecode(&self) -> &[u8] {
        self
    }
}

impl<const N: usize> Bytecode for [u8; N] {
    fn bytecode(&self) -> &[u8] {
        self
    }
}

impl Bytecode for Vec<u8> {
    fn bytecode(&self) -> &[u8] {
        self
    }
}

impl Bytecode for Blob {
    fn bytecode(&self) -> &[u8] {
        match self.raw() {
            Some(blob) => unsafe {
                let len = blob.GetBufferSize();
                if len == 0 {
                    &[]
                } else {
                    std::slice::from_raw_parts(blob.GetBufferPointer().cast::<u8>(), len)
                }
            },
            None => &[],
        }
    }
}

impl Texture2D {
    pub fn desc(&self) -> Result<D3D11_TEXTURE2D_DESC> {
        let mut desc = D3D11_TEXTURE2D_DESC::default();
        unsafe { self.get()?.GetDesc(&mut desc) };
        Ok(desc)
    }

    pub fn dimensions(&self) -> Result<Dimensions> {
        Ok(self.desc()?.into())
    }

    pub fn width(&self) -> Result<u32> {
        Ok(self.desc()?.Width)
    }

    pub fn height(&self) -> Result<u32> {
        Ok(self.desc()?.Height)
    }
}

/// Description of a 2D texture. Unset fields stay zeroed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureDesc {
    pub dimensions: Dimensions,
    pub mip_levels: u32,
    pub array_size: u32,
    pub format: DXGI_FORMAT,
    pub sample_count: u32,
    pub sample_quality: u32,
    pub usage: D3D11_USAGE,
    pub bind: D3D11_BIND_FLAG,
    pub cpu_access: D3D11_CPU_ACCESS_FLAG,
}

impl TextureDesc {
    /// A single-mip, single-sample RGBA texture usable as a shader resource.
    pub fn new(dimensions: Dimensions) -> TextureDesc {
        TextureDesc {
            dimensions,
            mip_levels: 1,
            array_size: 1,
            format: DXGI_FORMAT_R8G8B8A8_UNORM,
            sample_count: 1,
            sample_quality: 0,
            usage: D3D11_USAGE_DEFAULT,
            bind: D3D11_BIND_SHADER_RESOURCE,
            cpu_access: D3D11_CPU_ACCESS_FLAG(0),
        }
    }

    /// A 24-bit depth, 8-bit stencil buffer.
    pub fn depth_stencil(dimensions: Dimensions) -> TextureDesc {
        TextureDesc::new(dimensions)
            .format(DXGI_FORMAT_D24_UNORM_S8_UINT)
            .bind(D3D11_BIND_DEPTH_STENCIL)
    }

    pub fn format(mut self, format: DXGI_FORMAT) -> TextureDesc {
        self.format = format;
        self
    }

    pub fn bind(mut self, bind: D3D11_BIND_FLAG) -> TextureDesc {
        self.bind = bind;
        self
    }

    pub fn usage(mut self, usage: D3D11_USAGE, cpu_access: D3D11_CPU_ACCESS_FLAG) -> TextureDesc {
        self.usage = usage;
        self.cpu_access = cpu_access;
        self
    }

    pub fn mips(mut self, mip_levels: u32, array_size: u32) -> TextureDesc {
        self.mip_levels = mip_levels;
        self.array_size = array_size;
        self
    }

    pub fn samples(mut self, count: u32, quality: u32) -> TextureDesc {
        self.sample_count = count;
        self.sample_quality = quality;
        self
    }
}

impl From<&TextureDesc> for D3D11_TEXTURE2D_DESC {
    fn from(desc: &TextureDesc) -> Self {
        D3D11_TEXTURE2D_DESC {
            Width: desc.dimensions.width,
            Height: desc.dimensions.height,
            MipLevels: desc.mip_levels,
            ArraySize: desc.array_size,
            Format: desc.format,
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: desc.sample_count,
                Quality: desc.sample_quality,
            },
            Usage: desc.usage,
            BindFlags: desc.bind,
            CPUAccessFlags: desc.cpu_access,
            ..Default::default()
        }
    }
}

/// Description of a buffer. The byte width comes from the initial data.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BufferDesc {
    pub stride: u32,
    pub usage: D3D11_USAGE,
    pub bind: D3D11_BIND_FLAG,
    pub cpu_access: D3D11_CPU_ACCESS_FLAG,
}

impl Default for BufferDesc {
    fn default() -> Self {
        BufferDesc {
            stride: 0,
            usage: D3D11_USAGE_DEFAULT,
            bind: D3D11_BIND_VERTEX_BUFFER,
            cpu_access: D3D11_CPU_ACCESS_FLAG(0),
        }
    }
}

impl BufferDesc {
    fn to_native(self, byte_width: u32) -> D3D11_BUFFER_DESC {
        D3D11_BUFFER_DESC {
            ByteWidth: byte_width,
            Usage: self.usage,
            BindFlags: self.bind,
            CPUAccessFlags: self.cpu_access,
            StructureByteStride: self.stride,
            ..Default::default()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Covers `width` x `height` from the origin over the full depth range.
    pub const fn new(width: f32, height: f32) -> Viewport {
        Viewport {
            x: 0.0,
            y: 0.0,
            width,
            height,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

impl From<Viewport> for D3D11_VIEWPORT {
    fn from(vp: Viewport) -> Self {
        D3D11_VIEWPORT {
            TopLeftX: vp.x,
            TopLeftY: vp.y,
            Width: vp.width,
            Height: vp.height,
            MinDepth: vp.min_depth,
            MaxDepth: vp.max_depth,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexFormat {
    U16,
    U32,
}

impl From<IndexFormat> for DXGI_FORMAT {
    fn from(format: IndexFormat) -> Self {
        match format {
            IndexFormat::U16 => DXGI_FORMAT_R16_UINT,
            IndexFormat::U32 => DXGI_FORMAT_R32_UINT,
        }
    }
}

/// Bytes per texel for the uncompressed formats `update_subresource` accepts.
fn texel_size(format: DXGI_FORMAT) -> Option<u32> {
    match format {
        DXGI_FORMAT_R8_UNORM => Some(1),
        DXGI_FORMAT_R8G8B8A8_UNORM
        | DXGI_FORMAT_B8G8R8A8_UNORM
        | DXGI_FORMAT_R32_FLOAT
        | DXGI_FORMAT_D32_FLOAT
        | DXGI_FORMAT_D24_UNORM_S8_UINT => Some(4),
        DXGI_FORMAT_R32G32B32A32_FLOAT => Some(16),
        _ => None,
    }
}

/// Row and slice pitch of a tightly packed mip, refusing sizes that do not fit
/// the `u32` pitches the API takes.
fn subresource_pitches(width: u32, height: u32, texel: u32) -> Result<(u32, u32)> {
    width
        .checked_mul(texel)
        .and_then(|row| Some((row, row.checked_mul(height)?)))
        .ok_or_else(|| {
            NativeError::with_message(
                codes::E_INVALIDARG,
                format!("{}x{} texels of {} bytes overflow the pitch", width, height, texel),
            )
        })
}

impl DeviceContext {
    /// Unbinds every render target and the depth-stencil target.
    pub fn unbind_render_targets(&self) {
        if let Some(context) = self.raw() {
            unsafe { context.OMSetRenderTargets(&[], None) };
        }
    }

    pub fn set_render_target(&self, rtv: &RenderTargetView, dsv: &DepthStencilView) {
        if let Some(context) = self.raw() {
            unsafe { context.OMSetRenderTargets(&[rtv.raw().cloned()], dsv.raw()) };
        }
    }

    pub fn set_render_targets(&self, rtvs: &[RenderTargetView], dsv: &DepthStencilView) {
        if let Some(context) = self.raw() {
            let views: Vec<_> = rtvs.iter().map(|rtv| rtv.raw().cloned()).collect();
            unsafe { context.OMSetRenderTargets(&views, dsv.raw()) };
        }
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.set_viewports(&[viewport]);
    }

    pub fn set_viewport_size(&self, width: f32, height: f32) {
        self.set_viewport(Viewport::new(width, height));
    }

    pub fn set_viewports(&self, viewports: &[Viewport]) {
        if let Some(context) = self.raw() {
            let viewports: Vec<D3D11_VIEWPORT> = viewports.iter().map(|&vp| vp.into()).collect();
            unsafe { context.RSSetViewports(&viewports) };
        }
    }

    pub fn clear_render_target_view(&self, rtv: &RenderTargetView, rgba: [f32; 4]) {
        if let (Some(context), Some(rtv)) = (self.raw(), rtv.raw()) {
            unsafe { context.ClearRenderTargetView(rtv, rgba.as_ptr()) };
        }
    }

    pub fn clear_depth_stencil_view(
        &self,
        dsv: &DepthStencilView,
        flags: D3D11_CLEAR_FLAG,
        depth: f32,
        stencil: u8,
    ) {
        if let (Some(context), Some(dsv)) = (self.raw(), dsv.raw()) {
            unsafe { context.ClearDepthStencilView(dsv, flags.0 as u32, depth, stencil) };
        }
    }

    pub fn clear_depth_stencil(
        &self,
        dsv: &DepthStencilView,
        depth: f32,
        stencil: u8,
        clear_depth: bool,
        clear_stencil: bool,
    ) {
        let mut flags = D3D11_CLEAR_FLAG(0);
        if clear_depth {
            flags.0 |= D3D11_CLEAR_DEPTH.0;
        }
        if clear_stencil {
            flags.0 |= D3D11_CLEAR_STENCIL.0;
        }
        self.clear_depth_stencil_view(dsv, flags, depth, stencil);
    }

    /// Replaces the first mip of `texture` with tightly packed rows from `data`.
    pub fn update_subresource(&self, texture: &Texture2D, data: &[u8]) -> Result<()> {
        let desc = texture.desc()?;
        let texel = texel_size(desc.Format).ok_or_else(|| {
            NativeError::with_message(codes::E_INVALIDARG, "texture format has no fixed texel size")
        })?;
        let (row_pitch, depth_pitch) = subresource_pitches(desc.Width, desc.Height, texel)?;
        if data.len() < depth_pitch as usize {
            return Err(NativeError::with_message(
                codes::E_INVALIDARG,
                format!("expected {} bytes of texel data, got {}", depth_pitch, data.len()),
            ));
        }
        unsafe {
            self.get()?.UpdateSubresource(
                texture.get()?,
                0,
                None,
                data.as_ptr().cast(),
                row_pitch,
                depth_pitch,
            )
        };
        Ok(())
    }

    pub fn set_input_layout(&self, layout: &InputLayout) {
        if let Some(context) = self.raw() {
            unsafe { context.IASetInputLayout(layout.raw()) };
        }
    }

    pub fn set_vertex_buffer(&self, buffer: &Buffer, stride: u32, offset: u32) {
        if let Some(context) = self.raw() {
            unsafe { context.IASetVertexBuffers(0, 1, &buffer.raw().cloned(), &stride, &offset) };
        }
    }

    pub fn set_index_buffer(&self, buffer: &Buffer, format: IndexFormat, offset: u32) {
        if let Some(context) = self.raw() {
            unsafe { context.IASetIndexBuffer(buffer.raw(), format.into(), offset) };
        }
    }

    pub fn set_primitive_topology(&self, topology: D3D_PRIMITIVE_TOPOLOGY) {
        if let Some(context) = self.raw() {
            unsafe { context.IASetPrimitiveTopology(topology) };
        }
    }

    /// Binds `shader` to the pipeline stage matching its type.
    pub fn set_shader<S: Shader>(&self, shader: &S) {
        if let Some(context) = self.raw() {
            shader.bind(context);
        }
    }

    pub fn draw(&self, vertex_count: u32, start_vertex: u32) {
        if let Some(context) = self.raw() {
            unsafe { context.Draw(vertex_count, start_vertex) };
        }
    }

    pub fn draw_indexed(&self, index_count: u32, start_index: u32, base_vertex: i32) {
        if let Some(context) = self.raw() {
            unsafe { context.DrawIndexed(index_count, start_index, base_vertex) };
        }
    }
}

/// Views a [`Device`] can create over a [`Texture2D`].
pub trait TextureView: sealed::Sealed + Sized {
    #[doc(hidden)]
    fn create(device: &ID3D11Device, texture: &Texture2D) -> Result<Self>;
}

impl sealed::Sealed for RenderTargetView {}

impl TextureView for RenderTargetView {
    fn create(device: &ID3D11Device, texture: &Texture2D) -> Result<Self> {
        let view = unsafe { device.CreateRenderTargetView(texture.get()?, None)? };
        Ok(adopt(view))
    }
}

impl sealed::Sealed for DepthStencilView {}

impl TextureView for DepthStencilView {
    fn create(device: &ID3D11Device, texture: &Texture2D) -> Result<Self> {
        let desc = texture.desc()?;
        let view_desc = D3D11_DEPTH_STENCIL_VIEW_DESC {
            Format: desc.Format,
            ViewDimension: if desc.SampleDesc.Count > 1 {
                D3D11_DSV_DIMENSION_TEXTURE2DMS
            } else {
                D3D11_DSV_DIMENSION_TEXTURE2D
            },
            ..Default::default()
        };
        let view = unsafe { device.CreateDepthStencilView(texture.get()?, Some(&view_desc))? };
        Ok(adopt(view))
    }
}

impl sealed::Sealed for ShaderResourceView {}

impl TextureView for ShaderResourceView {
    fn create(device: &ID3D11Device, texture: &Texture2D) -> Result<Self> {
        let desc = texture.desc()?;
        let view_desc = D3D11_SHADER_RESOURCE_VIEW_DESC {
            Format: desc.Format,
            ViewDimension: D3D11_SRV_DIMENSION_TEXTURE2D,
            Anonymous: D3D11_SHADER_RESOURCE_VIEW_DESC_0 {
                Texture2D: D3D11_TEX2D_SRV {
                    MostDetailedMip: 0,
                    MipLevels: desc.MipLevels,
                },
            },
        };
        let view = unsafe { device.CreateShaderResourceView(texture.get()?, Some(&view_desc))? };
        Ok(adopt(view))
    }
}

/// The six programmable stages: created from bytecode, bound on a context.
pub trait Shader: sealed::Sealed + Sized {
    #[doc(hidden)]
    fn create(device: &ID3D11Device, bytecode: &[u8]) -> Result<Self>;
    #[doc(hidden)]
    fn bind(&self, context: &ID3D11DeviceContext);
}

macro_rules! shader_stage {
    ($name:ident, $create:ident, $set:ident) => {
        impl sealed::Sealed for $name {}

        impl Shader for $name {
            fn create(device: &ID3D11Device, bytecode: &[u8]) -> Result<Self> {
                let shader = unsafe { device.$create(bytecode, None)? };
                Ok(adopt(shader))
            }

            fn bind(&self, context: &ID3D11DeviceContext) {
                unsafe { context.$set(self.raw(), &[]) };
            }
        }
    };
}

shader_stage!(VertexShader, CreateVertexShader, VSSetShader);
shader_stage!(HullShader, CreateHullShader, HSSetShader);
shader_stage!(DomainShader, CreateDomainShader, DSSetShader);
shader_stage!(GeometryShader, CreateGeometryShader, GSSetShader);
shader_stage!(PixelShader, CreatePixelShader, PSSetShader);
shader_stage!(ComputeShader, CreateComputeShader, CSSetShader);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DriverType {
    #[default]
    Hardware,
    /// The WARP software rasterizer.
    Warp,
    /// The reference rasterizer; needs the SDK layers installed.
    Reference,
}

impl From<DriverType> for D3D_DRIVER_TYPE {
    fn from(driver: DriverType) -> Self {
        match driver {
            DriverType::Hardware => D3D_DRIVER_TYPE_HARDWARE,
            DriverType::Warp => D3D_DRIVER_TYPE_WARP,
            DriverType::Reference => D3D_DRIVER_TYPE_REFERENCE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceOptions {
    pub driver: DriverType,
    pub debug_layer: bool,
    /// Needed for Direct2D interop.
    pub bgra_support: bool,
}

impl Default for DeviceOptions {
    fn default() -> Self {
        DeviceOptions {
            driver: DriverType::Hardware,
            debug_layer: false,
            bgra_support: true,
        }
    }
}

impl DeviceOptions {
    fn flags(&self) -> D3D11_CREATE_DEVICE_FLAG {
        let mut flags = D3D11_CREATE_DEVICE_FLAG(0);
        if self.bgra_support {
            flags |= D3D11_CREATE_DEVICE_BGRA_SUPPORT;
        }
        if self.debug_layer {
            flags |= D3D11_CREATE_DEVICE_DEBUG;
        }
        flags
    }
}

/// Objects a [`Device`] converts into by interface query.
pub trait DeviceCast: sealed::Sealed + Sized {
    #[doc(hidden)]
    fn cast(device: &Com<ID3D11Device>) -> Result<Self>;
}

impl DeviceCast for dxgi::Device {
    fn cast(device: &Com<ID3D11Device>) -> Result<Self> {
        Ok(device.cast::<IDXGIDevice>()?.into())
    }
}

/// A Direct3D device together with its immediate context.
///
/// Both fields own their handle independently, so clone, take and release act
/// on each of them in turn.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct Device {
    device: Com<ID3D11Device>,
    context: DeviceContext,
}

impl Device {
    /// Wraps an existing device and fetches its immediate context.
    pub fn from_raw(device: ID3D11Device) -> Device {
        let mut context = None;
        unsafe { device.GetImmediateContext(&mut context) };
        Device {
            device: Com::adopt(device),
            context: DeviceContext::from(Com::<ID3D11DeviceContext>::from(context)),
        }
    }

    pub fn create(options: DeviceOptions) -> Result<Device> {
        Device::create_on(None, options)
    }

    /// A hardware device on the default adapter.
    pub fn create_default() -> Result<Device> {
        Device::create(DeviceOptions::default())
    }

    pub fn create_warp() -> Result<Device> {
        Device::create(DeviceOptions {
            driver: DriverType::Warp,
            ..Default::default()
        })
    }

    /// A device on a specific adapter. The driver type in `options` is ignored.
    pub fn from_adapter(adapter: &dxgi::Adapter, options: DeviceOptions) -> Result<Device> {
        Device::create_on(Some(adapter), options)
    }

    fn create_on(adapter: Option<&dxgi::Adapter>, options: DeviceOptions) -> Result<Device> {
        let mut device = None;
        let mut context = None;
        let mut feature_level = D3D_FEATURE_LEVEL_11_0;
        unsafe {
            match adapter {
                Some(adapter) => D3D11CreateDevice(
                    adapter.get()?,
                    D3D_DRIVER_TYPE_UNKNOWN,
                    HINSTANCE::default(),
                    options.flags(),
                    &[],
                    D3D11_SDK_VERSION,
                    &mut device,
                    &mut feature_level,
                    &mut context,
                )?,
                None => D3D11CreateDevice(
                    None,
                    options.driver.into(),
                    HINSTANCE::default(),
                    options.flags(),
                    &[],
                    D3D11_SDK_VERSION,
                    &mut device,
                    &mut feature_level,
                    &mut context,
                )?,
            }
        };
        info!(
            "[d3d11] device created ({:?}, feature level {:#x})",
            options.driver, feature_level.0
        );
        Ok(Device {
            device: try_adopt(device)?,
            context: try_adopt(context)?,
        })
    }

    pub fn is_valid(&self) -> bool {
        self.device.is_valid()
    }

    pub fn raw(&self) -> Option<&ID3D11Device> {
        self.device.raw()
    }

    pub fn get(&self) -> Result<&ID3D11Device> {
        self.device.get()
    }

    /// Releases the device and its context. Idempotent.
    pub fn release(&mut self) {
        self.context.release();
        self.device.release();
    }

    pub fn take(&mut self) -> Device {
        Device {
            device: self.device.take(),
            context: self.context.take(),
        }
    }

    pub fn immediate_context(&self) -> &DeviceContext {
        &self.context
    }

    pub fn immediate_context_mut(&mut self) -> &mut DeviceContext {
        &mut self.context
    }

    /// Converts into another interface of the same device, e.g. [`dxgi::Device`].
    pub fn as_<T: DeviceCast>(&self) -> Result<T> {
        T::cast(&self.device)
    }

    pub fn feature_level(&self) -> Result<D3D_FEATURE_LEVEL> {
        Ok(unsafe { self.get()?.GetFeatureLevel() })
    }

    /// Creates a buffer initialised with `data`.
    pub fn create_buffer<T: Copy>(&self, data: &[T], desc: BufferDesc) -> Result<Buffer> {
        let byte_width = u32::try_from(std::mem::size_of_val(data)).map_err(|_| {
            NativeError::with_message(codes::E_INVALIDARG, "buffer data exceeds 4 GiB")
        })?;
        let init = D3D11_SUBRESOURCE_DATA {
            pSysMem: data.as_ptr().cast(),
            SysMemPitch: 0,
            SysMemSlicePitch: 0,
        };
        let native = desc.to_native(byte_width);
        let initial = if data.is_empty() { None } else { Some(&init) };
        let buffer = unsafe { self.get()?.CreateBuffer(&native, initial)? };
        debug!("[d3d11] buffer created ({} bytes)", byte_width);
        Ok(adopt(buffer))
    }

    /// Creates an uninitialised buffer of `byte_width` bytes.
    pub fn create_empty_buffer(&self, byte_width: u32, desc: BufferDesc) -> Result<Buffer> {
        let native = desc.to_native(byte_width);
        let buffer = unsafe { self.get()?.CreateBuffer(&native, None)? };
        Ok(adopt(buffer))
    }

    pub fn create_texture2d(&self, desc: &TextureDesc) -> Result<Texture2D> {
        let native: D3D11_TEXTURE2D_DESC = desc.into();
        let texture = unsafe { self.get()?.CreateTexture2D(&native, None)? };
        debug!(
            "[d3d11] texture created ({}x{}, {:?})",
            desc.dimensions.width, desc.dimensions.height, desc.format
        );
        Ok(adopt(texture))
    }

    /// Creates a render-target, depth-stencil or shader-resource view over `texture`.
    pub fn create_view<V: TextureView>(&self, texture: &Texture2D) -> Result<V> {
        V::create(self.get()?, texture)
    }

    pub fn create_shader<S: Shader>(&self, bytecode: &(impl Bytecode + ?Sized)) -> Result<S> {
        S::create(self.get()?, bytecode.bytecode())
    }

    pub fn create_input_layout(
        &self,
        layout: &[D3D11_INPUT_ELEMENT_DESC],
        bytecode: &(impl Bytecode + ?Sized),
    ) -> Result<InputLayout> {
        let input_layout = unsafe {
            self.get()?
                .CreateInputLayout(layout, bytecode.bytecode())?
        };
        Ok(adopt(input_layout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use windows::Win32::Graphics::Dxgi::Common::DXGI_FORMAT_UNKNOWN;

    #[test]
    fn pitches_for_packed_rgba() {
        assert_eq!(subresource_pitches(4, 4, 4).unwrap(), (16, 64));
        assert_eq!(subresource_pitches(16384, 1, 16).unwrap(), (262144, 262144));
    }

    #[test]
    fn largest_float4_texture_overflows_the_slice_pitch() {
        let err = subresource_pitches(16384, 16384, 16).unwrap_err();
        assert_eq!(err.code(), codes::E_INVALIDARG);
    }

    #[test]
    fn oversized_row_is_rejected() {
        assert!(subresource_pitches(u32::MAX, 1, 4).is_err());
    }

    #[test]
    fn texel_sizes() {
        assert_eq!(texel_size(DXGI_FORMAT_R8_UNORM), Some(1));
        assert_eq!(texel_size(DXGI_FORMAT_D24_UNORM_S8_UINT), Some(4));
        assert_eq!(texel_size(DXGI_FORMAT_R32G32B32A32_FLOAT), Some(16));
        assert_eq!(texel_size(DXGI_FORMAT_UNKNOWN), None);
    }
}
