//! DXGI: factory, adapters, swap chains and their surfaces.

use log::{debug, info};
use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Direct3D11::ID3D11Texture2D;
use windows::Win32::Graphics::Dxgi::Common::{
    DXGI_FORMAT, DXGI_FORMAT_R8G8B8A8_UNORM, DXGI_FORMAT_UNKNOWN, DXGI_MODE_DESC,
    DXGI_MODE_SCALING_UNSPECIFIED, DXGI_MODE_SCANLINE_ORDER_UNSPECIFIED, DXGI_RATIONAL,
    DXGI_SAMPLE_DESC,
};
use windows::Win32::Graphics::Dxgi::{
    CreateDXGIFactory, IDXGIAdapter, IDXGIDevice, IDXGIFactory, IDXGISurface, IDXGISwapChain,
    DXGI_ERROR_NOT_FOUND, DXGI_SWAP_CHAIN_DESC, DXGI_SWAP_EFFECT_DISCARD,
    DXGI_USAGE_RENDER_TARGET_OUTPUT,
};

use crate::common::Dimensions;
use crate::d3d11;
use crate::error::{check, codes, Result};
use crate::handle::{adopt, com_wrapper, sealed, try_adopt};

com_wrapper! {
    pub struct Factory(IDXGIFactory);
}

com_wrapper! {
    pub struct Adapter(IDXGIAdapter);
}

com_wrapper! {
    /// The DXGI face of a Direct3D device.
    pub struct Device(IDXGIDevice);
}

com_wrapper! {
    pub struct Surface(IDXGISurface);
}

com_wrapper! {
    pub struct SwapChain(IDXGISwapChain);
}

impl Factory {
    pub fn create() -> Result<Factory> {
        let factory: IDXGIFactory = unsafe { CreateDXGIFactory()? };
        debug!("[dxgi] factory created");
        Ok(adopt(factory))
    }

    /// Every adapter in enumeration order. The first is the default adapter.
    pub fn adapters(&self) -> Result<Vec<Adapter>> {
        let factory = self.get()?;
        let mut adapters = Vec::new();
        for index in 0u32.. {
            match unsafe { factory.EnumAdapters(index) } {
                Ok(adapter) => adapters.push(adopt(adapter)),
                Err(e) if e.code() == DXGI_ERROR_NOT_FOUND => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(adapters)
    }

    pub fn default_adapter(&self) -> Result<Adapter> {
        let adapter = unsafe { self.get()?.EnumAdapters(0)? };
        Ok(adopt(adapter))
    }

    /// Creates a swap chain presenting `device`'s output into `window`.
    pub fn create_swapchain(
        &self,
        device: &d3d11::Device,
        window: HWND,
        desc: &SwapChainDesc,
    ) -> Result<SwapChain> {
        let native = desc.to_native(window);
        let mut swapchain = None;
        check(unsafe {
            self.get()?
                .CreateSwapChain(device.get()?, &native, &mut swapchain)
                .0
        })?;
        debug!(
            "[dxgi] swap chain created for window {:x?} ({} buffer(s))",
            window, desc.buffer_count
        );
        try_adopt(swapchain)
    }

    /// Creates a swap chain with the default description, sized from the window.
    pub fn create_swapchain_for_window(
        &self,
        device: &d3d11::Device,
        window: HWND,
    ) -> Result<SwapChain> {
        self.create_swapchain(device, window, &SwapChainDesc::default())
    }
}

/// What an adapter reports about itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdapterInfo {
    pub name: String,
    pub vendor_id: u32,
    pub device_id: u32,
    pub dedicated_video_memory: usize,
}

impl Adapter {
    /// The factory that enumerated this adapter. Queried anew on every call.
    pub fn parent(&self) -> Result<Factory> {
        let factory: IDXGIFactory = unsafe { self.get()?.GetParent()? };
        Ok(adopt(factory))
    }

    pub fn description(&self) -> Result<AdapterInfo> {
        let desc = unsafe { self.get()?.GetDesc()? };
        let len = desc
            .Description
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(desc.Description.len());
        Ok(AdapterInfo {
            name: String::from_utf16_lossy(&desc.Description[..len]),
            vendor_id: desc.VendorId,
            device_id: desc.DeviceId,
            dedicated_video_memory: desc.DedicatedVideoMemory,
        })
    }
}

impl Device {
    /// The adapter this device runs on.
    pub fn adapter(&self) -> Result<Adapter> {
        let adapter = unsafe { self.get()?.GetAdapter()? };
        Ok(adopt(adapter))
    }

    /// The device's parent object, which is its adapter.
    pub fn parent(&self) -> Result<Adapter> {
        let adapter: IDXGIAdapter = unsafe { self.get()?.GetParent()? };
        Ok(adopt(adapter))
    }
}

/// How a swap chain is created. Zero width/height take the window's client size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SwapChainDesc {
    pub dimensions: Dimensions,
    pub refresh_rate: u32,
    pub format: DXGI_FORMAT,
    pub buffer_count: u32,
    pub sample_count: u32,
    pub sample_quality: u32,
    pub windowed: bool,
}

impl Default for SwapChainDesc {
    fn default() -> Self {
        SwapChainDesc {
            dimensions: Dimensions::new(0, 0),
            refresh_rate: 60,
            format: DXGI_FORMAT_R8G8B8A8_UNORM,
            buffer_count: 1,
            sample_count: 1,
            sample_quality: 0,
            windowed: true,
        }
    }
}

impl SwapChainDesc {
    fn to_native(&self, window: HWND) -> DXGI_SWAP_CHAIN_DESC {
        DXGI_SWAP_CHAIN_DESC {
            BufferDesc: DXGI_MODE_DESC {
                Width: self.dimensions.width,
                Height: self.dimensions.height,
                RefreshRate: DXGI_RATIONAL {
                    Numerator: self.refresh_rate,
                    Denominator: 1,
                },
                Format: self.format,
                ScanlineOrdering: DXGI_MODE_SCANLINE_ORDER_UNSPECIFIED,
                Scaling: DXGI_MODE_SCALING_UNSPECIFIED,
            },
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: self.sample_count,
                Quality: self.sample_quality,
            },
            BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
            BufferCount: self.buffer_count,
            OutputWindow: window,
            Windowed: self.windowed.into(),
            SwapEffect: DXGI_SWAP_EFFECT_DISCARD,
            Flags: 0,
        }
    }
}

/// Arguments to `ResizeBuffers`. The default keeps the buffer count and format
/// and takes the size from the window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResizeBuffers {
    pub buffer_count: u32,
    pub dimensions: Dimensions,
    pub format: DXGI_FORMAT,
    pub flags: u32,
}

impl Default for ResizeBuffers {
    fn default() -> Self {
        ResizeBuffers {
            buffer_count: 0,
            dimensions: Dimensions::new(0, 0),
            format: DXGI_FORMAT_UNKNOWN,
            flags: 0,
        }
    }
}

impl ResizeBuffers {
    pub fn sized(dimensions: Dimensions) -> ResizeBuffers {
        ResizeBuffers {
            dimensions,
            ..Default::default()
        }
    }
}

/// Successful outcome of a present.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresentStatus {
    Presented,
    /// The window is hidden; nothing reached the screen.
    Occluded,
    /// Some other success status code.
    Status(i32),
}

impl PresentStatus {
    fn from_code(code: i32) -> PresentStatus {
        match code {
            codes::S_OK => PresentStatus::Presented,
            codes::DXGI_STATUS_OCCLUDED => PresentStatus::Occluded,
            other => PresentStatus::Status(other),
        }
    }
}

/// Objects a swap chain's buffer can be fetched as.
pub trait BackBuffer: sealed::Sealed + Sized {
    #[doc(hidden)]
    fn fetch(swapchain: &IDXGISwapChain, index: u32) -> Result<Self>;
}

impl sealed::Sealed for Surface {}

impl BackBuffer for Surface {
    fn fetch(swapchain: &IDXGISwapChain, index: u32) -> Result<Self> {
        let surface: IDXGISurface = unsafe { swapchain.GetBuffer(index)? };
        Ok(adopt(surface))
    }
}

impl sealed::Sealed for d3d11::Texture2D {}

impl BackBuffer for d3d11::Texture2D {
    fn fetch(swapchain: &IDXGISwapChain, index: u32) -> Result<Self> {
        let texture: ID3D11Texture2D = unsafe { swapchain.GetBuffer(index)? };
        Ok(adopt(texture))
    }
}

impl SwapChain {
    /// Fetches buffer `index` as a surface or a texture.
    pub fn back_buffer<B: BackBuffer>(&self, index: u32) -> Result<B> {
        B::fetch(self.get()?, index)
    }

    /// Resizes the back buffers. Every reference to them, including views bound
    /// on a device context, must be gone first.
    pub fn resize(&self, resize: ResizeBuffers) -> Result<()> {
        unsafe {
            self.get()?.ResizeBuffers(
                resize.buffer_count,
                resize.dimensions.width,
                resize.dimensions.height,
                resize.format,
                resize.flags,
            )?
        };
        debug!(
            "[dxgi] back buffers resized to {}x{}",
            resize.dimensions.width, resize.dimensions.height
        );
        Ok(())
    }

    pub fn present(&self, sync_interval: u32, flags: u32) -> Result<PresentStatus> {
        let code = unsafe { self.get()?.Present(sync_interval, flags) }.0;
        check(code)?;
        Ok(PresentStatus::from_code(code))
    }

    /// Size of the back buffers as the swap chain currently reports it.
    pub fn dimensions(&self) -> Result<Dimensions> {
        let desc = unsafe { self.get()?.GetDesc()? };
        Ok(Dimensions::new(desc.BufferDesc.Width, desc.BufferDesc.Height))
    }

    pub fn device<D: FromSwapChain>(&self) -> Result<D> {
        D::from_swapchain(self.get()?)
    }
}

/// Devices a swap chain can report as its owner.
pub trait FromSwapChain: sealed::Sealed + Sized {
    #[doc(hidden)]
    fn from_swapchain(swapchain: &IDXGISwapChain) -> Result<Self>;
}

impl sealed::Sealed for Device {}

impl FromSwapChain for Device {
    fn from_swapchain(swapchain: &IDXGISwapChain) -> Result<Self> {
        let device: IDXGIDevice = unsafe { swapchain.GetDevice()? };
        Ok(adopt(device))
    }
}

/// Logs every adapter the factory can see.
pub fn log_adapters(factory: &Factory) -> Result<()> {
    for (index, adapter) in factory.adapters()?.iter().enumerate() {
        let info = adapter.description()?;
        info!(
            "[dxgi] adapter {}: {} ({:04x}:{:04x}, {} MiB dedicated)",
            index,
            info.name,
            info.vendor_id,
            info.device_id,
            info.dedicated_video_memory / (1024 * 1024)
        );
    }
    Ok(())
}
