#![cfg(windows)]

use dx_plus::d2d1::{self, Brush};
use dx_plus::d3d11::{
    Device, DepthStencilView, PixelShader, RenderTargetView, ShaderResourceView, TextureDesc,
    VertexShader,
};
use dx_plus::dxgi::{self, Factory};
use dx_plus::error::codes;
use dx_plus::Dimensions;
use windows::Win32::Graphics::Direct2D::Common::{D2D1_COLOR_F, D2D_RECT_F};
use windows::Win32::Graphics::Direct2D::ID2D1Brush;
use windows::Win32::Graphics::Direct3D::D3D_FEATURE_LEVEL_10_0;
use windows::Win32::Graphics::Direct3D11::{D3D11_BIND_RENDER_TARGET, D3D11_BIND_SHADER_RESOURCE};
use windows::Win32::Graphics::Dxgi::Common::DXGI_FORMAT_B8G8R8A8_UNORM;
use windows::Win32::Graphics::Dxgi::IDXGISurface;

#[test]
fn factory_sees_at_least_one_adapter() {
    let factory = Factory::create().unwrap();
    let adapters = factory.adapters().unwrap();
    assert!(!adapters.is_empty());
    assert!(factory.default_adapter().unwrap().is_valid());
    dxgi::log_adapters(&factory).unwrap();
}

#[test]
fn device_walks_up_to_its_factory() {
    let device = Device::create_warp().unwrap();
    assert!(device.feature_level().unwrap().0 >= D3D_FEATURE_LEVEL_10_0.0);

    let dxgi_device: dxgi::Device = device.as_().unwrap();
    let adapter = dxgi_device.adapter().unwrap();
    assert!(!adapter.description().unwrap().name.is_empty());
    assert!(dxgi_device.parent().unwrap().is_valid());
    assert!(adapter.parent().unwrap().is_valid());
}

#[test]
fn device_on_enumerated_adapter() {
    let factory = Factory::create().unwrap();
    let adapter = factory.default_adapter().unwrap();
    let device = Device::from_adapter(&adapter, Default::default()).unwrap();
    assert!(device.immediate_context().is_valid());
}

#[test]
fn release_and_take_empty_the_device() {
    let mut device = Device::create_warp().unwrap();
    let mut copy = device.clone();
    assert_eq!(copy, device);

    let taken = copy.take();
    assert!(!copy.is_valid());
    assert!(!copy.immediate_context().is_valid());
    assert!(taken.is_valid());

    device.release();
    device.release();
    assert!(!device.is_valid());
    assert_eq!(device.get().unwrap_err().code(), codes::E_POINTER);
    assert!(taken.is_valid());
}

#[test]
fn views_over_textures() {
    let device = Device::create_warp().unwrap();
    let size = Dimensions::new(64, 32);

    let depth = device
        .create_texture2d(&TextureDesc::depth_stencil(size))
        .unwrap();
    assert_eq!(depth.dimensions().unwrap(), size);
    let dsv: DepthStencilView = device.create_view(&depth).unwrap();
    assert!(dsv.is_valid());

    let color = device
        .create_texture2d(&TextureDesc::new(size).bind(D3D11_BIND_RENDER_TARGET | D3D11_BIND_SHADER_RESOURCE))
        .unwrap();
    let rtv: RenderTargetView = device.create_view(&color).unwrap();
    let srv: ShaderResourceView = device.create_view(&color).unwrap();
    assert!(rtv.is_valid() && srv.is_valid());

    let context = device.immediate_context();
    context.set_render_target(&rtv, &dsv);
    context.set_viewport_size(64.0, 32.0);
    context.clear_render_target_view(&rtv, [0.0, 0.5, 1.0, 1.0]);
    context.clear_depth_stencil(&dsv, 1.0, 0, true, true);
    context.unbind_render_targets();
}

#[test]
fn update_subresource_checks_length() {
    let device = Device::create_warp().unwrap();
    let texture = device
        .create_texture2d(&TextureDesc::new(Dimensions::new(4, 4)))
        .unwrap();
    let context = device.immediate_context();

    context.update_subresource(&texture, &[0xff; 64]).unwrap();
    let err = context.update_subresource(&texture, &[0xff; 63]).unwrap_err();
    assert_eq!(err.code(), codes::E_INVALIDARG);
}

#[test]
fn garbage_bytecode_is_rejected() {
    let device = Device::create_warp().unwrap();
    assert!(device.create_shader::<VertexShader>(&[0u8; 16]).is_err());
    assert!(device.create_shader::<PixelShader>(&vec![1u8, 2, 3]).is_err());
}

#[test]
fn buffers_from_data() {
    let device = Device::create_warp().unwrap();
    let vertices = [[0.0f32, 0.5, 0.0], [0.5, -0.5, 0.0], [-0.5, -0.5, 0.0]];
    let buffer = device.create_buffer(&vertices, Default::default()).unwrap();
    assert!(buffer.is_valid());

    let context = device.immediate_context();
    context.set_vertex_buffer(&buffer, std::mem::size_of::<[f32; 3]>() as u32, 0);
}

#[test]
fn direct2d_draws_into_a_texture() {
    let device = Device::create_warp().unwrap();
    let texture = device
        .create_texture2d(
            &TextureDesc::new(Dimensions::new(32, 32))
                .format(DXGI_FORMAT_B8G8R8A8_UNORM)
                .bind(D3D11_BIND_RENDER_TARGET | D3D11_BIND_SHADER_RESOURCE),
        )
        .unwrap();
    let surface = dxgi::Surface::from(texture.cast::<IDXGISurface>().unwrap());

    let d2d = d2d1::Device::new(&device.as_().unwrap()).unwrap();
    let context = d2d.create_context().unwrap();
    let bitmap = context.create_bitmap(&surface).unwrap();
    context.set_target(&bitmap).unwrap();

    let brush = context
        .create_solid_color_brush(D2D1_COLOR_F { r: 1.0, g: 0.0, b: 0.0, a: 1.0 })
        .unwrap();
    context.begin_draw().unwrap();
    for inset in 0..8 {
        let inset = inset as f32;
        context
            .draw_rectangle(
                &D2D_RECT_F { left: inset, top: inset, right: 32.0 - inset, bottom: 32.0 - inset },
                &brush,
                1.0,
            )
            .unwrap();
    }
    context.end_draw().unwrap();
    context.clear_target();
    assert!(brush.is_valid());
}

#[test]
fn brush_is_lent_as_its_base_interface() {
    let device = Device::create_warp().unwrap();
    let d2d = d2d1::Device::new(&device.as_().unwrap()).unwrap();
    let context = d2d.create_context().unwrap();
    let brush = context
        .create_solid_color_brush(D2D1_COLOR_F { r: 0.0, g: 1.0, b: 0.0, a: 1.0 })
        .unwrap();

    let queried = brush.cast::<ID2D1Brush>().unwrap();
    assert_eq!(brush.brush().unwrap(), queried.get().unwrap());

    let empty = d2d1::SolidColorBrush::default();
    assert_eq!(empty.brush().unwrap_err().code(), codes::E_POINTER);
}
