#![cfg(windows)]

use dx_plus::d3d11::{
    Blob, BufferDesc, Bytecode, Device, IndexFormat, InputLayout, PixelShader, RenderTargetView,
    TextureDesc, VertexShader,
};
use dx_plus::Dimensions;
use windows::core::PCSTR;
use windows::Win32::Graphics::Direct3D::Fxc::D3DCompile;
use windows::Win32::Graphics::Direct3D::{ID3DBlob, D3D11_PRIMITIVE_TOPOLOGY_TRIANGLELIST};
use windows::Win32::Graphics::Direct3D11::{
    D3D11_BIND_INDEX_BUFFER, D3D11_BIND_RENDER_TARGET, D3D11_INPUT_ELEMENT_DESC,
    D3D11_INPUT_PER_VERTEX_DATA,
};
use windows::Win32::Graphics::Dxgi::Common::DXGI_FORMAT_R32G32B32_FLOAT;

static VERTEX_SHADER: &str =
    "float4 main(float3 pos : POSITION) : SV_POSITION { return float4(pos, 1.0); }";
static PIXEL_SHADER: &str = "float4 main() : SV_TARGET { return float4(1.0, 0.0, 0.0, 1.0); }";

fn compile(source: &str, target: &[u8]) -> Blob {
    let mut code: Option<ID3DBlob> = None;
    let mut errors: Option<ID3DBlob> = None;
    let result = unsafe {
        D3DCompile(
            source.as_ptr().cast(),
            source.len(),
            None,
            None,
            None,
            PCSTR(b"main\0".as_ptr()),
            PCSTR(target.as_ptr()),
            0,
            0,
            &mut code,
            Some(&mut errors),
        )
    };
    if let Err(e) = result {
        let log = errors
            .map(|blob| String::from_utf8_lossy(Blob::from(blob).bytecode()).into_owned())
            .unwrap_or_default();
        panic!("shader did not compile: {:?}\n{}", e, log);
    }
    Blob::from(code.unwrap())
}

fn position_layout(device: &Device, bytecode: &Blob) -> InputLayout {
    let elements = [D3D11_INPUT_ELEMENT_DESC {
        SemanticName: PCSTR(b"POSITION\0".as_ptr()),
        SemanticIndex: 0,
        Format: DXGI_FORMAT_R32G32B32_FLOAT,
        InputSlot: 0,
        AlignedByteOffset: 0,
        InputSlotClass: D3D11_INPUT_PER_VERTEX_DATA,
        InstanceDataStepRate: 0,
    }];
    device.create_input_layout(&elements, bytecode).unwrap()
}

#[test]
fn compiled_shaders_are_created_per_stage() {
    let device = Device::create_warp().unwrap();
    let vs_code = compile(VERTEX_SHADER, b"vs_4_0\0");
    let ps_code = compile(PIXEL_SHADER, b"ps_4_0\0");
    assert!(!vs_code.bytecode().is_empty());

    let vs: VertexShader = device.create_shader(&vs_code).unwrap();
    let ps: PixelShader = device.create_shader(&ps_code.bytecode().to_vec()).unwrap();
    assert!(vs.is_valid() && ps.is_valid());

    // Stage mismatch is refused by the driver.
    assert!(device.create_shader::<PixelShader>(&vs_code).is_err());
    assert!(device.create_shader::<VertexShader>(&ps_code).is_err());
}

#[test]
fn set_shader_binds_the_matching_stage() {
    let device = Device::create_warp().unwrap();
    let vs: VertexShader = device
        .create_shader(&compile(VERTEX_SHADER, b"vs_4_0\0"))
        .unwrap();
    let ps: PixelShader = device
        .create_shader(&compile(PIXEL_SHADER, b"ps_4_0\0"))
        .unwrap();

    let context = device.immediate_context();
    context.set_shader(&vs);
    context.set_shader(&ps);

    let mut bound_vs = None;
    let mut bound_ps = None;
    unsafe {
        let raw = context.get().unwrap();
        raw.VSGetShader(&mut bound_vs, None, None);
        raw.PSGetShader(&mut bound_ps, None, None);
    }
    assert_eq!(bound_vs.as_ref(), vs.raw());
    assert_eq!(bound_ps.as_ref(), ps.raw());
}

#[test]
fn triangle_draws_into_a_warp_target() {
    let device = Device::create_warp().unwrap();
    let vs_code = compile(VERTEX_SHADER, b"vs_4_0\0");
    let vs: VertexShader = device.create_shader(&vs_code).unwrap();
    let ps: PixelShader = device
        .create_shader(&compile(PIXEL_SHADER, b"ps_4_0\0"))
        .unwrap();
    let layout = position_layout(&device, &vs_code);

    let size = Dimensions::new(16, 16);
    let target = device
        .create_texture2d(&TextureDesc::new(size).bind(D3D11_BIND_RENDER_TARGET))
        .unwrap();
    let rtv: RenderTargetView = device.create_view(&target).unwrap();

    let vertices = [[0.0f32, 0.5, 0.0], [0.5, -0.5, 0.0], [-0.5, -0.5, 0.0]];
    let vertex_buffer = device
        .create_buffer(&vertices, BufferDesc::default())
        .unwrap();
    let index_buffer = device
        .create_buffer(
            &[0u16, 1, 2],
            BufferDesc {
                bind: D3D11_BIND_INDEX_BUFFER,
                ..Default::default()
            },
        )
        .unwrap();

    let context = device.immediate_context();
    context.set_render_target(&rtv, &Default::default());
    context.set_viewport_size(16.0, 16.0);
    context.clear_render_target_view(&rtv, [0.0; 4]);
    context.set_input_layout(&layout);
    context.set_vertex_buffer(&vertex_buffer, std::mem::size_of::<[f32; 3]>() as u32, 0);
    context.set_index_buffer(&index_buffer, IndexFormat::U16, 0);
    context.set_primitive_topology(D3D11_PRIMITIVE_TOPOLOGY_TRIANGLELIST);
    context.set_shader(&vs);
    context.set_shader(&ps);
    context.draw(3, 0);
    context.draw_indexed(3, 0, 0);
    context.unbind_render_targets();

    unsafe { device.get().unwrap().GetDeviceRemovedReason() }.unwrap();
}
