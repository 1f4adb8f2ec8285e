#[cfg(windows)]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use dx_plus::d3d11::Device;
    use dx_plus::dxgi::{self, Factory};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let factory = Factory::create()?;
    dxgi::log_adapters(&factory)?;

    let device = Device::create_default()?;
    let adapter = device.as_::<dxgi::Device>()?.adapter()?.description()?;
    log::info!(
        "[d3d11] device on {} at feature level {:#x}",
        adapter.name,
        device.feature_level()?.0
    );
    Ok(())
}

#[cfg(not(windows))]
fn main() {
    env_logger::init();
    log::error!("[d3d11] no Direct3D 11 on this platform");
}
