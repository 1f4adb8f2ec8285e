#[cfg(windows)]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use dx_plus::Dimensions;
    use dx_widget::{DirectXSurface, HostWindow, SurfaceConfig, SurfaceError};
    use windows::Win32::System::Com::{CoInitializeEx, CoUninitialize, COINIT_APARTMENTTHREADED};

    env_logger::init();

    let config = SurfaceConfig::load_or_default("dx-widget.toml")?;
    log::info!("[main] driver {:?}, sync interval {}", config.driver, config.sync_interval);

    unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED)? };
    let result = (|| -> Result<(), SurfaceError> {
        let window = HostWindow::new("DirectX Widget", Dimensions::new(800, 600), true)?;
        let surface = DirectXSurface::new(window.hwnd(), config)?;
        window.run(surface)
    })();
    unsafe { CoUninitialize() };

    Ok(result?)
}

#[cfg(not(windows))]
fn main() {
    env_logger::init();
    log::error!("[main] dx-widget needs Direct3D 11 and only runs on Windows");
    std::process::exit(1);
}
