//! Surface configuration, loadable from TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    #[default]
    Hardware,
    Warp,
    Reference,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub driver: Driver,
    pub debug_layer: bool,
    pub bgra_support: bool,
    pub buffer_count: u32,
    pub refresh_rate: u32,
    pub sync_interval: u32,
    pub clear_color: [f32; 4],
    pub clear_depth: f32,
    pub clear_stencil: u8,
    /// Rebuild the device on the next event after it was lost, instead of
    /// failing every call from then on.
    pub recover_device_lost: bool,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        SurfaceConfig {
            driver: Driver::Hardware,
            debug_layer: false,
            bgra_support: true,
            buffer_count: 1,
            refresh_rate: 60,
            sync_interval: 0,
            clear_color: [0.0; 4],
            clear_depth: 1.0,
            clear_stencil: 0,
            recover_device_lost: true,
        }
    }
}

impl SurfaceConfig {
    pub fn from_toml_str(contents: &str) -> Result<SurfaceConfig, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<SurfaceConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        SurfaceConfig::from_toml_str(&contents)
    }

    /// Loads `path` if it exists, otherwise returns the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<SurfaceConfig, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            SurfaceConfig::load(path)
        } else {
            log::debug!("[config] {} not found, using defaults", path.display());
            Ok(SurfaceConfig::default())
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    pub fn warp() -> SurfaceConfig {
        SurfaceConfig {
            driver: Driver::Warp,
            ..Default::default()
        }
    }
}

#[cfg(windows)]
mod native {
    use dx_plus::d3d11::{DeviceOptions, DriverType};
    use dx_plus::dxgi::SwapChainDesc;

    use super::{Driver, SurfaceConfig};

    impl From<Driver> for DriverType {
        fn from(driver: Driver) -> Self {
            match driver {
                Driver::Hardware => DriverType::Hardware,
                Driver::Warp => DriverType::Warp,
                Driver::Reference => DriverType::Reference,
            }
        }
    }

    impl SurfaceConfig {
        pub fn device_options(&self) -> DeviceOptions {
            DeviceOptions {
                driver: self.driver.into(),
                debug_layer: self.debug_layer,
                bgra_support: self.bgra_support,
            }
        }

        pub fn swapchain_desc(&self) -> SwapChainDesc {
            SwapChainDesc {
                buffer_count: self.buffer_count,
                refresh_rate: self.refresh_rate,
                ..Default::default()
            }
        }
    }
}
