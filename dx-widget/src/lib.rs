//! A window-sized Direct3D 11 render surface: clear, present, and rebuild on
//! resize.

pub mod config;
#[cfg(windows)]
pub mod host;
#[cfg(windows)]
pub mod surface;

pub use config::{ConfigError, Driver, SurfaceConfig};
#[cfg(windows)]
pub use host::HostWindow;
#[cfg(windows)]
pub use surface::{DirectXSurface, SurfaceState};

use dx_plus::NativeError;

#[derive(thiserror::Error, Debug)]
pub enum SurfaceError {
    #[error(transparent)]
    Native(NativeError),
    #[error("device lost: {0}")]
    DeviceLost(NativeError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("window error: {0}")]
    Window(NativeError),
}

/// Device-loss codes come out as `DeviceLost` whichever call reported them.
impl From<NativeError> for SurfaceError {
    fn from(error: NativeError) -> Self {
        if error.is_device_lost() {
            SurfaceError::DeviceLost(error)
        } else {
            SurfaceError::Native(error)
        }
    }
}

impl SurfaceError {
    pub fn is_device_lost(&self) -> bool {
        matches!(self, SurfaceError::DeviceLost(_))
    }
}
