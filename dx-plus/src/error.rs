//! Translation of native status codes into Rust errors.
//!
//! Native calls report an `HRESULT`: zero or positive is success (positive
//! values carry extra status such as "occluded"), negative is failure.

pub type Result<T> = std::result::Result<T, NativeError>;

/// Status codes this crate inspects by value.
pub mod codes {
    pub const S_OK: i32 = 0;
    pub const E_FAIL: i32 = 0x8000_4005_u32 as i32;
    pub const E_INVALIDARG: i32 = 0x8007_0057_u32 as i32;
    pub const E_POINTER: i32 = 0x8000_4003_u32 as i32;
    pub const DXGI_STATUS_OCCLUDED: i32 = 0x087A_0001;
    pub const DXGI_ERROR_NOT_FOUND: i32 = 0x887A_0002_u32 as i32;
    pub const DXGI_ERROR_DEVICE_REMOVED: i32 = 0x887A_0005_u32 as i32;
    pub const DXGI_ERROR_DEVICE_HUNG: i32 = 0x887A_0006_u32 as i32;
    pub const DXGI_ERROR_DEVICE_RESET: i32 = 0x887A_0007_u32 as i32;
    pub const DXGI_ERROR_DRIVER_INTERNAL_ERROR: i32 = 0x887A_0020_u32 as i32;
}

/// A native call returned a failure code.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (HRESULT {code:#010x})")]
pub struct NativeError {
    code: i32,
    message: String,
}

impl NativeError {
    /// Builds the error for `code`, resolving its text from the system message table.
    pub fn new(code: i32) -> NativeError {
        NativeError {
            code,
            message: system_message(code),
        }
    }

    pub fn with_message(code: i32, message: impl Into<String>) -> NativeError {
        NativeError {
            code,
            message: message.into(),
        }
    }

    pub(crate) fn null_handle() -> NativeError {
        NativeError::with_message(codes::E_POINTER, "handle is not valid")
    }

    pub const fn code(&self) -> i32 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The device went away underneath us; every object created from it is dead.
    pub const fn is_device_lost(&self) -> bool {
        matches!(
            self.code,
            codes::DXGI_ERROR_DEVICE_REMOVED
                | codes::DXGI_ERROR_DEVICE_HUNG
                | codes::DXGI_ERROR_DEVICE_RESET
                | codes::DXGI_ERROR_DRIVER_INTERNAL_ERROR
        )
    }
}

pub const fn failed(code: i32) -> bool {
    code < 0
}

/// Raises `code` as an error if it denotes failure.
pub fn check(code: i32) -> Result<()> {
    if failed(code) {
        Err(NativeError::new(code))
    } else {
        Ok(())
    }
}

#[cfg(windows)]
fn system_message(code: i32) -> String {
    let message = windows::core::HRESULT(code).message().to_string();
    let message = message.trim_end();
    if message.is_empty() {
        String::from("Unknown error")
    } else {
        message.to_owned()
    }
}

#[cfg(not(windows))]
fn system_message(_code: i32) -> String {
    String::from("Unknown error")
}

#[cfg(windows)]
impl From<windows::core::Error> for NativeError {
    fn from(error: windows::core::Error) -> Self {
        let code = error.code().0;
        let message = error.message().to_string();
        if message.trim().is_empty() {
            NativeError::new(code)
        } else {
            NativeError::with_message(code, message.trim_end())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_codes_pass() {
        assert_eq!(check(codes::S_OK), Ok(()));
        assert_eq!(check(codes::DXGI_STATUS_OCCLUDED), Ok(()));
    }

    #[test]
    fn failure_codes_raise_with_original_code() {
        let err = check(codes::E_FAIL).unwrap_err();
        assert_eq!(err.code(), codes::E_FAIL);
        assert!(!err.message().is_empty());
    }

    #[test]
    fn display_shows_hex_code() {
        let err = NativeError::with_message(codes::E_INVALIDARG, "The parameter is incorrect.");
        assert_eq!(
            err.to_string(),
            "The parameter is incorrect. (HRESULT 0x80070057)"
        );
    }

    #[test]
    fn device_loss_codes() {
        assert!(NativeError::new(codes::DXGI_ERROR_DEVICE_REMOVED).is_device_lost());
        assert!(NativeError::new(codes::DXGI_ERROR_DEVICE_RESET).is_device_lost());
        assert!(!NativeError::new(codes::E_POINTER).is_device_lost());
        assert!(!NativeError::null_handle().is_device_lost());
    }
}
