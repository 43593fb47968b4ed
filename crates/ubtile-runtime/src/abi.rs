/// Launch ABI shared with the device-side kernels
use std::os::raw::c_char;

/// Launch configuration handed to the kernel launcher
///
/// `block_dim` is the number of parallel cores to start (the used core
/// count of the plan). `tiling_size` bytes of tiling record follow the
/// config in the launch parameter area.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CLaunchConfig {
    pub block_dim: u32,
    pub tiling_key: u32,
    pub tiling_size: u32,
    pub reserved: u32,
    pub workspace_bytes: u64,
}

/// Status codes returned across the launch boundary
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success = 0,
    InvalidParams = 1,
    ExecutionFailed = 2,
}

impl ErrorCode {
    pub fn from_u32(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Success),
            1 => Some(Self::InvalidParams),
            2 => Some(Self::ExecutionFailed),
            _ => None,
        }
    }
}

/// Current ABI version
pub const ABI_VERSION: u32 = 2;

/// Raw tiling buffer size reserved by the launcher per invocation
pub const DEFAULT_TILING_CAPACITY: usize = 16 * 1024;

/// Kernel launch entry point
///
/// `tiling` points at `config.tiling_size` bytes encoded by a
/// [`crate::TilingData`] layout.
pub type KernelLaunchFn = unsafe extern "C" fn(
    config: *const CLaunchConfig,
    tiling: *const u8,
    error_msg: *mut *mut c_char,
) -> ErrorCode;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_config_layout() {
        assert_eq!(std::mem::size_of::<CLaunchConfig>(), 24);
        assert_eq!(std::mem::align_of::<CLaunchConfig>(), 8);
    }

    #[test]
    fn test_error_code_round_trip() {
        for code in [ErrorCode::Success, ErrorCode::InvalidParams, ErrorCode::ExecutionFailed] {
            assert_eq!(ErrorCode::from_u32(code as u32), Some(code));
        }
        assert_eq!(ErrorCode::from_u32(7), None);
    }
}
