//! Workload binary preconditions.
//!
//! The binary must exist and be executable by the current user before any engine
//! object is constructed for it.

use std::path::Path;

use crate::common::{Error, Result};

/// Checks that `path` names an existing executable file.
///
/// # Arguments
///
/// * `path` - Workload binary.
///
/// # Returns
///
/// `Ok(())`, [`Error::WorkloadNotFound`] when nothing exists at `path` (or it is a
/// directory), or [`Error::WorkloadNotExecutable`] when the execute permission check
/// fails.
pub fn check_workload(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(Error::WorkloadNotFound {
            path: path.to_path_buf(),
        });
    }
    if !is_executable(path) {
        return Err(Error::WorkloadNotExecutable {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    // SAFETY: This is safe because:
    // 1. `c_path` is a valid NUL-terminated string that outlives the call
    // 2. `access` only reads the path and does not retain the pointer
    unsafe { libc::access(c_path.as_ptr(), libc::X_OK) == 0 }
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
