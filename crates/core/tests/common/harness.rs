use std::fs;
use std::io::Write;
use std::path::Path;

use o3wire_core::config::ParameterSet;
use tempfile::{Builder, NamedTempFile};
use tracing_subscriber::EnvFilter;

/// Routes library logs to the test writer; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A workload binary on disk; removed when dropped.
///
/// Files live under the cargo target tmp directory, since `/tmp` may be mounted
/// `noexec` and `access(2)` then refuses execute permission.
#[derive(Debug)]
pub struct Workload {
    file: NamedTempFile,
}

impl Workload {
    /// An executable raw image of `text_bytes` bytes.
    pub fn executable(text_bytes: usize) -> Self {
        Self::with_mode(text_bytes, 0o755)
    }

    /// A readable image without any execute bit.
    pub fn not_executable() -> Self {
        Self::with_mode(64, 0o644)
    }

    fn with_mode(text_bytes: usize, mode: u32) -> Self {
        let mut file = Builder::new()
            .prefix("workload-")
            .tempfile_in(env!("CARGO_TARGET_TMPDIR"))
            .unwrap();
        file.write_all(&vec![0x13; text_bytes]).unwrap();
        file.flush().unwrap();
        set_mode(file.path(), mode);
        Self { file }
    }

    /// Location of the binary.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Default parameters running this workload.
    pub fn params(&self) -> ParameterSet {
        ParameterSet::for_binary(self.path())
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) {}
