//! Workload image inspection.
//!
//! Syscall-emulation workloads are initialized "compatible with" the binary they run:
//! the engine reads the object file to learn its format, architecture, entry point and
//! text size. Binaries that do not parse as an object file are still runnable as raw
//! images; their whole length counts as text.

use std::fs;
use std::io;
use std::path::Path;

use object::{Object, ObjectSection, SectionKind};

/// Container format of a workload image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// ELF object file.
    Elf,
    /// Unrecognized bytes.
    Raw,
}

/// What the engine learns about a workload binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadImage {
    /// Container format.
    pub format: ImageFormat,
    /// Target architecture, when the format records one.
    pub architecture: Option<String>,
    /// Entry point address (zero for raw images).
    pub entry: u64,
    /// Bytes of executable code.
    pub text_bytes: u64,
}

impl WorkloadImage {
    /// Parses `data` as an object file, falling back to a raw image.
    pub fn from_bytes(data: &[u8]) -> Self {
        match object::File::parse(data) {
            Ok(file) => {
                let text_bytes: u64 = file
                    .sections()
                    .filter(|s| s.kind() == SectionKind::Text)
                    .map(|s| s.size())
                    .sum();
                Self {
                    format: ImageFormat::Elf,
                    architecture: Some(format!("{:?}", file.architecture())),
                    entry: file.entry(),
                    text_bytes,
                }
            }
            Err(_) => Self {
                format: ImageFormat::Raw,
                architecture: None,
                entry: 0,
                text_bytes: data.len() as u64,
            },
        }
    }

    /// Reads and inspects the binary at `path`.
    pub fn inspect(path: &Path) -> io::Result<Self> {
        let data = fs::read(path)?;
        Ok(Self::from_bytes(&data))
    }
}
