//! Common types shared by every layer of the topology builder.
//!
//! This module provides:
//! 1. **Error handling:** The failure taxonomy and exit-status mapping.
//! 2. **Units:** Memory sizes and clock frequencies with engine-compatible suffixes.

/// Error types and failure categories.
pub mod error;

/// Unit-suffixed quantities (memory sizes, frequencies).
pub mod units;

pub use error::{EngineError, Error, FailureCategory, Result};
pub use units::{Frequency, MemorySize, ParseUnitError, TICKS_PER_SECOND};
