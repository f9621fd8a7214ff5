//! Unit-suffixed quantities used on the parameter surface.
//!
//! This module provides strong types for the two suffixed scalars the engine accepts:
//! 1. **Memory sizes:** `512MB`, `2GiB`, `4096` (bytes). Multipliers are binary, which is
//!    how the engine reads `MB`/`GB` in address ranges.
//! 2. **Frequencies:** `3GHz`, `1.5GHz`, `800MHz`, converted to a clock period in ticks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Engine ticks per simulated second (one tick is one picosecond).
pub const TICKS_PER_SECOND: u64 = 1_000_000_000_000;

const KIB: u64 = 1 << 10;
const MIB: u64 = 1 << 20;
const GIB: u64 = 1 << 30;
const TIB: u64 = 1 << 40;

/// Error produced when a suffixed quantity cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot parse `{input}`: {reason}")]
pub struct ParseUnitError {
    /// The rejected input text.
    pub input: String,
    /// Why it was rejected.
    pub reason: &'static str,
}

impl ParseUnitError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

/// Splits `"512MB"` into `("512", "MB")`.
fn split_suffix(input: &str) -> (&str, &str) {
    let idx = input
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(input.len());
    (input[..idx].trim(), input[idx..].trim())
}

/// A strictly positive number of bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MemorySize(u64);

impl MemorySize {
    /// Creates a size from a byte count; zero is rejected.
    pub fn from_bytes(bytes: u64) -> Result<Self, ParseUnitError> {
        if bytes == 0 {
            return Err(ParseUnitError::new("0", "memory size must be non-zero"));
        }
        Ok(Self(bytes))
    }

    /// Creates a size of `mib` mebibytes, saturating at `u64::MAX` bytes.
    ///
    /// `mib(0)` yields an empty size; [`crate::config::ParameterSet::validate`] rejects it.
    pub const fn mib(mib: u64) -> Self {
        Self(mib.saturating_mul(MIB))
    }

    /// Returns the size in bytes.
    pub const fn bytes(self) -> u64 {
        self.0
    }
}

impl FromStr for MemorySize {
    type Err = ParseUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (digits, suffix) = split_suffix(s.trim());
        if digits.is_empty() {
            return Err(ParseUnitError::new(s, "missing numeric value"));
        }
        let value: u64 = digits
            .parse()
            .map_err(|_| ParseUnitError::new(s, "value must be a whole number"))?;
        let multiplier = match suffix {
            "" | "B" => 1,
            "kB" | "KB" | "KiB" => KIB,
            "MB" | "MiB" => MIB,
            "GB" | "GiB" => GIB,
            "TB" | "TiB" => TIB,
            _ => return Err(ParseUnitError::new(s, "unknown size suffix")),
        };
        let bytes = value
            .checked_mul(multiplier)
            .ok_or_else(|| ParseUnitError::new(s, "size overflows 64 bits"))?;
        if bytes == 0 {
            return Err(ParseUnitError::new(s, "memory size must be non-zero"));
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for MemorySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (unit, name) in [(TIB, "TiB"), (GIB, "GiB"), (MIB, "MiB"), (KIB, "KiB")] {
            if self.0 % unit == 0 {
                return write!(f, "{}{}", self.0 / unit, name);
            }
        }
        write!(f, "{}B", self.0)
    }
}

impl TryFrom<String> for MemorySize {
    type Error = ParseUnitError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MemorySize> for String {
    fn from(value: MemorySize) -> Self {
        value.to_string()
    }
}

/// A strictly positive clock frequency.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Frequency {
    hz: f64,
}

impl Frequency {
    /// Returns the frequency in hertz.
    pub const fn hz(self) -> f64 {
        self.hz
    }

    /// Returns the clock period in ticks, rounded to the nearest tick (at least one).
    pub fn period_ticks(self) -> u64 {
        let ticks = (TICKS_PER_SECOND as f64 / self.hz).round();
        if ticks < 1.0 { 1 } else { ticks as u64 }
    }
}

impl FromStr for Frequency {
    type Err = ParseUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (digits, suffix) = split_suffix(s.trim());
        if digits.is_empty() {
            return Err(ParseUnitError::new(s, "missing numeric value"));
        }
        let value: f64 = digits
            .parse()
            .map_err(|_| ParseUnitError::new(s, "malformed number"))?;
        let multiplier = match suffix {
            "Hz" => 1.0,
            "kHz" => 1e3,
            "MHz" => 1e6,
            "GHz" => 1e9,
            "THz" => 1e12,
            "" => return Err(ParseUnitError::new(s, "frequency needs a Hz suffix")),
            _ => return Err(ParseUnitError::new(s, "unknown frequency suffix")),
        };
        let hz = value * multiplier;
        if !hz.is_finite() || hz <= 0.0 {
            return Err(ParseUnitError::new(s, "frequency must be positive"));
        }
        Ok(Self { hz })
    }
}
