#![doc = include_str!("../README.md")]

use core::{fmt, num::ParseIntError, str::FromStr};
use std::io;

const KIB: u64 = 1 << 10;
const MIB: u64 = 1 << 20;
const GIB: u64 = 1 << 30;
const TIB: u64 = 1 << 40;

/// A size, in bytes
#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
pub struct ByteSize(pub u64);

impl ByteSize {
    /// Returns the size in bytes
    #[must_use]
    pub fn bytes(self) -> u64 {
        self.0
    }
}

/// [`ByteSize`] Parsing Errors
#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
pub enum ByteSizeError {
    /// The numeric part couldn't be parsed
    #[error("Invalid Size Number")]
    Number(#[from] ParseIntError),

    /// The unit isn't known
    #[error("Unknown Size Unit: {0}")]
    Unit(String),

    /// The size doesn't fit in 64 bits
    #[error("Size Overflow")]
    Overflow,
}

impl FromStr for ByteSize {
    type Err = ByteSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (number, unit) = s.split_at(split);

        let multiplier = match unit.trim().to_ascii_uppercase().as_str() {
            "" | "B" => 1,
            "K" | "KB" | "KIB" => KIB,
            "M" | "MB" | "MIB" => MIB,
            "G" | "GB" | "GIB" => GIB,
            "T" | "TB" | "TIB" => TIB,
            _ => return Err(ByteSizeError::Unit(unit.to_owned())),
        };

        number
            .parse::<u64>()?
            .checked_mul(multiplier)
            .map(ByteSize)
            .ok_or(ByteSizeError::Overflow)
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (unit, name) in [(TIB, "TiB"), (GIB, "GiB"), (MIB, "MiB"), (KIB, "KiB")] {
            if self.0 >= unit && self.0 % unit == 0 {
                return write!(f, "{} {name}", self.0 / unit);
            }
        }

        write!(f, "{} B", self.0)
    }
}

/// Our Error Type
#[derive(thiserror::Error, Debug)]
pub enum PartPlanError {
    /// An error has occurred when accessing the local filesystem or files
    #[error("I/O Error")]
    Io(#[from] io::Error),

    /// An error has occurred when parsing JSON data
    #[error("JSON Parsing Failure")]
    Json(#[from] serde_json::Error),

    /// An error has occurred when parsing TOML configuration files
    #[error("Configuration File Format Error")]
    Toml(#[from] toml::de::Error),
}
