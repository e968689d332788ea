// RegForge - Register File Generator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while building or parsing a [`BitRange`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BitRangeError {
    /// The high bit is below the low bit.
    #[error("bit range high bit {high} is below low bit {low}")]
    Inverted {
        /// Requested high bit.
        high: u32,
        /// Requested low bit.
        low: u32,
    },
    /// The text could not be parsed as `n`, `high:low` or `[high:low]`.
    #[error("invalid bit range '{0}'")]
    Malformed(String),
}

/// A contiguous slice of bits inside a register, `[high:low]` inclusive.
///
/// A single bit is represented with `high == low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BitRange {
    high: u32,
    low: u32,
}

impl BitRange {
    /// Builds a `[high:low]` range.
    pub fn new(high: u32, low: u32) -> Result<Self, BitRangeError> {
        if high < low {
            return Err(BitRangeError::Inverted { high, low });
        }
        Ok(Self { high, low })
    }

    /// Builds a single-bit range.
    pub fn bit(n: u32) -> Self {
        Self { high: n, low: n }
    }

    /// The range `[width-1:0]`. `width` must be non-zero.
    pub fn full(width: u32) -> Self {
        Self {
            high: width.saturating_sub(1),
            low: 0,
        }
    }

    /// Most significant bit.
    pub fn high(&self) -> u32 {
        self.high
    }

    /// Least significant bit.
    pub fn low(&self) -> u32 {
        self.low
    }

    /// Number of bits covered.
    pub fn width(&self) -> u32 {
        self.high - self.low + 1
    }

    /// True for a one-bit range.
    pub fn is_single_bit(&self) -> bool {
        self.high == self.low
    }

    /// Mask of the covered bits, positioned at `low`.
    ///
    /// Bits at or above position 128 cannot be represented and are dropped.
    pub fn mask(&self) -> u128 {
        if self.low >= 128 {
            return 0;
        }
        crate::width_mask(self.width()) << self.low
    }

    /// True when the two ranges share at least one bit.
    pub fn overlaps(&self, other: &BitRange) -> bool {
        self.low <= other.high && other.low <= self.high
    }

    /// True when the range lies within a register of `width` bits.
    pub fn fits_in(&self, width: u32) -> bool {
        self.high < width
    }

    /// Verilog part-select suffix, `[7:0]` or `[5]`.
    pub fn verilog_select(&self) -> String {
        if self.is_single_bit() {
            format!("[{}]", self.low)
        } else {
            format!("[{}:{}]", self.high, self.low)
        }
    }
}

impl fmt::Display for BitRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_bit() {
            write!(f, "{}", self.low)
        } else {
            write!(f, "{}:{}", self.high, self.low)
        }
    }
}

impl FromStr for BitRange {
    type Err = BitRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let inner = trimmed
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .unwrap_or(trimmed);
        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| BitRangeError::Malformed(s.to_string()))
        };
        match inner.split_once(':') {
            Some((high, low)) => BitRange::new(parse(high)?, parse(low)?),
            None => Ok(BitRange::bit(parse(inner)?)),
        }
    }
}

impl TryFrom<String> for BitRange {
    type Error = BitRangeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BitRange> for String {
    fn from(range: BitRange) -> Self {
        range.to_string()
    }
}
