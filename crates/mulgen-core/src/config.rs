//! Generator configuration.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on either operand width. Keeps every decode inside `u128`
/// (product width plus carry-save headroom stays well below 128 bits).
pub const MAX_OPERAND_WIDTH: usize = 48;

/// Validated power-of-two radix 2^k, k >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Radix {
    log2: u32,
}

impl Radix {
    pub fn new(radix: u64) -> Result<Radix> {
        if radix < 2 || !radix.is_power_of_two() {
            return Err(ConfigError::BadRadix(radix));
        }
        Ok(Radix {
            log2: radix.trailing_zeros(),
        })
    }

    pub fn value(&self) -> u64 {
        1 << self.log2
    }

    /// k: bits consumed per Booth digit.
    pub fn log2(&self) -> usize {
        self.log2 as usize
    }

    /// Encoding windows span k+1 bits (one bit of overlap).
    pub fn window_width(&self) -> usize {
        self.log2 as usize + 1
    }

    /// Largest digit magnitude, r/2.
    pub fn max_multiple(&self) -> u64 {
        1 << (self.log2 - 1)
    }
}

impl fmt::Display for Radix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// How partial-product rows are extended to the product width. All policies
/// preserve the decoded value exactly; they differ in added bits and in which
/// operand shapes they accept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignExtension {
    /// Every row extended to full product width. Reference policy.
    Brute,
    /// One stop bit per row plus a constant correction row. Rectangular rows,
    /// any width skew.
    StopBits,
    /// Telescoped closed form, fewest extra bits. Square operands only.
    Compact,
    /// Compact generalized to any skew with Q-bit collision handling.
    #[default]
    CompactRect,
}

impl fmt::Display for SignExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignExtension::Brute => "brute",
            SignExtension::StopBits => "stop-bits",
            SignExtension::Compact => "compact",
            SignExtension::CompactRect => "compact-rect",
        };
        write!(f, "{name}")
    }
}

/// Carry-save primitive set used by the column compressor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompressMode {
    /// Full adders for triples, half adders for leftover pairs.
    #[default]
    Adders,
    /// 4:2 compressors with a horizontal carry chain, adder fallback.
    Compressors42,
}

impl fmt::Display for CompressMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompressMode::Adders => "adders",
            CompressMode::Compressors42 => "4:2",
        };
        write!(f, "{name}")
    }
}

/// Top-level generator knobs. Operand widths and signedness travel with the
/// bit-vectors themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MulConfig {
    pub radix: u64,
    pub extension: SignExtension,
}

impl Default for MulConfig {
    fn default() -> Self {
        MulConfig {
            radix: 4,
            extension: SignExtension::default(),
        }
    }
}

pub(crate) fn check_operand_width(operand: &'static str, width: usize) -> Result<()> {
    if width == 0 || width > MAX_OPERAND_WIDTH {
        return Err(ConfigError::WidthOutOfRange {
            operand,
            width,
            max: MAX_OPERAND_WIDTH,
        });
    }
    Ok(())
}
