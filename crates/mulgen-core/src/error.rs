//! Construction-time error types.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Rejected configurations. Every variant names the offending parameter;
/// nothing is partially constructed when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Radix must be 2^k with k >= 1.
    #[error("radix {0} is not a power of two >= 2")]
    BadRadix(u64),

    /// The multiplier must fill at least one full encoding window.
    #[error(
        "multiplier width {width} is too narrow for one radix-{radix} window (minimum {min})"
    )]
    MultiplierTooNarrow {
        width: usize,
        radix: u64,
        min: usize,
    },

    /// Operand widths are bounded so decode arithmetic stays in 128 bits.
    #[error("{operand} width {width} outside the supported range 1..={max}")]
    WidthOutOfRange {
        operand: &'static str,
        width: usize,
        max: usize,
    },

    /// Compact sign extension is only defined for square operands.
    #[error(
        "compact sign extension requires equal operand widths (got {multiplicand}x{multiplier}); \
         use compact-rect for skewed widths"
    )]
    SkewedCompact {
        multiplicand: usize,
        multiplier: usize,
    },

    /// An accumulate row must fit inside the product window.
    #[error("addend spans columns {shift}..{end}, outside the {product}-bit product")]
    AddendOutOfRange {
        shift: usize,
        end: usize,
        product: usize,
    },
}
