//! Multiplier datapath generation
//!
//! This crate builds partial product matrices for radix-2^k Booth
//! multipliers and reduces them with carry-save compression:
//! - Radix encoding of the multiplier into signed digits
//! - Digit row construction with four sign-extension policies
//! - Optional accumulate row for multiply-add
//! - Column compression to two rows, with 3:2/2:2 adders or 4:2 compressors
//! - Decoding and table rendering for verification

pub mod booth;
pub mod compressor;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod generator;
pub mod matrix;
pub mod multiples;
mod sign_ext;

pub use booth::{digit_count, BoothDigit, DigitValue, RadixEncoder};
pub use compressor::{
    ColumnCompressor, CompressionReport, PipelineBoundary, ReductionStep, Stage,
};
pub use config::{CompressMode, MulConfig, Radix, SignExtension, MAX_OPERAND_WIDTH};
pub use error::{ConfigError, Result};
pub use evaluate::{model_product, Evaluator};
pub use generator::{PartialProductGenerator, PartialProducts, ProductMeta};
pub use matrix::{MatrixShape, PartialProductMatrix, Row, RowKind, Term, TermKind};
pub use multiples::Multiples;
