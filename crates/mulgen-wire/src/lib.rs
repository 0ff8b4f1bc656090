//! Signal layer for the multiplier generator.
//!
//! Deliberately narrow: an append-only wire-graph arena, a word-level
//! [`BitVector`] with build-time or runtime signedness, and a two-value
//! simulator with a single clock for register stages. Generator crates build
//! structure here and never see values; values exist only inside a [`Sim`].

pub mod sim;
pub mod vector;
pub mod wire;

pub use sim::Sim;
pub use vector::{BitVector, Signedness};
pub use wire::{Compress42, InputId, InputInfo, WireGraph, WireId, WireOp, WireStats};
