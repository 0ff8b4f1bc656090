//! Carry-save column compression.
//!
//! The matrix is reduced pass by pass until every column holds at most two
//! terms. Terms carry the pass number that produced them; a pass only
//! consumes terms from earlier passes, so each pass is one hardware level
//! and carries ripple at most one column per level.
//!
//! In [`CompressMode::Adders`] a column takes 3:2 full adders while at least
//! three terms are waiting, then a half adder if exactly two remain and the
//! column already reduced something this pass. In
//! [`CompressMode::Compressors42`] columns first take 4:2 compressors whose
//! carry-out chains horizontally into the next column's carry-in within the
//! same pass, then fall back to the adder rule. Carries out of the top
//! column vanish, keeping everything mod 2^P.
//!
//! An optional [`PipelineBoundary`] registers every live term after a given
//! number of passes (or at convergence, whichever comes first), splitting
//! the tree into two clocked stages.

use crate::config::CompressMode;
use crate::matrix::PartialProductMatrix;
use mulgen_wire::{BitVector, Signedness, WireGraph, WireId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Which clocked stage produced a wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    First,
    Second,
}

/// Register boundary position, counted in completed passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineBoundary {
    pub after_pass: usize,
}

#[derive(Debug, Clone, Copy)]
struct CompressTerm {
    wire: WireId,
    level: usize,
}

/// What one pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReductionStep {
    pub pass: usize,
    pub full_adders: usize,
    pub half_adders: usize,
    pub compressors: usize,
    pub height_before: usize,
    pub height_after: usize,
}

/// Record of a finished reduction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionReport {
    pub mode: CompressMode,
    pub steps: Vec<ReductionStep>,
    pub registered_after: Option<usize>,
    pub final_height: usize,
}

impl fmt::Display for CompressionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} reduction, {} passes, final height {}",
            self.mode,
            self.steps.len(),
            self.final_height
        )?;
        for s in &self.steps {
            write!(
                f,
                "  pass {}: height {} -> {} ({} fa, {} ha, {} 4:2)",
                s.pass, s.height_before, s.height_after, s.full_adders, s.half_adders, s.compressors
            )?;
            if self.registered_after == Some(s.pass) {
                write!(f, " [registered]")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

pub struct ColumnCompressor {
    columns: Vec<Vec<CompressTerm>>,
    mode: CompressMode,
    pipeline: Option<PipelineBoundary>,
    pass: usize,
    stage: Stage,
    steps: Vec<ReductionStep>,
    registered_after: Option<usize>,
}

impl ColumnCompressor {
    pub fn new(
        matrix: &PartialProductMatrix,
        mode: CompressMode,
        pipeline: Option<PipelineBoundary>,
    ) -> Self {
        let mut columns = vec![Vec::new(); matrix.width()];
        for term in matrix.terms() {
            columns[term.column].push(CompressTerm { wire: term.wire, level: 0 });
        }
        ColumnCompressor {
            columns,
            mode,
            pipeline,
            pass: 0,
            stage: Stage::First,
            steps: Vec::new(),
            registered_after: None,
        }
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Completed passes.
    pub fn pass(&self) -> usize {
        self.pass
    }

    pub fn converged(&self) -> bool {
        self.columns.iter().all(|c| c.len() <= 2)
    }

    pub fn column_heights(&self) -> Vec<usize> {
        self.columns.iter().map(|c| c.len()).collect()
    }

    pub fn max_height(&self) -> usize {
        self.columns.iter().map(|c| c.len()).max().unwrap_or(0)
    }

    /// Every live term as `(column, wire)`.
    pub fn wires(&self) -> Vec<(usize, WireId)> {
        let mut out = Vec::new();
        for (c, col) in self.columns.iter().enumerate() {
            for term in col {
                out.push((c, term.wire));
            }
        }
        out
    }

    /// Runs one reduction pass and returns its accounting.
    pub fn step(&mut self, g: &mut WireGraph) -> ReductionStep {
        if let Some(pb) = self.pipeline {
            if self.registered_after.is_none() && self.pass == pb.after_pass {
                self.register_all(g);
            }
        }

        let pass = self.pass + 1;
        let width = self.columns.len();
        let height_before = self.max_height();
        let mut full_adders = 0;
        let mut half_adders = 0;
        let mut compressors = 0;

        // carry-out chain from the previous column, this pass only
        let mut chain: VecDeque<WireId> = VecDeque::new();
        for c in 0..width {
            let incoming = std::mem::take(&mut chain);
            let mut eligible: Vec<CompressTerm> = Vec::new();
            let mut fresh: Vec<CompressTerm> = Vec::new();
            for term in self.columns[c].drain(..) {
                if term.level < pass {
                    eligible.push(term);
                } else {
                    fresh.push(term);
                }
            }
            let mut applied = false;

            if self.mode == CompressMode::Compressors42 {
                let mut incoming = incoming;
                while eligible.len() >= 4 {
                    let taken: Vec<WireId> = eligible.drain(..4).map(|t| t.wire).collect();
                    let cin = incoming.pop_front().unwrap_or_else(|| g.zero());
                    let r = g.compress_4_2(taken[0], taken[1], taken[2], taken[3], cin);
                    compressors += 1;
                    applied = true;
                    fresh.push(CompressTerm { wire: r.sum, level: pass });
                    if c + 1 < width {
                        self.columns[c + 1].push(CompressTerm { wire: r.carry, level: pass });
                        chain.push_back(r.cout);
                    }
                }
                // carry-ins nobody consumed become plain terms here
                for wire in incoming {
                    fresh.push(CompressTerm { wire, level: pass });
                }
            }

            while eligible.len() >= 3 {
                let taken: Vec<WireId> = eligible.drain(..3).map(|t| t.wire).collect();
                let (sum, carry) = g.full_adder(taken[0], taken[1], taken[2]);
                full_adders += 1;
                applied = true;
                fresh.push(CompressTerm { wire: sum, level: pass });
                if c + 1 < width {
                    self.columns[c + 1].push(CompressTerm { wire: carry, level: pass });
                }
            }
            if eligible.len() == 2 && applied {
                let taken: Vec<WireId> = eligible.drain(..2).map(|t| t.wire).collect();
                let (sum, carry) = g.half_adder(taken[0], taken[1]);
                half_adders += 1;
                fresh.push(CompressTerm { wire: sum, level: pass });
                if c + 1 < width {
                    self.columns[c + 1].push(CompressTerm { wire: carry, level: pass });
                }
            }

            eligible.extend(fresh);
            self.columns[c] = eligible;
        }

        self.pass = pass;
        let step = ReductionStep {
            pass,
            full_adders,
            half_adders,
            compressors,
            height_before,
            height_after: self.max_height(),
        };
        tracing::trace!(
            pass,
            full_adders,
            half_adders,
            compressors,
            height = step.height_after,
            "reduction pass"
        );
        self.steps.push(step);
        step
    }

    /// Reduces to at most two terms per column and applies a pending
    /// pipeline boundary, registering at convergence when the boundary sits
    /// past it.
    pub fn compress(&mut self, g: &mut WireGraph) -> CompressionReport {
        while !self.converged() {
            self.step(g);
        }
        if self.pipeline.is_some() && self.registered_after.is_none() {
            self.register_all(g);
        }
        let report = CompressionReport {
            mode: self.mode,
            steps: self.steps.clone(),
            registered_after: self.registered_after,
            final_height: self.max_height(),
        };
        tracing::debug!(
            passes = report.steps.len(),
            final_height = report.final_height,
            "compression finished"
        );
        report
    }

    fn register_all(&mut self, g: &mut WireGraph) {
        for col in &mut self.columns {
            for term in col.iter_mut() {
                term.wire = g.reg(term.wire);
            }
        }
        self.stage = Stage::Second;
        self.registered_after = Some(self.pass);
    }

    /// The two carry-save output rows, LSB aligned, P bits each. Columns
    /// holding fewer than two terms pad with constant zero, so the second
    /// row can be all zeros.
    ///
    /// Panics when some column still holds more than two terms; call
    /// [`compress`](Self::compress) (or [`step`](Self::step) to
    /// convergence) first.
    pub fn rows(&self, g: &mut WireGraph) -> (BitVector, BitVector) {
        assert!(self.converged(), "rows() before convergence");
        let zero = g.zero();
        let mut first = Vec::with_capacity(self.columns.len());
        let mut second = Vec::with_capacity(self.columns.len());
        for col in &self.columns {
            first.push(col.first().map_or(zero, |t| t.wire));
            second.push(col.get(1).map_or(zero, |t| t.wire));
        }
        (
            BitVector::new(first, Signedness::Static(false)),
            BitVector::new(second, Signedness::Static(false)),
        )
    }
}
