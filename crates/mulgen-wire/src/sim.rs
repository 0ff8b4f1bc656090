//! Two-value simulation of a wire graph.
//!
//! Bind input words, `settle()` combinational logic with one forward pass
//! (node inputs always precede the node in the arena), and `clock()` to make
//! registers sample their D inputs. Reads are plain lookups afterwards.

use crate::vector::{BitVector, Signedness};
use crate::wire::{InputId, WireGraph, WireId, WireOp};

/// Evaluation state bound to one graph.
pub struct Sim<'g> {
    graph: &'g WireGraph,
    values: Vec<bool>,
    reg_state: Vec<bool>,
    input_words: Vec<u128>,
    cycle: u64,
    settled: bool,
}

impl<'g> Sim<'g> {
    /// All inputs start at zero, all registers in their low reset state.
    pub fn new(graph: &'g WireGraph) -> Self {
        Self {
            graph,
            values: vec![false; graph.len()],
            reg_state: vec![false; graph.regs().len()],
            input_words: vec![0; graph.inputs().len()],
            cycle: 0,
            settled: false,
        }
    }

    /// Drives an input word; masked to the declared width.
    pub fn set(&mut self, input: InputId, value: u128) {
        let width = self.graph.inputs()[input.0 as usize].width as u32;
        let mask = if width >= 128 {
            u128::MAX
        } else {
            (1u128 << width) - 1
        };
        self.input_words[input.0 as usize] = value & mask;
        self.settled = false;
    }

    /// Drives a signed value as its two's-complement pattern.
    pub fn set_signed(&mut self, input: InputId, value: i128) {
        self.set(input, value as u128);
    }

    /// Convenience for tests; panics on unknown names.
    pub fn set_by_name(&mut self, name: &str, value: u128) {
        let input = self
            .graph
            .input_by_name(name)
            .unwrap_or_else(|| panic!("no input named {name:?}"));
        self.set(input, value);
    }

    /// One forward pass over the arena.
    pub fn settle(&mut self) {
        let mut reg_cursor = 0;
        for (i, op) in self.graph.ops().iter().enumerate() {
            self.values[i] = match *op {
                WireOp::Const(v) => v,
                WireOp::Input { input, bit } => {
                    (self.input_words[input.0 as usize] >> bit) & 1 == 1
                }
                WireOp::Not(a) => !self.values[a.index()],
                WireOp::And(a, b) => self.values[a.index()] && self.values[b.index()],
                WireOp::Or(a, b) => self.values[a.index()] || self.values[b.index()],
                WireOp::Xor(a, b) => self.values[a.index()] != self.values[b.index()],
                WireOp::Mux { sel, d0, d1 } => {
                    if self.values[sel.index()] {
                        self.values[d1.index()]
                    } else {
                        self.values[d0.index()]
                    }
                }
                WireOp::Reg { .. } => {
                    let v = self.reg_state[reg_cursor];
                    reg_cursor += 1;
                    v
                }
            };
        }
        self.settled = true;
    }

    /// Rising clock edge: every register samples its settled D input.
    pub fn clock(&mut self) {
        if !self.settled {
            self.settle();
        }
        let next: Vec<bool> = self
            .graph
            .regs()
            .iter()
            .map(|r| match self.graph.op(*r) {
                WireOp::Reg { d } => self.values[d.index()],
                _ => unreachable!("regs list only holds Reg nodes"),
            })
            .collect();
        self.reg_state = next;
        self.cycle += 1;
        self.settle();
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn value(&self, wire: WireId) -> bool {
        debug_assert!(self.settled, "read before settle()");
        self.values[wire.index()]
    }

    /// Reads a vector as an unsigned word.
    pub fn read(&self, v: &BitVector) -> u128 {
        let mut word = 0u128;
        for (i, b) in v.bits().iter().enumerate() {
            if self.value(*b) {
                word |= 1 << i;
            }
        }
        word
    }

    /// Reads a vector honoring its signedness; a dynamic select is resolved
    /// from the current binding.
    pub fn read_signed(&self, v: &BitVector) -> i128 {
        let raw = self.read(v);
        let signed = match v.signedness() {
            Signedness::Static(s) => s,
            Signedness::Dynamic(sel) => self.value(sel),
        };
        let width = v.width() as u32;
        if signed && width < 128 && (raw >> (width - 1)) & 1 == 1 {
            raw as i128 - (1i128 << width)
        } else {
            raw as i128
        }
    }
}
