//! Append-only wire graph.
//!
//! Every bit-level value in a generated multiplier is a node in this arena:
//! - `Const` / `Input` leaves,
//! - combinational gates (`Not`, `And`, `Or`, `Xor`, `Mux`),
//! - `Reg`, a D flip-flop sampled on the simulation clock edge.
//!
//! Nodes only reference earlier nodes, so a single forward pass evaluates the
//! whole graph. Construction is deterministic: the same build sequence yields
//! the same ids, which is what makes generated shapes comparable.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a single wire (one bit) in a [`WireGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WireId(pub u32);

impl WireId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// Identifier of a named input word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputId(pub u32);

/// Node kinds. `Mux` follows the `sel ? d1 : d0` convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireOp {
    Const(bool),
    Input { input: InputId, bit: u16 },
    Not(WireId),
    And(WireId, WireId),
    Or(WireId, WireId),
    Xor(WireId, WireId),
    Mux { sel: WireId, d0: WireId, d1: WireId },
    /// D flip-flop. Holds its sampled value for one clock cycle.
    Reg { d: WireId },
}

impl WireOp {
    pub fn short_name(&self) -> &'static str {
        match self {
            WireOp::Const(_) => "const",
            WireOp::Input { .. } => "input",
            WireOp::Not(_) => "not",
            WireOp::And(..) => "and",
            WireOp::Or(..) => "or",
            WireOp::Xor(..) => "xor",
            WireOp::Mux { .. } => "mux",
            WireOp::Reg { .. } => "reg",
        }
    }
}

/// Declared input word: name plus bit width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputInfo {
    pub name: String,
    pub width: u16,
}

/// Per-op-kind node counts, in first-seen order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireStats {
    pub total: usize,
    pub inputs: usize,
    pub registers: usize,
    pub ops: IndexMap<String, usize>,
}

impl fmt::Display for WireStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} wires ({} input words, {} registers)",
            self.total, self.inputs, self.registers
        )?;
        for (name, count) in &self.ops {
            write!(f, "\n  {name:<6} {count}")?;
        }
        Ok(())
    }
}

/// The arena itself. All construction goes through the builder methods, which
/// perform constant folding so statically dead logic never lands in the graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireGraph {
    ops: Vec<WireOp>,
    inputs: Vec<InputInfo>,
    regs: Vec<WireId>,
    const_zero: Option<WireId>,
    const_one: Option<WireId>,
}

impl WireGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, op: WireOp) -> WireId {
        let id = WireId(self.ops.len() as u32);
        self.ops.push(op);
        id
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn op(&self, id: WireId) -> WireOp {
        self.ops[id.index()]
    }

    pub fn ops(&self) -> &[WireOp] {
        &self.ops
    }

    /// Constant wire. The two constants are allocated once and shared.
    pub fn constant(&mut self, value: bool) -> WireId {
        let slot = if value {
            &mut self.const_one
        } else {
            &mut self.const_zero
        };
        if let Some(id) = *slot {
            return id;
        }
        let id = WireId(self.ops.len() as u32);
        self.ops.push(WireOp::Const(value));
        if value {
            self.const_one = Some(id);
        } else {
            self.const_zero = Some(id);
        }
        id
    }

    pub fn zero(&mut self) -> WireId {
        self.constant(false)
    }

    pub fn one(&mut self) -> WireId {
        self.constant(true)
    }

    /// Value of a wire that folded to a constant, if it did.
    pub fn const_value(&self, id: WireId) -> Option<bool> {
        match self.ops[id.index()] {
            WireOp::Const(v) => Some(v),
            _ => None,
        }
    }

    /// Declares a named input word and returns one wire per bit, LSB first.
    pub fn add_input(&mut self, name: &str, width: u16) -> (InputId, Vec<WireId>) {
        let input = InputId(self.inputs.len() as u32);
        self.inputs.push(InputInfo {
            name: name.to_string(),
            width,
        });
        let bits = (0..width)
            .map(|bit| self.push(WireOp::Input { input, bit }))
            .collect();
        (input, bits)
    }

    pub fn inputs(&self) -> &[InputInfo] {
        &self.inputs
    }

    pub fn input_by_name(&self, name: &str) -> Option<InputId> {
        self.inputs
            .iter()
            .position(|i| i.name == name)
            .map(|i| InputId(i as u32))
    }

    // ==== Gate builders =====================================================

    pub fn not(&mut self, a: WireId) -> WireId {
        match self.ops[a.index()] {
            WireOp::Const(v) => self.constant(!v),
            WireOp::Not(inner) => inner,
            _ => self.push(WireOp::Not(a)),
        }
    }

    pub fn and(&mut self, a: WireId, b: WireId) -> WireId {
        match (self.const_value(a), self.const_value(b)) {
            (Some(false), _) | (_, Some(false)) => self.zero(),
            (Some(true), _) => b,
            (_, Some(true)) => a,
            _ if a == b => a,
            _ => self.push(WireOp::And(a, b)),
        }
    }

    pub fn or(&mut self, a: WireId, b: WireId) -> WireId {
        match (self.const_value(a), self.const_value(b)) {
            (Some(true), _) | (_, Some(true)) => self.one(),
            (Some(false), _) => b,
            (_, Some(false)) => a,
            _ if a == b => a,
            _ => self.push(WireOp::Or(a, b)),
        }
    }

    pub fn xor(&mut self, a: WireId, b: WireId) -> WireId {
        match (self.const_value(a), self.const_value(b)) {
            (Some(false), _) => b,
            (_, Some(false)) => a,
            (Some(true), _) => self.not(b),
            (_, Some(true)) => self.not(a),
            _ if a == b => self.zero(),
            _ => self.push(WireOp::Xor(a, b)),
        }
    }

    /// 2:1 multiplexer, `sel ? d1 : d0`.
    pub fn mux(&mut self, sel: WireId, d0: WireId, d1: WireId) -> WireId {
        if d0 == d1 {
            return d0;
        }
        match self.const_value(sel) {
            Some(true) => d1,
            Some(false) => d0,
            None => self.push(WireOp::Mux { sel, d0, d1 }),
        }
    }

    /// D register. Reset state is low; the simulator samples `d` on `clock()`.
    pub fn reg(&mut self, d: WireId) -> WireId {
        let id = self.push(WireOp::Reg { d });
        self.regs.push(id);
        id
    }

    pub fn regs(&self) -> &[WireId] {
        &self.regs
    }

    // ==== Carry-save primitives =============================================

    /// Half adder: `(sum, carry) = (a ^ b, a & b)`.
    pub fn half_adder(&mut self, a: WireId, b: WireId) -> (WireId, WireId) {
        let sum = self.xor(a, b);
        let carry = self.and(a, b);
        (sum, carry)
    }

    /// Full adder: `(sum, carry)` with carry the majority of the inputs.
    pub fn full_adder(&mut self, a: WireId, b: WireId, cin: WireId) -> (WireId, WireId) {
        let axb = self.xor(a, b);
        let sum = self.xor(axb, cin);
        let t0 = self.and(a, b);
        let t1 = self.and(axb, cin);
        let carry = self.or(t0, t1);
        (sum, carry)
    }

    /// 4:2 compressor built from two chained full adders. `cout` depends only
    /// on `a..c`, so horizontal chains never ripple further than one column.
    pub fn compress_4_2(
        &mut self,
        a: WireId,
        b: WireId,
        c: WireId,
        d: WireId,
        cin: WireId,
    ) -> Compress42 {
        let (s1, cout) = self.full_adder(a, b, c);
        let (sum, carry) = self.full_adder(s1, d, cin);
        Compress42 { sum, carry, cout }
    }

    pub fn stats(&self) -> WireStats {
        let mut ops: IndexMap<String, usize> = IndexMap::new();
        for op in &self.ops {
            *ops.entry(op.short_name().to_string()).or_insert(0) += 1;
        }
        WireStats {
            total: self.ops.len(),
            inputs: self.inputs.len(),
            registers: self.regs.len(),
            ops,
        }
    }
}

/// Outputs of [`WireGraph::compress_4_2`]. `sum` keeps the column weight,
/// `carry` and `cout` belong one column up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compress42 {
    pub sum: WireId,
    pub carry: WireId,
    pub cout: WireId,
}
