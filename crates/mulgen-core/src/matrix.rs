//! Partial product matrix.
//!
//! Rows of weighted single-bit terms, truncated to the product width `P`.
//! Everything is mod-2^P: a term at column `c` contributes `bit << c`, and
//! any term that would land at or above `P` is dropped at insertion.
//!
//! Terms live in a single flat buffer; a [`Row`] is a `(kind, start, len)`
//! view into it. Column scans walk one contiguous allocation instead of
//! chasing per-row vectors.

use mulgen_wire::WireId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// All-ones mask over the product width.
pub(crate) fn product_mask(width: usize) -> u128 {
    (1u128 << width) - 1
}

/// Role of a term, used when the matrix is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TermKind {
    /// Multiple pattern bit.
    Body,
    /// Sign-extension bit.
    Sign,
    /// Negate carry-in bit.
    Carry,
    /// Bit known at build time.
    Const,
}

/// One weighted bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub column: usize,
    pub wire: WireId,
    pub kind: TermKind,
}

impl Term {
    pub fn body(column: usize, wire: WireId) -> Term {
        Term { column, wire, kind: TermKind::Body }
    }

    pub fn sign(column: usize, wire: WireId) -> Term {
        Term { column, wire, kind: TermKind::Sign }
    }

    pub fn carry(column: usize, wire: WireId) -> Term {
        Term { column, wire, kind: TermKind::Carry }
    }

    pub fn constant(column: usize, wire: WireId) -> Term {
        Term { column, wire, kind: TermKind::Const }
    }
}

/// Provenance of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowKind {
    /// Partial product of digit `i`.
    Digit(usize),
    /// Constant correction row.
    Correction,
    /// Standalone last-negate row.
    Negate,
    /// Accumulate addend.
    Addend,
}

impl RowKind {
    pub fn label(&self) -> String {
        match self {
            RowKind::Digit(i) => format!("pp{i}"),
            RowKind::Correction => "corr".to_string(),
            RowKind::Negate => "neg".to_string(),
            RowKind::Addend => "acc".to_string(),
        }
    }
}

/// Row header over the shared term buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    pub kind: RowKind,
    start: usize,
    len: usize,
}

impl Row {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Value-independent outline of a matrix, for comparing builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixShape {
    pub width: usize,
    pub rows: usize,
    pub terms: usize,
    pub max_height: usize,
    pub column_counts: Vec<usize>,
}

impl fmt::Display for MatrixShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows, {} terms, max height {}, width {}",
            self.rows, self.terms, self.max_height, self.width
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialProductMatrix {
    width: usize,
    terms: Vec<Term>,
    rows: Vec<Row>,
}

impl PartialProductMatrix {
    pub fn new(width: usize) -> Self {
        PartialProductMatrix { width, terms: Vec::new(), rows: Vec::new() }
    }

    /// Product width `P`; no term sits at a column >= this.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Every term in the matrix, in insertion order.
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Terms of one row. `row` must come from this matrix.
    pub fn row_terms(&self, row: &Row) -> &[Term] {
        &self.terms[row.start..row.start + row.len]
    }

    fn store(&mut self, kind: RowKind, mut terms: Vec<Term>) -> Row {
        terms.retain(|t| t.column < self.width);
        let start = self.terms.len();
        let len = terms.len();
        self.terms.extend(terms);
        Row { kind, start, len }
    }

    /// Appends a row, dropping terms at or beyond the product width.
    pub fn push_row(&mut self, kind: RowKind, terms: Vec<Term>) {
        let row = self.store(kind, terms);
        self.rows.push(row);
    }

    /// Inserts a row header in front of the digit rows. Its terms still
    /// append to the buffer; only the row order changes.
    pub fn prepend_row(&mut self, kind: RowKind, terms: Vec<Term>) {
        let row = self.store(kind, terms);
        self.rows.insert(0, row);
    }

    /// Terms per column, LSB first.
    pub fn column_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.width];
        for term in &self.terms {
            counts[term.column] += 1;
        }
        counts
    }

    pub fn max_height(&self) -> usize {
        self.column_counts().into_iter().max().unwrap_or(0)
    }

    pub fn shape(&self) -> MatrixShape {
        let column_counts = self.column_counts();
        MatrixShape {
            width: self.width,
            rows: self.rows.len(),
            terms: self.terms.len(),
            max_height: column_counts.iter().copied().max().unwrap_or(0),
            column_counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mulgen_wire::WireGraph;

    #[test]
    fn test_push_row_truncates_at_width() {
        let mut g = WireGraph::new();
        let one = g.one();
        let mut m = PartialProductMatrix::new(4);
        m.push_row(
            RowKind::Digit(0),
            vec![Term::body(0, one), Term::body(3, one), Term::sign(4, one), Term::sign(9, one)],
        );
        assert_eq!(m.rows()[0].len(), 2);
        assert_eq!(m.column_counts(), vec![1, 0, 0, 1]);
    }

    #[test]
    fn test_prepend_row_lands_first() {
        let mut g = WireGraph::new();
        let one = g.one();
        let mut m = PartialProductMatrix::new(4);
        m.push_row(RowKind::Digit(0), vec![Term::body(0, one)]);
        m.prepend_row(RowKind::Addend, vec![Term::body(1, one)]);
        assert!(matches!(m.rows()[0].kind, RowKind::Addend));
        assert_eq!(m.row_count(), 2);
        // header order flips, buffer order does not
        assert_eq!(m.row_terms(&m.rows()[0])[0].column, 1);
        assert_eq!(m.row_terms(&m.rows()[1])[0].column, 0);
    }

    #[test]
    fn test_rows_view_shared_buffer() {
        let mut g = WireGraph::new();
        let one = g.one();
        let zero = g.zero();
        let mut m = PartialProductMatrix::new(4);
        m.push_row(RowKind::Digit(0), vec![Term::body(0, one), Term::body(1, zero)]);
        m.push_row(RowKind::Digit(1), vec![Term::body(2, one)]);
        assert_eq!(m.terms().len(), 3);
        assert_eq!(m.row_terms(&m.rows()[0]).len(), 2);
        let second = m.row_terms(&m.rows()[1]);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].column, 2);
        assert_eq!(m.rows().iter().map(Row::len).sum::<usize>(), m.terms().len());
    }

    #[test]
    fn test_shape_counts() {
        let mut g = WireGraph::new();
        let one = g.one();
        let zero = g.zero();
        let mut m = PartialProductMatrix::new(3);
        m.push_row(RowKind::Digit(0), vec![Term::body(0, one), Term::body(1, zero)]);
        m.push_row(RowKind::Digit(1), vec![Term::carry(0, one), Term::body(1, one), Term::sign(2, zero)]);
        let shape = m.shape();
        assert_eq!(shape.rows, 2);
        assert_eq!(shape.terms, 5);
        assert_eq!(shape.max_height, 2);
        assert_eq!(shape.column_counts, vec![2, 2, 1]);
        assert_eq!(shape.to_string(), "2 rows, 5 terms, max height 2, width 3");
    }

    #[test]
    fn test_row_labels() {
        assert_eq!(RowKind::Digit(3).label(), "pp3");
        assert_eq!(RowKind::Correction.label(), "corr");
        assert_eq!(RowKind::Negate.label(), "neg");
        assert_eq!(RowKind::Addend.label(), "acc");
    }
}
