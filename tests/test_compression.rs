//! Reduction invariants: every pass preserves the decoded value, the
//! result is exactly two full-width rows, and the same configuration
//! always reduces the same way.

use mulgen_core::{
    model_product, ColumnCompressor, CompressMode, Evaluator, MatrixShape, MulConfig,
    PartialProductGenerator, PartialProducts, ReductionStep, SignExtension,
};
use mulgen_wire::{BitVector, InputId, Signedness, Sim, WireGraph};

struct Uncompressed {
    graph: WireGraph,
    x: InputId,
    y: InputId,
    products: PartialProducts,
}

fn generate(radix: u64, ext: SignExtension, wx: usize, wy: usize) -> Uncompressed {
    let config = MulConfig {
        radix,
        extension: ext,
    };
    let generator = PartialProductGenerator::new(&config).expect("valid config");
    let mut graph = WireGraph::new();
    let (x_id, x_bits) = graph.add_input("x", wx as u16);
    let (y_id, y_bits) = graph.add_input("y", wy as u16);
    let x = BitVector::new(x_bits, Signedness::Static(true));
    let y = BitVector::new(y_bits, Signedness::Static(true));
    let products = generator.generate(&mut graph, &x, &y).expect("generate");
    Uncompressed {
        graph,
        x: x_id,
        y: y_id,
        products,
    }
}

const PAIRS: [(u128, u128); 5] = [(0x8f, 0x73), (0x01, 0xff), (0xb4, 0x2c), (0x80, 0x80), (0, 0xa5)];

#[test]
fn test_each_pass_preserves_value() {
    for mode in [CompressMode::Adders, CompressMode::Compressors42] {
        let mut u = generate(4, SignExtension::StopBits, 8, 8);
        let eval = Evaluator::new(u.products.meta.clone());

        // reference raws from the uncompressed matrix
        let mut raws = Vec::new();
        {
            let mut sim = Sim::new(&u.graph);
            for &(xp, yp) in &PAIRS {
                sim.set(u.x, xp);
                sim.set(u.y, yp);
                sim.settle();
                let raw = eval.decode_matrix(&sim, &u.products.matrix);
                let expect = model_product(xp, 8, true, yp, 8, true) as u128 & 0xffff;
                assert_eq!(raw, expect, "matrix decode x={xp:#x} y={yp:#x}");
                raws.push(raw);
            }
        }

        let mut comp = ColumnCompressor::new(&u.products.matrix, mode, None);
        let mut passes = 0;
        while !comp.converged() {
            comp.step(&mut u.graph);
            passes += 1;
            assert!(passes <= 16, "{mode:?} did not converge");
            let mut sim = Sim::new(&u.graph);
            for (i, &(xp, yp)) in PAIRS.iter().enumerate() {
                sim.set(u.x, xp);
                sim.set(u.y, yp);
                sim.settle();
                assert_eq!(
                    eval.decode_columns(&sim, &comp),
                    raws[i],
                    "{mode:?} pass {passes} x={xp:#x} y={yp:#x}"
                );
            }
        }
        assert!(comp.max_height() <= 2);
    }
}

#[test]
fn test_two_full_width_rows() {
    let mut u = generate(4, SignExtension::CompactRect, 8, 8);
    let eval = Evaluator::new(u.products.meta.clone());
    let mut comp = ColumnCompressor::new(&u.products.matrix, CompressMode::Adders, None);
    let report = comp.compress(&mut u.graph);
    assert!(report.final_height <= 2);
    assert!(comp.column_heights().iter().all(|&h| h <= 2));

    let rows = comp.rows(&mut u.graph);
    assert_eq!(rows.0.width(), 16);
    assert_eq!(rows.1.width(), 16);
    assert_eq!(rows.0.signedness(), Signedness::Static(false));
    assert_eq!(rows.1.signedness(), Signedness::Static(false));

    let mut sim = Sim::new(&u.graph);
    for &(xp, yp) in &PAIRS {
        sim.set(u.x, xp);
        sim.set(u.y, yp);
        sim.settle();
        let expect = model_product(xp, 8, true, yp, 8, true) as u128 & 0xffff;
        assert_eq!(eval.decode_rows(&sim, &rows), expect);
    }
}

#[test]
fn test_compressors42_are_used() {
    // radix 2 with brute extension stacks enough rows to feed 4:2 cells
    let mut u = generate(2, SignExtension::Brute, 8, 8);
    let eval = Evaluator::new(u.products.meta.clone());
    let mut comp = ColumnCompressor::new(&u.products.matrix, CompressMode::Compressors42, None);
    let report = comp.compress(&mut u.graph);
    assert!(report.steps[0].compressors > 0, "{report}");
    assert!(report.final_height <= 2);

    let rows = comp.rows(&mut u.graph);
    let mut sim = Sim::new(&u.graph);
    for &(xp, yp) in &PAIRS {
        sim.set(u.x, xp);
        sim.set(u.y, yp);
        sim.settle();
        let expect = model_product(xp, 8, true, yp, 8, true) as u128 & 0xffff;
        assert_eq!(eval.decode_rows(&sim, &rows), expect);
    }
}

#[test]
fn test_adders_mode_reports_no_compressors() {
    let mut u = generate(4, SignExtension::CompactRect, 8, 8);
    let mut comp = ColumnCompressor::new(&u.products.matrix, CompressMode::Adders, None);
    let report = comp.compress(&mut u.graph);
    assert!(report.steps.iter().all(|s| s.compressors == 0));
    assert!(report.steps.iter().any(|s| s.full_adders > 0));
}

fn reduce_trace(radix: u64, ext: SignExtension, wx: usize, wy: usize) -> (MatrixShape, Vec<ReductionStep>) {
    let mut u = generate(radix, ext, wx, wy);
    let shape = u.products.matrix.shape();
    let mut comp = ColumnCompressor::new(&u.products.matrix, CompressMode::Adders, None);
    let report = comp.compress(&mut u.graph);
    (shape, report.steps)
}

#[test]
fn test_same_config_same_shape() {
    let a = reduce_trace(8, SignExtension::CompactRect, 12, 10);
    let b = reduce_trace(8, SignExtension::CompactRect, 12, 10);
    assert_eq!(a, b);

    let c = reduce_trace(4, SignExtension::StopBits, 9, 7);
    let d = reduce_trace(4, SignExtension::StopBits, 9, 7);
    assert_eq!(c, d);
}
