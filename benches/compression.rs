//! Generation and reduction performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mulgen_core::{
    ColumnCompressor, CompressMode, MulConfig, PartialProductGenerator, PartialProducts,
    SignExtension,
};
use mulgen_wire::{BitVector, Signedness, Sim, WireGraph};

fn generate(radix: u64, width: usize) -> (WireGraph, PartialProducts) {
    let config = MulConfig {
        radix,
        extension: SignExtension::CompactRect,
    };
    let generator = PartialProductGenerator::new(&config).expect("valid config");
    let mut graph = WireGraph::new();
    let (_, x_bits) = graph.add_input("x", width as u16);
    let (_, y_bits) = graph.add_input("y", width as u16);
    let x = BitVector::new(x_bits, Signedness::Static(true));
    let y = BitVector::new(y_bits, Signedness::Static(true));
    let products = generator.generate(&mut graph, &x, &y).expect("generate");
    (graph, products)
}

fn benchmark_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");

    for (radix, width) in [(4u64, 16usize), (4, 32), (16, 32), (32, 48)] {
        let name = format!("r{radix}_w{width}");
        group.bench_with_input(
            BenchmarkId::from_parameter(name),
            &(radix, width),
            |b, &(radix, width)| {
                b.iter(|| {
                    let (graph, products) = generate(radix, width);
                    black_box((graph.len(), products.matrix.row_count()))
                });
            },
        );
    }
    group.finish();
}

fn benchmark_compress(c: &mut Criterion) {
    let mut group = c.benchmark_group("compress");

    for mode in [CompressMode::Adders, CompressMode::Compressors42] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{mode}")),
            &mode,
            |b, &mode| {
                b.iter(|| {
                    let (mut graph, products) = generate(4, 32);
                    let mut comp = ColumnCompressor::new(&products.matrix, mode, None);
                    let report = comp.compress(&mut graph);
                    black_box(report.steps.len())
                });
            },
        );
    }
    group.finish();
}

fn benchmark_settle(c: &mut Criterion) {
    let mut group = c.benchmark_group("settle");

    for width in [16usize, 32, 48] {
        let (mut graph, products) = generate(4, width);
        let mut comp = ColumnCompressor::new(&products.matrix, CompressMode::Adders, None);
        comp.compress(&mut graph);
        let rows = comp.rows(&mut graph);
        let x = graph.input_by_name("x").expect("x input");
        let y = graph.input_by_name("y").expect("y input");

        group.bench_with_input(
            BenchmarkId::from_parameter(width),
            &width,
            |b, &width| {
                let mut sim = Sim::new(&graph);
                let mask = (1u128 << width) - 1;
                let mut v = 0x9e37_79b9_7f4a_7c15u128;
                b.iter(|| {
                    v = v.wrapping_mul(0x2545_f491_4f6c_dd1d).wrapping_add(1);
                    sim.set(x, v & mask);
                    sim.set(y, (v >> 64) & mask);
                    sim.settle();
                    black_box(sim.read(&rows.0).wrapping_add(sim.read(&rows.1)))
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, benchmark_generate, benchmark_compress, benchmark_settle);

criterion_main!(benches);
