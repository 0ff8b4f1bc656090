//! Multiply-accumulate: an addend row rides along in the matrix and the
//! compressed result decodes to x * y + (a << shift) mod 2^P.

use mulgen_core::{
    model_product, ColumnCompressor, CompressMode, ConfigError, Evaluator, MulConfig,
    PartialProductGenerator, RowKind, SignExtension,
};
use mulgen_wire::{BitVector, InputId, Signedness, Sim, WireGraph};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

struct MacPath {
    graph: WireGraph,
    x: InputId,
    y: InputId,
    a: InputId,
    rows: (BitVector, BitVector),
    eval: Evaluator,
}

fn build_mac(wx: usize, wy: usize, wa: usize, shift: usize, signed: bool, a_signed: bool) -> MacPath {
    let config = MulConfig {
        radix: 4,
        extension: SignExtension::CompactRect,
    };
    let generator = PartialProductGenerator::new(&config).expect("valid config");
    let mut graph = WireGraph::new();
    let (x_id, x_bits) = graph.add_input("x", wx as u16);
    let (y_id, y_bits) = graph.add_input("y", wy as u16);
    let (a_id, a_bits) = graph.add_input("acc", wa as u16);
    let x = BitVector::new(x_bits, Signedness::Static(signed));
    let y = BitVector::new(y_bits, Signedness::Static(signed));
    let acc = BitVector::new(a_bits, Signedness::Static(a_signed));
    let mut products = generator.generate(&mut graph, &x, &y).expect("generate");
    generator
        .attach_addend(&mut graph, &mut products, &acc, shift)
        .expect("addend fits");
    assert_eq!(products.matrix.rows()[0].kind, RowKind::Addend);

    let mut comp = ColumnCompressor::new(&products.matrix, CompressMode::Adders, None);
    comp.compress(&mut graph);
    let rows = comp.rows(&mut graph);
    MacPath {
        graph,
        x: x_id,
        y: y_id,
        a: a_id,
        rows,
        eval: Evaluator::new(products.meta.clone()),
    }
}

fn as_signed(raw: u128, width: usize) -> i128 {
    if (raw >> (width - 1)) & 1 == 1 {
        raw as i128 - (1i128 << width)
    } else {
        raw as i128
    }
}

/// Reference MAC value over the P-bit ring, interpreted like the product.
fn expect_mac(
    xp: u128,
    yp: u128,
    ap: u128,
    shift: usize,
    wx: usize,
    wy: usize,
    wa: usize,
    signed: bool,
    a_signed: bool,
) -> i128 {
    let pw = wx + wy;
    let mask = (1u128 << pw) - 1;
    let xy = model_product(xp, wx, signed, yp, wy, signed) as u128;
    let av = if a_signed { as_signed(ap, wa) } else { ap as i128 };
    let raw = xy.wrapping_add((av as u128) << shift) & mask;
    if signed {
        as_signed(raw, pw)
    } else {
        raw as i128
    }
}

fn check_mac(
    p: &MacPath,
    sim: &mut Sim,
    xp: u128,
    yp: u128,
    ap: u128,
    shift: usize,
    wx: usize,
    wy: usize,
    wa: usize,
    signed: bool,
    a_signed: bool,
) {
    sim.set(p.x, xp);
    sim.set(p.y, yp);
    sim.set(p.a, ap);
    sim.settle();
    let got = p.eval.decode_signed(sim, p.eval.decode_rows(sim, &p.rows));
    let expect = expect_mac(xp, yp, ap, shift, wx, wy, wa, signed, a_signed);
    assert_eq!(got, expect, "x={xp:#x} y={yp:#x} a={ap:#x} shift={shift}");
}

const X_CORNERS: [u128; 5] = [0, 1, 31, 32, 63];
const A_CORNERS: [u128; 6] = [0, 1, 0x7f, 0x80, 0xaa, 0xff];

#[test]
fn test_mac_signed_addend() {
    let p = build_mac(6, 6, 8, 0, true, true);
    let mut sim = Sim::new(&p.graph);
    for &xp in &X_CORNERS {
        for &yp in &X_CORNERS {
            for &ap in &A_CORNERS {
                check_mac(&p, &mut sim, xp, yp, ap, 0, 6, 6, 8, true, true);
            }
        }
    }
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..500 {
        let xp = rng.gen_range(0..64u128);
        let yp = rng.gen_range(0..64u128);
        let ap = rng.gen_range(0..256u128);
        check_mac(&p, &mut sim, xp, yp, ap, 0, 6, 6, 8, true, true);
    }
}

#[test]
fn test_mac_shifted_addend() {
    let p = build_mac(6, 6, 8, 2, true, true);
    let mut sim = Sim::new(&p.graph);
    for &xp in &X_CORNERS {
        for &yp in &X_CORNERS {
            for &ap in &A_CORNERS {
                check_mac(&p, &mut sim, xp, yp, ap, 2, 6, 6, 8, true, true);
            }
        }
    }
}

#[test]
fn test_mac_unsigned_addend() {
    let p = build_mac(6, 6, 8, 0, true, false);
    let mut sim = Sim::new(&p.graph);
    for &xp in &X_CORNERS {
        for &yp in &X_CORNERS {
            for &ap in &A_CORNERS {
                check_mac(&p, &mut sim, xp, yp, ap, 0, 6, 6, 8, true, false);
            }
        }
    }
}

#[test]
fn test_mac_all_unsigned() {
    let p = build_mac(6, 6, 8, 0, false, false);
    let mut sim = Sim::new(&p.graph);
    for &xp in &X_CORNERS {
        for &yp in &X_CORNERS {
            for &ap in &A_CORNERS {
                check_mac(&p, &mut sim, xp, yp, ap, 0, 6, 6, 8, false, false);
            }
        }
    }
}

#[test]
fn test_mac_addend_at_top_of_product() {
    // shift + width lands exactly on the product boundary
    let p = build_mac(6, 6, 8, 4, true, true);
    let mut sim = Sim::new(&p.graph);
    for &ap in &A_CORNERS {
        check_mac(&p, &mut sim, 17, 44, ap, 4, 6, 6, 8, true, true);
    }
}

#[test]
fn test_addend_out_of_range() {
    let config = MulConfig {
        radix: 4,
        extension: SignExtension::CompactRect,
    };
    let generator = PartialProductGenerator::new(&config).expect("valid config");
    let mut graph = WireGraph::new();
    let (_x_id, x_bits) = graph.add_input("x", 6);
    let (_y_id, y_bits) = graph.add_input("y", 6);
    let (_a_id, a_bits) = graph.add_input("acc", 8);
    let x = BitVector::new(x_bits, Signedness::Static(true));
    let y = BitVector::new(y_bits, Signedness::Static(true));
    let acc = BitVector::new(a_bits, Signedness::Static(true));
    let mut products = generator.generate(&mut graph, &x, &y).expect("generate");
    assert_eq!(
        generator.attach_addend(&mut graph, &mut products, &acc, 5),
        Err(ConfigError::AddendOutOfRange {
            shift: 5,
            end: 13,
            product: 12
        })
    );
}
