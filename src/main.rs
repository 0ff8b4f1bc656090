use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use mulgen_core::{
    model_product, ColumnCompressor, CompressMode, CompressionReport, Evaluator, MulConfig,
    PartialProductGenerator, PartialProducts, PipelineBoundary, SignExtension, Stage,
    MAX_OPERAND_WIDTH,
};
use mulgen_wire::{BitVector, InputId, Signedness, Sim, WireGraph};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

/// MULGEN - Booth multiplier datapath generator
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the partial product matrix and output rows for one pair
    Show {
        /// Multiplicand value
        x: i128,

        /// Multiplier value
        y: i128,

        /// Multiplicand width in bits
        #[arg(long, default_value = "8")]
        wx: usize,

        /// Multiplier width in bits
        #[arg(long, default_value = "8")]
        wy: usize,

        /// Encoding radix (power of two)
        #[arg(short, long, default_value = "4")]
        radix: u64,

        /// Sign extension policy
        #[arg(short, long, default_value = "compact-rect")]
        ext: String,

        /// Treat the multiplicand as unsigned
        #[arg(long)]
        unsigned_x: bool,

        /// Treat the multiplier as unsigned
        #[arg(long)]
        unsigned_y: bool,

        /// Reduction primitive set
        #[arg(short, long, default_value = "adders")]
        mode: String,

        /// Register every live term after this reduction pass
        #[arg(short, long)]
        pipeline: Option<usize>,

        /// Print wire and reduction statistics
        #[arg(long)]
        stats: bool,
    },

    /// Check random operand pairs against the reference product
    Sweep {
        /// Multiplicand width in bits
        #[arg(long, default_value = "8")]
        wx: usize,

        /// Multiplier width in bits
        #[arg(long, default_value = "8")]
        wy: usize,

        /// Encoding radix (power of two)
        #[arg(short, long, default_value = "4")]
        radix: u64,

        /// Sign extension policy
        #[arg(short, long, default_value = "compact-rect")]
        ext: String,

        /// Treat the multiplicand as unsigned
        #[arg(long)]
        unsigned_x: bool,

        /// Treat the multiplier as unsigned
        #[arg(long)]
        unsigned_y: bool,

        /// Reduction primitive set
        #[arg(short, long, default_value = "adders")]
        mode: String,

        /// Register every live term after this reduction pass
        #[arg(short, long)]
        pipeline: Option<usize>,

        /// Number of random pairs
        #[arg(short = 'n', long, default_value = "1000")]
        pairs: usize,

        /// RNG seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt().with_env_filter(log_level).init();

    match cli.command {
        Commands::Show {
            x,
            y,
            wx,
            wy,
            radix,
            ext,
            unsigned_x,
            unsigned_y,
            mode,
            pipeline,
            stats,
        } => {
            let opts = BuildOpts {
                radix,
                extension: parse_ext(&ext)?,
                wx,
                wy,
                signed_x: !unsigned_x,
                signed_y: !unsigned_y,
                mode: parse_mode(&mode)?,
                pipeline,
            };
            show(&opts, x, y, stats)?;
        }

        Commands::Sweep {
            wx,
            wy,
            radix,
            ext,
            unsigned_x,
            unsigned_y,
            mode,
            pipeline,
            pairs,
            seed,
        } => {
            let opts = BuildOpts {
                radix,
                extension: parse_ext(&ext)?,
                wx,
                wy,
                signed_x: !unsigned_x,
                signed_y: !unsigned_y,
                mode: parse_mode(&mode)?,
                pipeline,
            };
            sweep(&opts, pairs, seed)?;
        }
    }

    Ok(())
}

fn parse_ext(name: &str) -> Result<SignExtension> {
    Ok(match name {
        "brute" => SignExtension::Brute,
        "stop-bits" => SignExtension::StopBits,
        "compact" => SignExtension::Compact,
        "compact-rect" => SignExtension::CompactRect,
        _ => {
            bail!(
                "Unknown extension: {}. Use 'brute', 'stop-bits', 'compact', or 'compact-rect'",
                name
            );
        }
    })
}

fn parse_mode(name: &str) -> Result<CompressMode> {
    Ok(match name {
        "adders" => CompressMode::Adders,
        "4:2" | "compressors" => CompressMode::Compressors42,
        _ => {
            bail!("Unknown reduction mode: {}. Use 'adders' or '4:2'", name);
        }
    })
}

struct BuildOpts {
    radix: u64,
    extension: SignExtension,
    wx: usize,
    wy: usize,
    signed_x: bool,
    signed_y: bool,
    mode: CompressMode,
    pipeline: Option<usize>,
}

struct Built {
    graph: WireGraph,
    x_id: InputId,
    y_id: InputId,
    products: PartialProducts,
    rows: (BitVector, BitVector),
    report: CompressionReport,
    stage: Stage,
}

/// Generate the matrix, compress it, and keep everything needed for evaluation.
fn build(opts: &BuildOpts) -> Result<Built> {
    // range-checked as usize, before the u16 cast below can wrap
    for (name, width) in [("Multiplicand", opts.wx), ("Multiplier", opts.wy)] {
        if width == 0 || width > MAX_OPERAND_WIDTH {
            bail!(
                "{} width {} outside the supported range 1..={}",
                name,
                width,
                MAX_OPERAND_WIDTH
            );
        }
    }

    let config = MulConfig {
        radix: opts.radix,
        extension: opts.extension,
    };
    let generator = PartialProductGenerator::new(&config)?;

    let mut graph = WireGraph::new();
    let (x_id, x_bits) = graph.add_input("x", opts.wx as u16);
    let (y_id, y_bits) = graph.add_input("y", opts.wy as u16);
    let x = BitVector::new(x_bits, Signedness::Static(opts.signed_x));
    let y = BitVector::new(y_bits, Signedness::Static(opts.signed_y));

    let products = generator.generate(&mut graph, &x, &y)?;
    info!(
        "matrix: {} over {} wires",
        products.matrix.shape(),
        graph.len()
    );

    let boundary = opts
        .pipeline
        .map(|after_pass| PipelineBoundary { after_pass });
    let mut compressor = ColumnCompressor::new(&products.matrix, opts.mode, boundary);
    let report = compressor.compress(&mut graph);
    let rows = compressor.rows(&mut graph);
    let stage = compressor.stage();

    Ok(Built {
        graph,
        x_id,
        y_id,
        products,
        rows,
        report,
        stage,
    })
}

fn show(opts: &BuildOpts, x: i128, y: i128, stats: bool) -> Result<()> {
    let built = build(opts)?;
    let eval = Evaluator::new(built.products.meta.clone());

    let mut sim = Sim::new(&built.graph);
    sim.set_signed(built.x_id, x);
    sim.set_signed(built.y_id, y);
    sim.settle();
    print!("{}", eval.render_matrix(&sim, &built.products.matrix));

    // Registered terms need one clock edge before the output rows are live.
    if built.stage == Stage::Second {
        sim.clock();
    }
    println!();
    print!("{}", eval.render_rows(&sim, &built.rows));

    let raw = eval.decode_rows(&sim, &built.rows);
    let value = eval.decode_signed(&sim, raw);
    let expect = model_product(
        x as u128,
        opts.wx,
        opts.signed_x,
        y as u128,
        opts.wy,
        opts.signed_y,
    );
    if value != expect {
        bail!(
            "Output rows decode to {}, reference product is {}",
            value,
            expect
        );
    }

    if stats {
        println!();
        print!("{}", built.report);
        println!("{}", built.graph.stats());
    }

    Ok(())
}

fn sweep(opts: &BuildOpts, pairs: usize, seed: u64) -> Result<()> {
    let built = build(opts)?;
    let eval = Evaluator::new(built.products.meta.clone());
    info!("sweeping {} pairs over {} wires", pairs, built.graph.len());

    let mut rng = StdRng::seed_from_u64(seed);
    let mut sim = Sim::new(&built.graph);
    for i in 0..pairs {
        let xp = rng.gen_range(0..(1u128 << opts.wx));
        let yp = rng.gen_range(0..(1u128 << opts.wy));
        sim.set(built.x_id, xp);
        sim.set(built.y_id, yp);
        sim.settle();
        if built.stage == Stage::Second {
            sim.clock();
        }
        let got = eval.decode_signed(&sim, eval.decode_rows(&sim, &built.rows));
        let expect = model_product(xp, opts.wx, opts.signed_x, yp, opts.wy, opts.signed_y);
        if got != expect {
            bail!(
                "Pair {} mismatch: x={:#x} y={:#x} decoded {}, expected {}",
                i,
                xp,
                yp,
                got,
                expect
            );
        }
    }

    println!(
        "✅ {} pairs match the reference product ({}x{}, radix {}, {})",
        pairs, opts.wx, opts.wy, opts.radix, opts.extension
    );

    Ok(())
}
