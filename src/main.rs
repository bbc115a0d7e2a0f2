//! Benchmark driver: sweeps matrix sizes across the multiply variants and
//! logs wall time and GFLOP/s to a CSV file.
//!
//! ```text
//! tilemul [naive|broadcast|blocked|parallel ..] [SIZE ..]
//!         [--iterations N] [--tile EDGE] [--tasks N] [--csv PATH]
//! ```
//!
//! Bare words select algorithms, bare numbers select matrix sizes; both
//! default to the full set when omitted. Without `--tile` the tile edge
//! comes from the block-size advisor over a default L1d/L2 topology.

use std::env;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::num::NonZeroUsize;
use std::process::ExitCode;
use std::thread;
use std::time::Instant;

use chrono::Local;
use rand::rngs::StdRng;
use rand::SeedableRng;

use tilemul::error::{csv_error, invalid_argument, Result};
use tilemul::utils::{alloc_matrix, random_matrix};
use tilemul::{
    multiply, select_block_size, Algorithm, BlockPlan, BlockPolicy, CacheLevel, CacheTopology,
    MultiplyConfig, DEFAULT_TILE_EDGE, DEFAULT_USAGE_FRACTION,
};

const DEFAULT_SIZES: &[usize] = &[256, 512, 1024];
const DEFAULT_ITERATIONS: usize = 5;
const DEFAULT_CSV_PATH: &str = "results.csv";
const SEED: u64 = 42;

// Caller-supplied topology for the advisor; adjust to the machine under test.
const L1D_CAPACITY: usize = 32 * 1024;
const L2_CAPACITY: usize = 1024 * 1024;

struct Options {
    algorithms: Vec<Algorithm>,
    sizes: Vec<usize>,
    iterations: usize,
    tile_edge: Option<usize>,
    tasks: usize,
    csv_path: String,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("tilemul: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let options = parse_args(env::args().skip(1))?;
    let tile_edge = pick_tile_edge(&options);
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let mut csv_rows = Vec::new();

    for &size in &options.sizes {
        println!("\n== {size}x{size}, tile {tile_edge} ==");

        let mut rng = StdRng::seed_from_u64(SEED);
        let a = random_matrix(size, &mut rng);
        let b = random_matrix(size, &mut rng);
        let mut c = alloc_matrix(size * size);

        for &algorithm in &options.algorithms {
            let config = config_for(algorithm, tile_edge, options.tasks);
            let name = algorithm_name(algorithm);

            // Warm-up run, not recorded.
            c.fill(0.0);
            multiply(&config, size, size, size, &a, &b, &mut c);

            let mut seconds = Vec::with_capacity(options.iterations);
            for iteration in 0..options.iterations {
                c.fill(0.0);
                let start = Instant::now();
                multiply(&config, size, size, size, &a, &b, &mut c);
                let elapsed = start.elapsed().as_secs_f64();

                let gflops = gflops(size, elapsed);
                println!("{name:<10} iter {iteration}: {elapsed:.3} s  ({gflops:.2} GFLOP/s)");
                csv_rows.push(format!(
                    "{timestamp},{name},{size},{tile_edge},{tasks},{iteration},{elapsed:.6},{gflops:.3}",
                    tasks = options.tasks,
                ));
                seconds.push(elapsed);
            }

            let average = seconds.iter().sum::<f64>() / seconds.len() as f64;
            println!(
                "{name:<10} avg {average:.3} s, median {:.3} s",
                median(&mut seconds)
            );
        }
    }

    append_csv(&options.csv_path, &csv_rows)?;
    println!("\nResults appended to {}", options.csv_path);
    Ok(())
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Options> {
    let mut options = Options {
        algorithms: Vec::new(),
        sizes: Vec::new(),
        iterations: DEFAULT_ITERATIONS,
        tile_edge: None,
        tasks: default_tasks(),
        csv_path: DEFAULT_CSV_PATH.to_string(),
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--iterations" => options.iterations = flag_value(&arg, args.next())?,
            "--tile" => options.tile_edge = Some(flag_value(&arg, args.next())?),
            "--tasks" => options.tasks = flag_value(&arg, args.next())?,
            "--csv" => {
                options.csv_path = args
                    .next()
                    .ok_or_else(|| invalid_argument(arg.as_str(), "expected a file path"))?;
            }
            "naive" => options.algorithms.push(Algorithm::Naive),
            "broadcast" => options.algorithms.push(Algorithm::RowBroadcast),
            "blocked" => options.algorithms.push(Algorithm::Blocked),
            "parallel" => options.algorithms.push(Algorithm::BlockedParallel),
            other => match other.parse::<usize>() {
                Ok(size) if size > 0 => options.sizes.push(size),
                _ => {
                    return Err(invalid_argument(
                        other,
                        "expected naive|broadcast|blocked|parallel, a matrix size, \
                         or --iterations/--tile/--tasks/--csv",
                    ))
                }
            },
        }
    }

    if options.algorithms.is_empty() {
        options.algorithms = vec![
            Algorithm::Naive,
            Algorithm::RowBroadcast,
            Algorithm::Blocked,
            Algorithm::BlockedParallel,
        ];
    }
    if options.sizes.is_empty() {
        options.sizes = DEFAULT_SIZES.to_vec();
    }
    if options.iterations == 0 {
        return Err(invalid_argument("--iterations", "must be positive"));
    }
    if options.tasks == 0 {
        return Err(invalid_argument("--tasks", "must be positive"));
    }
    if options.tile_edge == Some(0) {
        return Err(invalid_argument("--tile", "must be positive"));
    }

    Ok(options)
}

fn flag_value(flag: &str, value: Option<String>) -> Result<usize> {
    let value = value.ok_or_else(|| invalid_argument(flag, "expected a positive integer"))?;
    value
        .parse()
        .map_err(|_| invalid_argument(value.as_str(), "expected a positive integer"))
}

fn default_tasks() -> usize {
    thread::available_parallelism().map_or(4, NonZeroUsize::get)
}

fn config_for(algorithm: Algorithm, tile_edge: usize, tasks: usize) -> MultiplyConfig {
    match algorithm {
        Algorithm::Blocked => MultiplyConfig::blocked(tile_edge),
        Algorithm::BlockedParallel => MultiplyConfig::blocked_parallel(tile_edge, tasks),
        other => MultiplyConfig::new(other),
    }
}

fn algorithm_name(algorithm: Algorithm) -> &'static str {
    match algorithm {
        Algorithm::Naive => "naive",
        Algorithm::RowBroadcast => "broadcast",
        Algorithm::Blocked => "blocked",
        Algorithm::BlockedParallel => "parallel",
    }
}

fn pick_tile_edge(options: &Options) -> usize {
    if let Some(edge) = options.tile_edge {
        return edge;
    }

    let topology = CacheTopology::new(vec![
        CacheLevel::new("L1d", L1D_CAPACITY),
        CacheLevel::new("L2", L2_CAPACITY),
    ]);

    match select_block_size(&topology, DEFAULT_USAGE_FRACTION, BlockPolicy::SmallestAcrossAll) {
        BlockPlan::Edge(edge) => edge,
        BlockPlan::NoSolution => {
            eprintln!("no cache level yields a tile edge, falling back to {DEFAULT_TILE_EDGE}");
            DEFAULT_TILE_EDGE
        }
    }
}

fn gflops(size: usize, seconds: f64) -> f64 {
    2.0 * (size * size * size) as f64 / seconds / 1e9
}

fn median(seconds: &mut [f64]) -> f64 {
    seconds.sort_by(|x, y| x.partial_cmp(y).expect("timings are never NaN"));
    let mid = seconds.len() / 2;
    if seconds.len() % 2 == 0 {
        (seconds[mid - 1] + seconds[mid]) / 2.0
    } else {
        seconds[mid]
    }
}

fn append_csv(path: &str, rows: &[String]) -> Result<()> {
    let needs_header = std::fs::metadata(path).map_or(true, |meta| meta.len() == 0);

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| csv_error(path, source))?;

    if needs_header {
        writeln!(
            file,
            "timestamp,algorithm,size,tile,tasks,iteration,seconds,gflops"
        )
        .map_err(|source| csv_error(path, source))?;
    }
    for row in rows {
        writeln!(file, "{row}").map_err(|source| csv_error(path, source))?;
    }
    Ok(())
}
