//! The tiled multiplier core.
//!
//! All kernels share one contract: row-major `a` (m × k) and `b` (k × n),
//! and a pre-allocated, zero-initialized `c` (m × n) that receives
//! `C = A × B` by scalar double-precision accumulation. The variants differ
//! only in loop order and tiling, which changes the floating-point summation
//! order but not the mathematical result beyond representable epsilon.
//!
//! Algorithm choice is a data value: build a [`MultiplyConfig`] and hand it
//! to [`multiply`], or call the individual kernels directly.

use std::cmp::min;
use std::ops::Range;

use crate::transpose::transpose;
use crate::{DEFAULT_TILE_EDGE, TRANSPOSE_BLOCK};

/// The algorithmic variants the benchmark compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// i-j-k loop order with a local accumulator per output cell.
    Naive,
    /// i-k-j loop order: broadcast `A[i,k]`, scatter-accumulate into the
    /// C row. More write traffic, fewer reads of A per row.
    RowBroadcast,
    /// Three nested tile loops sized to keep the working set cache-resident.
    Blocked,
    /// The blocked variant fanned out over disjoint row bands.
    BlockedParallel,
}

/// Everything [`multiply`] needs to pick and parameterize a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiplyConfig {
    pub algorithm: Algorithm,
    /// Tile edge for the blocked variants, typically from a
    /// [`BlockPlan`](crate::BlockPlan).
    pub tile_edge: usize,
    /// Number of row-band tasks submitted to the worker pool
    /// ([`Algorithm::BlockedParallel`] only).
    pub thread_count: usize,
    /// Transpose B first and reduce over sequential rows of A and Bᵀ
    /// (naive / row-broadcast only; requires a square B).
    pub transpose_b: bool,
}

impl MultiplyConfig {
    pub fn new(algorithm: Algorithm) -> Self {
        MultiplyConfig {
            algorithm,
            tile_edge: DEFAULT_TILE_EDGE,
            thread_count: 1,
            transpose_b: false,
        }
    }

    pub fn blocked(tile_edge: usize) -> Self {
        MultiplyConfig {
            tile_edge,
            ..Self::new(Algorithm::Blocked)
        }
    }

    pub fn blocked_parallel(tile_edge: usize, thread_count: usize) -> Self {
        MultiplyConfig {
            tile_edge,
            thread_count,
            ..Self::new(Algorithm::BlockedParallel)
        }
    }

    pub fn with_transposed_b(mut self) -> Self {
        self.transpose_b = true;
        self
    }
}

/// Single dispatch entry point: runs the kernel selected by `config`.
///
/// For naive/row-broadcast with `transpose_b` set, B is transposed into a
/// scratch buffer first and both operands are then read row-sequentially;
/// with a transposed operand in hand the two patterns collapse to the same
/// dot-product reduction, so one kernel serves both.
///
/// # Panics
///
/// Panics on mismatched buffer lengths, on `transpose_b` with a non-square
/// B, or on `transpose_b` combined with a blocked variant.
pub fn multiply(
    config: &MultiplyConfig,
    m: usize,
    n: usize,
    k: usize,
    a: &[f64],
    b: &[f64],
    c: &mut [f64],
) {
    match config.algorithm {
        Algorithm::Naive | Algorithm::RowBroadcast if config.transpose_b => {
            check_dims(m, n, k, a, b, c);
            assert_eq!(
                k, n,
                "transposed-operand mode requires a square B, got {k}x{n}"
            );
            let mut bt = vec![0.0; k * n];
            transpose(b, &mut bt, n, TRANSPOSE_BLOCK);
            multiply_transposed(m, n, k, a, &bt, c);
        }
        Algorithm::Naive => multiply_naive(m, n, k, a, b, c),
        Algorithm::RowBroadcast => multiply_row_broadcast(m, n, k, a, b, c),
        Algorithm::Blocked => {
            assert!(!config.transpose_b, "blocked variants take B as-is");
            multiply_blocked(m, n, k, config.tile_edge, a, b, c);
        }
        Algorithm::BlockedParallel => {
            assert!(!config.transpose_b, "blocked variants take B as-is");
            multiply_blocked_parallel(
                m,
                n,
                k,
                config.tile_edge,
                config.thread_count,
                a,
                b,
                c,
            );
        }
    }
}

/// Textbook i-j-k multiplication.
///
/// Each output cell accumulates into a local scalar across the whole
/// k-range and is stored once, avoiding redundant round-trips to C. The
/// inner loop reads B with stride `n`, which is what makes this the slow
/// baseline.
pub fn multiply_naive(m: usize, n: usize, k: usize, a: &[f64], b: &[f64], c: &mut [f64]) {
    check_dims(m, n, k, a, b, c);

    for i in 0..m {
        let a_row = &a[i * k..(i + 1) * k];
        for j in 0..n {
            let mut acc = 0.0;
            for (p, &a_val) in a_row.iter().enumerate() {
                acc += a_val * b[p * n + j];
            }
            c[i * n + j] = acc;
        }
    }
}

/// i-k-j multiplication: one broadcast of `A[i,k]` per inner loop.
///
/// The inner loop walks a row of B and the matching row of C with stride 1,
/// trading n extra writes to C for sequential access on both sides.
pub fn multiply_row_broadcast(m: usize, n: usize, k: usize, a: &[f64], b: &[f64], c: &mut [f64]) {
    check_dims(m, n, k, a, b, c);

    for (i, c_row) in c.chunks_exact_mut(n).enumerate() {
        let a_row = &a[i * k..(i + 1) * k];
        for (p, &a_val) in a_row.iter().enumerate() {
            let b_row = &b[p * n..(p + 1) * n];
            for (c_val, &b_val) in c_row.iter_mut().zip(b_row) {
                *c_val += a_val * b_val;
            }
        }
    }
}

/// Multiplication against a pre-transposed B.
///
/// `bt` is Bᵀ (n × k), so every output cell is a dot product of two
/// row-sequential slices. Worth the transpose when k is large and B is
/// reused.
pub fn multiply_transposed(m: usize, n: usize, k: usize, a: &[f64], bt: &[f64], c: &mut [f64]) {
    assert_eq!(a.len(), m * k, "A: expected {m}x{k}={} elements", m * k);
    assert_eq!(bt.len(), n * k, "B^T: expected {n}x{k}={} elements", n * k);
    assert_eq!(c.len(), m * n, "C: expected {m}x{n}={} elements", m * n);

    for (i, c_row) in c.chunks_exact_mut(n).enumerate() {
        let a_row = &a[i * k..(i + 1) * k];
        for (j, c_val) in c_row.iter_mut().enumerate() {
            let bt_row = &bt[j * k..(j + 1) * k];
            let mut acc = 0.0;
            for (&a_val, &b_val) in a_row.iter().zip(bt_row) {
                acc += a_val * b_val;
            }
            *c_val = acc;
        }
    }
}

/// Cache-blocked multiplication with tile edge `tile_edge`.
///
/// Three nested tile loops over i, j and k, clipped at the matrix boundary;
/// inside a tile the naive accumulation pattern runs over the tile's
/// extents. Accumulation is therefore tile-major rather than one unbroken
/// k-reduction, which permutes the summation order relative to
/// [`multiply_naive`] without changing the result beyond epsilon.
pub fn multiply_blocked(
    m: usize,
    n: usize,
    k: usize,
    tile_edge: usize,
    a: &[f64],
    b: &[f64],
    c: &mut [f64],
) {
    check_dims(m, n, k, a, b, c);
    assert!(tile_edge > 0, "tile edge must be positive");

    blocked_band(a, b, c, 0..m, n, k, tile_edge);
}

/// Blocked multiplication fanned out over `thread_count` row bands.
///
/// `[0, m)` is split into contiguous, tile-aligned, non-overlapping row
/// ranges; one task per range goes to the rayon pool and the call joins
/// before returning. Each band owns its rows of C outright, so no cell is
/// ever written by two tasks and no synchronization beyond the final join
/// exists. Because the bands align with the tile grid, every cell's
/// summation order matches the sequential blocked variant and the result is
/// bit-identical for any `thread_count`.
pub fn multiply_blocked_parallel(
    m: usize,
    n: usize,
    k: usize,
    tile_edge: usize,
    thread_count: usize,
    a: &[f64],
    b: &[f64],
    c: &mut [f64],
) {
    check_dims(m, n, k, a, b, c);
    assert!(tile_edge > 0, "tile edge must be positive");
    assert!(thread_count > 0, "thread count must be positive");

    let ranges = row_ranges(m, tile_edge, thread_count);
    if ranges.len() == 1 {
        blocked_band(a, b, c, 0..m, n, k, tile_edge);
        return;
    }

    rayon::scope(|s| {
        let mut rest = c;
        for rows in ranges {
            let (band, tail) = std::mem::take(&mut rest).split_at_mut(rows.len() * n);
            rest = tail;
            s.spawn(move |_| blocked_band(a, b, band, rows, n, k, tile_edge));
        }
    });
}

/// Runs the blocked kernel over one band of C rows.
///
/// `c_band` holds exactly the rows `rows` of C. `rows.start` must lie on
/// the tile grid so the band's i-tiles coincide with the sequential ones.
fn blocked_band(
    a: &[f64],
    b: &[f64],
    c_band: &mut [f64],
    rows: Range<usize>,
    n: usize,
    k: usize,
    tile_edge: usize,
) {
    debug_assert_eq!(rows.start % tile_edge, 0);
    let row0 = rows.start;

    for i0 in rows.clone().step_by(tile_edge) {
        let i_end = min(i0 + tile_edge, rows.end);
        for j0 in (0..n).step_by(tile_edge) {
            let j_end = min(j0 + tile_edge, n);
            for k0 in (0..k).step_by(tile_edge) {
                let k_end = min(k0 + tile_edge, k);
                for i in i0..i_end {
                    let a_row = &a[i * k..(i + 1) * k];
                    let c_row = &mut c_band[(i - row0) * n..(i - row0 + 1) * n];
                    for j in j0..j_end {
                        let mut acc = c_row[j];
                        for p in k0..k_end {
                            acc += a_row[p] * b[p * n + j];
                        }
                        c_row[j] = acc;
                    }
                }
            }
        }
    }
}

/// Splits `[0, m)` into at most `tasks` contiguous row ranges aligned to
/// the tile grid.
///
/// Ranges never overlap and collectively cover `[0, m)`; surplus tiles go
/// to the leading ranges. Fewer ranges come back when there aren't enough
/// tiles to go around.
fn row_ranges(m: usize, tile_edge: usize, tasks: usize) -> Vec<Range<usize>> {
    let tiles = m.div_ceil(tile_edge);
    let tasks = tasks.min(tiles).max(1);
    let per_task = tiles / tasks;
    let extra = tiles % tasks;

    let mut ranges = Vec::with_capacity(tasks);
    let mut tile = 0;
    for t in 0..tasks {
        let take = per_task + usize::from(t < extra);
        let start = tile * tile_edge;
        tile += take;
        ranges.push(start..min(tile * tile_edge, m));
    }
    ranges
}

fn check_dims(m: usize, n: usize, k: usize, a: &[f64], b: &[f64], c: &[f64]) {
    assert_eq!(a.len(), m * k, "A: expected {m}x{k}={} elements", m * k);
    assert_eq!(b.len(), k * n, "B: expected {k}x{n}={} elements", k * n);
    assert_eq!(c.len(), m * n, "C: expected {m}x{n}={} elements", m * n);
}
