//! Aligned buffer allocation and matrix generation for the harness.

#[cfg(not(target_os = "windows"))]
use std::alloc::{alloc_zeroed, handle_alloc_error, Layout};

use rand::rngs::StdRng;
use rand::Rng;

#[cfg(not(target_os = "windows"))]
use crate::MATRIX_ALIGN;

/// Allocates a zero-initialized `f64` buffer aligned to
/// [`MATRIX_ALIGN`](crate::MATRIX_ALIGN) bytes.
///
/// Alignment is a performance precondition for the kernels, not a
/// correctness one. On Linux/Mac the buffer is handed to `Vec` without
/// copying; `Vec` and `std::alloc` share an allocator there, so ownership
/// transfer is sound.
///
/// # Panics
///
/// Panics on an invalid layout; allocation failure aborts via
/// `handle_alloc_error`.
#[cfg(not(target_os = "windows"))]
pub fn alloc_matrix(len: usize) -> Vec<f64> {
    if len == 0 {
        return Vec::new();
    }

    let layout = Layout::from_size_align(len * std::mem::size_of::<f64>(), MATRIX_ALIGN)
        .expect("invalid layout for aligned matrix buffer");

    let ptr = unsafe { alloc_zeroed(layout) as *mut f64 };
    if ptr.is_null() {
        handle_alloc_error(layout);
    }

    // SAFETY:
    // - ptr is non-null, aligned, and backs `len` zeroed f64 elements
    // - on Linux/Mac, Vec uses the same allocator as std::alloc
    unsafe { Vec::from_raw_parts(ptr, len, len) }
}

/// Plain allocation on Windows, where transferring `std::alloc` buffers
/// into `Vec` can cross allocator boundaries and corrupt the heap.
/// Alignment stays a hint there.
#[cfg(target_os = "windows")]
pub fn alloc_matrix(len: usize) -> Vec<f64> {
    vec![0.0; len]
}

/// Allocates an n×n matrix filled with values drawn from `[1, 10)`.
///
/// Bounded positive inputs keep the product well-conditioned, which is what
/// the cross-variant tolerance checks assume.
pub fn random_matrix(n: usize, rng: &mut StdRng) -> Vec<f64> {
    let mut matrix = alloc_matrix(n * n);
    for value in matrix.iter_mut() {
        *value = rng.random_range(1.0..10.0);
    }
    matrix
}
