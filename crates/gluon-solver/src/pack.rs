//! Flat host buffers for the odd checkerboard.
//!
//! Layout: `[odd site in checkerboard order][spin 0..4][colour 0..3][re, im]`,
//! so every site occupies [`REALS_PER_SITE`] consecutive `f64`s and the
//! buffer for a lattice of volume `V` holds `V/2 · 24` reals. Even sites
//! are never read or written.

use gluon_core::{Complex64, LatticeFermion, Parity, NC, NS};
use gluon_layout::Layout;

use crate::error::SolverError;

/// Reals per packed site: 4 spins × 3 colours × (re, im).
pub const REALS_PER_SITE: usize = NS * NC * 2;

/// Buffer length for the odd half of `layout`.
pub fn odd_buffer_len(layout: &Layout) -> usize {
    layout.half_volume() * REALS_PER_SITE
}

/// Copy the odd half of `f` into a fresh buffer.
pub fn pack_odd(layout: &Layout, f: &LatticeFermion) -> Vec<f64> {
    let mut buf = Vec::with_capacity(odd_buffer_len(layout));
    for &x in layout.sites(Parity::Odd) {
        for v in f[x].s.iter().flatten() {
            buf.push(v.re);
            buf.push(v.im);
        }
    }
    buf
}

/// Overwrite the odd half of `f` from `buf`; even sites are untouched.
pub fn unpack_odd(layout: &Layout, buf: &[f64], f: &mut LatticeFermion) -> Result<(), SolverError> {
    check_len(layout, buf.len())?;
    for (&x, chunk) in layout
        .sites(Parity::Odd)
        .iter()
        .zip(buf.chunks_exact(REALS_PER_SITE))
    {
        for (v, pair) in f[x].s.iter_mut().flatten().zip(chunk.chunks_exact(2)) {
            *v = Complex64::new(pair[0], pair[1]);
        }
    }
    Ok(())
}

pub(crate) fn check_len(layout: &Layout, actual: usize) -> Result<(), SolverError> {
    let expected = odd_buffer_len(layout);
    if actual != expected {
        tracing::error!(expected, actual, "packed buffer size mismatch");
        return Err(SolverError::BufferSize { expected, actual });
    }
    Ok(())
}
