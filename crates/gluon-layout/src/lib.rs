//! Lattice geometry for Gluon.
//!
//! A [`Layout`] is a four-dimensional periodic hypercubic lattice with
//! precomputed nearest-neighbour tables and the even/odd checkerboard
//! partition every preconditioned operator is built on.
//!
//! Sites are numbered lexicographically with `x` fastest:
//! `site = x + Lx·(y + Ly·(z + Lz·t))`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod layout;
pub mod subset;

pub use error::LayoutError;
pub use layout::Layout;
pub use subset::Subset;
