//! Core types and traits for the Gluon lattice QCD library.
//!
//! This is the leaf crate with no internal dependencies. It defines the
//! small algebraic types every other crate works with (colour matrices,
//! spinors, gamma matrices), the dense lattice fields built from them,
//! the shared configuration error, and the named-constructor
//! [`Factory`] registry that binds configuration strings to
//! implementations.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod color;
pub mod dense;
pub mod error;
pub mod factory;
pub mod field;
pub mod gamma;
pub mod id;
pub mod random;
pub mod spinor;

pub use color::{ColorMatrix, ColorVector};
pub use error::ConfigError;
pub use factory::{Creator, Factory};
pub use field::{FermionArray, FermionField, GaugeField, LatticeFermion};
pub use id::{Parity, PlusMinus, NC, ND, NS};
pub use num_complex::Complex64;
pub use spinor::{SpinMatrix, Spinor};
