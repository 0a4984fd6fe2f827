//! Dirac operators for Gluon.
//!
//! Every concrete operator here is even-odd preconditioned: it exposes
//! the four checkerboard blocks, the even-even inverse, the block
//! derivatives and `ln det A_ee` through [`EvenOddPrecLinearOperator`],
//! and its [`LinearOperator::apply`] is the Schur complement on the odd
//! sites.
//!
//! # Modules
//!
//! - [`operator`]: the operator traits and the provided Schur algebra
//! - [`dslash`]: the Wilson hopping term ([`WilsonDslash`])
//! - [`clover`]: the clover term, its inverse and derivatives
//! - [`eoprec_clover`], [`eoprec_slrc`], [`eoprec_kno`]: concrete operators
//! - [`unprec_wilson`]: the unpreconditioned Wilson kernel
//! - [`mdagm`]: `M†M` and shifted `M†M + σ` wrappers

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod clover;
pub mod dslash;
pub mod eoprec_clover;
pub mod eoprec_kno;
pub mod eoprec_slrc;
pub mod mdagm;
pub mod operator;
pub mod unprec_wilson;

pub use clover::{CloverCoeffs, CloverInverse, CloverTerm};
pub use dslash::WilsonDslash;
pub use eoprec_clover::EvenOddPrecCloverLinOp;
pub use eoprec_kno::EvenOddPrecKnoLinOpArray;
pub use eoprec_slrc::EvenOddPrecSlrcLinOp;
pub use mdagm::{MdagMLinOp, ShiftedMdagMLinOp};
pub use operator::{EvenOddPrecLinearOperator, LinearOperator};
pub use unprec_wilson::UnprecWilsonLinOp;
