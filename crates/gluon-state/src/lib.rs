//! Fermion states for Gluon.
//!
//! A fermion state packages the gauge links a Dirac operator is built
//! from: the configuration with fermion boundary conditions applied and,
//! for smeared actions, the stout-smeared links together with everything
//! needed to push forces back to the thin links.
//!
//! # Modules
//!
//! - [`bc`]: boundary conditions ([`FermBc`], [`SimpleFermBc`])
//! - [`gauge`]: cold/hot starts and the average plaquette
//! - [`paths`]: path products and their derivatives
//! - [`stout`]: stout smearing and its chain rule
//! - [`state`]: [`FermState`], [`SimpleFermState`], [`SlicFermState`]

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod bc;
pub mod factory;
pub mod gauge;
pub mod paths;
pub mod state;
pub mod stout;

pub use bc::{FermBc, SimpleFermBc};
pub use factory::{read_ferm_bc, register_all, FERM_BC_FACTORY};
pub use gauge::{cold_start, hot_start, GaugeConfig};
pub use paths::{Path, Step};
pub use state::{downcast_arc, FermState, SimpleFermState, SlicFermState};
pub use stout::StoutParams;
