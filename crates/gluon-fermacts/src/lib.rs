//! Fermion actions for Gluon.
//!
//! An action reads its parameter block from configuration, builds the
//! fermion state its operators need, and hands out fresh operators on
//! request. Which operators it can build is discovered through the
//! capability queries on [`FermAct`].
//!
//! # Modules
//!
//! - [`params`]: parameter blocks
//! - [`fermact`]: [`FermAct`] and the capability traits
//! - [`clover`]: `CLOVER` and `SLRC`
//! - [`kno`]: the `KNO` domain-wall array action
//! - [`overlap`]: `OVERLAP_POLE_4D`, [`Lg5Eps`] and [`OverlapPoleLinOp`]
//! - [`factory`]: the `FermAct` registry

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod clover;
pub mod factory;
pub mod fermact;
pub mod kno;
pub mod overlap;
pub mod params;

pub use clover::{CloverFermAct, SlrcFermAct};
pub use factory::{create_ferm_act, register_all, FERM_ACT_FACTORY};
pub use fermact::{
    EvenOddPrecFermAct4d, EvenOddPrecFermActArray, FermAct, UnprecFermAct4d, EO_PREC_4D,
    EO_PREC_ARRAY, UNPREC_4D,
};
pub use kno::KnoFermActArray;
pub use overlap::{Lg5Eps, OverlapLowModes, OverlapPoleFermAct, OverlapPoleLinOp};
pub use params::{
    AnisoParam, CloverFermActParams, HisqFermActParams, KnoFermActParams, OverlapPoleParams,
};
