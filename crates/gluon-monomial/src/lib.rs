//! Hybrid Monte Carlo monomials for Gluon.
//!
//! A monomial is one term of the molecular-dynamics action: it draws its
//! internal fields at the start of a trajectory and evaluates its action
//! and force on any gauge configuration.
//!
//! # Modules
//!
//! - [`monomial`]: the [`Monomial`] trait
//! - [`rational`]: partial-fraction expansions and their validation
//! - [`one_flavor`]: `ONE_FLAVOR_EOPREC_CONSTDET_FERM_RAT_MONOMIAL`
//! - [`factory`]: the `Name` registry
//! - [`error`]: [`MonomialError`]

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod factory;
pub mod monomial;
pub mod one_flavor;
pub mod rational;

pub use error::MonomialError;
pub use factory::{create_monomial, register_all, MONOMIAL_FACTORY};
pub use monomial::Monomial;
pub use one_flavor::{
    gaussian_odd, OneFlavorEoPrecConstDetFermRatMonomial, OneFlavorRatMonomialParams,
};
pub use rational::{
    PartialFraction, RemezParams, DEFAULT_REL_ERROR_BOUND, VALIDATION_SAMPLES,
};
