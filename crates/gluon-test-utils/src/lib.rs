//! Test fixtures for Gluon development.
//!
//! Small lattices, seeded random gauge and fermion fields, prebuilt
//! fermion states, partial-fraction approximations of powers, and XML
//! snippets for the factory-driven scenarios.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
pub mod rational;
pub mod xml;

pub use fixtures::*;
pub use rational::Pfe;
pub use xml::*;
