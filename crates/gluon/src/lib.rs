//! Gluon: lattice QCD fermion actions, even-odd preconditioned Dirac
//! operators and rational HMC monomials.
//!
//! This is the top-level facade crate that re-exports the public API
//! from all Gluon sub-crates. For most users, adding `gluon` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use gluon::prelude::*;
//!
//! gluon::register_all();
//! let xml = XmlReader::parse(
//!     "<FermionAction><FermAct>CLOVER</FermAct>\
//!      <Mass>0.1</Mass><clovCoeff>1.0</clovCoeff></FermionAction>",
//! )
//! .unwrap();
//! let act = create_ferm_act(&xml.child("FermionAction").unwrap()).unwrap();
//!
//! let layout = Arc::new(Layout::new([4, 4, 4, 4]).unwrap());
//! let gauge = GaugeConfig::cold(layout);
//! let state = act.create_state(gauge.layout(), gauge.links()).unwrap();
//! let m = act.as_eo_prec_4d().unwrap().linop(&state).unwrap();
//! assert_eq!(m.subset(), Subset::Odd);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the
//! prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `gluon-core` | Colour and spin algebra, fields, `ConfigError`, `Factory` |
//! | [`layout`] | `gluon-layout` | Lattice geometry and checkerboards |
//! | [`xml`] | `gluon-xml` | Parameter I/O |
//! | [`state`] | `gluon-state` | Boundary conditions, stout smearing, fermion states |
//! | [`linop`] | `gluon-linop` | Dirac operators and their derivatives |
//! | [`solver`] | `gluon-solver` | CG and the `QUDA_WILSON_INVERTER` bridge |
//! | [`fermacts`] | `gluon-fermacts` | Fermion actions |
//! | [`monomial`] | `gluon-monomial` | HMC monomials and rational approximations |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core algebra, fields and the registry type (`gluon-core`).
pub use gluon_core as types;

/// Lattice geometry (`gluon-layout`).
///
/// [`layout::Layout`] fixes site numbering and the even/odd split every
/// other crate relies on.
pub use gluon_layout as layout;

/// XML parameter I/O (`gluon-xml`).
pub use gluon_xml as xml;

/// Fermion boundary conditions, stout smearing and fermion states
/// (`gluon-state`).
pub use gluon_state as state;

/// Dirac operators (`gluon-linop`).
///
/// Every concrete operator implements
/// [`linop::EvenOddPrecLinearOperator`].
pub use gluon_linop as linop;

/// System solvers (`gluon-solver`).
///
/// [`solver::CgInverter`] is the reference; [`solver::QudaWilsonSolver`]
/// hands the odd-checkerboard system to an external backend.
pub use gluon_solver as solver;

/// Fermion actions (`gluon-fermacts`).
pub use gluon_fermacts as fermacts;

/// HMC monomials (`gluon-monomial`).
pub use gluon_monomial as monomial;

/// Register every boundary condition, action, solver and monomial.
///
/// Idempotent; returns whether anything new was added. The `create_*`
/// helpers call this themselves, so it is only needed by code that
/// inspects the registries directly.
pub fn register_all() -> bool {
    gluon_monomial::register_all()
}

/// Common imports for typical Gluon usage.
///
/// ```rust
/// use gluon::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use gluon_core::{
        Complex64, ConfigError, FermionArray, FermionField, GaugeField, LatticeFermion, Parity,
        PlusMinus,
    };

    // Geometry and I/O
    pub use gluon_layout::{Layout, Subset};
    pub use gluon_xml::{ReadXml, WriteXml, XmlReader, XmlWriter};

    // States
    pub use gluon_state::{FermBc, FermState, GaugeConfig};

    // Operators and solvers
    pub use gluon_linop::{EvenOddPrecLinearOperator, LinearOperator};
    pub use gluon_solver::{create_mdagm_solver, MdagMSystemSolver, SysSolverArgs};

    // Actions
    pub use gluon_fermacts::{create_ferm_act, EvenOddPrecFermAct4d, EvenOddPrecFermActArray, FermAct};

    // Monomials
    pub use gluon_monomial::{create_monomial, Monomial, MonomialError};
}
