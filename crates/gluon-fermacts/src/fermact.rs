//! The fermion action traits.
//!
//! A [`FermAct`] binds a parameter block to a way of building fermion
//! states. What kind of operator it can produce is discovered through
//! the capability queries: callers ask for the view they need and get
//! `None` when the action does not offer it.

use std::sync::Arc;

use gluon_core::{ConfigError, FermionArray, GaugeField, LatticeFermion};
use gluon_layout::Layout;
use gluon_linop::{EvenOddPrecLinearOperator, LinearOperator};
use gluon_state::FermState;

/// Capability name of [`EvenOddPrecFermAct4d`].
pub const EO_PREC_4D: &str = "even-odd preconditioned 4D";
/// Capability name of [`EvenOddPrecFermActArray`].
pub const EO_PREC_ARRAY: &str = "even-odd preconditioned 5D array";
/// Capability name of [`UnprecFermAct4d`].
pub const UNPREC_4D: &str = "unpreconditioned 4D";

/// A fermion action.
pub trait FermAct: Send + Sync {
    /// Registry name (`"CLOVER"`, `"KNO"`, ...).
    fn name(&self) -> &'static str;

    /// Bare quark mass.
    fn quark_mass(&self) -> f64;

    /// Number of flavours: `N5` for 5D arrays, 1 otherwise.
    fn flavor_count(&self) -> usize {
        1
    }

    /// Build the fermion state this action's operators need.
    fn create_state(
        &self,
        layout: &Arc<Layout>,
        gauge: &GaugeField,
    ) -> Result<Arc<dyn FermState>, ConfigError>;

    /// Name of the capability this action offers, for diagnostics.
    fn capability(&self) -> &'static str;

    /// The even-odd preconditioned 4D view, if any.
    fn as_eo_prec_4d(&self) -> Option<&dyn EvenOddPrecFermAct4d> {
        None
    }

    /// The even-odd preconditioned 5D array view, if any.
    fn as_eo_prec_array(&self) -> Option<&dyn EvenOddPrecFermActArray> {
        None
    }

    /// The unpreconditioned 4D view, if any.
    fn as_unprec_4d(&self) -> Option<&dyn UnprecFermAct4d> {
        None
    }
}

/// An action with an even-odd preconditioned 4D operator.
pub trait EvenOddPrecFermAct4d: FermAct {
    /// A new operator bound to `state`. Calls share no operator state.
    fn linop(
        &self,
        state: &Arc<dyn FermState>,
    ) -> Result<Box<dyn EvenOddPrecLinearOperator<LatticeFermion>>, ConfigError>;
}

/// An action with an even-odd preconditioned 5D array operator.
pub trait EvenOddPrecFermActArray: FermAct {
    /// Fifth-dimension extent.
    fn n5(&self) -> usize;

    /// A new operator bound to `state`.
    fn linop(
        &self,
        state: &Arc<dyn FermState>,
    ) -> Result<Box<dyn EvenOddPrecLinearOperator<FermionArray>>, ConfigError>;

    /// The Pauli–Villars operator: the same action at unit mass.
    fn linop_pv(
        &self,
        state: &Arc<dyn FermState>,
    ) -> Result<Box<dyn EvenOddPrecLinearOperator<FermionArray>>, ConfigError>;
}

/// An action whose operator acts on the whole lattice.
pub trait UnprecFermAct4d: FermAct {
    /// A new operator bound to `state`.
    fn linop(
        &self,
        state: &Arc<dyn FermState>,
    ) -> Result<Box<dyn LinearOperator<LatticeFermion>>, ConfigError>;
}
