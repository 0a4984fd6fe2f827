//! The [`Monomial`] trait: one term of the HMC Hamiltonian.

use gluon_core::GaugeField;
use gluon_state::GaugeConfig;
use rand::RngCore;

use crate::error::MonomialError;

/// A term `S(U)` of the molecular-dynamics action.
///
/// Pseudofermion monomials carry internal fields drawn by
/// [`refresh_internal_fields`](Self::refresh_internal_fields) at the
/// start of a trajectory; [`s`](Self::s) and [`dsdq`](Self::dsdq) then
/// evaluate the action and force on any configuration.
pub trait Monomial: Send + Sync {
    /// Registry name.
    fn name(&self) -> &'static str;

    /// Draw the internal fields from their heatbath distribution on
    /// `gauge`.
    fn refresh_internal_fields(
        &mut self,
        gauge: &GaugeConfig,
        rng: &mut dyn RngCore,
    ) -> Result<(), MonomialError>;

    /// The action.
    fn s(&self, gauge: &GaugeConfig) -> Result<f64, MonomialError>;

    /// The force: the traceless antihermitian `F` with
    /// `dS/dt = Σ Re tr(F_μ(x) H_μ(x))` along `U(t) = e^{tH} U`.
    fn dsdq(&self, gauge: &GaugeConfig) -> Result<GaugeField, MonomialError>;
}
