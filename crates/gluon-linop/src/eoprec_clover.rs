//! Even-odd preconditioned clover operator.

use std::sync::Arc;

use gluon_core::{ConfigError, FermionField, GaugeField, LatticeFermion, Parity, PlusMinus};
use gluon_layout::{Layout, Subset};
use gluon_state::FermState;

use crate::clover::{CloverCoeffs, CloverInverse, CloverTerm};
use crate::dslash::WilsonDslash;
use crate::operator::{EvenOddPrecLinearOperator, LinearOperator};

/// `A_ee = A_oo = clover`, `M_eo = M_oe = −½ D`, all on the state links.
///
/// The even-even inverse and its log-determinant are computed once, at
/// construction.
#[derive(Debug)]
pub struct EvenOddPrecCloverLinOp {
    state: Arc<dyn FermState>,
    dslash: WilsonDslash,
    clover: CloverTerm,
    inv: CloverInverse,
}

impl EvenOddPrecCloverLinOp {
    /// Build on `state` with the given coefficients.
    pub fn new(state: &Arc<dyn FermState>, coeffs: CloverCoeffs) -> Result<Self, ConfigError> {
        let layout = state.layout().clone();
        let dslash = WilsonDslash::new(layout.clone(), coeffs.hop);
        let clover = CloverTerm::new(layout, state.links(), coeffs);
        let inv = clover.invert(Parity::Even)?;
        tracing::info!(state = state.kind(), "eoprec clover operator built");
        Ok(Self {
            state: state.clone(),
            dslash,
            clover,
            inv,
        })
    }

    /// Raw force of `ln det A_ee`, w.r.t. the unmodified links.
    ///
    /// `A_ee` is Hermitian, so both signs give the same force.
    pub fn deriv_log_det_even_even(&self, _isign: PlusMinus) -> GaugeField {
        let mut ds = self.clover.deriv_trlog(self.state.links(), &self.inv);
        self.state.thin_force(&mut ds);
        ds
    }

    fn hopping(&self, chi: &mut LatticeFermion, psi: &LatticeFermion, isign: PlusMinus, cb: Parity) {
        self.dslash.apply(self.state.links(), chi, psi, isign, cb);
        chi.scale_on(-0.5, self.state.layout().sites(cb));
    }

    fn hopping_deriv(
        &self,
        chi: &LatticeFermion,
        psi: &LatticeFermion,
        isign: PlusMinus,
        cb: Parity,
    ) -> GaugeField {
        let mut ds = self.dslash.deriv(chi, psi, isign, cb);
        ds.scale(-0.5);
        self.state.thin_force(&mut ds);
        ds
    }

    fn clover_deriv(&self, chi: &LatticeFermion, psi: &LatticeFermion, cb: Parity) -> GaugeField {
        let mut ds = self.clover.deriv(self.state.links(), chi, psi, cb);
        self.state.thin_force(&mut ds);
        ds
    }
}

impl LinearOperator<LatticeFermion> for EvenOddPrecCloverLinOp {
    fn apply(&self, chi: &mut LatticeFermion, psi: &LatticeFermion, isign: PlusMinus) {
        self.apply_schur(chi, psi, isign);
    }

    fn subset(&self) -> Subset {
        Subset::Odd
    }

    fn layout(&self) -> &Arc<Layout> {
        self.state.layout()
    }

    fn zero_field(&self) -> LatticeFermion {
        LatticeFermion::new(self.state.layout().volume())
    }
}

impl EvenOddPrecLinearOperator<LatticeFermion> for EvenOddPrecCloverLinOp {
    fn even_even(&self, chi: &mut LatticeFermion, psi: &LatticeFermion, _isign: PlusMinus) {
        self.clover.apply(chi, psi, Parity::Even);
    }

    fn odd_odd(&self, chi: &mut LatticeFermion, psi: &LatticeFermion, _isign: PlusMinus) {
        self.clover.apply(chi, psi, Parity::Odd);
    }

    fn even_odd(&self, chi: &mut LatticeFermion, psi: &LatticeFermion, isign: PlusMinus) {
        self.hopping(chi, psi, isign, Parity::Even);
    }

    fn odd_even(&self, chi: &mut LatticeFermion, psi: &LatticeFermion, isign: PlusMinus) {
        self.hopping(chi, psi, isign, Parity::Odd);
    }

    fn even_even_inv(&self, chi: &mut LatticeFermion, psi: &LatticeFermion, _isign: PlusMinus) {
        self.inv.apply(chi, psi);
    }

    fn deriv_even_even(
        &self,
        chi: &LatticeFermion,
        psi: &LatticeFermion,
        _isign: PlusMinus,
    ) -> GaugeField {
        self.clover_deriv(chi, psi, Parity::Even)
    }

    fn deriv_odd_odd(
        &self,
        chi: &LatticeFermion,
        psi: &LatticeFermion,
        _isign: PlusMinus,
    ) -> GaugeField {
        self.clover_deriv(chi, psi, Parity::Odd)
    }

    fn deriv_even_odd(
        &self,
        chi: &LatticeFermion,
        psi: &LatticeFermion,
        isign: PlusMinus,
    ) -> GaugeField {
        self.hopping_deriv(chi, psi, isign, Parity::Even)
    }

    fn deriv_odd_even(
        &self,
        chi: &LatticeFermion,
        psi: &LatticeFermion,
        isign: PlusMinus,
    ) -> GaugeField {
        self.hopping_deriv(chi, psi, isign, Parity::Odd)
    }

    fn log_det_even_even(&self) -> f64 {
        self.inv.log_det()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gluon_test_utils::{
        central_difference, random_direction, random_fermion, random_fermion_on, random_gauge,
        simple_state, small_layout,
    };

    fn op(seed: u64) -> (Arc<Layout>, GaugeField, EvenOddPrecCloverLinOp) {
        let layout = small_layout();
        let u = random_gauge(&layout, seed);
        let state = simple_state(&layout, &u);
        let m = EvenOddPrecCloverLinOp::new(&state, CloverCoeffs::isotropic(0.1, 1.0, 1.0)).unwrap();
        (layout, u, m)
    }

    #[test]
    fn schur_apply_leaves_even_sites_alone() {
        let (layout, _, m) = op(1);
        let psi = random_fermion_on(&layout, Parity::Odd, 2);
        let mut chi = random_fermion(&layout, 3);
        let before = chi.clone();
        m.apply(&mut chi, &psi, PlusMinus::Plus);
        for &x in layout.sites(Parity::Even) {
            assert_eq!(chi[x], before[x]);
        }
    }

    #[test]
    fn log_det_derivative_matches_finite_difference() {
        let (layout, u, m) = op(4);
        let dir = random_direction(&layout, 5);
        let ds = m.deriv_log_det_even_even(PlusMinus::Plus);
        let fd = central_difference(&u, &dir, 1e-5, |g| {
            let state = simple_state(&layout, g);
            EvenOddPrecCloverLinOp::new(&state, CloverCoeffs::isotropic(0.1, 1.0, 1.0))
                .unwrap()
                .log_det_even_even()
        });
        let an = ds.re_trace_pairing(&dir);
        assert!((fd - an).abs() < 1e-6 * an.abs().max(1.0), "{fd} vs {an}");
    }

    #[test]
    fn unit_links_log_det_is_the_mass_term() {
        let layout = small_layout();
        let u = GaugeField::identity(layout.volume());
        let state = simple_state(&layout, &u);
        let m = EvenOddPrecCloverLinOp::new(&state, CloverCoeffs::isotropic(0.1, 1.0, 1.0)).unwrap();
        let want = layout.half_volume() as f64 * 12.0 * 4.1f64.ln();
        assert!((m.log_det_even_even() - want).abs() < 1e-10);
    }
}
