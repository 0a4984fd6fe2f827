//! Even-odd preconditioned clover operator with stout-smeared hopping.
//!
//! The relevant (hopping) term sees the fat links, the irrelevant
//! (clover) term the thin ones. Forces from the hopping blocks are pushed
//! back through the smearing; clover forces only need the BC fix-up.

use std::sync::Arc;

use gluon_core::{ConfigError, FermionField, GaugeField, LatticeFermion, Parity, PlusMinus};
use gluon_layout::{Layout, Subset};
use gluon_state::{downcast_arc, FermState, SlicFermState};

use crate::clover::{CloverCoeffs, CloverInverse, CloverTerm};
use crate::dslash::WilsonDslash;
use crate::operator::{EvenOddPrecLinearOperator, LinearOperator};

/// Stout-link relevant clover (SLRC) operator.
#[derive(Debug)]
pub struct EvenOddPrecSlrcLinOp {
    state: Arc<SlicFermState>,
    dslash: WilsonDslash,
    clover: CloverTerm,
    inv: CloverInverse,
}

impl EvenOddPrecSlrcLinOp {
    /// Build on a smeared state.
    ///
    /// Fails with [`ConfigError::WrongStateKind`] unless `state` is a
    /// [`SlicFermState`].
    pub fn new(state: &Arc<dyn FermState>, coeffs: CloverCoeffs) -> Result<Self, ConfigError> {
        let Some(slic) = downcast_arc::<SlicFermState>(state) else {
            tracing::error!(actual = state.kind(), "SLRC operator needs a smeared state");
            return Err(ConfigError::WrongStateKind {
                expected: SlicFermState::KIND,
                actual: state.kind(),
            });
        };
        let layout = slic.layout().clone();
        let dslash = WilsonDslash::new(layout.clone(), coeffs.hop);
        let clover = CloverTerm::new(layout, slic.thin_links(), coeffs);
        let inv = clover.invert(Parity::Even)?;
        tracing::info!(
            n_smear = slic.stout_params().n_smear,
            "eoprec SLRC operator built"
        );
        Ok(Self {
            state: slic,
            dslash,
            clover,
            inv,
        })
    }

    /// Raw force of `ln det A_ee`, w.r.t. the unmodified thin links.
    pub fn deriv_log_det_even_even(&self, _isign: PlusMinus) -> GaugeField {
        let mut ds = self.clover.deriv_trlog(self.state.thin_links(), &self.inv);
        self.state.thin_force(&mut ds);
        ds
    }

    fn hopping(&self, chi: &mut LatticeFermion, psi: &LatticeFermion, isign: PlusMinus, cb: Parity) {
        self.dslash.apply(self.state.fat_links(), chi, psi, isign, cb);
        chi.scale_on(-0.5, self.state.layout().sites(cb));
    }

    fn hopping_deriv(
        &self,
        chi: &LatticeFermion,
        psi: &LatticeFermion,
        isign: PlusMinus,
        cb: Parity,
    ) -> GaugeField {
        let fat = self.dslash.deriv(chi, psi, isign, cb);
        let mut ds = self.state.fat_force_to_thin(&fat);
        ds.scale(-0.5);
        ds
    }

    fn clover_deriv(&self, chi: &LatticeFermion, psi: &LatticeFermion, cb: Parity) -> GaugeField {
        let mut ds = self.clover.deriv(self.state.thin_links(), chi, psi, cb);
        self.state.thin_force(&mut ds);
        ds
    }
}

impl LinearOperator<LatticeFermion> for EvenOddPrecSlrcLinOp {
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

impl EvenOddPrecLinearOperator<LatticeFermion> for EvenOddPrecSlrcLinOp {
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
