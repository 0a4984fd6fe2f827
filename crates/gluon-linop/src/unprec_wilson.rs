//! Unpreconditioned Wilson operator.

use std::sync::Arc;

use gluon_core::{Complex64, FermionField, LatticeFermion, Parity, PlusMinus, ND};
use gluon_layout::{Layout, Subset};
use gluon_state::FermState;

use crate::dslash::WilsonDslash;
use crate::operator::LinearOperator;

/// `M = (Nd + m) − ½ D` on every site.
#[derive(Debug)]
pub struct UnprecWilsonLinOp {
    state: Arc<dyn FermState>,
    dslash: WilsonDslash,
    diag: f64,
}

impl UnprecWilsonLinOp {
    /// Wilson operator with bare mass `mass` on the state links.
    pub fn new(state: &Arc<dyn FermState>, mass: f64) -> Self {
        Self {
            state: state.clone(),
            dslash: WilsonDslash::isotropic(state.layout().clone()),
            diag: ND as f64 + mass,
        }
    }

    /// Bare mass.
    pub fn mass(&self) -> f64 {
        self.diag - ND as f64
    }
}

impl LinearOperator<LatticeFermion> for UnprecWilsonLinOp {
    fn apply(&self, chi: &mut LatticeFermion, psi: &LatticeFermion, isign: PlusMinus) {
        let layout = self.state.layout();
        for cb in Parity::BOTH {
            self.dslash.apply(self.state.links(), chi, psi, isign, cb);
        }
        let all = layout.all_sites();
        chi.scale_on(-0.5, all);
        chi.axpy_on(Complex64::new(self.diag, 0.0), psi, all);
    }

    fn subset(&self) -> Subset {
        Subset::All
    }

    fn layout(&self) -> &Arc<Layout> {
        self.state.layout()
    }

    fn zero_field(&self) -> LatticeFermion {
        LatticeFermion::new(self.state.layout().volume())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gluon_test_utils::{random_fermion, random_gauge, simple_state, small_layout};

    #[test]
    fn gamma5_hermiticity() {
        let layout = small_layout();
        let u = random_gauge(&layout, 1);
        let m = UnprecWilsonLinOp::new(&simple_state(&layout, &u), -0.4);
        let psi = random_fermion(&layout, 2);
        let mut a = m.zero_field();
        let mut b = m.zero_field();
        m.apply(&mut a, &psi, PlusMinus::Minus);
        let g5psi = LatticeFermion::from_vec(psi.as_slice().iter().map(|p| p.gamma5()).collect());
        m.apply(&mut b, &g5psi, PlusMinus::Plus);
        for x in 0..layout.volume() {
            assert!((a[x] - b[x].gamma5()).norm_sq() < 1e-22);
        }
        assert!((m.mass() + 0.4).abs() < 1e-15);
    }
}
