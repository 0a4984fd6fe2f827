//! Even-odd preconditioned KNO (Möbius-type) domain-wall operator on a
//! 5D fermion array.
//!
//! With `b_s = (ω_s+1)/2`, `c_s = (ω_s−1)/2` and domain-wall height `M5`:
//!
//! ```text
//! (A ψ)_s = α_s ψ_s + β_s (P₋ ψ_{s+1} + P₊ ψ_{s−1})     α_s = b_s(Nd−M5)+1, β_s = c_s(Nd−M5)−1
//! (B ψ)_s = b_s ψ_s + c_s (P₋ ψ_{s+1} + P₊ ψ_{s−1})
//! M_eo = −½ D_eo B,   M_oe = −½ D_oe B
//! ```
//!
//! Terms wrapping around the fifth dimension pick up `−m`. `A` and `B`
//! do not touch the gauge field, so each is stored as one real `N5×N5`
//! matrix per chirality.

use std::sync::Arc;

use gluon_core::dense::real_inverse;
use gluon_core::{
    ConfigError, FermionArray, FermionField, GaugeField, Parity, PlusMinus, Spinor, NC, ND,
};
use gluon_layout::{Layout, Subset};
use gluon_state::FermState;
use rayon::prelude::*;

use crate::dslash::WilsonDslash;
use crate::operator::{EvenOddPrecLinearOperator, LinearOperator};

/// A real fifth-dimension coupling, one matrix per chirality.
#[derive(Clone, Debug, PartialEq)]
struct ChiralPair {
    plus: Vec<Vec<f64>>,
    minus: Vec<Vec<f64>>,
}

fn transpose(m: &[Vec<f64>]) -> Vec<Vec<f64>> {
    (0..m.len())
        .map(|i| m.iter().map(|row| row[i]).collect())
        .collect()
}

impl ChiralPair {
    /// `diag_s ψ_s + off_s (P₋ψ_{s+1} + P₊ψ_{s−1})` with `−m` wrap-around.
    fn coupling(diag: &[f64], off: &[f64], mass: f64) -> Self {
        let n = diag.len();
        let mut plus = vec![vec![0.0; n]; n];
        let mut minus = vec![vec![0.0; n]; n];
        for s in 0..n {
            plus[s][s] = diag[s];
            minus[s][s] = diag[s];
            if s > 0 {
                plus[s][s - 1] += off[s];
            } else {
                plus[0][n - 1] += -mass * off[0];
            }
            if s + 1 < n {
                minus[s][s + 1] += off[s];
            } else {
                minus[n - 1][0] += -mass * off[n - 1];
            }
        }
        Self { plus, minus }
    }

    fn inverse(&self) -> Option<(Self, f64)> {
        let (plus, dp) = real_inverse(&self.plus)?;
        let (minus, dm) = real_inverse(&self.minus)?;
        Some((Self { plus, minus }, dp.abs().ln() + dm.abs().ln()))
    }

    fn transposed(&self) -> Self {
        Self {
            plus: transpose(&self.plus),
            minus: transpose(&self.minus),
        }
    }

    fn apply_site(&self, psi: &FermionArray, x: usize) -> Vec<Spinor> {
        let n = self.plus.len();
        (0..n)
            .map(|s| {
                let mut r = Spinor::ZERO;
                for t in 0..n {
                    let (p, m) = (self.plus[s][t], self.minus[s][t]);
                    if p != 0.0 {
                        r += psi.slice(t)[x].chiral_plus().scale(p);
                    }
                    if m != 0.0 {
                        r += psi.slice(t)[x].chiral_minus().scale(m);
                    }
                }
                r
            })
            .collect()
    }

    /// `chi = self · psi` on `sites`.
    fn apply(&self, chi: &mut FermionArray, psi: &FermionArray, sites: &[usize]) {
        let values: Vec<Vec<Spinor>> = sites
            .par_iter()
            .map(|&x| self.apply_site(psi, x))
            .collect();
        for (&x, col) in sites.iter().zip(values) {
            for (s, v) in col.into_iter().enumerate() {
                chi.slice_mut(s)[x] = v;
            }
        }
    }
}

/// A signed pair: the matrices and their transposes for `Minus`.
#[derive(Clone, Debug)]
struct Signed {
    plus: ChiralPair,
    minus: ChiralPair,
}

impl Signed {
    fn new(m: ChiralPair) -> Self {
        Self {
            minus: m.transposed(),
            plus: m,
        }
    }

    fn get(&self, isign: PlusMinus) -> &ChiralPair {
        match isign {
            PlusMinus::Plus => &self.plus,
            PlusMinus::Minus => &self.minus,
        }
    }
}

/// KNO domain-wall operator on `N5` slices.
#[derive(Debug)]
pub struct EvenOddPrecKnoLinOpArray {
    state: Arc<dyn FermState>,
    dslash: WilsonDslash,
    mass: f64,
    a: Signed,
    a_inv: Signed,
    b: Signed,
    log_det: f64,
}

impl EvenOddPrecKnoLinOpArray {
    /// Build on `state` with domain-wall height `m5`, quark mass `mass`
    /// and the KNO coefficients `ω_s`, one per slice.
    pub fn new(
        state: &Arc<dyn FermState>,
        m5: f64,
        mass: f64,
        coefs: &[f64],
    ) -> Result<Self, ConfigError> {
        if coefs.is_empty() {
            tracing::error!("KNO operator needs at least one slice");
            return Err(ConfigError::invalid("coefs", "N5 must be positive"));
        }
        let b: Vec<f64> = coefs.iter().map(|w| 0.5 * (w + 1.0)).collect();
        let c: Vec<f64> = coefs.iter().map(|w| 0.5 * (w - 1.0)).collect();
        let nd_m5 = ND as f64 - m5;
        let alpha: Vec<f64> = b.iter().map(|bs| bs * nd_m5 + 1.0).collect();
        let beta: Vec<f64> = c.iter().map(|cs| cs * nd_m5 - 1.0).collect();

        let a = ChiralPair::coupling(&alpha, &beta, mass);
        let Some((a_inv, log_abs_det)) = a.inverse() else {
            let reason = format!("fifth-dimension block is singular (M5 = {m5}, mass = {mass})");
            tracing::error!(%reason, "KNO setup failed");
            return Err(ConfigError::Numerical { reason });
        };

        let layout = state.layout();
        let log_det = (layout.half_volume() * NC * 2) as f64 * log_abs_det;
        tracing::info!(n5 = coefs.len(), m5, mass, "eoprec KNO operator built");
        Ok(Self {
            state: state.clone(),
            dslash: WilsonDslash::isotropic(layout.clone()),
            mass,
            a: Signed::new(a),
            a_inv: Signed::new(a_inv),
            b: Signed::new(ChiralPair::coupling(&b, &c, mass)),
            log_det,
        })
    }

    /// Number of fifth-dimension slices.
    pub fn n5(&self) -> usize {
        self.a.plus.plus.len()
    }

    /// Quark mass.
    pub fn quark_mass(&self) -> f64 {
        self.mass
    }

    fn hopping(&self, chi: &mut FermionArray, psi: &FermionArray, isign: PlusMinus, cb: Parity) {
        let layout = self.state.layout();
        let target = layout.sites(cb);
        let source = layout.sites(cb.opposite());
        let u = self.state.links();
        match isign {
            PlusMinus::Plus => {
                let mut b_psi = psi.zeros_like();
                self.b.plus.apply(&mut b_psi, psi, source);
                for (out, inp) in chi.slices_mut().iter_mut().zip(b_psi.slices()) {
                    self.dslash.apply(u, out, inp, isign, cb);
                }
            }
            PlusMinus::Minus => {
                let mut d_psi = psi.zeros_like();
                for (out, inp) in d_psi.slices_mut().iter_mut().zip(psi.slices()) {
                    self.dslash.apply(u, out, inp, isign, cb);
                }
                self.b.minus.apply(chi, &d_psi, target);
            }
        }
        chi.scale_on(-0.5, target);
    }

    fn hopping_deriv(
        &self,
        chi: &FermionArray,
        psi: &FermionArray,
        isign: PlusMinus,
        cb: Parity,
    ) -> GaugeField {
        let layout = self.state.layout();
        let mut ds = GaugeField::zeros(layout.volume());
        match isign {
            PlusMinus::Plus => {
                let mut b_psi = psi.zeros_like();
                self.b.plus.apply(&mut b_psi, psi, layout.sites(cb.opposite()));
                for (c, p) in chi.slices().iter().zip(b_psi.slices()) {
                    ds.add_assign(&self.dslash.deriv(c, p, isign, cb));
                }
            }
            PlusMinus::Minus => {
                let mut b_chi = chi.zeros_like();
                self.b.plus.apply(&mut b_chi, chi, layout.sites(cb));
                for (c, p) in b_chi.slices().iter().zip(psi.slices()) {
                    ds.add_assign(&self.dslash.deriv(c, p, isign, cb));
                }
            }
        }
        ds.scale(-0.5);
        self.state.thin_force(&mut ds);
        ds
    }
}

impl LinearOperator<FermionArray> for EvenOddPrecKnoLinOpArray {
    fn apply(&self, chi: &mut FermionArray, psi: &FermionArray, isign: PlusMinus) {
        self.apply_schur(chi, psi, isign);
    }

    fn subset(&self) -> Subset {
        Subset::Odd
    }

    fn layout(&self) -> &Arc<Layout> {
        self.state.layout()
    }

    fn zero_field(&self) -> FermionArray {
        FermionArray::new(self.n5(), self.state.layout().volume())
    }
}

impl EvenOddPrecLinearOperator<FermionArray> for EvenOddPrecKnoLinOpArray {
    fn even_even(&self, chi: &mut FermionArray, psi: &FermionArray, isign: PlusMinus) {
        self.a.get(isign).apply(chi, psi, self.state.layout().sites(Parity::Even));
    }

    fn odd_odd(&self, chi: &mut FermionArray, psi: &FermionArray, isign: PlusMinus) {
        self.a.get(isign).apply(chi, psi, self.state.layout().sites(Parity::Odd));
    }

    fn even_odd(&self, chi: &mut FermionArray, psi: &FermionArray, isign: PlusMinus) {
        self.hopping(chi, psi, isign, Parity::Even);
    }

    fn odd_even(&self, chi: &mut FermionArray, psi: &FermionArray, isign: PlusMinus) {
        self.hopping(chi, psi, isign, Parity::Odd);
    }

    fn even_even_inv(&self, chi: &mut FermionArray, psi: &FermionArray, isign: PlusMinus) {
        self.a_inv
            .get(isign)
            .apply(chi, psi, self.state.layout().sites(Parity::Even));
    }

    fn deriv_even_even(&self, _: &FermionArray, _: &FermionArray, _: PlusMinus) -> GaugeField {
        GaugeField::zeros(self.state.layout().volume())
    }

    fn deriv_odd_odd(&self, _: &FermionArray, _: &FermionArray, _: PlusMinus) -> GaugeField {
        GaugeField::zeros(self.state.layout().volume())
    }

    fn deriv_even_odd(
        &self,
        chi: &FermionArray,
        psi: &FermionArray,
        isign: PlusMinus,
    ) -> GaugeField {
        self.hopping_deriv(chi, psi, isign, Parity::Even)
    }

    fn deriv_odd_even(
        &self,
        chi: &FermionArray,
        psi: &FermionArray,
        isign: PlusMinus,
    ) -> GaugeField {
        self.hopping_deriv(chi, psi, isign, Parity::Odd)
    }

    fn log_det_even_even(&self) -> f64 {
        self.log_det
    }
}
