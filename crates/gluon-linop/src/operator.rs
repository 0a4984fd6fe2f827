//! The [`LinearOperator`] and [`EvenOddPrecLinearOperator`] traits.

use std::sync::Arc;

use gluon_core::{Complex64, FermionField, GaugeField, Parity, PlusMinus};
use gluon_layout::{Layout, Subset};

/// A linear map on fermion fields of type `T`.
///
/// # Contract
///
/// - `apply` writes `chi` only on [`subset`](Self::subset) and leaves the
///   rest of `chi` untouched; it reads `psi` only on the sites the
///   operator couples to that subset.
/// - `isign == Minus` applies the hermitian conjugate.
/// - Implementations are immutable after construction and may be shared
///   across threads.
pub trait LinearOperator<T: FermionField>: Send + Sync {
    /// `chi = M psi` (or `M† psi`) on the subset.
    fn apply(&self, chi: &mut T, psi: &T, isign: PlusMinus);

    /// Sites the operator acts on.
    fn subset(&self) -> Subset;

    /// Lattice geometry.
    fn layout(&self) -> &Arc<Layout>;

    /// A zero field of the shape this operator acts on.
    fn zero_field(&self) -> T;
}

/// An operator written in 2×2 checkerboard block form
///
/// ```text
///     ⎛ A_ee  M_eo ⎞
/// M = ⎝ M_oe  A_oo ⎠
/// ```
///
/// whose [`apply`](LinearOperator::apply) is the Schur complement on the
/// odd sites, `A_oo − M_oe A_ee⁻¹ M_eo`.
///
/// Each block apply writes only its target checkerboard. Each block
/// derivative returns the raw force `X` of `Re(χ† B ψ)`, i.e.
/// `δ Re(χ† B ψ) = Σ Re tr(X_μ(x) δU_μ(x))`, already expressed with
/// respect to the unmodified thin links.
///
/// Only the even-even log-determinant is part of the interface. Actions
/// whose `A_oo` depends on the gauge field would add an odd-odd
/// counterpart here.
pub trait EvenOddPrecLinearOperator<T: FermionField>: LinearOperator<T> {
    /// `chi_e = A_ee psi_e`.
    fn even_even(&self, chi: &mut T, psi: &T, isign: PlusMinus);

    /// `chi_o = A_oo psi_o`.
    fn odd_odd(&self, chi: &mut T, psi: &T, isign: PlusMinus);

    /// `chi_e = M_eo psi_o`.
    fn even_odd(&self, chi: &mut T, psi: &T, isign: PlusMinus);

    /// `chi_o = M_oe psi_e`.
    fn odd_even(&self, chi: &mut T, psi: &T, isign: PlusMinus);

    /// `chi_e = A_ee⁻¹ psi_e`.
    fn even_even_inv(&self, chi: &mut T, psi: &T, isign: PlusMinus);

    /// Raw force of `Re(χ_e† A_ee ψ_e)`.
    fn deriv_even_even(&self, chi: &T, psi: &T, isign: PlusMinus) -> GaugeField;

    /// Raw force of `Re(χ_o† A_oo ψ_o)`.
    fn deriv_odd_odd(&self, chi: &T, psi: &T, isign: PlusMinus) -> GaugeField;

    /// Raw force of `Re(χ_e† M_eo ψ_o)`.
    fn deriv_even_odd(&self, chi: &T, psi: &T, isign: PlusMinus) -> GaugeField;

    /// Raw force of `Re(χ_o† M_oe ψ_e)`.
    fn deriv_odd_even(&self, chi: &T, psi: &T, isign: PlusMinus) -> GaugeField;

    /// `ln det A_ee`.
    fn log_det_even_even(&self) -> f64;

    /// `chi_o = (A_oo − M_oe A_ee⁻¹ M_eo) psi_o`.
    fn apply_schur(&self, chi: &mut T, psi: &T, isign: PlusMinus) {
        let odd = self.layout().sites(Parity::Odd);
        let mut tmp1 = self.zero_field();
        let mut tmp2 = self.zero_field();
        self.even_odd(&mut tmp1, psi, isign);
        self.even_even_inv(&mut tmp2, &tmp1, isign);
        self.odd_even(&mut tmp1, &tmp2, isign);
        self.odd_odd(chi, psi, isign);
        chi.axpy_on(-Complex64::ONE, &tmp1, odd);
    }

    /// The unpreconditioned operator on all sites.
    fn apply_unprec(&self, chi: &mut T, psi: &T, isign: PlusMinus) {
        let layout = self.layout();
        let mut tmp = self.zero_field();
        self.even_even(chi, psi, isign);
        self.even_odd(&mut tmp, psi, isign);
        chi.axpy_on(Complex64::ONE, &tmp, layout.sites(Parity::Even));
        self.odd_odd(chi, psi, isign);
        self.odd_even(&mut tmp, psi, isign);
        chi.axpy_on(Complex64::ONE, &tmp, layout.sites(Parity::Odd));
    }

    /// Raw force of `Re(χ_o† S ψ_o)` for the Schur operator `S`.
    ///
    /// With `t₂ = A⁻¹ M_eo ψ` and `t₄ = A⁻¹ M_eo χ` (the latter with the
    /// opposite sign), this is `dOO(χ,ψ) − dOE(χ,t₂) + dEE(t₄,t₂) − dEO(t₄,ψ)`.
    fn deriv(&self, chi: &T, psi: &T, isign: PlusMinus) -> GaugeField {
        let dagger = isign.dagger();
        let mut tmp1 = self.zero_field();
        let mut tmp2 = self.zero_field();
        self.even_odd(&mut tmp1, psi, isign);
        self.even_even_inv(&mut tmp2, &tmp1, isign);

        let mut tmp4 = self.zero_field();
        self.even_odd(&mut tmp1, chi, dagger);
        self.even_even_inv(&mut tmp4, &tmp1, dagger);

        let mut ds = self.deriv_odd_odd(chi, psi, isign);
        ds.add_scaled(-1.0, &self.deriv_odd_even(chi, &tmp2, isign));
        ds.add_assign(&self.deriv_even_even(&tmp4, &tmp2, isign));
        ds.add_scaled(-1.0, &self.deriv_even_odd(&tmp4, psi, isign));
        ds
    }
}
