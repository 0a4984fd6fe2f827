//! Normal-equation wrappers.

use std::sync::Arc;

use gluon_core::{Complex64, FermionField, PlusMinus};
use gluon_layout::{Layout, Subset};

use crate::operator::LinearOperator;

/// `M†M` on the subset of `M`. Hermitian, so `isign` is ignored.
pub struct MdagMLinOp<'a, T: FermionField> {
    m: &'a dyn LinearOperator<T>,
}

impl<'a, T: FermionField> MdagMLinOp<'a, T> {
    /// Wrap `m`.
    pub fn new(m: &'a dyn LinearOperator<T>) -> Self {
        Self { m }
    }
}

impl<T: FermionField> LinearOperator<T> for MdagMLinOp<'_, T> {
    fn apply(&self, chi: &mut T, psi: &T, _isign: PlusMinus) {
        let mut tmp = self.m.zero_field();
        self.m.apply(&mut tmp, psi, PlusMinus::Plus);
        self.m.apply(chi, &tmp, PlusMinus::Minus);
    }

    fn subset(&self) -> Subset {
        self.m.subset()
    }

    fn layout(&self) -> &Arc<Layout> {
        self.m.layout()
    }

    fn zero_field(&self) -> T {
        self.m.zero_field()
    }
}

/// `M†M + σ` on the subset of `M`.
pub struct ShiftedMdagMLinOp<'a, T: FermionField> {
    inner: MdagMLinOp<'a, T>,
    shift: f64,
}

impl<'a, T: FermionField> ShiftedMdagMLinOp<'a, T> {
    /// Wrap `m` with shift `shift`.
    pub fn new(m: &'a dyn LinearOperator<T>, shift: f64) -> Self {
        Self {
            inner: MdagMLinOp::new(m),
            shift,
        }
    }

    /// The shift `σ`.
    pub fn shift(&self) -> f64 {
        self.shift
    }
}

impl<T: FermionField> LinearOperator<T> for ShiftedMdagMLinOp<'_, T> {
    fn apply(&self, chi: &mut T, psi: &T, isign: PlusMinus) {
        self.inner.apply(chi, psi, isign);
        let sites = self.layout().subset_sites(self.subset());
        chi.axpy_on(Complex64::new(self.shift, 0.0), psi, sites);
    }

    fn subset(&self) -> Subset {
        self.inner.subset()
    }

    fn layout(&self) -> &Arc<Layout> {
        self.inner.layout()
    }

    fn zero_field(&self) -> T {
        self.inner.zero_field()
    }
}
