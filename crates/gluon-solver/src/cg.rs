//! Reference conjugate gradient (`CG_INVERTER`).
//!
//! Standard CG for a Hermitian positive-definite operator, stopping on
//! the relative residual `|r| / |b| < RsdCG`.

use std::sync::Arc;
use std::time::Instant;

use gluon_core::{Complex64, ConfigError, FermionField, PlusMinus};
use gluon_linop::{LinearOperator, ShiftedMdagMLinOp};
use gluon_xml::{ReadXml, WriteXml, XmlReader, XmlWriter};

use crate::error::SolverError;
use crate::system::{MdagMSystemSolver, SystemSolverResults};

/// `<InvertParam>` of `CG_INVERTER`.
#[derive(Clone, Debug, PartialEq)]
pub struct CgParams {
    /// Target relative residual.
    pub rsd_cg: f64,
    /// Iteration cap.
    pub max_cg: usize,
}

impl CgParams {
    /// Registry name.
    pub const NAME: &'static str = "CG_INVERTER";
}

impl ReadXml for CgParams {
    fn read_xml(xml: &XmlReader, path: &str) -> Result<Self, ConfigError> {
        let block = xml.child(path)?;
        let rsd_cg: f64 = block.read("RsdCG")?;
        if rsd_cg <= 0.0 {
            return Err(ConfigError::invalid(
                block.full_path("RsdCG"),
                format!("residual target must be positive, found {rsd_cg}"),
            ));
        }
        Ok(Self {
            rsd_cg,
            max_cg: block.read("MaxCG")?,
        })
    }
}

impl WriteXml for CgParams {
    fn write_xml(&self, xml: &mut XmlWriter, tag: &str) {
        xml.push(tag);
        xml.write("invType", &Self::NAME.to_string());
        xml.write("RsdCG", &self.rsd_cg);
        xml.write("MaxCG", &self.max_cg);
        xml.pop();
    }
}

/// Solve `A x = b` on `A`'s subset. `x` is the initial guess.
pub fn cg_solve<T: FermionField>(
    a: &dyn LinearOperator<T>,
    x: &mut T,
    b: &T,
    params: &CgParams,
) -> SystemSolverResults {
    let sites = a.layout().subset_sites(a.subset());
    let b_norm_sq = b.norm_sq_on(sites);
    if b_norm_sq == 0.0 {
        x.set_zero_on(sites);
        return SystemSolverResults {
            n_count: 0,
            resid: 0.0,
            converged: true,
        };
    }
    let tol_sq = params.rsd_cg * params.rsd_cg * b_norm_sq;

    // r = b − A x
    let mut ap = a.zero_field();
    a.apply(&mut ap, x, PlusMinus::Plus);
    let mut r = a.zero_field();
    r.copy_on(b, sites);
    r.axpy_on(-Complex64::ONE, &ap, sites);
    let mut p = r.clone();
    let mut r_norm_sq = r.norm_sq_on(sites);

    let mut n_count = 0;
    while r_norm_sq > tol_sq && n_count < params.max_cg {
        n_count += 1;
        a.apply(&mut ap, &p, PlusMinus::Plus);
        let p_ap = p.inner_on(&ap, sites).re;
        if p_ap <= 0.0 {
            tracing::warn!(p_ap, n_count, "CG breakdown: operator not positive definite");
            break;
        }
        let alpha = r_norm_sq / p_ap;
        x.axpy_on(Complex64::new(alpha, 0.0), &p, sites);
        r.axpy_on(Complex64::new(-alpha, 0.0), &ap, sites);
        let r_new = r.norm_sq_on(sites);
        let beta = r_new / r_norm_sq;
        r_norm_sq = r_new;
        p.scale_on(beta, sites);
        p.axpy_on(Complex64::ONE, &r, sites);
        tracing::trace!(n_count, resid = (r_norm_sq / b_norm_sq).sqrt(), "CG iteration");
    }

    // True residual, not the recursed one.
    a.apply(&mut ap, x, PlusMinus::Plus);
    r.copy_on(b, sites);
    r.axpy_on(-Complex64::ONE, &ap, sites);
    let resid = (r.norm_sq_on(sites) / b_norm_sq).sqrt();
    let converged = r_norm_sq <= tol_sq;
    SystemSolverResults {
        n_count,
        resid,
        converged,
    }
}

/// `CG_INVERTER` bound to one operator.
pub struct CgInverter<T: FermionField> {
    op: Arc<dyn LinearOperator<T>>,
    params: CgParams,
}

impl<T: FermionField> CgInverter<T> {
    /// Bind to `op`.
    pub fn new(op: Arc<dyn LinearOperator<T>>, params: CgParams) -> Self {
        Self { op, params }
    }

    /// Solver parameters.
    pub fn params(&self) -> &CgParams {
        &self.params
    }
}

impl<T: FermionField> MdagMSystemSolver<T> for CgInverter<T> {
    fn solve_shifted(
        &self,
        psi: &mut T,
        chi: &T,
        shift: f64,
    ) -> Result<SystemSolverResults, SolverError> {
        let start = Instant::now();
        let a = ShiftedMdagMLinOp::new(self.op.as_ref(), shift);
        let res = cg_solve(&a, psi, chi, &self.params);
        if res.converged {
            tracing::debug!(
                n_count = res.n_count,
                resid = res.resid,
                shift,
                secs = start.elapsed().as_secs_f64(),
                "CG converged"
            );
        } else {
            tracing::warn!(
                n_count = res.n_count,
                resid = res.resid,
                target = self.params.rsd_cg,
                shift,
                "CG did not converge"
            );
        }
        Ok(res)
    }
}
