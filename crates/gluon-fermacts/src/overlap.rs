//! Overlap fermions with a pole approximation to the sign function.
//!
//! With `H = γ5 M_W` the Hermitian Wilson kernel at bare mass
//! `−OverMass`,
//!
//! ```text
//! ε(H) ψ ≈ Σ_i ε(λ_i) v_i ⟨v_i, ψ⟩ + H (constP + Σ_k resP_k (H² + rootQ_k)⁻¹) ψ_⊥
//! D      = ½(1 + μ) + ½(1 − μ) γ5 ε(H)
//! ```
//!
//! where `ψ_⊥` has the optional low modes `v_i` projected out and
//! `H² = M_W† M_W`. Each pole costs one CG solve per application.

use std::sync::Arc;

use gluon_core::{Complex64, ConfigError, FermionField, GaugeField, LatticeFermion, PlusMinus, Spinor};
use gluon_layout::{Layout, Subset};
use gluon_linop::{LinearOperator, ShiftedMdagMLinOp, UnprecWilsonLinOp};
use gluon_solver::{cg_solve, CgParams};
use gluon_state::{read_ferm_bc, FermBc, FermState, SimpleFermState};
use gluon_xml::{ReadXml, WriteXml, XmlReader, XmlWriter};

use crate::fermact::{FermAct, UnprecFermAct4d, UNPREC_4D};
use crate::params::OverlapPoleParams;

fn gamma5(psi: &LatticeFermion) -> LatticeFermion {
    LatticeFermion::from_vec(psi.as_slice().iter().map(Spinor::gamma5).collect())
}

/// Eigenpairs of `H` treated exactly: `ε(H) v_i = ε(λ_i) v_i`.
#[derive(Clone, Debug)]
pub struct OverlapLowModes {
    vectors: Vec<LatticeFermion>,
    eps_values: Vec<f64>,
}

impl OverlapLowModes {
    /// Orthonormal eigenvectors with the sign function evaluated on
    /// their eigenvalues.
    pub fn new(vectors: Vec<LatticeFermion>, eps_values: Vec<f64>) -> Result<Self, ConfigError> {
        if vectors.len() != eps_values.len() {
            let reason = format!(
                "{} eigenvectors but {} eigenvalues",
                vectors.len(),
                eps_values.len()
            );
            tracing::error!(%reason, "bad overlap low modes");
            return Err(ConfigError::invalid("EigValFunc", reason));
        }
        Ok(Self { vectors, eps_values })
    }

    /// Number of modes.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether there are no modes.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// `χ = γ5 ε(H) ψ`, the unitary part of the overlap operator.
///
/// `ε(H)` is Hermitian, so the `Minus` apply is `ε(H) γ5 ψ`.
pub struct Lg5Eps {
    kernel: Arc<dyn LinearOperator<LatticeFermion>>,
    const_p: f64,
    res_p: Vec<f64>,
    root_q: Vec<f64>,
    cg: CgParams,
    low_modes: Option<OverlapLowModes>,
}

impl Lg5Eps {
    /// Sign function of `γ5 kernel`. `kernel` must be γ5-Hermitian and
    /// act on the whole lattice.
    pub fn new(kernel: Arc<dyn LinearOperator<LatticeFermion>>, params: &OverlapPoleParams) -> Self {
        Self {
            kernel,
            const_p: params.const_p,
            res_p: params.res_p.clone(),
            root_q: params.root_q.clone(),
            cg: CgParams {
                rsd_cg: params.rsd_cg,
                max_cg: params.max_cg,
            },
            low_modes: None,
        }
    }

    /// Treat `modes` exactly.
    pub fn with_low_modes(mut self, modes: OverlapLowModes) -> Self {
        self.low_modes = Some(modes);
        self
    }

    /// `ε(H) ψ`.
    fn apply_eps(&self, psi: &LatticeFermion) -> LatticeFermion {
        let all = self.layout().all_sites();
        let mut out = self.zero_field();
        let mut perp = psi.clone();
        if let Some(low) = &self.low_modes {
            for (v, &eps) in low.vectors.iter().zip(&low.eps_values) {
                let c = v.inner_on(psi, all);
                perp.axpy_on(-c, v, all);
                out.axpy_on(c * eps, v, all);
            }
        }

        let mut rational = perp.clone();
        rational.scale_on(self.const_p, all);
        let mut n_count = 0;
        for (&res, &root) in self.res_p.iter().zip(&self.root_q) {
            let shifted = ShiftedMdagMLinOp::new(self.kernel.as_ref(), root);
            let mut x = self.zero_field();
            let result = cg_solve(&shifted, &mut x, &perp, &self.cg);
            if !result.converged {
                tracing::warn!(
                    pole = root,
                    n_count = result.n_count,
                    resid = result.resid,
                    "overlap pole solve did not converge"
                );
            }
            n_count += result.n_count;
            rational.axpy_on(Complex64::new(res, 0.0), &x, all);
        }
        tracing::debug!(poles = self.res_p.len(), n_count, "overlap sign function applied");

        let mut m = self.zero_field();
        self.kernel.apply(&mut m, &rational, PlusMinus::Plus);
        out.axpy_on(Complex64::ONE, &gamma5(&m), all);
        out
    }
}

impl LinearOperator<LatticeFermion> for Lg5Eps {
    fn apply(&self, chi: &mut LatticeFermion, psi: &LatticeFermion, isign: PlusMinus) {
        *chi = match isign {
            PlusMinus::Plus => gamma5(&self.apply_eps(psi)),
            PlusMinus::Minus => self.apply_eps(&gamma5(psi)),
        };
    }

    fn subset(&self) -> Subset {
        Subset::All
    }

    fn layout(&self) -> &Arc<Layout> {
        self.kernel.layout()
    }

    fn zero_field(&self) -> LatticeFermion {
        self.kernel.zero_field()
    }
}

/// `D = ½(1 + μ) + ½(1 − μ) γ5 ε(H)`.
pub struct OverlapPoleLinOp {
    eps: Lg5Eps,
    mass: f64,
}

impl OverlapPoleLinOp {
    /// Overlap operator at quark mass `mass`.
    pub fn new(eps: Lg5Eps, mass: f64) -> Self {
        Self { eps, mass }
    }

    /// Quark mass `μ`.
    pub fn mass(&self) -> f64 {
        self.mass
    }
}

impl LinearOperator<LatticeFermion> for OverlapPoleLinOp {
    fn apply(&self, chi: &mut LatticeFermion, psi: &LatticeFermion, isign: PlusMinus) {
        let all = self.layout().all_sites();
        let mut unitary = self.zero_field();
        self.eps.apply(&mut unitary, psi, isign);
        chi.copy_on(psi, all);
        chi.scale_on(0.5 * (1.0 + self.mass), all);
        chi.axpy_on(Complex64::new(0.5 * (1.0 - self.mass), 0.0), &unitary, all);
    }

    fn subset(&self) -> Subset {
        Subset::All
    }

    fn layout(&self) -> &Arc<Layout> {
        self.eps.layout()
    }

    fn zero_field(&self) -> LatticeFermion {
        self.eps.zero_field()
    }
}

/// 4D overlap action with a pole approximation (`OVERLAP_POLE_4D`).
#[derive(Clone, Debug)]
pub struct OverlapPoleFermAct {
    bc: Arc<dyn FermBc>,
    params: OverlapPoleParams,
}

impl OverlapPoleFermAct {
    /// Registry name.
    pub const NAME: &'static str = "OVERLAP_POLE_4D";

    /// Bind `params` to boundary conditions `bc`.
    pub fn new(bc: Arc<dyn FermBc>, params: OverlapPoleParams) -> Self {
        Self { bc, params }
    }

    /// Read from a `<FermionAction>` block.
    pub fn from_xml(xml: &XmlReader) -> Result<Self, ConfigError> {
        let params = OverlapPoleParams::read_xml(xml, ".")?;
        let bc = read_ferm_bc(xml, "FermionBC")?;
        Ok(Self::new(bc, params))
    }

    /// Parameters.
    pub fn params(&self) -> &OverlapPoleParams {
        &self.params
    }

    /// The unitary part `γ5 ε(H)` on `state`.
    pub fn lg5eps(&self, state: &Arc<dyn FermState>) -> Lg5Eps {
        let kernel = UnprecWilsonLinOp::new(state, -self.params.over_mass);
        Lg5Eps::new(Arc::new(kernel), &self.params)
    }
}

impl FermAct for OverlapPoleFermAct {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn quark_mass(&self) -> f64 {
        self.params.mass
    }

    fn create_state(
        &self,
        layout: &Arc<Layout>,
        gauge: &GaugeField,
    ) -> Result<Arc<dyn FermState>, ConfigError> {
        Ok(Arc::new(SimpleFermState::new(
            Arc::clone(layout),
            Arc::clone(&self.bc),
            gauge,
        )?))
    }

    fn capability(&self) -> &'static str {
        UNPREC_4D
    }

    fn as_unprec_4d(&self) -> Option<&dyn UnprecFermAct4d> {
        Some(self)
    }
}

impl UnprecFermAct4d for OverlapPoleFermAct {
    fn linop(
        &self,
        state: &Arc<dyn FermState>,
    ) -> Result<Box<dyn LinearOperator<LatticeFermion>>, ConfigError> {
        tracing::info!(
            poles = self.params.num_poles(),
            over_mass = self.params.over_mass,
            "overlap pole operator built"
        );
        Ok(Box::new(OverlapPoleLinOp::new(
            self.lg5eps(state),
            self.params.mass,
        )))
    }
}

impl WriteXml for OverlapPoleFermAct {
    fn write_xml(&self, xml: &mut XmlWriter, tag: &str) {
        self.params.write_xml(xml, tag);
    }
}
