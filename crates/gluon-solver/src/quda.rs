//! The `QUDA_WILSON_INVERTER` bridge.
//!
//! Each solve packs the odd half of the source into a flat host buffer
//! (see [`pack`](crate::pack)), hands it to an [`ExternalInverter`]
//! together with a [`PackedOperator`] view of `M†M + σ`, and unpacks the
//! solution. Device backends are installed into a process-wide slot with
//! [`install_external_backend`]; without one, [`HostReferenceBackend`]
//! runs CG on the packed buffers.

use std::sync::{Arc, Once, PoisonError, RwLock};
use std::time::Instant;

use gluon_core::{ConfigError, GaugeField, LatticeFermion, PlusMinus};
use gluon_layout::{Layout, Subset};
use gluon_linop::{LinearOperator, ShiftedMdagMLinOp};
use gluon_state::FermState;
use gluon_xml::{ReadXml, WriteXml, XmlReader, XmlWriter};

use crate::error::SolverError;
use crate::pack::{check_len, odd_buffer_len, pack_odd, unpack_odd};
use crate::system::{MdagMSystemSolver, SystemSolverResults};

/// Floating-point precision requested from the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QudaPrecision {
    /// 16-bit fixed point.
    Half,
    /// 32-bit.
    Single,
    /// 64-bit.
    Double,
}

impl QudaPrecision {
    fn parse(text: &str, path: String) -> Result<Self, ConfigError> {
        match text {
            "HALF" => Ok(Self::Half),
            "SINGLE" => Ok(Self::Single),
            "DOUBLE" => Ok(Self::Double),
            other => Err(ConfigError::invalid(
                path,
                format!("expected HALF, SINGLE or DOUBLE, found {other:?}"),
            )),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Half => "HALF",
            Self::Single => "SINGLE",
            Self::Double => "DOUBLE",
        }
    }
}

/// Krylov method run on the device. Only CG is supported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QudaSolverType {
    /// Conjugate gradient on the normal equations.
    Cg,
}

/// `<InvertParam>` of `QUDA_WILSON_INVERTER`.
#[derive(Clone, Debug, PartialEq)]
pub struct QudaWilsonParams {
    /// Iteration cap.
    pub max_iter: usize,
    /// Target relative residual.
    pub rsd_target: f64,
    /// Reliable-update parameter, if set.
    pub delta: Option<f64>,
    /// Device Krylov method.
    pub solver_type: QudaSolverType,
    /// Outer precision.
    pub cuda_precision: QudaPrecision,
    /// Inner (sloppy) precision; defaults to the outer one.
    pub cuda_sloppy_precision: QudaPrecision,
    /// Whether the device should apply antiperiodic time BCs to the links.
    pub antiperiodic_t: bool,
    /// Log every solve at `info` instead of `debug`.
    pub verbose: bool,
}

impl QudaWilsonParams {
    /// Registry name.
    pub const NAME: &'static str = "QUDA_WILSON_INVERTER";

    /// Double precision CG with the given limits.
    pub fn new(max_iter: usize, rsd_target: f64) -> Self {
        Self {
            max_iter,
            rsd_target,
            delta: None,
            solver_type: QudaSolverType::Cg,
            cuda_precision: QudaPrecision::Double,
            cuda_sloppy_precision: QudaPrecision::Double,
            antiperiodic_t: true,
            verbose: false,
        }
    }
}

impl ReadXml for QudaWilsonParams {
    fn read_xml(xml: &XmlReader, path: &str) -> Result<Self, ConfigError> {
        let block = xml.child(path)?;
        let solver: String = block.read("SolverType")?;
        if solver != "CG" {
            let path = block.full_path("SolverType");
            tracing::error!(%path, solver, "unsupported QUDA solver type");
            return Err(ConfigError::invalid(
                path,
                format!("only CG is supported, found {solver:?}"),
            ));
        }
        let prec: String = block.read("CudaPrecision")?;
        let cuda_precision = QudaPrecision::parse(&prec, block.full_path("CudaPrecision"))?;
        let cuda_sloppy_precision = match block.read_opt::<String>("CudaSloppyPrecision")? {
            Some(p) => QudaPrecision::parse(&p, block.full_path("CudaSloppyPrecision"))?,
            None => cuda_precision,
        };
        let rsd_target: f64 = block.read("RsdTarget")?;
        if rsd_target <= 0.0 {
            return Err(ConfigError::invalid(
                block.full_path("RsdTarget"),
                format!("residual target must be positive, found {rsd_target}"),
            ));
        }
        Ok(Self {
            max_iter: block.read("MaxIter")?,
            rsd_target,
            delta: block.read_opt("Delta")?,
            solver_type: QudaSolverType::Cg,
            cuda_precision,
            cuda_sloppy_precision,
            antiperiodic_t: block.read_or("AntiPeriodicT", true)?,
            verbose: block.read_or("Verbose", false)?,
        })
    }
}

impl WriteXml for QudaWilsonParams {
    fn write_xml(&self, xml: &mut XmlWriter, tag: &str) {
        xml.push(tag);
        xml.write("invType", &Self::NAME.to_string());
        xml.write("MaxIter", &self.max_iter);
        xml.write("RsdTarget", &self.rsd_target);
        xml.write_opt("Delta", self.delta.as_ref());
        xml.write("SolverType", &"CG".to_string());
        xml.write("CudaPrecision", &self.cuda_precision.as_str().to_string());
        xml.write(
            "CudaSloppyPrecision",
            &self.cuda_sloppy_precision.as_str().to_string(),
        );
        xml.write("AntiPeriodicT", &self.antiperiodic_t);
        xml.write("Verbose", &self.verbose);
        xml.pop();
    }
}

/// `M†M + σ` acting on packed odd-checkerboard buffers.
pub struct PackedOperator<'a> {
    op: &'a dyn LinearOperator<LatticeFermion>,
    links: &'a GaugeField,
    shift: f64,
}

impl<'a> PackedOperator<'a> {
    /// View `op` (an odd-subset operator built on `links`) with shift `shift`.
    pub fn new(op: &'a dyn LinearOperator<LatticeFermion>, links: &'a GaugeField, shift: f64) -> Self {
        Self { op, links, shift }
    }

    /// Lattice geometry.
    pub fn layout(&self) -> &Layout {
        self.op.layout()
    }

    /// The BC-modified links, for backends that upload the gauge field.
    pub fn links(&self) -> &GaugeField {
        self.links
    }

    /// The shift `σ`.
    pub fn shift(&self) -> f64 {
        self.shift
    }

    /// Length of every buffer this view reads or writes.
    pub fn buffer_len(&self) -> usize {
        odd_buffer_len(self.layout())
    }

    /// `out = (M†M + σ) inp`.
    pub fn apply(&self, out: &mut [f64], inp: &[f64]) -> Result<(), SolverError> {
        check_len(self.layout(), out.len())?;
        let mut psi = self.op.zero_field();
        unpack_odd(self.layout(), inp, &mut psi)?;
        let mut chi = self.op.zero_field();
        ShiftedMdagMLinOp::new(self.op, self.shift).apply(&mut chi, &psi, PlusMinus::Plus);
        out.copy_from_slice(&pack_odd(self.layout(), &chi));
        Ok(())
    }
}

/// What a backend reports back after an inversion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExternalSolveReport {
    /// Iterations performed.
    pub iterations: usize,
    /// Final relative residual.
    pub residual: f64,
    /// Whether `rsd_target` was met.
    pub converged: bool,
}

/// A solver for `(M†M + σ) x = b` on packed buffers.
///
/// `solution` holds the initial guess on entry. Implementations may use
/// the operator view, the links, or both.
pub trait ExternalInverter: Send + Sync {
    /// Backend name for diagnostics.
    fn name(&self) -> &str;

    /// Solve into `solution`.
    fn invert(
        &self,
        op: &PackedOperator<'_>,
        solution: &mut [f64],
        source: &[f64],
        params: &QudaWilsonParams,
    ) -> Result<ExternalSolveReport, SolverError>;
}

static EXTERNAL_BACKEND: RwLock<Option<Arc<dyn ExternalInverter>>> = RwLock::new(None);
static HOST_FALLBACK_WARNING: Once = Once::new();

/// Install the device backend used by every subsequent bridge solve.
/// Returns the one it replaces.
pub fn install_external_backend(
    backend: Arc<dyn ExternalInverter>,
) -> Option<Arc<dyn ExternalInverter>> {
    tracing::info!(backend = backend.name(), "external solver backend installed");
    EXTERNAL_BACKEND
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .replace(backend)
}

/// Remove the installed backend, reverting to the host reference.
pub fn remove_external_backend() -> Option<Arc<dyn ExternalInverter>> {
    EXTERNAL_BACKEND
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .take()
}

fn current_backend() -> Arc<dyn ExternalInverter> {
    let installed = EXTERNAL_BACKEND
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    installed.unwrap_or_else(|| {
        HOST_FALLBACK_WARNING.call_once(|| {
            tracing::warn!("no external solver backend installed; using the host reference CG");
        });
        Arc::new(HostReferenceBackend)
    })
}

/// CG on the packed host buffers.
#[derive(Clone, Copy, Debug, Default)]
pub struct HostReferenceBackend;

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn axpy(y: &mut [f64], a: f64, x: &[f64]) {
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi += a * xi;
    }
}

impl ExternalInverter for HostReferenceBackend {
    fn name(&self) -> &str {
        "host-reference"
    }

    fn invert(
        &self,
        op: &PackedOperator<'_>,
        solution: &mut [f64],
        source: &[f64],
        params: &QudaWilsonParams,
    ) -> Result<ExternalSolveReport, SolverError> {
        check_len(op.layout(), solution.len())?;
        check_len(op.layout(), source.len())?;
        let b_norm_sq = dot(source, source);
        if b_norm_sq == 0.0 {
            solution.fill(0.0);
            return Ok(ExternalSolveReport {
                iterations: 0,
                residual: 0.0,
                converged: true,
            });
        }
        let tol_sq = params.rsd_target * params.rsd_target * b_norm_sq;

        let mut ap = vec![0.0; source.len()];
        op.apply(&mut ap, solution)?;
        let mut r = source.to_vec();
        axpy(&mut r, -1.0, &ap);
        let mut p = r.clone();
        let mut r_norm_sq = dot(&r, &r);

        let mut iterations = 0;
        while r_norm_sq > tol_sq && iterations < params.max_iter {
            iterations += 1;
            op.apply(&mut ap, &p)?;
            let p_ap = dot(&p, &ap);
            if p_ap <= 0.0 {
                return Err(SolverError::Backend {
                    backend: self.name().to_owned(),
                    reason: format!("operator not positive definite (p·Ap = {p_ap})"),
                });
            }
            let alpha = r_norm_sq / p_ap;
            axpy(solution, alpha, &p);
            axpy(&mut r, -alpha, &ap);
            let r_new = dot(&r, &r);
            let beta = r_new / r_norm_sq;
            r_norm_sq = r_new;
            for (pi, ri) in p.iter_mut().zip(&r) {
                *pi = ri + beta * *pi;
            }
        }
        Ok(ExternalSolveReport {
            iterations,
            residual: (r_norm_sq / b_norm_sq).sqrt(),
            converged: r_norm_sq <= tol_sq,
        })
    }
}

/// `QUDA_WILSON_INVERTER` bound to one odd-checkerboard operator.
pub struct QudaWilsonSolver {
    op: Arc<dyn LinearOperator<LatticeFermion>>,
    state: Arc<dyn FermState>,
    params: QudaWilsonParams,
}

impl QudaWilsonSolver {
    /// Bind to `op`, which must act on the odd checkerboard of `state`.
    pub fn new(
        op: Arc<dyn LinearOperator<LatticeFermion>>,
        state: Arc<dyn FermState>,
        params: QudaWilsonParams,
    ) -> Result<Self, ConfigError> {
        if op.subset() != Subset::Odd {
            tracing::error!(subset = ?op.subset(), "QUDA Wilson bridge needs an odd-subset operator");
            return Err(ConfigError::invalid(
                "InvertParam",
                "the Wilson bridge solves on the odd checkerboard only",
            ));
        }
        tracing::info!(
            max_iter = params.max_iter,
            rsd_target = params.rsd_target,
            precision = params.cuda_precision.as_str(),
            sloppy = params.cuda_sloppy_precision.as_str(),
            "QUDA Wilson solver bound"
        );
        Ok(Self { op, state, params })
    }

    /// Solver parameters.
    pub fn params(&self) -> &QudaWilsonParams {
        &self.params
    }
}

impl MdagMSystemSolver<LatticeFermion> for QudaWilsonSolver {
    fn solve_shifted(
        &self,
        psi: &mut LatticeFermion,
        chi: &LatticeFermion,
        shift: f64,
    ) -> Result<SystemSolverResults, SolverError> {
        let layout = self.op.layout();
        let start = Instant::now();
        let source = pack_odd(layout, chi);
        let mut solution = pack_odd(layout, psi);

        let backend = current_backend();
        let view = PackedOperator::new(self.op.as_ref(), self.state.links(), shift);
        let report = backend.invert(&view, &mut solution, &source, &self.params)?;
        unpack_odd(layout, &solution, psi)?;

        let secs = start.elapsed().as_secs_f64();
        if self.params.verbose {
            tracing::info!(
                backend = backend.name(),
                n_count = report.iterations,
                resid = report.residual,
                secs,
                "QUDA_CG_WILSON_SOLVER"
            );
        } else {
            tracing::debug!(
                backend = backend.name(),
                n_count = report.iterations,
                resid = report.residual,
                secs,
                "QUDA_CG_WILSON_SOLVER"
            );
        }
        if !report.converged {
            tracing::warn!(
                n_count = report.iterations,
                resid = report.residual,
                target = self.params.rsd_target,
                "external solve did not converge"
            );
        }
        Ok(SystemSolverResults {
            n_count: report.iterations,
            resid: report.residual,
            converged: report.converged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_default_and_round_trip() {
        let xml = XmlReader::parse(
            "<InvertParam><invType>QUDA_WILSON_INVERTER</invType><MaxIter>100</MaxIter>\
             <RsdTarget>1e-8</RsdTarget><SolverType>CG</SolverType>\
             <CudaPrecision>SINGLE</CudaPrecision></InvertParam>",
        )
        .unwrap();
        let p = QudaWilsonParams::read_xml(&xml, "InvertParam").unwrap();
        assert_eq!(p.cuda_sloppy_precision, QudaPrecision::Single);
        assert!(p.antiperiodic_t);
        assert!(!p.verbose);
        assert_eq!(p.delta, None);

        let mut q = p.clone();
        q.delta = Some(0.1);
        q.cuda_sloppy_precision = QudaPrecision::Half;
        let mut w = XmlWriter::new();
        q.write_xml(&mut w, "InvertParam");
        let back = XmlReader::parse(&w.finish()).unwrap();
        assert_eq!(QudaWilsonParams::read_xml(&back, "InvertParam").unwrap(), q);
    }

    #[test]
    fn only_cg_is_accepted() {
        let xml = XmlReader::parse(
            "<InvertParam><MaxIter>100</MaxIter><RsdTarget>1e-8</RsdTarget>\
             <SolverType>BICGSTAB</SolverType><CudaPrecision>DOUBLE</CudaPrecision></InvertParam>",
        )
        .unwrap();
        let err = QudaWilsonParams::read_xml(&xml, "InvertParam").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref path, .. } if path.ends_with("SolverType")));
    }

    #[test]
    fn bad_precision_is_named() {
        let xml = XmlReader::parse(
            "<InvertParam><MaxIter>1</MaxIter><RsdTarget>1e-8</RsdTarget>\
             <SolverType>CG</SolverType><CudaPrecision>QUAD</CudaPrecision></InvertParam>",
        )
        .unwrap();
        assert!(QudaWilsonParams::read_xml(&xml, "InvertParam").is_err());
    }
}
