//! The `M†M` system solver registry.

use std::sync::{Arc, LazyLock};

use gluon_core::{ConfigError, Factory, LatticeFermion};
use gluon_linop::LinearOperator;
use gluon_state::FermState;
use gluon_xml::{ReadXml, XmlReader};

use crate::cg::{CgInverter, CgParams};
use crate::quda::{QudaWilsonParams, QudaWilsonSolver};
use crate::system::MdagMSystemSolver;

/// What a solver constructor receives.
#[derive(Clone)]
pub struct SysSolverArgs {
    /// The `InvertParam` block.
    pub xml: XmlReader,
    /// State the operator was built from.
    pub state: Arc<dyn FermState>,
    /// The operator `M` whose normal equations are solved.
    pub op: Arc<dyn LinearOperator<LatticeFermion>>,
}

/// Boxed solver as stored by the registry.
pub type BoxedMdagMSolver = Box<dyn MdagMSystemSolver<LatticeFermion>>;

/// Solvers keyed by `invType`.
pub static MDAGM_SOLVER_FACTORY: LazyLock<Factory<SysSolverArgs, BoxedMdagMSolver>> =
    LazyLock::new(|| Factory::new("MdagMSystemSolver"));

fn create_cg(args: &SysSolverArgs) -> Result<BoxedMdagMSolver, ConfigError> {
    let params = CgParams::read_xml(&args.xml, ".")?;
    Ok(Box::new(CgInverter::new(Arc::clone(&args.op), params)))
}

fn create_quda_wilson(args: &SysSolverArgs) -> Result<BoxedMdagMSolver, ConfigError> {
    let params = QudaWilsonParams::read_xml(&args.xml, ".")?;
    Ok(Box::new(QudaWilsonSolver::new(
        Arc::clone(&args.op),
        Arc::clone(&args.state),
        params,
    )?))
}

/// Register every solver in this crate. Idempotent; returns whether
/// anything new was added.
pub fn register_all() -> bool {
    let mut added = false;
    added |= MDAGM_SOLVER_FACTORY.register_object(CgParams::NAME, create_cg);
    added |= MDAGM_SOLVER_FACTORY.register_object(QudaWilsonParams::NAME, create_quda_wilson);
    added
}

/// Build the solver named by `invType` in `args.xml`.
pub fn create_mdagm_solver(args: &SysSolverArgs) -> Result<BoxedMdagMSolver, ConfigError> {
    let name: String = args.xml.read("invType")?;
    MDAGM_SOLVER_FACTORY.create_object(&name, args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gluon_linop::{CloverCoeffs, EvenOddPrecCloverLinOp, UnprecWilsonLinOp};
    use gluon_test_utils::{random_gauge, simple_state, small_layout};

    fn args(xml: &str, odd: bool) -> SysSolverArgs {
        register_all();
        let layout = small_layout();
        let u = random_gauge(&layout, 7);
        let state = simple_state(&layout, &u);
        let op: Arc<dyn LinearOperator<LatticeFermion>> = if odd {
            Arc::new(EvenOddPrecCloverLinOp::new(&state, CloverCoeffs::isotropic(0.1, 1.0, 1.0)).unwrap())
        } else {
            Arc::new(UnprecWilsonLinOp::new(&state, 0.1))
        };
        let doc = XmlReader::parse(xml).unwrap();
        SysSolverArgs {
            xml: doc.child("InvertParam").unwrap(),
            state,
            op,
        }
    }

    #[test]
    fn register_all_is_idempotent() {
        register_all();
        assert!(!register_all());
        let names = MDAGM_SOLVER_FACTORY.registered_names();
        assert!(names.iter().any(|n| n == "CG_INVERTER"));
        assert!(names.iter().any(|n| n == "QUDA_WILSON_INVERTER"));
    }

    #[test]
    fn unknown_inv_type_is_named() {
        let a = args(
            "<InvertParam><invType>BICGSTAB_INVERTER</invType></InvertParam>",
            true,
        );
        let err = create_mdagm_solver(&a).err().unwrap();
        assert_eq!(
            err,
            ConfigError::UnknownType {
                factory: "MdagMSystemSolver",
                name: "BICGSTAB_INVERTER".into()
            }
        );
    }

    #[test]
    fn bridge_rejects_full_lattice_operator() {
        let xml = "<InvertParam><invType>QUDA_WILSON_INVERTER</invType><MaxIter>10</MaxIter>\
                   <RsdTarget>1e-8</RsdTarget><SolverType>CG</SolverType>\
                   <CudaPrecision>DOUBLE</CudaPrecision></InvertParam>";
        assert!(create_mdagm_solver(&args(xml, true)).is_ok());
        assert!(create_mdagm_solver(&args(xml, false)).is_err());
    }
}
