//! Integration test: an installed backend replaces the host reference.
//!
//! Kept in its own binary: the backend slot is process-wide.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use gluon_core::{LatticeFermion, Parity};
use gluon_linop::{CloverCoeffs, EvenOddPrecCloverLinOp, LinearOperator};
use gluon_solver::{
    install_external_backend, remove_external_backend, ExternalInverter, ExternalSolveReport,
    MdagMSystemSolver, PackedOperator, QudaWilsonParams, QudaWilsonSolver, SolverError,
};
use gluon_test_utils::{random_fermion_on, random_gauge, simple_state, small_layout};

/// Copies the source into the solution and counts calls.
struct Echo {
    calls: AtomicUsize,
}

impl ExternalInverter for Echo {
    fn name(&self) -> &str {
        "echo"
    }

    fn invert(
        &self,
        op: &PackedOperator<'_>,
        solution: &mut [f64],
        source: &[f64],
        params: &QudaWilsonParams,
    ) -> Result<ExternalSolveReport, SolverError> {
        assert_eq!(source.len(), op.buffer_len());
        assert_eq!(params.max_iter, 17);
        self.calls.fetch_add(1, Ordering::SeqCst);
        solution.copy_from_slice(source);
        Ok(ExternalSolveReport {
            iterations: 42,
            residual: 0.5,
            converged: false,
        })
    }
}

#[test]
fn installed_backend_is_used_until_removed() {
    let layout = small_layout();
    let u = random_gauge(&layout, 1);
    let state = simple_state(&layout, &u);
    let op: Arc<dyn LinearOperator<LatticeFermion>> = Arc::new(
        EvenOddPrecCloverLinOp::new(&state, CloverCoeffs::isotropic(0.2, 1.0, 1.0)).unwrap(),
    );
    let solver = QudaWilsonSolver::new(op.clone(), state, QudaWilsonParams::new(17, 1e-8)).unwrap();
    let chi = random_fermion_on(&layout, Parity::Odd, 2);

    let echo = Arc::new(Echo {
        calls: AtomicUsize::new(0),
    });
    assert!(install_external_backend(echo.clone()).is_none());

    let mut psi = op.zero_field();
    let res = solver.solve(&mut psi, &chi).unwrap();
    assert_eq!(echo.calls.load(Ordering::SeqCst), 1);
    assert_eq!(res.n_count, 42);
    assert!(!res.converged);
    assert_eq!(psi, chi);

    let removed = remove_external_backend().unwrap();
    assert_eq!(removed.name(), "echo");
    let mut psi = op.zero_field();
    let res = solver.solve(&mut psi, &chi).unwrap();
    assert_eq!(echo.calls.load(Ordering::SeqCst), 1);
    assert!(res.converged);
}
