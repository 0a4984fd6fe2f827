//! The system-solver interface.

use gluon_core::FermionField;

use crate::error::SolverError;

/// Outcome of one solve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SystemSolverResults {
    /// Iterations (or operator applications) spent.
    pub n_count: usize,
    /// Final relative residual `|b − A x| / |b|`.
    pub resid: f64,
    /// Whether the target residual was reached.
    pub converged: bool,
}

/// Solver for `M†M ψ = χ` on the subset of a bound operator `M`.
///
/// `psi` is the initial guess on entry and the solution on return; only
/// the operator's subset is read or written.
pub trait MdagMSystemSolver<T: FermionField>: Send + Sync {
    /// Solve `M†M ψ = χ`.
    fn solve(&self, psi: &mut T, chi: &T) -> Result<SystemSolverResults, SolverError> {
        self.solve_shifted(psi, chi, 0.0)
    }

    /// Solve `(M†M + shift) ψ = χ`.
    fn solve_shifted(
        &self,
        psi: &mut T,
        chi: &T,
        shift: f64,
    ) -> Result<SystemSolverResults, SolverError>;
}
