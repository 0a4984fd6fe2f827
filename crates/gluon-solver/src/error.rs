//! Errors from system solves.

use std::error::Error;
use std::fmt;

use gluon_core::ConfigError;

/// A solve that could not be carried out.
///
/// Non-convergence is not an error: it is reported through
/// [`SystemSolverResults::converged`](crate::SystemSolverResults::converged).
#[derive(Clone, Debug, PartialEq)]
pub enum SolverError {
    /// The external backend rejected or aborted the inversion.
    Backend {
        /// Backend name.
        backend: String,
        /// Backend diagnostic.
        reason: String,
    },
    /// A packed buffer has the wrong length for the lattice.
    BufferSize {
        /// Length required by the odd checkerboard.
        expected: usize,
        /// Length supplied.
        actual: usize,
    },
    /// The solver was misconfigured.
    Config(ConfigError),
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend { backend, reason } => {
                write!(f, "external solver '{backend}' failed: {reason}")
            }
            Self::BufferSize { expected, actual } => {
                write!(f, "packed buffer has {actual} reals, expected {expected}")
            }
            Self::Config(e) => write!(f, "solver configuration: {e}"),
        }
    }
}

impl Error for SolverError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for SolverError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
