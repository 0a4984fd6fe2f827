//! Errors from monomial evaluation.

use std::error::Error;
use std::fmt;

use gluon_core::ConfigError;
use gluon_solver::SolverError;

/// Why a monomial could not be built or evaluated.
#[derive(Clone, Debug, PartialEq)]
pub enum MonomialError {
    /// Misconfiguration, including anything raised while building the
    /// state, operator or solver.
    Config(ConfigError),
    /// A system solve failed outright.
    Solver(SolverError),
    /// The action or force was requested before the pseudofermions were
    /// drawn.
    NotRefreshed,
}

impl fmt::Display for MonomialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "monomial configuration: {e}"),
            Self::Solver(e) => write!(f, "monomial solve: {e}"),
            Self::NotRefreshed => write!(f, "pseudofermions have not been refreshed"),
        }
    }
}

impl Error for MonomialError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Solver(e) => Some(e),
            Self::NotRefreshed => None,
        }
    }
}

impl From<ConfigError> for MonomialError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<SolverError> for MonomialError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::Config(c) => Self::Config(c),
            other => Self::Solver(other),
        }
    }
}
