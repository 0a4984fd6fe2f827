//! The configuration error shared by every registry and constructor.
//!
//! A misconfigured physics run cannot produce a meaningful result, so all
//! of these are fatal for the caller. They are still returned as values:
//! constructors report them with a diagnostic naming the offending field
//! or factory key, and the driver decides how to terminate.

use std::error::Error;
use std::fmt;

/// Errors raised while building parameter blocks, states, operators,
/// actions, solvers and monomials from configuration.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// A factory was asked for a name that was never registered.
    UnknownType {
        /// Which registry was consulted (e.g. `"FermionAction"`).
        factory: &'static str,
        /// The unregistered key.
        name: String,
    },
    /// A required tag was absent.
    MissingField {
        /// Full path of the missing tag.
        path: String,
    },
    /// A tag was present but its value could not be used.
    InvalidValue {
        /// Full path of the offending tag.
        path: String,
        /// Why the value was rejected.
        reason: String,
    },
    /// A resolved object lacks the capability the caller requires.
    CapabilityMismatch {
        /// Registry name of the resolved object.
        name: String,
        /// Capability the caller asked for.
        expected: &'static str,
        /// Capability the object actually offers.
        actual: &'static str,
    },
    /// An operator was bound to the wrong concrete fermion state.
    WrongStateKind {
        /// State kind the operator requires.
        expected: &'static str,
        /// State kind it was given.
        actual: &'static str,
    },
    /// The configuration document itself is malformed.
    Xml {
        /// Parser diagnostic.
        reason: String,
    },
    /// A setup-time numerical step failed (e.g. a non-positive clover block).
    Numerical {
        /// Description of the failure.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownType { factory, name } => {
                write!(f, "unknown {factory} type '{name}'")
            }
            Self::MissingField { path } => write!(f, "missing required field '{path}'"),
            Self::InvalidValue { path, reason } => {
                write!(f, "invalid value at '{path}': {reason}")
            }
            Self::CapabilityMismatch {
                name,
                expected,
                actual,
            } => write!(f, "'{name}' is {actual}, expected {expected}"),
            Self::WrongStateKind { expected, actual } => {
                write!(f, "fermion state is {actual}, expected {expected}")
            }
            Self::Xml { reason } => write!(f, "malformed configuration: {reason}"),
            Self::Numerical { reason } => write!(f, "numerical setup failed: {reason}"),
        }
    }
}

impl Error for ConfigError {}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`].
    pub fn invalid(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_name_the_offender() {
        let e = ConfigError::UnknownType {
            factory: "FermionAction",
            name: "NO_SUCH_ACTION".into(),
        };
        assert!(e.to_string().contains("NO_SUCH_ACTION"));

        let e = ConfigError::WrongStateKind {
            expected: "SLIC_FERM_STATE",
            actual: "SIMPLE_FERM_STATE",
        };
        let msg = e.to_string();
        assert!(msg.contains("SLIC_FERM_STATE") && msg.contains("SIMPLE_FERM_STATE"));
    }
}
