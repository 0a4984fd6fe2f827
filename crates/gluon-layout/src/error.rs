//! Error types for layout construction.

use std::fmt;

/// Errors arising from [`Layout`](crate::Layout) construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// An extent is zero.
    EmptyDimension {
        /// Axis index (0 = x .. 3 = t).
        axis: usize,
    },
    /// An extent is odd, which breaks the checkerboard partition under
    /// periodic wrapping.
    OddExtent {
        /// Axis index.
        axis: usize,
        /// The offending extent.
        extent: usize,
    },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDimension { axis } => write!(f, "lattice extent along axis {axis} is zero"),
            Self::OddExtent { axis, extent } => {
                write!(f, "lattice extent {extent} along axis {axis} must be even")
            }
        }
    }
}

impl std::error::Error for LayoutError {}
