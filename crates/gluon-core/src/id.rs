//! Lattice dimensions, the operator sign flag and checkerboard parity.

use std::fmt;

/// Number of space-time dimensions.
pub const ND: usize = 4;

/// Number of colours.
pub const NC: usize = 3;

/// Number of spin components.
pub const NS: usize = 4;

/// Selects an operator (`Plus`) or its hermitian conjugate (`Minus`).
///
/// Every apply and derivative routine takes one of these. For a Wilson-type
/// operator `Minus` is the dagger, obtained by flipping the sign of the
/// gamma matrices in the hopping term.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlusMinus {
    /// Apply the operator itself.
    Plus,
    /// Apply the hermitian conjugate.
    Minus,
}

impl PlusMinus {
    /// `+1.0` for [`Plus`](Self::Plus), `-1.0` for [`Minus`](Self::Minus).
    pub fn sign(self) -> f64 {
        match self {
            Self::Plus => 1.0,
            Self::Minus => -1.0,
        }
    }

    /// The opposite flag.
    pub fn dagger(self) -> Self {
        match self {
            Self::Plus => Self::Minus,
            Self::Minus => Self::Plus,
        }
    }
}

impl fmt::Display for PlusMinus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plus => write!(f, "PLUS"),
            Self::Minus => write!(f, "MINUS"),
        }
    }
}

/// Checkerboard half of the lattice.
///
/// A site is `Even` when the sum of its coordinates is even. With even
/// lattice extents every nearest neighbour of an even site is odd.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Parity {
    /// Coordinate sum is even (checkerboard 0).
    Even,
    /// Coordinate sum is odd (checkerboard 1).
    Odd,
}

impl Parity {
    /// Both parities, even first.
    pub const BOTH: [Parity; 2] = [Parity::Even, Parity::Odd];

    /// Checkerboard index: 0 for even, 1 for odd.
    pub fn index(self) -> usize {
        match self {
            Self::Even => 0,
            Self::Odd => 1,
        }
    }

    /// Parity of a coordinate sum.
    pub fn of_sum(sum: usize) -> Self {
        if sum % 2 == 0 {
            Self::Even
        } else {
            Self::Odd
        }
    }

    /// The other half.
    pub fn opposite(self) -> Self {
        match self {
            Self::Even => Self::Odd,
            Self::Odd => Self::Even,
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Even => write!(f, "even"),
            Self::Odd => write!(f, "odd"),
        }
    }
}
