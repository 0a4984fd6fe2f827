//! Site subsets an operator acts on.

use gluon_core::Parity;

/// The set of sites an operator reads from and writes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Subset {
    /// Every site.
    All,
    /// Sites with `(x+y+z+t)` even.
    Even,
    /// Sites with `(x+y+z+t)` odd.
    Odd,
}

impl Subset {
    /// The checkerboard this subset is restricted to, if any.
    pub fn parity(self) -> Option<Parity> {
        match self {
            Self::All => None,
            Self::Even => Some(Parity::Even),
            Self::Odd => Some(Parity::Odd),
        }
    }
}

impl From<Parity> for Subset {
    fn from(p: Parity) -> Self {
        match p {
            Parity::Even => Self::Even,
            Parity::Odd => Self::Odd,
        }
    }
}
