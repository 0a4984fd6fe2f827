//! Benchmark profiles for the Gluon lattice QCD library.
//!
//! Provides pre-built lattices and operators for the Criterion benches:
//!
//! - [`BenchLattice`]: a hot-started configuration and its thin fermion state
//! - [`clover_profile`], [`slrc_profile`]: Schur-complement operators on it
//! - [`odd_source`]: a deterministic Gaussian source on the odd sites

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Arc;

use gluon_core::LatticeFermion;
use gluon_layout::Layout;
use gluon_linop::{CloverCoeffs, EvenOddPrecCloverLinOp, EvenOddPrecSlrcLinOp};
use gluon_state::{FermBc, FermState, GaugeConfig, SimpleFermBc, SimpleFermState, SlicFermState, StoutParams};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// A gauge configuration with its thin fermion state.
pub struct BenchLattice {
    /// Geometry.
    pub layout: Arc<Layout>,
    /// Hot-started links.
    pub gauge: GaugeConfig,
    /// Simple fermion state on `gauge`.
    pub state: Arc<dyn FermState>,
}

impl BenchLattice {
    /// Hot start on `extents` with link spread 0.5, antiperiodic in time.
    pub fn new(extents: [usize; 4], seed: u64) -> Self {
        let layout = Arc::new(Layout::new(extents).unwrap());
        let gauge = GaugeConfig::hot(Arc::clone(&layout), seed, 0.5);
        let state: Arc<dyn FermState> = Arc::new(
            SimpleFermState::new(Arc::clone(&layout), Self::bc(), gauge.links()).unwrap(),
        );
        Self {
            layout,
            gauge,
            state,
        }
    }

    /// 4⁴: 256 sites.
    pub fn small(seed: u64) -> Self {
        Self::new([4, 4, 4, 4], seed)
    }

    /// 8⁴: 4096 sites.
    pub fn medium(seed: u64) -> Self {
        Self::new([8, 8, 8, 8], seed)
    }

    fn bc() -> Arc<dyn FermBc> {
        Arc::new(SimpleFermBc::default())
    }

    /// Stout-smeared state on the same links.
    pub fn slic_state(&self, n_smear: usize, rho: f64) -> Arc<dyn FermState> {
        Arc::new(
            SlicFermState::new(
                Arc::clone(&self.layout),
                Self::bc(),
                self.gauge.links(),
                StoutParams::new(n_smear, rho),
            )
            .unwrap(),
        )
    }
}

/// Isotropic clover at mass 0.1, `c_SW = 1`.
pub fn clover_profile(lat: &BenchLattice) -> EvenOddPrecCloverLinOp {
    EvenOddPrecCloverLinOp::new(&lat.state, CloverCoeffs::isotropic(0.1, 1.0, 1.0)).unwrap()
}

/// Clover at mass 0.1 on one level of stout smearing with `ρ = 0.1`.
pub fn slrc_profile(lat: &BenchLattice) -> EvenOddPrecSlrcLinOp {
    let state = lat.slic_state(1, 0.1);
    EvenOddPrecSlrcLinOp::new(&state, CloverCoeffs::isotropic(0.1, 1.0, 1.0)).unwrap()
}

/// Gaussian source on the odd sites.
pub fn odd_source(layout: &Layout, seed: u64) -> LatticeFermion {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    gluon_monomial::gaussian_odd(layout, &mut rng)
}
