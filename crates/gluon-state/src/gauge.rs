//! Gauge configuration start-up and diagnostics.

use std::sync::Arc;

use gluon_core::{ColorMatrix, ConfigError, GaugeField, NC, ND};
use gluon_layout::Layout;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::paths::plaquette;

/// Unit links (ordered start).
pub fn cold_start(layout: &Layout) -> GaugeField {
    GaugeField::identity(layout.volume())
}

/// Random SU(3) links `exp(ε T)`; `epsilon` controls the disorder.
///
/// Deterministic in `seed`.
pub fn hot_start(layout: &Layout, seed: u64, epsilon: f64) -> GaugeField {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut u = GaugeField::zeros(layout.volume());
    for mu in 0..ND {
        for link in u.dir_mut(mu) {
            *link = ColorMatrix::random_su3(&mut rng, epsilon);
        }
    }
    tracing::debug!(seed, epsilon, "hot start");
    u
}

/// `⟨Re tr P / Nc⟩` over all sites and planes. One on a cold start.
pub fn average_plaquette(layout: &Layout, u: &GaugeField) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for site in 0..layout.volume() {
        for mu in 0..ND {
            for nu in (mu + 1)..ND {
                sum += plaquette(layout, u, site, mu, nu).re_trace() / NC as f64;
                count += 1;
            }
        }
    }
    sum / count as f64
}

/// A gauge configuration together with the lattice it lives on.
#[derive(Clone, Debug, PartialEq)]
pub struct GaugeConfig {
    layout: Arc<Layout>,
    links: GaugeField,
}

impl GaugeConfig {
    /// Wrap `links`; their volume must match `layout`.
    pub fn new(layout: Arc<Layout>, links: GaugeField) -> Result<Self, ConfigError> {
        if links.volume() != layout.volume() {
            let reason = format!(
                "gauge field has {} sites, layout has {}",
                links.volume(),
                layout.volume()
            );
            tracing::error!(%reason, "gauge/layout mismatch");
            return Err(ConfigError::invalid("gauge", reason));
        }
        Ok(Self { layout, links })
    }

    /// Unit links.
    pub fn cold(layout: Arc<Layout>) -> Self {
        let links = cold_start(&layout);
        Self { layout, links }
    }

    /// See [`hot_start`].
    pub fn hot(layout: Arc<Layout>, seed: u64, epsilon: f64) -> Self {
        let links = hot_start(&layout, seed, epsilon);
        Self { layout, links }
    }

    /// Lattice geometry.
    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    /// The links.
    pub fn links(&self) -> &GaugeField {
        &self.links
    }

    /// Mutable links, for updates.
    pub fn links_mut(&mut self) -> &mut GaugeField {
        &mut self.links
    }

    /// See [`average_plaquette`].
    pub fn plaquette(&self) -> f64 {
        average_plaquette(&self.layout, &self.links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cold_start_plaquette_is_one() {
        let layout = Layout::new([2, 2, 2, 4]).unwrap();
        let u = cold_start(&layout);
        assert!((average_plaquette(&layout, &u) - 1.0).abs() < 1e-15);
    }

    #[test]
    fn hot_start_is_disordered_and_reproducible() {
        let layout = Layout::new([2, 2, 2, 4]).unwrap();
        let a = hot_start(&layout, 42, 1.0);
        let b = hot_start(&layout, 42, 1.0);
        assert_eq!(a, b);
        let p = average_plaquette(&layout, &a);
        assert!(p < 0.95 && p > -0.5, "plaquette {p}");
    }

    #[test]
    fn config_checks_volume() {
        let layout = Arc::new(Layout::new([2, 2, 2, 4]).unwrap());
        assert_eq!(GaugeConfig::cold(layout.clone()).plaquette(), 1.0);
        let small = GaugeField::identity(8);
        assert!(GaugeConfig::new(layout, small).is_err());
    }

    #[test]
    fn configs_compare_by_layout_and_links() {
        let layout = Arc::new(Layout::new([2, 2, 2, 4]).unwrap());
        let a = GaugeConfig::hot(layout.clone(), 7, 0.5);
        assert_eq!(a, GaugeConfig::hot(Arc::new(Layout::new([2, 2, 2, 4]).unwrap()), 7, 0.5));
        assert_ne!(a, GaugeConfig::hot(layout.clone(), 8, 0.5));
        assert_ne!(GaugeConfig::cold(layout), GaugeConfig::cold(Arc::new(Layout::new([2, 2, 4, 2]).unwrap())));
    }
}
