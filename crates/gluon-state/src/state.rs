//! Fermion states: the gauge links an operator is built from.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use gluon_core::{ConfigError, GaugeField};
use gluon_layout::Layout;

use crate::bc::FermBc;
use crate::stout::{chain_rule, smear_levels, StoutParams};

/// Links prepared for a fermion operator.
///
/// A state is immutable once built. Operators hold it through an
/// `Arc<dyn FermState>` and query the concrete kind with
/// [`downcast_ref`](trait.FermState.html#method.downcast_ref) when they
/// need more than [`links`](Self::links).
pub trait FermState: Any + Send + Sync + fmt::Debug {
    /// Kind name used in diagnostics.
    fn kind(&self) -> &'static str;

    /// Lattice geometry.
    fn layout(&self) -> &Arc<Layout>;

    /// Links the operator multiplies by, with fermion BCs applied.
    fn links(&self) -> &GaugeField;

    /// The boundary conditions applied to [`links`](Self::links).
    fn ferm_bc(&self) -> &Arc<dyn FermBc>;

    /// Upcast for [`downcast_arc`].
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// Turn a raw force computed on BC-modified thin links into a force
    /// w.r.t. the unmodified links: `zero(modify(ds))`.
    fn thin_force(&self, ds: &mut GaugeField) {
        let layout = self.layout();
        self.ferm_bc().modify(layout, ds);
        self.ferm_bc().zero(layout, ds);
    }
}

impl dyn FermState {
    /// Attempt to downcast to a concrete state type.
    pub fn downcast_ref<T: FermState>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref::<T>()
    }
}

/// Recover a typed `Arc` from a shared state, if it is a `T`.
pub fn downcast_arc<T: FermState>(state: &Arc<dyn FermState>) -> Option<Arc<T>> {
    Arc::clone(state).into_any().downcast::<T>().ok()
}

fn check_volume(layout: &Layout, gauge: &GaugeField) -> Result<(), ConfigError> {
    if gauge.volume() != layout.volume() {
        let reason = format!(
            "gauge field has {} sites, layout has {}",
            gauge.volume(),
            layout.volume()
        );
        tracing::error!(%reason, "gauge/layout mismatch");
        return Err(ConfigError::invalid("gauge", reason));
    }
    Ok(())
}

/// Thin links with boundary conditions applied.
#[derive(Debug)]
pub struct SimpleFermState {
    layout: Arc<Layout>,
    bc: Arc<dyn FermBc>,
    links: GaugeField,
}

impl SimpleFermState {
    /// Kind name.
    pub const KIND: &'static str = "SIMPLE_FERM_STATE";

    /// Copy `gauge` and apply `bc` to the copy.
    pub fn new(
        layout: Arc<Layout>,
        bc: Arc<dyn FermBc>,
        gauge: &GaugeField,
    ) -> Result<Self, ConfigError> {
        check_volume(&layout, gauge)?;
        let mut links = gauge.clone();
        bc.modify(&layout, &mut links);
        tracing::debug!(bc = bc.name(), "simple fermion state built");
        Ok(Self { layout, bc, links })
    }
}

impl FermState for SimpleFermState {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    fn links(&self) -> &GaugeField {
        &self.links
    }

    fn ferm_bc(&self) -> &Arc<dyn FermBc> {
        &self.bc
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Stout-smeared state: fat links for hopping terms, thin links for the
/// clover, and every smearing level for the chain rule.
#[derive(Debug)]
pub struct SlicFermState {
    layout: Arc<Layout>,
    bc: Arc<dyn FermBc>,
    params: StoutParams,
    levels: Vec<GaugeField>,
    thin: GaugeField,
    fat: GaugeField,
}

impl SlicFermState {
    /// Kind name.
    pub const KIND: &'static str = "SLIC_FERM_STATE";

    /// Smear the unmodified `gauge`, then apply `bc` to both ends.
    pub fn new(
        layout: Arc<Layout>,
        bc: Arc<dyn FermBc>,
        gauge: &GaugeField,
        params: StoutParams,
    ) -> Result<Self, ConfigError> {
        check_volume(&layout, gauge)?;
        let levels = smear_levels(&layout, &params, gauge);
        let mut thin = gauge.clone();
        bc.modify(&layout, &mut thin);
        let mut fat = levels.last().cloned().unwrap_or_else(|| gauge.clone());
        bc.modify(&layout, &mut fat);
        tracing::info!(n_smear = params.n_smear, rho = params.rho, "slic fermion state built");
        Ok(Self {
            layout,
            bc,
            params,
            levels,
            thin,
            fat,
        })
    }

    /// BC-modified thin links.
    pub fn thin_links(&self) -> &GaugeField {
        &self.thin
    }

    /// BC-modified fat links.
    pub fn fat_links(&self) -> &GaugeField {
        &self.fat
    }

    /// Smearing parameters.
    pub fn stout_params(&self) -> &StoutParams {
        &self.params
    }

    /// Push a raw force computed on the fat links back to the unmodified
    /// thin links: `zero(chain_rule(modify(ds_fat)))`.
    pub fn fat_force_to_thin(&self, ds_fat: &GaugeField) -> GaugeField {
        let mut ds = ds_fat.clone();
        self.bc.modify(&self.layout, &mut ds);
        let mut thin = chain_rule(&self.layout, &self.params, &self.levels, &ds);
        self.bc.zero(&self.layout, &mut thin);
        thin
    }
}

impl FermState for SlicFermState {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    fn links(&self) -> &GaugeField {
        &self.fat
    }

    fn ferm_bc(&self) -> &Arc<dyn FermBc> {
        &self.bc
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bc::SimpleFermBc;
    use crate::gauge::hot_start;

    fn setup() -> (Arc<Layout>, Arc<dyn FermBc>, GaugeField) {
        let layout = Arc::new(Layout::new([2, 2, 2, 4]).unwrap());
        let u = hot_start(&layout, 3, 0.5);
        (layout, Arc::new(SimpleFermBc::default()), u)
    }

    #[test]
    fn downcast_distinguishes_kinds() {
        let (layout, bc, u) = setup();
        let simple: Arc<dyn FermState> =
            Arc::new(SimpleFermState::new(layout.clone(), bc.clone(), &u).unwrap());
        assert!(simple.downcast_ref::<SimpleFermState>().is_some());
        assert!(simple.downcast_ref::<SlicFermState>().is_none());

        let slic: Arc<dyn FermState> =
            Arc::new(SlicFermState::new(layout, bc, &u, StoutParams::new(1, 0.1)).unwrap());
        let s = slic.downcast_ref::<SlicFermState>().unwrap();
        assert!(downcast_arc::<SlicFermState>(&slic).is_some());
        assert!(downcast_arc::<SimpleFermState>(&slic).is_none());
        assert_eq!(slic.kind(), SlicFermState::KIND);
        assert_eq!(s.links(), s.fat_links());
        assert_ne!(s.thin_links(), s.fat_links());
    }

    #[test]
    fn fat_force_of_zero_is_zero() {
        let (layout, bc, u) = setup();
        let s = SlicFermState::new(layout.clone(), bc, &u, StoutParams::new(2, 0.1)).unwrap();
        let f = s.fat_force_to_thin(&GaugeField::zeros(layout.volume()));
        assert_eq!(f.norm_sq(), 0.0);
    }

    #[test]
    fn zero_smearing_levels_keep_thin_links() {
        let (layout, bc, u) = setup();
        let s = SlicFermState::new(layout, bc, &u, StoutParams::new(0, 0.1)).unwrap();
        assert_eq!(s.thin_links(), s.fat_links());
    }

    #[test]
    fn volume_mismatch_is_rejected() {
        let (layout, bc, _) = setup();
        let small = GaugeField::identity(8);
        assert!(matches!(
            SimpleFermState::new(layout, bc, &small),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
