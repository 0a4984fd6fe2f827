//! The `KNO` domain-wall array action.

use std::sync::Arc;

use gluon_core::{ConfigError, FermionArray, GaugeField};
use gluon_layout::Layout;
use gluon_linop::{EvenOddPrecKnoLinOpArray, EvenOddPrecLinearOperator};
use gluon_state::{read_ferm_bc, FermBc, FermState, SimpleFermState};
use gluon_xml::{ReadXml, WriteXml, XmlReader, XmlWriter};

use crate::fermact::{EvenOddPrecFermActArray, FermAct, EO_PREC_ARRAY};
use crate::params::KnoFermActParams;

/// Even-odd preconditioned KNO action on `N5` slices.
#[derive(Clone, Debug)]
pub struct KnoFermActArray {
    bc: Arc<dyn FermBc>,
    params: KnoFermActParams,
}

impl KnoFermActArray {
    /// Registry name.
    pub const NAME: &'static str = "KNO";

    /// Bind `params` to boundary conditions `bc`.
    pub fn new(bc: Arc<dyn FermBc>, params: KnoFermActParams) -> Self {
        Self { bc, params }
    }

    /// Read from a `<FermionAction>` block.
    pub fn from_xml(xml: &XmlReader) -> Result<Self, ConfigError> {
        let params = KnoFermActParams::read_xml(xml, ".")?;
        let bc = read_ferm_bc(xml, "FermionBC")?;
        Ok(Self::new(bc, params))
    }

    /// Parameters.
    pub fn params(&self) -> &KnoFermActParams {
        &self.params
    }

    fn build(
        &self,
        state: &Arc<dyn FermState>,
        mass: f64,
    ) -> Result<Box<dyn EvenOddPrecLinearOperator<FermionArray>>, ConfigError> {
        Ok(Box::new(EvenOddPrecKnoLinOpArray::new(
            state,
            self.params.over_mass,
            mass,
            &self.params.coefs,
        )?))
    }
}

impl FermAct for KnoFermActArray {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn quark_mass(&self) -> f64 {
        self.params.mass
    }

    fn flavor_count(&self) -> usize {
        self.params.n5
    }

    fn create_state(
        &self,
        layout: &Arc<Layout>,
        gauge: &GaugeField,
    ) -> Result<Arc<dyn FermState>, ConfigError> {
        Ok(Arc::new(SimpleFermState::new(
            Arc::clone(layout),
            Arc::clone(&self.bc),
            gauge,
        )?))
    }

    fn capability(&self) -> &'static str {
        EO_PREC_ARRAY
    }

    fn as_eo_prec_array(&self) -> Option<&dyn EvenOddPrecFermActArray> {
        Some(self)
    }
}

impl EvenOddPrecFermActArray for KnoFermActArray {
    fn n5(&self) -> usize {
        self.params.n5
    }

    fn linop(
        &self,
        state: &Arc<dyn FermState>,
    ) -> Result<Box<dyn EvenOddPrecLinearOperator<FermionArray>>, ConfigError> {
        self.build(state, self.params.mass)
    }

    fn linop_pv(
        &self,
        state: &Arc<dyn FermState>,
    ) -> Result<Box<dyn EvenOddPrecLinearOperator<FermionArray>>, ConfigError> {
        self.build(state, 1.0)
    }
}

impl WriteXml for KnoFermActArray {
    fn write_xml(&self, xml: &mut XmlWriter, tag: &str) {
        self.params.write_xml(xml, tag);
    }
}
