//! Clover actions: `CLOVER` on thin links and `SLRC` on stout-smeared
//! hopping links.

use std::sync::Arc;

use gluon_core::{ConfigError, GaugeField, LatticeFermion};
use gluon_layout::Layout;
use gluon_linop::{EvenOddPrecCloverLinOp, EvenOddPrecLinearOperator, EvenOddPrecSlrcLinOp};
use gluon_state::{read_ferm_bc, FermBc, FermState, SimpleFermState, SlicFermState, StoutParams};
use gluon_xml::{ReadXml, WriteXml, XmlReader, XmlWriter};

use crate::fermact::{EvenOddPrecFermAct4d, FermAct, EO_PREC_4D};
use crate::params::CloverFermActParams;

/// Even-odd preconditioned clover action.
#[derive(Clone, Debug)]
pub struct CloverFermAct {
    bc: Arc<dyn FermBc>,
    params: CloverFermActParams,
}

impl CloverFermAct {
    /// Registry name.
    pub const NAME: &'static str = "CLOVER";

    /// Bind `params` to boundary conditions `bc`.
    pub fn new(bc: Arc<dyn FermBc>, params: CloverFermActParams) -> Self {
        Self { bc, params }
    }

    /// Read from a `<FermionAction>` block.
    pub fn from_xml(xml: &XmlReader) -> Result<Self, ConfigError> {
        let params = CloverFermActParams::read_xml(xml, ".")?;
        let bc = read_ferm_bc(xml, "FermionBC")?;
        Ok(Self::new(bc, params))
    }

    /// Parameters.
    pub fn params(&self) -> &CloverFermActParams {
        &self.params
    }
}

impl FermAct for CloverFermAct {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn quark_mass(&self) -> f64 {
        self.params.mass
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
        EO_PREC_4D
    }

    fn as_eo_prec_4d(&self) -> Option<&dyn EvenOddPrecFermAct4d> {
        Some(self)
    }
}

impl EvenOddPrecFermAct4d for CloverFermAct {
    fn linop(
        &self,
        state: &Arc<dyn FermState>,
    ) -> Result<Box<dyn EvenOddPrecLinearOperator<LatticeFermion>>, ConfigError> {
        Ok(Box::new(EvenOddPrecCloverLinOp::new(state, self.params.coeffs())?))
    }
}

impl WriteXml for CloverFermAct {
    fn write_xml(&self, xml: &mut XmlWriter, tag: &str) {
        self.params.write_xml(xml, tag);
    }
}

/// Stout-link clover action: clover term on thin links, hopping terms on
/// stout-smeared links.
#[derive(Clone, Debug)]
pub struct SlrcFermAct {
    bc: Arc<dyn FermBc>,
    params: CloverFermActParams,
    stout: StoutParams,
}

impl SlrcFermAct {
    /// Registry name.
    pub const NAME: &'static str = "SLRC";

    /// Bind `params` and smearing `stout` to boundary conditions `bc`.
    pub fn new(bc: Arc<dyn FermBc>, params: CloverFermActParams, stout: StoutParams) -> Self {
        Self { bc, params, stout }
    }

    /// Read from a `<FermionAction>` block. An absent `<StoutParam>`
    /// means no smearing.
    pub fn from_xml(xml: &XmlReader) -> Result<Self, ConfigError> {
        let params = CloverFermActParams::read_xml(xml, ".")?;
        let stout = if xml.exists("StoutParam") {
            StoutParams::read_xml(xml, "StoutParam")?
        } else {
            StoutParams::new(0, 0.0)
        };
        let bc = read_ferm_bc(xml, "FermionBC")?;
        Ok(Self::new(bc, params, stout))
    }

    /// Clover parameters.
    pub fn params(&self) -> &CloverFermActParams {
        &self.params
    }

    /// Smearing parameters.
    pub fn stout_params(&self) -> &StoutParams {
        &self.stout
    }
}

impl FermAct for SlrcFermAct {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn quark_mass(&self) -> f64 {
        self.params.mass
    }

    fn create_state(
        &self,
        layout: &Arc<Layout>,
        gauge: &GaugeField,
    ) -> Result<Arc<dyn FermState>, ConfigError> {
        Ok(Arc::new(SlicFermState::new(
            Arc::clone(layout),
            Arc::clone(&self.bc),
            gauge,
            self.stout.clone(),
        )?))
    }

    fn capability(&self) -> &'static str {
        EO_PREC_4D
    }

    fn as_eo_prec_4d(&self) -> Option<&dyn EvenOddPrecFermAct4d> {
        Some(self)
    }
}

impl EvenOddPrecFermAct4d for SlrcFermAct {
    fn linop(
        &self,
        state: &Arc<dyn FermState>,
    ) -> Result<Box<dyn EvenOddPrecLinearOperator<LatticeFermion>>, ConfigError> {
        Ok(Box::new(EvenOddPrecSlrcLinOp::new(state, self.params.coeffs())?))
    }
}

impl WriteXml for SlrcFermAct {
    fn write_xml(&self, xml: &mut XmlWriter, tag: &str) {
        xml.push(tag);
        xml.write("Mass", &self.params.mass);
        xml.write("clovCoeff", &self.params.clov_coeff);
        xml.write("clovCoeffR", &self.params.clov_coeff_r);
        xml.write("clovCoeffT", &self.params.clov_coeff_t);
        xml.write("u0", &self.params.u0);
        if let Some(aniso) = &self.params.aniso {
            xml.write_block("AnisoParam", aniso);
        }
        xml.write_block("StoutParam", &self.stout);
        xml.pop();
    }
}
