//! The fermion action registry.

use std::sync::LazyLock;

use gluon_core::{ConfigError, Factory};
use gluon_xml::XmlReader;

use crate::clover::{CloverFermAct, SlrcFermAct};
use crate::fermact::FermAct;
use crate::kno::KnoFermActArray;
use crate::overlap::OverlapPoleFermAct;

/// Fermion actions keyed by the `FermAct` tag. The constructor receives
/// the `<FermionAction>` block.
pub static FERM_ACT_FACTORY: LazyLock<Factory<XmlReader, Box<dyn FermAct>>> =
    LazyLock::new(|| Factory::new("FermionAction"));

fn create_clover(xml: &XmlReader) -> Result<Box<dyn FermAct>, ConfigError> {
    Ok(Box::new(CloverFermAct::from_xml(xml)?))
}

fn create_slrc(xml: &XmlReader) -> Result<Box<dyn FermAct>, ConfigError> {
    Ok(Box::new(SlrcFermAct::from_xml(xml)?))
}

fn create_kno(xml: &XmlReader) -> Result<Box<dyn FermAct>, ConfigError> {
    Ok(Box::new(KnoFermActArray::from_xml(xml)?))
}

fn create_overlap(xml: &XmlReader) -> Result<Box<dyn FermAct>, ConfigError> {
    Ok(Box::new(OverlapPoleFermAct::from_xml(xml)?))
}

/// Register every action in this crate, and the boundary conditions
/// they read. Idempotent; returns whether anything new was added.
pub fn register_all() -> bool {
    let mut added = gluon_state::register_all();
    added |= FERM_ACT_FACTORY.register_object(CloverFermAct::NAME, create_clover);
    added |= FERM_ACT_FACTORY.register_object(SlrcFermAct::NAME, create_slrc);
    added |= FERM_ACT_FACTORY.register_object(KnoFermActArray::NAME, create_kno);
    added |= FERM_ACT_FACTORY.register_object(OverlapPoleFermAct::NAME, create_overlap);
    added
}

/// Build the action described by the `<FermionAction>` block `xml`.
///
/// Only looks the name up; call [`register_all`] during startup.
pub fn create_ferm_act(xml: &XmlReader) -> Result<Box<dyn FermAct>, ConfigError> {
    let name: String = xml.read("FermAct")?;
    tracing::info!(name = %name, "creating fermion action");
    FERM_ACT_FACTORY.create_object(&name, xml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gluon_test_utils::{clover_action, overlap_action, slrc_action};

    fn block(text: &str) -> XmlReader {
        XmlReader::parse(text).unwrap().child("FermionAction").unwrap()
    }

    #[test]
    fn register_all_is_idempotent() {
        register_all();
        assert!(!register_all());
        assert_eq!(
            FERM_ACT_FACTORY.registered_names(),
            vec!["CLOVER", "SLRC", "KNO", "OVERLAP_POLE_4D"]
        );
    }

    #[test]
    fn every_registered_name_builds() {
        register_all();
        for (text, name) in [
            (clover_action(0.1, 1.0), "CLOVER"),
            (slrc_action(0.1, 1.0, 1, 0.1), "SLRC"),
            (overlap_action(), "OVERLAP_POLE_4D"),
        ] {
            let act = create_ferm_act(&block(&text)).unwrap();
            assert_eq!(act.name(), name);
        }
    }

    #[test]
    fn unknown_action_is_named() {
        let err = create_ferm_act(&block(
            "<FermionAction><FermAct>WILSON_NOT_HERE</FermAct><Mass>0.1</Mass></FermionAction>",
        ))
        .err()
        .unwrap();
        assert_eq!(
            err,
            ConfigError::UnknownType {
                factory: "FermionAction",
                name: "WILSON_NOT_HERE".into()
            }
        );
    }
}
