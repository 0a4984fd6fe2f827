//! The fermion boundary condition registry.

use std::sync::{Arc, LazyLock};

use gluon_core::{ConfigError, Factory};
use gluon_xml::{ReadXml, XmlReader};

use crate::bc::{FermBc, SimpleFermBc};

/// Boundary conditions keyed by the `FermBC` tag. The constructor
/// receives the `FermionBC` block.
pub static FERM_BC_FACTORY: LazyLock<Factory<XmlReader, Arc<dyn FermBc>>> =
    LazyLock::new(|| Factory::new("FermBC"));

fn create_simple(xml: &XmlReader) -> Result<Arc<dyn FermBc>, ConfigError> {
    Ok(Arc::new(SimpleFermBc::read_xml(xml, ".")?))
}

/// Register every boundary condition in this crate. Idempotent; returns
/// whether anything new was added.
pub fn register_all() -> bool {
    FERM_BC_FACTORY.register_object(SimpleFermBc::NAME, create_simple)
}

/// Build the boundary condition described by the block at `rel`.
///
/// An absent block means periodic in space and antiperiodic in time.
/// A present block is resolved through [`FERM_BC_FACTORY`], which must
/// have been populated by [`register_all`].
pub fn read_ferm_bc(xml: &XmlReader, rel: &str) -> Result<Arc<dyn FermBc>, ConfigError> {
    match xml.find(rel) {
        None => Ok(Arc::new(SimpleFermBc::default())),
        Some(block) => {
            let name: String = block.read("FermBC")?;
            FERM_BC_FACTORY.create_object(&name, &block)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_all_is_idempotent() {
        register_all();
        assert!(!register_all());
        assert!(FERM_BC_FACTORY.is_registered("SIMPLE_FERMBC"));
    }

    #[test]
    fn absent_block_defaults_to_antiperiodic_time() {
        let xml = XmlReader::parse("<FermionAction><Mass>0.1</Mass></FermionAction>").unwrap();
        let bc = read_ferm_bc(&xml, "FermionAction/FermionBC").unwrap();
        assert_eq!(bc.name(), "SIMPLE_FERMBC");
        assert!(bc.nontrivial());
    }

    #[test]
    fn unknown_bc_is_named() {
        let xml = XmlReader::parse(
            "<FermionBC><FermBC>TWISTED_FERMBC</FermBC><boundary>1 1 1 1</boundary></FermionBC>",
        )
        .unwrap();
        let err = read_ferm_bc(&xml, "FermionBC").unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownType {
                factory: "FermBC",
                name: "TWISTED_FERMBC".into()
            }
        );
    }
}
