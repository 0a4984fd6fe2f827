//! The monomial registry.

use std::sync::LazyLock;

use gluon_core::{ConfigError, Factory};
use gluon_xml::XmlReader;

use crate::monomial::Monomial;
use crate::one_flavor::OneFlavorEoPrecConstDetFermRatMonomial;

/// Monomials keyed by the `Name` tag. The constructor receives the
/// `<Monomial>` block.
pub static MONOMIAL_FACTORY: LazyLock<Factory<XmlReader, Box<dyn Monomial>>> =
    LazyLock::new(|| Factory::new("Monomial"));

fn create_one_flavor(xml: &XmlReader) -> Result<Box<dyn Monomial>, ConfigError> {
    Ok(Box::new(OneFlavorEoPrecConstDetFermRatMonomial::from_xml(
        xml,
    )?))
}

/// Register every monomial, together with the actions and solvers they
/// build. Idempotent; returns whether anything new was added.
pub fn register_all() -> bool {
    let mut added = gluon_fermacts::register_all();
    added |= gluon_solver::register_all();
    added |= MONOMIAL_FACTORY.register_object(
        OneFlavorEoPrecConstDetFermRatMonomial::NAME,
        create_one_flavor,
    );
    added
}

/// Build the monomial named by `Name` in the `<Monomial>` block `xml`.
pub fn create_monomial(xml: &XmlReader) -> Result<Box<dyn Monomial>, ConfigError> {
    let name: String = xml.read("Name")?;
    tracing::info!(name = %name, "creating monomial");
    MONOMIAL_FACTORY.create_object(&name, xml)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_is_idempotent() {
        register_all();
        assert!(!register_all());
        assert!(MONOMIAL_FACTORY.is_registered(OneFlavorEoPrecConstDetFermRatMonomial::NAME));
        assert!(gluon_fermacts::FERM_ACT_FACTORY.is_registered("CLOVER"));
        assert!(gluon_solver::MDAGM_SOLVER_FACTORY.is_registered("CG_INVERTER"));
    }

    #[test]
    fn unknown_monomial_is_named() {
        let doc = XmlReader::parse("<Monomial><Name>TWO_FLAVOR_WILSON</Name></Monomial>").unwrap();
        let err = create_monomial(&doc.child("Monomial").unwrap()).err();
        assert_eq!(
            err,
            Some(ConfigError::UnknownType {
                factory: "Monomial",
                name: "TWO_FLAVOR_WILSON".into(),
            })
        );
    }
}
