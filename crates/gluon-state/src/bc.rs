//! Fermion boundary conditions.

use std::fmt;

use gluon_core::{ColorMatrix, ConfigError, GaugeField, ND};
use gluon_layout::Layout;
use gluon_xml::{ReadXml, WriteXml, XmlReader, XmlWriter};

/// How fermions see the links that cross the lattice boundary.
///
/// Boundary conditions act on links, not on fermion fields: the operator
/// is built from links already passed through [`modify`](Self::modify).
/// Because `modify` is a per-link real rescale, applying it to a raw
/// force computed on modified links re-expresses that force with respect
/// to the original links.
pub trait FermBc: Send + Sync + fmt::Debug {
    /// Registry name.
    fn name(&self) -> &'static str;

    /// Apply the boundary phases to `u` in place.
    fn modify(&self, layout: &Layout, u: &mut GaugeField);

    /// Zero force components on links fixed by the boundary.
    fn zero(&self, layout: &Layout, ds: &mut GaugeField);

    /// Whether [`modify`](Self::modify) changes anything.
    fn nontrivial(&self) -> bool;
}

/// Per-direction boundary factor: `1` periodic, `-1` antiperiodic, `0`
/// Dirichlet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimpleFermBc {
    boundary: [i32; ND],
}

impl SimpleFermBc {
    /// Registry name.
    pub const NAME: &'static str = "SIMPLE_FERMBC";

    /// Validate and build.
    pub fn new(boundary: [i32; ND]) -> Result<Self, ConfigError> {
        if let Some((mu, b)) = boundary
            .iter()
            .enumerate()
            .find(|(_, b)| !(-1..=1).contains(*b))
        {
            return Err(ConfigError::invalid(
                "boundary",
                format!("direction {mu} has factor {b}; expected 1, -1 or 0"),
            ));
        }
        Ok(Self { boundary })
    }

    /// Periodic in space, antiperiodic in time.
    pub fn antiperiodic_t() -> Self {
        Self {
            boundary: [1, 1, 1, -1],
        }
    }

    /// The factors, indexed by direction.
    pub fn boundary(&self) -> [i32; ND] {
        self.boundary
    }
}

impl Default for SimpleFermBc {
    fn default() -> Self {
        Self::antiperiodic_t()
    }
}

impl FermBc for SimpleFermBc {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn modify(&self, layout: &Layout, u: &mut GaugeField) {
        for (mu, &b) in self.boundary.iter().enumerate() {
            if b == 1 {
                continue;
            }
            for &site in layout.boundary_sites(mu) {
                let l = u.link_mut(mu, site);
                *l = l.scale(f64::from(b));
            }
        }
    }

    fn zero(&self, layout: &Layout, ds: &mut GaugeField) {
        for (mu, &b) in self.boundary.iter().enumerate() {
            if b != 0 {
                continue;
            }
            for &site in layout.boundary_sites(mu) {
                *ds.link_mut(mu, site) = ColorMatrix::ZERO;
            }
        }
    }

    fn nontrivial(&self) -> bool {
        self.boundary.iter().any(|&b| b != 1)
    }
}

impl ReadXml for SimpleFermBc {
    fn read_xml(xml: &XmlReader, path: &str) -> Result<Self, ConfigError> {
        let block = xml.child(path)?;
        let values: Vec<i32> = block.read("boundary")?;
        let boundary: [i32; ND] = values.as_slice().try_into().map_err(|_| {
            ConfigError::invalid(
                block.full_path("boundary"),
                format!("expected {ND} entries, found {}", values.len()),
            )
        })?;
        Self::new(boundary).map_err(|e| match e {
            ConfigError::InvalidValue { reason, .. } => {
                ConfigError::invalid(block.full_path("boundary"), reason)
            }
            other => other,
        })
    }
}

impl WriteXml for SimpleFermBc {
    fn write_xml(&self, xml: &mut XmlWriter, tag: &str) {
        xml.push(tag);
        xml.write("FermBC", &Self::NAME.to_string());
        xml.write("boundary", &self.boundary.to_vec());
        xml.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn antiperiodic_time_flips_only_the_last_slice() {
        let layout = Layout::new([2, 2, 2, 4]).unwrap();
        let mut u = GaugeField::identity(layout.volume());
        let bc = SimpleFermBc::default();
        bc.modify(&layout, &mut u);
        for site in 0..layout.volume() {
            let want = if layout.coords(site)[3] == 3 { -1.0 } else { 1.0 };
            assert_eq!(u.link(3, site).m[0][0].re, want);
            assert_eq!(*u.link(0, site), ColorMatrix::IDENTITY);
        }
    }

    #[test]
    fn dirichlet_zeroes_boundary_forces() {
        let layout = Layout::new([2, 2, 2, 4]).unwrap();
        let bc = SimpleFermBc::new([1, 1, 1, 0]).unwrap();
        let mut ds = GaugeField::identity(layout.volume());
        bc.zero(&layout, &mut ds);
        let zeroed = (0..layout.volume())
            .filter(|&s| *ds.link(3, s) == ColorMatrix::ZERO)
            .count();
        assert_eq!(zeroed, layout.volume() / 4);
        assert!(bc.nontrivial());
        assert!(!SimpleFermBc::new([1, 1, 1, 1]).unwrap().nontrivial());
    }

    #[test]
    fn rejects_bad_factors() {
        assert!(SimpleFermBc::new([1, 2, 1, -1]).is_err());
        let xml = XmlReader::parse("<FermionBC><boundary>1 1 -1</boundary></FermionBC>").unwrap();
        assert!(matches!(
            SimpleFermBc::read_xml(&xml, "FermionBC"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn xml_round_trip() {
        let bc = SimpleFermBc::new([1, -1, 1, 0]).unwrap();
        let mut w = XmlWriter::new();
        bc.write_xml(&mut w, "FermionBC");
        let xml = XmlReader::parse(&w.finish()).unwrap();
        assert_eq!(SimpleFermBc::read_xml(&xml, "FermionBC").unwrap(), bc);
    }

    proptest! {
        #[test]
        fn non_dirichlet_modify_is_an_involution(b in prop::array::uniform4(prop_oneof![Just(1i32), Just(-1i32)])) {
            let layout = Layout::new([2, 2, 2, 2]).unwrap();
            let bc = SimpleFermBc::new(b).unwrap();
            let mut u = GaugeField::identity(layout.volume());
            bc.modify(&layout, &mut u);
            bc.modify(&layout, &mut u);
            prop_assert_eq!(u, GaugeField::identity(layout.volume()));
        }
    }
}
