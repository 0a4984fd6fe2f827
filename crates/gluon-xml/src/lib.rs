//! XML parameter I/O for Gluon.
//!
//! Every configurable object reads its parameters from an XML block and
//! can write them back. [`XmlReader`] parses a document into an immutable
//! tree and addresses elements by slash-separated paths; [`XmlWriter`]
//! emits nested elements. Parameter blocks implement [`ReadXml`] and
//! [`WriteXml`]; scalar and list leaves implement [`XmlValue`].
//!
//! ```
//! use gluon_xml::{XmlReader, XmlWriter};
//!
//! let xml = XmlReader::parse("<Param><Mass>0.1</Mass><N5>8</N5></Param>").unwrap();
//! let mass: f64 = xml.read("Param/Mass").unwrap();
//! let u0: f64 = xml.read_or("Param/u0", 1.0).unwrap();
//! assert_eq!((mass, u0), (0.1, 1.0));
//!
//! let mut w = XmlWriter::new();
//! w.push("Param");
//! w.write("Mass", &mass);
//! w.pop();
//! let back = XmlReader::parse(&w.finish()).unwrap();
//! assert_eq!(back.read::<f64>("Param/Mass").unwrap(), 0.1);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod reader;
pub mod value;
pub mod writer;

pub use reader::XmlReader;
pub use value::XmlValue;
pub use writer::XmlWriter;

use gluon_core::ConfigError;

/// A parameter block that can be read from the element at `path`.
pub trait ReadXml: Sized {
    /// Read the block rooted at `path` relative to `xml`.
    fn read_xml(xml: &XmlReader, path: &str) -> Result<Self, ConfigError>;
}

/// A parameter block that can be written as an element named `tag`.
pub trait WriteXml {
    /// Write the block as `<tag>…</tag>`.
    fn write_xml(&self, xml: &mut XmlWriter, tag: &str);
}
