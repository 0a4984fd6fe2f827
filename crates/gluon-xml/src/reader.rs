//! Path-addressed read access to an XML document.

use std::sync::Arc;

use gluon_core::ConfigError;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::value::XmlValue;
use crate::writer::XmlWriter;
use crate::ReadXml;

/// One parsed element.
#[derive(Debug)]
struct XmlNode {
    name: String,
    text: String,
    children: Vec<Arc<XmlNode>>,
}

impl XmlNode {
    fn new(name: String) -> Self {
        Self {
            name,
            text: String::new(),
            children: Vec::new(),
        }
    }
}

/// A cursor into a parsed document.
///
/// Cloning is cheap: the tree is shared. Paths are relative to the
/// cursor, slash separated, and a leading `/` is ignored, so
/// `"/Param/Mass"` and `"Param/Mass"` address the same element. When an
/// element name repeats, the first occurrence wins.
///
/// All lookups report failures as [`ConfigError`] carrying the full path
/// of the offending element from the document root.
#[derive(Clone, Debug)]
pub struct XmlReader {
    node: Arc<XmlNode>,
    path: String,
}

impl XmlReader {
    /// Parse a complete document.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut reader = Reader::from_str(text);
        reader.trim_text(true);

        let mut stack = vec![XmlNode::new(String::new())];
        loop {
            let event = reader.read_event().map_err(|e| ConfigError::Xml {
                reason: format!("at byte {}: {e}", reader.buffer_position()),
            })?;
            match event {
                Event::Start(e) => {
                    stack.push(XmlNode::new(element_name(e.name().as_ref())?));
                }
                Event::Empty(e) => {
                    let leaf = XmlNode::new(element_name(e.name().as_ref())?);
                    if let Some(top) = stack.last_mut() {
                        top.children.push(Arc::new(leaf));
                    }
                }
                Event::Text(t) => {
                    let s = t.unescape().map_err(|e| ConfigError::Xml {
                        reason: e.to_string(),
                    })?;
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&s);
                    }
                }
                Event::CData(c) => {
                    let raw = c.into_inner();
                    let s = std::str::from_utf8(&raw).map_err(|e| ConfigError::Xml {
                        reason: e.to_string(),
                    })?;
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(s);
                    }
                }
                Event::End(_) => {
                    if stack.len() < 2 {
                        return Err(ConfigError::Xml {
                            reason: "unbalanced closing tag".into(),
                        });
                    }
                    if let Some(done) = stack.pop() {
                        if let Some(parent) = stack.last_mut() {
                            parent.children.push(Arc::new(done));
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if stack.len() != 1 {
            return Err(ConfigError::Xml {
                reason: "document ended inside an element".into(),
            });
        }
        let root = stack.pop().map(Arc::new).ok_or_else(|| ConfigError::Xml {
            reason: "empty document".into(),
        })?;
        if root.children.is_empty() {
            return Err(ConfigError::Xml {
                reason: "document has no root element".into(),
            });
        }
        Ok(Self {
            node: root,
            path: String::new(),
        })
    }

    /// Full path of this cursor from the document root (`""` at the root).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Element name at the cursor.
    pub fn name(&self) -> &str {
        &self.node.name
    }

    /// Trimmed text content at the cursor.
    pub fn text(&self) -> &str {
        self.node.text.trim()
    }

    /// Full path of `rel` below this cursor.
    pub fn full_path(&self, rel: &str) -> String {
        let rel = rel.trim_start_matches('/');
        if rel.is_empty() {
            if self.path.is_empty() {
                "/".to_owned()
            } else {
                self.path.clone()
            }
        } else {
            format!("{}/{}", self.path, rel)
        }
    }

    /// The element at `rel`, if present.
    pub fn find(&self, rel: &str) -> Option<XmlReader> {
        let mut node = Arc::clone(&self.node);
        let mut path = self.path.clone();
        for seg in rel.split('/').filter(|s| !s.is_empty() && *s != ".") {
            let next = node.children.iter().find(|c| c.name == seg)?;
            node = Arc::clone(next);
            path.push('/');
            path.push_str(seg);
        }
        Some(Self { node, path })
    }

    /// The element at `rel`, or [`ConfigError::MissingField`].
    pub fn child(&self, rel: &str) -> Result<XmlReader, ConfigError> {
        self.find(rel).ok_or_else(|| {
            let path = self.full_path(rel);
            tracing::error!(%path, "missing required field");
            ConfigError::MissingField { path }
        })
    }

    /// Every direct child named `name`, in document order.
    pub fn children(&self, name: &str) -> Vec<XmlReader> {
        self.node
            .children
            .iter()
            .filter(|c| c.name == name)
            .map(|c| Self {
                node: Arc::clone(c),
                path: format!("{}/{}", self.path, name),
            })
            .collect()
    }

    /// Whether an element exists at `rel`.
    pub fn exists(&self, rel: &str) -> bool {
        self.find(rel).is_some()
    }

    /// Strictly read the value at `rel`.
    pub fn read<T: XmlValue>(&self, rel: &str) -> Result<T, ConfigError> {
        let node = self.child(rel)?;
        T::from_xml_text(node.text(), &node.path)
    }

    /// Read the value at `rel` if present. A present but malformed value
    /// is still an error.
    pub fn read_opt<T: XmlValue>(&self, rel: &str) -> Result<Option<T>, ConfigError> {
        self.find(rel)
            .map(|node| T::from_xml_text(node.text(), &node.path))
            .transpose()
    }

    /// Read the value at `rel`, or `default` if absent.
    pub fn read_or<T: XmlValue>(&self, rel: &str, default: T) -> Result<T, ConfigError> {
        Ok(self.read_opt(rel)?.unwrap_or(default))
    }

    /// Read a parameter block rooted at `rel`.
    pub fn read_block<T: ReadXml>(&self, rel: &str) -> Result<T, ConfigError> {
        T::read_xml(self, rel)
    }

    /// Re-serialise the subtree at the cursor.
    pub fn to_xml_string(&self) -> String {
        let mut w = XmlWriter::new();
        w.copy_from(self);
        w.finish()
    }

    pub(crate) fn for_each_child(&self, mut f: impl FnMut(&XmlReader)) {
        for c in &self.node.children {
            f(&Self {
                node: Arc::clone(c),
                path: format!("{}/{}", self.path, c.name),
            });
        }
    }

    pub(crate) fn has_children(&self) -> bool {
        !self.node.children.is_empty()
    }
}

fn element_name(raw: &[u8]) -> Result<String, ConfigError> {
    std::str::from_utf8(raw)
        .map(str::to_owned)
        .map_err(|e| ConfigError::Xml {
            reason: format!("element name is not UTF-8: {e}"),
        })
}
