//! Nested element output.

use quick_xml::escape::escape;

use crate::reader::XmlReader;
use crate::value::XmlValue;
use crate::WriteXml;

/// Builds an indented XML document one element at a time.
///
/// [`push`](Self::push) opens an element and [`pop`](Self::pop) closes
/// the innermost one; [`finish`](Self::finish) closes anything still open.
#[derive(Debug, Default)]
pub struct XmlWriter {
    out: String,
    open: Vec<String>,
}

impl XmlWriter {
    /// Empty document.
    pub fn new() -> Self {
        Self::default()
    }

    fn indent(&mut self) {
        for _ in 0..self.open.len() {
            self.out.push_str("  ");
        }
    }

    /// Open `<tag>`.
    pub fn push(&mut self, tag: &str) {
        self.indent();
        self.out.push('<');
        self.out.push_str(tag);
        self.out.push_str(">\n");
        self.open.push(tag.to_owned());
    }

    /// Close the innermost open element. Does nothing at the top level.
    pub fn pop(&mut self) {
        if let Some(tag) = self.open.pop() {
            self.indent();
            self.out.push_str("</");
            self.out.push_str(&tag);
            self.out.push_str(">\n");
        }
    }

    /// Write `<tag>value</tag>`.
    pub fn write<T: XmlValue>(&mut self, tag: &str, value: &T) {
        self.write_text(tag, &value.to_xml_text());
    }

    /// Write an optional leaf; `None` writes nothing.
    pub fn write_opt<T: XmlValue>(&mut self, tag: &str, value: Option<&T>) {
        if let Some(v) = value {
            self.write(tag, v);
        }
    }

    /// Write a parameter block as `<tag>…</tag>`.
    pub fn write_block<T: WriteXml>(&mut self, tag: &str, block: &T) {
        block.write_xml(self, tag);
    }

    fn write_text(&mut self, tag: &str, text: &str) {
        self.indent();
        self.out.push('<');
        self.out.push_str(tag);
        self.out.push('>');
        self.out.push_str(&escape(text));
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push_str(">\n");
    }

    /// Copy the subtree under `node`, including the element itself.
    pub fn copy_from(&mut self, node: &XmlReader) {
        if node.path().is_empty() {
            node.for_each_child(|c| self.copy_from(c));
        } else if node.has_children() {
            self.push(node.name());
            node.for_each_child(|c| self.copy_from(c));
            self.pop();
        } else {
            self.write_text(node.name(), node.text());
        }
    }

    /// Close every open element and return the document.
    pub fn finish(mut self) -> String {
        while !self.open.is_empty() {
            self.pop();
        }
        self.out
    }
}
