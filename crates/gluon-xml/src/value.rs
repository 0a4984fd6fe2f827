//! Leaf values: the text content of a single element.

use gluon_core::ConfigError;

/// A value stored as the text of one element.
///
/// Lists are whitespace separated, e.g. `<boundary>1 1 1 -1</boundary>`.
pub trait XmlValue: Sized {
    /// Parse element text. `path` is only used in error messages.
    fn from_xml_text(text: &str, path: &str) -> Result<Self, ConfigError>;

    /// Render as element text.
    fn to_xml_text(&self) -> String;
}

macro_rules! impl_xml_value_via_fromstr {
    ($($t:ty),* $(,)?) => {
        $(
            impl XmlValue for $t {
                fn from_xml_text(text: &str, path: &str) -> Result<Self, ConfigError> {
                    text.trim().parse::<$t>().map_err(|e| {
                        ConfigError::invalid(path, format!("cannot parse {:?} as {}: {e}", text.trim(), stringify!($t)))
                    })
                }

                fn to_xml_text(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

impl_xml_value_via_fromstr!(i32, i64, u32, u64, usize);

impl XmlValue for f64 {
    fn from_xml_text(text: &str, path: &str) -> Result<Self, ConfigError> {
        let t = text.trim();
        t.parse::<f64>()
            .map_err(|e| ConfigError::invalid(path, format!("cannot parse {t:?} as f64: {e}")))
    }

    fn to_xml_text(&self) -> String {
        // `{:?}` keeps enough digits to round-trip exactly.
        format!("{self:?}")
    }
}

impl XmlValue for bool {
    fn from_xml_text(text: &str, path: &str) -> Result<Self, ConfigError> {
        match text.trim() {
            "true" | "TRUE" | "True" | "1" => Ok(true),
            "false" | "FALSE" | "False" | "0" => Ok(false),
            other => Err(ConfigError::invalid(
                path,
                format!("expected a boolean, found {other:?}"),
            )),
        }
    }

    fn to_xml_text(&self) -> String {
        self.to_string()
    }
}

impl XmlValue for String {
    fn from_xml_text(text: &str, _path: &str) -> Result<Self, ConfigError> {
        Ok(text.trim().to_owned())
    }

    fn to_xml_text(&self) -> String {
        self.clone()
    }
}

impl<T: XmlValue> XmlValue for Vec<T> {
    fn from_xml_text(text: &str, path: &str) -> Result<Self, ConfigError> {
        text.split_whitespace()
            .map(|tok| T::from_xml_text(tok, path))
            .collect()
    }

    fn to_xml_text(&self) -> String {
        self.iter()
            .map(XmlValue::to_xml_text)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
