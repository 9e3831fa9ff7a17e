//! Node attribute values and the well-known attribute keys written during
//! conversion.

use std::fmt;

/// Marks a node the user explicitly selected as a model output.
pub const USER_DEFINED_OUTPUT: &str = "user-defined-output";

/// List of `"<index>:<format>"` entries overriding an output's layout.
pub const OUTPUT_LAYOUT_OVERRIDE: &str = "output-layout-override";

/// List of `"<index>:<datatype>"` entries overriding an output's datatype.
pub const OUTPUT_DTYPE_OVERRIDE: &str = "output-dtype-override";

/// Datatype forced onto an input placeholder.
pub const INPUT_DTYPE_OVERRIDE: &str = "input-dtype-override";

/// Layout forced onto an input placeholder.
pub const INPUT_LAYOUT_OVERRIDE: &str = "input-layout-override";

/// Requests weight compression for the node.
pub const COMPRESS_WEIGHT: &str = "compress-weight";

/// A single attribute value stored on a graph node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Str(String),
    Bool(bool),
    StrList(Vec<String>),
}

impl AttrValue {
    /// Returns the string payload, if this is a string attribute.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the boolean payload, if this is a boolean attribute.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the list payload, if this is a string-list attribute.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            AttrValue::StrList(values) => Some(values),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(value) => f.write_str(value),
            AttrValue::Bool(value) => write!(f, "{value}"),
            AttrValue::StrList(values) => write!(f, "[{}]", values.join(", ")),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(values: Vec<String>) -> Self {
        AttrValue::StrList(values)
    }
}
