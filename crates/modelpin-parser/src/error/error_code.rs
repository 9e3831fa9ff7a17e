//! Error codes for the modelpin diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Directive text errors
//! - `E1xx` - Directive file errors
//! - `E2xx` - Graph validation errors
//! - `E3xx` - Output resolution errors
//!
//! Every code belongs to exactly one [`ErrorKind`].

use std::fmt;

/// Coarse failure category shared by all codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The directive text does not follow its grammar.
    MalformedDirective,
    /// The text is well formed but names a value outside the accepted set.
    UnsupportedValue,
    /// A referenced node does not exist in the graph.
    NotFound,
    /// An output index is outside the node's output slots.
    IndexOutOfRange,
    /// Two directives, or two parts of one directive, contradict each other.
    Inconsistent,
    /// A directive file could not be read.
    IoFailure,
    /// The session or graph is in a state that should not be reachable.
    InternalInvariant,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::MalformedDirective => "malformed directive",
            ErrorKind::UnsupportedValue => "unsupported value",
            ErrorKind::NotFound => "not found",
            ErrorKind::IndexOutOfRange => "index out of range",
            ErrorKind::Inconsistent => "inconsistent directives",
            ErrorKind::IoFailure => "I/O failure",
            ErrorKind::InternalInvariant => "internal invariant violated",
        };
        f.write_str(name)
    }
}

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Directive Text Errors (E0xx)
    // =========================================================================
    /// Unknown directive key.
    ///
    /// The option map contains a key that is not a recognized directive.
    E001,

    /// Missing separator.
    ///
    /// An entry lacks the `:` that separates its name from its value.
    E002,

    /// Empty value.
    ///
    /// A required token (dimension list, dimension, index, key or value) is empty.
    E003,

    /// Invalid dimension.
    ///
    /// A shape dimension is not an integer. Floating-point values are rejected.
    E004,

    /// Integer out of range.
    ///
    /// A dimension does not fit a signed 64-bit value, or an index does not
    /// fit a signed 32-bit value.
    E005,

    /// Non-positive dimension.
    ///
    /// Zero and negative dimensions are only accepted with `is_dynamic_input=true`.
    E006,

    /// Invalid output index.
    ///
    /// An output index contains characters other than ASCII digits.
    E007,

    /// Wrong number of fields.
    ///
    /// An entry does not split into the number of `:`-separated fields its
    /// directive expects.
    E008,

    /// Unsupported datatype.
    ///
    /// Only `FP32`, `FP16` and `UINT8` are accepted.
    E009,

    /// Unsupported tensor format.
    ///
    /// The format is unknown or not accepted by the source framework.
    E010,

    /// Invalid boolean.
    ///
    /// Boolean directives accept exactly `true` or `false`.
    E011,

    /// Unsupported log level.
    E012,

    /// Mixed output selectors.
    ///
    /// `out_nodes` mixes `name:index` entries with bare top names.
    E013,

    /// Output type for an undeclared output.
    ///
    /// A per-output `output_type` entry names a `(node, index)` pair that is
    /// not listed in `out_nodes`.
    E014,

    /// Malformed mapping line.
    ///
    /// A line of the op-name-map file is not a `key:value` pair.
    E015,

    // =========================================================================
    // Directive File Errors (E1xx)
    // =========================================================================
    /// Unreadable directive file.
    E100,

    // =========================================================================
    // Graph Validation Errors (E2xx)
    // =========================================================================
    /// Node not found.
    ///
    /// A directive names a node that does not exist in the graph.
    E200,

    /// Node is not an input.
    ///
    /// The directive only applies to input placeholder nodes.
    E201,

    /// Unresolved input dimension.
    ///
    /// An input placeholder declares a negative dimension and dynamic input
    /// mode is off.
    E202,

    /// Empty op-name map.
    E203,

    /// Unknown op type in op-name map.
    ///
    /// A mapping targets an operator type the graph does not contain.
    E204,

    // =========================================================================
    // Output Resolution Errors (E3xx)
    // =========================================================================
    /// Output node not found.
    E300,

    /// Output index out of range.
    E301,

    /// Aggregator input without a producer.
    E302,

    /// Invalid session state.
    ///
    /// A graph-phase operation ran before the directives were parsed.
    E303,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Directive text errors
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            ErrorCode::E006 => "E006",
            ErrorCode::E007 => "E007",
            ErrorCode::E008 => "E008",
            ErrorCode::E009 => "E009",
            ErrorCode::E010 => "E010",
            ErrorCode::E011 => "E011",
            ErrorCode::E012 => "E012",
            ErrorCode::E013 => "E013",
            ErrorCode::E014 => "E014",
            ErrorCode::E015 => "E015",
            // Directive file errors
            ErrorCode::E100 => "E100",
            // Graph validation errors
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            // Output resolution errors
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E302 => "E302",
            ErrorCode::E303 => "E303",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            // Directive text errors
            ErrorCode::E001 => "unknown directive",
            ErrorCode::E002 => "missing separator",
            ErrorCode::E003 => "empty value",
            ErrorCode::E004 => "invalid dimension",
            ErrorCode::E005 => "integer out of range",
            ErrorCode::E006 => "non-positive dimension",
            ErrorCode::E007 => "invalid output index",
            ErrorCode::E008 => "wrong number of fields",
            ErrorCode::E009 => "unsupported datatype",
            ErrorCode::E010 => "unsupported tensor format",
            ErrorCode::E011 => "invalid boolean",
            ErrorCode::E012 => "unsupported log level",
            ErrorCode::E013 => "mixed output selectors",
            ErrorCode::E014 => "output type for undeclared output",
            ErrorCode::E015 => "malformed mapping line",
            // Directive file errors
            ErrorCode::E100 => "unreadable directive file",
            // Graph validation errors
            ErrorCode::E200 => "node not found",
            ErrorCode::E201 => "node is not an input",
            ErrorCode::E202 => "unresolved input dimension",
            ErrorCode::E203 => "empty op-name map",
            ErrorCode::E204 => "unknown op type",
            // Output resolution errors
            ErrorCode::E300 => "output node not found",
            ErrorCode::E301 => "output index out of range",
            ErrorCode::E302 => "aggregator input without producer",
            ErrorCode::E303 => "invalid session state",
        }
    }

    /// Returns the failure category this code belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ErrorCode::E002
            | ErrorCode::E003
            | ErrorCode::E004
            | ErrorCode::E008
            | ErrorCode::E015 => ErrorKind::MalformedDirective,
            ErrorCode::E001
            | ErrorCode::E005
            | ErrorCode::E006
            | ErrorCode::E007
            | ErrorCode::E009
            | ErrorCode::E010
            | ErrorCode::E011
            | ErrorCode::E012
            | ErrorCode::E201
            | ErrorCode::E202
            | ErrorCode::E203
            | ErrorCode::E204 => ErrorKind::UnsupportedValue,
            ErrorCode::E200 | ErrorCode::E300 => ErrorKind::NotFound,
            ErrorCode::E301 => ErrorKind::IndexOutOfRange,
            ErrorCode::E013 | ErrorCode::E014 => ErrorKind::Inconsistent,
            ErrorCode::E100 => ErrorKind::IoFailure,
            ErrorCode::E302 | ErrorCode::E303 => ErrorKind::InternalInvariant,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
