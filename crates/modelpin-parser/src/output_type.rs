//! `output_type` directive.
//!
//! Either a single datatype applied to every output (`FP16`), or a list of
//! per-output overrides `name:index:DTYPE;...`. Every per-output entry must
//! refer to an output declared in `out_nodes`.

use indexmap::IndexMap;
use log::{debug, info};

use modelpin_core::tensor::DataType;

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    key::DirectiveKey,
    out_nodes::parse_index,
    token::{self, Piece},
};

/// A datatype override for one output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DtypeOverride {
    pub name: String,
    pub index: u32,
    pub dtype: DataType,
}

/// The parsed `output_type` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTypeOverride {
    /// One datatype for all outputs.
    Global(DataType),
    /// Per-output datatypes in declaration order.
    PerOutput(Vec<DtypeOverride>),
}

impl OutputTypeOverride {
    /// Groups per-output overrides by node name as `"<index>:<DT_...>"`
    /// attribute entries.
    ///
    /// A global override yields an empty map.
    pub fn node_entries(&self) -> IndexMap<&str, Vec<String>> {
        let mut entries: IndexMap<&str, Vec<String>> = IndexMap::new();
        if let OutputTypeOverride::PerOutput(overrides) = self {
            for item in overrides {
                entries
                    .entry(item.name.as_str())
                    .or_default()
                    .push(format!("{}:{}", item.index, item.dtype.serial_name()));
            }
        }
        entries
    }
}

/// Parses the `output_type` directive.
///
/// `out_nodes` is the ordered `(name, index)` list already parsed from the
/// `out_nodes` directive.
///
/// # Errors
///
/// - `UnsupportedValue` for datatypes other than FP32, FP16 and UINT8, and
///   for invalid indices.
/// - `MalformedDirective` when an entry does not have exactly three fields.
/// - `Inconsistent` when an entry names an output missing from `out_nodes`.
pub fn parse_output_type(spec: &str, out_nodes: &[(String, u32)]) -> Result<OutputTypeOverride> {
    if !spec.contains(':') {
        let dtype = parse_dtype(spec, token::trim(token::whole(spec)))?;
        info!(dtype:%; "output_type applies to all outputs");
        return Ok(OutputTypeOverride::Global(dtype));
    }

    let mut overrides = Vec::new();
    for entry in token::split(token::whole(spec), ';') {
        let fields = token::split(entry, ':');
        let [name, index, dtype] = fields.as_slice() else {
            return Err(output_type_error(
                spec,
                format!("entry `{}` is not of the form `name:index:dtype`", entry.inner()),
                ErrorCode::E008,
            )
            .with_value(*entry.inner())
            .with_label(entry.span(), format!("{} field(s)", fields.len()))
            .with_help("the correct format is `opname:index:dtype`"));
        };

        let name = token::trim(*name);
        if name.is_empty() {
            return Err(
                output_type_error(spec, "entry has an empty node name", ErrorCode::E003)
                    .with_value(*entry.inner())
                    .with_label(name.span(), "node name expected here"),
            );
        }
        let index = parse_index(DirectiveKey::OutputType, spec, *index)?;
        let dtype = parse_dtype(spec, token::trim(*dtype))?;

        let declared = out_nodes
            .iter()
            .any(|(out_name, out_index)| out_name == *name.inner() && *out_index == index);
        if !declared {
            return Err(output_type_error(
                spec,
                format!("output `{}:{index}` is not listed in out_nodes", name.inner()),
                ErrorCode::E014,
            )
            .with_label(entry.span(), "undeclared output")
            .with_help("the outputs set in output_type must also be set in out_nodes"));
        }

        overrides.push(DtypeOverride {
            name: name.inner().to_string(),
            index,
            dtype,
        });
    }

    debug!(overrides = overrides.len(); "Parsed output_type");
    Ok(OutputTypeOverride::PerOutput(overrides))
}

fn parse_dtype(spec: &str, dtype: Piece<'_>) -> Result<DataType> {
    token::parse_datatype(dtype.inner()).ok_or_else(|| {
        output_type_error(
            spec,
            format!("`{}` is not a supported output datatype", dtype.inner()),
            ErrorCode::E009,
        )
        .with_value(*dtype.inner())
        .with_label(dtype.span(), "unsupported datatype")
        .with_help(format!(
            "only support {}",
            DataType::SUPPORTED.map(DataType::directive_name).join(", ")
        ))
    })
}

fn output_type_error(spec: &str, message: impl Into<String>, code: ErrorCode) -> Diagnostic {
    Diagnostic::error(message)
        .with_code(code)
        .with_parameter(DirectiveKey::OutputType.as_str())
        .with_value(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn outs(pairs: &[(&str, u32)]) -> Vec<(String, u32)> {
        pairs
            .iter()
            .map(|(name, index)| (name.to_string(), *index))
            .collect()
    }

    #[test]
    fn test_global_datatype() {
        assert_eq!(
            parse_output_type("FP16", &[]).unwrap(),
            OutputTypeOverride::Global(DataType::Float16)
        );
        assert_eq!(
            parse_output_type(" UINT8 ", &[]).unwrap(),
            OutputTypeOverride::Global(DataType::Uint8)
        );

        let err = parse_output_type("INT8", &[]).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::UnsupportedValue));
    }

    #[test]
    fn test_per_output_requires_declared_output() {
        let parsed = parse_output_type("n1:0:FP16", &outs(&[("n1", 0)])).unwrap();
        assert_eq!(
            parsed,
            OutputTypeOverride::PerOutput(vec![DtypeOverride {
                name: "n1".to_string(),
                index: 0,
                dtype: DataType::Float16,
            }])
        );

        let err = parse_output_type("n1:0:FP16", &outs(&[("n2", 0)])).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Inconsistent));

        let err = parse_output_type("n1:1:FP16", &outs(&[("n1", 0)])).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Inconsistent));
    }

    #[test]
    fn test_field_count() {
        let err = parse_output_type("n1:FP16", &outs(&[("n1", 0)])).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::MalformedDirective));

        let err = parse_output_type("n1:0:FP16:x", &outs(&[("n1", 0)])).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::MalformedDirective));
    }

    #[test]
    fn test_per_output_datatype_and_index() {
        let declared = outs(&[("n1", 0)]);

        let err = parse_output_type("n1:0:FP64", &declared).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E009));

        let err = parse_output_type("n1:x:FP16", &declared).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::UnsupportedValue));
    }

    #[test]
    fn test_node_entries_group_by_name() {
        let declared = outs(&[("a", 0), ("b", 0), ("a", 1)]);
        let parsed = parse_output_type("a:0:FP16; b : 0 : UINT8 ;a:1:FP32", &declared).unwrap();
        let entries = parsed.node_entries();

        assert_eq!(entries.keys().copied().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(entries["a"], vec!["0:DT_FLOAT16", "1:DT_FLOAT"]);
        assert_eq!(entries["b"], vec!["0:DT_UINT8"]);

        assert!(OutputTypeOverride::Global(DataType::Float).node_entries().is_empty());
    }
}
