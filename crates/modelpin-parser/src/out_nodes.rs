//! `out_nodes` directive.
//!
//! Grammar: `name1:idx1;name2:idx2;...`, or for frameworks that name their
//! outputs by top blob, `top1;top2;...`. The two forms cannot be mixed in one
//! directive.

use indexmap::{IndexMap, IndexSet};
use log::{debug, trace};

use modelpin_core::framework::Framework;

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    key::DirectiveKey,
    span::Span,
    token::{self, Piece},
};

const SAMPLE: &str = "node_name1:0;node_name1:1;node_name2:0";

/// One entry of `out_nodes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSelector {
    /// `name:index`
    Indexed { name: String, index: u32 },
    /// A bare top-blob name.
    TopName(String),
}

/// The parsed `out_nodes` directive.
///
/// Entries are kept in the order the user wrote them. Indices of repeated
/// node names are additionally grouped per name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputSelection {
    selectors: Vec<OutputSelector>,
    by_name: IndexMap<String, IndexSet<u32>>,
}

impl OutputSelection {
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// All entries in declaration order.
    pub fn selectors(&self) -> &[OutputSelector] {
        &self.selectors
    }

    /// Node name to the set of its selected output indices, in order of first
    /// appearance.
    pub fn out_nodes_map(&self) -> &IndexMap<String, IndexSet<u32>> {
        &self.by_name
    }

    /// `(name, index)` pairs in declaration order, duplicates included.
    pub fn user_out_nodes(&self) -> impl Iterator<Item = (&str, u32)> {
        self.selectors.iter().filter_map(|selector| match selector {
            OutputSelector::Indexed { name, index } => Some((name.as_str(), *index)),
            OutputSelector::TopName(_) => None,
        })
    }

    /// Bare top names in declaration order.
    pub fn top_names(&self) -> impl Iterator<Item = &str> {
        self.selectors.iter().filter_map(|selector| match selector {
            OutputSelector::TopName(name) => Some(name.as_str()),
            OutputSelector::Indexed { .. } => None,
        })
    }

    fn push(&mut self, selector: OutputSelector) {
        if let OutputSelector::Indexed { name, index } = &selector {
            self.by_name.entry(name.clone()).or_default().insert(*index);
        }
        self.selectors.push(selector);
    }
}

/// Parses the `out_nodes` directive.
///
/// # Errors
///
/// - `MalformedDirective` when an entry does not split into `name:index`
///   (or a bare name for top-name frameworks), or has an empty name or index.
/// - `UnsupportedValue` when an index is not a digit string or overflows.
/// - `Inconsistent` when indexed and top-name entries are mixed.
pub fn parse_out_nodes(spec: &str, framework: Framework) -> Result<OutputSelection> {
    let mut selection = OutputSelection::default();
    if spec.is_empty() {
        return Ok(selection);
    }

    let accepts_top_names = framework.capabilities().uses_top_names();
    let mut first_indexed: Option<Span> = None;
    let mut first_top: Option<Span> = None;

    for entry in token::split(token::whole(spec), ';') {
        let fields = token::split(entry, ':');
        match fields.as_slice() {
            [name, index] => {
                if let Some(top_span) = first_top {
                    return Err(mixed_forms(spec, entry.span(), top_span, "top name"));
                }
                let name = parse_name(spec, entry, *name)?;
                let index = parse_index(DirectiveKey::OutNodes, spec, *index)?;
                first_indexed.get_or_insert(entry.span());
                trace!(name, index; "Parsed output selector");
                selection.push(OutputSelector::Indexed { name, index });
            }
            [top] if accepts_top_names => {
                if let Some(indexed_span) = first_indexed {
                    return Err(mixed_forms(spec, entry.span(), indexed_span, "indexed entry"));
                }
                let name = parse_name(spec, entry, *top)?;
                first_top.get_or_insert(entry.span());
                trace!(top_name = name; "Parsed top name selector");
                selection.push(OutputSelector::TopName(name));
            }
            _ => {
                return Err(out_nodes_error(
                    spec,
                    format!("entry `{}` is not of the form `name:index`", entry.inner()),
                    ErrorCode::E008,
                )
                .with_value(*entry.inner())
                .with_label(entry.span(), format!("{} field(s)", fields.len()))
                .with_help(format!("the correct format is `{SAMPLE}`")));
            }
        }
    }

    debug!(entries = selection.selectors().len(), framework:%; "Parsed out_nodes");
    Ok(selection)
}

fn parse_name(spec: &str, entry: Piece<'_>, name: Piece<'_>) -> Result<String> {
    let name = token::trim(name);
    if name.is_empty() {
        return Err(
            out_nodes_error(spec, "entry has an empty node name", ErrorCode::E003)
                .with_value(*entry.inner())
                .with_label(name.span(), "node name expected here"),
        );
    }
    Ok(name.inner().to_string())
}

/// Parses an output index token shared by `out_nodes` and `output_type`.
///
/// The trimmed token must be a non-empty digit string that fits a signed
/// 32-bit integer.
pub(crate) fn parse_index(key: DirectiveKey, spec: &str, index: Piece<'_>) -> Result<u32> {
    let index = token::trim(index);
    let text = *index.inner();

    if text.is_empty() {
        return Err(Diagnostic::error("output index is empty")
            .with_code(ErrorCode::E003)
            .with_parameter(key.as_str())
            .with_value(spec)
            .with_label(index.span(), "index expected here"));
    }
    if !token::is_digits(text) {
        return Err(Diagnostic::error(format!(
            "output index `{text}` is not a non-negative integer"
        ))
        .with_code(ErrorCode::E007)
        .with_parameter(key.as_str())
        .with_value(text)
        .with_label(index.span(), "expected digits"));
    }

    text.parse::<i32>()
        .ok()
        .and_then(|value| u32::try_from(value).ok())
        .ok_or_else(|| {
            Diagnostic::error(format!("output index `{text}` is out of range"))
                .with_code(ErrorCode::E005)
                .with_parameter(key.as_str())
                .with_value(text)
                .with_label(index.span(), "does not fit a 32-bit integer")
        })
}

fn mixed_forms(spec: &str, entry: Span, earlier: Span, earlier_what: &str) -> Diagnostic {
    out_nodes_error(
        spec,
        "out_nodes must be all `name:index` entries or all top names",
        ErrorCode::E013,
    )
    .with_label(entry, "conflicting entry")
    .with_secondary_label(earlier, format!("{earlier_what} used here"))
}

fn out_nodes_error(spec: &str, message: impl Into<String>, code: ErrorCode) -> Diagnostic {
    Diagnostic::error(message)
        .with_code(code)
        .with_parameter(DirectiveKey::OutNodes.as_str())
        .with_value(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn pairs(selection: &OutputSelection) -> Vec<(&str, u32)> {
        selection.user_out_nodes().collect()
    }

    #[test]
    fn test_duplicate_names_accumulate() {
        let selection = parse_out_nodes("n1:0;n1:1;n2:0", Framework::Tensorflow).unwrap();

        assert_eq!(pairs(&selection), vec![("n1", 0), ("n1", 1), ("n2", 0)]);
        let map = selection.out_nodes_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map["n1"].iter().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(map["n2"].iter().copied().collect::<Vec<_>>(), vec![0]);
        assert_eq!(selection.top_names().count(), 0);
    }

    #[test]
    fn test_empty_spec() {
        assert!(parse_out_nodes("", Framework::Caffe).unwrap().is_empty());
    }

    #[test]
    fn test_top_names_only_for_caffe() {
        let selection = parse_out_nodes("prob;loss", Framework::Caffe).unwrap();
        assert_eq!(selection.top_names().collect::<Vec<_>>(), vec!["prob", "loss"]);
        assert_eq!(pairs(&selection), vec![]);

        let err = parse_out_nodes("prob", Framework::Tensorflow).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::MalformedDirective));
    }

    #[test]
    fn test_mixed_forms_are_inconsistent() {
        let err = parse_out_nodes("n1:0;n2", Framework::Caffe).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Inconsistent));
        assert_eq!(err.labels().len(), 2);

        let err = parse_out_nodes("n2;n1:0", Framework::Caffe).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Inconsistent));
    }

    #[test]
    fn test_wrong_field_count() {
        let err = parse_out_nodes("a:0:1", Framework::Tensorflow).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E008));
        assert_eq!(err.value(), Some("a:0:1"));
    }

    #[test]
    fn test_index_validation() {
        let kind = |spec| parse_out_nodes(spec, Framework::Onnx).unwrap_err().kind();

        assert_eq!(kind("a:"), Some(ErrorKind::MalformedDirective));
        assert_eq!(kind("a: "), Some(ErrorKind::MalformedDirective));
        assert_eq!(kind("a:-1"), Some(ErrorKind::UnsupportedValue));
        assert_eq!(kind("a:x"), Some(ErrorKind::UnsupportedValue));
        assert_eq!(kind("a:2147483648"), Some(ErrorKind::UnsupportedValue));
        assert_eq!(kind(":0"), Some(ErrorKind::MalformedDirective));
    }

    #[test]
    fn test_index_is_trimmed() {
        let selection = parse_out_nodes("a: 2 ;b :1", Framework::Generic).unwrap();
        assert_eq!(pairs(&selection), vec![("a", 2), ("b", 1)]);
    }

    #[test]
    fn test_max_index() {
        let selection = parse_out_nodes("a:2147483647", Framework::Generic).unwrap();
        assert_eq!(pairs(&selection), vec![("a", 2_147_483_647)]);
    }
}
