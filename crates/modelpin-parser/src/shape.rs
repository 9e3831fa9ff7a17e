//! `input_shape` directive.
//!
//! Grammar: `name:d0,d1,...;name2:d0,...`. The name is separated from its
//! dimensions by the *last* `:`, so scoped names such as `scope:input` are
//! accepted.

use log::{debug, trace};

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    key::DirectiveKey,
    token::{self, Piece},
};

const SAMPLE: &str = "input_name:1,3,224,224;input_name2:1,10";

/// One `name:dims` entry of `input_shape`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeEntry {
    pub name: String,
    pub dims: Vec<i64>,
}

/// Parses the `input_shape` directive.
///
/// Negative and zero dimensions are accepted only when `dynamic` is set. An
/// empty spec yields no entries.
///
/// # Errors
///
/// Fails with a `MalformedDirective` diagnostic for entries without `:`,
/// empty dimension lists or tokens, and non-integer tokens (including
/// floating-point values). Fails with `UnsupportedValue` when a dimension
/// overflows 64 bits or is non-positive outside dynamic mode.
pub fn parse_input_shape(spec: &str, dynamic: bool) -> Result<Vec<ShapeEntry>> {
    if spec.is_empty() {
        return Ok(Vec::new());
    }

    let entries = token::split(token::whole(spec), ';')
        .into_iter()
        .map(|entry| parse_entry(spec, entry, dynamic))
        .collect::<Result<Vec<_>>>()?;

    debug!(entries = entries.len(), dynamic; "Parsed input_shape");
    Ok(entries)
}

fn parse_entry(spec: &str, entry: Piece<'_>, dynamic: bool) -> Result<ShapeEntry> {
    let Some((name, dims)) = token::rsplit_once(entry, ':') else {
        return Err(shape_error(spec, "entry is missing the `:` separator", ErrorCode::E002)
            .with_value(*entry.inner())
            .with_label(entry.span(), "expected `name:dims`"));
    };

    let name = token::trim(name);
    if name.is_empty() {
        return Err(shape_error(spec, "entry has an empty input name", ErrorCode::E003)
            .with_value(*entry.inner())
            .with_label(name.span(), "input name expected here"));
    }
    if dims.trim().is_empty() {
        return Err(
            shape_error(spec, format!("shape of `{}` is empty", name), ErrorCode::E003)
                .with_value(*entry.inner())
                .with_label(dims.span(), "dimensions expected here"),
        );
    }

    let dims = token::split(dims, ',')
        .into_iter()
        .map(|dim| parse_dim(spec, *name.inner(), token::trim(dim), dynamic))
        .collect::<Result<Vec<_>>>()?;

    trace!(name = *name.inner(), dims:?; "Parsed shape entry");
    Ok(ShapeEntry {
        name: name.inner().to_string(),
        dims,
    })
}

fn parse_dim(spec: &str, name: &str, dim: Piece<'_>, dynamic: bool) -> Result<i64> {
    let text = *dim.inner();

    if text.contains('.') {
        return Err(shape_error(
            spec,
            format!("dimension `{text}` of `{name}` is not an integer"),
            ErrorCode::E004,
        )
        .with_value(text)
        .with_label(dim.span(), "floating-point dimensions are not supported"));
    }
    if text.is_empty() {
        return Err(
            shape_error(spec, format!("`{name}` has an empty dimension"), ErrorCode::E003)
                .with_value(spec)
                .with_label(dim.span(), "dimension expected here"),
        );
    }
    if !token::is_signed_integer(text) {
        return Err(shape_error(
            spec,
            format!("dimension `{text}` of `{name}` is not an integer"),
            ErrorCode::E004,
        )
        .with_value(text)
        .with_label(dim.span(), "expected digits, optionally preceded by `-`"));
    }

    let value: i64 = text.parse().map_err(|_| {
        shape_error(
            spec,
            format!("dimension `{text}` of `{name}` does not fit a 64-bit integer"),
            ErrorCode::E005,
        )
        .with_value(text)
        .with_label(dim.span(), "out of range")
    })?;

    if !dynamic && value <= 0 {
        return Err(shape_error(
            spec,
            format!("dimension {value} of `{name}` must be a positive integer"),
            ErrorCode::E006,
        )
        .with_value(text)
        .with_label(dim.span(), "not positive")
        .with_help("set is_dynamic_input=true to use dynamic dimensions such as -1"));
    }

    Ok(value)
}

fn shape_error(spec: &str, message: impl Into<String>, code: ErrorCode) -> Diagnostic {
    let diag = Diagnostic::error(message)
        .with_code(code)
        .with_parameter(DirectiveKey::InputShape.as_str())
        .with_value(spec);
    match code {
        ErrorCode::E002 | ErrorCode::E003 | ErrorCode::E004 => {
            diag.with_help(format!("the correct format is `{SAMPLE}`"))
        }
        _ => diag,
    }
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    /// Strategy for input names, optionally scoped with `:`.
    fn name_strategy() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,8}(:[a-z][a-z0-9_]{0,8})?"
    }

    /// Strategy for a list of shape entries with positive dimensions.
    fn entries_strategy() -> impl Strategy<Value = Vec<(String, Vec<i64>)>> {
        prop::collection::vec(
            (name_strategy(), prop::collection::vec(1i64..=i64::MAX, 1..6)),
            1..6,
        )
    }

    fn render(entries: &[(String, Vec<i64>)]) -> String {
        entries
            .iter()
            .map(|(name, dims)| {
                let dims: Vec<String> = dims.iter().map(i64::to_string).collect();
                format!("{name}:{}", dims.join(","))
            })
            .collect::<Vec<_>>()
            .join(";")
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Rendered shapes parse back to the same entries in both modes.
    fn check_rendered_shapes_parse(
        entries: &[(String, Vec<i64>)],
    ) -> std::result::Result<(), TestCaseError> {
        let spec = render(entries);
        for dynamic in [false, true] {
            let parsed = parse_input_shape(&spec, dynamic);
            prop_assert!(parsed.is_ok(), "Failed to parse `{spec}`: {parsed:?}");

            let parsed: Vec<(String, Vec<i64>)> = parsed
                .unwrap_or_default()
                .into_iter()
                .map(|entry| (entry.name, entry.dims))
                .collect();
            prop_assert_eq!(&parsed, entries);
        }
        Ok(())
    }

    /// A negative dimension is accepted exactly when dynamic mode is on.
    fn check_negative_dims_need_dynamic(dim: i64) -> std::result::Result<(), TestCaseError> {
        let spec = format!("x:1,{dim}");
        prop_assert!(parse_input_shape(&spec, true).is_ok());
        prop_assert!(parse_input_shape(&spec, false).is_err());
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn rendered_shapes_parse(entries in entries_strategy()) {
            check_rendered_shapes_parse(&entries)?;
        }

        #[test]
        fn negative_dims_need_dynamic(dim in i64::MIN..0) {
            check_negative_dims_need_dynamic(dim)?;
        }
    }
}
