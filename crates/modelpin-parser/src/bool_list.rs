//! Boolean directives.
//!
//! `is_output_adjust_hw_layout` and `is_input_adjust_hw_layout` are
//! comma-separated lists positionally aligned with a companion name list;
//! `is_dynamic_input` is a single flag.

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    key::DirectiveKey,
    token::{self, Piece},
};

/// Parses a comma-separated list of `true`/`false` tokens.
///
/// Tokens are trimmed. An empty spec yields an empty list.
///
/// # Errors
///
/// Fails with `UnsupportedValue` on the first token that is neither `true`
/// nor `false`.
pub fn parse_bool_list(spec: &str, key: DirectiveKey) -> Result<Vec<bool>> {
    if spec.is_empty() {
        return Ok(Vec::new());
    }

    token::split(token::whole(spec), ',')
        .into_iter()
        .map(|item| parse_bool_token(spec, key, token::trim(item)))
        .collect()
}

/// Parses a single `true`/`false` flag.
///
/// # Errors
///
/// Fails with `UnsupportedValue` for anything else, including an empty spec.
pub fn parse_bool_flag(spec: &str, key: DirectiveKey) -> Result<bool> {
    parse_bool_token(spec, key, token::trim(token::whole(spec)))
}

fn parse_bool_token(spec: &str, key: DirectiveKey, item: Piece<'_>) -> Result<bool> {
    token::parse_boolean(item.inner()).ok_or_else(|| {
        Diagnostic::error(format!("{key} only supports true/false, got `{}`", item.inner()))
            .with_code(ErrorCode::E011)
            .with_parameter(key.as_str())
            .with_value(spec)
            .with_label(item.span(), "expected `true` or `false`")
    })
}
