//! Op-name-map file.
//!
//! Each non-comment line maps a framework operator name to a target operator
//! type as `key:value`. Lines are split on the first `:`.

use std::{collections::BTreeMap, fs, path::Path};

use log::{debug, info};

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    key::DirectiveKey,
    span::Span,
    token,
};

/// Parses op-name-map text.
///
/// Blank lines and lines starting with `#` (after trimming) are ignored.
/// A later line overwrites an earlier one with the same key.
///
/// # Errors
///
/// Fails with `MalformedDirective` on a line without `:` or with an empty
/// key or value. The offending line is the diagnostic's value and the labels
/// point into it.
pub fn parse_op_name_map(text: &str) -> Result<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();

    for (line_no, raw_line) in text.split_inclusive('\n').enumerate() {
        let line = raw_line.trim_end_matches(['\n', '\r']);
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let piece = token::whole(line);
        let malformed = |reason: &str, span: Span| {
            Diagnostic::error(format!("op_name_map line {} `{trimmed}` {reason}", line_no + 1))
                .with_code(ErrorCode::E015)
                .with_parameter(DirectiveKey::OpNameMap.as_str())
                .with_value(line)
                .with_label(span, "expected `key:value`")
                .with_help("each line must map an operator name to a type, e.g. `MyConv:Conv2D`")
        };

        let Some((key, value)) = token::split_once(piece, ':') else {
            return Err(malformed("is missing the `:` separator", piece.span()));
        };
        let (key, value) = (token::trim(key), token::trim(value));
        if key.is_empty() {
            return Err(malformed("has an empty key", key.span()));
        }
        if value.is_empty() {
            return Err(malformed("has an empty value", value.span()));
        }

        map.insert(key.inner().to_string(), value.inner().to_string());
    }

    debug!(entries = map.len(); "Parsed op_name_map");
    Ok(map)
}

/// Reads and parses an op-name-map file.
///
/// # Errors
///
/// Fails with `IoFailure` carrying the path when the file cannot be read,
/// otherwise as [`parse_op_name_map`].
pub fn load_op_name_map(path: impl AsRef<Path>) -> Result<BTreeMap<String, String>> {
    let path = path.as_ref();
    info!(path = path.display().to_string(); "Loading op_name_map");
    let text = read_directive_file(DirectiveKey::OpNameMap, path)?;
    parse_op_name_map(&text)
}

/// Reads a file referenced by a directive.
pub(crate) fn read_directive_file(key: DirectiveKey, path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| {
        Diagnostic::error(format!("failed to read `{}`: {err}", path.display()))
            .with_code(ErrorCode::E100)
            .with_parameter(key.as_str())
            .with_value(path.display().to_string())
            .with_help("make sure the file path is correct")
    })
}
