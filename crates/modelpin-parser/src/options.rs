//! Single-token directives: `input_format` and `log`.

use log::LevelFilter;

use modelpin_core::{framework::Framework, tensor::TensorFormat};

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    key::DirectiveKey,
    span::Span,
};

/// Parses `input_format` for the given framework.
///
/// An empty spec selects the framework's default layout.
///
/// # Errors
///
/// Fails with `UnsupportedValue` when the layout is unknown or not accepted
/// by the framework.
pub fn parse_input_format(spec: &str, framework: Framework) -> Result<TensorFormat> {
    let caps = framework.capabilities();
    if spec.is_empty() {
        return Ok(caps.default_input_format());
    }

    spec.parse::<TensorFormat>()
        .ok()
        .filter(|format| caps.supports_input_format(*format))
        .ok_or_else(|| {
            let supported: Vec<&str> = caps
                .supported_input_formats()
                .iter()
                .map(|format| format.as_str())
                .collect();
            Diagnostic::error(format!(
                "`{spec}` is not a supported input format for {framework}"
            ))
            .with_code(ErrorCode::E010)
            .with_parameter(DirectiveKey::InputFormat.as_str())
            .with_value(spec)
            .with_label(Span::new(0..spec.len()), "unsupported format")
            .with_help(format!("{framework} only supports {}", supported.join(", ")))
        })
}

/// Parses the `log` directive.
///
/// `default` keeps the current level and yields `None`; `null` turns logging
/// off.
///
/// # Errors
///
/// Fails with `UnsupportedValue` for any other token.
pub fn parse_log_level(spec: &str) -> Result<Option<LevelFilter>> {
    match spec {
        "default" => Ok(None),
        "null" => Ok(Some(LevelFilter::Off)),
        "debug" => Ok(Some(LevelFilter::Debug)),
        "info" => Ok(Some(LevelFilter::Info)),
        "warning" => Ok(Some(LevelFilter::Warn)),
        "error" => Ok(Some(LevelFilter::Error)),
        _ => Err(Diagnostic::error(format!("`{spec}` is not a supported log level"))
            .with_code(ErrorCode::E012)
            .with_parameter(DirectiveKey::Log.as_str())
            .with_value(spec)
            .with_label(Span::new(0..spec.len()), "unsupported level")
            .with_help("use one of default, null, debug, info, warning, error")),
    }
}
