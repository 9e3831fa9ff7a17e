//! Error adapter for converting ModelpinError to miette diagnostics.
//!
//! This module provides the bridge between the library's error types and
//! miette's rich diagnostic formatting used in the CLI.
//!
//! Directive diagnostics carry the raw directive text, so their labels are
//! rendered as snippets. Graph diagnostics have no source text and name
//! their parameter in the message instead.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceSpan};

use modelpin::ModelpinError;
use modelpin_parser::{Diagnostic, Span};

/// Adapter for a single modelpin diagnostic.
pub struct DiagnosticAdapter<'a> {
    diag: &'a Diagnostic,
    /// Raw directive text, if the diagnostic came from a directive.
    src: Option<&'a str>,
}

impl<'a> DiagnosticAdapter<'a> {
    /// Create a new diagnostic adapter.
    pub fn new(diag: &'a Diagnostic, src: Option<&'a str>) -> Self {
        Self { diag, src }
    }
}

impl fmt::Debug for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticAdapter")
            .field("diag", &self.diag)
            .finish()
    }
}

impl fmt::Display for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.src, self.diag.parameter()) {
            (None, Some(parameter)) => write!(f, "{} ({parameter})", self.diag.message()),
            _ => write!(f, "{}", self.diag.message()),
        }
    }
}

impl std::error::Error for DiagnosticAdapter<'_> {}

impl MietteDiagnostic for DiagnosticAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .code()
            .map(|c| Box::new(c) as Box<dyn fmt::Display>)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .help()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.src
            .as_ref()
            .map(|src| src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let labels = self.diag.labels();
        if self.src.is_none() || labels.is_empty() {
            return None;
        }

        Some(Box::new(labels.iter().map(|label| {
            let span = span_to_miette(label.span());
            let message = Some(label.message().to_string());
            if label.is_primary() {
                LabeledSpan::new_primary_with_span(message, span)
            } else {
                LabeledSpan::new_with_span(message, span)
            }
        })))
    }
}

/// Adapter for non-diagnostic [`ModelpinError`] variants.
pub struct ErrorAdapter<'a>(pub &'a ModelpinError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            ModelpinError::Io(_) => "modelpin::io",
            ModelpinError::Config(_) => "modelpin::config",
            ModelpinError::GraphBuild(_) => "modelpin::graph",
            ModelpinError::Directive { .. } | ModelpinError::Graph(_) => return None,
        };
        Some(Box::new(code))
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A diagnostic, with source text when it came from a directive.
    Diagnostic(DiagnosticAdapter<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Diagnostic(d) => fmt::Display::fmt(d, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Diagnostic(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Diagnostic(d) => d.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Diagnostic(d) => d.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Convert a modelpin [`Span`] to a miette [`SourceSpan`].
fn span_to_miette(span: Span) -> SourceSpan {
    SourceSpan::new(span.start().into(), span.len())
}

/// Convert a [`ModelpinError`] into a reportable error.
pub fn to_reportable(err: &ModelpinError) -> Reportable<'_> {
    match err {
        ModelpinError::Directive { diag, src } => {
            Reportable::Diagnostic(DiagnosticAdapter::new(diag, Some(src.as_str())))
        }
        ModelpinError::Graph(diag) => Reportable::Diagnostic(DiagnosticAdapter::new(diag, None)),
        _ => Reportable::Error(ErrorAdapter(err)),
    }
}

#[cfg(test)]
mod tests {
    use modelpin_parser::error::ErrorCode;

    use super::*;

    #[test]
    fn test_directive_diagnostic_has_source() {
        let diag = Diagnostic::error("dimension `1.5` of `a` is not an integer")
            .with_code(ErrorCode::E004)
            .with_label(Span::new(2..5), "here")
            .with_help("use integers");
        let err = ModelpinError::new_directive_error(diag, "a:1.5,2");

        let reportable = to_reportable(&err);
        match &reportable {
            Reportable::Diagnostic(d) => {
                assert_eq!(d.to_string(), "dimension `1.5` of `a` is not an integer");
                assert!(d.source_code().is_some());
                assert_eq!(d.labels().unwrap().count(), 1);
            }
            Reportable::Error(_) => panic!("Expected Diagnostic"),
        }
        assert_eq!(reportable.code().unwrap().to_string(), "E004");
    }

    #[test]
    fn test_graph_diagnostic_names_parameter() {
        let diag = Diagnostic::error("output node `x` is not in the graph")
            .with_code(ErrorCode::E300)
            .with_parameter("out_nodes");
        let err = ModelpinError::Graph(diag);

        let reportable = to_reportable(&err);
        assert_eq!(
            reportable.to_string(),
            "output node `x` is not in the graph (out_nodes)"
        );
        assert!(reportable.source_code().is_none());
        assert!(reportable.labels().is_none());
    }

    #[test]
    fn test_non_diagnostic_error() {
        let err = ModelpinError::Config("bad framework".to_string());

        let reportable = to_reportable(&err);
        match &reportable {
            Reportable::Error(e) => {
                assert_eq!(e.to_string(), "Configuration error: bad framework");
            }
            Reportable::Diagnostic(_) => panic!("Expected Error"),
        }
        assert_eq!(reportable.code().unwrap().to_string(), "modelpin::config");
    }

    #[test]
    fn test_primary_flag_on_labels() {
        let diag = Diagnostic::error("mixed")
            .with_label(Span::new(0..4), "primary")
            .with_secondary_label(Span::new(5..7), "secondary");

        let adapter = DiagnosticAdapter::new(&diag, Some("n1:0;n2"));

        let labels: Vec<_> = adapter.labels().unwrap().collect();
        assert_eq!(labels.len(), 2);
        assert!(labels[0].primary());
        assert!(!labels[1].primary());
    }
}
