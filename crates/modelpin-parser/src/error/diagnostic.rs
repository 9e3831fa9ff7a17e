//! The core diagnostic type for the modelpin error system.
//!
//! A [`Diagnostic`] is a single failure with an error code, the directive
//! parameter and value it concerns, labeled spans into the raw directive
//! text, and help text. Recoverable situations are logged, not diagnosed.

use std::fmt;

use crate::{
    error::{ErrorKind, error_code::ErrorCode},
    span::Span,
};

/// Where a [`Label`] points: at the failing token, or at an earlier token
/// the failure conflicts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LabelRole {
    Failing,
    Conflicting,
}

/// A message attached to a span of the raw directive text.
#[derive(Debug, Clone)]
pub struct Label {
    span: Span,
    message: String,
    role: LabelRole,
}

impl Label {
    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// `true` for the label on the failing token.
    pub fn is_primary(&self) -> bool {
        self.role == LabelRole::Failing
    }
}

/// A rich diagnostic message with source location information.
///
/// # Example
///
/// ```text
/// error[E004]: dimension `1.5` of `a` is not an integer
///   input_shape
///    |
///  1 | a:1.5,2
///    |   ^^^ floating-point dimensions are not supported
///    |
///    = help: use a comma-separated list of integers, e.g. `input:1,3,224,224`
/// ```
#[derive(Debug, Clone)]
pub struct Diagnostic {
    code: Option<ErrorCode>,
    parameter: Option<String>,
    value: Option<String>,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use modelpin_parser::error::{Diagnostic, ErrorCode, ErrorKind};
    /// # use modelpin_parser::Span;
    ///
    /// let diag = Diagnostic::error("dimension `x` of `a` is not an integer")
    ///     .with_code(ErrorCode::E004)
    ///     .with_parameter("input_shape")
    ///     .with_value("a:x")
    ///     .with_label(Span::new(2..3), "expected digits");
    ///
    /// assert_eq!(diag.kind(), Some(ErrorKind::MalformedDirective));
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            code: None,
            parameter: None,
            value: None,
            message: message.into(),
            labels: Vec::new(),
            help: None,
        }
    }

    /// Get the error code, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    /// Get the failure category of the error code, if any.
    pub fn kind(&self) -> Option<ErrorKind> {
        self.code.map(|code| code.kind())
    }

    /// Get the directive key or node name this diagnostic concerns.
    pub fn parameter(&self) -> Option<&str> {
        self.parameter.as_deref()
    }

    /// Get the offending raw value.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Get the primary message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get all labels attached to this diagnostic.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Get the help text, if any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Set the error code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Set the directive key or node name.
    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameter = Some(parameter.into());
        self
    }

    /// Set the offending raw value.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Label the failing token.
    pub fn with_label(self, span: Span, message: impl Into<String>) -> Self {
        self.push_label(span, message, LabelRole::Failing)
    }

    /// Label an earlier token the failure conflicts with.
    pub fn with_secondary_label(self, span: Span, message: impl Into<String>) -> Self {
        self.push_label(span, message, LabelRole::Conflicting)
    }

    /// Set the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    fn push_label(mut self, span: Span, message: impl Into<String>, role: LabelRole) -> Self {
        self.labels.push(Label {
            span,
            message: message.into(),
            role,
        });
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: "error[E001]: message" or "error: message"
        write!(f, "error")?;
        if let Some(code) = self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for Diagnostic {}
