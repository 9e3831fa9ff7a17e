//! Error types for modelpin operations.
//!
//! This module provides the main error type [`ModelpinError`] which wraps
//! the failures that can occur while parsing directives and applying them to
//! a graph.

use std::io;

use thiserror::Error;

use modelpin_core::graph::GraphError;
use modelpin_parser::{Diagnostic, error::ErrorKind};

/// The main error type for modelpin operations.
///
/// # Diagnostic Variants
///
/// `Directive` carries the raw directive text alongside the diagnostic so
/// that its labels can be rendered against the source. `Graph` diagnostics
/// refer to graph nodes and carry no source text.
#[derive(Debug, Error)]
pub enum ModelpinError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{diag}")]
    Directive { diag: Diagnostic, src: String },

    #[error("{0}")]
    Graph(Diagnostic),

    #[error("Invalid graph description: {0}")]
    GraphBuild(#[from] GraphError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ModelpinError {
    /// Create a new `Directive` error with the associated directive text.
    pub fn new_directive_error(diag: Diagnostic, src: impl Into<String>) -> Self {
        Self::Directive {
            diag,
            src: src.into(),
        }
    }

    /// Returns the diagnostic, if this error carries one.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Self::Directive { diag, .. } | Self::Graph(diag) => Some(diag),
            _ => None,
        }
    }

    /// Returns the failure category of the diagnostic, if any.
    pub fn kind(&self) -> Option<ErrorKind> {
        self.diagnostic().and_then(Diagnostic::kind)
    }
}
