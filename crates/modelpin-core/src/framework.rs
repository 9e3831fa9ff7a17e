//! Source-framework strategy.
//!
//! The behaviour of several directives depends on which framework the model
//! came from: Caffe accepts bare top names in `out_nodes` and records static
//! default outputs, TensorFlow defaults to NHWC, and so on. Instead of
//! branching on the framework at every call site, the framework is selected
//! once per session and consulted through [`Framework::capabilities`].

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::tensor::TensorFormat;

const CAFFE_INPUT_FORMATS: &[TensorFormat] = &[TensorFormat::Nchw, TensorFormat::Nd];

const TENSORFLOW_INPUT_FORMATS: &[TensorFormat] = &[
    TensorFormat::Nchw,
    TensorFormat::Nhwc,
    TensorFormat::Nd,
    TensorFormat::Ncdhw,
    TensorFormat::Ndhwc,
];

/// Framework the model being converted was exported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    #[default]
    Tensorflow,
    Caffe,
    Onnx,
    Generic,
}

impl Framework {
    /// Returns the lower-case name used in configuration files.
    pub fn as_str(self) -> &'static str {
        match self {
            Framework::Tensorflow => "tensorflow",
            Framework::Caffe => "caffe",
            Framework::Onnx => "onnx",
            Framework::Generic => "generic",
        }
    }

    /// Returns the capability set for this framework.
    pub fn capabilities(self) -> Capabilities {
        match self {
            Framework::Tensorflow => Capabilities {
                supported_input_formats: TENSORFLOW_INPUT_FORMATS,
                default_input_format: TensorFormat::Nhwc,
                uses_top_names: false,
                has_static_default_outputs: false,
            },
            Framework::Caffe => Capabilities {
                supported_input_formats: CAFFE_INPUT_FORMATS,
                default_input_format: TensorFormat::Nchw,
                uses_top_names: true,
                has_static_default_outputs: true,
            },
            Framework::Onnx | Framework::Generic => Capabilities {
                supported_input_formats: &TensorFormat::ALL,
                default_input_format: TensorFormat::Nchw,
                uses_top_names: false,
                has_static_default_outputs: false,
            },
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Framework {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tensorflow" | "tf" => Ok(Framework::Tensorflow),
            "caffe" => Ok(Framework::Caffe),
            "onnx" => Ok(Framework::Onnx),
            "generic" => Ok(Framework::Generic),
            _ => Err(format!(
                "unknown framework `{s}`, expected one of: tensorflow, caffe, onnx, generic"
            )),
        }
    }
}

/// Framework-specific behaviour consulted by the parser and the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    supported_input_formats: &'static [TensorFormat],
    default_input_format: TensorFormat,
    uses_top_names: bool,
    has_static_default_outputs: bool,
}

impl Capabilities {
    /// Layouts the `input_format` directive may name.
    pub fn supported_input_formats(&self) -> &'static [TensorFormat] {
        self.supported_input_formats
    }

    /// Returns `true` if `format` is accepted for `input_format`.
    pub fn supports_input_format(&self, format: TensorFormat) -> bool {
        self.supported_input_formats.contains(&format)
    }

    /// Layout used when `input_format` is not given.
    pub fn default_input_format(&self) -> TensorFormat {
        self.default_input_format
    }

    /// Whether bare top names are accepted in `out_nodes`.
    pub fn uses_top_names(&self) -> bool {
        self.uses_top_names
    }

    /// Whether the graph builder records a static default output list.
    pub fn has_static_default_outputs(&self) -> bool {
        self.has_static_default_outputs
    }
}
