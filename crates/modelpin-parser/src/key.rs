//! Directive key vocabulary.

use std::{fmt, str::FromStr};

use log::debug;

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    span::Span,
};

/// Every option key the converter understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DirectiveKey {
    InputFormat,
    InputShape,
    IsDynamicInput,
    OutNodes,
    IsOutputAdjustHwLayout,
    OutputType,
    OpNameMap,
    Output,
    EnableScopeFusionPasses,
    Log,
    InputFp16Nodes,
    IsInputAdjustHwLayout,
    CompressWeightConf,
}

impl DirectiveKey {
    pub const ALL: [DirectiveKey; 13] = [
        DirectiveKey::InputFormat,
        DirectiveKey::InputShape,
        DirectiveKey::IsDynamicInput,
        DirectiveKey::OutNodes,
        DirectiveKey::IsOutputAdjustHwLayout,
        DirectiveKey::OutputType,
        DirectiveKey::OpNameMap,
        DirectiveKey::Output,
        DirectiveKey::EnableScopeFusionPasses,
        DirectiveKey::Log,
        DirectiveKey::InputFp16Nodes,
        DirectiveKey::IsInputAdjustHwLayout,
        DirectiveKey::CompressWeightConf,
    ];

    /// Returns the option name as written by users.
    pub fn as_str(self) -> &'static str {
        match self {
            DirectiveKey::InputFormat => "input_format",
            DirectiveKey::InputShape => "input_shape",
            DirectiveKey::IsDynamicInput => "is_dynamic_input",
            DirectiveKey::OutNodes => "out_nodes",
            DirectiveKey::IsOutputAdjustHwLayout => "is_output_adjust_hw_layout",
            DirectiveKey::OutputType => "output_type",
            DirectiveKey::OpNameMap => "op_name_map",
            DirectiveKey::Output => "output",
            DirectiveKey::EnableScopeFusionPasses => "enable_scope_fusion_passes",
            DirectiveKey::Log => "log",
            DirectiveKey::InputFp16Nodes => "input_fp16_nodes",
            DirectiveKey::IsInputAdjustHwLayout => "is_input_adjust_hw_layout",
            DirectiveKey::CompressWeightConf => "compress_weight_conf",
        }
    }
}

impl fmt::Display for DirectiveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DirectiveKey {
    type Err = Diagnostic;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| {
                Diagnostic::error(format!("`{s}` is not a supported directive"))
                    .with_code(ErrorCode::E001)
                    .with_parameter(s)
                    .with_value(s)
                    .with_label(Span::new(0..s.len()), "unknown directive")
                    .with_help(format!(
                        "supported directives: {}",
                        Self::ALL.map(DirectiveKey::as_str).join(", ")
                    ))
            })
    }
}

/// Checks that every option key is a known directive.
///
/// # Errors
///
/// Returns an `E001` diagnostic naming the first unknown key.
pub fn check_option_keys<'a>(keys: impl IntoIterator<Item = &'a str>) -> Result<()> {
    for key in keys {
        let parsed: DirectiveKey = key.parse()?;
        debug!(key = parsed.as_str(); "Accepted directive");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_round_trip_every_key() {
        for key in DirectiveKey::ALL {
            assert_eq!(key.as_str().parse::<DirectiveKey>().unwrap(), key);
        }
    }

    #[test]
    fn test_unknown_key() {
        let err = "input_shapes".parse::<DirectiveKey>().unwrap_err();

        assert_eq!(err.code(), Some(ErrorCode::E001));
        assert_eq!(err.kind(), Some(ErrorKind::UnsupportedValue));
        assert_eq!(err.parameter(), Some("input_shapes"));
        assert!(
            err.help().is_some_and(|help| help.contains("input_shape")),
            "help should list the supported keys"
        );
    }

    #[test]
    fn test_check_option_keys() {
        assert!(check_option_keys(["input_shape", "out_nodes", "log"]).is_ok());
        assert!(check_option_keys(std::iter::empty()).is_ok());

        let err = check_option_keys(["out_nodes", "precision_mode"]).unwrap_err();
        assert_eq!(err.parameter(), Some("precision_mode"));
    }
}
