//! Tensor datatypes and layouts named by conversion directives.
//!
//! Directives spell datatypes with short tokens (`FP16`), while attributes
//! written onto graph nodes use the serialized graph names (`DT_FLOAT16`).
//! [`DataType`] maps between the two. [`TensorFormat`] lists every layout a
//! directive may name.

use std::{fmt, str::FromStr};

/// Output datatype accepted by the `output_type` directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 32-bit float (`FP32`).
    Float,
    /// 16-bit float (`FP16`).
    Float16,
    /// Unsigned 8-bit integer (`UINT8`).
    Uint8,
}

impl DataType {
    /// All datatypes a directive may name, in the order they are listed in messages.
    pub const SUPPORTED: [DataType; 3] = [DataType::Float, DataType::Float16, DataType::Uint8];

    /// Looks up a datatype by its directive token (`FP32`, `FP16`, `UINT8`).
    ///
    /// Matching is exact and case-sensitive.
    pub fn from_directive(token: &str) -> Option<Self> {
        Self::SUPPORTED
            .into_iter()
            .find(|dtype| dtype.directive_name() == token)
    }

    /// Returns the token used for this datatype in directives.
    pub fn directive_name(self) -> &'static str {
        match self {
            DataType::Float => "FP32",
            DataType::Float16 => "FP16",
            DataType::Uint8 => "UINT8",
        }
    }

    /// Returns the serialized graph name written into node attributes.
    pub fn serial_name(self) -> &'static str {
        match self {
            DataType::Float => "DT_FLOAT",
            DataType::Float16 => "DT_FLOAT16",
            DataType::Uint8 => "DT_UINT8",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.directive_name())
    }
}

/// Tensor memory layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TensorFormat {
    Nd,
    Nchw,
    Nhwc,
    Chwn,
    /// 5-D half-precision hardware layout.
    Nc1hwc0,
    Nhwc1c0,
    Ncdhw,
    Ndhwc,
}

impl TensorFormat {
    /// Every layout a directive may name.
    pub const ALL: [TensorFormat; 8] = [
        TensorFormat::Nd,
        TensorFormat::Nchw,
        TensorFormat::Nhwc,
        TensorFormat::Chwn,
        TensorFormat::Nc1hwc0,
        TensorFormat::Nhwc1c0,
        TensorFormat::Ncdhw,
        TensorFormat::Ndhwc,
    ];

    /// Returns the canonical upper-case name of the layout.
    pub fn as_str(self) -> &'static str {
        match self {
            TensorFormat::Nd => "ND",
            TensorFormat::Nchw => "NCHW",
            TensorFormat::Nhwc => "NHWC",
            TensorFormat::Chwn => "CHWN",
            TensorFormat::Nc1hwc0 => "NC1HWC0",
            TensorFormat::Nhwc1c0 => "NHWC1C0",
            TensorFormat::Ncdhw => "NCDHW",
            TensorFormat::Ndhwc => "NDHWC",
        }
    }
}

impl fmt::Display for TensorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TensorFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| format!("unknown tensor format `{s}`"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datatype_from_directive() {
        assert_eq!(DataType::from_directive("FP32"), Some(DataType::Float));
        assert_eq!(DataType::from_directive("FP16"), Some(DataType::Float16));
        assert_eq!(DataType::from_directive("UINT8"), Some(DataType::Uint8));
        assert_eq!(DataType::from_directive("fp16"), None);
        assert_eq!(DataType::from_directive("INT8"), None);
    }

    #[test]
    fn test_datatype_serial_name() {
        assert_eq!(DataType::Float.serial_name(), "DT_FLOAT");
        assert_eq!(DataType::Float16.serial_name(), "DT_FLOAT16");
        assert_eq!(DataType::Uint8.serial_name(), "DT_UINT8");
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("NCHW".parse::<TensorFormat>(), Ok(TensorFormat::Nchw));
        assert_eq!("NC1HWC0".parse::<TensorFormat>(), Ok(TensorFormat::Nc1hwc0));
        assert!("nchw".parse::<TensorFormat>().is_err());
        assert!("NCHWC".parse::<TensorFormat>().is_err());
    }

    #[test]
    fn test_format_names_are_unique() {
        for (i, a) in TensorFormat::ALL.iter().enumerate() {
            for b in &TensorFormat::ALL[i + 1..] {
                assert_ne!(a.as_str(), b.as_str());
            }
        }
    }
}
