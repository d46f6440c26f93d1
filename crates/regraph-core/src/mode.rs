//! Graph output mode.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RegraphError;

/// Unit of conversion, fixed for the whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConversionMode {
    /// One graph per extrude step. Unsupported designs are still attempted.
    #[serde(alias = "per-extrude", alias = "per_extrude")]
    PerExtrude,

    /// One graph per face-level decomposition, plus an annotated sequence file.
    /// Unsupported designs are skipped before import.
    #[default]
    #[serde(alias = "per-face", alias = "per_face")]
    PerFace,
}

impl ConversionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionMode::PerExtrude => "PerExtrude",
            ConversionMode::PerFace => "PerFace",
        }
    }

    /// Whether an unsupported design is skipped without importing it.
    pub fn skips_unsupported(&self) -> bool {
        matches!(self, ConversionMode::PerFace)
    }

    /// Whether graphs are annotated into a sequence, round-tripped and
    /// exported alongside a sequence file.
    pub fn uses_sequence(&self) -> bool {
        matches!(self, ConversionMode::PerFace)
    }
}

impl std::fmt::Display for ConversionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversionMode {
    type Err = RegraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PerExtrude" | "per-extrude" | "per_extrude" => Ok(ConversionMode::PerExtrude),
            "PerFace" | "per-face" | "per_face" => Ok(ConversionMode::PerFace),
            other => Err(RegraphError::Config(format!(
                "unknown conversion mode '{}', expected PerExtrude or PerFace",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_modes() {
        assert_eq!("PerFace".parse::<ConversionMode>().unwrap(), ConversionMode::PerFace);
        assert_eq!(
            "per-extrude".parse::<ConversionMode>().unwrap(),
            ConversionMode::PerExtrude
        );
        assert!("PerBody".parse::<ConversionMode>().is_err());
    }

    #[test]
    fn test_mode_policy() {
        assert!(ConversionMode::PerFace.skips_unsupported());
        assert!(ConversionMode::PerFace.uses_sequence());
        assert!(!ConversionMode::PerExtrude.skips_unsupported());
        assert!(!ConversionMode::PerExtrude.uses_sequence());
    }

    #[test]
    fn test_serde_name() {
        let json = serde_json::to_string(&ConversionMode::PerExtrude).unwrap();
        assert_eq!(json, "\"PerExtrude\"");
    }
}
