//! Run configuration loaded from `regraph.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::discover_documents;
use crate::error::{RegraphError, Result};
use crate::mode::ConversionMode;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "regraph.toml";

/// Batch settings. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegraphConfig {
    pub mode: ConversionMode,

    /// Directory holding the reconstruction-history documents.
    pub input_dir: PathBuf,

    /// Where graph files, sequence files and the ledger are written.
    pub output_dir: PathBuf,

    /// Ledger file name, relative to `output_dir`.
    pub results_file: String,

    /// Explicit document selection, relative to `input_dir`. Empty means discover.
    pub files: Vec<String>,

    /// Regex matched against file names during discovery.
    pub pattern: String,

    pub recursive: bool,

    pub toolchain: ToolchainConfig,
}

impl Default for RegraphConfig {
    fn default() -> Self {
        Self {
            mode: ConversionMode::PerFace,
            input_dir: PathBuf::from("testdata"),
            output_dir: PathBuf::from("output"),
            results_file: "regraph_results.json".to_string(),
            files: Vec::new(),
            pattern: r"\.json$".to_string(),
            recursive: true,
            toolchain: ToolchainConfig::default(),
        }
    }
}

/// External program backing the collaborators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToolchainConfig {
    pub program: String,

    /// Arguments placed before every subcommand.
    pub args: Vec<String>,

    /// Per-invocation limit in seconds. 0 disables the limit.
    pub timeout_secs: u64,

    /// Command polled until it exits 0 before the batch starts.
    pub ready_probe: Option<Vec<String>>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            program: "regraph-tool".to_string(),
            args: Vec::new(),
            timeout_secs: 0,
            ready_probe: None,
        }
    }
}

impl RegraphConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| RegraphError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            RegraphError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Load `path` if given, else `regraph.toml` if it exists, else defaults.
    ///
    /// An explicitly named file that does not exist is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn results_path(&self) -> PathBuf {
        self.output_dir.join(&self.results_file)
    }

    /// Documents to process, in run order.
    ///
    /// The explicit `files` list keeps its order; discovery is sorted.
    pub fn documents(&self) -> Result<Vec<PathBuf>> {
        if self.files.is_empty() {
            discover_documents(&self.input_dir, &self.pattern, self.recursive)
        } else {
            Ok(self.files.iter().map(|f| self.input_dir.join(f)).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RegraphConfig::default();
        assert_eq!(config.mode, ConversionMode::PerFace);
        assert_eq!(config.results_path(), PathBuf::from("output/regraph_results.json"));
        assert!(config.recursive);
        assert_eq!(config.toolchain.timeout_secs, 0);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(RegraphConfig::from_toml_str("").unwrap(), RegraphConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = RegraphConfig::from_toml_str(
            r#"
mode = "PerExtrude"
output_dir = "/tmp/graphs"
files = ["Couch.json", "Bed.json"]

[toolchain]
program = "python3"
args = ["-m", "regraph_tool"]
timeout_secs = 600
"#,
        )
        .unwrap();

        assert_eq!(config.mode, ConversionMode::PerExtrude);
        assert_eq!(config.input_dir, PathBuf::from("testdata"));
        assert_eq!(config.toolchain.args, vec!["-m", "regraph_tool"]);
        assert_eq!(config.toolchain.timeout_secs, 600);
        assert!(config.toolchain.ready_probe.is_none());
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let err = RegraphConfig::from_toml_str(r#"mode = "PerVertex""#).unwrap_err();
        assert_eq!(err.kind(), "Config");
    }

    #[test]
    fn test_mode_accepts_cli_spellings() {
        let face = RegraphConfig::from_toml_str(r#"mode = "per-face""#).unwrap();
        assert_eq!(face.mode, ConversionMode::PerFace);
        let extrude = RegraphConfig::from_toml_str(r#"mode = "per_extrude""#).unwrap();
        assert_eq!(extrude.mode, ConversionMode::PerExtrude);
    }

    #[test]
    fn test_explicit_files_keep_order() {
        let config = RegraphConfig {
            input_dir: PathBuf::from("data"),
            files: vec!["Zeta.json".into(), "Alpha.json".into()],
            ..Default::default()
        };
        assert_eq!(
            config.documents().unwrap(),
            vec![PathBuf::from("data/Zeta.json"), PathBuf::from("data/Alpha.json")]
        );
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = RegraphConfig::load_or_default(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert_eq!(err.kind(), "Config");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regraph.toml");
        std::fs::write(&path, "pattern = '_\\d{4}\\.json$'\nrecursive = false\n").unwrap();

        let config = RegraphConfig::load(&path).unwrap();
        assert_eq!(config.pattern, r"_\d{4}\.json$");
        assert!(!config.recursive);
    }
}
