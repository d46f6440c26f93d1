//! Collaborators backed by the external regraph tool.
//!
//! | operation | invocation | stdout |
//! |---|---|---|
//! | support check | `supported <doc> --mode <m>` | `{"supported": bool, "reason": str}` |
//! | import | `reconstruct <doc> <model-dir>` | ignored |
//! | generation | `generate <model-dir> --mode <m>` | `{graphs, sequences, status}` |
//! | validation | `validate <graph-data> --mode <m>` | ignored |
//! | round-trip | `reconstruct-graph <graph-data>` | ignored |
//!
//! Graph data is handed over in a temporary JSON file. A non-zero exit
//! becomes the error variant of the failing operation, with stderr as the
//! message.

use std::ffi::OsString;
use std::io::Write;

use async_trait::async_trait;
use regraph_core::{
    to_pretty_json, ConversionMode, DesignImporter, Document, GraphData, GraphGenerator,
    GraphValidator, ModelHandle, RegraphError, Result, SupportVerdict, ToolchainConfig,
};
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::runner::ToolRunner;

#[derive(Debug, Clone)]
pub struct ProcessToolchain {
    runner: ToolRunner,
}

impl ProcessToolchain {
    pub fn new(config: &ToolchainConfig) -> Self {
        Self {
            runner: ToolRunner::new(config),
        }
    }

    pub fn runner(&self) -> &ToolRunner {
        &self.runner
    }
}

fn mode_args(mode: ConversionMode) -> [OsString; 2] {
    [OsString::from("--mode"), OsString::from(mode.as_str())]
}

fn model_dir(model: &ModelHandle) -> Result<OsString> {
    model
        .workspace()
        .map(|dir| dir.as_os_str().to_os_string())
        .ok_or_else(|| {
            RegraphError::Host(format!(
                "model {} for {} has no workspace directory",
                model.id(),
                model.document()
            ))
        })
}

fn parse_stdout<T: DeserializeOwned>(
    subcommand: &str,
    stdout: &str,
    make: fn(String) -> RegraphError,
) -> Result<T> {
    serde_json::from_str(stdout.trim())
        .map_err(|e| make(format!("unreadable {} output: {}", subcommand, e)))
}

/// Write graph data to a temp file that lives as long as the returned handle.
fn graph_data_file(data: &GraphData) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("regraph-graphs-")
        .suffix(".json")
        .tempfile()
        .map_err(|e| RegraphError::Toolchain(format!("cannot create graph data file: {}", e)))?;
    let bytes = to_pretty_json(data)?;
    file.write_all(&bytes)
        .and_then(|_| file.flush())
        .map_err(|e| RegraphError::Toolchain(format!("cannot write graph data file: {}", e)))?;
    Ok(file)
}

#[async_trait]
impl DesignImporter for ProcessToolchain {
    async fn reconstruct(&self, document: &Document, model: &ModelHandle) -> Result<()> {
        let args = [
            document.source.path.as_os_str().to_os_string(),
            model_dir(model)?,
        ];
        self.runner
            .run("reconstruct", &args)
            .await?
            .check(RegraphError::Import)?;
        debug!(doc_id = %document.id(), "Design reconstructed");
        Ok(())
    }
}

#[async_trait]
impl GraphGenerator for ProcessToolchain {
    async fn is_design_supported(
        &self,
        document: &Document,
        mode: ConversionMode,
    ) -> Result<SupportVerdict> {
        let [flag, value] = mode_args(mode);
        let args = [document.source.path.as_os_str().to_os_string(), flag, value];
        let output = self
            .runner
            .run("supported", &args)
            .await?
            .check(RegraphError::Generation)?;
        parse_stdout("supported", &output.stdout, RegraphError::Generation)
    }

    async fn generate(&self, model: &ModelHandle, mode: ConversionMode) -> Result<GraphData> {
        let [flag, value] = mode_args(mode);
        let args = [model_dir(model)?, flag, value];
        let output = self
            .runner
            .run("generate", &args)
            .await?
            .check(RegraphError::Generation)?;
        parse_stdout("generate", &output.stdout, RegraphError::Generation)
    }
}

#[async_trait]
impl GraphValidator for ProcessToolchain {
    async fn validate(&self, data: &GraphData, mode: ConversionMode) -> Result<()> {
        let file = graph_data_file(data)?;
        let [flag, value] = mode_args(mode);
        let args = [file.path().as_os_str().to_os_string(), flag, value];
        self.runner
            .run("validate", &args)
            .await?
            .check(RegraphError::Validation)?;
        Ok(())
    }

    async fn reconstruct_from_graph(&self, data: &GraphData) -> Result<()> {
        let file = graph_data_file(data)?;
        let args = [file.path().as_os_str().to_os_string()];
        self.runner
            .run("reconstruct-graph", &args)
            .await?
            .check(RegraphError::Reconstruction)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regraph_core::{Graph, UnitStatus};

    #[test]
    fn test_model_without_workspace_is_host_error() {
        let err = model_dir(&ModelHandle::new("Couch.json")).unwrap_err();
        assert_eq!(err.kind(), "Host");
    }

    #[test]
    fn test_parse_verdict() {
        let verdict: SupportVerdict = parse_stdout(
            "supported",
            "{\"supported\": false, \"reason\": \"Unsupported curve type\"}\n",
            RegraphError::Generation,
        )
        .unwrap();
        assert_eq!(verdict, SupportVerdict::unsupported("Unsupported curve type"));
    }

    #[test]
    fn test_parse_garbage_is_operation_error() {
        let err = parse_stdout::<GraphData>("generate", "Traceback ...", RegraphError::Generation)
            .unwrap_err();
        assert_eq!(err.kind(), "Generation");
        assert!(err.to_string().contains("unreadable generate output"));
    }

    #[test]
    fn test_graph_data_file_contents() {
        let data = GraphData {
            graphs: vec![Graph(serde_json::json!({"nodes": []}))],
            sequences: vec![],
            status: vec![UnitStatus::success()],
        };
        let file = graph_data_file(&data).unwrap();
        let text = std::fs::read_to_string(file.path()).unwrap();
        let back: GraphData = serde_json::from_str(&text).unwrap();
        assert_eq!(back.status, vec![UnitStatus::success()]);
    }
}
