//! Generator output: graphs, sequences and per-unit status codes.
//!
//! Graphs are opaque to the pipeline; sequences are only touched to write
//! graph file names into their steps.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{RegraphError, Result};

/// One topology graph, exported as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Graph(pub Value);

/// Ordered construction steps for one document (`PerFace` only).
///
/// Kept as a raw JSON object so unknown fields and their order survive
/// export untouched. Steps live under the `sequence` key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sequence(pub Map<String, Value>);

impl Sequence {
    pub const STEPS_KEY: &'static str = "sequence";
    pub const GRAPH_KEY: &'static str = "graph";

    /// A sequence with `steps` under the steps key.
    pub fn with_steps(steps: Vec<Value>) -> Self {
        let mut map = Map::new();
        map.insert(Self::STEPS_KEY.to_string(), Value::Array(steps));
        Self(map)
    }

    pub fn steps(&self) -> &[Value] {
        self.0
            .get(Self::STEPS_KEY)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Graph file name recorded on step `index`, if annotated.
    pub fn step_graph(&self, index: usize) -> Option<&str> {
        self.steps()
            .get(index)
            .and_then(|step| step.get(Self::GRAPH_KEY))
            .and_then(Value::as_str)
    }

    /// Write `graph_files[i]` into the `graph` field of step `i`.
    ///
    /// Fails when the steps are missing or outnumber the graph files.
    pub fn annotate(&mut self, graph_files: &[String]) -> Result<()> {
        let steps = self
            .0
            .get_mut(Self::STEPS_KEY)
            .and_then(Value::as_array_mut)
            .ok_or_else(|| RegraphError::Annotation("sequence has no step list".to_string()))?;

        if steps.len() > graph_files.len() {
            return Err(RegraphError::Annotation(format!(
                "sequence has {} step(s) but only {} graph(s) were generated",
                steps.len(),
                graph_files.len()
            )));
        }

        for (index, step) in steps.iter_mut().enumerate() {
            let step = step.as_object_mut().ok_or_else(|| {
                RegraphError::Annotation(format!("sequence step {} is not an object", index))
            })?;
            step.insert(
                Self::GRAPH_KEY.to_string(),
                Value::String(graph_files[index].clone()),
            );
        }
        Ok(())
    }
}

/// Per-unit status code emitted by the generator. Only `"Success"` is a success.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitStatus(pub String);

impl UnitStatus {
    pub fn success() -> Self {
        UnitStatus(regraph_ledger::GENERATOR_SUCCESS.to_string())
    }

    pub fn new(status: impl Into<String>) -> Self {
        UnitStatus(status.into())
    }

    pub fn is_success(&self) -> bool {
        self.0 == regraph_ledger::GENERATOR_SUCCESS
    }
}

impl AsRef<str> for UnitStatus {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Everything one `generate` call produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    #[serde(default)]
    pub graphs: Vec<Graph>,
    #[serde(default)]
    pub sequences: Vec<Sequence>,
    #[serde(default)]
    pub status: Vec<UnitStatus>,
}

impl GraphData {
    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    /// The sequence that gets annotated and exported (`PerFace` only).
    pub fn primary_sequence_mut(&mut self) -> Result<&mut Sequence> {
        self.sequences
            .first_mut()
            .ok_or_else(|| RegraphError::Annotation("generator produced no sequence".to_string()))
    }

    pub fn primary_sequence(&self) -> Option<&Sequence> {
        self.sequences.first()
    }
}

/// Answer of the generator's support predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportVerdict {
    pub supported: bool,
    #[serde(default)]
    pub reason: String,
}

impl SupportVerdict {
    pub fn supported() -> Self {
        Self {
            supported: true,
            reason: String::new(),
        }
    }

    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self {
            supported: false,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_annotate_writes_names_in_order() {
        let mut seq = Sequence::with_steps(vec![
            json!({"faces": [1]}),
            json!({"faces": [2]}),
            json!({"faces": [3]}),
        ]);
        let files: Vec<String> = (0..3).map(|i| format!("Couch_{:04}.json", i)).collect();
        seq.annotate(&files).unwrap();

        for i in 0..3 {
            assert_eq!(seq.step_graph(i), Some(files[i].as_str()));
        }
    }

    #[test]
    fn test_annotate_fewer_steps_than_graphs() {
        let mut seq = Sequence::with_steps(vec![json!({})]);
        let files = vec!["A_0000.json".to_string(), "A_0001.json".to_string()];
        seq.annotate(&files).unwrap();
        assert_eq!(seq.step_graph(0), Some("A_0000.json"));
        assert_eq!(seq.steps().len(), 1);
    }

    #[test]
    fn test_annotate_more_steps_than_graphs_fails() {
        let mut seq = Sequence::with_steps(vec![json!({}), json!({})]);
        let err = seq.annotate(&["A_0000.json".to_string()]).unwrap_err();
        assert_eq!(err.kind(), "Annotation");
    }

    #[test]
    fn test_annotate_without_steps_fails() {
        let mut seq = Sequence::default();
        assert!(seq.annotate(&[]).is_err());
    }

    #[test]
    fn test_annotation_keeps_field_order() {
        let mut seq: Sequence = serde_json::from_value(json!({
            "sequence": [{"faces": [0], "graph": null, "bbox": {}}],
            "properties": {"name": "Couch"}
        }))
        .unwrap();
        seq.annotate(&["Couch_0000.json".to_string()]).unwrap();

        let text = serde_json::to_string(&seq).unwrap();
        assert_eq!(
            text,
            r#"{"sequence":[{"faces":[0],"graph":"Couch_0000.json","bbox":{}}],"properties":{"name":"Couch"}}"#
        );
    }

    #[test]
    fn test_graph_data_defaults_missing_lists() {
        let data: GraphData = serde_json::from_value(json!({"status": ["Success"]})).unwrap();
        assert!(data.is_empty());
        assert!(data.sequences.is_empty());
        assert!(data.status[0].is_success());
    }
}
