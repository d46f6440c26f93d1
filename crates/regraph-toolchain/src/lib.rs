//! Regraph Toolchain
//!
//! Process-backed collaborators for the conversion pipeline. Every importer,
//! generator and validator call runs one subcommand of an external tool and
//! exchanges JSON with it. `ProcessHost` gives each model a scratch
//! directory, and `readiness_signal` probes the host before the batch starts.

pub mod host;
pub mod probe;
pub mod process;
pub mod runner;

pub use host::ProcessHost;
pub use probe::{probe_once, readiness_signal, DEFAULT_PROBE_INTERVAL};
pub use process::ProcessToolchain;
pub use runner::{ToolOutput, ToolRunner};
