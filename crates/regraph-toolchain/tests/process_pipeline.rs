//! Full batch over the process-backed toolchain, using a shell script as the tool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use regraph_core::{
    BatchDriver, Collaborators, ConversionMode, DocumentConverter, JsonFileStore, LedgerStatus,
    ResultLedger, ToolchainConfig,
};
use regraph_toolchain::{ProcessHost, ProcessToolchain};

const TOOL_SCRIPT: &str = r#"
cmd="$1"; shift
case "$cmd" in
  supported)
    case "$1" in
      *Lamp.json) echo '{"supported": false, "reason": "Unsupported curve type"}' ;;
      *) echo '{"supported": true, "reason": ""}' ;;
    esac ;;
  reconstruct)
    case "$1" in
      *Broken.json) echo "profile not closed" >&2; exit 3 ;;
    esac
    cp "$1" "$2/design.json" ;;
  generate)
    test -f "$1/design.json" || { echo "model not reconstructed" >&2; exit 1; }
    echo '{"graphs": [{"nodes": [], "links": []}, {"nodes": [], "links": []}], "sequences": [{"sequence": [{"action": "extrude"}, {"action": "extrude"}]}], "status": ["Success", "Success"]}' ;;
  validate)
    grep -q '_0001.json' "$1" || { echo "sequence not annotated" >&2; exit 1; } ;;
  reconstruct-graph)
    test -s "$1" ;;
  *)
    echo "unknown subcommand $cmd" >&2; exit 2 ;;
esac
"#;

fn write_tool(dir: &Path) -> ToolchainConfig {
    let script = dir.join("regraph-tool.sh");
    std::fs::write(&script, TOOL_SCRIPT).unwrap();
    ToolchainConfig {
        program: "sh".to_string(),
        args: vec![script.display().to_string()],
        timeout_secs: 30,
        ready_probe: None,
    }
}

fn write_document(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, r#"{"entities": {}, "timeline": []}"#).unwrap();
    path
}

#[tokio::test]
async fn process_toolchain_runs_full_batch() {
    let work = tempfile::tempdir().unwrap();
    let input = work.path().join("input");
    let output = work.path().join("output");
    let scratch = work.path().join("scratch");
    for dir in [&input, &output, &scratch] {
        std::fs::create_dir_all(dir).unwrap();
    }

    let config = write_tool(work.path());
    let toolchain = Arc::new(ProcessToolchain::new(&config));
    let host = Arc::new(ProcessHost::with_scratch_root(&scratch));
    let driver = BatchDriver::new(
        DocumentConverter::new(
            ConversionMode::PerFace,
            &output,
            Collaborators::from_toolchain(toolchain),
        ),
        host.clone(),
    );

    let docs = vec![
        write_document(&input, "Couch.json"),
        write_document(&input, "Lamp.json"),
        write_document(&input, "Broken.json"),
    ];
    let ledger_path = output.join("regraph_results.json");
    let mut ledger = ResultLedger::load(Arc::new(JsonFileStore::new(&ledger_path))).unwrap();

    let report = driver.run(&docs, &mut ledger).await;

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.unsupported, 1);
    assert_eq!(report.failed, 1);

    for name in ["Couch_0000.json", "Couch_0001.json", "Couch_sequence.json"] {
        assert!(output.join(name).is_file(), "{} should exist", name);
    }
    let couch = ledger.records("Couch.json").unwrap();
    assert_eq!(couch.len(), 2);
    assert!(couch.iter().all(|r| r.is_success()));

    let lamp = ledger.records("Lamp.json").unwrap();
    assert_eq!(lamp[0].status, Some(LedgerStatus::Skip));
    assert_eq!(lamp[0].reason.as_deref(), Some("Unsupported curve type"));

    let broken = ledger.records("Broken.json").unwrap();
    assert_eq!(broken[0].exception.as_deref(), Some("Import"));
    assert_eq!(broken[0].exception_args.as_deref(), Some("profile not closed"));

    assert_eq!(host.open_count(), 0);
    assert_eq!(std::fs::read_dir(&scratch).unwrap().count(), 0);
    assert!(ledger_path.is_file());
}

#[tokio::test]
async fn unreadable_generator_output_is_recorded() {
    let work = tempfile::tempdir().unwrap();
    let script = work.path().join("tool.sh");
    std::fs::write(
        &script,
        r#"
case "$1" in
  supported) echo '{"supported": true}' ;;
  reconstruct) exit 0 ;;
  generate) echo 'not json' ;;
esac
"#,
    )
    .unwrap();
    let config = ToolchainConfig {
        program: "sh".to_string(),
        args: vec![script.display().to_string()],
        ..Default::default()
    };

    let driver = BatchDriver::new(
        DocumentConverter::new(
            ConversionMode::PerExtrude,
            work.path(),
            Collaborators::from_toolchain(Arc::new(ProcessToolchain::new(&config))),
        ),
        Arc::new(ProcessHost::new()),
    );
    let docs = vec![write_document(work.path(), "Couch.json")];
    let store = Arc::new(regraph_ledger::fakes::MemoryLedgerStore::new());
    let mut ledger = ResultLedger::load(store).unwrap();

    let report = driver.run(&docs, &mut ledger).await;

    assert_eq!(report.failed, 1);
    let records = ledger.records("Couch.json").unwrap();
    assert_eq!(records[0].exception.as_deref(), Some("Generation"));
}
