//! Installs the global subscriber with a single-file JSONL sink and checks
//! what lands on disk. Lives in its own test binary because the global
//! subscriber can only be installed once per process.

use kite_logging::{FileConfig, KiteSubscriberBuilder, LogConfig, NodeContextGuard, RotationStrategy};

#[test]
fn test_jsonl_file_sink() {
    let directory = std::env::temp_dir().join(format!("kite-logging-{}", std::process::id()));
    let config = LogConfig {
        default_level: "debug".to_string(),
        ..LogConfig::default()
    };

    let guard = KiteSubscriberBuilder::new()
        .with_config(config)
        .with_console(false)
        .with_file_output(FileConfig {
            directory: directory.clone(),
            prefix: "forwarder".to_string(),
            rotation: RotationStrategy::Never,
            max_files: None,
        })
        .try_init()
        .expect("first install succeeds")
        .expect("file output returns a worker guard");

    {
        let _node = NodeContextGuard::new("access-point");
        tracing::info!(face = 5, "mobility ack received");
    }
    drop(guard);

    let contents = std::fs::read_to_string(directory.join("forwarder.log")).unwrap();
    let lines: Vec<serde_json::Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    let ack = lines
        .iter()
        .find(|line| line["message"] == "mobility ack received")
        .expect("event written to file");
    assert_eq!(ack["face"], 5);
    assert_eq!(ack["span"]["node"], "access-point");

    std::fs::remove_dir_all(directory).unwrap();
}
