use ingest_logger::{LevelFilter, Logger, LoggerError};
use serial_test::serial;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

// The global subscriber can only be installed once per test binary, so every
// scenario lives in a single test.
#[test]
#[serial]
fn file_logging_writes_json_lines_and_rejects_second_init() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let log_dir = tmp_dir.path().join("logs");

    let logger = Logger::builder("integration-file-logging")
        .console(false)
        .json(true)
        .file(&log_dir)
        .level(LevelFilter::INFO)
        .init()?;

    assert!(logger.guard().is_some(), "file output should hold a worker guard");

    let err = Logger::builder("integration-second").init().expect_err("second init should fail");
    assert!(matches!(err, LoggerError::Subscriber { .. }));

    tracing::info!(source_id = 42, "hello from integration test");

    std::thread::sleep(Duration::from_millis(30));
    drop(logger);

    let log_file = fs::read_dir(&log_dir)?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.extension().and_then(|ext| ext.to_str()) == Some("log"))
        .expect("log file should be created");

    let contents = fs::read_to_string(&log_file)?;
    let line = contents.lines().find(|l| l.contains("hello from integration test")).expect("log line");
    assert!(line.trim_start().starts_with('{'), "file output should be JSON: {line}");
    assert!(line.contains("\"source_id\":42"));

    Ok(())
}

#[test]
#[serial]
fn disabling_every_output_is_rejected() {
    let err = Logger::builder("integration-silent").console(false).init().unwrap_err();
    assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
}
