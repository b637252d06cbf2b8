//! The logger writes JSON lines to a rolling file when `log_dir` is set.

use meta_factory::infrastructure::logging::{LogConfig, LogFormat, LoggerImpl, RotationPolicy};
use tempfile::TempDir;

#[test]
fn test_file_logging_writes_json_events() {
    let dir = TempDir::new().unwrap();
    let config = LogConfig {
        level: "info".to_string(),
        format: LogFormat::Json,
        log_dir: Some(dir.path().to_path_buf()),
        enable_console: false,
        rotation: RotationPolicy::Never,
        ..LogConfig::default()
    };

    temp_env::with_var_unset("RUST_LOG", || {
        let logger = LoggerImpl::init(&config).unwrap();
        tracing::info!(stage = "discovery", score = 0.85, "Stage passed review");
        tracing::debug!("below the configured level");
        drop(logger);
    });

    let contents = std::fs::read_to_string(dir.path().join("meta-factory.log")).unwrap();
    let line = contents.lines().next().unwrap();
    let event: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(event["fields"]["message"], "Stage passed review");
    assert_eq!(event["fields"]["stage"], "discovery");
    assert!(!contents.contains("below the configured level"));
}
