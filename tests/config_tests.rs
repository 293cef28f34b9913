use std::io::Write;
use std::time::Duration;

use edgesense::config::{PipelineConfig, DEFAULT_DEVICE_ID};
use edgesense::core::PipelineError;
use serde_json::json;
use tempfile::NamedTempFile;
use tokio_test::{assert_err, assert_ok};

#[test]
fn test_missing_fields_take_defaults() {
    let config = assert_ok!(PipelineConfig::from_json(json!({
        "samples_per_window": 50,
        "max_cycles": 3
    })));

    assert_eq!(config.device_id, DEFAULT_DEVICE_ID);
    assert_eq!(config.samples_per_window, 50);
    assert_eq!(config.window_len(), 300);
    assert_eq!(config.max_cycles, Some(3));
    assert_eq!(config.labels, vec!["Squat", "Stand", "Stoop", "Walk"]);
    assert_eq!(config.transport.do_work_interval_ms, 100);
}

#[test]
fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "device_id": 42,
            "sample_rate_hz": 50,
            "channels_per_sample": 3,
            "labels": ["Idle", "Moving"],
            "transport": {{ "log_trace": true, "trusted_certificates": "PEM" }},
            "simulator": {{ "mode": "oscillating" }}
        }}"#
    )
    .unwrap();

    let config = assert_ok!(PipelineConfig::from_file(file.path()));
    assert_eq!(config.device_id, 42);
    assert_eq!(config.sample_interval(), Duration::from_millis(20));
    assert_eq!(config.window_len(), 200 * 3);
    assert!(config.transport.log_trace);
    assert_eq!(config.transport.trusted_certificates.as_deref(), Some("PEM"));
}

#[test]
fn test_load_with_simulator_section() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "device_id": 9, "simulator": {{ "mode": "constant", "fail_every": 4 }} }}"#
    )
    .unwrap();

    let (config, simulator) = assert_ok!(PipelineConfig::from_file_with_section(file.path(), "simulator"));
    assert_eq!(config.device_id, 9);
    assert_eq!(simulator["mode"], "constant");
    assert_eq!(simulator["fail_every"], 4);

    let (_, missing) = assert_ok!(PipelineConfig::from_file_with_section(file.path(), "absent"));
    assert!(missing.is_null());
}

#[test]
fn test_unreadable_or_malformed_file() {
    assert_err!(PipelineConfig::from_file("/nonexistent/edgesense.json"));

    let mut file = NamedTempFile::new().unwrap();
    write!(file, "device_id = 1").unwrap();
    assert_err!(PipelineConfig::from_file(file.path()));
}

#[test]
fn test_validation_rejects_bad_geometry() {
    let bad = [
        json!({ "sample_rate_hz": 0 }),
        json!({ "samples_per_window": 0 }),
        json!({ "channels_per_sample": 4 }),
        json!({ "linear_scale": 0.0 }),
        json!({ "angular_scale": -1.0 }),
    ];
    for config in bad {
        assert_err!(PipelineConfig::from_json(config));
    }
}

#[test]
fn test_validation_rejects_bad_labels() {
    let too_long = "x".repeat(20);
    let cases = [
        PipelineConfig { labels: vec![], ..Default::default() },
        PipelineConfig { labels: vec!["".into()], ..Default::default() },
        PipelineConfig { labels: vec![too_long], ..Default::default() },
        PipelineConfig { labels: vec!["Walk".into(), "Anomaly".into()], ..Default::default() },
    ];
    for config in cases {
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }
}
