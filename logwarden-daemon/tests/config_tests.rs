//! Daemon configuration loading tests.
//!
//! Exercises the same config surface the daemon uses at startup:
//! file loading, env overrides, and the monitor-config mapping.

use serial_test::serial;

use logwarden_core::config::LogwardenConfig;
use logwarden_monitor::config::PipelineConfig;

#[tokio::test]
async fn full_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logwarden.toml");
    std::fs::write(
        &path,
        r#"
        [general]
        log_level = "debug"
        log_format = "pretty"

        [monitor]
        log_path = "/var/log/webapp/application.log"
        alerts_path = "/var/log/webapp/security_alerts.log"
        poll_interval_ms = 50

        [detection]
        brute_force_threshold = 3
        brute_force_window_secs = 30

        [report]
        output_dir = "/var/lib/logwarden/reports"
        hour = 6
        minute = 30

        [metrics]
        enabled = false
        "#,
    )
    .unwrap();

    let config = LogwardenConfig::load(&path).await.unwrap();
    assert_eq!(config.general.log_level, "debug");
    assert_eq!(config.monitor.poll_interval_ms, 50);
    assert_eq!(config.detection.brute_force_threshold, 3);
    assert_eq!(config.report.hour, 6);

    // 섹션이 빠진 필드는 기본값
    assert_eq!(config.monitor.max_line_length, 64 * 1024);
    assert_eq!(config.detection.sql_signatures.len(), 6);
}

#[tokio::test]
async fn invalid_config_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logwarden.toml");
    std::fs::write(
        &path,
        r#"
        [report]
        hour = 25
        "#,
    )
    .unwrap();

    assert!(LogwardenConfig::load(&path).await.is_err());
}

#[tokio::test]
#[serial]
async fn env_overrides_apply_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logwarden.toml");
    std::fs::write(&path, "[monitor]\nlog_path = \"from_file.log\"\n").unwrap();

    // SAFETY: serial 실행으로 환경변수 경합이 없습니다.
    unsafe {
        std::env::set_var("LOGWARDEN_MONITOR_LOG_PATH", "from_env.log");
    }

    let config = LogwardenConfig::load(&path).await.unwrap();
    assert_eq!(config.monitor.log_path, "from_env.log");

    unsafe {
        std::env::remove_var("LOGWARDEN_MONITOR_LOG_PATH");
    }
}

#[test]
fn monitor_config_maps_all_sections() {
    let mut core = LogwardenConfig::default();
    core.monitor.log_path = "/srv/app.log".to_owned();
    core.report.output_dir = "/srv/reports".to_owned();
    core.detection.brute_force_threshold = 7;

    let monitor = PipelineConfig::from_core(&core);
    assert_eq!(monitor.log_path.to_str(), Some("/srv/app.log"));
    assert_eq!(monitor.report_dir.to_str(), Some("/srv/reports"));
    assert_eq!(monitor.detection.brute_force_threshold, 7);
    assert_eq!(monitor.report_hour, 23);
    assert_eq!(monitor.report_minute, 59);
    monitor.validate().unwrap();
}
