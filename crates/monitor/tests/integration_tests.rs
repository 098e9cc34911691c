//! 엔드투엔드 시나리오 — 실제 파일 테일링을 통한 전체 파이프라인 검증
//!
//! 임시 디렉토리의 로그 파일에 라인을 추가하고, 모니터가 알림 파일과
//! 통계에 반영할 때까지 기다리는 방식으로 검증합니다.

use std::path::{Path, PathBuf};
use std::time::Duration;

use logwarden_core::pipeline::Pipeline;
use logwarden_core::types::AlertKind;
use logwarden_monitor::config::PipelineConfigBuilder;
use logwarden_monitor::monitor::{SecurityMonitor, SecurityMonitorBuilder};

const WAIT_LIMIT: Duration = Duration::from_secs(3);

struct Harness {
    _dir: tempfile::TempDir,
    log_path: PathBuf,
    alerts_path: PathBuf,
    report_dir: PathBuf,
    monitor: SecurityMonitor,
}

async fn start_monitor() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("application.log");
    let alerts_path = dir.path().join("security_alerts.log");
    let report_dir = dir.path().join("reports");
    std::fs::write(&log_path, "").unwrap();
    std::fs::create_dir(&report_dir).unwrap();

    let config = PipelineConfigBuilder::new()
        .log_path(&log_path)
        .alerts_path(&alerts_path)
        .report_dir(&report_dir)
        .poll_interval(Duration::from_millis(10))
        .build()
        .unwrap();

    let mut monitor = SecurityMonitorBuilder::new()
        .config(config)
        .console_alerts(false)
        .build()
        .unwrap();
    monitor.start().await.unwrap();

    Harness {
        _dir: dir,
        log_path,
        alerts_path,
        report_dir,
        monitor,
    }
}

fn append_lines(path: &Path, lines: &[String]) {
    use std::io::Write;
    let mut file = std::fs::OpenOptions::new().append(true).open(path).unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file.flush().unwrap();
}

fn log_line(secs: u32, address: &str, message: &str) -> String {
    format!("2024-01-15T10:00:{secs:02}.000000 - WARNING - [IP: {address}] - {message}")
}

fn alert_lines(path: &Path) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => content.lines().map(str::to_owned).collect(),
        Err(_) => Vec::new(),
    }
}

/// 조건이 참이 될 때까지 폴링합니다. 시한 내에 달성하지 못하면 false.
async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + WAIT_LIMIT;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}

#[tokio::test]
async fn brute_force_burst_raises_single_alert() {
    let mut harness = start_monitor().await;

    // 10초 안에 5건의 로그인 실패
    let lines: Vec<String> = (0..5)
        .map(|i| log_line(i * 2, "198.51.100.1", "Failed login attempt"))
        .collect();
    append_lines(&harness.log_path, &lines);

    let alerts_path = harness.alerts_path.clone();
    assert!(
        wait_until(move || alert_lines(&alerts_path).len() == 1).await,
        "expected exactly one alert"
    );

    let recorded = alert_lines(&harness.alerts_path);
    assert_eq!(recorded.len(), 1);
    assert!(recorded[0].contains(" - ALERT - BRUTE_FORCE - [IP: 198.51.100.1] - "));

    let stats = harness.monitor.stats();
    let snapshot = stats.snapshot();
    assert_eq!(snapshot.total_requests, 5);
    assert_eq!(snapshot.incidents_by_kind, vec![(AlertKind::BruteForce, 1)]);
    assert_eq!(
        snapshot.incidents_by_source,
        vec![("198.51.100.1".to_owned(), 1)]
    );

    harness.monitor.stop().await.unwrap();
}

#[tokio::test]
async fn injection_and_unauthorized_access_scenario() {
    let mut harness = start_monitor().await;

    append_lines(
        &harness.log_path,
        &[
            log_line(
                0,
                "10.0.0.5",
                "Login attempt - SQL: SELECT * FROM users WHERE username = 'admin' OR '1'='1'",
            ),
            log_line(1, "10.0.0.6", "GET /admin returned 403"),
        ],
    );

    let alerts_path = harness.alerts_path.clone();
    assert!(
        wait_until(move || alert_lines(&alerts_path).len() == 2).await,
        "expected two alerts"
    );

    let recorded = alert_lines(&harness.alerts_path);
    assert!(recorded.iter().any(|l| l.contains("SQL_INJECTION")));
    assert!(recorded.iter().any(|l| l.contains("UNAUTHORIZED_ACCESS")));

    let snapshot = harness.monitor.stats().snapshot();
    assert_eq!(snapshot.total_requests, 2);
    assert_eq!(snapshot.total_incidents, 2);

    harness.monitor.stop().await.unwrap();
}

#[tokio::test]
async fn malformed_line_is_skipped_without_stopping_the_stream() {
    let mut harness = start_monitor().await;

    append_lines(
        &harness.log_path,
        &[
            "not a log line at all".to_owned(),
            "2024-01-15T10:00:00 - INFO - no address field".to_owned(),
            log_line(1, "10.0.0.5", "GET /config returned 404"),
        ],
    );

    let alerts_path = harness.alerts_path.clone();
    assert!(
        wait_until(move || alert_lines(&alerts_path).len() == 1).await,
        "valid line after malformed ones should still be processed"
    );

    let recorded = alert_lines(&harness.alerts_path);
    assert!(recorded[0].contains("ENDPOINT_SCANNING"));

    // 파싱에 실패한 라인은 total_requests에 포함되지 않음
    let snapshot = harness.monitor.stats().snapshot();
    assert_eq!(snapshot.total_requests, 1);

    harness.monitor.stop().await.unwrap();
}

#[tokio::test]
async fn stop_generates_final_report_with_exact_totals() {
    let mut harness = start_monitor().await;

    append_lines(
        &harness.log_path,
        &[
            log_line(0, "10.0.0.5", "User logged in"),
            log_line(1, "10.0.0.5", "GET /backup returned 404"),
            log_line(2, "10.0.0.5", "User logged out"),
        ],
    );

    let stats = harness.monitor.stats();
    assert!(
        wait_until(move || stats.total_requests() == 3).await,
        "all three events should be counted"
    );

    harness.monitor.stop().await.unwrap();

    let reports: Vec<PathBuf> = std::fs::read_dir(&harness.report_dir)
        .unwrap()
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .is_some_and(|n| n.to_string_lossy().starts_with("daily_security_report_"))
        })
        .collect();
    assert_eq!(reports.len(), 1);

    let text = std::fs::read_to_string(&reports[0]).unwrap();
    assert!(text.contains("- Total requests processed: 3"));
    assert!(text.contains("- Total security incidents: 1"));
    assert!(text.contains("- ENDPOINT_SCANNING: 1 cases"));
    assert!(text.contains("Low threat level"));
}

#[tokio::test]
async fn events_after_rotation_of_source_are_still_detected() {
    let mut harness = start_monitor().await;

    // 교체 후 파일이 확실히 짧아지도록 충분한 분량을 먼저 기록
    append_lines(
        &harness.log_path,
        &[
            log_line(0, "10.0.0.5", "GET /admin returned 403"),
            log_line(1, "10.0.0.5", &format!("long benign entry {}", "x".repeat(200))),
        ],
    );
    let alerts_path = harness.alerts_path.clone();
    assert!(wait_until(move || alert_lines(&alerts_path).len() == 1).await);

    // 교체 전에 기존 내용이 전부 소비되었는지 확인 (오프셋이 파일 끝에 도달)
    let stats = harness.monitor.stats();
    assert!(wait_until(move || stats.total_requests() == 2).await);

    // 로그 로테이션: 파일을 더 짧은 새 내용으로 교체
    std::fs::write(
        &harness.log_path,
        format!("{}\n", log_line(5, "10.0.0.6", "GET /config returned 403")),
    )
    .unwrap();

    let alerts_path = harness.alerts_path.clone();
    assert!(
        wait_until(move || alert_lines(&alerts_path).len() == 2).await,
        "alert from rotated file expected"
    );

    harness.monitor.stop().await.unwrap();
}
