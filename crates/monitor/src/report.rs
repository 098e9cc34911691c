//! 일일 보안 리포트 생성
//!
//! [`ReportGenerator`]는 통계 스냅샷을 사람이 읽는 리포트로 렌더링하고
//! 날짜가 찍힌 파일로 저장합니다. 저장 실패는 best-effort로 처리되어
//! 렌더링된 텍스트는 항상 호출자에게 반환됩니다.

use std::path::PathBuf;
use std::sync::Arc;

use logwarden_core::metrics as m;

use crate::stats::{StatsAggregator, StatsSnapshot};

/// 위협 수준 — 인시던트 총량을 임계값으로 구분한 정성 등급
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreatLevel {
    /// 10건 초과
    High,
    /// 5건 초과
    Medium,
    /// 그 외
    Low,
}

impl ThreatLevel {
    /// 인시던트 총량에서 위협 수준을 결정합니다.
    pub fn from_incident_count(total_incidents: u64) -> Self {
        if total_incidents > 10 {
            Self::High
        } else if total_incidents > 5 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// 리포트에 표시되는 권고 문구를 반환합니다.
    pub fn recommendation(&self) -> &'static str {
        match self {
            Self::High => {
                "High threat level. Strengthening security measures is recommended."
            }
            Self::Medium => {
                "Medium threat level. Reviewing the security configuration is recommended."
            }
            Self::Low => "Low threat level. The system is operating normally.",
        }
    }
}

/// 생성된 리포트
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    /// 렌더링된 리포트 텍스트
    pub text: String,
    /// 저장에 성공한 경우 그 경로
    pub persisted_to: Option<PathBuf>,
}

/// 리포트 생성기
///
/// 탐지 경로가 기록하는 [`StatsAggregator`]를 읽기 전용으로 공유합니다.
pub struct ReportGenerator {
    /// 리포트 출력 디렉토리
    output_dir: PathBuf,
    /// 공유 통계
    stats: Arc<StatsAggregator>,
}

impl ReportGenerator {
    /// 새 리포트 생성기를 만듭니다.
    pub fn new(output_dir: impl Into<PathBuf>, stats: Arc<StatsAggregator>) -> Self {
        Self {
            output_dir: output_dir.into(),
            stats,
        }
    }

    /// 스냅샷을 리포트 텍스트로 렌더링합니다.
    pub fn render(snapshot: &StatsSnapshot) -> String {
        let threat = ThreatLevel::from_incident_count(snapshot.total_incidents);
        let mut out = String::new();

        out.push_str("DAILY SECURITY REPORT\n");
        out.push_str(&format!(
            "Generated at: {}\n",
            snapshot.generated_at.format("%Y-%m-%d %H:%M:%S")
        ));
        out.push_str(&format!(
            "Monitoring period: {}\n",
            format_duration(snapshot.session_duration())
        ));
        out.push('\n');

        out.push_str("OVERALL STATISTICS:\n");
        out.push_str(&format!(
            "- Total requests processed: {}\n",
            snapshot.total_requests
        ));
        out.push_str(&format!(
            "- Total security incidents: {}\n",
            snapshot.total_incidents
        ));
        out.push('\n');

        out.push_str("INCIDENT DETAILS:\n");
        for (kind, count) in &snapshot.incidents_by_kind {
            out.push_str(&format!("- {kind}: {count} cases\n"));
        }
        out.push('\n');

        out.push_str("SUSPICIOUS IP ADDRESSES:\n");
        for (address, count) in &snapshot.incidents_by_source {
            out.push_str(&format!("- {address}: {count} incidents\n"));
        }
        out.push('\n');

        out.push_str("RECOMMENDATIONS:\n");
        out.push_str(&format!("- {}\n", threat.recommendation()));

        out
    }

    /// 리포트를 생성하고 날짜가 찍힌 파일로 저장합니다.
    ///
    /// 저장 실패는 경고로만 남기고 텍스트는 항상 반환합니다.
    pub async fn generate(&self) -> GeneratedReport {
        let snapshot = self.stats.snapshot();
        let text = Self::render(&snapshot);

        let filename = format!(
            "daily_security_report_{}.txt",
            snapshot.generated_at.format("%Y%m%d")
        );
        let path = self.output_dir.join(filename);

        let persisted_to = match tokio::fs::write(&path, &text).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "security report persisted");
                Some(path)
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to persist security report"
                );
                None
            }
        };

        metrics::counter!(m::REPORT_GENERATED_TOTAL).increment(1);

        GeneratedReport { text, persisted_to }
    }
}

/// 경과 시간을 `XhYmZs` 형태로 렌더링합니다.
fn format_duration(duration: chrono::Duration) -> String {
    let total_secs = duration.num_seconds().max(0);
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours}h {minutes}m {seconds}s")
}

#[cfg(test)]
mod tests {
    use super::*;
    use logwarden_core::types::AlertKind;

    fn aggregator_with(requests: u64, incidents: &[(AlertKind, &str)]) -> Arc<StatsAggregator> {
        let stats = Arc::new(StatsAggregator::new());
        for _ in 0..requests {
            stats.record_request();
        }
        for (kind, source) in incidents {
            stats.record_incident(*kind, source);
        }
        stats
    }

    #[test]
    fn threat_level_thresholds() {
        assert_eq!(ThreatLevel::from_incident_count(0), ThreatLevel::Low);
        assert_eq!(ThreatLevel::from_incident_count(5), ThreatLevel::Low);
        assert_eq!(ThreatLevel::from_incident_count(6), ThreatLevel::Medium);
        assert_eq!(ThreatLevel::from_incident_count(10), ThreatLevel::Medium);
        assert_eq!(ThreatLevel::from_incident_count(11), ThreatLevel::High);
    }

    #[test]
    fn render_reflects_exact_totals() {
        let stats = aggregator_with(
            42,
            &[
                (AlertKind::BruteForce, "198.51.100.1"),
                (AlertKind::SqlInjection, "10.0.0.5"),
                (AlertKind::SqlInjection, "10.0.0.5"),
            ],
        );
        let text = ReportGenerator::render(&stats.snapshot());

        assert!(text.contains("- Total requests processed: 42"));
        assert!(text.contains("- Total security incidents: 3"));
        assert!(text.contains("- SQL_INJECTION: 2 cases"));
        assert!(text.contains("- BRUTE_FORCE: 1 cases"));
        assert!(text.contains("- 10.0.0.5: 2 incidents"));
        assert!(text.contains("- 198.51.100.1: 1 incidents"));
        assert!(text.contains("Low threat level"));
    }

    #[test]
    fn render_selects_medium_tier() {
        let incidents: Vec<(AlertKind, &str)> =
            (0..6).map(|_| (AlertKind::EndpointScanning, "10.0.0.9")).collect();
        let stats = aggregator_with(6, &incidents);
        let text = ReportGenerator::render(&stats.snapshot());
        assert!(text.contains("Medium threat level"));
    }

    #[test]
    fn render_selects_high_tier() {
        let incidents: Vec<(AlertKind, &str)> =
            (0..11).map(|_| (AlertKind::BruteForce, "10.0.0.9")).collect();
        let stats = aggregator_with(11, &incidents);
        let text = ReportGenerator::render(&stats.snapshot());
        assert!(text.contains("High threat level"));
    }

    #[test]
    fn format_duration_breaks_down_units() {
        assert_eq!(
            format_duration(chrono::Duration::seconds(3 * 3600 + 25 * 60 + 7)),
            "3h 25m 7s"
        );
        assert_eq!(format_duration(chrono::Duration::seconds(59)), "0h 0m 59s");
    }

    #[tokio::test]
    async fn generate_persists_date_stamped_file() {
        let dir = tempfile::tempdir().unwrap();
        let stats = aggregator_with(3, &[(AlertKind::BruteForce, "198.51.100.1")]);
        let generator = ReportGenerator::new(dir.path(), stats);

        let report = generator.generate().await;
        let path = report.persisted_to.expect("report should persist");

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("daily_security_report_"));
        assert!(name.ends_with(".txt"));
        // 날짜 부분은 YYYYMMDD 8자리
        let date_part = name
            .trim_start_matches("daily_security_report_")
            .trim_end_matches(".txt");
        assert_eq!(date_part.len(), 8);

        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert_eq!(on_disk, report.text);
    }

    #[tokio::test]
    async fn generate_survives_unwritable_destination() {
        let stats = aggregator_with(1, &[]);
        let generator = ReportGenerator::new("/nonexistent-dir/reports", stats);

        let report = generator.generate().await;
        assert!(report.persisted_to.is_none());
        assert!(report.text.contains("DAILY SECURITY REPORT"));
    }
}
