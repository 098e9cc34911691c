//! 탐지 엔진 — 이벤트별 탐지 실행과 알림 발행
//!
//! [`DetectionEngine::handle`]은 성공적으로 파싱된 로그 라인마다 로그
//! 순서대로 한 번 호출되는 유일한 진입점입니다. 세 탐지기(brute force,
//! SQL 인젝션, 보호 엔드포인트)는 서로 독립적으로 실행됩니다. 한 이벤트가
//! 0개, 1개, 또는 여러 종류의 알림을 동시에 유발할 수 있으며, 한 탐지기의
//! 실패가 나머지 탐지기나 후속 이벤트 처리를 막지 않습니다.

use std::sync::Arc;

use logwarden_core::config::DetectionConfig;
use logwarden_core::types::{Alert, AlertKind, LogEvent};

use crate::error::MonitorError;
use crate::patterns::PatternMatcher;
use crate::sink::AlertSink;
use crate::stats::StatsAggregator;
use crate::window::SlidingWindowTracker;

/// 탐지기가 만든 알림 초안 (종류 + 설명)
struct AlertDraft {
    kind: AlertKind,
    description: String,
}

/// 탐지 엔진
///
/// 윈도우 상태와 통계의 유일한 변경 주체입니다. 알림 싱크와 통계는
/// 추가/증가만 수행하며 탐지 상태를 변경하지 않습니다.
pub struct DetectionEngine {
    /// 탐지 규칙 설정
    detection: DetectionConfig,
    /// 주소별 로그인 실패 윈도우
    window: SlidingWindowTracker,
    /// 시그니처/엔드포인트 분류기
    matcher: PatternMatcher,
    /// 알림 싱크
    sink: AlertSink,
    /// 공유 세션 통계
    stats: Arc<StatsAggregator>,
}

impl DetectionEngine {
    /// 탐지 설정에서 엔진을 생성합니다.
    ///
    /// 시그니처 정규식 컴파일 실패는 여기서 보고됩니다.
    pub fn new(
        detection: &DetectionConfig,
        sink: AlertSink,
        stats: Arc<StatsAggregator>,
    ) -> Result<Self, MonitorError> {
        Ok(Self {
            window: SlidingWindowTracker::new(detection.brute_force_window_secs),
            matcher: PatternMatcher::from_config(detection)?,
            detection: detection.clone(),
            sink,
            stats,
        })
    }

    /// 파싱된 이벤트 하나를 처리합니다.
    ///
    /// 분류 결과와 무관하게 `total_requests`를 먼저 증가시킨 뒤 탐지기를
    /// 순서대로 실행합니다. 어떤 실패도 이 메서드 밖으로 전파되지
    /// 않습니다.
    pub async fn handle(&mut self, event: &LogEvent) {
        self.stats.record_request();

        match self.check_brute_force(event) {
            Ok(Some(draft)) => self.raise(event, draft).await,
            Ok(None) => {}
            Err(e) => {
                tracing::error!(detector = "brute_force", error = %e, "detector failed");
            }
        }

        match self.check_sql_injection(event) {
            Ok(Some(draft)) => self.raise(event, draft).await,
            Ok(None) => {}
            Err(e) => {
                tracing::error!(detector = "sql_injection", error = %e, "detector failed");
            }
        }

        match self.check_endpoint_access(event) {
            Ok(Some(draft)) => self.raise(event, draft).await,
            Ok(None) => {}
            Err(e) => {
                tracing::error!(detector = "endpoint_access", error = %e, "detector failed");
            }
        }
    }

    /// 알림 싱크 참조를 반환합니다.
    pub fn sink(&self) -> &AlertSink {
        &self.sink
    }

    /// 로그인 실패 이벤트를 윈도우에 기록하고 임계값을 검사합니다.
    ///
    /// 임계값에 도달하면 해당 주소의 윈도우를 즉시 비워 같은 버스트가
    /// 알림을 반복 유발하지 않도록 합니다.
    fn check_brute_force(&mut self, event: &LogEvent) -> Result<Option<AlertDraft>, MonitorError> {
        let is_failed_login = self
            .detection
            .failed_login_markers
            .iter()
            .any(|marker| event.message.contains(marker.as_str()));
        if !is_failed_login {
            return Ok(None);
        }

        let count = self.window.observe(&event.source_address, event.timestamp);
        if count < self.detection.brute_force_threshold as usize {
            return Ok(None);
        }

        self.window.reset(&event.source_address);
        Ok(Some(AlertDraft {
            kind: AlertKind::BruteForce,
            description: format!(
                "Brute force attack detected from IP {}: {} failed login attempts within {} seconds",
                event.source_address, count, self.detection.brute_force_window_secs,
            ),
        }))
    }

    /// 메시지를 SQL 인젝션 시그니처에 대해 검사합니다.
    fn check_sql_injection(&self, event: &LogEvent) -> Result<Option<AlertDraft>, MonitorError> {
        Ok(self
            .matcher
            .classify_injection(&event.message)
            .map(|label| AlertDraft {
                kind: AlertKind::SqlInjection,
                description: format!("Potential SQL injection detected: {label}"),
            }))
    }

    /// 메시지를 보호 엔드포인트 접근에 대해 검사합니다.
    fn check_endpoint_access(&self, event: &LogEvent) -> Result<Option<AlertDraft>, MonitorError> {
        Ok(self
            .matcher
            .classify_endpoint_access(&event.message)
            .map(|(endpoint, kind)| {
                let description = match kind {
                    AlertKind::UnauthorizedAccess => {
                        format!("Unauthorized access attempt to {endpoint}")
                    }
                    _ => format!("Endpoint scanning detected on {endpoint}"),
                };
                AlertDraft { kind, description }
            }))
    }

    /// 알림을 구성해 싱크에 넘기고 통계를 갱신합니다.
    async fn raise(&mut self, event: &LogEvent, draft: AlertDraft) {
        let alert = Alert::new(
            draft.kind,
            event.source_address.clone(),
            draft.description,
            event.raw.clone(),
        );
        self.sink.record(&alert).await;
        self.stats.record_incident(draft.kind, &event.source_address);
    }
}
