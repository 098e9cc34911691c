//! 리포트 스케줄러 — 일일 경계 기준의 독립 타임라인
//!
//! 테일링/탐지 루프와 무관한 별도 태스크로 실행됩니다. 설정된 벽시계
//! 시각(기본 23:59)까지 잠들었다가 리포트를 생성하고 반복합니다.
//! 대기는 취소 토큰과 경쟁하므로 종료 시 즉시 깨어납니다.
//!
//! 종료 시의 최종 리포트는 [`SecurityMonitor::stop`] 경로가 담당하므로
//! 24시간 미만 세션도 리포트를 남깁니다.
//!
//! [`SecurityMonitor::stop`]: crate::monitor::SecurityMonitor

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio_util::sync::CancellationToken;

use crate::report::ReportGenerator;

/// 리포트 스케줄러
pub struct ReportScheduler {
    /// 공유 리포트 생성기
    generator: Arc<ReportGenerator>,
    /// 일일 경계 시각 (시)
    hour: u8,
    /// 일일 경계 시각 (분)
    minute: u8,
    /// 종료 신호
    cancel: CancellationToken,
}

impl ReportScheduler {
    /// 새 스케줄러를 생성합니다.
    pub fn new(
        generator: Arc<ReportGenerator>,
        hour: u8,
        minute: u8,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            generator,
            hour,
            minute,
            cancel,
        }
    }

    /// 다음 일일 경계 시각을 계산합니다.
    ///
    /// 오늘의 경계가 이미 지났으면(같은 시각 포함) 내일로 넘어갑니다.
    pub fn next_boundary(now: NaiveDateTime, hour: u8, minute: u8) -> NaiveDateTime {
        // hour/minute 범위는 설정 검증에서 보장됨
        let target = now
            .date()
            .and_hms_opt(u32::from(hour), u32::from(minute), 0)
            .unwrap_or(now);

        if target <= now {
            target + chrono::Duration::days(1)
        } else {
            target
        }
    }

    /// 스케줄링 루프를 실행합니다.
    ///
    /// 취소 토큰이 발화할 때까지 반복합니다.
    pub async fn run(self) {
        loop {
            let now = chrono::Local::now().naive_local();
            let target = Self::next_boundary(now, self.hour, self.minute);
            let wait = (target - now).to_std().unwrap_or(Duration::ZERO);

            tracing::debug!(
                target = %target,
                wait_secs = wait.as_secs(),
                "sleeping until next report boundary"
            );

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::debug!("report scheduler cancelled");
                    break;
                }
                _ = tokio::time::sleep(wait) => {
                    let report = self.generator.generate().await;
                    tracing::info!(
                        persisted = report.persisted_to.is_some(),
                        "scheduled daily report generated"
                    );
                }
            }
        }
    }
}
