//! 모니터 오케스트레이션 — 테일링/탐지/리포트의 전체 흐름을 관리합니다.
//!
//! [`SecurityMonitor`]는 core의 [`Pipeline`](logwarden_core::pipeline::Pipeline)
//! trait을 구현하여 데몬에서 start/stop/health_check 생명주기로 관리됩니다.
//!
//! # 내부 아키텍처
//! ```text
//! LogTailer(task) -> mpsc -> 탐지 루프(task): parse -> engine.handle
//! ReportScheduler(task): 일일 경계마다 리포트 생성
//! stop(): cancel -> 태스크 드레인 -> 최종 리포트
//! ```
//!
//! 두 타임라인(탐지, 리포트)은 동기화된 [`StatsAggregator`]로만 상태를
//! 공유합니다.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use logwarden_core::error::{LogwardenError, PipelineError};
use logwarden_core::metrics as m;
use logwarden_core::pipeline::{HealthStatus, Pipeline};

use crate::config::PipelineConfig;
use crate::engine::DetectionEngine;
use crate::error::MonitorError;
use crate::parser::LogLineParser;
use crate::report::ReportGenerator;
use crate::scheduler::ReportScheduler;
use crate::sink::AlertSink;
use crate::stats::StatsAggregator;
use crate::tailer::{LogTailer, TailerConfig};

/// 모니터 실행 상태
#[derive(Debug, Clone, PartialEq, Eq)]
enum MonitorState {
    /// 초기화됨, 아직 시작하지 않음
    Initialized,
    /// 실행 중
    Running,
    /// 정지됨
    Stopped,
}

/// 보안 모니터 — 전체 파이프라인의 오케스트레이터
pub struct SecurityMonitor {
    /// 모니터 설정
    config: PipelineConfig,
    /// 현재 상태
    state: MonitorState,
    /// 공유 세션 통계
    stats: Arc<StatsAggregator>,
    /// 공유 리포트 생성기
    report: Arc<ReportGenerator>,
    /// 종료 신호
    cancel: CancellationToken,
    /// 백그라운드 태스크 핸들
    tasks: Vec<tokio::task::JoinHandle<()>>,
    /// 콘솔 알림 출력 강제값 (None이면 터미널 자동 감지)
    console_alerts: Option<bool>,
}

impl SecurityMonitor {
    /// 현재 상태 이름을 반환합니다.
    pub fn state_name(&self) -> &str {
        match self.state {
            MonitorState::Initialized => "initialized",
            MonitorState::Running => "running",
            MonitorState::Stopped => "stopped",
        }
    }

    /// 공유 통계 핸들을 반환합니다.
    pub fn stats(&self) -> Arc<StatsAggregator> {
        self.stats.clone()
    }

    /// 공유 리포트 생성기 핸들을 반환합니다.
    pub fn report_generator(&self) -> Arc<ReportGenerator> {
        self.report.clone()
    }
}

impl Pipeline for SecurityMonitor {
    async fn start(&mut self) -> Result<(), LogwardenError> {
        if self.state == MonitorState::Running {
            return Err(PipelineError::AlreadyRunning.into());
        }
        if self.state == MonitorState::Stopped {
            // 테일링 시퀀스는 재시작되지 않음 — 새 모니터를 빌드해야 함
            return Err(PipelineError::InitFailed(
                "monitor cannot be restarted after stop".to_owned(),
            )
            .into());
        }

        tracing::info!("starting security monitor");

        // 1. 알림 싱크 오픈 (실패해도 콘솔 전용으로 동작)
        let sink = AlertSink::open(&self.config.alerts_path).await;
        let sink = match self.console_alerts {
            Some(console) => sink.with_console(console),
            None => sink,
        };

        // 2. 탐지 엔진 구성 (시그니처 컴파일 실패는 여기서 보고)
        let mut engine = DetectionEngine::new(&self.config.detection, sink, self.stats.clone())
            .map_err(LogwardenError::from)?;

        // 3. 테일러 오픈 — 초기 오픈 실패만이 치명적
        let (line_tx, mut line_rx) = mpsc::channel(self.config.channel_capacity);
        let tailer = LogTailer::open(
            TailerConfig {
                path: self.config.log_path.clone(),
                poll_interval: self.config.poll_interval,
                retry_interval: self.config.retry_interval,
                max_line_length: self.config.max_line_length,
            },
            line_tx,
            self.cancel.child_token(),
        )
        .await
        .map_err(LogwardenError::from)?;

        self.tasks.push(tokio::spawn(async move {
            if let Err(e) = tailer.run().await {
                tracing::error!(error = %e, "log tailer terminated");
            }
        }));

        // 4. 탐지 루프 — 수신한 라인을 로그 순서대로 하나씩 처리합니다.
        //    취소 시 테일러가 송신을 멈추고, 채널이 비워진 뒤 종료되므로
        //    수신된 라인은 유실되지 않습니다.
        let parser = LogLineParser::new();
        self.tasks.push(tokio::spawn(async move {
            while let Some(line) = line_rx.recv().await {
                let text = String::from_utf8_lossy(&line);
                match parser.parse(&text) {
                    Ok(event) => engine.handle(&event).await,
                    Err(e) => {
                        metrics::counter!(m::MONITOR_PARSE_ERRORS_TOTAL).increment(1);
                        tracing::debug!(error = %e, "skipping malformed line");
                    }
                }
            }
            tracing::debug!("detection loop drained");
        }));

        // 5. 리포트 스케줄러 — 탐지 루프와 독립된 타임라인
        let scheduler = ReportScheduler::new(
            self.report.clone(),
            self.config.report_hour,
            self.config.report_minute,
            self.cancel.child_token(),
        );
        self.tasks.push(tokio::spawn(scheduler.run()));

        self.state = MonitorState::Running;
        tracing::info!(
            log_path = %self.config.log_path.display(),
            alerts_path = %self.config.alerts_path.display(),
            "security monitor started"
        );
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), LogwardenError> {
        if self.state != MonitorState::Running {
            return Err(PipelineError::NotRunning.into());
        }

        tracing::info!("stopping security monitor");
        self.cancel.cancel();

        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "background task join failed");
            }
        }

        // 세션 마감 리포트 — 24시간 미만 세션도 리포트를 남김
        let report = self.report.generate().await;
        tracing::info!(
            persisted = report.persisted_to.is_some(),
            "final session report generated"
        );

        self.state = MonitorState::Stopped;
        tracing::info!("security monitor stopped");
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            MonitorState::Running => HealthStatus::Healthy,
            MonitorState::Initialized => HealthStatus::Unhealthy("not started".to_owned()),
            MonitorState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}

/// 보안 모니터 빌더
pub struct SecurityMonitorBuilder {
    config: PipelineConfig,
    console_alerts: Option<bool>,
}

impl SecurityMonitorBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            console_alerts: None,
        }
    }

    /// 모니터 설정을 지정합니다.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// 콘솔 알림 출력을 강제로 켜거나 끕니다.
    ///
    /// 지정하지 않으면 stdout이 터미널인지에 따라 자동 결정됩니다.
    pub fn console_alerts(mut self, console: bool) -> Self {
        self.console_alerts = Some(console);
        self
    }

    /// 모니터를 빌드합니다.
    pub fn build(self) -> Result<SecurityMonitor, MonitorError> {
        self.config.validate()?;

        let stats = Arc::new(StatsAggregator::new());
        let report = Arc::new(ReportGenerator::new(
            self.config.report_dir.clone(),
            stats.clone(),
        ));

        Ok(SecurityMonitor {
            config: self.config,
            state: MonitorState::Initialized,
            stats,
            report,
            cancel: CancellationToken::new(),
            tasks: Vec::new(),
            console_alerts: self.console_alerts,
        })
    }
}

impl Default for SecurityMonitorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
