//! 모니터 파이프라인 설정
//!
//! [`PipelineConfig`]는 core 설정의 `[monitor]`, `[detection]`, `[report]`
//! 섹션을 모아 파이프라인이 실제로 사용하는 형태로 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use logwarden_core::config::LogwardenConfig;
//! use logwarden_monitor::config::PipelineConfig;
//!
//! let core_config = LogwardenConfig::default();
//! let config = PipelineConfig::from_core(&core_config);
//! ```

use std::path::PathBuf;
use std::time::Duration;

use logwarden_core::config::{DetectionConfig, LogwardenConfig};

use crate::error::MonitorError;

/// 모니터 파이프라인 설정
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// 감시할 로그 파일 경로
    pub log_path: PathBuf,
    /// 알림 기록 파일 경로
    pub alerts_path: PathBuf,
    /// 리포트 출력 디렉토리
    pub report_dir: PathBuf,
    /// 신규 데이터 폴링 주기
    pub poll_interval: Duration,
    /// 소스 유실 시 재시도 주기
    pub retry_interval: Duration,
    /// 최대 라인 길이 (바이트)
    pub max_line_length: usize,
    /// 테일러 -> 탐지 루프 채널 용량
    pub channel_capacity: usize,
    /// 일일 리포트 생성 시각 (시)
    pub report_hour: u8,
    /// 일일 리포트 생성 시각 (분)
    pub report_minute: u8,
    /// 탐지 규칙 설정
    pub detection: DetectionConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_core(&LogwardenConfig::default())
    }
}

impl PipelineConfig {
    /// core 설정에서 모니터 설정을 생성합니다.
    pub fn from_core(core: &LogwardenConfig) -> Self {
        Self {
            log_path: PathBuf::from(&core.monitor.log_path),
            alerts_path: PathBuf::from(&core.monitor.alerts_path),
            report_dir: PathBuf::from(&core.report.output_dir),
            poll_interval: Duration::from_millis(core.monitor.poll_interval_ms),
            retry_interval: Duration::from_millis(core.monitor.retry_interval_ms),
            max_line_length: core.monitor.max_line_length,
            channel_capacity: core.monitor.channel_capacity,
            report_hour: core.report.hour,
            report_minute: core.report.minute,
            detection: core.detection.clone(),
        }
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// core 설정의 `validate()`와 같은 규칙을 적용합니다. 빌더로 직접
    /// 조립된 설정도 같은 불변식을 지키도록 합니다.
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.log_path.as_os_str().is_empty() {
            return Err(MonitorError::Config {
                field: "log_path".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.poll_interval.is_zero() {
            return Err(MonitorError::Config {
                field: "poll_interval".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.max_line_length == 0 {
            return Err(MonitorError::Config {
                field: "max_line_length".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.channel_capacity == 0 {
            return Err(MonitorError::Config {
                field: "channel_capacity".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.detection.brute_force_threshold == 0 {
            return Err(MonitorError::Config {
                field: "detection.brute_force_threshold".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.detection.brute_force_window_secs == 0 {
            return Err(MonitorError::Config {
                field: "detection.brute_force_window_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.report_hour >= 24 {
            return Err(MonitorError::Config {
                field: "report_hour".to_owned(),
                reason: "must be 0-23".to_owned(),
            });
        }

        if self.report_minute >= 60 {
            return Err(MonitorError::Config {
                field: "report_minute".to_owned(),
                reason: "must be 0-59".to_owned(),
            });
        }

        Ok(())
    }
}

/// 모니터 설정 빌더
///
/// 테스트와 임베딩 환경에서 개별 필드를 오버라이드할 때 사용합니다.
#[derive(Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 감시할 로그 파일 경로를 설정합니다.
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log_path = path.into();
        self
    }

    /// 알림 기록 파일 경로를 설정합니다.
    pub fn alerts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.alerts_path = path.into();
        self
    }

    /// 리포트 출력 디렉토리를 설정합니다.
    pub fn report_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.report_dir = dir.into();
        self
    }

    /// 폴링 주기를 설정합니다.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// 재시도 주기를 설정합니다.
    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.config.retry_interval = interval;
        self
    }

    /// 리포트 생성 시각을 설정합니다.
    pub fn report_time(mut self, hour: u8, minute: u8) -> Self {
        self.config.report_hour = hour;
        self.config.report_minute = minute;
        self
    }

    /// 탐지 규칙 설정을 교체합니다.
    pub fn detection(mut self, detection: DetectionConfig) -> Self {
        self.config.detection = detection;
        self
    }

    /// 설정을 검증하고 `PipelineConfig`를 생성합니다.
    pub fn build(self) -> Result<PipelineConfig, MonitorError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
