//! 설정 관리 — logwarden.toml 파싱 및 런타임 설정
//!
//! [`LogwardenConfig`]는 모든 섹션의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선, 데몬에서 적용)
//! 2. 환경변수 (`LOGWARDEN_MONITOR_LOG_PATH=/var/log/app.log` 형식)
//! 3. 설정 파일 (`logwarden.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logwarden_core::error::LogwardenError> {
//! use logwarden_core::config::LogwardenConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LogwardenConfig::load("logwarden.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LogwardenConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LogwardenError};

/// Logwarden 통합 설정
///
/// `logwarden.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 컴포넌트는 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogwardenConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 감시 대상/출력 경로 설정
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// 탐지 규칙 설정
    #[serde(default)]
    pub detection: DetectionConfig,
    /// 리포트 생성 설정
    #[serde(default)]
    pub report: ReportConfig,
    /// 메트릭 노출 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl LogwardenConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LogwardenError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LogwardenError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogwardenError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogwardenError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LogwardenError> {
        toml::from_str(toml_str).map_err(|e| {
            LogwardenError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGWARDEN_{SECTION}_{FIELD}`
    /// 예: `LOGWARDEN_MONITOR_LOG_PATH=/var/log/app.log`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGWARDEN_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGWARDEN_GENERAL_LOG_FORMAT");

        // Monitor
        override_string(&mut self.monitor.log_path, "LOGWARDEN_MONITOR_LOG_PATH");
        override_string(
            &mut self.monitor.alerts_path,
            "LOGWARDEN_MONITOR_ALERTS_PATH",
        );
        override_u64(
            &mut self.monitor.poll_interval_ms,
            "LOGWARDEN_MONITOR_POLL_INTERVAL_MS",
        );
        override_u64(
            &mut self.monitor.retry_interval_ms,
            "LOGWARDEN_MONITOR_RETRY_INTERVAL_MS",
        );
        override_usize(
            &mut self.monitor.max_line_length,
            "LOGWARDEN_MONITOR_MAX_LINE_LENGTH",
        );
        override_usize(
            &mut self.monitor.channel_capacity,
            "LOGWARDEN_MONITOR_CHANNEL_CAPACITY",
        );

        // Detection
        override_u32(
            &mut self.detection.brute_force_threshold,
            "LOGWARDEN_DETECTION_BRUTE_FORCE_THRESHOLD",
        );
        override_u64(
            &mut self.detection.brute_force_window_secs,
            "LOGWARDEN_DETECTION_BRUTE_FORCE_WINDOW_SECS",
        );
        override_csv(
            &mut self.detection.protected_endpoints,
            "LOGWARDEN_DETECTION_PROTECTED_ENDPOINTS",
        );
        override_csv(
            &mut self.detection.failed_login_markers,
            "LOGWARDEN_DETECTION_FAILED_LOGIN_MARKERS",
        );

        // Report
        override_string(&mut self.report.output_dir, "LOGWARDEN_REPORT_OUTPUT_DIR");
        override_u8(&mut self.report.hour, "LOGWARDEN_REPORT_HOUR");
        override_u8(&mut self.report.minute, "LOGWARDEN_REPORT_MINUTE");

        // Metrics
        override_bool(&mut self.metrics.enabled, "LOGWARDEN_METRICS_ENABLED");
        override_string(
            &mut self.metrics.listen_addr,
            "LOGWARDEN_METRICS_LISTEN_ADDR",
        );
        override_u16(&mut self.metrics.port, "LOGWARDEN_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogwardenError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.monitor.log_path.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "monitor.log_path".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        if self.monitor.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "monitor.poll_interval_ms".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.monitor.max_line_length == 0 {
            return Err(ConfigError::InvalidValue {
                field: "monitor.max_line_length".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.monitor.channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "monitor.channel_capacity".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.detection.brute_force_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                field: "detection.brute_force_threshold".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.detection.brute_force_window_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "detection.brute_force_window_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        for signature in &self.detection.sql_signatures {
            if signature.label.is_empty() || signature.pattern.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "detection.sql_signatures".to_owned(),
                    reason: "signature label and pattern must not be empty".to_owned(),
                }
                .into());
            }
        }

        if self.report.hour >= 24 {
            return Err(ConfigError::InvalidValue {
                field: "report.hour".to_owned(),
                reason: "must be 0-23".to_owned(),
            }
            .into());
        }

        if self.report.minute >= 60 {
            return Err(ConfigError::InvalidValue {
                field: "report.minute".to_owned(),
                reason: "must be 0-59".to_owned(),
            }
            .into());
        }

        if self.metrics.enabled && self.metrics.endpoint != "/metrics" {
            return Err(ConfigError::InvalidValue {
                field: "metrics.endpoint".to_owned(),
                reason: "only '/metrics' is currently supported".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 감시 대상/출력 경로 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// 감시할 로그 파일 경로
    pub log_path: String,
    /// 알림 기록 파일 경로
    pub alerts_path: String,
    /// 신규 데이터 폴링 주기 (밀리초)
    pub poll_interval_ms: u64,
    /// 소스 유실 시 재시도 주기 (밀리초)
    pub retry_interval_ms: u64,
    /// 최대 라인 길이 (바이트), 초과분은 스킵
    pub max_line_length: usize,
    /// 테일러 -> 탐지 루프 채널 용량
    pub channel_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            log_path: "application.log".to_owned(),
            alerts_path: "security_alerts.log".to_owned(),
            poll_interval_ms: 100,
            retry_interval_ms: 5000,
            max_line_length: 64 * 1024, // 64KB
            channel_capacity: 1024,
        }
    }
}

/// SQL 인젝션 시그니처 (라벨 + 대소문자 무시 정규식)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlSignature {
    /// 사람이 읽는 시그니처 이름 (알림 설명에 표시)
    pub label: String,
    /// 정규식 패턴
    pub pattern: String,
}

impl SqlSignature {
    fn new(label: &str, pattern: &str) -> Self {
        Self {
            label: label.to_owned(),
            pattern: pattern.to_owned(),
        }
    }
}

/// 탐지 규칙 설정
///
/// 시작 시 한 번 로드되어 프로세스 수명 동안 불변입니다.
/// 시그니처 목록은 순서가 의미를 가집니다 (첫 매치 우선).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// brute force 판정 임계값 (윈도우 내 실패 횟수)
    pub brute_force_threshold: u32,
    /// brute force 슬라이딩 윈도우 길이 (초)
    pub brute_force_window_secs: u64,
    /// 로그인 실패로 간주하는 메시지 마커
    pub failed_login_markers: Vec<String>,
    /// SQL 인젝션 시그니처 목록 (순서대로 평가)
    pub sql_signatures: Vec<SqlSignature>,
    /// 보호 엔드포인트 경로 접두사
    pub protected_endpoints: Vec<String>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            brute_force_threshold: 5,
            brute_force_window_secs: 60,
            failed_login_markers: vec!["Failed login attempt".to_owned()],
            sql_signatures: vec![
                SqlSignature::new("tautology", r"'.*OR.*1=1"),
                SqlSignature::new("union-select", r"UNION.*SELECT.*FROM"),
                SqlSignature::new("drop-table", r"DROP TABLE.*--"),
                SqlSignature::new("comment-terminator", r"'.*--"),
                SqlSignature::new("insert-comment", r"INSERT.*INTO.*--"),
                SqlSignature::new("update-comment", r"UPDATE.*SET.*--"),
            ],
            protected_endpoints: vec![
                "/admin".to_owned(),
                "/api/delete".to_owned(),
                "/api/users".to_owned(),
                "/config".to_owned(),
                "/backup".to_owned(),
            ],
        }
    }
}

/// 리포트 생성 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// 리포트 파일 출력 디렉토리
    pub output_dir: String,
    /// 일일 리포트 생성 시각 (시)
    pub hour: u8,
    /// 일일 리포트 생성 시각 (분)
    pub minute: u8,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: ".".to_owned(),
            hour: 23,
            minute: 59,
        }
    }
}

/// 메트릭 노출 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prometheus 엔드포인트 활성화 여부
    pub enabled: bool,
    /// 리슨 주소
    pub listen_addr: String,
    /// 리슨 포트
    pub port: u16,
    /// 스크레이프 엔드포인트 경로
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9195,
            endpoint: "/metrics".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_u8(target: &mut u8, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u8>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u8 from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}
