//! 모니터 파이프라인 에러 타입
//!
//! [`MonitorError`]는 탐지 파이프라인 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<MonitorError> for LogwardenError` 변환이 구현되어 있어
//! 데몬 경계에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use logwarden_core::error::{LogwardenError, PipelineError};

/// 모니터 도메인 에러
///
/// 파싱, 테일링, 알림 기록, 리포트 저장 등 파이프라인 내부의
/// 모든 에러 상황을 포괄합니다.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// 로그 라인 파싱 실패 — 문제가 된 원본 라인을 보존합니다
    #[error("parse error: {reason}: {line:?}")]
    Parse {
        /// 실패 사유
        reason: String,
        /// 문제가 된 원본 라인
        line: String,
    },

    /// 로그 소스가 존재하지 않음 (초기 오픈 시점)
    #[error("log source absent: {path}")]
    SourceAbsent {
        /// 소스 경로
        path: String,
    },

    /// 테일링 중 소스 접근 실패
    #[error("tail error: {path}: {reason}")]
    Tail {
        /// 소스 경로
        path: String,
        /// 에러 사유
        reason: String,
    },

    /// 유효하지 않은 탐지 시그니처
    #[error("invalid signature '{label}': {reason}")]
    Pattern {
        /// 시그니처 라벨
        label: String,
        /// 에러 사유
        reason: String,
    },

    /// 알림 기록 실패
    #[error("alert sink error: {path}: {reason}")]
    Sink {
        /// 알림 파일 경로
        path: String,
        /// 에러 사유
        reason: String,
    },

    /// 리포트 저장 실패
    #[error("report error: {path}: {reason}")]
    Report {
        /// 리포트 파일 경로
        path: String,
        /// 에러 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 채널 통신 에러
    #[error("channel error: {0}")]
    Channel(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 정규식 컴파일 에러
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl From<MonitorError> for LogwardenError {
    fn from(err: MonitorError) -> Self {
        LogwardenError::Pipeline(PipelineError::InitFailed(err.to_string()))
    }
}
