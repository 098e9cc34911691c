//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입
//!
//! 탐지 파이프라인과 리포트 경로가 공유하는 데이터 구조를 정의합니다.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 로그 레벨
///
/// 감시 대상 애플리케이션이 기록하는 레벨 토큰입니다.
/// 프로듀서는 INFO / WARNING / ERROR 세 가지만 사용합니다.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum LogLevel {
    /// 정보성 이벤트
    #[default]
    Info,
    /// 경고
    Warning,
    /// 에러
    Error,
}

impl LogLevel {
    /// 문자열에서 로그 레벨을 파싱합니다.
    ///
    /// 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Some(Self::Info),
            "warning" | "warn" => Some(Self::Warning),
            "error" | "err" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// 파싱된 로그 이벤트
///
/// 원시 로그 한 줄에서 추출한 구조화된 레코드입니다.
/// 파싱 후에는 불변이며, 탐지 패스가 소비한 뒤 폐기됩니다
/// (`raw`는 알림에 포함될 때만 보존됩니다).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    /// 이벤트 발생 시각 (프로듀서 기준 로컬 시각, 오프셋 없음)
    pub timestamp: NaiveDateTime,
    /// 로그 레벨
    pub level: LogLevel,
    /// 출발지 주소 (`[IP: ...]` 토큰에서 추출)
    pub source_address: String,
    /// 메시지 본문 (내부의 `" - "`는 더 이상 분리하지 않음)
    pub message: String,
    /// 원본 라인 (trim 적용)
    pub raw: String,
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}: {}",
            self.timestamp, self.level, self.source_address, self.message,
        )
    }
}

/// 알림 종류
///
/// 탐지 가능한 공격 패턴의 분류입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertKind {
    /// 크리덴셜 brute force (윈도우 내 반복 로그인 실패)
    BruteForce,
    /// SQL 인젝션 페이로드
    SqlInjection,
    /// 보호 엔드포인트에 대한 거부된 접근 (403)
    UnauthorizedAccess,
    /// 보호 엔드포인트 스캐닝 (404)
    EndpointScanning,
}

impl AlertKind {
    /// 알림 레코드와 리포트에 사용되는 정규 표기를 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BruteForce => "BRUTE_FORCE",
            Self::SqlInjection => "SQL_INJECTION",
            Self::UnauthorizedAccess => "UNAUTHORIZED_ACCESS",
            Self::EndpointScanning => "ENDPOINT_SCANNING",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 보안 알림
///
/// 탐지된 인시던트당 정확히 한 번 생성되며, 생성 후 변경되지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// 알림 고유 ID (UUID v4)
    pub id: String,
    /// 알림 발생 시각
    pub timestamp: NaiveDateTime,
    /// 알림 종류
    pub kind: AlertKind,
    /// 관련 출발지 주소
    pub source_address: String,
    /// 상세 설명
    pub description: String,
    /// 알림을 유발한 원본 로그 라인
    pub source_event_raw: String,
}

impl Alert {
    /// 현재 시각으로 새 알림을 생성합니다.
    pub fn new(
        kind: AlertKind,
        source_address: impl Into<String>,
        description: impl Into<String>,
        source_event_raw: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Local::now().naive_local(),
            kind,
            source_address: source_address.into(),
            description: description.into(),
            source_event_raw: source_event_raw.into(),
        }
    }

    /// 알림 파일에 기록되는 한 줄 레코드를 렌더링합니다.
    ///
    /// 형식:
    /// `<ISO-8601> - ALERT - <KIND> - [IP: <addr>] - <description> - Original log: <raw>`
    pub fn to_record_line(&self) -> String {
        format!(
            "{} - ALERT - {} - [IP: {}] - {} - Original log: {}",
            self.timestamp.format("%Y-%m-%dT%H:%M:%S%.6f"),
            self.kind,
            self.source_address,
            self.description,
            self.source_event_raw,
        )
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} from {}",
            self.kind, self.description, self.source_address,
        )
    }
}
