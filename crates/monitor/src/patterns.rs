//! 탐지 패턴 분류기 — SQL 인젝션 시그니처와 보호 엔드포인트
//!
//! [`PatternMatcher`]는 시작 시 시그니처 정규식을 한 번만 컴파일하여
//! 매칭 시 재컴파일 오버헤드를 제거합니다. 시그니처 목록은 순서대로
//! 평가되며 첫 매치가 우선합니다 — 의도한 탐지가 가려지지 않도록
//! 순서를 정하는 것은 설정 작성자의 책임입니다.

use regex::{Regex, RegexBuilder};

use logwarden_core::config::DetectionConfig;
use logwarden_core::types::AlertKind;

use crate::error::MonitorError;

/// 접근 거부(403) 판정 마커
const DENIED_MARKERS: &[&str] = &["403", "Access denied"];

/// 미존재(404) 판정 마커
const NOT_FOUND_MARKER: &str = "404";

/// 컴파일된 SQL 인젝션 시그니처
#[derive(Debug)]
struct CompiledSignature {
    /// 사람이 읽는 시그니처 이름 (알림 설명에 표시)
    label: String,
    /// 대소문자 무시로 컴파일된 정규식
    regex: Regex,
}

/// 패턴 분류기
///
/// 불변 [`DetectionConfig`]에서 생성되어 프로세스 수명 동안 변경되지
/// 않습니다.
#[derive(Debug)]
pub struct PatternMatcher {
    /// 순서가 의미를 갖는 시그니처 목록
    signatures: Vec<CompiledSignature>,
    /// 보호 엔드포인트 경로 접두사
    protected_endpoints: Vec<String>,
}

impl PatternMatcher {
    /// 탐지 설정에서 분류기를 생성합니다.
    ///
    /// 시그니처 정규식은 여기서 전부 컴파일됩니다. 잘못된 패턴은
    /// 해당 시그니처의 라벨과 함께 에러로 보고됩니다.
    pub fn from_config(config: &DetectionConfig) -> Result<Self, MonitorError> {
        let mut signatures = Vec::with_capacity(config.sql_signatures.len());
        for signature in &config.sql_signatures {
            let regex = RegexBuilder::new(&signature.pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| MonitorError::Pattern {
                    label: signature.label.clone(),
                    reason: e.to_string(),
                })?;
            signatures.push(CompiledSignature {
                label: signature.label.clone(),
                regex,
            });
        }

        Ok(Self {
            signatures,
            protected_endpoints: config.protected_endpoints.clone(),
        })
    }

    /// 메시지를 SQL 인젝션 시그니처에 대해 분류합니다.
    ///
    /// 첫 번째로 매칭된 시그니처의 라벨을 반환합니다.
    pub fn classify_injection(&self, message: &str) -> Option<&str> {
        self.signatures
            .iter()
            .find(|s| s.regex.is_match(message))
            .map(|s| s.label.as_str())
    }

    /// 메시지를 보호 엔드포인트 접근에 대해 분류합니다.
    ///
    /// 메시지에 포함된 첫 번째 보호 접두사에 대해, 거부(403) 마커가 있으면
    /// `UnauthorizedAccess`, 미존재(404) 마커가 있으면 `EndpointScanning`을
    /// 반환합니다. 두 마커 모두 없으면(예: 200 응답) 분류하지 않습니다.
    pub fn classify_endpoint_access(&self, message: &str) -> Option<(&str, AlertKind)> {
        let endpoint = self
            .protected_endpoints
            .iter()
            .find(|prefix| message.contains(prefix.as_str()))?;

        if DENIED_MARKERS.iter().any(|m| message.contains(m)) {
            return Some((endpoint, AlertKind::UnauthorizedAccess));
        }
        if message.contains(NOT_FOUND_MARKER) {
            return Some((endpoint, AlertKind::EndpointScanning));
        }
        None
    }

    /// 로드된 시그니처 수를 반환합니다.
    pub fn signature_count(&self) -> usize {
        self.signatures.len()
    }

    /// 보호 엔드포인트 수를 반환합니다.
    pub fn endpoint_count(&self) -> usize {
        self.protected_endpoints.len()
    }
}
