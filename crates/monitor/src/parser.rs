//! 로그 라인 파서
//!
//! 감시 대상 애플리케이션이 기록하는 라인 형식을 파싱합니다:
//!
//! ```text
//! <ISO-8601 timestamp> - <LEVEL> - [IP: <address>] - <message>
//! ```
//!
//! 메시지 본문은 `" - "`를 포함할 수 있으므로 앞의 세 구분자만 소비하고
//! 나머지는 그대로 메시지로 취급합니다.

use chrono::NaiveDateTime;

use logwarden_core::types::{LogEvent, LogLevel};

use crate::error::MonitorError;

/// 주소 토큰 접두사/접미사
const ADDRESS_PREFIX: &str = "[IP: ";
const ADDRESS_SUFFIX: char = ']';

/// 타임스탬프 형식 후보 (프로듀서는 `T` 구분자를 쓰지만
/// 공백 구분자도 ISO-8601 변형으로 허용)
const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// 로그 라인 파서
///
/// 상태가 없으며 라인 단위로 호출됩니다. 형식에 맞지 않는 라인은
/// 문제가 된 원본을 보존한 typed 에러로 반환되고, 호출자는 해당 라인을
/// 스킵합니다 (스트림은 중단되지 않음).
#[derive(Debug, Default)]
pub struct LogLineParser;

impl LogLineParser {
    /// 새 파서를 생성합니다.
    pub fn new() -> Self {
        Self
    }

    /// 원시 로그 라인을 파싱합니다.
    ///
    /// # 실패 조건
    /// - `" - "` 구분 필드가 4개 미만
    /// - 타임스탬프 파싱 불가
    /// - `[IP: <address>]` 토큰 누락 또는 불일치
    pub fn parse(&self, raw_line: &str) -> Result<LogEvent, MonitorError> {
        let line = raw_line.trim();

        let mut parts = line.splitn(4, " - ");
        let (Some(timestamp_str), Some(level_str), Some(address_part), Some(message)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(MonitorError::Parse {
                reason: "expected 4 ' - ' delimited fields".to_owned(),
                line: line.to_owned(),
            });
        };

        let timestamp = parse_timestamp(timestamp_str).ok_or_else(|| MonitorError::Parse {
            reason: format!("unparsable timestamp '{timestamp_str}'"),
            line: line.to_owned(),
        })?;

        // 레벨 토큰은 파싱 실패 조건이 아닙니다. 미지의 토큰은 Info로 간주합니다.
        let level = LogLevel::from_str_loose(level_str).unwrap_or_default();

        let source_address =
            parse_address(address_part).ok_or_else(|| MonitorError::Parse {
                reason: format!("missing or malformed address token in '{address_part}'"),
                line: line.to_owned(),
            })?;

        Ok(LogEvent {
            timestamp,
            level,
            source_address: source_address.to_owned(),
            message: message.to_owned(),
            raw: line.to_owned(),
        })
    }
}

/// ISO-8601 타임스탬프를 파싱합니다 (소수점 초 선택).
fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// `[IP: <address>]` 토큰에서 주소를 추출합니다.
///
/// 주소는 IPv4/IPv6 표기에 쓰이는 문자만 허용합니다.
fn parse_address(part: &str) -> Option<&str> {
    let start = part.find(ADDRESS_PREFIX)? + ADDRESS_PREFIX.len();
    let rest = &part[start..];
    let end = rest.find(ADDRESS_SUFFIX)?;
    let address = &rest[..end];

    if address.is_empty()
        || !address
            .chars()
            .all(|c| c.is_ascii_hexdigit() || c == '.' || c == ':')
    {
        return None;
    }

    Some(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str =
        "2024-01-15T10:23:45.123456 - WARNING - [IP: 203.0.113.7] - Failed login attempt";

    #[test]
    fn parses_documented_line() {
        let parser = LogLineParser::new();
        let event = parser.parse(SAMPLE).unwrap();
        assert_eq!(event.level, LogLevel::Warning);
        assert_eq!(event.source_address, "203.0.113.7");
        assert_eq!(event.message, "Failed login attempt");
        assert_eq!(event.raw, SAMPLE);
        assert_eq!(event.timestamp.format("%Y-%m-%d").to_string(), "2024-01-15");
    }

    #[test]
    fn message_may_contain_delimiter() {
        let parser = LogLineParser::new();
        let line = "2024-01-15T10:23:45 - INFO - [IP: 10.0.0.5] - Login attempt - SQL: SELECT * FROM users WHERE username = 'admin' OR '1'='1'";
        let event = parser.parse(line).unwrap();
        assert_eq!(
            event.message,
            "Login attempt - SQL: SELECT * FROM users WHERE username = 'admin' OR '1'='1'"
        );
    }

    #[test]
    fn timestamp_without_fraction() {
        let parser = LogLineParser::new();
        let event = parser
            .parse("2024-01-15T10:23:45 - INFO - [IP: 10.0.0.5] - ok")
            .unwrap();
        assert_eq!(event.timestamp.format("%H:%M:%S").to_string(), "10:23:45");
    }

    #[test]
    fn timestamp_with_space_separator() {
        let parser = LogLineParser::new();
        let event = parser
            .parse("2024-01-15 10:23:45.5 - INFO - [IP: 10.0.0.5] - ok")
            .unwrap();
        assert_eq!(event.source_address, "10.0.0.5");
    }

    #[test]
    fn too_few_fields_is_parse_error() {
        let parser = LogLineParser::new();
        let result = parser.parse("2024-01-15T10:23:45 - INFO - no address here");
        match result {
            Err(MonitorError::Parse { line, .. }) => {
                assert!(line.contains("no address here"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn bad_timestamp_is_parse_error() {
        let parser = LogLineParser::new();
        let result = parser.parse("yesterday - INFO - [IP: 10.0.0.5] - message");
        assert!(matches!(result, Err(MonitorError::Parse { .. })));
    }

    #[test]
    fn missing_address_token_is_parse_error() {
        let parser = LogLineParser::new();
        let result = parser.parse("2024-01-15T10:23:45 - INFO - [PID: 42] - message");
        assert!(matches!(result, Err(MonitorError::Parse { .. })));
    }

    #[test]
    fn non_address_token_is_parse_error() {
        let parser = LogLineParser::new();
        let result = parser.parse("2024-01-15T10:23:45 - INFO - [IP: unknown] - message");
        assert!(matches!(result, Err(MonitorError::Parse { .. })));
    }

    #[test]
    fn unknown_level_falls_back_to_info() {
        let parser = LogLineParser::new();
        let event = parser
            .parse("2024-01-15T10:23:45 - NOTICE - [IP: 10.0.0.5] - message")
            .unwrap();
        assert_eq!(event.level, LogLevel::Info);
    }

    #[test]
    fn level_is_case_insensitive() {
        let parser = LogLineParser::new();
        let event = parser
            .parse("2024-01-15T10:23:45 - error - [IP: 10.0.0.5] - message")
            .unwrap();
        assert_eq!(event.level, LogLevel::Error);
    }

    #[test]
    fn trailing_newline_is_trimmed() {
        let parser = LogLineParser::new();
        let event = parser
            .parse("2024-01-15T10:23:45 - INFO - [IP: 10.0.0.5] - message\n")
            .unwrap();
        assert_eq!(event.raw, "2024-01-15T10:23:45 - INFO - [IP: 10.0.0.5] - message");
        assert_eq!(event.message, "message");
    }

    #[test]
    fn ipv6_address_accepted() {
        let parser = LogLineParser::new();
        let event = parser
            .parse("2024-01-15T10:23:45 - INFO - [IP: ::1] - message")
            .unwrap();
        assert_eq!(event.source_address, "::1");
    }
}
