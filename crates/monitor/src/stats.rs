//! 세션 누적 통계
//!
//! [`StatsAggregator`]는 탐지 경로가 기록하고 리포트 경로가 읽는
//! 프로세스 수명 통계입니다. 변경은 이 타입이 제공하는 증가 연산으로만
//! 가능하며, 읽기는 일관된 스냅샷으로만 제공됩니다.
//!
//! 카운터는 atomic, 분류 맵은 mutex로 보호되어 탐지 태스크의 기록과
//! 스케줄러 태스크의 읽기가 안전하게 겹칠 수 있습니다.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDateTime;
use serde::Serialize;

use logwarden_core::metrics as m;
use logwarden_core::types::AlertKind;

/// 세션 통계 집계기
#[derive(Debug)]
pub struct StatsAggregator {
    /// 세션 시작 시각
    session_start: NaiveDateTime,
    /// 처리된 이벤트 수
    total_requests: AtomicU64,
    /// 발생한 인시던트 수
    total_incidents: AtomicU64,
    /// 종류별 인시던트 수
    incidents_by_kind: Mutex<HashMap<AlertKind, u64>>,
    /// 출발지 주소별 인시던트 수
    incidents_by_source: Mutex<HashMap<String, u64>>,
}

impl StatsAggregator {
    /// 현재 시각을 세션 시작으로 하는 집계기를 생성합니다.
    pub fn new() -> Self {
        Self::starting_at(chrono::Local::now().naive_local())
    }

    /// 지정된 세션 시작 시각으로 집계기를 생성합니다 (테스트용).
    pub fn starting_at(session_start: NaiveDateTime) -> Self {
        Self {
            session_start,
            total_requests: AtomicU64::new(0),
            total_incidents: AtomicU64::new(0),
            incidents_by_kind: Mutex::new(HashMap::new()),
            incidents_by_source: Mutex::new(HashMap::new()),
        }
    }

    /// 처리된 이벤트를 1 증가시킵니다.
    pub fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// 인시던트를 기록합니다 (종류별/출발지별 분류 포함).
    pub fn record_incident(&self, kind: AlertKind, source_address: &str) {
        self.total_incidents.fetch_add(1, Ordering::Relaxed);

        *self
            .incidents_by_kind
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind)
            .or_insert(0) += 1;

        *self
            .incidents_by_source
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(source_address.to_owned())
            .or_insert(0) += 1;

        metrics::counter!(m::MONITOR_ALERTS_TOTAL, m::LABEL_KIND => kind.as_str()).increment(1);
    }

    /// 처리된 이벤트 수를 반환합니다.
    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// 인시던트 수를 반환합니다.
    pub fn total_incidents(&self) -> u64 {
        self.total_incidents.load(Ordering::Relaxed)
    }

    /// 현재 통계의 일관된 스냅샷을 만듭니다.
    ///
    /// 분류 목록은 카운트 내림차순, 동률이면 키 오름차순으로 정렬되어
    /// 리포트 출력이 결정적입니다.
    pub fn snapshot(&self) -> StatsSnapshot {
        let by_kind = {
            let map = self
                .incidents_by_kind
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let mut entries: Vec<(AlertKind, u64)> =
                map.iter().map(|(k, v)| (*k, *v)).collect();
            entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));
            entries
        };

        let by_source = {
            let map = self
                .incidents_by_source
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let mut entries: Vec<(String, u64)> =
                map.iter().map(|(k, v)| (k.clone(), *v)).collect();
            entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            entries
        };

        StatsSnapshot {
            session_start: self.session_start,
            generated_at: chrono::Local::now().naive_local(),
            total_requests: self.total_requests(),
            total_incidents: self.total_incidents(),
            incidents_by_kind: by_kind,
            incidents_by_source: by_source,
        }
    }
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// 통계 스냅샷 — 리포트 렌더링의 입력
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    /// 세션 시작 시각
    pub session_start: NaiveDateTime,
    /// 스냅샷 생성 시각
    pub generated_at: NaiveDateTime,
    /// 처리된 이벤트 수
    pub total_requests: u64,
    /// 인시던트 수
    pub total_incidents: u64,
    /// 종류별 인시던트 (카운트 내림차순)
    pub incidents_by_kind: Vec<(AlertKind, u64)>,
    /// 출발지별 인시던트 (카운트 내림차순)
    pub incidents_by_source: Vec<(String, u64)>,
}

impl StatsSnapshot {
    /// 세션 경과 시간을 반환합니다.
    pub fn session_duration(&self) -> chrono::Duration {
        self.generated_at - self.session_start
    }
}
