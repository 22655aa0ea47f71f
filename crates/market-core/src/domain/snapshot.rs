//! 지표 스냅샷 및 히스토리 타입.
//!
//! 스냅샷은 수집 주기마다 한 번 추가되는 append-only 행입니다.
//! 갱신되지 않으며, 같은 타임스탬프를 가진 행이 여럿일 수 있습니다.
//! 소비자는 항상 생성 시각(`created_at`, 동률이면 `id`) 기준 최신 행을 선택합니다.

use chrono::{DateTime, Duration, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::indicator::IndicatorKind;

/// 저장된 지표 스냅샷 행.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub btc_dominance: Option<f64>,
    pub kimchi_premium: Option<f64>,
    pub dollar_index: Option<f64>,
    pub btc_price: Option<f64>,
    pub btc_change_24h: Option<f64>,
    pub crypto_prices: Option<serde_json::Value>,
    pub collection_source: String,
    pub api_health: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl IndicatorSnapshot {
    /// 지정한 지표 컬럼 값.
    pub fn indicator(&self, kind: IndicatorKind) -> Option<f64> {
        match kind {
            IndicatorKind::BtcDominance => self.btc_dominance,
            IndicatorKind::KimchiPremium => self.kimchi_premium,
            IndicatorKind::DollarIndex => self.dollar_index,
        }
    }

    /// `now` 기준 경과 시간.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.created_at
    }

    /// 생성 후 `max_age` 이내인지 확인.
    pub fn is_fresh(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        self.age(now) <= max_age
    }
}

/// 저장 전 스냅샷 (id/created_at은 저장소가 부여).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSnapshot {
    pub timestamp: DateTime<Utc>,
    pub btc_dominance: Option<f64>,
    pub kimchi_premium: Option<f64>,
    pub dollar_index: Option<f64>,
    pub btc_price: Option<f64>,
    pub btc_change_24h: Option<f64>,
    pub crypto_prices: Option<serde_json::Value>,
    pub collection_source: String,
    pub api_health: ApiHealth,
}

impl NewSnapshot {
    /// 저장소가 부여한 id와 생성 시각으로 완성된 행을 만듭니다.
    pub fn into_snapshot(self, id: i64, created_at: DateTime<Utc>) -> IndicatorSnapshot {
        IndicatorSnapshot {
            id,
            timestamp: self.timestamp,
            btc_dominance: self.btc_dominance,
            kimchi_premium: self.kimchi_premium,
            dollar_index: self.dollar_index,
            btc_price: self.btc_price,
            btc_change_24h: self.btc_change_24h,
            crypto_prices: self.crypto_prices,
            collection_source: self.collection_source,
            api_health: self.api_health.to_json(),
            created_at,
        }
    }
}

/// 업스트림 소스 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    Ok,
    Failed,
}

impl SourceStatus {
    pub fn from_present<T>(value: &Option<T>) -> Self {
        if value.is_some() {
            SourceStatus::Ok
        } else {
            SourceStatus::Failed
        }
    }
}

/// 수집 주기별 소스 상태 맵 (`{"coingecko": "ok", ...}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiHealth(pub BTreeMap<String, SourceStatus>);

impl ApiHealth {
    pub fn new() -> Self {
        Self::default()
    }

    /// 소스 상태를 기록합니다.
    pub fn record(&mut self, source: impl Into<String>, status: SourceStatus) -> &mut Self {
        self.0.insert(source.into(), status);
        self
    }

    /// 실패한 소스 수.
    pub fn failed_count(&self) -> usize {
        self.0.values().filter(|s| **s == SourceStatus::Failed).count()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.0).unwrap_or(serde_json::Value::Null)
    }
}

/// 차트용 시계열 포인트.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl HistoryPoint {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }

    /// 오늘 00:00 UTC에 찍힌 단일 포인트.
    pub fn today(value: f64) -> Self {
        let midnight = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();
        Self::new(midnight, value)
    }
}

/// 조회 기간 상한 (일). CLI 입력이 이보다 크면 이 값으로 제한합니다.
pub const MAX_LOOKBACK_DAYS: i64 = 365 * 100;

/// 조회 기간 상한 (시간).
pub const MAX_LOOKBACK_HOURS: i64 = MAX_LOOKBACK_DAYS * 24;

/// `now`에서 `hours`시간 전 시각.
///
/// 기간은 1시간 이상 [`MAX_LOOKBACK_HOURS`] 이하로 제한되므로 어떤 입력에도 패닉하지 않습니다.
pub fn lookback_start(now: DateTime<Utc>, hours: i64) -> DateTime<Utc> {
    let hours = hours.clamp(1, MAX_LOOKBACK_HOURS);
    TimeDelta::try_hours(hours)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// `now`에서 `days`일 전 시각. 범위 제한은 [`lookback_start`]와 같습니다.
pub fn lookback_start_days(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    let hours = days.max(1).checked_mul(24).unwrap_or(MAX_LOOKBACK_HOURS);
    lookback_start(now, hours)
}

/// 기간 내 지표 통계.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorStats {
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

impl IndicatorStats {
    /// 값 목록으로 통계를 계산합니다. 비어 있으면 `None`.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let sum: f64 = values.iter().sum();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            average: sum / values.len() as f64,
            min,
            max,
            count: values.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_at(created_at: DateTime<Utc>) -> IndicatorSnapshot {
        NewSnapshot {
            timestamp: created_at,
            btc_dominance: Some(54.23),
            kimchi_premium: None,
            dollar_index: Some(104.12),
            btc_price: Some(95_420.5),
            btc_change_24h: None,
            crypto_prices: None,
            collection_source: "test".to_string(),
            api_health: ApiHealth::new(),
        }
        .into_snapshot(1, created_at)
    }

    #[test]
    fn test_freshness_boundary() {
        let now = Utc::now();
        let max_age = Duration::minutes(30);

        assert!(snapshot_at(now - Duration::minutes(29)).is_fresh(now, max_age));
        assert!(snapshot_at(now - Duration::minutes(30)).is_fresh(now, max_age));
        assert!(!snapshot_at(now - Duration::minutes(31)).is_fresh(now, max_age));
    }

    #[test]
    fn test_indicator_column_access() {
        let s = snapshot_at(Utc::now());
        assert_eq!(s.indicator(IndicatorKind::BtcDominance), Some(54.23));
        assert_eq!(s.indicator(IndicatorKind::KimchiPremium), None);
        assert_eq!(s.indicator(IndicatorKind::DollarIndex), Some(104.12));
    }

    #[test]
    fn test_api_health_json() {
        let mut health = ApiHealth::new();
        health
            .record("coingecko", SourceStatus::Ok)
            .record("upbit", SourceStatus::Failed);

        assert_eq!(health.failed_count(), 1);
        assert_eq!(
            health.to_json(),
            serde_json::json!({"coingecko": "ok", "upbit": "failed"})
        );
    }

    #[test]
    fn test_lookback_start() {
        let now = Utc::now();

        assert_eq!(lookback_start(now, 24), now - Duration::hours(24));
        assert_eq!(lookback_start(now, 0), now - Duration::hours(1));
        assert_eq!(lookback_start(now, -5), now - Duration::hours(1));
        assert_eq!(lookback_start_days(now, 7), now - Duration::days(7));
    }

    #[test]
    fn test_lookback_start_clamps_huge_windows() {
        let now = Utc::now();
        let oldest = now - Duration::days(MAX_LOOKBACK_DAYS);

        assert_eq!(lookback_start(now, i64::MAX), oldest);
        assert_eq!(lookback_start(now, i64::MAX / 1000), oldest);
        assert_eq!(lookback_start_days(now, 1_000_000_000), oldest);
        assert_eq!(lookback_start_days(now, i64::MAX), oldest);
    }

    #[test]
    fn test_stats() {
        let stats = IndicatorStats::from_values(&[1.0, 2.0, 6.0]).unwrap();
        assert_eq!(stats.average, 3.0);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 6.0);
        assert_eq!(stats.count, 3);

        assert!(IndicatorStats::from_values(&[]).is_none());
    }
}
