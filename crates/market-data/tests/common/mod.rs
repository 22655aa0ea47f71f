//! 통합 테스트 공용 고정 응답 소스.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use market_core::{
    ApiHealth, CryptoMarketEntry, HistoryPoint, IndicatorKind, IndicatorSnapshot,
    IndicatorStats, NewSnapshot,
};
use market_data::{DataError, MarketDataSource, SnapshotReader};

/// 필드에 지정한 값을 그대로 돌려주는 소스.
#[derive(Default)]
pub struct StubSource {
    pub dominance: Option<f64>,
    pub upbit: Option<f64>,
    pub binance: Option<f64>,
    pub rate: Option<f64>,
    pub markets: Option<Vec<CryptoMarketEntry>>,
    pub dollar: Option<f64>,
    pub dollar_history: Option<Vec<HistoryPoint>>,
    /// 모든 호출에 적용되는 응답 지연
    pub latency: Duration,
    /// 달러 인덱스 호출에만 추가되는 지연
    pub dollar_latency: Duration,
    pub live_calls: AtomicUsize,
}

impl StubSource {
    /// 모든 소스가 정상 응답하는 상태.
    pub fn healthy() -> Self {
        Self {
            dominance: Some(54.5),
            upbit: Some(163_000_000.0),
            binance: Some(4_000.0),
            rate: Some(1_390.0),
            markets: Some(vec![btc_entry()]),
            dollar: Some(104.3),
            dollar_history: None,
            latency: Duration::ZERO,
            dollar_latency: Duration::ZERO,
            live_calls: AtomicUsize::new(0),
        }
    }

    /// 모든 소스가 실패하는 상태.
    pub fn down() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.live_calls.load(Ordering::SeqCst)
    }

    async fn hit<T: Clone>(&self, value: &Option<T>) -> Option<T> {
        self.live_calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        value.clone()
    }
}

#[async_trait]
impl MarketDataSource for StubSource {
    async fn btc_dominance(&self) -> Option<f64> {
        self.hit(&self.dominance).await
    }

    async fn upbit_btc_krw(&self) -> Option<f64> {
        self.hit(&self.upbit).await
    }

    async fn binance_btc_usdt(&self) -> Option<f64> {
        self.hit(&self.binance).await
    }

    async fn usd_krw_rate(&self) -> Option<f64> {
        self.hit(&self.rate).await
    }

    async fn market_snapshot(&self) -> Option<Vec<CryptoMarketEntry>> {
        self.hit(&self.markets).await
    }

    async fn dollar_index(&self) -> Option<f64> {
        if !self.dollar_latency.is_zero() {
            tokio::time::sleep(self.dollar_latency).await;
        }
        self.hit(&self.dollar).await
    }

    async fn dollar_index_history(&self, _days: i64) -> Option<Vec<HistoryPoint>> {
        self.hit(&self.dollar_history).await
    }
}

/// 모든 조회가 실패하는 저장소.
pub struct BrokenStore;

#[async_trait]
impl SnapshotReader for BrokenStore {
    async fn latest_since(&self, _since: DateTime<Utc>) -> market_data::Result<Option<IndicatorSnapshot>> {
        Err(DataError::ConnectionError("connection refused".into()))
    }

    async fn history_since(
        &self,
        _kind: IndicatorKind,
        _since: DateTime<Utc>,
    ) -> market_data::Result<Vec<HistoryPoint>> {
        Err(DataError::ConnectionError("connection refused".into()))
    }

    async fn recent(&self, _kind: IndicatorKind, _limit: i64) -> market_data::Result<Vec<HistoryPoint>> {
        Err(DataError::ConnectionError("connection refused".into()))
    }

    async fn all(&self, _limit: i64, _offset: i64) -> market_data::Result<Vec<IndicatorSnapshot>> {
        Err(DataError::ConnectionError("connection refused".into()))
    }

    async fn stats_since(
        &self,
        _kind: IndicatorKind,
        _since: DateTime<Utc>,
    ) -> market_data::Result<Option<IndicatorStats>> {
        Err(DataError::ConnectionError("connection refused".into()))
    }
}

pub fn btc_entry() -> CryptoMarketEntry {
    CryptoMarketEntry {
        id: Some("bitcoin".to_string()),
        symbol: "BTC".to_string(),
        price: 95_000.0,
        previous_price: 94_000.0,
        change_24h: 1_000.0,
        change_percent_24h: 1.06,
        volume_24h: 4.2e10,
        market_cap: 1.89e12,
        all_time_high: Some(108_000.0),
        ath_date: None,
    }
}

pub fn snapshot(dominance: Option<f64>, premium: Option<f64>, dollar: Option<f64>) -> NewSnapshot {
    NewSnapshot {
        timestamp: Utc::now(),
        btc_dominance: dominance,
        kimchi_premium: premium,
        dollar_index: dollar,
        btc_price: Some(95_000.0),
        btc_change_24h: Some(1.06),
        crypto_prices: None,
        collection_source: "test".to_string(),
        api_health: ApiHealth::new(),
    }
}
