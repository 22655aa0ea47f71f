//! 지표 스냅샷 수집 모듈.
//!
//! 한 주기에서 모든 소스를 동시에 조회하고 스냅샷 한 행을 추가합니다.
//! 개별 소스 실패는 `api_health`에 기록될 뿐 수집을 중단시키지 않습니다.
//! 저장 실패만 에러로 반환됩니다.

use chrono::Utc;
use std::time::Instant;

use market_core::{
    premium_quote, ApiHealth, CryptoMarketEntry, NewSnapshot, SourceStatus, StoredPrice,
};
use market_data::provider::rate_or_fallback;
use market_data::{MarketDataSource, SnapshotWriter};

use crate::{CollectionStats, CollectorConfig, Result};

/// 시세 스냅샷에서 BTC 항목을 찾을 때 사용하는 CoinGecko id
const BITCOIN_ID: &str = "bitcoin";

/// 한 주기 동안 조회한 원시 값.
#[derive(Debug, Default)]
struct CycleReadings {
    dominance: Option<f64>,
    upbit: Option<f64>,
    binance: Option<f64>,
    rate: Option<f64>,
    markets: Option<Vec<CryptoMarketEntry>>,
    dollar: Option<f64>,
}

/// 지표 스냅샷 수집
pub async fn collect_snapshot(
    source: &dyn MarketDataSource,
    store: &dyn SnapshotWriter,
    config: &CollectorConfig,
) -> Result<CollectionStats> {
    let start = Instant::now();
    let mut stats = CollectionStats::new();

    tracing::info!(source = %config.collection_source, "스냅샷 수집 시작");

    let (dominance, upbit, binance, rate, markets, dollar) = tokio::join!(
        source.btc_dominance(),
        source.upbit_btc_krw(),
        source.binance_btc_usdt(),
        source.usd_krw_rate(),
        source.market_snapshot(),
        source.dollar_index(),
    );

    let readings = CycleReadings {
        dominance,
        upbit,
        binance,
        rate,
        markets,
        dollar,
    };

    let snapshot = build_snapshot(readings, &config.collection_source)?;

    stats.record_health(&snapshot.api_health);
    stats.indicators = [
        snapshot.btc_dominance,
        snapshot.kimchi_premium,
        snapshot.dollar_index,
    ]
    .iter()
    .filter(|v| v.is_some())
    .count();
    stats.prices = snapshot
        .crypto_prices
        .as_ref()
        .and_then(|v| v.as_array())
        .map_or(0, |a| a.len());

    if stats.indicators == 0 {
        tracing::warn!("모든 지표 조회 실패, 빈 스냅샷 저장");
    }

    let saved = store.insert(snapshot).await?;
    stats.snapshot_id = Some(saved.id);

    tracing::info!(
        snapshot_id = saved.id,
        btc_dominance = ?saved.btc_dominance,
        kimchi_premium = ?saved.kimchi_premium,
        dollar_index = ?saved.dollar_index,
        "스냅샷 저장 완료"
    );

    stats.elapsed = start.elapsed();
    Ok(stats)
}

/// 조회 결과로 저장할 스냅샷 행을 구성
fn build_snapshot(readings: CycleReadings, collection_source: &str) -> Result<NewSnapshot> {
    let quote = premium_quote(
        readings.upbit,
        readings.binance,
        Some(rate_or_fallback(readings.rate)),
    );

    let btc = readings
        .markets
        .as_ref()
        .and_then(|entries| entries.iter().find(|e| e.id.as_deref() == Some(BITCOIN_ID)));

    let crypto_prices = match &readings.markets {
        Some(entries) => {
            let stored: Vec<StoredPrice> = entries.iter().map(StoredPrice::from).collect();
            Some(serde_json::to_value(stored)?)
        }
        None => None,
    };

    let mut api_health = ApiHealth::new();
    api_health
        .record("coingecko", SourceStatus::from_present(&readings.dominance))
        .record("upbit", SourceStatus::from_present(&readings.upbit))
        .record("binance", SourceStatus::from_present(&readings.binance))
        .record("exchange_rate", SourceStatus::from_present(&readings.rate))
        .record("markets", SourceStatus::from_present(&readings.markets))
        .record("yahoo", SourceStatus::from_present(&readings.dollar));

    Ok(NewSnapshot {
        timestamp: Utc::now(),
        btc_dominance: readings.dominance,
        kimchi_premium: quote.map(|q| q.premium),
        dollar_index: readings.dollar,
        btc_price: btc.map(|e| e.price),
        btc_change_24h: btc.map(|e| e.change_percent_24h),
        crypto_prices,
        collection_source: collection_source.to_string(),
        api_health,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use market_core::{AppConfig, HistoryPoint, IndicatorKind};
    use market_data::{InMemorySnapshotStore, SnapshotReader};

    struct FixedSource {
        readings: fn() -> CycleReadings,
    }

    #[async_trait]
    impl MarketDataSource for FixedSource {
        async fn btc_dominance(&self) -> Option<f64> {
            (self.readings)().dominance
        }

        async fn upbit_btc_krw(&self) -> Option<f64> {
            (self.readings)().upbit
        }

        async fn binance_btc_usdt(&self) -> Option<f64> {
            (self.readings)().binance
        }

        async fn usd_krw_rate(&self) -> Option<f64> {
            (self.readings)().rate
        }

        async fn market_snapshot(&self) -> Option<Vec<CryptoMarketEntry>> {
            (self.readings)().markets
        }

        async fn dollar_index(&self) -> Option<f64> {
            (self.readings)().dollar
        }

        async fn dollar_index_history(&self, _days: i64) -> Option<Vec<HistoryPoint>> {
            None
        }
    }

    fn entry(id: &str, symbol: &str, price: f64) -> CryptoMarketEntry {
        CryptoMarketEntry {
            id: Some(id.to_string()),
            symbol: symbol.to_string(),
            price,
            previous_price: price * 0.98,
            change_24h: price * 0.02,
            change_percent_24h: 2.04,
            volume_24h: 1.0e9,
            market_cap: price * 1.0e7,
            all_time_high: None,
            ath_date: None,
        }
    }

    fn healthy() -> CycleReadings {
        CycleReadings {
            dominance: Some(54.5),
            upbit: Some(163_000_000.0),
            binance: Some(4_000.0),
            rate: Some(1_390.0),
            markets: Some(vec![
                entry("ethereum", "ETH", 3_500.0),
                entry("bitcoin", "BTC", 95_000.0),
            ]),
            dollar: Some(104.3),
        }
    }

    fn exchanges_down() -> CycleReadings {
        CycleReadings {
            upbit: None,
            rate: None,
            dollar: None,
            ..healthy()
        }
    }

    fn config() -> CollectorConfig {
        let mut config = CollectorConfig::from_app(AppConfig::default());
        config.collection_source = "test-runner".to_string();
        config
    }

    #[test]
    fn test_build_snapshot_all_sources() {
        let snapshot = build_snapshot(healthy(), "test-runner").unwrap();

        assert_eq!(snapshot.btc_dominance, Some(54.5));
        assert!((snapshot.kimchi_premium.unwrap() - 2831.65).abs() < 0.01);
        assert_eq!(snapshot.dollar_index, Some(104.3));
        assert_eq!(snapshot.btc_price, Some(95_000.0));
        assert_eq!(snapshot.btc_change_24h, Some(2.04));
        assert_eq!(snapshot.collection_source, "test-runner");
        assert_eq!(snapshot.api_health.failed_count(), 0);

        let prices = snapshot.crypto_prices.unwrap();
        assert_eq!(prices[0]["symbol"], "ETH");
        assert_eq!(prices[1]["price"], 95_000.0);
        assert_eq!(prices[1]["change_24h"], 2.04);
    }

    #[test]
    fn test_build_snapshot_records_failed_sources() {
        let snapshot = build_snapshot(exchanges_down(), "test-runner").unwrap();

        assert!(snapshot.kimchi_premium.is_none());
        assert!(snapshot.dollar_index.is_none());
        assert_eq!(snapshot.btc_dominance, Some(54.5));

        let health = snapshot.api_health.to_json();
        assert_eq!(health["upbit"], "failed");
        assert_eq!(health["exchange_rate"], "failed");
        assert_eq!(health["yahoo"], "failed");
        assert_eq!(health["binance"], "ok");
        assert_eq!(snapshot.api_health.failed_count(), 3);
    }

    #[test]
    fn test_missing_rate_uses_fixed_rate_for_premium() {
        let readings = CycleReadings {
            rate: None,
            ..healthy()
        };
        let snapshot = build_snapshot(readings, "test-runner").unwrap();

        assert!(snapshot.kimchi_premium.is_some());
        assert_eq!(snapshot.api_health.to_json()["exchange_rate"], "failed");
    }

    #[test]
    fn test_no_markets_leaves_price_columns_empty() {
        let readings = CycleReadings {
            markets: None,
            ..healthy()
        };
        let snapshot = build_snapshot(readings, "test-runner").unwrap();

        assert!(snapshot.btc_price.is_none());
        assert!(snapshot.crypto_prices.is_none());
        assert_eq!(snapshot.api_health.to_json()["markets"], "failed");
    }

    #[tokio::test]
    async fn test_collect_snapshot_inserts_row() {
        let source = FixedSource { readings: healthy };
        let store = InMemorySnapshotStore::new();

        let stats = collect_snapshot(&source, &store, &config()).await.unwrap();

        assert_eq!(stats.total, 6);
        assert_eq!(stats.success, 6);
        assert_eq!(stats.indicators, 3);
        assert_eq!(stats.prices, 2);
        assert_eq!(store.len().await, 1);

        let latest = store
            .latest_since(Utc::now() - chrono::Duration::minutes(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(Some(latest.id), stats.snapshot_id);
        assert_eq!(latest.indicator(IndicatorKind::DollarIndex), Some(104.3));
        assert_eq!(latest.collection_source, "test-runner");
    }

    #[tokio::test]
    async fn test_collect_snapshot_survives_source_failures() {
        let source = FixedSource {
            readings: CycleReadings::default,
        };
        let store = InMemorySnapshotStore::new();

        let stats = collect_snapshot(&source, &store, &config()).await.unwrap();

        assert_eq!(stats.errors, 6);
        assert_eq!(stats.indicators, 0);
        assert_eq!(store.len().await, 1);
    }
}
