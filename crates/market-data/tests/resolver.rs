//! 지표 해석기 통합 테스트.

mod common;

use chrono::{Duration, Utc};
use std::sync::Arc;

use common::{snapshot, BrokenStore, StubSource};
use market_core::{ExhaustionPolicy, HistoryPoint, IndicatorKind, Origin, ResolverSettings};
use market_data::{
    InMemorySnapshotStore, IndicatorResolver, ResolveError, FALLBACK_USD_KRW_RATE,
};

fn settings(policy: ExhaustionPolicy) -> ResolverSettings {
    ResolverSettings {
        on_exhaustion: policy,
        ..ResolverSettings::default()
    }
}

fn build(source: StubSource, policy: ExhaustionPolicy) -> (IndicatorResolver, Arc<StubSource>) {
    let source = Arc::new(source);
    (IndicatorResolver::new(source.clone(), settings(policy)), source)
}

#[tokio::test]
async fn snapshot_within_freshness_window_is_used() {
    let store = InMemorySnapshotStore::new();
    store
        .insert_at(snapshot(Some(50.0), None, None), Utc::now() - Duration::minutes(29))
        .await;

    let (resolver, source) = build(StubSource::healthy(), ExhaustionPolicy::Fail);
    let resolver = resolver.with_store(Arc::new(store));

    let resolved = resolver.btc_dominance().await.unwrap();
    assert_eq!(resolved.origin, Origin::Snapshot);
    assert_eq!(resolved.value.value, 50.0);
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn stale_snapshot_is_bypassed_for_live_fetch() {
    let store = InMemorySnapshotStore::new();
    let created_at = Utc::now() - Duration::minutes(31);
    store
        .insert_at(snapshot(Some(50.0), None, None), created_at)
        .await;

    let (resolver, _) = build(StubSource::healthy(), ExhaustionPolicy::Fail);
    let resolver = resolver.with_store(Arc::new(store));

    let resolved = resolver.btc_dominance().await.unwrap();
    assert_eq!(resolved.origin, Origin::Live);
    assert_eq!(resolved.value.value, 54.5);
    assert!(resolved.value.last_updated > created_at);
}

#[tokio::test]
async fn snapshot_stamps_last_updated_with_creation_time() {
    let store = InMemorySnapshotStore::new();
    let created_at = Utc::now() - Duration::minutes(10);
    store
        .insert_at(snapshot(None, None, Some(103.9)), created_at)
        .await;

    let (resolver, _) = build(StubSource::healthy(), ExhaustionPolicy::Fail);
    let resolved = resolver
        .with_store(Arc::new(store))
        .dollar_index()
        .await
        .unwrap();

    assert_eq!(resolved.origin, Origin::Snapshot);
    assert_eq!(resolved.value.last_updated, created_at);
}

#[tokio::test]
async fn missing_indicator_in_fresh_snapshot_falls_through_to_live() {
    let store = InMemorySnapshotStore::new();
    store.insert_at(snapshot(Some(50.0), None, None), Utc::now()).await;

    let (resolver, _) = build(StubSource::healthy(), ExhaustionPolicy::Fail);
    let resolved = resolver
        .with_store(Arc::new(store))
        .dollar_index()
        .await
        .unwrap();

    assert_eq!(resolved.origin, Origin::Live);
    assert_eq!(resolved.value.value, 104.3);
}

#[tokio::test]
async fn store_errors_are_treated_as_no_snapshot() {
    let (resolver, _) = build(StubSource::healthy(), ExhaustionPolicy::Fail);
    let resolved = resolver
        .with_store(Arc::new(BrokenStore))
        .btc_dominance()
        .await
        .unwrap();

    assert_eq!(resolved.origin, Origin::Live);
}

#[tokio::test]
async fn premium_scenario_krw_usd() {
    let (resolver, _) = build(StubSource::healthy(), ExhaustionPolicy::Fail);

    let resolved = resolver.kimchi_premium().await.unwrap();
    assert_eq!(resolved.origin, Origin::Live);

    let value = resolved.value;
    assert!((value.value - 2831.65).abs() < 0.01);

    let details = value.premium_details.unwrap();
    assert_eq!(details.binance_price_krw, 5_560_000.0);
    assert_eq!(details.upbit_price_krw, 163_000_000.0);
    assert_eq!(details.usd_krw_rate, 1_390.0);
}

#[tokio::test]
async fn premium_uses_fixed_rate_when_exchange_rate_fails() {
    let source = StubSource {
        rate: None,
        ..StubSource::healthy()
    };
    let (resolver, _) = build(source, ExhaustionPolicy::Fail);

    let details = resolver
        .kimchi_premium()
        .await
        .unwrap()
        .value
        .premium_details
        .unwrap();
    assert_eq!(details.usd_krw_rate, FALLBACK_USD_KRW_RATE);
    assert_eq!(details.binance_price_krw, 4_000.0 * FALLBACK_USD_KRW_RATE);
}

#[tokio::test]
async fn premium_unavailable_under_fail_policy_is_an_error() {
    let (resolver, _) = build(StubSource::down(), ExhaustionPolicy::Fail);

    let err = resolver.kimchi_premium().await.unwrap_err();
    assert_eq!(
        err,
        ResolveError::AllSourcesUnavailable {
            indicator: IndicatorKind::KimchiPremium
        }
    );

    // 한쪽 거래소만 실패해도 값 없음
    let source = StubSource {
        binance: None,
        ..StubSource::healthy()
    };
    let (resolver, _) = build(source, ExhaustionPolicy::Fail);
    assert!(resolver.kimchi_premium().await.is_err());
}

#[tokio::test]
async fn fallback_policy_synthesizes_without_touching_cache() {
    let (resolver, _) = build(StubSource::down(), ExhaustionPolicy::Fallback);

    let resolved = resolver.btc_dominance().await.unwrap();
    assert_eq!(resolved.origin, Origin::Fallback);
    assert!(resolved.value.value.is_finite());
    assert!(resolver.cache().peek(IndicatorKind::BtcDominance).is_none());
}

#[tokio::test]
async fn previous_value_comes_from_cache_then_seed() {
    let (resolver, _) = build(StubSource::healthy(), ExhaustionPolicy::Fail);

    let first = resolver.btc_dominance().await.unwrap().value;
    assert!((first.previous_value - 54.5 * 0.99).abs() < 1e-9);

    let second = resolver.btc_dominance().await.unwrap().value;
    assert_eq!(second.previous_value, 54.5);
    assert_eq!(second.change, 0.0);
    assert_eq!(second.change_percent, 0.0);
}

#[tokio::test]
async fn market_snapshot_policy() {
    let (resolver, _) = build(StubSource::down(), ExhaustionPolicy::Fail);
    assert_eq!(
        resolver.market_snapshot().await.unwrap_err(),
        ResolveError::MarketUnavailable
    );

    let (resolver, _) = build(StubSource::down(), ExhaustionPolicy::Fallback);
    let market = resolver.market_snapshot().await.unwrap();
    assert_eq!(market.origin, Origin::Fallback);
    assert_eq!(market.value.len(), 5);
}

#[tokio::test]
async fn chart_series_prefers_store_history_and_is_idempotent() {
    let store = InMemorySnapshotStore::new();
    let now = Utc::now();
    for (hours_ago, value) in [(3, 53.0), (2, 53.5), (1, 54.0)] {
        store
            .insert_at(snapshot(Some(value), None, None), now - Duration::hours(hours_ago))
            .await;
    }

    let (resolver, source) = build(StubSource::healthy(), ExhaustionPolicy::Fail);
    let resolver = resolver.with_store(Arc::new(store));

    let first = resolver
        .chart_series(IndicatorKind::BtcDominance, 1)
        .await
        .unwrap();
    let second = resolver
        .chart_series(IndicatorKind::BtcDominance, 1)
        .await
        .unwrap();

    let values: Vec<f64> = first.iter().map(|p| p.value).collect();
    assert_eq!(values, vec![53.0, 53.5, 54.0]);
    assert_eq!(first, second);
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn chart_series_with_huge_day_count_is_clamped() {
    let store = InMemorySnapshotStore::new();
    store
        .insert_at(snapshot(Some(53.0), None, None), Utc::now() - Duration::days(400))
        .await;

    let (resolver, _) = build(StubSource::healthy(), ExhaustionPolicy::Fail);
    let resolver = resolver.with_store(Arc::new(store));

    for days in [1_000_000_000, i64::MAX] {
        let points = resolver
            .chart_series(IndicatorKind::BtcDominance, days)
            .await
            .unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].value, 53.0);
    }
}

#[tokio::test]
async fn chart_series_falls_back_to_recent_rows_outside_window() {
    let store = InMemorySnapshotStore::new();
    store
        .insert_at(snapshot(Some(51.0), None, None), Utc::now() - Duration::days(30))
        .await;

    let (resolver, _) = build(StubSource::healthy(), ExhaustionPolicy::Fail);
    let points = resolver
        .with_store(Arc::new(store))
        .chart_series(IndicatorKind::BtcDominance, 7)
        .await
        .unwrap();

    assert_eq!(points.len(), 1);
    assert_eq!(points[0].value, 51.0);
}

#[tokio::test]
async fn chart_series_dollar_index_uses_external_history() {
    let history = vec![
        HistoryPoint::new(Utc::now() - Duration::days(2), 1.04),
        HistoryPoint::new(Utc::now() - Duration::days(1), 1.05),
    ];
    let source = StubSource {
        dollar_history: Some(history.clone()),
        ..StubSource::healthy()
    };
    let (resolver, _) = build(source, ExhaustionPolicy::Fail);
    let resolver = resolver.with_store(Arc::new(InMemorySnapshotStore::new()));

    let points = resolver
        .chart_series(IndicatorKind::DollarIndex, 7)
        .await
        .unwrap();
    assert_eq!(points, history);
}

#[tokio::test]
async fn chart_series_single_point_from_current_value() {
    let (resolver, _) = build(StubSource::healthy(), ExhaustionPolicy::Fail);

    let points = resolver
        .chart_series(IndicatorKind::KimchiPremium, 7)
        .await
        .unwrap();

    assert_eq!(points.len(), 1);
    assert_eq!(points[0].timestamp, HistoryPoint::today(0.0).timestamp);
    assert!((points[0].value - 2831.65).abs() < 0.01);
}

#[tokio::test]
async fn chart_series_fail_policy_propagates_error() {
    let (resolver, _) = build(StubSource::down(), ExhaustionPolicy::Fail);

    assert!(resolver
        .chart_series(IndicatorKind::DollarIndex, 7)
        .await
        .is_err());
}
