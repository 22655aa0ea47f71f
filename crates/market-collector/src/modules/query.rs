//! 조회 명령 모듈.
//!
//! 저장소와 해석기 결과를 표시 계층 포맷터로 변환합니다.

use chrono::{DateTime, Utc};
use serde::Serialize;

use market_core::format::{
    present_series, round2, summary_line, HistoryPointView, IndicatorView, MarketEntryView,
};
use market_core::{lookback_start, IndicatorKind, IndicatorSnapshot, IndicatorStats, Origin};
use market_data::{DashboardAggregator, DashboardData, IndicatorResolver, MemberFailure, SnapshotReader};

use crate::Result;

/// 표시용 대시보드.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitcoin_dominance: Option<IndicatorView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kimchi_premium: Option<IndicatorView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dollar_index: Option<IndicatorView>,
    pub crypto_prices: Vec<MarketEntryView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crypto_prices_origin: Option<Origin>,
    pub failures: Vec<MemberFailure>,
    pub fetched_at: DateTime<Utc>,
}

impl From<&DashboardData> for DashboardView {
    fn from(data: &DashboardData) -> Self {
        Self {
            bitcoin_dominance: data.bitcoin_dominance.as_ref().map(IndicatorView::from_resolved),
            kimchi_premium: data.kimchi_premium.as_ref().map(IndicatorView::from_resolved),
            dollar_index: data.dollar_index.as_ref().map(IndicatorView::from_resolved),
            crypto_prices: data
                .crypto_prices
                .as_ref()
                .map(|m| m.value.iter().map(MarketEntryView::from_entry).collect())
                .unwrap_or_default(),
            crypto_prices_origin: data.crypto_prices.as_ref().map(|m| m.origin),
            failures: data.failures.clone(),
            fetched_at: data.fetched_at,
        }
    }
}

/// 표시용 지표 통계.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsView {
    pub indicator: IndicatorKind,
    pub hours: i64,
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

impl StatsView {
    fn new(indicator: IndicatorKind, hours: i64, stats: IndicatorStats) -> Self {
        Self {
            indicator,
            hours,
            average: round2(stats.average),
            min: round2(stats.min),
            max: round2(stats.max),
            count: stats.count,
        }
    }
}

/// 대시보드 전체 조회
pub async fn dashboard(aggregator: &DashboardAggregator) -> Result<DashboardView> {
    let data = aggregator.fetch().await?;

    for resolved in data.indicators() {
        tracing::info!(origin = %resolved.origin, "{}", summary_line(&resolved.value));
    }

    Ok(DashboardView::from(&data))
}

/// 지표 차트 시계열 조회
pub async fn history(
    resolver: &IndicatorResolver,
    kind: IndicatorKind,
    days: i64,
) -> Result<Vec<HistoryPointView>> {
    let points = resolver.chart_series(kind, days).await?;
    tracing::debug!(indicator = %kind, days, count = points.len(), "차트 시계열 조회 완료");
    Ok(present_series(&points))
}

/// 가장 최근 스냅샷 행
pub async fn latest(store: &dyn SnapshotReader) -> Result<Option<IndicatorSnapshot>> {
    Ok(store.all(1, 0).await?.into_iter().next())
}

/// 스냅샷 행 페이지 (최신 순)
pub async fn rows(
    store: &dyn SnapshotReader,
    limit: i64,
    offset: i64,
) -> Result<Vec<IndicatorSnapshot>> {
    Ok(store.all(limit.max(1), offset.max(0)).await?)
}

/// 최근 `hours`시간 지표 통계. 값이 없으면 `None`.
pub async fn stats(
    store: &dyn SnapshotReader,
    kind: IndicatorKind,
    hours: i64,
) -> Result<Option<StatsView>> {
    let since = lookback_start(Utc::now(), hours);
    let stats = store.stats_since(kind, since).await?;
    Ok(stats.map(|s| StatsView::new(kind, hours, s)))
}
