//! 지표 해석기.
//!
//! 지표마다 다음 순서로 값을 결정합니다.
//!
//! 1. **스냅샷**: 신선도 기준(기본 30분) 이내에 생성된 최신 행에 값이 있으면 사용
//! 2. **실시간**: 업스트림 어댑터 조회 (김치 프리미엄은 세 입력을 동시에 조회해 계산)
//! 3. **종단 처리**: `on_exhaustion` 정책에 따라 합성값 또는 [`ResolveError`]
//!
//! 스냅샷/실시간 결과는 이전값 캐시를 갱신한 뒤 변화량을 계산합니다.
//! 합성값은 캐시를 건드리지 않습니다.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

use market_core::{
    indicator_span, lookback_start_days, premium_quote, CryptoMarketEntry, ExhaustionPolicy, HistoryPoint,
    IndicatorKind, IndicatorSnapshot, IndicatorValue, Origin, PremiumDetails, Resolved,
    ResolverSettings,
};

use crate::cache::PreviousValueCache;
use crate::error::ResolveError;
use crate::provider::{rate_or_fallback, MarketDataSource};
use crate::storage::SnapshotReader;
use crate::synthetic;

/// 실시간 조회 결과 (값과 지표별 추가 필드).
struct LiveReading {
    value: f64,
    premium_details: Option<PremiumDetails>,
}

/// 지표 해석기.
#[derive(Clone)]
pub struct IndicatorResolver {
    source: Arc<dyn MarketDataSource>,
    store: Option<Arc<dyn SnapshotReader>>,
    cache: PreviousValueCache,
    settings: ResolverSettings,
}

impl IndicatorResolver {
    /// 저장소 없이 생성 (실시간 → 종단 처리만 수행).
    pub fn new(source: Arc<dyn MarketDataSource>, settings: ResolverSettings) -> Self {
        Self {
            source,
            store: None,
            cache: PreviousValueCache::new(),
            settings,
        }
    }

    /// 스냅샷 저장소 연결.
    pub fn with_store(mut self, store: Arc<dyn SnapshotReader>) -> Self {
        self.store = Some(store);
        self
    }

    /// 기존 이전값 캐시 공유.
    pub fn with_cache(mut self, cache: PreviousValueCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &PreviousValueCache {
        &self.cache
    }

    pub fn policy(&self) -> ExhaustionPolicy {
        self.settings.on_exhaustion
    }

    pub async fn btc_dominance(&self) -> Result<Resolved<IndicatorValue>, ResolveError> {
        self.resolve(IndicatorKind::BtcDominance).await
    }

    pub async fn kimchi_premium(&self) -> Result<Resolved<IndicatorValue>, ResolveError> {
        self.resolve(IndicatorKind::KimchiPremium).await
    }

    pub async fn dollar_index(&self) -> Result<Resolved<IndicatorValue>, ResolveError> {
        self.resolve(IndicatorKind::DollarIndex).await
    }

    /// 지표 하나를 해석합니다.
    pub async fn resolve(&self, kind: IndicatorKind) -> Result<Resolved<IndicatorValue>, ResolveError> {
        let span = indicator_span!("resolve_indicator", kind, self.settings.on_exhaustion);
        self.resolve_inner(kind).instrument(span).await
    }

    async fn resolve_inner(&self, kind: IndicatorKind) -> Result<Resolved<IndicatorValue>, ResolveError> {
        let now = Utc::now();

        if let Some(snapshot) = self.fresh_snapshot(now).await {
            if let Some(value) = snapshot.indicator(kind) {
                debug!(snapshot_id = snapshot.id, value, "스냅샷 값 사용");
                let previous = self.cache.observe(kind, value);
                let resolved = IndicatorValue::new(kind, value, previous, snapshot.created_at);
                return Ok(Resolved::new(resolved, Origin::Snapshot));
            }
            debug!(snapshot_id = snapshot.id, "스냅샷에 지표 값 없음, 실시간 조회");
        }

        if let Some(reading) = self.live_reading(kind).await {
            let previous = self.cache.observe(kind, reading.value);
            let mut resolved = IndicatorValue::new(kind, reading.value, previous, now);
            if let Some(details) = reading.premium_details {
                resolved = resolved.with_premium_details(details);
            }
            return Ok(Resolved::new(resolved, Origin::Live));
        }

        self.exhausted(kind)
    }

    /// 코인 시세 스냅샷 (실시간 → 종단 처리).
    pub async fn market_snapshot(&self) -> Result<Resolved<Vec<CryptoMarketEntry>>, ResolveError> {
        if let Some(entries) = self.source.market_snapshot().await {
            return Ok(Resolved::new(entries, Origin::Live));
        }

        match self.settings.on_exhaustion {
            ExhaustionPolicy::Fallback => {
                warn!("시세 조회 실패, 합성 시세 사용");
                Ok(Resolved::new(synthetic::market_snapshot(), Origin::Fallback))
            }
            ExhaustionPolicy::Fail => Err(ResolveError::MarketUnavailable),
        }
    }

    /// 차트 시계열.
    ///
    /// 저장소의 최근 `days`일 → 기간 무관 최근 N행 → (달러 인덱스) 외부 히스토리 →
    /// 현재 해석값 단일 포인트(오늘 00:00 UTC) 순으로 시도합니다.
    pub async fn chart_series(
        &self,
        kind: IndicatorKind,
        days: i64,
    ) -> Result<Vec<HistoryPoint>, ResolveError> {
        if let Some(store) = &self.store {
            let since = lookback_start_days(Utc::now(), days);

            match store.history_since(kind, since).await {
                Ok(points) if !points.is_empty() => {
                    debug!(indicator = %kind, count = points.len(), "저장소 히스토리 사용");
                    return Ok(points);
                }
                Ok(_) => {}
                Err(e) => warn!(indicator = %kind, error = %e, "히스토리 조회 실패"),
            }

            match store.recent(kind, self.settings.history_fallback_limit).await {
                Ok(points) if !points.is_empty() => {
                    debug!(indicator = %kind, count = points.len(), "기간 외 최근 히스토리 사용");
                    return Ok(points);
                }
                Ok(_) => {}
                Err(e) => warn!(indicator = %kind, error = %e, "최근 히스토리 조회 실패"),
            }
        }

        if kind == IndicatorKind::DollarIndex {
            if let Some(points) = self.source.dollar_index_history(days).await {
                info!(count = points.len(), "외부 달러 인덱스 히스토리 사용");
                return Ok(points);
            }
        }

        let current = self.resolve(kind).await?;
        Ok(vec![HistoryPoint::today(current.value.value)])
    }

    /// 신선도 기준 이내의 최신 스냅샷. 저장소 오류는 "스냅샷 없음"으로 취급합니다.
    async fn fresh_snapshot(&self, now: DateTime<Utc>) -> Option<IndicatorSnapshot> {
        let store = self.store.as_ref()?;
        let max_age = self.settings.freshness();

        match store.latest_since(now - max_age).await {
            Ok(snapshot) => snapshot.filter(|s| s.is_fresh(now, max_age)),
            Err(e) => {
                warn!(error = %e, "스냅샷 조회 실패, 실시간 조회로 진행");
                None
            }
        }
    }

    async fn live_reading(&self, kind: IndicatorKind) -> Option<LiveReading> {
        match kind {
            IndicatorKind::BtcDominance => self.source.btc_dominance().await.map(|value| LiveReading {
                value,
                premium_details: None,
            }),
            IndicatorKind::DollarIndex => self.source.dollar_index().await.map(|value| LiveReading {
                value,
                premium_details: None,
            }),
            IndicatorKind::KimchiPremium => {
                let (upbit, binance, rate) = tokio::join!(
                    self.source.upbit_btc_krw(),
                    self.source.binance_btc_usdt(),
                    self.source.usd_krw_rate(),
                );

                let quote = premium_quote(upbit, binance, Some(rate_or_fallback(rate)))?;
                Some(LiveReading {
                    value: quote.premium,
                    premium_details: Some(quote.details()),
                })
            }
        }
    }

    fn exhausted(&self, kind: IndicatorKind) -> Result<Resolved<IndicatorValue>, ResolveError> {
        match self.settings.on_exhaustion {
            ExhaustionPolicy::Fallback => {
                warn!(indicator = %kind, "모든 소스 실패, 합성값 사용");
                Ok(Resolved::new(synthetic::indicator_value(kind), Origin::Fallback))
            }
            ExhaustionPolicy::Fail => {
                warn!(indicator = %kind, "모든 소스 실패");
                Err(ResolveError::AllSourcesUnavailable { indicator: kind })
            }
        }
    }
}
