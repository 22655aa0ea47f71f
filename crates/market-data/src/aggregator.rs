//! 대시보드 집계기.
//!
//! 세 지표와 코인 시세를 동시에 해석합니다. 각 구성 요소는 독립적으로 완료되며
//! 하나의 실패가 다른 구성 요소를 취소하지 않습니다.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

use market_core::{CryptoMarketEntry, IndicatorValue, Origin, Resolved};

use crate::error::{AggregateError, ResolveError};
use crate::resolver::IndicatorResolver;

/// 대시보드 구성 요소.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardMember {
    BitcoinDominance,
    KimchiPremium,
    DollarIndex,
    CryptoPrices,
}

impl fmt::Display for DashboardMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DashboardMember::BitcoinDominance => "bitcoin_dominance",
            DashboardMember::KimchiPremium => "kimchi_premium",
            DashboardMember::DollarIndex => "dollar_index",
            DashboardMember::CryptoPrices => "crypto_prices",
        };
        write!(f, "{}", name)
    }
}

/// 구성 요소 실패 사유.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberFailure {
    pub member: DashboardMember,
    pub reason: String,
}

/// 집계 결과.
///
/// `fallback` 정책에서는 모든 구성 요소가 채워집니다.
/// `fail` 정책에서는 실패한 구성 요소가 `None`이고 사유가 `failures`에 남습니다.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub bitcoin_dominance: Option<Resolved<IndicatorValue>>,
    pub kimchi_premium: Option<Resolved<IndicatorValue>>,
    pub dollar_index: Option<Resolved<IndicatorValue>>,
    pub crypto_prices: Option<Resolved<Vec<CryptoMarketEntry>>>,
    pub failures: Vec<MemberFailure>,
    pub fetched_at: DateTime<Utc>,
}

impl DashboardData {
    /// 채워진 지표 값 목록.
    pub fn indicators(&self) -> impl Iterator<Item = &Resolved<IndicatorValue>> {
        [
            self.bitcoin_dominance.as_ref(),
            self.kimchi_premium.as_ref(),
            self.dollar_index.as_ref(),
        ]
        .into_iter()
        .flatten()
    }

    /// 합성값으로 채워진 구성 요소 수.
    pub fn fallback_count(&self) -> usize {
        let market = self
            .crypto_prices
            .as_ref()
            .map_or(0, |m| usize::from(m.origin == Origin::Fallback));
        self.indicators()
            .filter(|r| r.origin == Origin::Fallback)
            .count()
            + market
    }
}

/// 대시보드 집계기.
#[derive(Clone)]
pub struct DashboardAggregator {
    resolver: IndicatorResolver,
}

impl DashboardAggregator {
    pub fn new(resolver: IndicatorResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &IndicatorResolver {
        &self.resolver
    }

    /// 모든 구성 요소를 동시에 해석합니다.
    ///
    /// `fail` 정책에서 모든 구성 요소가 실패한 경우에만 오류를 반환합니다.
    pub async fn fetch(&self) -> Result<DashboardData, AggregateError> {
        let (dominance, premium, dollar, market) = tokio::join!(
            self.resolver.btc_dominance(),
            self.resolver.kimchi_premium(),
            self.resolver.dollar_index(),
            self.resolver.market_snapshot(),
        );

        let policy = self.resolver.policy();
        let mut failures = Vec::new();

        let bitcoin_dominance = settle(DashboardMember::BitcoinDominance, dominance, &mut failures);
        let kimchi_premium = settle(DashboardMember::KimchiPremium, premium, &mut failures);
        let dollar_index = settle(DashboardMember::DollarIndex, dollar, &mut failures);
        let crypto_prices = settle(DashboardMember::CryptoPrices, market, &mut failures);

        if failures.len() == 4 {
            return Err(AggregateError::AllMembersFailed {
                failures: failures
                    .iter()
                    .map(|f| format!("{}: {}", f.member, f.reason))
                    .collect(),
            });
        }

        let data = DashboardData {
            bitcoin_dominance,
            kimchi_premium,
            dollar_index,
            crypto_prices,
            failures,
            fetched_at: Utc::now(),
        };

        info!(
            policy = %policy,
            fallbacks = data.fallback_count(),
            failed = data.failures.len(),
            "대시보드 집계 완료"
        );

        Ok(data)
    }
}

/// 구성 요소 결과를 정리합니다.
///
/// `fallback` 정책이면 해석기가 이미 합성값을 채우므로 오류는 `fail` 정책에서만 옵니다.
fn settle<T>(
    member: DashboardMember,
    result: Result<Resolved<T>, ResolveError>,
    failures: &mut Vec<MemberFailure>,
) -> Option<Resolved<T>> {
    match result {
        Ok(resolved) => Some(resolved),
        Err(e) => {
            warn!(member = %member, error = %e, "구성 요소 실패");
            failures.push(MemberFailure {
                member,
                reason: e.to_string(),
            });
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settle_records_reason() {
        let mut failures = Vec::new();
        let result: Result<Resolved<f64>, _> = Err(ResolveError::MarketUnavailable);

        let settled = settle(DashboardMember::CryptoPrices, result, &mut failures);

        assert!(settled.is_none());
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].member, DashboardMember::CryptoPrices);
        assert_eq!(failures[0].reason, "Market snapshot unavailable");
    }

    #[test]
    fn test_settle_passes_value_through() {
        let mut failures = Vec::new();
        let result = Ok(Resolved::new(1.5, Origin::Fallback));

        let settled = settle(DashboardMember::DollarIndex, result, &mut failures).unwrap();

        assert_eq!(settled.value, 1.5);
        assert_eq!(settled.origin, Origin::Fallback);
        assert!(failures.is_empty());
    }
}
