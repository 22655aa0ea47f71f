//! USD/KRW 환율 어댑터.
//!
//! 조회 실패 시 `None` 대신 고정 환율 [`FALLBACK_USD_KRW_RATE`]를 반환합니다.
//! 근사값이므로 실패는 경고 로그로 남깁니다.

use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::warn;

use market_core::SourcesConfig;

use super::http::{build_client, get_json, join_url};
use crate::error::FetchError;
use crate::retry::{with_retry, RetryConfig};

/// 환율 조회 실패 시 사용하는 USD/KRW 근사값.
pub const FALLBACK_USD_KRW_RATE: f64 = 1330.0;

/// 조회된 환율이 없으면 고정 환율로 대체합니다.
pub fn rate_or_fallback(rate: Option<f64>) -> f64 {
    match rate {
        Some(rate) => rate,
        None => {
            warn!(
                fallback_rate = FALLBACK_USD_KRW_RATE,
                "USD/KRW 환율 조회 실패, 고정 환율 사용"
            );
            FALLBACK_USD_KRW_RATE
        }
    }
}

#[derive(Debug, Deserialize)]
struct LatestRates {
    #[serde(default)]
    rates: HashMap<String, f64>,
}

/// 환율 API 클라이언트.
#[derive(Clone)]
pub struct ExchangeRateClient {
    client: Client,
    base_url: String,
    retry: RetryConfig,
}

impl ExchangeRateClient {
    pub fn new(config: &SourcesConfig, retry: RetryConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client(config.exchange_rate_timeout())?,
            base_url: config.exchange_rate_base_url.clone(),
            retry,
        })
    }

    /// 1달러당 원화. 실패 시 [`FALLBACK_USD_KRW_RATE`].
    pub async fn usd_krw_rate(&self) -> f64 {
        rate_or_fallback(self.try_usd_krw_rate().await)
    }

    /// 실패를 그대로 `None`으로 돌려줍니다 (수집 상태 기록용).
    pub async fn try_usd_krw_rate(&self) -> Option<f64> {
        with_retry("exchange_rate.latest", &self.retry, || async move {
            self.fetch_rate("USD", "KRW").await
        })
        .await
    }

    async fn fetch_rate(&self, base: &str, quote: &str) -> Result<f64, FetchError> {
        let url = join_url(&self.base_url, &format!("latest/{}", base));
        let latest: LatestRates = get_json(self.client.get(url)).await?;

        latest
            .rates
            .get(quote)
            .copied()
            .filter(|r| r.is_finite() && *r > 0.0)
            .ok_or_else(|| FetchError::missing(&format!("rates.{}", quote)))
    }
}
