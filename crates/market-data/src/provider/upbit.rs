//! Upbit 어댑터 (KRW-BTC 현재가).

use reqwest::Client;
use serde::Deserialize;

use market_core::SourcesConfig;

use super::http::{build_client, get_json, join_url};
use crate::error::FetchError;
use crate::retry::{with_retry, RetryConfig};

#[derive(Debug, Deserialize)]
struct Ticker {
    trade_price: Option<f64>,
}

/// Upbit 시세 클라이언트.
#[derive(Clone)]
pub struct UpbitClient {
    client: Client,
    base_url: String,
    retry: RetryConfig,
}

impl UpbitClient {
    pub fn new(config: &SourcesConfig, retry: RetryConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client(config.exchange_timeout())?,
            base_url: config.upbit_base_url.clone(),
            retry,
        })
    }

    /// BTC 원화 체결가.
    pub async fn btc_krw_price(&self) -> Option<f64> {
        with_retry("upbit.ticker", &self.retry, || async move {
            self.fetch_trade_price("KRW-BTC").await
        })
        .await
    }

    async fn fetch_trade_price(&self, market: &str) -> Result<f64, FetchError> {
        let request = self
            .client
            .get(join_url(&self.base_url, "ticker"))
            .query(&[("markets", market)]);
        let tickers: Vec<Ticker> = get_json(request).await?;

        tickers
            .first()
            .and_then(|t| t.trade_price)
            .filter(|p| p.is_finite())
            .ok_or_else(|| FetchError::missing("[0].trade_price"))
    }
}
