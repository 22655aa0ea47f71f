//! Binance 어댑터 (BTCUSDT 현재가).

use reqwest::Client;
use serde::Deserialize;

use market_core::SourcesConfig;

use super::http::{build_client, get_json, join_url};
use crate::error::FetchError;
use crate::retry::{with_retry, RetryConfig};

/// 가격은 10진 문자열로 옵니다.
#[derive(Debug, Deserialize)]
struct TickerPrice {
    price: Option<String>,
}

/// Binance 시세 클라이언트.
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
    retry: RetryConfig,
}

impl BinanceClient {
    pub fn new(config: &SourcesConfig, retry: RetryConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client(config.exchange_timeout())?,
            base_url: config.binance_base_url.clone(),
            retry,
        })
    }

    /// BTC 달러(USDT) 가격.
    pub async fn btc_usdt_price(&self) -> Option<f64> {
        with_retry("binance.ticker", &self.retry, || async move {
            self.fetch_price("BTCUSDT").await
        })
        .await
    }

    async fn fetch_price(&self, symbol: &str) -> Result<f64, FetchError> {
        let request = self
            .client
            .get(join_url(&self.base_url, "ticker/price"))
            .query(&[("symbol", symbol)]);
        let ticker: TickerPrice = get_json(request).await?;

        let raw = ticker.price.ok_or_else(|| FetchError::missing("price"))?;
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite())
            .ok_or_else(|| FetchError::Malformed(format!("invalid price: {}", raw)))
    }
}
