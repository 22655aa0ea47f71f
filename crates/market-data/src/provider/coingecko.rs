//! CoinGecko 어댑터.
//!
//! 비트코인 도미넌스(`/global`)와 코인 시세 스냅샷(`/coins/markets`)을 조회합니다.
//! 무료 플랜 쿼터가 엄격하므로 모든 시도가 Token Bucket을 거칩니다.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use market_core::{CryptoMarketEntry, SourcesConfig};

use super::http::{build_client, get_json, join_url};
use crate::error::FetchError;
use crate::rate_limiter::TokenBucket;
use crate::retry::{with_retry, RetryConfig};

#[derive(Debug, Deserialize)]
struct GlobalResponse {
    data: Option<GlobalData>,
}

#[derive(Debug, Deserialize)]
struct GlobalData {
    market_cap_percentage: Option<MarketCapPercentage>,
}

#[derive(Debug, Deserialize)]
struct MarketCapPercentage {
    btc: Option<f64>,
}

/// `/coins/markets` 응답 항목.
#[derive(Debug, Deserialize)]
struct MarketRow {
    id: String,
    symbol: String,
    current_price: Option<f64>,
    price_change_24h: Option<f64>,
    price_change_percentage_24h: Option<f64>,
    total_volume: Option<f64>,
    market_cap: Option<f64>,
    ath: Option<f64>,
    ath_date: Option<DateTime<Utc>>,
}

impl MarketRow {
    /// 현재가가 없는 항목은 버립니다. 나머지 수치 필드는 없으면 0.
    fn into_entry(self) -> Option<CryptoMarketEntry> {
        let price = self.current_price.filter(|p| p.is_finite())?;
        let change_24h = self.price_change_24h.unwrap_or(0.0);

        Some(CryptoMarketEntry {
            id: Some(self.id),
            symbol: self.symbol.to_uppercase(),
            price,
            previous_price: price - change_24h,
            change_24h,
            change_percent_24h: self.price_change_percentage_24h.unwrap_or(0.0),
            volume_24h: self.total_volume.unwrap_or(0.0),
            market_cap: self.market_cap.unwrap_or(0.0),
            all_time_high: self.ath,
            ath_date: self.ath_date,
        })
    }
}

/// CoinGecko 클라이언트.
#[derive(Clone)]
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    coin_ids: Vec<String>,
    limiter: TokenBucket,
    retry: RetryConfig,
}

impl CoinGeckoClient {
    pub fn new(config: &SourcesConfig, retry: RetryConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client(config.coingecko_timeout())?,
            base_url: config.coingecko_base_url.clone(),
            coin_ids: config.market_coin_ids.clone(),
            limiter: TokenBucket::per_minute(
                config.coingecko_requests_per_minute,
                config.coingecko_burst,
            ),
            retry,
        })
    }

    /// 다른 제한기를 공유하도록 교체.
    pub fn with_limiter(mut self, limiter: TokenBucket) -> Self {
        self.limiter = limiter;
        self
    }

    /// BTC 시가총액 비중 (%).
    pub async fn btc_dominance(&self) -> Option<f64> {
        with_retry("coingecko.global", &self.retry, || async move {
            self.limiter.acquire().await;
            self.fetch_dominance().await
        })
        .await
    }

    /// 설정된 코인들의 시세 스냅샷.
    pub async fn market_snapshot(&self) -> Option<Vec<CryptoMarketEntry>> {
        with_retry("coingecko.markets", &self.retry, || async move {
            self.limiter.acquire().await;
            self.fetch_markets().await
        })
        .await
    }

    async fn fetch_dominance(&self) -> Result<f64, FetchError> {
        let url = join_url(&self.base_url, "global");
        let response: GlobalResponse = get_json(self.client.get(url)).await?;

        response
            .data
            .and_then(|d| d.market_cap_percentage)
            .and_then(|m| m.btc)
            .filter(|v| v.is_finite())
            .ok_or_else(|| FetchError::missing("data.market_cap_percentage.btc"))
    }

    async fn fetch_markets(&self) -> Result<Vec<CryptoMarketEntry>, FetchError> {
        let url = join_url(&self.base_url, "coins/markets");
        let ids = self.coin_ids.join(",");
        let per_page = self.coin_ids.len().max(1).to_string();

        let request = self.client.get(url).query(&[
            ("vs_currency", "usd"),
            ("ids", ids.as_str()),
            ("order", "market_cap_desc"),
            ("per_page", per_page.as_str()),
            ("page", "1"),
            ("sparkline", "false"),
            ("price_change_percentage", "24h"),
        ]);
        let rows: Vec<MarketRow> = get_json(request).await?;

        let entries: Vec<CryptoMarketEntry> =
            rows.into_iter().filter_map(MarketRow::into_entry).collect();
        if entries.is_empty() {
            return Err(FetchError::Malformed("empty market list".to_string()));
        }

        debug!(count = entries.len(), "CoinGecko 시세 조회 완료");
        Ok(entries)
    }
}
