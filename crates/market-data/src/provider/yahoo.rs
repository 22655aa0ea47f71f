//! Yahoo Finance 차트 어댑터 (달러 인덱스).
//!
//! 응답 구조가 자주 바뀌므로 타입 대신 `serde_json::Value` 경로로 읽고,
//! 경로 중 하나라도 없으면 값 없음으로 처리합니다.

use reqwest::Client;
use serde_json::Value;

use market_core::SourcesConfig;

use super::http::{build_client, get_json, join_url};
use crate::error::FetchError;
use crate::retry::{with_retry, RetryConfig};

/// ICE 달러 인덱스 선물 심볼.
pub const DOLLAR_INDEX_SYMBOL: &str = "DX-Y.NYB";

/// Yahoo 차트 클라이언트.
#[derive(Clone)]
pub struct YahooChartClient {
    client: Client,
    base_url: String,
    retry: RetryConfig,
}

impl YahooChartClient {
    pub fn new(config: &SourcesConfig, retry: RetryConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client(config.index_timeout())?,
            base_url: config.yahoo_base_url.clone(),
            retry,
        })
    }

    /// 달러 인덱스 현재가.
    pub async fn dollar_index(&self) -> Option<f64> {
        with_retry("yahoo.chart", &self.retry, || async move {
            self.regular_market_price(DOLLAR_INDEX_SYMBOL).await
        })
        .await
    }

    async fn regular_market_price(&self, symbol: &str) -> Result<f64, FetchError> {
        let url = join_url(&self.base_url, &format!("v8/finance/chart/{}", symbol));
        let body: Value = get_json(self.client.get(url)).await?;

        extract_regular_market_price(&body)
            .ok_or_else(|| FetchError::missing("chart.result[0].meta.regularMarketPrice"))
    }
}

/// `chart.result[0].meta.regularMarketPrice`.
pub(crate) fn extract_regular_market_price(body: &Value) -> Option<f64> {
    body.get("chart")?
        .get("result")?
        .get(0)?
        .get("meta")?
        .get("regularMarketPrice")?
        .as_f64()
        .filter(|v| v.is_finite())
}
