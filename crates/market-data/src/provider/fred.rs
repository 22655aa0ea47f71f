//! FRED 관측값 어댑터.
//!
//! 달러 인덱스 히스토리가 저장소에 없을 때 `DEXUSEU` 시계열을 대신 사용합니다.
//! API 키가 없으면 호출하지 않습니다.

use chrono::{NaiveDate, NaiveTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use market_core::{lookback_start_days, HistoryPoint, SourcesConfig};

use super::http::{build_client, get_json, join_url};
use crate::error::FetchError;
use crate::retry::{with_retry, RetryConfig};

/// 달러 인덱스 대용 시계열 (USD/EUR 환율).
pub const DOLLAR_INDEX_SERIES: &str = "DEXUSEU";

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Option<Vec<Observation>>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    date: String,
    value: String,
}

impl Observation {
    /// 결측치(`"."`)나 파싱 불가 값은 버립니다.
    fn into_point(self) -> Option<HistoryPoint> {
        if self.value.trim() == "." {
            return None;
        }
        let value = self.value.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()?;
        Some(HistoryPoint::new(date.and_time(NaiveTime::MIN).and_utc(), value))
    }
}

/// FRED 클라이언트.
#[derive(Clone)]
pub struct FredClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    retry: RetryConfig,
}

impl FredClient {
    pub fn new(config: &SourcesConfig, retry: RetryConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client(config.index_timeout())?,
            base_url: config.fred_base_url.clone(),
            api_key: config.fred_api_key.clone().filter(|k| !k.trim().is_empty()),
            retry,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// 최근 `days`일 달러 인덱스 대용 시계열. API 키가 없거나 실패하면 `None`.
    pub async fn dollar_index_history(&self, days: i64) -> Option<Vec<HistoryPoint>> {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("FRED API 키 미설정, 달러 인덱스 히스토리 건너뜀");
            return None;
        };

        let points = with_retry("fred.observations", &self.retry, || async move {
            self.fetch_observations(DOLLAR_INDEX_SERIES, api_key, days).await
        })
        .await?;

        (!points.is_empty()).then_some(points)
    }

    async fn fetch_observations(
        &self,
        series_id: &str,
        api_key: &str,
        days: i64,
    ) -> Result<Vec<HistoryPoint>, FetchError> {
        let end = Utc::now().date_naive();
        let start = lookback_start_days(Utc::now(), days).date_naive();
        let start = start.format("%Y-%m-%d").to_string();
        let end = end.format("%Y-%m-%d").to_string();

        let request = self
            .client
            .get(join_url(&self.base_url, "series/observations"))
            .query(&[
                ("series_id", series_id),
                ("api_key", api_key),
                ("file_type", "json"),
                ("observation_start", start.as_str()),
                ("observation_end", end.as_str()),
            ]);
        let response: ObservationsResponse = get_json(request).await?;

        let observations = response
            .observations
            .ok_or_else(|| FetchError::missing("observations"))?;

        Ok(observations
            .into_iter()
            .filter_map(Observation::into_point)
            .collect())
    }
}
