//! 암호화폐 시세 스냅샷 항목.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 코인별 24시간 시세 정보.
///
/// 하나의 업스트림 시세 스냅샷 호출에서 통째로 가져오며, 소스 간 교차 검증은 하지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoMarketEntry {
    /// 업스트림 코인 ID (예: "bitcoin")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// 대문자 심볼 (예: "BTC")
    pub symbol: String,
    /// 현재가 (USD)
    pub price: f64,
    /// 24시간 전 가격 (`price - change_24h`)
    pub previous_price: f64,
    /// 24시간 가격 변화
    pub change_24h: f64,
    /// 24시간 변화율 (%)
    pub change_percent_24h: f64,
    /// 24시간 거래량
    pub volume_24h: f64,
    /// 시가총액
    pub market_cap: f64,
    /// 역대 최고가
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_time_high: Option<f64>,
    /// 역대 최고가 일시
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ath_date: Option<DateTime<Utc>>,
}

impl CryptoMarketEntry {
    /// 역대 최고가 대비 현재가 하락률 (%). ATH가 없거나 0이면 None.
    pub fn drawdown_from_ath(&self) -> Option<f64> {
        match self.all_time_high {
            Some(ath) if ath > 0.0 => Some((self.price - ath) / ath * 100.0),
            _ => None,
        }
    }
}

/// 스냅샷 행의 `crypto_prices` JSON에 저장되는 축약 항목.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPrice {
    pub symbol: String,
    pub price: f64,
    pub change_24h: f64,
    pub market_cap: f64,
}

impl From<&CryptoMarketEntry> for StoredPrice {
    fn from(entry: &CryptoMarketEntry) -> Self {
        Self {
            symbol: entry.symbol.clone(),
            price: entry.price,
            change_24h: entry.change_percent_24h,
            market_cap: entry.market_cap,
        }
    }
}
