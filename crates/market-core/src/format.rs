//! 표시 계층 포맷터.
//!
//! 해석/계산 계층은 반올림하지 않은 `f64`를 유지하고, 반올림은 이 모듈에서만 수행합니다.
//! 변화량/변화율을 반올림된 값으로 다시 계산하지 않으므로 반올림 오차가 누적되지 않습니다.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{
    CryptoMarketEntry, HistoryPoint, IndicatorKind, IndicatorValue, Origin, PremiumDetails,
    Resolved,
};

/// 지표/변화율 표시 소수 자릿수.
pub const DISPLAY_DECIMALS: u32 = 2;

/// 소수점 `places` 자리로 반올림.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// 소수점 둘째 자리로 반올림.
pub fn round2(value: f64) -> f64 {
    round_to(value, DISPLAY_DECIMALS)
}

/// 표시용 지표 값.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorView {
    pub name: String,
    pub value: f64,
    pub previous_value: f64,
    pub change: f64,
    pub change_percent: f64,
    pub unit: String,
    pub last_updated: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upbit_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binance_price: Option<f64>,
}

impl IndicatorView {
    pub fn from_value(value: &IndicatorValue) -> Self {
        let details: Option<&PremiumDetails> = value.premium_details.as_ref();

        Self {
            name: value.name.clone(),
            value: round2(value.value),
            previous_value: round2(value.previous_value),
            change: round2(value.change),
            change_percent: round2(value.change_percent),
            unit: value.unit.clone(),
            last_updated: value.last_updated,
            origin: None,
            upbit_price: details.map(|d| d.upbit_price_krw.round()),
            binance_price: details.map(|d| d.binance_price_krw.round()),
        }
    }

    pub fn from_resolved(resolved: &Resolved<IndicatorValue>) -> Self {
        Self {
            origin: Some(resolved.origin),
            ..Self::from_value(&resolved.value)
        }
    }
}

/// 표시용 코인 시세.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketEntryView {
    pub symbol: String,
    pub price: f64,
    pub previous_price: f64,
    pub change_24h: f64,
    pub change_percent_24h: f64,
    pub volume_24h: f64,
    pub market_cap: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_time_high: Option<f64>,
}

impl MarketEntryView {
    /// BTC는 정수 단위, 나머지는 소수 둘째 자리로 표시합니다.
    pub fn from_entry(entry: &CryptoMarketEntry) -> Self {
        let price_places = if entry.symbol == "BTC" { 0 } else { DISPLAY_DECIMALS };
        Self {
            symbol: entry.symbol.clone(),
            price: round_to(entry.price, price_places),
            previous_price: round_to(entry.previous_price, price_places),
            change_24h: round2(entry.change_24h),
            change_percent_24h: round2(entry.change_percent_24h),
            volume_24h: entry.volume_24h.round(),
            market_cap: entry.market_cap.round(),
            all_time_high: entry.all_time_high.map(|v| round_to(v, price_places)),
        }
    }
}

/// 표시용 차트 포인트.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPointView {
    pub timestamp: String,
    pub value: f64,
}

/// 차트 시계열을 표시용으로 변환.
pub fn present_series(points: &[HistoryPoint]) -> Vec<HistoryPointView> {
    points
        .iter()
        .map(|p| HistoryPointView {
            timestamp: p.timestamp.to_rfc3339(),
            value: round2(p.value),
        })
        .collect()
}

/// 지표 한 줄 요약 (예: `Bitcoin Dominance 54.23% (+0.55%)`).
pub fn summary_line(value: &IndicatorValue) -> String {
    let unit = match value.kind {
        IndicatorKind::DollarIndex => format!(" {}", value.unit),
        _ => value.unit.clone(),
    };
    format!(
        "{} {:.2}{} ({:+.2}%)",
        value.name, value.value, unit, value.change_percent
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::premium_quote;

    #[test]
    fn test_round2() {
        assert_eq!(round2(2831.654_676), 2831.65);
        assert_eq!(round2(-0.504_9), -0.5);
        assert_eq!(round_to(95_420.6, 0), 95_421.0);
    }

    #[test]
    fn test_view_rounds_but_value_stays_raw() {
        let value = IndicatorValue::new(IndicatorKind::BtcDominance, 54.234_9, 53.691_2, Utc::now());
        let view = IndicatorView::from_value(&value);

        assert_eq!(view.value, 54.23);
        assert_eq!(view.previous_value, 53.69);
        // 변화량은 원시값 차이를 반올림한 것
        assert_eq!(view.change, round2(54.234_9 - 53.691_2));
        assert_eq!(value.value, 54.234_9);
        assert!(view.upbit_price.is_none());
    }

    #[test]
    fn test_view_premium_prices() {
        let quote = premium_quote(Some(163_000_000.0), Some(4_000.0), Some(1_390.0)).unwrap();
        let value = IndicatorValue::new(IndicatorKind::KimchiPremium, quote.premium, 2.0, Utc::now())
            .with_premium_details(quote.details());
        let view = IndicatorView::from_resolved(&Resolved::new(value, Origin::Live));

        assert_eq!(view.value, 2831.65);
        assert_eq!(view.upbit_price, Some(163_000_000.0));
        assert_eq!(view.binance_price, Some(5_560_000.0));
        assert_eq!(view.origin, Some(Origin::Live));
    }

    #[test]
    fn test_summary_line() {
        let value = IndicatorValue::new(IndicatorKind::DollarIndex, 104.5, 104.0, Utc::now());
        assert_eq!(summary_line(&value), "Dollar Index 104.50 DXY (+0.48%)");
    }
}
