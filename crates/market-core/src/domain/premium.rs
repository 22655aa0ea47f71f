//! 김치 프리미엄 계산기.
//!
//! 국내 거래소 가격(통화 A), 해외 거래소 가격(통화 B), A/B 환율로
//! 해외 가격을 A로 환산한 뒤 괴리율(%)을 계산합니다.
//!
//! ```text
//! foreign_in_a = foreign * rate
//! premium      = (domestic - foreign_in_a) / foreign_in_a * 100
//! ```
//!
//! 반올림하지 않습니다. 반올림은 표시 계층에서만 합니다.

use serde::{Deserialize, Serialize};

use super::indicator::PremiumDetails;

/// 프리미엄 계산 결과와 입력값.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PremiumQuote {
    /// 괴리율 (%)
    pub premium: f64,
    /// 국내 가격 (통화 A)
    pub domestic_price: f64,
    /// 해외 가격 (통화 B)
    pub foreign_price: f64,
    /// 해외 가격의 통화 A 환산값
    pub foreign_price_converted: f64,
    /// A/B 환율
    pub rate: f64,
}

impl PremiumQuote {
    /// 지표 값에 첨부할 원시 시세 필드로 변환.
    pub fn details(&self) -> PremiumDetails {
        PremiumDetails {
            upbit_price_krw: self.domestic_price,
            binance_price_usd: self.foreign_price,
            binance_price_krw: self.foreign_price_converted,
            usd_krw_rate: self.rate,
        }
    }
}

/// 양의 유한값만 유효한 가격/환율로 취급.
fn valid(input: Option<f64>) -> Option<f64> {
    input.filter(|v| v.is_finite() && *v > 0.0)
}

/// 프리미엄과 환산 가격을 함께 계산합니다.
///
/// 입력 중 하나라도 없거나 양의 유한값이 아니면 `None`을 반환합니다.
/// 누락된 값을 0으로 취급해 계산하지 않습니다.
pub fn premium_quote(
    domestic_price: Option<f64>,
    foreign_price: Option<f64>,
    rate: Option<f64>,
) -> Option<PremiumQuote> {
    let domestic_price = valid(domestic_price)?;
    let foreign_price = valid(foreign_price)?;
    let rate = valid(rate)?;

    let foreign_price_converted = foreign_price * rate;
    if !foreign_price_converted.is_finite() || foreign_price_converted <= 0.0 {
        return None;
    }

    let premium = (domestic_price - foreign_price_converted) / foreign_price_converted * 100.0;
    if !premium.is_finite() {
        return None;
    }

    Some(PremiumQuote {
        premium,
        domestic_price,
        foreign_price,
        foreign_price_converted,
        rate,
    })
}

/// 괴리율(%)만 계산합니다. 입력 중 하나라도 없으면 `None`.
pub fn calculate_premium(
    domestic_price: Option<f64>,
    foreign_price: Option<f64>,
    rate: Option<f64>,
) -> Option<f64> {
    premium_quote(domestic_price, foreign_price, rate).map(|q| q.premium)
}
