//! 합성 대체값.
//!
//! 모든 소스가 실패했고 정책이 `fallback`일 때 쓰는 값입니다.
//! 고정 기준값에 제한된 난수 변동을 더하며, 실제 시세가 아닙니다.

use chrono::Utc;
use rand::Rng;

use market_core::{CryptoMarketEntry, IndicatorKind, IndicatorValue};

/// 지표별 (기준값, 현재값 변동폭, 이전값 변동폭).
fn indicator_base(kind: IndicatorKind) -> (f64, f64, f64) {
    match kind {
        IndicatorKind::BtcDominance => (54.2, 1.0, 0.75),
        IndicatorKind::KimchiPremium => (2.3, 2.0, 1.5),
        IndicatorKind::DollarIndex => (104.2, 0.75, 0.6),
    }
}

/// 코인별 (심볼, 가격, 시가총액, 거래량).
const MARKET_BASES: [(&str, f64, f64, f64); 5] = [
    ("BTC", 95_420.0, 1.89e12, 4.2e10),
    ("ETH", 3_340.0, 4.02e11, 1.8e10),
    ("XRP", 2.15, 1.25e11, 8.5e9),
    ("ADA", 0.87, 3.1e10, 1.2e9),
    ("SOL", 185.5, 8.9e10, 3.4e9),
];

/// 현재가 변동폭 (±5%).
const PRICE_JITTER: f64 = 0.05;
/// 이전가 변동폭 (±4%).
const PREVIOUS_PRICE_JITTER: f64 = 0.04;

fn jitter<R: Rng>(rng: &mut R, base: f64, amplitude: f64) -> f64 {
    base + rng.gen_range(-amplitude..=amplitude)
}

/// 합성 지표 값.
pub fn indicator_value(kind: IndicatorKind) -> IndicatorValue {
    let mut rng = rand::thread_rng();
    let (base, spread, previous_spread) = indicator_base(kind);

    let value = jitter(&mut rng, base, spread);
    let previous = jitter(&mut rng, base, previous_spread);

    IndicatorValue::new(kind, value, previous, Utc::now())
}

/// 합성 코인 시세 스냅샷.
pub fn market_snapshot() -> Vec<CryptoMarketEntry> {
    let mut rng = rand::thread_rng();

    MARKET_BASES
        .iter()
        .map(|&(symbol, base_price, market_cap, volume)| {
            let price = base_price * (1.0 + rng.gen_range(-PRICE_JITTER..=PRICE_JITTER));
            let previous_price =
                base_price * (1.0 + rng.gen_range(-PREVIOUS_PRICE_JITTER..=PREVIOUS_PRICE_JITTER));
            let change_24h = price - previous_price;

            CryptoMarketEntry {
                id: None,
                symbol: symbol.to_string(),
                price,
                previous_price,
                change_24h,
                change_percent_24h: market_core::change_percent(change_24h, previous_price),
                volume_24h: volume,
                market_cap,
                all_time_high: None,
                ath_date: None,
            }
        })
        .collect()
}
