//! 지표 값과 출처 타입.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// 대시보드가 추적하는 합성 지표 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    /// 비트코인 도미넌스 (전체 시가총액 대비 BTC 비중, %)
    BtcDominance,
    /// 김치 프리미엄 (Upbit 원화 가격과 Binance 환산 가격의 괴리율, %)
    KimchiPremium,
    /// 달러 인덱스 (DXY)
    DollarIndex,
}

impl IndicatorKind {
    /// 전체 지표 목록.
    pub const ALL: [IndicatorKind; 3] = [
        IndicatorKind::BtcDominance,
        IndicatorKind::KimchiPremium,
        IndicatorKind::DollarIndex,
    ];

    /// 표시 이름.
    pub fn display_name(&self) -> &'static str {
        match self {
            IndicatorKind::BtcDominance => "Bitcoin Dominance",
            IndicatorKind::KimchiPremium => "Kimchi Premium",
            IndicatorKind::DollarIndex => "Dollar Index",
        }
    }

    /// 표시 단위.
    pub fn unit(&self) -> &'static str {
        match self {
            IndicatorKind::BtcDominance | IndicatorKind::KimchiPremium => "%",
            IndicatorKind::DollarIndex => "DXY",
        }
    }

    /// 스냅샷 테이블의 컬럼명.
    pub fn column(&self) -> &'static str {
        match self {
            IndicatorKind::BtcDominance => "btc_dominance",
            IndicatorKind::KimchiPremium => "kimchi_premium",
            IndicatorKind::DollarIndex => "dollar_index",
        }
    }

    /// 이전 관측값이 없을 때 `value * ratio`로 이전값을 근사하는 비율.
    ///
    /// 측정값이 아닌 휴리스틱입니다.
    pub fn previous_seed_ratio(&self) -> f64 {
        match self {
            IndicatorKind::BtcDominance => 0.99,
            IndicatorKind::KimchiPremium => 0.95,
            IndicatorKind::DollarIndex => 0.998,
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column())
    }
}

impl std::str::FromStr for IndicatorKind {
    type Err = CoreError;

    /// `btc_dominance`, `btc-dominance`, `dominance` 형태를 모두 허용합니다.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "btc_dominance" | "dominance" => Ok(IndicatorKind::BtcDominance),
            "kimchi_premium" | "premium" => Ok(IndicatorKind::KimchiPremium),
            "dollar_index" | "dxy" => Ok(IndicatorKind::DollarIndex),
            other => Err(CoreError::InvalidInput(format!("unknown indicator: {}", other))),
        }
    }
}

/// 값이 어느 단계에서 해석되었는지.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// 30분 이내의 저장된 스냅샷
    Snapshot,
    /// 외부 API 실시간 조회
    Live,
    /// 합성 대체값
    Fallback,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Snapshot => write!(f, "snapshot"),
            Origin::Live => write!(f, "live"),
            Origin::Fallback => write!(f, "fallback"),
        }
    }
}

/// 출처 정보가 붙은 해석 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolved<T> {
    /// 해석된 값
    pub value: T,
    /// 값의 출처
    pub origin: Origin,
}

impl<T> Resolved<T> {
    pub fn new(value: T, origin: Origin) -> Self {
        Self { value, origin }
    }

    /// 값을 변환하면서 출처는 유지합니다.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolved<U> {
        Resolved {
            value: f(self.value),
            origin: self.origin,
        }
    }
}

/// 김치 프리미엄 계산에 사용된 원시 시세.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumDetails {
    /// Upbit BTC 원화 가격
    pub upbit_price_krw: f64,
    /// Binance BTC 달러(USDT) 가격
    pub binance_price_usd: f64,
    /// Binance 가격의 원화 환산값
    pub binance_price_krw: f64,
    /// 적용된 USD/KRW 환율
    pub usd_krw_rate: f64,
}

/// 표시 계층에 전달되는 지표 값.
///
/// 값은 반올림하지 않은 원시 `f64`이며, 반올림은 [`crate::format`]에서만 수행합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorValue {
    /// 지표 종류
    pub kind: IndicatorKind,
    /// 표시 이름
    pub name: String,
    /// 현재 값
    pub value: f64,
    /// 이전 값 (캐시된 관측값 또는 근사값)
    pub previous_value: f64,
    /// `value - previous_value`
    pub change: f64,
    /// `change / |previous_value| * 100` (이전값 0이면 0)
    pub change_percent: f64,
    /// 단위
    pub unit: String,
    /// 마지막 갱신 시각
    pub last_updated: DateTime<Utc>,
    /// 지표별 추가 필드 (김치 프리미엄의 원시 시세)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premium_details: Option<PremiumDetails>,
}

impl IndicatorValue {
    /// 현재값과 이전값으로 변화량을 계산해 생성합니다.
    pub fn new(
        kind: IndicatorKind,
        value: f64,
        previous_value: f64,
        last_updated: DateTime<Utc>,
    ) -> Self {
        let change = value - previous_value;
        Self {
            kind,
            name: kind.display_name().to_string(),
            value,
            previous_value,
            change,
            change_percent: change_percent(change, previous_value),
            unit: kind.unit().to_string(),
            last_updated,
            premium_details: None,
        }
    }

    /// 김치 프리미엄 원시 시세를 첨부합니다.
    pub fn with_premium_details(mut self, details: PremiumDetails) -> Self {
        self.premium_details = Some(details);
        self
    }
}

/// 변화율(%) 계산. 이전값이 0이면 0을 반환합니다.
pub fn change_percent(change: f64, previous_value: f64) -> f64 {
    if previous_value == 0.0 {
        0.0
    } else {
        change / previous_value.abs() * 100.0
    }
}
