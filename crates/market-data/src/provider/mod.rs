//! 업스트림 데이터 소스 어댑터.
//!
//! 각 어댑터는 업스트림 호출 하나를 재시도 래퍼로 감싸고 필드 하나를 추출합니다.
//! 어떤 실패든 `None`으로 돌려주며 오류를 밖으로 던지지 않습니다.
//!
//! # 소스
//!
//! - **CoinGecko**: 비트코인 도미넌스, 코인 시세 스냅샷 (Token Bucket 적용)
//! - **Upbit**: BTC 원화 가격
//! - **Binance**: BTC 달러(USDT) 가격
//! - **ExchangeRate-API**: USD/KRW 환율 (실패 시 고정 환율)
//! - **Yahoo Finance**: 달러 인덱스
//! - **FRED**: 달러 인덱스 히스토리 대용 시계열

pub mod binance;
pub mod coingecko;
pub mod exchange_rate;
pub mod fred;
mod http;
pub mod upbit;
pub mod yahoo;

use async_trait::async_trait;

use market_core::{AppConfig, CryptoMarketEntry, HistoryPoint, RetrySettings, SourcesConfig};

pub use binance::BinanceClient;
pub use coingecko::CoinGeckoClient;
pub use exchange_rate::{rate_or_fallback, ExchangeRateClient, FALLBACK_USD_KRW_RATE};
pub use fred::FredClient;
pub use upbit::UpbitClient;
pub use yahoo::YahooChartClient;

use crate::error::FetchError;
use crate::retry::RetryConfig;

/// 지표 계산에 필요한 실시간 데이터 소스.
///
/// 해석기와 수집기는 이 트레잇에만 의존하므로 테스트에서 고정 응답 소스로 교체할 수 있습니다.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// BTC 시가총액 비중 (%).
    async fn btc_dominance(&self) -> Option<f64>;

    /// Upbit BTC 원화 가격.
    async fn upbit_btc_krw(&self) -> Option<f64>;

    /// Binance BTC 달러 가격.
    async fn binance_btc_usdt(&self) -> Option<f64>;

    /// USD/KRW 환율. 고정 환율 대체는 호출자가 [`rate_or_fallback`]로 결정합니다.
    async fn usd_krw_rate(&self) -> Option<f64>;

    /// 코인 시세 스냅샷.
    async fn market_snapshot(&self) -> Option<Vec<CryptoMarketEntry>>;

    /// 달러 인덱스 현재가.
    async fn dollar_index(&self) -> Option<f64>;

    /// 외부 달러 인덱스 히스토리 (지원하지 않으면 `None`).
    async fn dollar_index_history(&self, days: i64) -> Option<Vec<HistoryPoint>>;
}

/// 실제 업스트림 API를 호출하는 데이터 소스.
#[derive(Clone)]
pub struct LiveMarketSource {
    coingecko: CoinGeckoClient,
    upbit: UpbitClient,
    binance: BinanceClient,
    exchange_rate: ExchangeRateClient,
    yahoo: YahooChartClient,
    fred: FredClient,
}

impl LiveMarketSource {
    pub fn new(sources: &SourcesConfig, retry: &RetrySettings) -> Result<Self, FetchError> {
        let retry = RetryConfig::from(retry);

        Ok(Self {
            coingecko: CoinGeckoClient::new(sources, retry.clone())?,
            upbit: UpbitClient::new(sources, retry.clone())?,
            binance: BinanceClient::new(sources, retry.clone())?,
            exchange_rate: ExchangeRateClient::new(sources, retry.clone())?,
            yahoo: YahooChartClient::new(sources, retry.clone())?,
            fred: FredClient::new(sources, retry)?,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, FetchError> {
        Self::new(&config.sources, &config.retry)
    }
}

#[async_trait]
impl MarketDataSource for LiveMarketSource {
    async fn btc_dominance(&self) -> Option<f64> {
        self.coingecko.btc_dominance().await
    }

    async fn upbit_btc_krw(&self) -> Option<f64> {
        self.upbit.btc_krw_price().await
    }

    async fn binance_btc_usdt(&self) -> Option<f64> {
        self.binance.btc_usdt_price().await
    }

    async fn usd_krw_rate(&self) -> Option<f64> {
        self.exchange_rate.try_usd_krw_rate().await
    }

    async fn market_snapshot(&self) -> Option<Vec<CryptoMarketEntry>> {
        self.coingecko.market_snapshot().await
    }

    async fn dollar_index(&self) -> Option<f64> {
        self.yahoo.dollar_index().await
    }

    async fn dollar_index_history(&self, days: i64) -> Option<Vec<HistoryPoint>> {
        self.fred.dollar_index_history(days).await
    }
}
