//! 설정 관리.
//!
//! 기본값 → `config/default.toml`(선택) → `MARKET__SECTION__KEY` 환경 변수 순으로
//! 덮어쓰며 애플리케이션 설정을 로드합니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::error::CoreError;

/// 모든 소스가 실패했을 때의 처리 정책.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExhaustionPolicy {
    /// 합성 대체값으로 채움
    #[default]
    Fallback,
    /// "모든 소스 사용 불가" 에러를 호출자에게 전달
    Fail,
}

impl fmt::Display for ExhaustionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExhaustionPolicy::Fallback => write!(f, "fallback"),
            ExhaustionPolicy::Fail => write!(f, "fail"),
        }
    }
}

impl std::str::FromStr for ExhaustionPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fallback" => Ok(Self::Fallback),
            "fail" => Ok(Self::Fail),
            other => Err(CoreError::InvalidInput(format!(
                "on_exhaustion must be \"fallback\" or \"fail\", got {:?}",
                other
            ))),
        }
    }
}

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// 데이터베이스 설정
    pub database: DatabaseSettings,
    /// 로깅 설정
    pub logging: LoggingConfig,
    /// 외부 데이터 소스 설정
    pub sources: SourcesConfig,
    /// 재시도 설정
    pub retry: RetrySettings,
    /// 지표 해석 설정
    pub resolver: ResolverSettings,
    /// 수집기 설정
    pub collector: CollectorSettings,
}

/// 데이터베이스 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// 데이터베이스 URL (없으면 메모리 저장소 사용)
    pub url: Option<String>,
    /// 풀의 최대 연결 수
    pub max_connections: u32,
    /// 풀의 최소 연결 수
    pub min_connections: u32,
    /// 연결 타임아웃 (초)
    pub connect_timeout_secs: u64,
    /// 유휴 연결 타임아웃 (초)
    pub idle_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 10,
            idle_timeout_secs: 600,
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 외부 데이터 소스 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// CoinGecko REST API 기본 URL
    pub coingecko_base_url: String,
    /// Upbit REST API 기본 URL
    pub upbit_base_url: String,
    /// Binance REST API 기본 URL
    pub binance_base_url: String,
    /// 환율 API 기본 URL
    pub exchange_rate_base_url: String,
    /// Yahoo Finance 차트 API 기본 URL
    pub yahoo_base_url: String,
    /// FRED API 기본 URL
    pub fred_base_url: String,
    /// FRED API 키 (없으면 FRED 조회 생략)
    pub fred_api_key: Option<String>,
    /// 시세 스냅샷 대상 CoinGecko 코인 ID
    pub market_coin_ids: Vec<String>,
    /// CoinGecko 요청 타임아웃 (초)
    pub coingecko_timeout_secs: u64,
    /// 거래소(Upbit/Binance) 요청 타임아웃 (초)
    pub exchange_timeout_secs: u64,
    /// 환율 API 요청 타임아웃 (초)
    pub exchange_rate_timeout_secs: u64,
    /// Yahoo/FRED 요청 타임아웃 (초)
    pub index_timeout_secs: u64,
    /// CoinGecko 분당 요청 한도
    pub coingecko_requests_per_minute: u32,
    /// CoinGecko 버스트 허용량 (버킷 용량)
    pub coingecko_burst: u32,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            coingecko_base_url: "https://api.coingecko.com/api/v3".to_string(),
            upbit_base_url: "https://api.upbit.com/v1".to_string(),
            binance_base_url: "https://api.binance.com/api/v3".to_string(),
            exchange_rate_base_url: "https://api.exchangerate-api.com/v4".to_string(),
            yahoo_base_url: "https://query1.finance.yahoo.com".to_string(),
            fred_base_url: "https://api.stlouisfed.org/fred".to_string(),
            fred_api_key: None,
            market_coin_ids: [
                "bitcoin",
                "ethereum",
                "ripple",
                "cardano",
                "solana",
                "ondo-finance",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            coingecko_timeout_secs: 10,
            exchange_timeout_secs: 8,
            exchange_rate_timeout_secs: 8,
            index_timeout_secs: 15,
            coingecko_requests_per_minute: 30,
            coingecko_burst: 5,
        }
    }
}

impl SourcesConfig {
    /// CoinGecko 요청 타임아웃.
    pub fn coingecko_timeout(&self) -> Duration {
        Duration::from_secs(self.coingecko_timeout_secs)
    }

    /// 거래소 요청 타임아웃.
    pub fn exchange_timeout(&self) -> Duration {
        Duration::from_secs(self.exchange_timeout_secs)
    }

    /// 환율 API 요청 타임아웃.
    pub fn exchange_rate_timeout(&self) -> Duration {
        Duration::from_secs(self.exchange_rate_timeout_secs)
    }

    /// 지수(Yahoo/FRED) 요청 타임아웃.
    pub fn index_timeout(&self) -> Duration {
        Duration::from_secs(self.index_timeout_secs)
    }
}

/// 재시도 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrySettings {
    /// 최초 시도 이후 최대 재시도 횟수
    pub max_retries: u32,
    /// 일반 실패 기본 대기 시간 (밀리초)
    pub base_delay_ms: u64,
    /// 일반 실패 최대 대기 시간 (밀리초)
    pub max_delay_ms: u64,
    /// 요청 한도 초과 시 기본 대기 시간 (밀리초)
    pub rate_limit_base_delay_ms: u64,
    /// 요청 한도 초과 시 최대 대기 시간 (밀리초)
    pub rate_limit_max_delay_ms: u64,
    /// 요청 한도 초과 시 지수에 더해지는 오프셋
    pub rate_limit_exponent_offset: u32,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 1_000,
            max_delay_ms: 8_000,
            rate_limit_base_delay_ms: 2_000,
            rate_limit_max_delay_ms: 30_000,
            rate_limit_exponent_offset: 1,
        }
    }
}

/// 지표 해석 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolverSettings {
    /// 스냅샷을 최신으로 간주하는 최대 경과 시간 (분)
    pub freshness_minutes: i64,
    /// 모든 소스 실패 시 정책
    pub on_exhaustion: ExhaustionPolicy,
    /// 기간 내 히스토리가 없을 때 가져올 최근 행 수
    pub history_fallback_limit: i64,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            freshness_minutes: 30,
            on_exhaustion: ExhaustionPolicy::Fallback,
            history_fallback_limit: 100,
        }
    }
}

impl ResolverSettings {
    /// 신선도 기준을 chrono Duration으로 반환
    pub fn freshness(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.freshness_minutes)
    }
}

/// 수집기 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CollectorSettings {
    /// 데몬 모드 수집 주기 (분)
    pub interval_minutes: u64,
    /// 스냅샷에 기록할 수집 출처
    pub collection_source: String,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            interval_minutes: 60,
            collection_source: "market-collector".to_string(),
        }
    }
}

impl CollectorSettings {
    /// 수집 주기를 Duration으로 반환
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없어도 기본값과 환경 변수만으로 로드됩니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        dotenvy::dotenv().ok();

        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("MARKET")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut loaded: AppConfig = builder.build()?.try_deserialize()?;

        // 관례적인 DATABASE_URL도 허용
        if loaded.database.url.is_none() {
            loaded.database.url = std::env::var("DATABASE_URL").ok();
        }
        if loaded.sources.fred_api_key.is_none() {
            loaded.sources.fred_api_key = std::env::var("FRED_API_KEY").ok();
        }

        Ok(loaded)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, CoreError> {
        Self::load("config/default.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhaustion_policy_parse() {
        assert_eq!(
            "fallback".parse::<ExhaustionPolicy>().unwrap(),
            ExhaustionPolicy::Fallback
        );
        assert_eq!(" FAIL ".parse::<ExhaustionPolicy>().unwrap(), ExhaustionPolicy::Fail);
        assert!("mask".parse::<ExhaustionPolicy>().is_err());
    }

    #[test]
    fn test_exhaustion_policy_serde() {
        let json = serde_json::to_string(&ExhaustionPolicy::Fail).unwrap();
        assert_eq!(json, "\"fail\"");
        let parsed: ExhaustionPolicy = serde_json::from_str("\"fallback\"").unwrap();
        assert_eq!(parsed, ExhaustionPolicy::Fallback);
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.resolver.freshness(), chrono::Duration::minutes(30));
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.collector.interval(), Duration::from_secs(3600));
        assert!(config.sources.market_coin_ids.contains(&"bitcoin".to_string()));
        assert!(config.sources.exchange_timeout() >= Duration::from_secs(8));
        assert!(config.sources.index_timeout() <= Duration::from_secs(15));
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"resolver": {"on_exhaustion": "fail"}}"#).unwrap();
        assert_eq!(config.resolver.on_exhaustion, ExhaustionPolicy::Fail);
        assert_eq!(config.resolver.freshness_minutes, 30);
        assert_eq!(config.sources.coingecko_requests_per_minute, 30);
    }
}
