//! 수집기 설정 모듈.
//!
//! 공용 [`AppConfig`]를 기반으로 하고, 데몬 관련 값은 환경변수로 덮어씁니다.

use market_core::AppConfig;
use std::time::Duration;

use crate::Result;

/// 설정 파일 경로 환경변수
const CONFIG_PATH_VAR: &str = "MARKET_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 공용 애플리케이션 설정 (DB, 소스, 재시도, 해석기)
    pub app: AppConfig,
    /// 스냅샷에 기록할 수집 출처
    pub collection_source: String,
    /// 데몬 모드 설정
    pub daemon: DaemonConfig,
}

/// 데몬 모드 설정
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// 수집 주기 (분 단위)
    pub interval_minutes: u64,
}

impl CollectorConfig {
    /// 설정 파일과 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let path =
            std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let app = AppConfig::load(&path)?;

        Ok(Self::from_app(app))
    }

    /// 로드된 애플리케이션 설정에 환경변수 오버라이드를 적용
    pub fn from_app(app: AppConfig) -> Self {
        let daemon = DaemonConfig {
            interval_minutes: env_var_parse(
                "DAEMON_INTERVAL_MINUTES",
                app.collector.interval_minutes,
            ),
        };
        let collection_source = std::env::var("COLLECTION_SOURCE")
            .unwrap_or_else(|_| app.collector.collection_source.clone());

        Self {
            app,
            collection_source,
            daemon,
        }
    }

    /// DB URL (없으면 설정 에러)
    pub fn database_url(&self) -> Result<&str> {
        self.app.database.url.as_deref().ok_or_else(|| {
            crate::error::CollectorError::Config(
                "DATABASE_URL 환경변수가 설정되지 않았습니다".to_string(),
            )
        })
    }
}

impl DaemonConfig {
    /// 수집 주기를 Duration으로 반환. 0분은 1분으로 취급.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.max(1) * 60)
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
