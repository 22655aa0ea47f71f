//! 데이터 모듈 오류 타입.

use market_core::IndicatorKind;
use thiserror::Error;

/// 업스트림 호출 단일 시도의 실패 원인.
///
/// 어댑터 내부에서만 쓰이며, 재시도 래퍼를 거치면 `None`으로 흡수됩니다.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    /// 연결 실패 등 네트워크 오류
    #[error("Network error: {0}")]
    Network(String),

    /// 요청 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 쿼터 초과 (HTTP 429)
    #[error("Rate limited by upstream")]
    RateLimited,

    /// 2xx 이외의 응답
    #[error("Unexpected status: {0}")]
    Status(u16),

    /// 응답 형식 오류 또는 필드 누락
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl FetchError {
    /// 쿼터 초과 여부 (확장 백오프 적용 대상).
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::RateLimited)
    }

    /// 필드 누락을 나타내는 오류 생성.
    pub fn missing(field: &str) -> Self {
        FetchError::Malformed(format!("missing field: {}", field))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else if err.is_decode() {
            FetchError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            if status.as_u16() == 429 {
                FetchError::RateLimited
            } else {
                FetchError::Status(status.as_u16())
            }
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Malformed(err.to_string())
    }
}

/// 스냅샷 저장소 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 데이터베이스 연결 오류
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// 쿼리 실행 오류
    #[error("Query error: {0}")]
    QueryError(String),

    /// 마이그레이션 오류
    #[error("Migration error: {0}")]
    MigrationError(String),

    /// 연결 풀 소진
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// 직렬화/역직렬화 오류
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// 설정 오류
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => DataError::PoolExhausted,
            sqlx::Error::Io(e) => DataError::ConnectionError(e.to_string()),
            sqlx::Error::Database(db_err) => DataError::QueryError(db_err.message().to_string()),
            _ => DataError::QueryError(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DataError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DataError::MigrationError(err.to_string())
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::SerializationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;

/// 지표 해석 실패.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ResolveError {
    /// 스냅샷/실시간 조회가 모두 실패했고 대체값 정책이 `fail`인 경우
    #[error("All sources unavailable for {indicator}")]
    AllSourcesUnavailable { indicator: IndicatorKind },

    /// 시세 스냅샷 조회 실패 (`fail` 정책)
    #[error("Market snapshot unavailable")]
    MarketUnavailable,
}

/// 대시보드 집계 실패.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AggregateError {
    /// 모든 구성 요소가 실패
    #[error("All dashboard members failed: {}", .failures.join("; "))]
    AllMembersFailed { failures: Vec<String> },
}
