//! 마켓 지표 데이터 수집 계층.
//!
//! 이 crate는 다음을 제공합니다:
//! - 쿼터 보호용 Token Bucket 제한기
//! - 지수 백오프 재시도 래퍼
//! - 업스트림 소스 어댑터 (CoinGecko, Upbit, Binance, 환율, Yahoo, FRED)
//! - append-only 스냅샷 저장소 (PostgreSQL / 메모리)
//! - 지표 해석기 (스냅샷 → 실시간 → 종단 처리)
//! - 대시보드 집계기

pub mod aggregator;
pub mod cache;
pub mod error;
pub mod provider;
pub mod rate_limiter;
pub mod resolver;
pub mod retry;
pub mod storage;
pub mod synthetic;

pub use aggregator::{DashboardAggregator, DashboardData, DashboardMember, MemberFailure};
pub use cache::PreviousValueCache;
pub use error::{AggregateError, DataError, FetchError, ResolveError, Result};
pub use provider::{LiveMarketSource, MarketDataSource, FALLBACK_USD_KRW_RATE};
pub use rate_limiter::TokenBucket;
pub use resolver::IndicatorResolver;
pub use retry::{with_retry, RetryConfig};
pub use storage::{InMemorySnapshotStore, PgSnapshotStore, SnapshotReader, SnapshotWriter};
