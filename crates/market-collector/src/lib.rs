//! 마켓 지표 대시보드용 독립 수집기.
//!
//! 이 crate는 API 서버와 독립적으로 동작하는 바이너리를 제공합니다:
//! - 지표 스냅샷 수집 (단발 / 데몬)
//! - 저장된 스냅샷 조회 (대시보드, 히스토리, 통계)

pub mod config;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::CollectorConfig;
pub use error::{CollectorError, Result};
pub use stats::CollectionStats;
