//! 지표 스냅샷 저장소.
//!
//! 스냅샷 테이블은 append-only입니다. 읽기와 쓰기 인터페이스를 분리해
//! 해석기는 [`SnapshotReader`]에만, 수집기는 [`SnapshotWriter`]에만 의존합니다.
//!
//! - [`PgSnapshotStore`]: PostgreSQL (`crypto_hourly_data` 테이블)
//! - [`InMemorySnapshotStore`]: 테스트 및 DB 없는 실행용

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use market_core::{HistoryPoint, IndicatorKind, IndicatorSnapshot, IndicatorStats, NewSnapshot};

use crate::error::Result;

pub use memory::InMemorySnapshotStore;
pub use postgres::PgSnapshotStore;

/// 스냅샷 조회 인터페이스.
///
/// 모든 조회는 생성 시각(`created_at`) 기준이며, 같은 시각이면 `id`로 순서를 정합니다.
#[async_trait]
pub trait SnapshotReader: Send + Sync {
    /// `since` 이후 생성된 가장 최근 스냅샷.
    async fn latest_since(&self, since: DateTime<Utc>) -> Result<Option<IndicatorSnapshot>>;

    /// `since` 이후 지표 값이 있는 행의 시계열 (오래된 순).
    async fn history_since(
        &self,
        kind: IndicatorKind,
        since: DateTime<Utc>,
    ) -> Result<Vec<HistoryPoint>>;

    /// 기간과 무관하게 지표 값이 있는 최근 `limit`개 행 (오래된 순).
    async fn recent(&self, kind: IndicatorKind, limit: i64) -> Result<Vec<HistoryPoint>>;

    /// 전체 스냅샷 페이지 (최신 순).
    async fn all(&self, limit: i64, offset: i64) -> Result<Vec<IndicatorSnapshot>>;

    /// `since` 이후 지표 통계. 값이 하나도 없으면 `None`.
    async fn stats_since(
        &self,
        kind: IndicatorKind,
        since: DateTime<Utc>,
    ) -> Result<Option<IndicatorStats>>;
}

/// 스냅샷 추가 인터페이스.
#[async_trait]
pub trait SnapshotWriter: Send + Sync {
    /// 스냅샷 한 행을 추가하고 저장된 행을 반환합니다.
    async fn insert(&self, snapshot: NewSnapshot) -> Result<IndicatorSnapshot>;
}
