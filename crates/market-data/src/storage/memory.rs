//! 메모리 기반 스냅샷 저장소.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

use market_core::{HistoryPoint, IndicatorKind, IndicatorSnapshot, IndicatorStats, NewSnapshot};

use super::{SnapshotReader, SnapshotWriter};
use crate::error::Result;

#[derive(Debug, Default)]
struct Inner {
    rows: Vec<IndicatorSnapshot>,
    next_id: i64,
}

/// 메모리 스냅샷 저장소.
///
/// PostgreSQL 저장소와 같은 정렬 규칙(`created_at`, 동률이면 `id`)을 따릅니다.
/// 복제본은 같은 행 집합을 공유합니다.
#[derive(Debug, Clone, Default)]
pub struct InMemorySnapshotStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 생성 시각을 지정해 추가합니다.
    pub async fn insert_at(
        &self,
        snapshot: NewSnapshot,
        created_at: DateTime<Utc>,
    ) -> IndicatorSnapshot {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let row = snapshot.into_snapshot(inner.next_id, created_at);
        inner.rows.push(row.clone());
        row
    }

    /// 저장된 행 수.
    pub async fn len(&self) -> usize {
        self.inner.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// 오래된 순으로 정렬된 행 복사본.
    async fn sorted_rows(&self) -> Vec<IndicatorSnapshot> {
        let mut rows = self.inner.read().await.rows.clone();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        rows
    }

    async fn values_since(&self, kind: IndicatorKind, since: DateTime<Utc>) -> Vec<HistoryPoint> {
        self.sorted_rows()
            .await
            .into_iter()
            .filter(|row| row.created_at >= since)
            .filter_map(|row| row.indicator(kind).map(|v| HistoryPoint::new(row.created_at, v)))
            .collect()
    }
}

#[async_trait]
impl SnapshotReader for InMemorySnapshotStore {
    async fn latest_since(&self, since: DateTime<Utc>) -> Result<Option<IndicatorSnapshot>> {
        Ok(self
            .sorted_rows()
            .await
            .into_iter()
            .filter(|row| row.created_at >= since)
            .last())
    }

    async fn history_since(
        &self,
        kind: IndicatorKind,
        since: DateTime<Utc>,
    ) -> Result<Vec<HistoryPoint>> {
        Ok(self.values_since(kind, since).await)
    }

    async fn recent(&self, kind: IndicatorKind, limit: i64) -> Result<Vec<HistoryPoint>> {
        let points = self.values_since(kind, DateTime::<Utc>::MIN_UTC).await;
        let skip = points.len().saturating_sub(limit.max(0) as usize);
        Ok(points.into_iter().skip(skip).collect())
    }

    async fn all(&self, limit: i64, offset: i64) -> Result<Vec<IndicatorSnapshot>> {
        let mut rows = self.sorted_rows().await;
        rows.reverse();
        Ok(rows
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn stats_since(
        &self,
        kind: IndicatorKind,
        since: DateTime<Utc>,
    ) -> Result<Option<IndicatorStats>> {
        let values: Vec<f64> = self
            .values_since(kind, since)
            .await
            .into_iter()
            .map(|p| p.value)
            .collect();
        Ok(IndicatorStats::from_values(&values))
    }
}

#[async_trait]
impl SnapshotWriter for InMemorySnapshotStore {
    async fn insert(&self, snapshot: NewSnapshot) -> Result<IndicatorSnapshot> {
        Ok(self.insert_at(snapshot, Utc::now()).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use market_core::ApiHealth;

    fn snapshot(dominance: Option<f64>) -> NewSnapshot {
        NewSnapshot {
            timestamp: Utc::now(),
            btc_dominance: dominance,
            kimchi_premium: None,
            dollar_index: None,
            btc_price: None,
            btc_change_24h: None,
            crypto_prices: None,
            collection_source: "test".to_string(),
            api_health: ApiHealth::new(),
        }
    }

    #[tokio::test]
    async fn test_latest_breaks_ties_by_id() {
        let store = InMemorySnapshotStore::new();
        let now = Utc::now();

        store.insert_at(snapshot(Some(50.0)), now).await;
        let second = store.insert_at(snapshot(Some(51.0)), now).await;

        let latest = store.latest_since(now - Duration::minutes(30)).await.unwrap();
        assert_eq!(latest.map(|s| s.id), Some(second.id));
    }

    #[tokio::test]
    async fn test_latest_respects_window() {
        let store = InMemorySnapshotStore::new();
        let now = Utc::now();
        store
            .insert_at(snapshot(Some(50.0)), now - Duration::minutes(45))
            .await;

        assert!(store
            .latest_since(now - Duration::minutes(30))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_history_skips_null_and_orders_ascending() {
        let store = InMemorySnapshotStore::new();
        let now = Utc::now();
        store.insert_at(snapshot(Some(52.0)), now - Duration::hours(1)).await;
        store.insert_at(snapshot(None), now - Duration::hours(2)).await;
        store.insert_at(snapshot(Some(51.0)), now - Duration::hours(3)).await;
        store.insert_at(snapshot(Some(49.0)), now - Duration::hours(30)).await;

        let points = store
            .history_since(IndicatorKind::BtcDominance, now - Duration::hours(24))
            .await
            .unwrap();
        let values: Vec<f64> = points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![51.0, 52.0]);

        // 새 스냅샷이 없으면 같은 결과
        let again = store
            .history_since(IndicatorKind::BtcDominance, now - Duration::hours(24))
            .await
            .unwrap();
        assert_eq!(points, again);
    }

    #[tokio::test]
    async fn test_recent_returns_newest_rows_ascending() {
        let store = InMemorySnapshotStore::new();
        let now = Utc::now();
        for i in 0..5 {
            store
                .insert_at(snapshot(Some(i as f64)), now - Duration::days(10 - i))
                .await;
        }

        let points = store.recent(IndicatorKind::BtcDominance, 3).await.unwrap();
        let values: Vec<f64> = points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
    }

    #[tokio::test]
    async fn test_all_pagination_newest_first() {
        let store = InMemorySnapshotStore::new();
        let now = Utc::now();
        for i in 0..5 {
            store
                .insert_at(snapshot(Some(i as f64)), now - Duration::hours(5 - i))
                .await;
        }

        let page = store.all(2, 1).await.unwrap();
        let values: Vec<Option<f64>> = page.iter().map(|s| s.btc_dominance).collect();
        assert_eq!(values, vec![Some(3.0), Some(2.0)]);
    }

    #[tokio::test]
    async fn test_stats() {
        let store = InMemorySnapshotStore::new();
        let now = Utc::now();
        store.insert_at(snapshot(Some(50.0)), now).await;
        store.insert_at(snapshot(Some(54.0)), now).await;

        let stats = store
            .stats_since(IndicatorKind::BtcDominance, now - Duration::hours(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stats.average, 52.0);
        assert_eq!(stats.count, 2);

        assert!(store
            .stats_since(IndicatorKind::DollarIndex, now - Duration::hours(1))
            .await
            .unwrap()
            .is_none());
    }
}
