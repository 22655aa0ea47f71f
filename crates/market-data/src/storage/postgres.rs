//! PostgreSQL 스냅샷 저장소.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::time::Duration;
use tracing::{debug, info, instrument};

use market_core::{
    DatabaseSettings, HistoryPoint, IndicatorKind, IndicatorSnapshot, IndicatorStats, NewSnapshot,
};

use super::{SnapshotReader, SnapshotWriter};
use crate::error::{DataError, Result};

const SNAPSHOT_COLUMNS: &str = "id, timestamp, btc_dominance, kimchi_premium, dollar_index, \
     btc_price, btc_change_24h, crypto_prices, collection_source, api_health, created_at";

/// 스냅샷 테이블 레코드.
#[derive(Debug, Clone, FromRow)]
pub struct SnapshotRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub btc_dominance: Option<f64>,
    pub kimchi_premium: Option<f64>,
    pub dollar_index: Option<f64>,
    pub btc_price: Option<f64>,
    pub btc_change_24h: Option<f64>,
    pub crypto_prices: Option<serde_json::Value>,
    pub collection_source: String,
    pub api_health: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<SnapshotRecord> for IndicatorSnapshot {
    fn from(r: SnapshotRecord) -> Self {
        Self {
            id: r.id,
            timestamp: r.timestamp,
            btc_dominance: r.btc_dominance,
            kimchi_premium: r.kimchi_premium,
            dollar_index: r.dollar_index,
            btc_price: r.btc_price,
            btc_change_24h: r.btc_change_24h,
            crypto_prices: r.crypto_prices,
            collection_source: r.collection_source,
            api_health: r.api_health,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct PointRecord {
    timestamp: DateTime<Utc>,
    value: f64,
}

#[derive(Debug, FromRow)]
struct StatsRecord {
    average: Option<f64>,
    min: Option<f64>,
    max: Option<f64>,
    count: i64,
}

/// PostgreSQL 스냅샷 저장소.
#[derive(Clone)]
pub struct PgSnapshotStore {
    pool: PgPool,
}

impl PgSnapshotStore {
    /// 설정으로 연결 풀을 생성합니다.
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self> {
        let url = settings
            .url
            .as_deref()
            .ok_or_else(|| DataError::ConfigError("DATABASE_URL이 설정되지 않았습니다".into()))?;

        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(settings.idle_timeout_secs))
            .connect(url)
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        info!("Database connection established");

        Ok(Self { pool })
    }

    /// 기존 연결 풀 재사용.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 데이터베이스 마이그레이션을 실행합니다.
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations...");
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully");
        Ok(())
    }
}

#[async_trait]
impl SnapshotReader for PgSnapshotStore {
    #[instrument(skip(self))]
    async fn latest_since(&self, since: DateTime<Utc>) -> Result<Option<IndicatorSnapshot>> {
        let record: Option<SnapshotRecord> = sqlx::query_as(&format!(
            r#"
            SELECT {SNAPSHOT_COLUMNS}
            FROM crypto_hourly_data
            WHERE created_at >= $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#
        ))
        .bind(since)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(IndicatorSnapshot::from))
    }

    #[instrument(skip(self))]
    async fn history_since(
        &self,
        kind: IndicatorKind,
        since: DateTime<Utc>,
    ) -> Result<Vec<HistoryPoint>> {
        let column = kind.column();
        let records: Vec<PointRecord> = sqlx::query_as(&format!(
            r#"
            SELECT created_at AS timestamp, {column} AS value
            FROM crypto_hourly_data
            WHERE {column} IS NOT NULL AND created_at >= $1
            ORDER BY created_at ASC, id ASC
            "#
        ))
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        debug!(indicator = %kind, count = records.len(), "히스토리 조회");

        Ok(records
            .into_iter()
            .map(|r| HistoryPoint::new(r.timestamp, r.value))
            .collect())
    }

    #[instrument(skip(self))]
    async fn recent(&self, kind: IndicatorKind, limit: i64) -> Result<Vec<HistoryPoint>> {
        let column = kind.column();
        let records: Vec<PointRecord> = sqlx::query_as(&format!(
            r#"
            SELECT created_at AS timestamp, {column} AS value
            FROM crypto_hourly_data
            WHERE {column} IS NOT NULL
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        // 시간순 정렬 (오래된 것부터)
        let mut points: Vec<HistoryPoint> = records
            .into_iter()
            .map(|r| HistoryPoint::new(r.timestamp, r.value))
            .collect();
        points.reverse();

        Ok(points)
    }

    #[instrument(skip(self))]
    async fn all(&self, limit: i64, offset: i64) -> Result<Vec<IndicatorSnapshot>> {
        let records: Vec<SnapshotRecord> = sqlx::query_as(&format!(
            r#"
            SELECT {SNAPSHOT_COLUMNS}
            FROM crypto_hourly_data
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(IndicatorSnapshot::from).collect())
    }

    #[instrument(skip(self))]
    async fn stats_since(
        &self,
        kind: IndicatorKind,
        since: DateTime<Utc>,
    ) -> Result<Option<IndicatorStats>> {
        let column = kind.column();
        let record: StatsRecord = sqlx::query_as(&format!(
            r#"
            SELECT AVG({column}) AS average,
                   MIN({column}) AS min,
                   MAX({column}) AS max,
                   COUNT({column}) AS count
            FROM crypto_hourly_data
            WHERE {column} IS NOT NULL AND created_at >= $1
            "#
        ))
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(match (record.average, record.min, record.max) {
            (Some(average), Some(min), Some(max)) if record.count > 0 => Some(IndicatorStats {
                average,
                min,
                max,
                count: record.count as usize,
            }),
            _ => None,
        })
    }
}

#[async_trait]
impl SnapshotWriter for PgSnapshotStore {
    #[instrument(skip(self, snapshot), fields(source = %snapshot.collection_source))]
    async fn insert(&self, snapshot: NewSnapshot) -> Result<IndicatorSnapshot> {
        let record: SnapshotRecord = sqlx::query_as(&format!(
            r#"
            INSERT INTO crypto_hourly_data
                (timestamp, btc_dominance, kimchi_premium, dollar_index, btc_price,
                 btc_change_24h, crypto_prices, collection_source, api_health)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {SNAPSHOT_COLUMNS}
            "#
        ))
        .bind(snapshot.timestamp)
        .bind(snapshot.btc_dominance)
        .bind(snapshot.kimchi_premium)
        .bind(snapshot.dollar_index)
        .bind(snapshot.btc_price)
        .bind(snapshot.btc_change_24h)
        .bind(&snapshot.crypto_prices)
        .bind(&snapshot.collection_source)
        .bind(snapshot.api_health.to_json())
        .fetch_one(&self.pool)
        .await?;

        debug!(id = record.id, "스냅샷 저장");

        Ok(record.into())
    }
}
