//! 수집 통계 구조체.

use market_core::{ApiHealth, SourceStatus};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 수집 작업 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionStats {
    /// 조회한 소스 수
    pub total: usize,
    /// 응답한 소스 수
    pub success: usize,
    /// 실패한 소스 수
    pub errors: usize,
    /// 채워진 지표 컬럼 수 (최대 3)
    pub indicators: usize,
    /// 저장된 코인 시세 수
    pub prices: usize,
    /// 저장된 스냅샷 id
    pub snapshot_id: Option<i64>,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CollectionStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 소스 상태 맵으로 성공/실패 수를 집계
    pub fn record_health(&mut self, health: &ApiHealth) {
        for status in health.0.values() {
            self.total += 1;
            match status {
                SourceStatus::Ok => self.success += 1,
                SourceStatus::Failed => self.errors += 1,
            }
        }
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.success as f64 / self.total as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            success = self.success,
            errors = self.errors,
            indicators = self.indicators,
            prices = self.prices,
            snapshot_id = ?self.snapshot_id,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "수집 완료"
        );
    }
}
