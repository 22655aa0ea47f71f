//! 이전 관측값 캐시.
//!
//! 지표별로 마지막으로 관측한 값을 기억해 변화량 계산의 기준으로 씁니다.
//! 해석기와 함께 생성되어 복제본끼리 공유되며, 프로세스가 해석기를 들고 있는 동안 유지됩니다.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use market_core::IndicatorKind;

/// 지표별 이전값 캐시.
#[derive(Debug, Clone, Default)]
pub struct PreviousValueCache {
    values: Arc<Mutex<HashMap<IndicatorKind, f64>>>,
}

impl PreviousValueCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 현재값을 기록하고 직전 관측값을 반환합니다.
    ///
    /// 관측 이력이 없으면 `value * seed_ratio`로 근사한 값을 반환합니다.
    pub fn observe(&self, kind: IndicatorKind, value: f64) -> f64 {
        let mut values = match self.values.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        values
            .insert(kind, value)
            .unwrap_or(value * kind.previous_seed_ratio())
    }

    /// 기록하지 않고 마지막 관측값만 조회.
    pub fn peek(&self, kind: IndicatorKind) -> Option<f64> {
        match self.values.lock() {
            Ok(guard) => guard.get(&kind).copied(),
            Err(poisoned) => poisoned.into_inner().get(&kind).copied(),
        }
    }
}
