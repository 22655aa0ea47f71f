//! 재시도 래퍼.
//!
//! 업스트림 호출 하나를 지수 백오프로 재시도합니다. 재시도 예산을 모두 쓰면
//! 오류 대신 `None`을 반환합니다.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use market_core::RetrySettings;

use crate::error::FetchError;

/// 재시도 설정.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// 최초 시도 이후 재시도 횟수 (총 시도 = max_retries + 1)
    pub max_retries: u32,
    /// 일반 실패 기본 대기
    pub base_delay: Duration,
    /// 일반 실패 최대 대기
    pub max_delay: Duration,
    /// 429 응답 기본 대기
    pub rate_limit_base_delay: Duration,
    /// 429 응답 최대 대기
    pub rate_limit_max_delay: Duration,
    /// 429 응답 지수 오프셋
    pub rate_limit_exponent_offset: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            base_delay: Duration::from_millis(settings.base_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
            rate_limit_base_delay: Duration::from_millis(settings.rate_limit_base_delay_ms),
            rate_limit_max_delay: Duration::from_millis(settings.rate_limit_max_delay_ms),
            rate_limit_exponent_offset: settings.rate_limit_exponent_offset,
        }
    }
}

impl RetryConfig {
    /// 재시도 없는 설정 (테스트용).
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// `attempt`번째(0부터) 시도가 실패한 뒤의 대기 시간.
    ///
    /// 일반 실패: `min(base * 2^attempt, max)`
    /// 429: `min(rate_limit_base * 2^(attempt + offset), rate_limit_max)`
    pub fn backoff_delay(&self, attempt: u32, rate_limited: bool) -> Duration {
        let (base, cap, exponent) = if rate_limited {
            (
                self.rate_limit_base_delay,
                self.rate_limit_max_delay,
                attempt.saturating_add(self.rate_limit_exponent_offset),
            )
        } else {
            (self.base_delay, self.max_delay, attempt)
        };

        let factor = 2u32.checked_pow(exponent).unwrap_or(u32::MAX);
        base.checked_mul(factor).unwrap_or(cap).min(cap)
    }
}

/// 호출을 재시도하며 성공 값을 반환합니다.
///
/// 오류 종류와 관계없이 `max_retries + 1`번 시도하고, 모두 실패하면 `None`을 반환합니다.
pub async fn with_retry<T, F, Fut>(label: &str, config: &RetryConfig, mut call: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let attempts = config.max_retries + 1;

    for attempt in 0..attempts {
        match call().await {
            Ok(value) => return Some(value),
            Err(e) => {
                let last = attempt + 1 == attempts;
                if last {
                    warn!(
                        source = label,
                        attempts = attempt + 1,
                        error = %e,
                        "업스트림 호출 최종 실패"
                    );
                    return None;
                }

                let delay = config.backoff_delay(attempt, e.is_rate_limited());
                debug!(
                    source = label,
                    attempt = attempt + 1,
                    max_attempts = attempts,
                    delay_ms = delay.as_millis() as u64,
                    rate_limited = e.is_rate_limited(),
                    error = %e,
                    "업스트림 호출 실패, 재시도 예정"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }

    None
}
