//! Token Bucket 기반 아웃바운드 요청 제한.
//!
//! 쿼터가 엄격한 업스트림(CoinGecko 무료 플랜) 앞에서 호출 빈도를 조절합니다.
//! 토큰은 획득 시도마다 경과 시간만큼 지연 리필되며, 백그라운드 타이머는 없습니다.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::trace;

/// 버킷 상태.
#[derive(Debug)]
struct BucketState {
    /// 현재 토큰 수
    tokens: f64,
    /// 마지막 리필 시간
    last_refill: Instant,
}

/// Token Bucket.
///
/// 복제본은 같은 버킷을 공유합니다.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    state: Arc<Mutex<BucketState>>,
    /// 최대 토큰 수 (버킷 용량)
    max_tokens: f64,
    /// 초당 리필되는 토큰 수
    refill_rate: f64,
}

impl TokenBucket {
    /// 가득 찬 버킷 생성.
    pub fn new(max_tokens: f64, refill_rate: f64) -> Self {
        let max_tokens = max_tokens.max(1.0);
        let refill_rate = if refill_rate > 0.0 { refill_rate } else { 1.0 };

        Self {
            state: Arc::new(Mutex::new(BucketState {
                tokens: max_tokens,
                last_refill: Instant::now(),
            })),
            max_tokens,
            refill_rate,
        }
    }

    /// 분당 요청 수와 버스트 허용량으로 생성.
    pub fn per_minute(requests_per_minute: u32, burst_size: u32) -> Self {
        let refill_rate = requests_per_minute as f64 / 60.0; // 초당 토큰
        let max_tokens = refill_rate + burst_size as f64;
        Self::new(max_tokens, refill_rate)
    }

    pub fn max_tokens(&self) -> f64 {
        self.max_tokens
    }

    pub fn refill_rate(&self) -> f64 {
        self.refill_rate
    }

    /// 토큰이 생길 때까지 대기한 뒤 하나를 소비합니다.
    ///
    /// 대기 중에는 `1000 / refill_rate` ms 간격으로 다시 확인합니다.
    pub async fn acquire(&self) {
        let poll_interval = self.poll_interval();

        loop {
            if self.try_acquire().await {
                return;
            }
            trace!(poll_ms = poll_interval.as_millis() as u64, "토큰 대기");
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// 토큰 소비 시도.
    ///
    /// 성공하면 `true`, 토큰이 없으면 대기하지 않고 `false` 반환.
    pub async fn try_acquire(&self) -> bool {
        let mut state = self.state.lock().await;
        self.refill(&mut state);

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// 현재 토큰 수 (리필 반영).
    pub async fn available(&self) -> f64 {
        let mut state = self.state.lock().await;
        self.refill(&mut state);
        state.tokens
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.refill_rate)
    }

    /// 토큰 리필.
    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();

        state.tokens = (state.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        state.last_refill = now;
    }
}
