// Token bucket shared by all outgoing exchange requests.
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Refills continuously at `requests_per_minute / 60` tokens per second.
/// Held behind `Arc<Mutex<RateLimiter>>`, so no internal locking.
#[derive(Debug)]
pub struct RateLimiter {
    tokens: f64,
    max_tokens: f64,
    rate_per_sec: f64,
    last_update: Instant,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        let rpm = f64::from(requests_per_minute.max(1));
        Self {
            tokens: rpm,
            max_tokens: rpm,
            rate_per_sec: rpm / 60.0,
            last_update: Instant::now(),
        }
    }

    /// Waits until a token is available, then takes it.
    pub async fn acquire(&mut self) {
        while !self.try_acquire() {
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    pub fn try_acquire(&mut self) -> bool {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    pub fn available(&self) -> f64 {
        self.tokens
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate_per_sec).min(self.max_tokens);
        self.last_update = now;
    }
}
