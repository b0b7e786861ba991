use rand::Rng;
use std::time::Duration;

pub const DEFAULT_BASE: Duration = Duration::from_millis(1000);
pub const DEFAULT_JITTER: Duration = Duration::from_millis(1000);

/// Exponential delay `base * 2^attempt` plus uniform jitter below `jitter`.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    base: Duration,
    jitter: Duration,
}

impl Backoff {
    pub fn new(base: Duration, jitter: Duration) -> Self {
        Self { base, jitter }
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        let mut rng = rand::thread_rng();
        self.delay_with_rng(attempt, &mut rng)
    }

    pub fn delay_with_rng<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let base_ms = self.base.as_millis().min(u128::from(u64::MAX)) as u64;
        let jitter_ms = self.jitter.as_millis().min(u128::from(u64::MAX)) as u64;
        let shift = attempt.min(16);
        let exp = base_ms.saturating_mul(1u64 << shift);
        let extra = if jitter_ms > 0 {
            rng.gen_range(0..jitter_ms)
        } else {
            0
        };
        Duration::from_millis(exp.saturating_add(extra))
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(DEFAULT_BASE, DEFAULT_JITTER)
    }
}
