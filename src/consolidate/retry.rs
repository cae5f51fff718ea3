use rand::Rng;
use std::time::Duration;

/// Ceiling for a single backoff pause, whatever the attempt number.
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Bounded exponential backoff: base, 2x, 4x, ... capped at [`MAX_BACKOFF`],
/// plus up to 20% jitter so retries against the cluster do not align.
pub fn backoff_delay(attempt: u32, base: Duration) -> Duration {
    let factor = 1u32 << attempt.min(16);
    let capped = base.saturating_mul(factor).min(MAX_BACKOFF);
    let jitter_ms = rand::thread_rng().gen_range(0..=(capped.as_millis() as u64 / 5));
    capped + Duration::from_millis(jitter_ms)
}
