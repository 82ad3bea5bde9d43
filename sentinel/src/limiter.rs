use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

//--------------------------------------------------------------------------------------------------
// Sliding window rate limiter
//--------------------------------------------------------------------------------------------------

// Once this many distinct clients are tracked, inserting a new one first sweeps records with no
// hit inside the window. Keeps the map bounded without a background task.
const SWEEP_THRESHOLD: usize = 1024;

/// Per-client sliding log limiter: at most `limit` admissions per rolling `window`, counted
/// against the exact timestamps of previous admissions. Safe to call from concurrent requests;
/// one lock guards the whole map.
pub struct SlidingWindowLimiter {
    limit: usize,
    window: Duration,
    hits: Mutex<HashMap<String, Vec<Instant>>>,
}

impl SlidingWindowLimiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        SlidingWindowLimiter {
            limit,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    pub fn allow(&self, client_key: &str) -> bool {
        self.allow_at(client_key, Instant::now())
    }

    fn allow_at(&self, client_key: &str, now: Instant) -> bool {
        let mut hits = self.hits.lock();

        if hits.len() >= SWEEP_THRESHOLD && !hits.contains_key(client_key) {
            Self::sweep(&mut hits, now, self.window);
        }

        let record = hits.entry(client_key.to_owned()).or_default();

        // A hit exactly one window old falls outside the window
        record.retain(|&hit| now.duration_since(hit) < self.window);

        if record.len() < self.limit {
            record.push(now);
            true
        } else {
            false
        }
    }

    fn sweep(hits: &mut HashMap<String, Vec<Instant>>, now: Instant, window: Duration) {
        let before = hits.len();
        hits.retain(|_, record| {
            record
                .iter()
                .any(|&hit| now.duration_since(hit) < window)
        });
        debug!("Swept {} stale rate limit records", before - hits.len());
    }

    pub fn tracked_clients(&self) -> usize {
        self.hits.lock().len()
    }
}

//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn millis(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    #[test]
    fn admits_up_to_limit_then_denies() {
        let limiter = SlidingWindowLimiter::new(3, Duration::from_secs(1));
        let now = Instant::now();

        assert!(limiter.allow_at("1.2.3.4", now));
        assert!(limiter.allow_at("1.2.3.4", now));
        assert!(limiter.allow_at("1.2.3.4", now));
        assert!(!limiter.allow_at("1.2.3.4", now));
    }

    #[test]
    fn window_slides() {
        // limit=2, window=1s: hits at 0.0s and 0.3s are admitted, 0.5s is denied, and 1.1s is
        // admitted again once the first hit ages out
        let limiter = SlidingWindowLimiter::new(2, Duration::from_secs(1));
        let start = Instant::now();

        assert!(limiter.allow_at("1.2.3.4", start));
        assert!(limiter.allow_at("1.2.3.4", start + millis(300)));
        assert!(!limiter.allow_at("1.2.3.4", start + millis(500)));
        assert!(limiter.allow_at("1.2.3.4", start + millis(1100)));
    }

    #[test]
    fn hit_exactly_one_window_old_is_pruned() {
        let limiter = SlidingWindowLimiter::new(1, Duration::from_secs(1));
        let start = Instant::now();

        assert!(limiter.allow_at("1.2.3.4", start));
        assert!(limiter.allow_at("1.2.3.4", start + millis(1000)));
    }

    #[test]
    fn denied_requests_are_not_recorded() {
        let limiter = SlidingWindowLimiter::new(1, Duration::from_secs(1));
        let start = Instant::now();

        assert!(limiter.allow_at("1.2.3.4", start));
        // Denials between 0s and 1s must not extend the block past the first hit aging out
        assert!(!limiter.allow_at("1.2.3.4", start + millis(400)));
        assert!(!limiter.allow_at("1.2.3.4", start + millis(800)));
        assert!(limiter.allow_at("1.2.3.4", start + millis(1100)));
    }

    #[test]
    fn clients_are_isolated() {
        let limiter = SlidingWindowLimiter::new(1, Duration::from_secs(1));
        let now = Instant::now();

        assert!(limiter.allow_at("1.2.3.4", now));
        assert!(!limiter.allow_at("1.2.3.4", now));
        assert!(limiter.allow_at("5.6.7.8", now));
    }

    #[test]
    fn stale_records_are_swept_when_the_map_grows() {
        let limiter = SlidingWindowLimiter::new(1, Duration::from_secs(1));
        let start = Instant::now();

        for n in 0..SWEEP_THRESHOLD {
            assert!(limiter.allow_at(&format!("10.0.{}.{}", n / 256, n % 256), start));
        }
        assert_eq!(limiter.tracked_clients(), SWEEP_THRESHOLD);

        // All prior records are stale by now, so the new client triggers a sweep
        assert!(limiter.allow_at("fresh-client", start + millis(2000)));
        assert_eq!(limiter.tracked_clients(), 1);
    }
}
