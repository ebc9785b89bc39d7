use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Token-bucket limiter keyed by string (identity, client IP, ...).
///
/// Each key gets `burst` tokens and regains one every `refill_interval`.
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, Bucket>>,
    burst: u32,
    refill_interval: Duration,
}

struct Bucket {
    tokens: f64,
    last_seen: Instant,
}

impl RateLimiter {
    pub fn new(burst: u32, refill_interval: Duration) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            burst,
            refill_interval,
        }
    }

    /// Take one token for `key`. Returns true if the action is allowed.
    pub fn allow(&self, key: &str) -> bool {
        let mut buckets = self.buckets.lock().unwrap();
        let now = Instant::now();

        let bucket = buckets.entry(key.to_string()).or_insert(Bucket {
            tokens: self.burst as f64,
            last_seen: now,
        });

        let refilled = now.duration_since(bucket.last_seen).as_secs_f64()
            / self.refill_interval.as_secs_f64();
        bucket.tokens = (bucket.tokens + refilled).min(self.burst as f64);
        bucket.last_seen = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Drop buckets that have been idle longer than `idle_for`.
    pub fn forget_idle(&self, idle_for: Duration) {
        let cutoff = Instant::now() - idle_for;
        self.buckets
            .lock()
            .unwrap()
            .retain(|_, bucket| bucket.last_seen > cutoff);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_then_denied() {
        let limiter = RateLimiter::new(3, Duration::from_secs(1));
        assert!(limiter.allow("alice"));
        assert!(limiter.allow("alice"));
        assert!(limiter.allow("alice"));
        assert!(!limiter.allow("alice"));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(1));
        assert!(limiter.allow("alice"));
        assert!(!limiter.allow("alice"));
        assert!(limiter.allow("bob"));
    }

    #[test]
    fn test_refill_restores_tokens() {
        let limiter = RateLimiter::new(2, Duration::from_secs(1));
        assert!(limiter.allow("alice"));
        assert!(limiter.allow("alice"));
        assert!(!limiter.allow("alice"));

        // Backdate the bucket so one token's worth of time has passed.
        {
            let mut buckets = limiter.buckets.lock().unwrap();
            buckets.get_mut("alice").unwrap().last_seen = Instant::now() - Duration::from_secs(1);
        }
        assert!(limiter.allow("alice"));
        assert!(!limiter.allow("alice"));
    }

    #[test]
    fn test_refill_caps_at_burst() {
        let limiter = RateLimiter::new(2, Duration::from_secs(1));
        assert!(limiter.allow("alice"));

        {
            let mut buckets = limiter.buckets.lock().unwrap();
            buckets.get_mut("alice").unwrap().last_seen = Instant::now() - Duration::from_secs(60);
        }
        assert!(limiter.allow("alice"));
        assert!(limiter.allow("alice"));
        assert!(!limiter.allow("alice"));
    }

    #[test]
    fn test_forget_idle() {
        let limiter = RateLimiter::new(2, Duration::from_secs(1));
        limiter.allow("stale");
        limiter.forget_idle(Duration::from_secs(0));
        assert!(limiter.buckets.lock().unwrap().is_empty());
    }
}
