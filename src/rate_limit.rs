use std::time::{Duration, Instant};

const MINUTE: Duration = Duration::from_secs(60);
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Fixed-window request limiter for the generation API.
///
/// Tracks a rolling 60-second window of request times plus a daily counter.
/// The daily window resets 24h of wall-clock time after its start, not at
/// a calendar-day boundary, so the window drifts with first use.
/// Tokens-per-minute is carried in the quota but not enforced.
pub struct RateLimiter {
    rpm: usize,
    #[allow(dead_code)]
    tpm: u64,
    rpd: usize,
    request_times: Vec<Instant>,
    daily_requests: usize,
    last_reset: Instant,
}

impl RateLimiter {
    pub fn new(rpm: usize, tpm: u64, rpd: usize) -> Self {
        Self {
            rpm,
            tpm,
            rpd,
            request_times: Vec::new(),
            daily_requests: 0,
            last_reset: Instant::now(),
        }
    }

    /// Whether a request may be issued now. Returns the denial reason so the
    /// caller can print it while it sleeps and re-polls.
    pub fn can_make_request(&mut self) -> (bool, String) {
        self.can_make_request_at(Instant::now())
    }

    pub(crate) fn can_make_request_at(&mut self, now: Instant) -> (bool, String) {
        if now.duration_since(self.last_reset) >= DAY {
            self.daily_requests = 0;
            self.last_reset = now;
        }
        if self.daily_requests >= self.rpd {
            return (
                false,
                format!("Daily limit reached ({} requests/day)", self.rpd),
            );
        }
        self.request_times
            .retain(|t| now.duration_since(*t) < MINUTE);
        if self.request_times.len() >= self.rpm {
            let wait = 60 - now.duration_since(self.request_times[0]).as_secs();
            return (
                false,
                format!("Rate limit: wait {}s (max {} requests/min)", wait, self.rpm),
            );
        }
        (true, "OK".to_string())
    }

    /// Must be called exactly once right after every API call, whether or not
    /// the call succeeded. Failed calls still consume quota.
    pub fn record_request(&mut self) {
        self.record_request_at(Instant::now());
    }

    pub(crate) fn record_request_at(&mut self, now: Instant) {
        self.request_times.push(now);
        self.daily_requests += 1;
    }

    /// Seconds until the oldest request exits the rolling window, 0 if the
    /// window is empty or already expired.
    pub fn get_wait_time(&self) -> u64 {
        self.get_wait_time_at(Instant::now())
    }

    pub(crate) fn get_wait_time_at(&self, now: Instant) -> u64 {
        let Some(oldest) = self.request_times.first() else {
            return 0;
        };
        let elapsed = now.duration_since(*oldest).as_secs();
        if elapsed < 60 {
            60 - elapsed + 1
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minute_window_denies_and_recovers() {
        let mut limiter = RateLimiter::new(2, 1_000_000, 100);
        let t0 = Instant::now();

        limiter.record_request_at(t0);
        limiter.record_request_at(t0);

        let (ok, msg) = limiter.can_make_request_at(t0 + Duration::from_secs(1));
        assert!(!ok);
        assert_eq!(msg, "Rate limit: wait 59s (max 2 requests/min)");

        let wait = limiter.get_wait_time_at(t0 + Duration::from_secs(1));
        assert!(wait > 0 && wait <= 60);

        // After the oldest request leaves the window, requests are allowed again.
        let (ok, msg) = limiter.can_make_request_at(t0 + Duration::from_secs(61));
        assert!(ok);
        assert_eq!(msg, "OK");
    }

    #[test]
    fn test_daily_limit() {
        let mut limiter = RateLimiter::new(1000, 1_000_000, 3);
        let t0 = Instant::now();

        for i in 0..3 {
            // Spread out so the minute window never trips first.
            limiter.record_request_at(t0 + Duration::from_secs(i * 120));
        }

        let (ok, msg) = limiter.can_make_request_at(t0 + Duration::from_secs(600));
        assert!(!ok);
        assert_eq!(msg, "Daily limit reached (3 requests/day)");

        // The daily window resets 24h after its start, not at midnight.
        let (ok, _) = limiter.can_make_request_at(t0 + DAY);
        assert!(ok);
    }

    #[test]
    fn test_wait_time_empty_window() {
        let limiter = RateLimiter::new(10, 1_000_000, 100);
        assert_eq!(limiter.get_wait_time(), 0);
    }

    #[test]
    fn test_wait_time_expired_window() {
        let mut limiter = RateLimiter::new(10, 1_000_000, 100);
        let t0 = Instant::now();
        limiter.record_request_at(t0);
        assert_eq!(limiter.get_wait_time_at(t0 + Duration::from_secs(90)), 0);
        // One second of slack is added while the window is still live.
        assert_eq!(limiter.get_wait_time_at(t0 + Duration::from_secs(30)), 31);
    }

    #[test]
    fn test_record_after_failure_still_counts() {
        let mut limiter = RateLimiter::new(2, 1_000_000, 100);
        let t0 = Instant::now();
        // Two failed calls are still recorded, exhausting the minute quota.
        limiter.record_request_at(t0);
        limiter.record_request_at(t0);
        let (ok, _) = limiter.can_make_request_at(t0);
        assert!(!ok);
    }
}
