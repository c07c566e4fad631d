/// Windowed admission control
///
/// Fixed-window rate limiting per client identity with two policy
/// variants:
/// - plain counter: every admitted call increments the window count
/// - unique-key counter: counts only distinct downstream cache keys per
///   window, and gates the identity behind a cooldown once the limit is
///   reached ("reset-and-gate": the counter resets when the block is set,
///   and during the cooldown the counter is never consulted)
///
/// Admission never raises; callers receive an `Admission` value and decide
/// propagation themselves.
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Outcome of an admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Denied {
        /// Seconds until the window resets or the cooldown ends
        retry_after: u64,
    },
}

impl Admission {
    pub fn is_allowed(self) -> bool {
        matches!(self, Admission::Allowed)
    }
}

/// Per-identity fixed-window state
#[derive(Debug)]
struct WindowState {
    window_start: Instant,
    count: u32,
    seen_keys: HashSet<String>,
    blocked_until: Option<Instant>,
}

impl WindowState {
    fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            count: 0,
            seen_keys: HashSet::new(),
            blocked_until: None,
        }
    }

    /// Reset the window if it has elapsed. Count and seen keys restart;
    /// an active block is independent of window expiry and survives.
    fn roll_window(&mut self, now: Instant, window: Duration) {
        if now.duration_since(self.window_start) >= window {
            self.window_start = now;
            self.count = 0;
            self.seen_keys.clear();
        }
    }

    fn remaining_block(&self, now: Instant) -> Option<Duration> {
        self.blocked_until
            .and_then(|until| until.checked_duration_since(now))
            .filter(|d| !d.is_zero())
    }

    fn window_remaining(&self, now: Instant, window: Duration) -> Duration {
        window.saturating_sub(now.duration_since(self.window_start))
    }
}

/// Fixed-window rate limiter shared across request workers.
///
/// All read-modify-write on a counter happens under one mutex, so
/// concurrent admission checks for the same identity are linearizable.
/// The lock is only held for the synchronous bookkeeping below, never
/// across I/O.
pub struct RateLimiter {
    states: Mutex<HashMap<String, WindowState>>,
    window: Duration,
    cooldown: Duration,
    /// On limiter backend failure (a poisoned lock here), allow instead of
    /// deny. Defaults to false: failing open defeats the quota guarantee.
    fail_open: bool,
}

impl RateLimiter {
    pub fn new(window: Duration, cooldown: Duration) -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
            window,
            cooldown,
            fail_open: false,
        }
    }

    pub fn with_fail_open(mut self, fail_open: bool) -> Self {
        self.fail_open = fail_open;
        self
    }

    fn backend_failure(&self) -> Admission {
        warn!("Rate limiter state unavailable, failing {}", if self.fail_open { "open" } else { "closed" });
        if self.fail_open {
            Admission::Allowed
        } else {
            Admission::Denied {
                retry_after: self.window.as_secs(),
            }
        }
    }

    /// Plain counter variant: every admitted call consumes quota
    pub fn admit(&self, identity: &str, limit: u32) -> Admission {
        let mut states = match self.states.lock() {
            Ok(guard) => guard,
            Err(_) => return self.backend_failure(),
        };

        let now = Instant::now();
        let state = states
            .entry(identity.to_string())
            .or_insert_with(|| WindowState::new(now));

        if let Some(remaining) = state.remaining_block(now) {
            return Admission::Denied {
                retry_after: remaining.as_secs().max(1),
            };
        }

        state.roll_window(now, self.window);

        if state.count >= limit {
            let retry_after = state.window_remaining(now, self.window).as_secs().max(1);
            warn!("Rate limit exceeded for identity: {}", identity);
            return Admission::Denied { retry_after };
        }

        state.count += 1;
        Admission::Allowed
    }

    /// Unique-key variant: repeated admissions carrying the same downstream
    /// cache key within one window never advance the counter past one for
    /// that key. Reaching `limit` distinct keys places the identity in a
    /// cooldown that outlasts the normal window reset.
    pub fn admit_unique(&self, identity: &str, cache_key: &str, limit: u32) -> Admission {
        let mut states = match self.states.lock() {
            Ok(guard) => guard,
            Err(_) => return self.backend_failure(),
        };

        let now = Instant::now();
        let state = states
            .entry(identity.to_string())
            .or_insert_with(|| WindowState::new(now));

        if let Some(remaining) = state.remaining_block(now) {
            debug!("Identity {} is in cooldown", identity);
            return Admission::Denied {
                retry_after: remaining.as_secs().max(1),
            };
        }
        state.blocked_until = None;

        state.roll_window(now, self.window);

        // Retries against an already-counted key do not consume quota.
        if state.seen_keys.contains(cache_key) {
            return Admission::Allowed;
        }

        state.seen_keys.insert(cache_key.to_string());
        state.count += 1;

        if state.count >= limit {
            // Reset-and-gate: the counter restarts and only the cooldown
            // gate governs until it ends.
            state.blocked_until = Some(now + self.cooldown);
            state.window_start = now;
            state.count = 0;
            state.seen_keys.clear();
            warn!(
                "Identity {} blocked for {}s after {} unique misses",
                identity,
                self.cooldown.as_secs(),
                limit
            );
            return Admission::Denied {
                retry_after: self.cooldown.as_secs().max(1),
            };
        }

        Admission::Allowed
    }

    /// Clear rate and block state for an identity (admin/testing)
    pub fn reset(&self, identity: &str) {
        if let Ok(mut states) = self.states.lock() {
            states.remove(identity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn limiter(window_ms: u64, cooldown_ms: u64) -> RateLimiter {
        RateLimiter::new(
            Duration::from_millis(window_ms),
            Duration::from_millis(cooldown_ms),
        )
    }

    #[test]
    fn test_plain_counter_exhaustion_and_reset() {
        let limiter = limiter(80, 1000);
        let limit = 3;

        for _ in 0..limit {
            assert_eq!(limiter.admit("1.2.3.4", limit), Admission::Allowed);
        }
        assert!(matches!(
            limiter.admit("1.2.3.4", limit),
            Admission::Denied { .. }
        ));

        // Window elapses; a fresh count of one admits again.
        std::thread::sleep(Duration::from_millis(120));
        assert_eq!(limiter.admit("1.2.3.4", limit), Admission::Allowed);
    }

    #[test]
    fn test_identities_are_independent() {
        let limiter = limiter(60_000, 1000);

        assert_eq!(limiter.admit("a", 1), Admission::Allowed);
        assert!(matches!(limiter.admit("a", 1), Admission::Denied { .. }));
        assert_eq!(limiter.admit("b", 1), Admission::Allowed);
    }

    #[test]
    fn test_denial_reports_retry_after() {
        let limiter = RateLimiter::new(Duration::from_secs(3600), Duration::from_secs(300));
        assert_eq!(limiter.admit("ip", 1), Admission::Allowed);
        match limiter.admit("ip", 1) {
            Admission::Denied { retry_after } => {
                assert!(retry_after >= 1 && retry_after <= 3600);
            }
            Admission::Allowed => panic!("expected denial"),
        }
    }

    #[test]
    fn test_unique_keys_deduplicate_within_window() {
        let limiter = limiter(60_000, 1000);
        let limit = 3;

        // The same key over and over never advances the counter past one.
        for _ in 0..10 {
            assert_eq!(
                limiter.admit_unique("ip", "video_analysis:v1:free", limit),
                Admission::Allowed
            );
        }

        // Distinct keys still consume quota; the third unique key trips
        // the block.
        assert_eq!(
            limiter.admit_unique("ip", "video_analysis:v2:free", limit),
            Admission::Allowed
        );
        assert!(matches!(
            limiter.admit_unique("ip", "video_analysis:v3:free", limit),
            Admission::Denied { .. }
        ));
    }

    #[test]
    fn test_block_outlasts_window_reset() {
        // Window far shorter than the cooldown.
        let limiter = limiter(30, 500);

        assert_eq!(limiter.admit_unique("ip", "k1", 2), Admission::Allowed);
        assert!(matches!(
            limiter.admit_unique("ip", "k2", 2),
            Admission::Denied { .. }
        ));

        // The window has long reset, but the cooldown still gates.
        std::thread::sleep(Duration::from_millis(80));
        assert!(matches!(
            limiter.admit_unique("ip", "k3", 2),
            Admission::Denied { .. }
        ));

        // After the cooldown the counter starts fresh.
        std::thread::sleep(Duration::from_millis(500));
        assert_eq!(limiter.admit_unique("ip", "k4", 2), Admission::Allowed);
    }

    #[test]
    fn test_reset_clears_state() {
        let limiter = limiter(60_000, 60_000);
        assert_eq!(limiter.admit("ip", 1), Admission::Allowed);
        limiter.reset("ip");
        assert_eq!(limiter.admit("ip", 1), Admission::Allowed);
    }

    #[test]
    fn test_no_lost_updates_under_concurrency() {
        let limiter = Arc::new(RateLimiter::new(
            Duration::from_secs(3600),
            Duration::from_secs(300),
        ));
        let limit = 64;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || {
                    let mut allowed = 0;
                    for _ in 0..100 {
                        if limiter.admit("shared", limit).is_allowed() {
                            allowed += 1;
                        }
                    }
                    allowed
                })
            })
            .collect();

        let total: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        // Exactly `limit` admissions across all threads, never more.
        assert_eq!(total, limit);
    }
}
