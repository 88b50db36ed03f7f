//! Escalating lockout policy for failed PIN attempts.
//!
//! Pure decision logic: no I/O, no clock reads. Wall-clock time is passed
//! in by the caller, so the backoff math is testable with fixed timestamps
//! and tunable without touching the state machine.
//!
//! ## Policy
//! - Failures below the threshold only increment the counter.
//! - From the threshold on, each failure opens a lockout window whose
//!   duration escalates along a non-decreasing schedule (last entry
//!   repeats).
//! - A single success resets both counter and window unconditionally.

/// Failed attempts tolerated before a lockout window engages.
const DEFAULT_THRESHOLD: u32 = 3;

/// Escalating lockout windows in milliseconds: 30 s, 1 min, 5 min, 15 min.
const DEFAULT_BACKOFF_MS: &[u64] = &[30_000, 60_000, 300_000, 900_000];

/// Deterministic, side-effect-free lockout decisions over
/// `(failed_attempts, lockout_until, now)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockoutPolicy {
    threshold: u32,
    backoff_ms: Vec<u64>,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            backoff_ms: DEFAULT_BACKOFF_MS.to_vec(),
        }
    }
}

impl LockoutPolicy {
    /// Create a policy with custom tunables. The schedule is expected to
    /// be non-decreasing; an empty schedule falls back to the default.
    pub fn new(threshold: u32, backoff_ms: Vec<u64>) -> Self {
        let backoff_ms = if backoff_ms.is_empty() {
            DEFAULT_BACKOFF_MS.to_vec()
        } else {
            backoff_ms
        };
        Self {
            threshold: threshold.max(1),
            backoff_ms,
        }
    }

    /// Failures tolerated before a lockout window engages.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// True iff a lockout window is set and still strictly in the future.
    pub fn is_locked(&self, lockout_until: Option<u64>, now_ms: u64) -> bool {
        lockout_until.is_some_and(|until| until > now_ms)
    }

    /// Milliseconds left in the window (0 when not locked).
    pub fn remaining_ms(&self, lockout_until: Option<u64>, now_ms: u64) -> u64 {
        lockout_until.map_or(0, |until| until.saturating_sub(now_ms))
    }

    /// Record one failed attempt: increments the counter and, once the
    /// threshold is reached, computes the new lockout window end.
    pub fn record_failure(&self, failed_attempts: u32, now_ms: u64) -> (u32, Option<u64>) {
        let attempts = failed_attempts.saturating_add(1);
        if attempts < self.threshold {
            (attempts, None)
        } else {
            (attempts, Some(now_ms + self.delay_ms(attempts)))
        }
    }

    /// Reset after a successful verification or setup: full amnesty,
    /// regardless of how many failures came before.
    pub fn record_success(&self) -> (u32, Option<u64>) {
        (0, None)
    }

    /// Failures left before the next one engages a lockout window
    /// (0 once the counter has reached the threshold).
    pub fn attempts_remaining(&self, failed_attempts: u32) -> u32 {
        self.threshold.saturating_sub(failed_attempts)
    }

    /// Window duration for the given counter value (>= threshold).
    /// Escalates along the schedule; the last entry repeats.
    fn delay_ms(&self, attempts: u32) -> u64 {
        let step = attempts.saturating_sub(self.threshold) as usize;
        let idx = step.min(self.backoff_ms.len() - 1);
        self.backoff_ms[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000_000;

    #[test]
    fn below_threshold_only_counts() {
        let policy = LockoutPolicy::default();

        let (attempts, lockout) = policy.record_failure(0, NOW);
        assert_eq!((attempts, lockout), (1, None));

        let (attempts, lockout) = policy.record_failure(attempts, NOW);
        assert_eq!((attempts, lockout), (2, None));
    }

    #[test]
    fn threshold_failure_opens_window_strictly_after_now() {
        let policy = LockoutPolicy::default();
        let (attempts, lockout) = policy.record_failure(2, NOW);

        assert_eq!(attempts, 3);
        let until = lockout.unwrap();
        assert!(until > NOW);
        assert_eq!(until, NOW + 30_000);
    }

    #[test]
    fn windows_escalate_and_cap_at_last_entry() {
        let policy = LockoutPolicy::default();

        assert_eq!(policy.record_failure(2, NOW).1, Some(NOW + 30_000));
        assert_eq!(policy.record_failure(3, NOW).1, Some(NOW + 60_000));
        assert_eq!(policy.record_failure(4, NOW).1, Some(NOW + 300_000));
        assert_eq!(policy.record_failure(5, NOW).1, Some(NOW + 900_000));
        // Past the schedule the last window repeats
        assert_eq!(policy.record_failure(20, NOW).1, Some(NOW + 900_000));
    }

    #[test]
    fn counter_is_monotonic() {
        let policy = LockoutPolicy::default();
        let mut attempts = 0;
        for _ in 0..10 {
            let (next, _) = policy.record_failure(attempts, NOW);
            assert!(next > attempts);
            attempts = next;
        }
    }

    #[test]
    fn success_resets_unconditionally() {
        let policy = LockoutPolicy::default();
        assert_eq!(policy.record_success(), (0, None));
    }

    #[test]
    fn is_locked_respects_window_boundaries() {
        let policy = LockoutPolicy::default();

        assert!(!policy.is_locked(None, NOW));
        assert!(policy.is_locked(Some(NOW + 1), NOW));
        // An expired or exactly-elapsed window no longer locks
        assert!(!policy.is_locked(Some(NOW), NOW));
        assert!(!policy.is_locked(Some(NOW - 1), NOW));
    }

    #[test]
    fn remaining_ms_counts_down_to_zero() {
        let policy = LockoutPolicy::default();

        assert_eq!(policy.remaining_ms(Some(NOW + 5_000), NOW), 5_000);
        assert_eq!(policy.remaining_ms(Some(NOW - 5_000), NOW), 0);
        assert_eq!(policy.remaining_ms(None, NOW), 0);
    }

    #[test]
    fn attempts_remaining_tracks_threshold() {
        let policy = LockoutPolicy::default();

        assert_eq!(policy.attempts_remaining(0), 3);
        assert_eq!(policy.attempts_remaining(2), 1);
        assert_eq!(policy.attempts_remaining(3), 0);
        assert_eq!(policy.attempts_remaining(7), 0);
    }

    #[test]
    fn custom_schedule_is_honored() {
        let policy = LockoutPolicy::new(2, vec![1_000, 2_000]);

        assert_eq!(policy.record_failure(0, NOW), (1, None));
        assert_eq!(policy.record_failure(1, NOW), (2, Some(NOW + 1_000)));
        assert_eq!(policy.record_failure(2, NOW), (3, Some(NOW + 2_000)));
        assert_eq!(policy.record_failure(3, NOW), (4, Some(NOW + 2_000)));
    }

    #[test]
    fn empty_schedule_falls_back_to_default() {
        let policy = LockoutPolicy::new(3, Vec::new());
        assert_eq!(policy.record_failure(2, NOW).1, Some(NOW + 30_000));
    }
}
