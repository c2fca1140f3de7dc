//! Reconnection with exponential backoff for a lost indicator device.
//!
//! When the serial device disappears (unplugged, firmware reset, port taken
//! by another program), periodic reopen attempts back off exponentially so a
//! missing device doesn't cost a blocking open every tick. A hotplug event
//! resets the schedule so the next attempt happens immediately.

use std::time::{Duration, Instant};

use crate::link::IndicatorLink;

/// Configuration for reconnection backoff.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first periodic reconnection attempt.
    pub initial_delay: Duration,
    /// Maximum delay between reconnection attempts.
    pub max_delay: Duration,
    /// Multiplier applied to delay after each failure (typically 2.0).
    pub multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
        }
    }
}

impl ReconnectConfig {
    /// Default backoff shape starting at `initial_delay`.
    pub fn starting_at(initial_delay: Duration) -> Self {
        Self {
            initial_delay,
            ..Self::default()
        }
    }
}

/// Reconnection state machine with exponential backoff.
#[derive(Debug)]
pub struct ReconnectState {
    config: ReconnectConfig,
    current_delay: Duration,
    last_attempt: Option<Instant>,
    consecutive_failures: u32,
}

impl ReconnectState {
    pub fn new(config: ReconnectConfig) -> Self {
        Self {
            current_delay: config.initial_delay,
            config,
            last_attempt: None,
            consecutive_failures: 0,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(ReconnectConfig::default())
    }

    /// Check if enough time has elapsed to attempt reconnection.
    ///
    /// Returns `true` if no attempt has been made yet, or if the
    /// backoff delay has elapsed since the last attempt.
    pub fn should_attempt(&self) -> bool {
        match self.last_attempt {
            None => true,
            Some(last) => last.elapsed() >= self.current_delay,
        }
    }

    /// Record a failed reconnection attempt.
    ///
    /// The first failure waits `initial_delay`; each later one multiplies the
    /// delay, up to `max_delay`.
    pub fn record_failure(&mut self) {
        self.consecutive_failures += 1;
        self.last_attempt = Some(Instant::now());
        if self.consecutive_failures == 1 {
            return;
        }

        let next = self.current_delay.as_secs_f64() * self.config.multiplier;
        self.current_delay = Duration::from_secs_f64(next).min(self.config.max_delay);
    }

    /// Record a successful reconnection and reset the backoff.
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.current_delay = self.config.initial_delay;
        self.last_attempt = None;
    }

    /// Forget the schedule so the next [`should_attempt`](Self::should_attempt)
    /// returns `true`. Failure count is kept for logging.
    pub fn reset(&mut self) {
        self.current_delay = self.config.initial_delay;
        self.last_attempt = None;
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn current_delay(&self) -> Duration {
        self.current_delay
    }
}

/// Attempt to reopen `port`, respecting backoff timing.
///
/// - Returns `false` without touching the link if the backoff timer hasn't elapsed.
/// - On success, records success and returns `true`.
/// - On failure, records failure, logs the backoff schedule, and returns `false`.
pub fn try_reopen(state: &mut ReconnectState, link: &mut impl IndicatorLink, port: &str) -> bool {
    if !state.should_attempt() {
        return false;
    }
    match link.open(port) {
        Ok(()) => {
            state.record_success();
            true
        }
        Err(e) => {
            state.record_failure();
            log::warn!(
                "[device] reconnect failed: {e} (attempt {}, retry in {:.1}s)",
                state.consecutive_failures(),
                state.current_delay().as_secs_f64()
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::mock::MockLink;

    #[test]
    fn default_config_values() {
        let config = ReconnectConfig::default();
        assert_eq!(config.initial_delay, Duration::from_secs(5));
        assert_eq!(config.max_delay, Duration::from_secs(60));
        assert_eq!(config.multiplier, 2.0);
    }

    #[test]
    fn starting_at_keeps_cap_and_multiplier() {
        let config = ReconnectConfig::starting_at(Duration::from_secs(2));
        assert_eq!(config.initial_delay, Duration::from_secs(2));
        assert_eq!(config.max_delay, Duration::from_secs(60));
    }

    #[test]
    fn initial_should_attempt_is_true() {
        let state = ReconnectState::with_defaults();
        assert!(state.should_attempt());
        assert_eq!(state.consecutive_failures(), 0);
    }

    #[test]
    fn backoff_progresses_on_failure() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        };
        let mut state = ReconnectState::new(config);

        state.record_failure();
        assert_eq!(state.current_delay(), Duration::from_millis(100));
        state.record_failure();
        assert_eq!(state.current_delay(), Duration::from_millis(200));
        state.record_failure();
        assert_eq!(state.current_delay(), Duration::from_millis(400));
        assert_eq!(state.consecutive_failures(), 3);
    }

    #[test]
    fn backoff_capped_at_max() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(4),
            multiplier: 2.0,
        };
        let mut state = ReconnectState::new(config);

        state.record_failure(); // 1s
        state.record_failure(); // 2s
        state.record_failure(); // 4s
        state.record_failure(); // capped
        assert_eq!(state.current_delay(), Duration::from_secs(4));
    }

    #[test]
    fn first_failure_waits_initial_delay() {
        let mut state = ReconnectState::new(ReconnectConfig::starting_at(Duration::from_millis(50)));
        state.record_failure();
        assert_eq!(state.current_delay(), Duration::from_millis(50));
        assert!(!state.should_attempt());

        std::thread::sleep(Duration::from_millis(60));
        assert!(state.should_attempt());
    }

    #[test]
    fn success_resets_backoff() {
        let mut state = ReconnectState::with_defaults();
        state.record_failure();
        state.record_failure();

        state.record_success();
        assert_eq!(state.consecutive_failures(), 0);
        assert_eq!(state.current_delay(), Duration::from_secs(5));
        assert!(state.should_attempt());
    }

    #[test]
    fn reset_allows_immediate_attempt() {
        let mut state = ReconnectState::new(ReconnectConfig::starting_at(Duration::from_secs(60)));
        state.record_failure();
        assert!(!state.should_attempt());

        state.reset();
        assert!(state.should_attempt());
        assert_eq!(state.consecutive_failures(), 1);
    }

    #[test]
    fn should_attempt_true_after_delay_elapses() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_secs(1),
            multiplier: 2.0,
        };
        let mut state = ReconnectState::new(config);

        state.record_failure();
        std::thread::sleep(Duration::from_millis(10));
        assert!(state.should_attempt());
    }

    // ── try_reopen ──

    #[test]
    fn try_reopen_success_records_success() {
        let mut state = ReconnectState::with_defaults();
        let mut link = MockLink::new();
        assert!(try_reopen(&mut state, &mut link, "mock0"));
        assert!(link.is_open());
        assert_eq!(state.consecutive_failures(), 0);
    }

    #[test]
    fn try_reopen_failure_backs_off() {
        let mut state = ReconnectState::new(ReconnectConfig::starting_at(Duration::from_secs(60)));
        let mut link = MockLink::new();
        link.fail_open = true;

        assert!(!try_reopen(&mut state, &mut link, "mock0"));
        assert_eq!(link.open_attempts(), 1);

        // Backoff not elapsed: the link is not touched again
        assert!(!try_reopen(&mut state, &mut link, "mock0"));
        assert_eq!(link.open_attempts(), 1);
    }
}
