//! Sleep timer for the Serenity mixer.
//!
//! This module provides the timer state machine:
//! - Idle → Armed(deadline) → Idle
//! - Deadline comparison on every one-second tick
//! - Generation tokens so a superseded ticker can never fire
//! - `HH:MM:SS` and preset label formatting
//!
//! The state machine is pure: callers pass `now` in, and the session layer
//! owns the actual `tokio::time::interval` that drives it.

use std::time::{SystemTime, UNIX_EPOCH};

use tokio::time::{Duration, Instant};

/// Preset durations offered to the user, in minutes.
pub const PRESET_MINUTES: [u32; 5] = [5, 15, 30, 60, 120];

/// Period of the countdown check.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

// ============================================================================
// TimerTick
// ============================================================================

/// Outcome of one periodic check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    /// Deadline not reached yet
    Pending,
    /// Deadline reached; the caller must stop all channels and cancel
    Expired,
    /// The checking ticker belongs to a cancelled or replaced countdown
    Stale,
}

// ============================================================================
// SleepTimer
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Armed {
    deadline: Instant,
    wall_deadline: SystemTime,
}

/// Sleep timer state. Armed exactly when a deadline is set.
#[derive(Debug, Default)]
pub struct SleepTimer {
    armed: Option<Armed>,
    generation: u64,
}

impl SleepTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the timer for `minutes` from `now`.
    ///
    /// Zero minutes is the same as `cancel()`. Re-arming replaces the
    /// previous deadline and invalidates its ticker.
    ///
    /// Returns the generation the new ticker must present on each check, or
    /// `None` if the timer ended up idle.
    pub fn start(&mut self, minutes: u32, now: Instant) -> Option<u64> {
        if minutes == 0 {
            self.cancel();
            return None;
        }

        let duration = Duration::from_secs(u64::from(minutes) * 60);
        self.generation += 1;
        self.armed = Some(Armed {
            deadline: now + duration,
            wall_deadline: SystemTime::now() + duration,
        });
        Some(self.generation)
    }

    /// Disarms the timer. Idempotent.
    ///
    /// Returns true if a countdown was running.
    pub fn cancel(&mut self) -> bool {
        self.generation += 1;
        self.armed.take().is_some()
    }

    /// Periodic check made by the ticker holding `generation`.
    pub fn check(&self, generation: u64, now: Instant) -> TimerTick {
        match self.armed {
            Some(armed) if generation == self.generation => {
                if now >= armed.deadline {
                    TimerTick::Expired
                } else {
                    TimerTick::Pending
                }
            }
            _ => TimerTick::Stale,
        }
    }

    /// Time left before expiry; zero when idle or past the deadline.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.armed
            .map(|armed| armed.deadline.saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }

    pub fn is_active(&self) -> bool {
        self.armed.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.armed.map(|armed| armed.deadline)
    }

    /// Wall-clock deadline as seconds since the Unix epoch.
    pub fn deadline_epoch_secs(&self) -> Option<u64> {
        self.armed.map(|armed| {
            armed
                .wall_deadline
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

// ============================================================================
// Formatting
// ============================================================================

/// Formats a duration as `HH:MM:SS`, truncating sub-second precision.
pub fn format_remaining(remaining: Duration) -> String {
    let total = remaining.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Label for a preset duration.
pub fn format_preset(minutes: u32) -> String {
    match minutes {
        m if m < 60 => format!("{} minutes", m),
        60 => "1 hour".to_string(),
        m => format!("{} hours", m / 60),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ------------------------------------------------------------------------
    // SleepTimer Tests
    // ------------------------------------------------------------------------

    mod sleep_timer_tests {
        use super::*;

        #[test]
        fn test_new_is_idle() {
            let timer = SleepTimer::new();
            assert!(!timer.is_active());
            assert_eq!(timer.deadline(), None);
            assert_eq!(timer.deadline_epoch_secs(), None);
            assert_eq!(timer.remaining(Instant::now()), Duration::ZERO);
        }

        #[test]
        fn test_start_arms_deadline() {
            let mut timer = SleepTimer::new();
            let now = Instant::now();

            let generation = timer.start(30, now);

            assert!(generation.is_some());
            assert!(timer.is_active());
            assert_eq!(timer.deadline(), Some(now + Duration::from_secs(1800)));
            assert_eq!(timer.remaining(now), Duration::from_secs(1800));
            assert!(timer.deadline_epoch_secs().is_some());
        }

        #[test]
        fn test_start_zero_is_cancel() {
            let mut timer = SleepTimer::new();
            let now = Instant::now();
            timer.start(5, now);

            assert_eq!(timer.start(0, now), None);
            assert!(!timer.is_active());
            assert_eq!(timer.remaining(now), Duration::ZERO);
        }

        #[test]
        fn test_start_zero_when_idle_stays_idle() {
            let mut timer = SleepTimer::new();
            assert_eq!(timer.start(0, Instant::now()), None);
            assert!(!timer.is_active());
        }

        #[test]
        fn test_check_pending_then_expired() {
            let mut timer = SleepTimer::new();
            let now = Instant::now();
            let generation = timer.start(1, now).unwrap();

            assert_eq!(timer.check(generation, now), TimerTick::Pending);
            assert_eq!(
                timer.check(generation, now + Duration::from_secs(59)),
                TimerTick::Pending
            );
            assert_eq!(
                timer.check(generation, now + Duration::from_secs(60)),
                TimerTick::Expired
            );
            assert_eq!(
                timer.check(generation, now + Duration::from_secs(61)),
                TimerTick::Expired
            );
        }

        #[test]
        fn test_check_after_cancel_is_stale() {
            let mut timer = SleepTimer::new();
            let now = Instant::now();
            let generation = timer.start(1, now).unwrap();

            assert!(timer.cancel());
            assert_eq!(
                timer.check(generation, now + Duration::from_secs(120)),
                TimerTick::Stale
            );
        }

        #[test]
        fn test_restart_invalidates_previous_generation() {
            let mut timer = SleepTimer::new();
            let now = Instant::now();
            let first = timer.start(1, now).unwrap();
            let second = timer.start(10, now).unwrap();

            assert_ne!(first, second);
            let later = now + Duration::from_secs(90);
            assert_eq!(timer.check(first, later), TimerTick::Stale);
            assert_eq!(timer.check(second, later), TimerTick::Pending);
            assert_eq!(timer.remaining(now), Duration::from_secs(600));
        }

        #[test]
        fn test_cancel_idempotent() {
            let mut timer = SleepTimer::new();
            assert!(!timer.cancel());
            assert!(!timer.cancel());
            assert!(!timer.is_active());
        }

        #[test]
        fn test_remaining_saturates_past_deadline() {
            let mut timer = SleepTimer::new();
            let now = Instant::now();
            timer.start(1, now);

            assert_eq!(
                timer.remaining(now + Duration::from_secs(3600)),
                Duration::ZERO
            );
        }

        #[test]
        fn test_generation_advances() {
            let mut timer = SleepTimer::new();
            let before = timer.generation();
            timer.start(5, Instant::now());
            timer.cancel();
            assert_eq!(timer.generation(), before + 2);
        }
    }

    // ------------------------------------------------------------------------
    // Formatting Tests
    // ------------------------------------------------------------------------

    mod format_tests {
        use super::*;

        #[test]
        fn test_format_remaining() {
            assert_eq!(format_remaining(Duration::ZERO), "00:00:00");
            assert_eq!(format_remaining(Duration::from_secs(59)), "00:00:59");
            assert_eq!(format_remaining(Duration::from_secs(61)), "00:01:01");
            assert_eq!(format_remaining(Duration::from_secs(7200)), "02:00:00");
            assert_eq!(format_remaining(Duration::from_millis(3_723_900)), "01:02:03");
        }

        #[test]
        fn test_format_preset() {
            assert_eq!(format_preset(5), "5 minutes");
            assert_eq!(format_preset(30), "30 minutes");
            assert_eq!(format_preset(60), "1 hour");
            assert_eq!(format_preset(120), "2 hours");
        }

        #[test]
        fn test_presets_are_sorted() {
            assert!(PRESET_MINUTES.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
