use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerStatus {
    Running,
    Completed,
    Cancelled,
}

impl TimerStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TimerStatus::Running)
    }
}

/// Longest countdown a timer accepts: one week
pub const MAX_TIMER_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimerError {
    #[error("Invalid timer duration: {seconds}s (must be between 1s and one week)")]
    InvalidDuration { seconds: i64 },
    #[error("Step {step_index} already has a running timer ({existing})")]
    DuplicateTimer { step_index: usize, existing: TimerId },
    #[error("Unknown or already finished timer: {0}")]
    UnknownTimer(TimerId),
}

/// A single countdown attached to a recipe step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer {
    pub id: TimerId,
    pub step_index: usize,
    pub duration_secs: i64,
    pub started_at: DateTime<Utc>,
    pub status: TimerStatus,
    /// Set when the timer was cancelled, freezing its remaining time
    pub stopped_at: Option<DateTime<Utc>>,
}

impl Timer {
    /// Whole seconds left at `now`, rounded up and clamped to zero
    fn remaining_at(&self, now: DateTime<Utc>) -> i64 {
        let elapsed_ms = (now - self.started_at).num_milliseconds().max(0);
        let remaining_ms = self.duration_secs.saturating_mul(1000).saturating_sub(elapsed_ms).max(0);
        (remaining_ms + 999) / 1000
    }

    /// Latch Completed the first time the countdown reaches zero.
    /// Terminal timers are left untouched.
    fn refresh(&mut self, now: DateTime<Utc>) {
        if self.status == TimerStatus::Running && self.remaining_at(now) == 0 {
            self.status = TimerStatus::Completed;
            info!(
                timer_id = %self.id,
                step_index = self.step_index,
                duration_secs = self.duration_secs,
                "Timer completed"
            );
        }
    }

    fn reading(&self, now: DateTime<Utc>) -> TimerReading {
        let remaining_secs = match self.status {
            TimerStatus::Running => self.remaining_at(now),
            TimerStatus::Completed => 0,
            TimerStatus::Cancelled => self.remaining_at(self.stopped_at.unwrap_or(now)),
        };

        TimerReading {
            id: self.id,
            step_index: self.step_index,
            duration_secs: self.duration_secs,
            remaining_secs,
            status: self.status,
        }
    }
}

/// Snapshot of a timer returned by every poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerReading {
    pub id: TimerId,
    pub step_index: usize,
    pub duration_secs: i64,
    pub remaining_secs: i64,
    pub status: TimerStatus,
}

impl TimerReading {
    pub fn is_complete(&self) -> bool {
        self.status == TimerStatus::Completed
    }
}

/// Tracks every countdown of one cooking session, keyed by id
///
/// Timers are created on entering a timed step and cleared when that step is
/// finished. Ids are never reused within a manager, so a step retried after
/// cancellation always gets a fresh id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerManager {
    timers: BTreeMap<TimerId, Timer>,
    next_id: u64,
}

impl TimerManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(
        &mut self,
        step_index: usize,
        duration_secs: i64,
        now: DateTime<Utc>,
    ) -> Result<TimerId, TimerError> {
        if !(1..=MAX_TIMER_SECS).contains(&duration_secs) {
            return Err(TimerError::InvalidDuration {
                seconds: duration_secs,
            });
        }

        for timer in self.timers.values_mut().filter(|t| t.step_index == step_index) {
            timer.refresh(now);
            if timer.status == TimerStatus::Running {
                return Err(TimerError::DuplicateTimer {
                    step_index,
                    existing: timer.id,
                });
            }
        }

        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.timers.insert(
            id,
            Timer {
                id,
                step_index,
                duration_secs,
                started_at: now,
                status: TimerStatus::Running,
                stopped_at: None,
            },
        );

        info!(
            timer_id = %id,
            step_index = step_index,
            duration = %format_duration(duration_secs),
            "Timer started"
        );

        Ok(id)
    }

    pub fn poll(&mut self, id: TimerId, now: DateTime<Utc>) -> Result<TimerReading, TimerError> {
        let timer = self.timers.get_mut(&id).ok_or(TimerError::UnknownTimer(id))?;
        timer.refresh(now);
        Ok(timer.reading(now))
    }

    pub fn is_complete(&mut self, id: TimerId, now: DateTime<Utc>) -> Result<bool, TimerError> {
        Ok(self.poll(id, now)?.is_complete())
    }

    /// Cancel a running timer. Completed or already cancelled timers are
    /// reported as unknown.
    pub fn cancel(&mut self, id: TimerId, now: DateTime<Utc>) -> Result<TimerReading, TimerError> {
        let timer = self.timers.get_mut(&id).ok_or(TimerError::UnknownTimer(id))?;
        timer.refresh(now);
        if timer.status.is_terminal() {
            return Err(TimerError::UnknownTimer(id));
        }

        timer.status = TimerStatus::Cancelled;
        timer.stopped_at = Some(now);
        info!(timer_id = %id, step_index = timer.step_index, "Timer cancelled");
        Ok(timer.reading(now))
    }

    /// Most recently started timer for a step, whatever its status
    pub fn latest_for_step(&self, step_index: usize) -> Option<TimerId> {
        self.timers
            .values()
            .rev()
            .find(|t| t.step_index == step_index)
            .map(|t| t.id)
    }

    /// Running timer for a step, if any, after latching completion at `now`
    pub fn running_for_step(&mut self, step_index: usize, now: DateTime<Utc>) -> Option<TimerId> {
        self.timers
            .values_mut()
            .filter(|t| t.step_index == step_index)
            .find_map(|t| {
                t.refresh(now);
                (t.status == TimerStatus::Running).then_some(t.id)
            })
    }

    /// Readings for every timer still counting down
    pub fn running(&mut self, now: DateTime<Utc>) -> Vec<TimerReading> {
        self.timers
            .values_mut()
            .filter_map(|t| {
                t.refresh(now);
                (t.status == TimerStatus::Running).then(|| t.reading(now))
            })
            .collect()
    }

    /// Drop every timer belonging to a step. Returns the ids that were still
    /// running when cleared.
    pub fn clear_step(&mut self, step_index: usize, now: DateTime<Utc>) -> Vec<TimerId> {
        let mut interrupted = Vec::new();
        self.timers.retain(|id, timer| {
            if timer.step_index != step_index {
                return true;
            }
            timer.refresh(now);
            if timer.status == TimerStatus::Running {
                interrupted.push(*id);
            }
            false
        });

        if !interrupted.is_empty() {
            debug!(step_index = step_index, interrupted = ?interrupted, "Cleared running timers for step");
        }
        interrupted
    }

    pub fn get(&self, id: TimerId) -> Option<&Timer> {
        self.timers.get(&id)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

/// Render seconds as `1h 2m 3s`, `2m 3s` or `3s`
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn t0() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + Duration::days(20_000)
    }

    #[test]
    fn test_ten_minute_timer_completes_and_stays_completed() {
        let mut timers = TimerManager::new();
        let id = timers.start(2, 600, t0()).unwrap();

        let before = timers.poll(id, t0() + Duration::seconds(599)).unwrap();
        assert_eq!(before.status, TimerStatus::Running);
        assert_eq!(before.remaining_secs, 1);

        let at = timers.poll(id, t0() + Duration::seconds(600)).unwrap();
        assert_eq!(at.status, TimerStatus::Completed);
        assert_eq!(at.remaining_secs, 0);

        let after = timers.poll(id, t0() + Duration::seconds(700)).unwrap();
        assert_eq!(after.status, TimerStatus::Completed);
        assert_eq!(after.remaining_secs, 0);
    }

    #[test]
    fn test_poll_is_idempotent_and_monotonic() {
        let mut timers = TimerManager::new();
        let id = timers.start(0, 90, t0()).unwrap();

        let now = t0() + Duration::milliseconds(12_500);
        let first = timers.poll(id, now).unwrap();
        let second = timers.poll(id, now).unwrap();
        assert_eq!(first, second);

        let mut last = first.remaining_secs;
        for step in 0..200 {
            let reading = timers.poll(id, now + Duration::milliseconds(step * 450)).unwrap();
            assert!(reading.remaining_secs <= last);
            last = reading.remaining_secs;
        }
        assert_eq!(last, 0);
    }

    #[test]
    fn test_completed_status_survives_clock_going_backwards() {
        let mut timers = TimerManager::new();
        let id = timers.start(0, 10, t0()).unwrap();

        assert!(timers.is_complete(id, t0() + Duration::seconds(10)).unwrap());
        let reading = timers.poll(id, t0() + Duration::seconds(3)).unwrap();
        assert_eq!(reading.status, TimerStatus::Completed);
        assert_eq!(reading.remaining_secs, 0);
    }

    #[test]
    fn test_non_positive_duration_is_rejected() {
        let mut timers = TimerManager::new();
        assert_eq!(
            timers.start(0, 0, t0()),
            Err(TimerError::InvalidDuration { seconds: 0 })
        );
        assert_eq!(
            timers.start(0, -5, t0()),
            Err(TimerError::InvalidDuration { seconds: -5 })
        );
        assert!(timers.is_empty());
    }

    #[test]
    fn test_duration_beyond_a_week_is_rejected() {
        let mut timers = TimerManager::new();
        assert_eq!(
            timers.start(0, i64::MAX, t0()),
            Err(TimerError::InvalidDuration { seconds: i64::MAX })
        );
        assert_eq!(
            timers.start(0, MAX_TIMER_SECS + 1, t0()),
            Err(TimerError::InvalidDuration {
                seconds: MAX_TIMER_SECS + 1
            })
        );

        let id = timers.start(0, MAX_TIMER_SECS, t0()).unwrap();
        let reading = timers.poll(id, t0() + Duration::seconds(1)).unwrap();
        assert_eq!(reading.remaining_secs, MAX_TIMER_SECS - 1);
        assert_eq!(reading.status, TimerStatus::Running);
    }

    #[test]
    fn test_poll_far_in_the_future_completes() {
        let mut timers = TimerManager::new();
        let id = timers.start(0, 60, t0()).unwrap();
        let reading = timers.poll(id, t0() + Duration::days(365 * 200)).unwrap();
        assert_eq!(reading.remaining_secs, 0);
        assert!(reading.is_complete());
    }

    #[test]
    fn test_one_running_timer_per_step() {
        let mut timers = TimerManager::new();
        let first = timers.start(1, 60, t0()).unwrap();

        let err = timers.start(1, 30, t0() + Duration::seconds(5)).unwrap_err();
        assert_eq!(
            err,
            TimerError::DuplicateTimer {
                step_index: 1,
                existing: first
            }
        );

        // Another step is unaffected
        assert!(timers.start(2, 30, t0()).is_ok());
    }

    #[test]
    fn test_retry_after_cancel_gets_fresh_id() {
        let mut timers = TimerManager::new();
        let first = timers.start(1, 60, t0()).unwrap();
        timers.cancel(first, t0() + Duration::seconds(20)).unwrap();

        let second = timers.start(1, 60, t0() + Duration::seconds(21)).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_expired_timer_does_not_block_a_new_one() {
        let mut timers = TimerManager::new();
        let first = timers.start(1, 60, t0()).unwrap();
        let second = timers.start(1, 60, t0() + Duration::seconds(61)).unwrap();
        assert_ne!(first, second);
        assert_eq!(timers.get(first).map(|t| t.status), Some(TimerStatus::Completed));
    }

    #[test]
    fn test_cancel_twice_fails() {
        let mut timers = TimerManager::new();
        let id = timers.start(0, 60, t0()).unwrap();

        let cancelled = timers.cancel(id, t0() + Duration::seconds(15)).unwrap();
        assert_eq!(cancelled.status, TimerStatus::Cancelled);
        assert_eq!(cancelled.remaining_secs, 45);

        assert_eq!(
            timers.cancel(id, t0() + Duration::seconds(16)),
            Err(TimerError::UnknownTimer(id))
        );

        // Remaining time stays frozen after cancellation
        let later = timers.poll(id, t0() + Duration::seconds(500)).unwrap();
        assert_eq!(later.remaining_secs, 45);
    }

    #[test]
    fn test_cancel_completed_or_unknown_timer_fails() {
        let mut timers = TimerManager::new();
        let id = timers.start(0, 5, t0()).unwrap();
        assert_eq!(
            timers.cancel(id, t0() + Duration::seconds(5)),
            Err(TimerError::UnknownTimer(id))
        );
        assert_eq!(
            timers.poll(TimerId(99), t0()),
            Err(TimerError::UnknownTimer(TimerId(99)))
        );
    }

    #[test]
    fn test_clear_step_reports_interrupted_timers() {
        let mut timers = TimerManager::new();
        let running = timers.start(0, 60, t0()).unwrap();
        timers.start(1, 60, t0()).unwrap();

        let interrupted = timers.clear_step(0, t0() + Duration::seconds(1));
        assert_eq!(interrupted, vec![running]);
        assert_eq!(timers.len(), 1);
        assert!(timers.latest_for_step(0).is_none());
        assert_eq!(timers.running(t0()).len(), 1);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(5), "5s");
        assert_eq!(format_duration(125), "2m 5s");
        assert_eq!(format_duration(3723), "1h 2m 3s");
        assert_eq!(format_duration(-4), "0s");
    }
}
