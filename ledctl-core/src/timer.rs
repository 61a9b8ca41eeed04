//! Deadline primitives for the background contexts
//!
//! Both types are plain data living inside the guarded device record. The
//! firmware reads the deadline, sleeps until it passes, and then asks the
//! record to fire. A firing whose deadline was moved or cancelled in the
//! meantime finds nothing due and is ignored.
//!
//! - [`OneShotTimer`] drives blinking. Its handler runs under the guard and
//!   must not suspend.
//! - [`DelayedWork`] drives thermal sampling. The work itself runs outside
//!   the guard and may suspend (sensor conversions).

/// Monotonic time in milliseconds
pub type Millis = u64;

/// Single-deadline timer, re-armed explicitly after each firing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OneShotTimer {
    deadline: Option<Millis>,
}

impl OneShotTimer {
    /// Create a disarmed timer
    pub const fn new() -> Self {
        Self { deadline: None }
    }

    /// Arm the timer to fire `after_ms` from `now`, replacing any deadline
    pub fn arm(&mut self, now: Millis, after_ms: u32) {
        self.deadline = Some(now.saturating_add(Millis::from(after_ms)));
    }

    /// Disarm the timer
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Millis> {
        self.deadline
    }

    /// Check if the timer is armed and its deadline has passed
    pub fn is_due(&self, now: Millis) -> bool {
        matches!(self.deadline, Some(deadline) if now >= deadline)
    }

    /// Consume a due expiry, leaving the timer disarmed
    ///
    /// Returns false (and changes nothing) if the timer is not due.
    pub fn take_expired(&mut self, now: Millis) -> bool {
        if self.is_due(now) {
            self.deadline = None;
            true
        } else {
            false
        }
    }
}

/// Periodic work item with a fixed period and an explicit reschedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DelayedWork {
    next_run: Option<Millis>,
    period_ms: u32,
}

impl DelayedWork {
    /// Create idle work with the given period
    pub const fn new(period_ms: u32) -> Self {
        Self {
            next_run: None,
            period_ms,
        }
    }

    /// Schedule the next run `delay_ms` from `now`
    pub fn schedule(&mut self, now: Millis, delay_ms: u32) {
        self.next_run = Some(now.saturating_add(Millis::from(delay_ms)));
    }

    /// Schedule the next run one period from `now`
    pub fn reschedule(&mut self, now: Millis) {
        self.schedule(now, self.period_ms);
    }

    pub fn cancel(&mut self) {
        self.next_run = None;
    }

    pub fn is_scheduled(&self) -> bool {
        self.next_run.is_some()
    }

    pub fn next_run(&self) -> Option<Millis> {
        self.next_run
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    pub fn is_due(&self, now: Millis) -> bool {
        matches!(self.next_run, Some(at) if now >= at)
    }

    /// Claim a due run, leaving the work idle until rescheduled
    pub fn take_due(&mut self, now: Millis) -> bool {
        if self.is_due(now) {
            self.next_run = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_shot_fires_once() {
        let mut timer = OneShotTimer::new();
        timer.arm(100, 50);

        assert!(!timer.take_expired(149));
        assert!(timer.take_expired(150));
        assert!(!timer.is_armed());
        assert!(!timer.take_expired(200));
    }

    #[test]
    fn test_rearm_replaces_deadline() {
        let mut timer = OneShotTimer::new();
        timer.arm(0, 10);
        timer.arm(5, 100);

        // A waiter that slept on the first deadline finds nothing due
        assert!(!timer.take_expired(10));
        assert_eq!(timer.deadline(), Some(105));
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let mut timer = OneShotTimer::new();
        timer.arm(0, 10);
        timer.cancel();
        assert!(!timer.is_due(u64::MAX));
    }

    #[test]
    fn test_delayed_work_period() {
        let mut work = DelayedWork::new(5000);
        work.schedule(0, 1000);

        assert!(!work.take_due(999));
        assert!(work.take_due(1000));
        assert!(!work.is_scheduled());

        work.reschedule(1000);
        assert_eq!(work.next_run(), Some(6000));
    }

    #[test]
    fn test_deadline_saturates() {
        let mut timer = OneShotTimer::new();
        timer.arm(u64::MAX - 1, u32::MAX);
        assert_eq!(timer.deadline(), Some(u64::MAX));
    }
}
