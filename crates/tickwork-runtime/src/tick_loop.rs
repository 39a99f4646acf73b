//! [`TickLoop`] – drives a [`Scheduler`] at a fixed period.
//!
//! The loop only ever sleeps *between* ticks.  A tick that takes longer than
//! the period is not made up for: the next tick starts immediately and the
//! schedule re-anchors to that moment, so a stall never turns into a burst.
//!
//! [`OverrunMonitor`] keeps the books on how long each tick took.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tickwork_kernel::Scheduler;
//! use tickwork_runtime::tick_loop::TickLoop;
//!
//! let mut scheduler = Scheduler::default();
//! let mut tick_loop = TickLoop::new(Duration::from_millis(1));
//!
//! assert_eq!(tick_loop.run_for(&mut scheduler, 3), 3);
//! assert_eq!(scheduler.tick_count(), 3);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tickwork_kernel::Scheduler;
use tracing::{debug, warn};

/// Nominal tick period of a robot control loop.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(20);

// ─────────────────────────────────────────────────────────────────────────────
// OverrunMonitor
// ─────────────────────────────────────────────────────────────────────────────

/// Counts ticks whose work exceeded the loop period.
#[derive(Debug, Clone)]
pub struct OverrunMonitor {
    period: Duration,
    ticks: u64,
    overruns: u64,
    last: Duration,
    worst: Duration,
}

impl OverrunMonitor {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            ticks: 0,
            overruns: 0,
            last: Duration::ZERO,
            worst: Duration::ZERO,
        }
    }

    /// Record one tick that took `elapsed`.  Returns `true` on overrun.
    pub fn record(&mut self, tick: u64, elapsed: Duration) -> bool {
        self.ticks += 1;
        self.last = elapsed;
        self.worst = self.worst.max(elapsed);

        if elapsed > self.period {
            self.overruns += 1;
            warn!(
                tick,
                elapsed_us = elapsed.as_micros() as u64,
                period_us = self.period.as_micros() as u64,
                overruns = self.overruns,
                "tick overran its period"
            );
            return true;
        }
        false
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    pub fn last(&self) -> Duration {
        self.last
    }

    pub fn worst(&self) -> Duration {
        self.worst
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.period);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TickLoop
// ─────────────────────────────────────────────────────────────────────────────

pub struct TickLoop {
    period: Duration,
    monitor: OverrunMonitor,
    stop: Arc<AtomicBool>,
}

impl Default for TickLoop {
    fn default() -> Self {
        Self::new(DEFAULT_PERIOD)
    }
}

impl TickLoop {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            monitor: OverrunMonitor::new(period),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn monitor(&self) -> &OverrunMonitor {
        &self.monitor
    }

    /// Flag that ends [`run`][Self::run] / [`run_for`][Self::run_for] after
    /// the tick in progress.  Safe to set from a signal handler thread.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Clear a previous stop request.
    pub fn rearm(&self) {
        self.stop.store(false, Ordering::SeqCst);
    }

    /// Run exactly one tick without sleeping and return how long it took.
    pub fn step(&mut self, scheduler: &mut Scheduler) -> Duration {
        let started = Instant::now();
        scheduler.run();
        let elapsed = started.elapsed();
        self.monitor.record(scheduler.tick_count(), elapsed);
        elapsed
    }

    /// Run up to `ticks` ticks at the loop period.  Returns the number of
    /// ticks actually run, which is lower only if a stop was requested.
    pub fn run_for(&mut self, scheduler: &mut Scheduler, ticks: u64) -> u64 {
        self.drive(scheduler, Some(ticks))
    }

    /// Run until a stop is requested.  Returns the number of ticks run.
    pub fn run(&mut self, scheduler: &mut Scheduler) -> u64 {
        self.drive(scheduler, None)
    }

    fn drive(&mut self, scheduler: &mut Scheduler, limit: Option<u64>) -> u64 {
        let mut done = 0;
        let mut deadline = Instant::now();
        debug!(period_ms = self.period.as_millis() as u64, ?limit, "tick loop started");

        while limit.is_none_or(|n| done < n) && !self.stop.load(Ordering::SeqCst) {
            self.step(scheduler);
            done += 1;

            deadline += self.period;
            let now = Instant::now();
            if now < deadline {
                std::thread::sleep(deadline - now);
            } else {
                deadline = now;
            }
        }

        debug!(ticks = done, overruns = self.monitor.overruns(), "tick loop stopped");
        done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overruns_are_counted() {
        let mut monitor = OverrunMonitor::new(Duration::from_millis(20));
        assert!(!monitor.record(1, Duration::from_millis(5)));
        assert!(monitor.record(2, Duration::from_millis(25)));
        assert!(!monitor.record(3, Duration::from_millis(20)));

        assert_eq!(monitor.ticks(), 3);
        assert_eq!(monitor.overruns(), 1);
        assert_eq!(monitor.worst(), Duration::from_millis(25));
        assert_eq!(monitor.last(), Duration::from_millis(20));

        monitor.reset();
        assert_eq!(monitor.ticks(), 0);
        assert_eq!(monitor.period(), Duration::from_millis(20));
    }

    #[test]
    fn run_for_holds_the_period() {
        let mut scheduler = Scheduler::default();
        let mut tick_loop = TickLoop::new(Duration::from_millis(5));

        let started = Instant::now();
        assert_eq!(tick_loop.run_for(&mut scheduler, 4), 4);

        // Four ticks sleep out four periods.
        assert!(started.elapsed() >= Duration::from_millis(20));
        assert_eq!(tick_loop.monitor().ticks(), 4);
    }

    #[test]
    fn stop_flag_ends_the_loop() {
        let mut scheduler = Scheduler::default();
        let mut tick_loop = TickLoop::new(Duration::from_millis(1));
        tick_loop.stop_flag().store(true, Ordering::SeqCst);

        assert_eq!(tick_loop.run(&mut scheduler), 0);
        assert_eq!(scheduler.tick_count(), 0);

        tick_loop.rearm();
        assert_eq!(tick_loop.run_for(&mut scheduler, 2), 2);
    }

    #[test]
    fn step_does_not_sleep() {
        let mut scheduler = Scheduler::default();
        let mut tick_loop = TickLoop::new(Duration::from_secs(60));
        tick_loop.step(&mut scheduler);
        assert_eq!(scheduler.tick_count(), 1);
    }
}
