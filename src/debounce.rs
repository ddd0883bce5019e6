//! Latest-value-after-quiescence primitive.
//!
//! A single pending slot with a cancel-and-restart timer: every `push`
//! replaces the pending value and restarts the window, so only the value that
//! stayed unchanged for a full window is ever promoted. There is no maximum
//! wait. Time is passed in explicitly, which keeps the primitive usable from a
//! UI event loop and deterministic under test.

use std::time::{Duration, Instant};

/// Default settle delay for typed search queries.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(300);

#[derive(Debug, Clone)]
pub struct Debounce<T> {
    window: Duration,
    settled: T,
    /// Pending value and the instant it was pushed.
    pending: Option<(T, Instant)>,
}

impl<T: Clone + PartialEq> Debounce<T> {
    pub fn new(initial: T, window: Duration) -> Self {
        Self { window, settled: initial, pending: None }
    }

    /// The last promoted value.
    pub fn value(&self) -> &T {
        &self.settled
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending value will settle if no further input arrives.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at + self.window)
    }

    /// Record new input, cancelling whatever was pending.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    /// Promote the pending value if it has been quiet for the full window.
    /// Returns `true` when the settled value changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline() {
            Some(deadline) if now >= deadline => self.flush(),
            _ => false,
        }
    }

    /// Promote the pending value immediately, bypassing the window.
    /// Returns `true` when the settled value changed.
    pub fn flush(&mut self) -> bool {
        match self.pending.take() {
            Some((value, _)) if value != self.settled => {
                self.settled = value;
                true
            }
            _ => false,
        }
    }

    /// Overwrite both the settled value and any pending input.
    pub fn reset(&mut self, value: T) {
        self.pending = None;
        self.settled = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn only_the_final_keystroke_settles() {
        let t0 = Instant::now();
        let mut d = Debounce::new(String::new(), DEFAULT_WINDOW);
        let mut observed = Vec::new();

        d.push("a".to_string(), t0);
        for step in [50, 99] {
            if d.poll(t0 + ms(step)) {
                observed.push(d.value().clone());
            }
        }
        d.push("ap".to_string(), t0 + ms(100));
        if d.poll(t0 + ms(120)) {
            observed.push(d.value().clone());
        }
        d.push("app".to_string(), t0 + ms(150));
        // Walk the clock in 10ms ticks until t=500.
        for step in (150..=500).step_by(10) {
            if d.poll(t0 + ms(step)) {
                observed.push(d.value().clone());
            }
        }

        assert_eq!(d.value(), "app");
        assert_eq!(observed, vec!["app".to_string()]);
    }

    #[test]
    fn settles_exactly_at_the_deadline() {
        let t0 = Instant::now();
        let mut d = Debounce::new(0u32, ms(300));
        d.push(7, t0);
        assert_eq!(d.deadline(), Some(t0 + ms(300)));
        assert!(!d.poll(t0 + ms(299)));
        assert_eq!(*d.value(), 0);
        assert!(d.poll(t0 + ms(300)));
        assert_eq!(*d.value(), 7);
        assert!(!d.is_pending());
    }

    #[test]
    fn each_push_restarts_the_window() {
        let t0 = Instant::now();
        let mut d = Debounce::new(0u32, ms(300));
        d.push(1, t0);
        d.push(2, t0 + ms(250));
        // 300ms after the first push but only 50ms after the second.
        assert!(!d.poll(t0 + ms(300)));
        assert!(d.poll(t0 + ms(550)));
        assert_eq!(*d.value(), 2);
    }

    #[test]
    fn flush_bypasses_the_window() {
        let t0 = Instant::now();
        let mut d = Debounce::new(String::new(), DEFAULT_WINDOW);
        d.push("mcp".to_string(), t0);
        assert!(d.flush());
        assert_eq!(d.value(), "mcp");
        assert!(!d.poll(t0 + ms(1000)));
    }

    #[test]
    fn settling_to_the_same_value_reports_no_change() {
        let t0 = Instant::now();
        let mut d = Debounce::new("git".to_string(), DEFAULT_WINDOW);
        d.push("gi".to_string(), t0);
        d.push("git".to_string(), t0 + ms(10));
        assert!(!d.poll(t0 + ms(400)));
        assert_eq!(d.value(), "git");
        assert!(!d.is_pending());
    }

    #[test]
    fn reset_drops_pending_input() {
        let t0 = Instant::now();
        let mut d = Debounce::new(0u32, ms(300));
        d.push(5, t0);
        d.reset(9);
        assert!(!d.poll(t0 + ms(1000)));
        assert_eq!(*d.value(), 9);
    }
}
