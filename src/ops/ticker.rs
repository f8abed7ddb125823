use std::time::{Duration, Instant};

use indexmap::IndexMap;

/// Granularity of every section timer
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Per-section ticking processes, driven by the caller's clock.
///
/// Each scheduled section has a next deadline. The event loop sleeps until
/// `next_deadline()` and drains `due()`. Cancelling removes the deadline
/// immediately, so nothing can fire for that section afterwards.
#[derive(Debug, Default)]
pub struct Ticker {
    deadlines: IndexMap<String, Instant>,
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start ticking `id` with the first tick one interval after `now`.
    /// Returns false if it was already scheduled (the deadline is kept).
    pub fn schedule(&mut self, id: &str, now: Instant) -> bool {
        if self.deadlines.contains_key(id) {
            return false;
        }
        self.deadlines.insert(id.to_string(), now + TICK_INTERVAL);
        true
    }

    /// Stop ticking `id`. Returns false if it was not scheduled.
    pub fn cancel(&mut self, id: &str) -> bool {
        self.deadlines.shift_remove(id).is_some()
    }

    pub fn cancel_all(&mut self) {
        self.deadlines.clear();
    }

    pub fn is_scheduled(&self, id: &str) -> bool {
        self.deadlines.contains_key(id)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    /// Drain elapsed ticks: for every section whose deadline has passed,
    /// the number of whole intervals that fired since the last drain.
    /// A late drain reports every missed tick.
    pub fn due(&mut self, now: Instant) -> Vec<(String, u64)> {
        let mut fired = Vec::new();
        let interval = TICK_INTERVAL.as_nanos();
        for (id, deadline) in self.deadlines.iter_mut() {
            if *deadline > now {
                continue;
            }
            let late = now.duration_since(*deadline).as_nanos();
            let count = 1 + (late / interval) as u64;
            *deadline += TICK_INTERVAL * count as u32;
            fired.push((id.clone(), count));
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn nothing_due_before_first_interval() {
        let t0 = Instant::now();
        let mut ticker = Ticker::new();
        assert!(ticker.schedule("a", t0));
        assert!(ticker.due(t0 + Duration::from_millis(999)).is_empty());
        assert_eq!(ticker.due(t0 + secs(1)), vec![("a".to_string(), 1)]);
        assert!(ticker.due(t0 + Duration::from_millis(1500)).is_empty());
    }

    #[test]
    fn late_drain_catches_up() {
        let t0 = Instant::now();
        let mut ticker = Ticker::new();
        ticker.schedule("a", t0);
        assert_eq!(ticker.due(t0 + Duration::from_millis(3500)), vec![("a".to_string(), 3)]);
        assert_eq!(ticker.next_deadline(), Some(t0 + secs(4)));
    }

    #[test]
    fn schedule_twice_keeps_first_deadline() {
        let t0 = Instant::now();
        let mut ticker = Ticker::new();
        assert!(ticker.schedule("a", t0));
        assert!(!ticker.schedule("a", t0 + Duration::from_millis(600)));
        assert_eq!(ticker.next_deadline(), Some(t0 + secs(1)));
    }

    #[test]
    fn cancel_stops_pending_tick() {
        let t0 = Instant::now();
        let mut ticker = Ticker::new();
        ticker.schedule("a", t0);
        ticker.schedule("b", t0 + Duration::from_millis(500));
        assert!(ticker.cancel("a"));
        assert!(!ticker.cancel("a"));
        let fired = ticker.due(t0 + secs(5));
        assert_eq!(fired, vec![("b".to_string(), 4)]);
        assert!(!ticker.is_scheduled("a"));
    }

    #[test]
    fn sections_tick_independently() {
        let t0 = Instant::now();
        let mut ticker = Ticker::new();
        ticker.schedule("a", t0);
        ticker.schedule("b", t0 + Duration::from_millis(300));
        assert_eq!(ticker.next_deadline(), Some(t0 + secs(1)));
        assert_eq!(ticker.due(t0 + secs(1)), vec![("a".to_string(), 1)]);
        assert_eq!(
            ticker.due(t0 + Duration::from_millis(1300)),
            vec![("b".to_string(), 1)]
        );
        ticker.cancel_all();
        assert_eq!(ticker.next_deadline(), None);
    }
}
