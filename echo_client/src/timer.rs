//! Delayed callbacks on simulation time.
//!
//! The game loop schedules payloads ("respawn an enemy") and drains the due
//! ones each tick. Nothing here reads the wall clock.

use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
    time::Duration,
};

struct Entry<T> {
    due: Duration,
    seq: u64,
    payload: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Ties on `due` resolve in scheduling order.
impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

pub struct Timers<T> {
    next_seq: u64,
    queue: BinaryHeap<Reverse<Entry<T>>>,
}

impl<T> Default for Timers<T> {
    fn default() -> Self {
        Self {
            next_seq: 0,
            queue: BinaryHeap::new(),
        }
    }
}

impl<T> Timers<T> {
    /// Schedules `payload` to fire `delay` after `now`.
    pub fn schedule(&mut self, now: Duration, delay: Duration, payload: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Entry {
            due: now + delay,
            seq,
            payload,
        }));
    }

    /// Removes and returns every payload due at or before `now`, earliest first.
    pub fn drain_due(&mut self, now: Duration) -> Vec<T> {
        let mut due = Vec::new();
        while self
            .queue
            .peek()
            .is_some_and(|Reverse(entry)| entry.due <= now)
        {
            if let Some(Reverse(entry)) = self.queue.pop() {
                due.push(entry.payload);
            }
        }
        due
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.queue.peek().map(|Reverse(entry)| entry.due)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_in_due_then_schedule_order() {
        let mut timers = Timers::default();
        let now = Duration::from_secs(1);
        timers.schedule(now, Duration::from_millis(500), "late");
        timers.schedule(now, Duration::from_millis(100), "early");
        timers.schedule(now, Duration::from_millis(100), "early-2");

        assert!(timers.drain_due(now).is_empty());
        assert_eq!(timers.next_due(), Some(Duration::from_millis(1100)));
        assert_eq!(
            timers.drain_due(Duration::from_millis(1100)),
            vec!["early", "early-2"]
        );
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.drain_due(Duration::from_secs(5)), vec!["late"]);
        assert!(timers.is_empty());
    }
}
