//! Deferred one-shot timers measured in simulation ticks
//!
//! Timers are cancellable individually or all at once; a level restart
//! cancels everything still pending so nothing from the old level fires
//! into the new one.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TimerId(pub u64);

#[derive(Debug, Clone)]
struct Timer<T> {
    id: TimerId,
    due_tick: u64,
    payload: T,
}

/// Pending timers, fired in (due tick, schedule order)
#[derive(Debug, Clone)]
pub struct TimerQueue<T> {
    timers: Vec<Timer<T>>,
    next_id: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            timers: Vec::new(),
            next_id: 1,
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `payload` to fire at `due_tick`
    pub fn schedule_at(&mut self, due_tick: u64, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        // Keep sorted; equal due ticks stay in schedule order
        let idx = self.timers.partition_point(|t| t.due_tick <= due_tick);
        self.timers.insert(
            idx,
            Timer {
                id,
                due_tick,
                payload,
            },
        );
        id
    }

    /// Cancel one timer; returns its payload if it was still pending
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let idx = self.timers.iter().position(|t| t.id == id)?;
        Some(self.timers.remove(idx).payload)
    }

    /// Cancel every pending timer, returning how many were dropped
    pub fn cancel_all(&mut self) -> usize {
        let n = self.timers.len();
        self.timers.clear();
        n
    }

    /// Remove and return every payload due at or before `now`
    pub fn drain_due(&mut self, now: u64) -> Vec<T> {
        let split = self.timers.partition_point(|t| t.due_tick <= now);
        self.timers.drain(..split).map(|t| t.payload).collect()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Count pending payloads matching a predicate
    pub fn count_where(&self, mut pred: impl FnMut(&T) -> bool) -> usize {
        self.timers.iter().filter(|t| pred(&t.payload)).count()
    }
}
