//! Single-threaded timer queue
//!
//! Timers carry plain data tasks rather than callbacks. Whoever pops a due task
//! decides what it means against the current state, so a cancelled timer can
//! never reach into resources that were already released.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Duration;

use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct TimerEntry<T> {
    task: T,
    period: Option<Duration>,
}

/// Shortest interval period accepted; a zero period would fire forever in one pump
const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug)]
pub struct TimerQueue<T> {
    next_id: u64,
    next_seq: u64,
    /// (due, insertion order, id); cancelled ids stay here until popped
    heap: BinaryHeap<Reverse<(Duration, u64, TimerId)>>,
    entries: FxHashMap<TimerId, TimerEntry<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            next_seq: 0,
            heap: BinaryHeap::new(),
            entries: FxHashMap::default(),
        }
    }
}

impl<T: Clone> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` once, `delay` after `now`
    pub fn schedule_timeout(&mut self, now: Duration, delay: Duration, task: T) -> TimerId {
        self.insert(now + delay, task, None)
    }

    /// Run `task` every `period`, first at `now + period`
    pub fn schedule_interval(&mut self, now: Duration, period: Duration, task: T) -> TimerId {
        let period = period.max(MIN_PERIOD);
        self.insert(now + period, task, Some(period))
    }

    fn insert(&mut self, due: Duration, task: T, period: Option<Duration>) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.entries.insert(id, TimerEntry { task, period });
        self.push(due, id);
        id
    }

    fn push(&mut self, due: Duration, id: TimerId) {
        self.next_seq += 1;
        self.heap.push(Reverse((due, self.next_seq, id)));
    }

    /// Returns false when the timer already fired (timeouts) or was cancelled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Drop every timer
    pub fn clear(&mut self) -> usize {
        let cancelled = self.entries.len();
        self.entries.clear();
        self.heap.clear();
        cancelled
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.entries.len()
    }

    /// Pop the earliest task due at or before `now`
    ///
    /// Intervals are rescheduled one period after their due time, or one period
    /// after `now` when the host fell behind, so one pump fires each at most once.
    pub fn pop_due(&mut self, now: Duration) -> Option<(TimerId, T)> {
        while let Some(Reverse((due, _, id))) = self.heap.peek().copied() {
            if due > now {
                return None;
            }
            self.heap.pop();

            let Some(period) = self.entries.get(&id).map(|entry| entry.period) else {
                continue;
            };
            match period {
                Some(period) => {
                    let mut next = due + period;
                    if next <= now {
                        next = now + period;
                    }
                    self.push(next, id);
                    let task = self.entries.get(&id)?.task.clone();
                    return Some((id, task));
                }
                None => {
                    let entry = self.entries.remove(&id)?;
                    return Some((id, entry.task));
                }
            }
        }
        None
    }

    /// Due time of the earliest live timer
    pub fn next_due(&self) -> Option<Duration> {
        self.heap
            .iter()
            .filter(|Reverse((_, _, id))| self.entries.contains_key(id))
            .map(|Reverse((due, _, _))| *due)
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn drain(queue: &mut TimerQueue<&'static str>, now: Duration) -> Vec<&'static str> {
        std::iter::from_fn(|| queue.pop_due(now).map(|(_, task)| task)).collect()
    }

    #[test]
    fn test_timeouts_fire_in_due_order() {
        let mut queue = TimerQueue::new();
        queue.schedule_timeout(ms(0), ms(50), "b");
        queue.schedule_timeout(ms(0), ms(10), "a");
        queue.schedule_timeout(ms(0), ms(90), "c");

        assert!(drain(&mut queue, ms(5)).is_empty());
        assert_eq!(drain(&mut queue, ms(60)), vec!["a", "b"]);
        assert_eq!(queue.pending_count(), 1);
        assert_eq!(drain(&mut queue, ms(100)), vec!["c"]);
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn test_equal_due_times_keep_insertion_order() {
        let mut queue = TimerQueue::new();
        queue.schedule_timeout(ms(0), ms(10), "first");
        queue.schedule_timeout(ms(0), ms(10), "second");
        assert_eq!(drain(&mut queue, ms(10)), vec!["first", "second"]);
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let mut queue = TimerQueue::new();
        let id = queue.schedule_timeout(ms(0), ms(10), "gone");
        assert!(queue.cancel(id));
        assert!(!queue.cancel(id));
        assert!(!queue.is_pending(id));
        assert!(drain(&mut queue, ms(100)).is_empty());
    }

    #[test]
    fn test_interval_repeats_until_cancelled() {
        let mut queue = TimerQueue::new();
        let id = queue.schedule_interval(ms(0), ms(100), "tick");

        assert_eq!(drain(&mut queue, ms(99)).len(), 0);
        assert_eq!(drain(&mut queue, ms(100)).len(), 1);
        assert_eq!(drain(&mut queue, ms(250)).len(), 1);
        assert_eq!(queue.next_due(), Some(ms(300)));

        queue.cancel(id);
        assert!(drain(&mut queue, ms(1000)).is_empty());
        assert_eq!(queue.next_due(), None);
    }

    #[test]
    fn test_interval_behind_schedule_fires_once_per_pump() {
        let mut queue = TimerQueue::new();
        queue.schedule_interval(ms(0), ms(100), "tick");
        assert_eq!(drain(&mut queue, ms(10_000)).len(), 1);
        assert_eq!(queue.next_due(), Some(ms(10_100)));
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut queue = TimerQueue::new();
        queue.schedule_interval(ms(0), ms(100), "tick");
        queue.schedule_timeout(ms(0), ms(5), "once");
        assert_eq!(queue.clear(), 2);
        assert!(drain(&mut queue, ms(1000)).is_empty());
    }
}
