/// Cooperative timer queue.
///
/// All animation in the game is time-delayed actions on one thread: the
/// main loop calls `pop_due` every frame and applies whatever has fallen
/// due. There is no parallelism; relative completion order of timers
/// scheduled for the same instant follows insertion order.
///
/// Handles returned by `schedule` can be cancelled (the script uses this
/// for its panic-line interjections). `clear` drops everything at once —
/// the session-restart path.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::time::{Duration, Instant};

use crate::sim::event::TimerEvent;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TimerId(u64);

struct Entry {
    due: Instant,
    seq: u64,
    id: TimerId,
    event: TimerEvent,
}

// Min-heap on (due, seq): earliest deadline first, insertion order as
// the tie-break.
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.due, other.seq).cmp(&(self.due, self.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Entry {}

pub struct Scheduler {
    queue: BinaryHeap<Entry>,
    cancelled: HashSet<TimerId>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler {
            queue: BinaryHeap::new(),
            cancelled: HashSet::new(),
            next_seq: 0,
        }
    }

    /// Schedule `event` to fall due `delay` after `now`.
    pub fn schedule(&mut self, now: Instant, delay: Duration, event: TimerEvent) -> TimerId {
        self.schedule_at(now + delay, event)
    }

    /// Schedule `event` for an absolute deadline.
    pub fn schedule_at(&mut self, due: Instant, event: TimerEvent) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        let id = TimerId(seq);
        self.queue.push(Entry { due, seq, id, event });
        id
    }

    /// Forget a pending timer. No effect if it already fired.
    pub fn cancel(&mut self, id: TimerId) {
        self.cancelled.insert(id);
    }

    /// Next due event at `now`, if any. Cancelled entries are skipped.
    pub fn pop_due(&mut self, now: Instant) -> Option<TimerEvent> {
        while let Some(entry) = self.queue.peek() {
            if entry.due > now {
                return None;
            }
            let entry = self.queue.pop()?;
            if self.cancelled.remove(&entry.id) {
                continue;
            }
            return Some(entry.event);
        }
        None
    }

    /// Drop every pending timer.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.cancelled.clear();
    }

    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cue_at(row: usize) -> TimerEvent {
        TimerEvent::Revert { row, col: 0 }
    }

    #[test]
    fn pops_in_deadline_order() {
        let mut s = Scheduler::new();
        let now = Instant::now();
        s.schedule(now, Duration::from_millis(300), cue_at(2));
        s.schedule(now, Duration::from_millis(100), cue_at(1));
        s.schedule(now, Duration::from_millis(200), cue_at(3));

        let later = now + Duration::from_millis(500);
        assert_eq!(s.pop_due(later), Some(cue_at(1)));
        assert_eq!(s.pop_due(later), Some(cue_at(3)));
        assert_eq!(s.pop_due(later), Some(cue_at(2)));
        assert_eq!(s.pop_due(later), None);
    }

    #[test]
    fn nothing_due_before_deadline() {
        let mut s = Scheduler::new();
        let now = Instant::now();
        s.schedule(now, Duration::from_millis(50), cue_at(0));
        assert_eq!(s.pop_due(now), None);
        assert_eq!(s.pop_due(now + Duration::from_millis(50)), Some(cue_at(0)));
    }

    #[test]
    fn same_deadline_keeps_insertion_order() {
        let mut s = Scheduler::new();
        let now = Instant::now();
        s.schedule_at(now, cue_at(1));
        s.schedule_at(now, cue_at(2));
        assert_eq!(s.pop_due(now), Some(cue_at(1)));
        assert_eq!(s.pop_due(now), Some(cue_at(2)));
    }

    #[test]
    fn cancelled_timers_are_skipped() {
        let mut s = Scheduler::new();
        let now = Instant::now();
        let id = s.schedule(now, Duration::ZERO, cue_at(1));
        s.schedule(now, Duration::ZERO, cue_at(2));
        s.cancel(id);
        assert_eq!(s.pop_due(now), Some(cue_at(2)));
        assert_eq!(s.pop_due(now), None);
    }

    #[test]
    fn clear_drops_everything() {
        let mut s = Scheduler::new();
        let now = Instant::now();
        s.schedule(now, Duration::ZERO, cue_at(1));
        s.schedule(now, Duration::ZERO, cue_at(2));
        s.clear();
        assert_eq!(s.pending(), 0);
        assert_eq!(s.pop_due(now), None);
    }
}
