/*!
Discrete-event scheduler.

Events are ordered by `(time, priority, seq)`:

- `time` is simulated nanoseconds; wall-clock time never enters a session.
- at the same instant a channel delivery runs before a timer, so an ACK
  that lands exactly on its deadline still wins the race.
- `seq` keeps insertion order among otherwise equal events, so messages
  sent back to back on channels with equal delay arrive in send order.
*/

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::core::{message::types::Payload, session::state::Role};

/// Simulated time in nanoseconds
pub type SimTime = u64;

/// Identifies one started timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// What happens when an event fires
#[derive(Debug)]
pub enum EventKind {
    /// A payload reaches `to`
    Deliver { to: Role, payload: Payload },
    /// A timer started by `owner` expires
    Timer { owner: Role, id: TimerId },
}

impl EventKind {
    fn priority(&self) -> u8 {
        match self {
            EventKind::Deliver { .. } => 0,
            EventKind::Timer { .. } => 1,
        }
    }
}

/// An event popped from the queue
#[derive(Debug)]
pub struct Event {
    /// When it fires
    pub time: SimTime,
    /// What it does
    pub kind: EventKind,
}

struct Entry {
    time: SimTime,
    priority: u8,
    seq: u64,
    kind: EventKind,
}

impl Entry {
    fn key(&self) -> (SimTime, u8, u64) {
        (self.time, self.priority, self.seq)
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Reversed: BinaryHeap is a max-heap and we want the earliest event on top.
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

/// Single-threaded event queue and clock
#[derive(Default)]
pub struct Scheduler {
    now: SimTime,
    queue: BinaryHeap<Entry>,
    next_seq: u64,
    next_timer: u64,
    processed: u64,
}

impl Scheduler {
    /// Create an empty scheduler at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulated time
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Number of events handed out so far
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Number of events still queued
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Time of the next event, if any
    pub fn peek_time(&self) -> Option<SimTime> {
        self.queue.peek().map(|e| e.time)
    }

    /// Deliver `payload` to `to` after `delay`
    pub fn schedule_delivery(&mut self, delay: SimTime, to: Role, payload: Payload) {
        self.push(delay, EventKind::Deliver { to, payload });
    }

    /// Start a timer for `owner` that fires after `delay`
    pub fn schedule_timer(&mut self, delay: SimTime, owner: Role) -> TimerId {
        let id = TimerId(self.next_timer);
        self.next_timer += 1;
        self.push(delay, EventKind::Timer { owner, id });
        id
    }

    /// Pop the next event if it fires no later than `limit`, advancing the clock
    pub fn pop_until(&mut self, limit: SimTime) -> Option<Event> {
        if self.peek_time()? > limit {
            return None;
        }
        let entry = self.queue.pop()?;
        self.now = entry.time;
        self.processed += 1;
        Some(Event {
            time: entry.time,
            kind: entry.kind,
        })
    }

    fn push(&mut self, delay: SimTime, kind: EventKind) {
        let entry = Entry {
            time: self.now.saturating_add(delay),
            priority: kind.priority(),
            seq: self.next_seq,
            kind,
        };
        self.next_seq += 1;
        self.queue.push(entry);
    }
}
