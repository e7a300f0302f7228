//! Min-heap of per-connection idle timers with lazy tombstone deletion.
//! Cancelling a timer is O(1) (bump a generation counter); the heap only
//! pays for the cancellation when the stale entry eventually reaches the
//! root.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use mio::Token;

/// Idle connections are dropped `TIMEOUT_DEFAULT` after their last
/// successful I/O.
pub const TIMEOUT_DEFAULT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TimerEntry {
    deadline: Instant,
    token: Token,
    generation: u32,
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.deadline.cmp(&other.deadline)
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Tracks, per connection, the generation of its current live timer entry.
/// A popped heap entry is a tombstone iff its generation no longer matches
/// what's recorded here (or the connection has no entry recorded at all,
/// meaning it was already expired/removed).
#[derive(Default)]
pub struct TimerWheel {
    heap: BinaryHeap<Reverse<TimerEntry>>,
    generations: std::collections::HashMap<Token, u32>,
}

impl TimerWheel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms (or re-arms) the idle timer for `token`, `timeout` from now.
    /// Any previously live entry for this token is implicitly tombstoned:
    /// its generation no longer matches what gets recorded here.
    pub fn add(&mut self, token: Token, now: Instant, timeout: Duration) {
        let generation = self.generations.entry(token).or_insert(0);
        *generation = generation.wrapping_add(1);
        self.heap.push(Reverse(TimerEntry {
            deadline: now + timeout,
            token,
            generation: *generation,
        }));
    }

    /// O(1) cancellation: the connection is dropped from the generation
    /// map so any entry still in the heap for it is a tombstone.
    pub fn cancel(&mut self, token: Token) {
        self.generations.remove(&token);
    }

    fn is_tombstone(&self, entry: &TimerEntry) -> bool {
        self.generations.get(&entry.token) != Some(&entry.generation)
    }

    /// Milliseconds until the next live deadline, purging tombstones off
    /// the root as it goes. `None` means no live timers (poll with no
    /// timeout).
    pub fn next_deadline(&mut self, now: Instant) -> Option<Duration> {
        while let Some(Reverse(top)) = self.heap.peek() {
            if self.is_tombstone(top) {
                self.heap.pop();
                continue;
            }
            let top = *top;
            return Some(top.deadline.saturating_duration_since(now));
        }
        None
    }

    /// Pops and returns every token whose deadline has passed, skipping
    /// tombstones. Callers close the returned connections.
    pub fn expire_due(&mut self, now: Instant) -> Vec<Token> {
        let mut expired = Vec::new();
        while let Some(Reverse(top)) = self.heap.peek() {
            if top.deadline > now {
                break;
            }
            let Reverse(top) = self.heap.pop().unwrap();
            if !self.is_tombstone(&top) {
                self.generations.remove(&top.token);
                expired.push(top.token);
            }
        }
        expired
    }
}
