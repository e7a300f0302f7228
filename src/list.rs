//! Owned, arena-backed header queue. Plays the role the intrusive
//! doubly-linked list plays in the original design: O(1) append, forward
//! traversal in insertion order, and removal during that traversal — but
//! as safe Rust (an arena of slots linked by index) instead of raw
//! embedded pointers.

/// One parsed header's key/value, stored as monotonic ring-buffer offsets
/// rather than borrowed slices so the queue has no lifetime tied to the
/// connection's ring buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderSlot {
    pub key: (usize, usize),
    pub value: (usize, usize),
    next: Option<u32>,
}

/// Forward-only queue of headers for the request currently being parsed.
/// `clear` drops everything in O(1) (no drop glue per entry).
#[derive(Debug, Default)]
pub struct HeaderQueue {
    arena: Vec<HeaderSlot>,
    head: Option<u32>,
    tail: Option<u32>,
}

impl HeaderQueue {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            arena: Vec::with_capacity(cap),
            head: None,
            tail: None,
        }
    }

    pub fn push_back(&mut self, key: (usize, usize), value: (usize, usize)) {
        let idx = self.arena.len() as u32;
        self.arena.push(HeaderSlot {
            key,
            value,
            next: None,
        });
        match self.tail {
            Some(tail) => self.arena[tail as usize].next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.head = None;
        self.tail = None;
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Forward iterator in insertion order. The dispatch table (§4.F)
    /// consumes every entry exactly once; nothing here needs to support
    /// removing a single node mid-walk because dispatch always drains the
    /// whole queue and then calls `clear`.
    pub fn iter(&self) -> impl Iterator<Item = &HeaderSlot> {
        self.arena.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_then_iterate_preserves_order() {
        let mut q = HeaderQueue::with_capacity(4);
        q.push_back((0, 4), (6, 7));
        q.push_back((10, 14), (16, 19));
        let got: Vec<_> = q.iter().map(|s| s.key).collect();
        assert_eq!(got, vec![(0, 4), (10, 14)]);
    }

    #[test]
    fn clear_empties_queue() {
        let mut q = HeaderQueue::with_capacity(4);
        q.push_back((0, 1), (2, 3));
        q.clear();
        assert!(q.is_empty());
        assert_eq!(q.len(), 0);
    }
}
