//! Circular recency list backed by `SlotArena`.
//!
//! Holds one node per live store entry, ordered from most recently used
//! (front) to least recently used (back). The list is circular around a
//! sentinel header node that never carries a key.
//!
//! ## Architecture
//!
//! ```text
//!   arena (SlotArena<Node<K>>)
//!   ┌────────┬───────────────────────────────────────────────┐
//!   │ SlotId │ Node { key, prev, next, epoch }               │
//!   ├────────┼───────────────────────────────────────────────┤
//!   │ 0      │ { key: None (header), prev: 3, next: 2 }      │
//!   │ 2      │ { key: "b", prev: 0, next: 3, epoch: 7 }      │
//!   │ 3      │ { key: "a", prev: 2, next: 0, epoch: 4 }      │
//!   └────────┴───────────────────────────────────────────────┘
//!
//!        ┌──────────────────────────────────────────┐
//!        ▼                                          │
//!   [header] ──► ["b" MRU] ──► ["a" LRU] ───────────┘
//!
//!   empty  ⇔  header.next == header
//! ```
//!
//! ## Handles
//!
//! [`RecencyHandle`] pairs a slot with the epoch stamped on the node when it
//! was created. Epochs are never reused, including across [`RecencyList::clear`],
//! so a handle kept after its node was removed matches nothing even when the
//! slot has been recycled.
//!
//! ## Performance
//! - `push_front`, `move_to_front`, `remove`, `back`: O(1)
//! - `iter`: O(n)

use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::error::InvariantError;

/// Stable reference to one recency node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecencyHandle {
    slot: SlotId,
    epoch: u64,
}

#[derive(Debug)]
struct Node<K> {
    key: Option<K>,
    prev: SlotId,
    next: SlotId,
    epoch: u64,
}

/// Most-recently-used ordering of keys with O(1) promotion and removal.
#[derive(Debug)]
pub struct RecencyList<K> {
    arena: SlotArena<Node<K>>,
    header: SlotId,
    next_epoch: u64,
}

impl<K> RecencyList<K> {
    /// Creates an empty list containing only the header.
    pub fn new() -> Self {
        let mut list = Self {
            arena: SlotArena::new(),
            header: SlotId(0),
            next_epoch: 1,
        };
        list.reset();
        list
    }

    fn reset(&mut self) {
        self.arena.clear();
        let header = self.arena.insert(Node {
            key: None,
            prev: SlotId(0),
            next: SlotId(0),
            epoch: 0,
        });
        debug_assert_eq!(header, SlotId(0));
        self.header = header;
    }

    /// Number of keyed nodes.
    pub fn len(&self) -> usize {
        self.arena.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.node(self.header).next == self.header
    }

    /// Key of the node behind `handle`, if it is still live.
    pub fn key(&self, handle: RecencyHandle) -> Option<&K> {
        let slot = self.live(handle)?;
        self.node(slot).key.as_ref()
    }

    /// Inserts `key` at the front (most recently used) and returns its handle.
    pub fn push_front(&mut self, key: K) -> RecencyHandle {
        let epoch = self.next_epoch;
        self.next_epoch += 1;
        let slot = self.arena.insert(Node {
            key: Some(key),
            prev: self.header,
            next: self.header,
            epoch,
        });
        self.attach_front(slot);
        RecencyHandle { slot, epoch }
    }

    /// Moves a live node to the front; returns `false` for stale handles.
    pub fn move_to_front(&mut self, handle: RecencyHandle) -> bool {
        let Some(slot) = self.live(handle) else {
            return false;
        };
        if self.node(self.header).next != slot {
            self.detach(slot);
            self.attach_front(slot);
        }
        true
    }

    /// Unlinks a live node and returns its key; stale handles yield `None`.
    pub fn remove(&mut self, handle: RecencyHandle) -> Option<K> {
        let slot = self.live(handle)?;
        self.detach(slot);
        self.arena.remove(slot).and_then(|node| node.key)
    }

    /// Handle and key of the least recently used node.
    pub fn back(&self) -> Option<(RecencyHandle, &K)> {
        let slot = self.node(self.header).prev;
        if slot == self.header {
            return None;
        }
        let node = self.node(slot);
        let handle = RecencyHandle {
            slot,
            epoch: node.epoch,
        };
        node.key.as_ref().map(|key| (handle, key))
    }

    /// Keys from most to least recently used.
    pub fn iter(&self) -> RecencyIter<'_, K> {
        RecencyIter {
            list: self,
            current: self.node(self.header).next,
        }
    }

    /// Drops every node; outstanding handles become stale.
    pub fn clear(&mut self) {
        self.reset();
    }

    /// Walks the ring in both directions and checks links and counts.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let header = self.node(self.header);
        if header.key.is_some() {
            return Err(InvariantError::new("recency header carries a key"));
        }

        let mut count = 0usize;
        let mut prev = self.header;
        let mut current = header.next;
        while current != self.header {
            let node = self
                .arena
                .get(current)
                .ok_or_else(|| InvariantError::new("recency link points at a free slot"))?;
            if node.prev != prev {
                return Err(InvariantError::new(format!(
                    "recency node {} has prev {} but was reached from {}",
                    current.index(),
                    node.prev.index(),
                    prev.index()
                )));
            }
            if node.key.is_none() {
                return Err(InvariantError::new("keyless node inside the recency ring"));
            }
            count += 1;
            if count > self.len() {
                return Err(InvariantError::new("recency ring longer than its arena"));
            }
            prev = current;
            current = node.next;
        }

        if header.prev != prev {
            return Err(InvariantError::new("recency header prev is not the tail"));
        }
        if count != self.len() {
            return Err(InvariantError::new(format!(
                "recency ring holds {count} nodes but arena holds {}",
                self.len()
            )));
        }
        Ok(())
    }

    fn live(&self, handle: RecencyHandle) -> Option<SlotId> {
        if handle.slot == self.header {
            return None;
        }
        let node = self.arena.get(handle.slot)?;
        (node.epoch == handle.epoch).then_some(handle.slot)
    }

    fn node(&self, slot: SlotId) -> &Node<K> {
        self.arena
            .get(slot)
            .expect("recency link points at a free slot")
    }

    fn node_mut(&mut self, slot: SlotId) -> &mut Node<K> {
        self.arena
            .get_mut(slot)
            .expect("recency link points at a free slot")
    }

    fn detach(&mut self, slot: SlotId) {
        let (prev, next) = {
            let node = self.node(slot);
            (node.prev, node.next)
        };
        self.node_mut(prev).next = next;
        self.node_mut(next).prev = prev;
        let node = self.node_mut(slot);
        node.prev = slot;
        node.next = slot;
    }

    fn attach_front(&mut self, slot: SlotId) {
        let header = self.header;
        let old_first = self.node(header).next;
        {
            let node = self.node_mut(slot);
            node.prev = header;
            node.next = old_first;
        }
        self.node_mut(old_first).prev = slot;
        self.node_mut(header).next = slot;
    }
}

impl<K> Default for RecencyList<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over keys from front (MRU) to back (LRU).
pub struct RecencyIter<'a, K> {
    list: &'a RecencyList<K>,
    current: SlotId,
}

impl<'a, K> Iterator for RecencyIter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current == self.list.header {
            return None;
        }
        let node = self.list.arena.get(self.current)?;
        self.current = node.next;
        node.key.as_ref()
    }
}
