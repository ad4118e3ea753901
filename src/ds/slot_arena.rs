//! Index-addressed arena with slot reuse.
//!
//! Nodes of the bucket chains and of the recency list live in arenas and link
//! to each other by [`SlotId`] instead of by pointer. Freed slots form an
//! in-place free list and are handed out again by later inserts.
//!
//! ```text
//!   slots:  [ Occupied(A) | Vacant(next: 3) | Occupied(B) | Vacant(next: -) ]
//!   free_head ──────────────► 1 ─────────────────────────► 3
//! ```

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(pub(crate) usize);

impl SlotId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
enum Slot<T> {
    Occupied(T),
    Vacant { next_free: Option<usize> },
}

#[derive(Debug)]
pub struct SlotArena<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<usize>,
    len: usize,
}

impl<T> SlotArena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            len: 0,
        }
    }

    /// Stores `value`, reusing the most recently freed slot if there is one.
    pub fn insert(&mut self, value: T) -> SlotId {
        let idx = match self.free_head {
            Some(idx) => {
                let next_free = match self.slots[idx] {
                    Slot::Vacant { next_free } => next_free,
                    Slot::Occupied(_) => unreachable!("free list points at an occupied slot"),
                };
                self.free_head = next_free;
                self.slots[idx] = Slot::Occupied(value);
                idx
            },
            None => {
                self.slots.push(Slot::Occupied(value));
                self.slots.len() - 1
            },
        };
        self.len += 1;
        SlotId(idx)
    }

    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        let slot = self.slots.get_mut(id.0)?;
        if matches!(slot, Slot::Vacant { .. }) {
            return None;
        }
        let taken = std::mem::replace(
            slot,
            Slot::Vacant {
                next_free: self.free_head,
            },
        );
        self.free_head = Some(id.0);
        self.len -= 1;
        match taken {
            Slot::Occupied(value) => Some(value),
            Slot::Vacant { .. } => None,
        }
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        match self.slots.get(id.0)? {
            Slot::Occupied(value) => Some(value),
            Slot::Vacant { .. } => None,
        }
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        match self.slots.get_mut(id.0)? {
            Slot::Occupied(value) => Some(value),
            Slot::Vacant { .. } => None,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_head = None;
        self.len = 0;
    }
}

impl<T> Default for SlotArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_remove_reuses_freed_slot() {
        let mut arena = SlotArena::new();
        let id1 = arena.insert("a");
        let id2 = arena.insert("b");
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(id1), Some(&"a"));
        assert_eq!(arena.get(id2), Some(&"b"));

        assert_eq!(arena.remove(id1), Some("a"));
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.get(id1), None);

        let id3 = arena.insert("c");
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(id3), Some(&"c"));
        assert_eq!(id1.index(), id3.index());
    }

    #[test]
    fn free_list_is_lifo() {
        let mut arena = SlotArena::new();
        let a = arena.insert(1);
        let b = arena.insert(2);
        let _c = arena.insert(3);
        arena.remove(a);
        arena.remove(b);

        assert_eq!(arena.insert(4).index(), b.index());
        assert_eq!(arena.insert(5).index(), a.index());
        assert_eq!(arena.insert(6).index(), 3);
    }

    #[test]
    fn double_remove_is_none() {
        let mut arena = SlotArena::new();
        let id = arena.insert(10);
        assert_eq!(arena.remove(id), Some(10));
        assert_eq!(arena.remove(id), None);
        assert_eq!(arena.remove(SlotId(99)), None);
        assert!(arena.is_empty());
    }

    #[test]
    fn get_mut_skips_vacant_and_clear_resets() {
        let mut arena = SlotArena::new();
        let a = arena.insert(1);
        let b = arena.insert(2);
        let c = arena.insert(3);
        arena.remove(b);
        assert_eq!(arena.get_mut(b), None);
        if let Some(v) = arena.get_mut(c) {
            *v = 30;
        }
        assert_eq!(arena.get(a), Some(&1));
        assert_eq!(arena.get(c), Some(&30));

        arena.clear();
        assert!(arena.is_empty());
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.insert(7).index(), 0);
    }
}
