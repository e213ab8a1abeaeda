//! An open-addressed hash table with chained collision resolution, grown by
//! doubling and never shrunk.
//!
//! The collision strategy is the reference implementation's: when a new
//! key's main position (`hash(key) % capacity`) is already occupied, the
//! occupant is either chained after (if it already sits at its own main
//! position) or evicted to a free slot (if it is itself a displaced
//! collision, in which case the new key takes over the main position and
//! the occupant's real predecessor in its chain is patched to point at the
//! occupant's new home). This keeps every key reachable by walking forward
//! from its own main position, which is what makes lookup a short chain
//! walk instead of a probe sequence.
//!
//! This crate only implements the storage algorithm; it knows nothing about
//! Scheme-level lexical scoping. The parent-chain lookup used for
//! environments (`rget` walking an enclosing scope on a local miss) is
//! layered on top of `Table` by `europa-value`, which is the crate that
//! knows what a "parent environment" value actually is.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("table is empty")]
    Empty,
}

pub type TableResult<T> = std::result::Result<T, TableError>;

/// A key usable in a `Table`. `table_eqv` need not be structural equality -
/// Scheme's `eqv?` treats two distinct heap objects as unequal even if their
/// contents match, which is exactly what a `#[derive(PartialEq)]` on a
/// by-value key type would *not* give you for pointer-identity types.
pub trait TableKey: Copy {
    fn table_hash(&self) -> u64;
    fn table_eqv(&self, other: &Self) -> bool;
}

#[derive(Clone)]
struct Slot<K, V> {
    key: K,
    value: V,
    next: Option<usize>,
}

/// `nodes[i]` is `None` for an empty slot, `Some` for an occupied one.
pub struct Table<K: TableKey, V> {
    nodes: Vec<Option<Slot<K, V>>>,
    count: usize,
    /// Cursor used by `free_position`, scanning backward so that repeated
    /// insertions don't all re-scan the same already-filled tail.
    last_free: usize,
}

impl<K: TableKey, V: Clone> Default for Table<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: TableKey, V: Clone> Table<K, V> {
    pub fn new() -> Self {
        Table::with_capacity(8)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1).next_power_of_two();
        Table {
            nodes: vec![None; capacity],
            count: 0,
            last_free: capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    fn main_position(&self, key: &K) -> usize {
        (key.table_hash() as usize) & (self.capacity() - 1)
    }

    /// Looks up `key` by walking the chain starting at its main position.
    pub fn get(&self, key: &K) -> Option<&V> {
        let mut cursor = Some(self.main_position(key));
        while let Some(i) = cursor {
            match &self.nodes[i] {
                Some(slot) if slot.key.table_eqv(key) => return Some(&slot.value),
                Some(slot) => cursor = slot.next,
                None => return None,
            }
        }
        None
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let mut cursor = Some(self.main_position(key));
        while let Some(i) = cursor {
            match &self.nodes[i] {
                Some(slot) if slot.key.table_eqv(key) => {
                    return self.nodes[i].as_mut().map(|s| &mut s.value)
                }
                Some(slot) => cursor = slot.next,
                None => return None,
            }
        }
        None
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Scans backward from the cursor for an empty slot, matching the
    /// reference implementation's `eutnode_free_position`.
    fn free_position(&mut self) -> Option<usize> {
        while self.last_free > 0 {
            self.last_free -= 1;
            if self.nodes[self.last_free].is_none() {
                return Some(self.last_free);
            }
        }
        None
    }

    fn predecessor_of(&self, main_pos: usize, target: usize) -> Option<usize> {
        let mut cursor = main_pos;
        loop {
            match self.nodes[cursor].as_ref().and_then(|s| s.next) {
                Some(next) if next == target => return Some(cursor),
                Some(next) => cursor = next,
                None => return None,
            }
        }
    }

    fn grow(&mut self) {
        let new_capacity = self.capacity() * 2;
        let old_nodes = std::mem::replace(&mut self.nodes, vec![None; new_capacity]);
        self.count = 0;
        self.last_free = new_capacity;
        for slot in old_nodes.into_iter().flatten() {
            self.insert_fresh(slot.key, slot.value);
        }
    }

    /// Inserts a key known not to already be present, growing first if the
    /// table is full. Used both by `insert` (after a `get` miss) and by
    /// `grow`'s reinsertion pass.
    fn insert_fresh(&mut self, key: K, value: V) {
        if self.count == self.capacity() {
            self.grow();
        }
        let position = self.main_position(&key);
        match self.nodes[position].take() {
            None => {
                self.nodes[position] = Some(Slot {
                    key,
                    value,
                    next: None,
                });
            }
            Some(occupant) => {
                let occupant_main = self.main_position(&occupant.key);
                if occupant_main != position {
                    // The occupant is itself a displaced collision chained
                    // in from elsewhere; evict it to a free slot and patch
                    // its real predecessor, then take over `position`.
                    let free = self.free_position().expect("table invariant: count < capacity");
                    if let Some(pred) = self.predecessor_of(occupant_main, position) {
                        if let Some(pred_slot) = self.nodes[pred].as_mut() {
                            pred_slot.next = Some(free);
                        }
                    }
                    self.nodes[free] = Some(occupant);
                    self.nodes[position] = Some(Slot {
                        key,
                        value,
                        next: None,
                    });
                } else {
                    // The occupant sits at its own main position; chain the
                    // new key in after it.
                    let free = self.free_position().expect("table invariant: count < capacity");
                    self.nodes[free] = Some(Slot {
                        key,
                        value,
                        next: occupant.next,
                    });
                    self.nodes[position] = Some(occupant);
                    self.nodes[position].as_mut().unwrap().next = Some(free);
                }
            }
        }
        self.count += 1;
    }

    /// Inserts or overwrites `key`'s value.
    pub fn insert(&mut self, key: K, value: V) {
        if let Some(slot) = self.get_mut(&key) {
            *slot = value;
            return;
        }
        self.insert_fresh(key, value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.nodes
            .iter()
            .filter_map(|slot| slot.as_ref().map(|s| (&s.key, &s.value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, PartialEq, Debug)]
    struct IntKey(i64);

    impl TableKey for IntKey {
        fn table_hash(&self) -> u64 {
            self.0 as u64
        }

        fn table_eqv(&self, other: &Self) -> bool {
            self.0 == other.0
        }
    }

    #[test]
    fn insert_then_get_roundtrips() {
        let mut t: Table<IntKey, &str> = Table::new();
        t.insert(IntKey(1), "one");
        t.insert(IntKey(2), "two");
        assert_eq!(t.get(&IntKey(1)), Some(&"one"));
        assert_eq!(t.get(&IntKey(2)), Some(&"two"));
        assert_eq!(t.get(&IntKey(3)), None);
    }

    #[test]
    fn overwrite_existing_key_does_not_grow_count() {
        let mut t: Table<IntKey, &str> = Table::new();
        t.insert(IntKey(1), "one");
        t.insert(IntKey(1), "uno");
        assert_eq!(t.len(), 1);
        assert_eq!(t.get(&IntKey(1)), Some(&"uno"));
    }

    #[test]
    fn many_colliding_keys_all_remain_reachable() {
        // Force heavy collisions: every key here hashes into the same
        // initial small table, exercising both the chain-after and the
        // evict-and-relocate branches of insert_fresh across a resize.
        let mut t: Table<IntKey, i64> = Table::with_capacity(4);
        for i in 0..64i64 {
            t.insert(IntKey(i * 4), i);
        }
        for i in 0..64i64 {
            assert_eq!(t.get(&IntKey(i * 4)), Some(&i));
        }
        assert_eq!(t.len(), 64);
    }

    #[test]
    fn growth_preserves_all_entries() {
        let mut t: Table<IntKey, i64> = Table::with_capacity(2);
        for i in 0..20 {
            t.insert(IntKey(i), i * 10);
        }
        assert_eq!(t.len(), 20);
        for i in 0..20 {
            assert_eq!(t.get(&IntKey(i)), Some(&(i * 10)));
        }
    }
}
