//! Process-wide unique-name interner.
//!
//! Maps arbitrary strings to small `u32` ids so the render core can use a
//! cheap integer as a hash key instead of hashing a string on every
//! lookup. Id `0` is reserved for "no such name"; real ids start at `1`.
//! The source copies each string into a dedicated string pool so the
//! hash table can key on a stable pointer; the [`HashTable`] here owns
//! its `String` keys directly, which gives the same stable, single-copy
//! storage without a second allocator layer.

use crate::container::{next_table_size, HashTable};
use crate::error::Result;

/// Sentinel returned by [`UniqueNameInterner::get`] when a name was never
/// interned.
pub const MISSING_ID: u32 = 0;

/// Interns strings to stable `u32` ids, growing its table by doubling.
pub struct UniqueNameInterner {
    table: HashTable<String, u32>,
    next_id: u32,
    capacity_hint: usize,
}

impl UniqueNameInterner {
    /// Builds an interner with room for roughly `initial_capacity` names
    /// before its first rehash.
    pub fn new(initial_capacity: usize) -> Self {
        let capacity_hint = initial_capacity.max(1);
        UniqueNameInterner {
            table: HashTable::new(capacity_hint),
            next_id: 1,
            capacity_hint,
        }
    }

    /// Number of interned names.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether no names have been interned yet.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the id for `name`, interning it first if it hasn't been
    /// seen before. Calling `create` twice with the same string always
    /// returns the same id.
    pub fn create(&mut self, name: &str) -> Result<u32> {
        if let Some(&id) = self.table.find(&name.to_string()) {
            return Ok(id);
        }

        if self.table.len() + 1 > self.capacity_hint {
            self.capacity_hint *= 2;
            self.table.rehash(next_table_size(self.capacity_hint));
        }

        let id = self.next_id;
        self.table.insert(name.to_owned(), id)?;
        self.next_id += 1;
        Ok(id)
    }

    /// Looks up `name` without interning it, returning [`MISSING_ID`] if
    /// it was never created.
    pub fn get(&self, name: &str) -> u32 {
        self.table.find(&name.to_string()).copied().unwrap_or(MISSING_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_is_idempotent_for_equal_strings() {
        let mut interner = UniqueNameInterner::new(4);
        let a1 = interner.create("alpha").unwrap();
        let a2 = interner.create("alpha").unwrap();
        assert_eq!(a1, a2);
    }

    #[test]
    fn distinct_strings_get_distinct_ids() {
        let mut interner = UniqueNameInterner::new(4);
        let a = interner.create("alpha").unwrap();
        let b = interner.create("beta").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn get_after_create_matches() {
        let mut interner = UniqueNameInterner::new(4);
        let id = interner.create("gamma").unwrap();
        assert_eq!(interner.get("gamma"), id);
    }

    #[test]
    fn get_before_create_is_missing() {
        let interner = UniqueNameInterner::new(4);
        assert_eq!(interner.get("never-seen"), MISSING_ID);
    }

    #[test]
    fn ids_start_at_one() {
        let mut interner = UniqueNameInterner::new(4);
        assert_eq!(interner.create("first").unwrap(), 1);
    }

    #[test]
    fn grows_past_initial_capacity() {
        let mut interner = UniqueNameInterner::new(2);
        for i in 0..50 {
            interner.create(&format!("name-{i}")).unwrap();
        }
        assert_eq!(interner.len(), 50);
        for i in 0..50 {
            assert_ne!(interner.get(&format!("name-{i}")), MISSING_ID);
        }
    }
}
