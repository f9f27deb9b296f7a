// loxy-vm - Single-pass bytecode compiler and stack VM for the Loxy scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Open-addressed hash set of interned strings.
//!
//! Keys probe by precomputed FNV-1a hash and resolve collisions linearly.
//! Capacity is always a power of two and doubles once the table passes 75%
//! load. Removal leaves a tombstone (`key = None`, `value = true`) that
//! probing skips over but insertion may reuse; tombstones are reclaimed when
//! the table rehashes.

use crate::heap::{Gc, Heap};
use crate::value::LoxString;

const MAX_LOAD_PERCENT: usize = 75;

/// One slot of the table.
///
/// `key == None && value` marks a tombstone; `key == None && !value` is an
/// empty slot that terminates a probe sequence.
#[derive(Clone, Copy)]
struct Entry {
    key: Option<Gc<LoxString>>,
    value: bool,
}

impl Entry {
    const EMPTY: Entry = Entry {
        key: None,
        value: false,
    };

    fn is_tombstone(&self) -> bool {
        self.key.is_none() && self.value
    }
}

/// A hash set of `Gc<LoxString>` keyed on string content.
pub struct Table {
    entries: Vec<Entry>,
    /// Occupied slots, tombstones included.
    count: usize,
}

impl Table {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            count: 0,
        }
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.key.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find the slot for `key`, or the slot where it would be inserted.
    ///
    /// Returns the index of the entry holding `key`, or of the first
    /// tombstone seen (for reuse), or of the terminating empty slot.
    fn find_entry(entries: &[Entry], key: Gc<LoxString>, hash: u32) -> usize {
        let mask = entries.len() - 1;
        let mut index = hash as usize & mask;
        let mut tombstone: Option<usize> = None;

        loop {
            let entry = &entries[index];
            match entry.key {
                Some(existing) if existing == key => return index,
                Some(_) => {}
                None if entry.is_tombstone() => {
                    if tombstone.is_none() {
                        tombstone = Some(index);
                    }
                }
                None => return tombstone.unwrap_or(index),
            }
            index = (index + 1) & mask;
        }
    }

    /// Probe for an interned string with the given content.
    ///
    /// This is the content-keyed lookup interning relies on: a hit requires
    /// equal hash, equal length, and byte-equal characters.
    pub fn find_string(&self, chars: &str, hash: u32) -> Option<Gc<LoxString>> {
        if self.entries.is_empty() {
            return None;
        }

        let mask = self.entries.len() - 1;
        let mut index = hash as usize & mask;

        loop {
            let entry = &self.entries[index];
            match entry.key {
                Some(key) => {
                    // SAFETY: pool keys are GC roots, hence live.
                    let s = unsafe { key.as_ref() };
                    if s.hash() == hash && s.len() == chars.len() && s.as_str() == chars {
                        return Some(key);
                    }
                }
                None if entry.is_tombstone() => {}
                None => return None,
            }
            index = (index + 1) & mask;
        }
    }

    /// Insert `key`. Returns `true` if it was not already present.
    pub fn insert(&mut self, key: Gc<LoxString>) -> bool {
        if (self.count + 1) * 100 > self.entries.len() * MAX_LOAD_PERCENT {
            self.grow();
        }

        // SAFETY: the caller's key is live; it came from the heap just now
        // or from a rooted structure.
        let hash = unsafe { key.as_ref() }.hash();
        let index = Self::find_entry(&self.entries, key, hash);
        let entry = &mut self.entries[index];

        let is_new = entry.key.is_none();
        if is_new && !entry.is_tombstone() {
            self.count += 1;
        }

        entry.key = Some(key);
        entry.value = true;
        is_new
    }

    /// Remove `key`, leaving a tombstone. Returns `true` if it was present.
    ///
    /// This is the collector's sweep hook: unreachable strings are deleted
    /// here before their objects are freed.
    pub fn remove(&mut self, key: Gc<LoxString>) -> bool {
        if self.entries.is_empty() {
            return false;
        }

        // SAFETY: the key is being removed by code that still holds it.
        let hash = unsafe { key.as_ref() }.hash();
        let index = Self::find_entry(&self.entries, key, hash);
        let entry = &mut self.entries[index];
        if entry.key.is_none() {
            return false;
        }

        // Tombstone: probing treats it as occupied-but-skippable.
        entry.key = None;
        entry.value = true;
        true
    }

    /// Iterate over the live keys.
    pub fn iter(&self) -> impl Iterator<Item = Gc<LoxString>> + '_ {
        self.entries.iter().filter_map(|e| e.key)
    }

    /// Mark every key as a GC root.
    pub fn mark_all(&self, heap: &mut Heap) {
        for key in self.iter() {
            heap.mark(key);
        }
    }

    /// Double the capacity and rehash, reclaiming tombstones.
    fn grow(&mut self) {
        let capacity = if self.entries.is_empty() {
            8
        } else {
            self.entries.len() * 2
        };
        let mut entries = vec![Entry::EMPTY; capacity];

        let mut count = 0;
        for entry in &self.entries {
            if let Some(key) = entry.key {
                // SAFETY: live key, as in insert().
                let hash = unsafe { key.as_ref() }.hash();
                let index = Self::find_entry(&entries, key, hash);
                entries[index] = Entry { key: Some(key), value: true };
                count += 1;
            }
        }

        self.entries = entries;
        self.count = count;
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::hash_str;

    fn alloc(heap: &mut Heap, s: &str) -> Gc<LoxString> {
        heap.alloc(LoxString::new(s))
    }

    #[test]
    fn test_insert_and_find() {
        let mut heap = Heap::new();
        let mut table = Table::new();
        let s = alloc(&mut heap, "hello");

        assert!(table.insert(s));
        assert!(!table.insert(s), "second insert of the same key is a no-op");
        assert_eq!(table.len(), 1);
        assert_eq!(table.find_string("hello", hash_str("hello")), Some(s));
        assert_eq!(table.find_string("world", hash_str("world")), None);
    }

    #[test]
    fn test_content_probe_distinguishes_lengths() {
        let mut heap = Heap::new();
        let mut table = Table::new();
        table.insert(alloc(&mut heap, "ab"));
        assert_eq!(table.find_string("abc", hash_str("abc")), None);
    }

    #[test]
    fn test_remove_leaves_usable_table() {
        let mut heap = Heap::new();
        let mut table = Table::new();
        let a = alloc(&mut heap, "a");
        let b = alloc(&mut heap, "b");
        table.insert(a);
        table.insert(b);

        assert!(table.remove(a));
        assert!(!table.remove(a));
        assert_eq!(table.len(), 1);
        assert_eq!(table.find_string("a", hash_str("a")), None);
        assert_eq!(table.find_string("b", hash_str("b")), Some(b));
    }

    #[test]
    fn test_tombstone_slot_is_reused() {
        let mut heap = Heap::new();
        let mut table = Table::new();
        let a = alloc(&mut heap, "a");
        table.insert(a);
        table.remove(a);

        let a2 = alloc(&mut heap, "a");
        assert!(table.insert(a2));
        assert_eq!(table.find_string("a", hash_str("a")), Some(a2));
    }

    #[test]
    fn test_growth_keeps_all_keys() {
        let mut heap = Heap::new();
        let mut table = Table::new();
        let words: Vec<String> = (0..64).map(|i| format!("key{}", i)).collect();
        let keys: Vec<_> = words.iter().map(|w| alloc(&mut heap, w)).collect();

        for &key in &keys {
            table.insert(key);
        }

        assert_eq!(table.len(), 64);
        for (word, &key) in words.iter().zip(&keys) {
            assert_eq!(table.find_string(word, hash_str(word)), Some(key));
        }
    }

    #[test]
    fn test_rehash_reclaims_tombstones() {
        let mut heap = Heap::new();
        let mut table = Table::new();

        // Insert and remove enough keys that tombstones alone would exceed
        // the load factor, then insert past the growth point.
        for i in 0..32 {
            let key = alloc(&mut heap, &format!("dead{}", i));
            table.insert(key);
            table.remove(key);
        }
        let live = alloc(&mut heap, "live");
        table.insert(live);

        assert_eq!(table.len(), 1);
        assert_eq!(table.find_string("live", hash_str("live")), Some(live));
    }
}
