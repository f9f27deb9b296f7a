// loxy-vm - Single-pass bytecode compiler and stack VM for the Loxy scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The string pool.
//!
//! Every string in the system is canonicalised here before it escapes:
//! the compiler's literals and identifier constants, and the VM's runtime
//! concatenations, all go through [`Strings::intern`]. The payoff is that
//! content equality and identity equality coincide, so value equality and
//! global-table lookups never compare characters.

use crate::heap::{Gc, Heap};
use crate::table::Table;
use crate::value::{LoxString, hash_str};

/// The pool of interned strings. Owned by the VM; one per VM instance.
pub struct Strings {
    pool: Table,
}

impl Strings {
    pub fn new() -> Self {
        Self { pool: Table::new() }
    }

    /// Return the canonical string object for `chars`, allocating it on
    /// first sight.
    pub fn intern(&mut self, heap: &mut Heap, chars: &str) -> Gc<LoxString> {
        let hash = hash_str(chars);
        if let Some(existing) = self.pool.find_string(chars, hash) {
            return existing;
        }

        let string = heap.alloc(LoxString::with_hash(chars, hash));
        self.pool.insert(string);
        string
    }

    /// Number of distinct interned strings.
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Mark all pooled strings as GC roots.
    ///
    /// Interned strings live as long as the VM; a collector that instead
    /// wants to reclaim unreferenced strings would skip this and call
    /// [`Strings::remove`] for each white string before the sweep.
    pub fn mark_all(&self, heap: &mut Heap) {
        self.pool.mark_all(heap);
    }

    /// Drop one string from the pool (the collector's sweep hook).
    pub fn remove(&mut self, string: Gc<LoxString>) -> bool {
        self.pool.remove(string)
    }
}

impl Default for Strings {
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

    #[test]
    fn test_intern_is_idempotent() {
        let mut heap = Heap::new();
        let mut strings = Strings::new();

        let a = strings.intern(&mut heap, "foo");
        let b = strings.intern(&mut heap, "foo");
        assert_eq!(a, b, "same content must yield the same object");
        assert_eq!(strings.len(), 1);
    }

    #[test]
    fn test_distinct_contents_get_distinct_objects() {
        let mut heap = Heap::new();
        let mut strings = Strings::new();

        let a = strings.intern(&mut heap, "foo");
        let b = strings.intern(&mut heap, "bar");
        assert_ne!(a, b);
        assert_eq!(strings.len(), 2);
    }

    #[test]
    fn test_interned_content_round_trips() {
        let mut heap = Heap::new();
        let mut strings = Strings::new();

        let s = strings.intern(&mut heap, "hello, world");
        // SAFETY: s is held by the pool.
        assert_eq!(unsafe { s.as_ref() }.as_str(), "hello, world");
    }

    #[test]
    fn test_removed_string_is_reinterned_fresh() {
        let mut heap = Heap::new();
        let mut strings = Strings::new();

        let a = strings.intern(&mut heap, "gone");
        assert!(strings.remove(a));
        let b = strings.intern(&mut heap, "gone");
        assert_ne!(a, b, "removal ends the canonical mapping");
    }
}
