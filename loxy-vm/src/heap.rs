// loxy-vm - Single-pass bytecode compiler and stack VM for the Loxy scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The garbage-collected heap.
//!
//! Every heap object (strings, modules) is allocated through [`Heap::alloc`],
//! which links it into a single intrusive list and charges its size against a
//! running byte counter. The heap itself never decides *when* to collect: it
//! reports [`Heap::should_collect`] once the counter crosses the current
//! threshold, and the VM, as the only component that can enumerate roots,
//! calls [`Heap::collect`] with a callback that marks them. After a cycle the
//! threshold grows in proportion to the bytes that survived.
//!
//! [`Gc<T>`] is a thin, Copy, non-owning handle. Dereferencing is `unsafe`
//! because an unreachable object may be swept; the VM keeps every handle it
//! hands out reachable from the root set (stack, globals, string pool,
//! module registry, chunk constants).

use std::cell::Cell;
use std::fmt;
use std::ptr::NonNull;

/// Heap objects implement `Trace` so the collector can find their children.
pub trait Trace {
    /// Mark every `Gc` handle reachable from `self` by calling
    /// [`Heap::mark`] on it.
    fn trace(&self, heap: &mut Heap);

    /// Approximate payload size in bytes, excluding the object header.
    fn heap_size(&self) -> usize;
}

/// On-heap object header plus payload.
struct ObjBox<T: Trace + ?Sized> {
    /// Mark bit: `true` while the object is known reachable during a cycle.
    is_dark: Cell<bool>,
    /// Next object in the heap's intrusive all-objects list.
    next: Option<NonNull<ObjBox<dyn Trace>>>,
    value: T,
}

/// A non-owning, Copy handle to a heap object.
pub struct Gc<T: Trace + ?Sized> {
    ptr: NonNull<ObjBox<T>>,
}

// Manual impls: the derives would demand T: Clone / T: Copy.
impl<T: Trace + ?Sized> Clone for Gc<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T: Trace + ?Sized> Copy for Gc<T> {}

impl<T: Trace + ?Sized> fmt::Debug for Gc<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gc({:p})", self.ptr.as_ptr())
    }
}

impl<T: Trace + ?Sized> PartialEq for Gc<T> {
    /// Handles are equal iff they refer to the same object.
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(self.ptr.as_ptr(), other.ptr.as_ptr())
    }
}
impl<T: Trace + ?Sized> Eq for Gc<T> {}

impl<T: Trace + ?Sized> Gc<T> {
    /// Borrow the object.
    ///
    /// # Safety
    ///
    /// The object must not have been swept. Guaranteed whenever this handle
    /// is reachable from the VM's root set.
    #[inline]
    pub unsafe fn as_ref<'a>(&self) -> &'a T {
        // SAFETY: liveness guaranteed by the caller.
        unsafe { &(*self.ptr.as_ptr()).value }
    }

    /// Borrow the object mutably.
    ///
    /// # Safety
    ///
    /// Same liveness requirement as [`Gc::as_ref`], and the caller must not
    /// hold any other borrow of this object.
    #[allow(clippy::mut_from_ref)]
    #[inline]
    pub unsafe fn as_mut<'a>(&self) -> &'a mut T {
        // SAFETY: liveness and exclusivity guaranteed by the caller.
        unsafe { &mut (*self.ptr.as_ptr()).value }
    }

    fn set_dark(&self, dark: bool) {
        // SAFETY: only called on live objects during a collection cycle.
        unsafe { (*self.ptr.as_ptr()).is_dark.set(dark) }
    }

    fn is_dark(&self) -> bool {
        // SAFETY: same as above.
        unsafe { (*self.ptr.as_ptr()).is_dark.get() }
    }
}

/// The heap: allocator, byte accounting, and the sweep half of collection.
pub struct Heap {
    /// Head of the intrusive list of every live object.
    first: Option<NonNull<ObjBox<dyn Trace>>>,
    /// Bytes currently charged to live objects.
    allocated_bytes: usize,
    /// Collection threshold: collect once `allocated_bytes` exceeds this.
    next_gc: usize,
    /// Completed collection cycles.
    cycles: usize,
}

impl Heap {
    /// Threshold before the first collection (1 MiB).
    const INITIAL_GC_THRESHOLD: usize = 1024 * 1024;

    /// Create an empty heap.
    pub fn new() -> Self {
        Self {
            first: None,
            allocated_bytes: 0,
            next_gc: Self::INITIAL_GC_THRESHOLD,
            cycles: 0,
        }
    }

    /// Allocate a heap object and link it into the all-objects list.
    pub fn alloc<T: Trace + 'static>(&mut self, value: T) -> Gc<T> {
        let size = std::mem::size_of::<ObjBox<T>>() + value.heap_size();

        let mut boxed = Box::new(ObjBox {
            is_dark: Cell::new(false),
            next: self.first,
            value,
        });

        let thin: NonNull<ObjBox<T>> = NonNull::from(boxed.as_mut());
        let fat: NonNull<ObjBox<dyn Trace>> =
            // SAFETY: Box::into_raw never returns null.
            unsafe { NonNull::new_unchecked(Box::into_raw(boxed) as *mut ObjBox<dyn Trace>) };

        self.first = Some(fat);
        self.allocated_bytes += size;

        Gc { ptr: thin }
    }

    /// Mark `ptr` reachable and trace through to its children.
    pub fn mark<T: Trace + ?Sized>(&mut self, ptr: Gc<T>) {
        if ptr.is_dark() {
            return; // already visited
        }
        ptr.set_dark(true);
        // SAFETY: the object was just marked, so it is live.
        unsafe { ptr.as_ref() }.trace(self);
    }

    /// True once the byte counter has crossed the collection threshold.
    #[inline]
    pub fn should_collect(&self) -> bool {
        self.allocated_bytes > self.next_gc
    }

    /// Run one full collection cycle.
    ///
    /// `mark_roots` must mark every root; anything left unmarked afterwards
    /// is swept. The threshold then grows to 1.5x the surviving bytes.
    pub fn collect<F>(&mut self, mark_roots: F)
    where
        F: FnOnce(&mut Heap),
    {
        let before = self.allocated_bytes;

        mark_roots(self);
        self.sweep();

        self.next_gc = (self.allocated_bytes * 3 / 2).max(Self::INITIAL_GC_THRESHOLD);
        self.cycles += 1;

        log::debug!(
            "gc cycle {}: {} -> {} bytes, next at {}",
            self.cycles,
            before,
            self.allocated_bytes,
            self.next_gc
        );
    }

    /// Unlink and free every object whose mark bit is clear; clear the bit
    /// on survivors.
    fn sweep(&mut self) {
        let mut current = self.first;
        let mut prev: Option<NonNull<ObjBox<dyn Trace>>> = None;

        while let Some(node_ptr) = current {
            // SAFETY: every node in the list came from alloc() and has not
            // been freed yet.
            let node = unsafe { node_ptr.as_ref() };
            let next = node.next;

            if node.is_dark.get() {
                node.is_dark.set(false);
                prev = current;
            } else {
                match prev {
                    // SAFETY: p is a live node; we are rewriting its link.
                    Some(p) => unsafe { (*p.as_ptr()).next = next },
                    None => self.first = next,
                }
                // SAFETY: the node is unreachable; we are its sole owner.
                let boxed = unsafe { Box::from_raw(node_ptr.as_ptr()) };
                let size = std::mem::size_of_val(&*boxed) + boxed.value.heap_size();
                self.allocated_bytes = self.allocated_bytes.saturating_sub(size);
            }
            current = next;
        }
    }

    /// Bytes currently tracked by the heap.
    #[inline]
    pub fn allocated_bytes(&self) -> usize {
        self.allocated_bytes
    }

    /// Completed collection cycles.
    #[inline]
    pub fn cycles(&self) -> usize {
        self.cycles
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Heap {
    fn drop(&mut self) {
        // Free every remaining object; this is the matched destroyer for
        // every alloc() that survived to VM teardown.
        let mut current = self.first;
        while let Some(node_ptr) = current {
            // SAFETY: list nodes are valid until freed exactly once, here.
            let next = unsafe { (*node_ptr.as_ptr()).next };
            // SAFETY: sole owner; re-box to drop.
            unsafe { drop(Box::from_raw(node_ptr.as_ptr())) };
            current = next;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
