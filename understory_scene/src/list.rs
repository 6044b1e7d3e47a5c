// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordered child lists: a handle-addressed doubly linked list.
//!
//! Entries live in a slab and are linked through `prev`/`next` indices, so
//! appending, removing by handle, and inserting before a handle are all O(1).
//! Handles are generational: once an entry is removed its handle is stale and
//! every operation taking it fails instead of touching a reused slot.

use alloc::vec::Vec;
use core::fmt;

/// Stable handle to an entry of an [`OrderedList`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ListHandle {
    index: u32,
    generation: u32,
}

#[derive(Clone, Debug)]
struct Entry<T> {
    value: Option<T>,
    generation: u32,
    prev: Option<u32>,
    next: Option<u32>,
}

/// A doubly linked list with O(1) append, remove-by-handle, and insert-before.
#[derive(Clone)]
pub struct OrderedList<T> {
    entries: Vec<Entry<T>>,
    free: Vec<u32>,
    head: Option<u32>,
    tail: Option<u32>,
    len: usize,
}

impl<T: fmt::Debug> fmt::Debug for OrderedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> Default for OrderedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OrderedList<T> {
    /// Create an empty list.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the list has no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if `handle` refers to a live entry of this list.
    pub fn contains(&self, handle: ListHandle) -> bool {
        self.entries
            .get(handle.index as usize)
            .is_some_and(|e| e.generation == handle.generation && e.value.is_some())
    }

    /// The value stored under `handle`, if it is live.
    pub fn get(&self, handle: ListHandle) -> Option<&T> {
        if !self.contains(handle) {
            return None;
        }
        self.entries[handle.index as usize].value.as_ref()
    }

    /// The first value in list order.
    pub fn first(&self) -> Option<&T> {
        self.head
            .and_then(|i| self.entries[i as usize].value.as_ref())
    }

    /// The last value in list order.
    pub fn last(&self) -> Option<&T> {
        self.tail
            .and_then(|i| self.entries[i as usize].value.as_ref())
    }

    /// Append `value` at the end of the list.
    pub fn push_back(&mut self, value: T) -> ListHandle {
        let idx = self.alloc(value);
        self.link(idx, self.tail, None);
        self.handle_of(idx)
    }

    /// Insert `value` immediately before the entry addressed by `before`.
    ///
    /// The relative order of every other entry is preserved. If `before` is
    /// stale the value is handed back unchanged.
    pub fn insert_before(&mut self, value: T, before: ListHandle) -> Result<ListHandle, T> {
        if !self.contains(before) {
            return Err(value);
        }
        let prev = self.entries[before.index as usize].prev;
        let idx = self.alloc(value);
        self.link(idx, prev, Some(before.index));
        Ok(self.handle_of(idx))
    }

    /// Remove the entry addressed by `handle` and return its value.
    pub fn remove(&mut self, handle: ListHandle) -> Option<T> {
        if !self.contains(handle) {
            return None;
        }
        let (prev, next) = {
            let e = &self.entries[handle.index as usize];
            (e.prev, e.next)
        };
        match prev {
            Some(p) => self.entries[p as usize].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.entries[n as usize].prev = prev,
            None => self.tail = prev,
        }
        let entry = &mut self.entries[handle.index as usize];
        entry.prev = None;
        entry.next = None;
        let value = entry.value.take();
        self.free.push(handle.index);
        self.len -= 1;
        value
    }

    /// Zero-based position of `handle` in list order. O(n).
    pub fn position(&self, handle: ListHandle) -> Option<usize> {
        if !self.contains(handle) {
            return None;
        }
        let mut cursor = self.head;
        let mut pos = 0;
        while let Some(i) = cursor {
            if i == handle.index {
                return Some(pos);
            }
            pos += 1;
            cursor = self.entries[i as usize].next;
        }
        None
    }

    /// Iterate values in list order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
            remaining: self.len,
        }
    }

    fn alloc(&mut self, value: T) -> u32 {
        if let Some(idx) = self.free.pop() {
            let e = &mut self.entries[idx as usize];
            e.generation = e.generation.wrapping_add(1);
            e.value = Some(value);
            idx
        } else {
            #[allow(
                clippy::cast_possible_truncation,
                reason = "child lists never approach u32::MAX entries."
            )]
            let idx = self.entries.len() as u32;
            self.entries.push(Entry {
                value: Some(value),
                generation: 0,
                prev: None,
                next: None,
            });
            idx
        }
    }

    fn link(&mut self, idx: u32, prev: Option<u32>, next: Option<u32>) {
        {
            let e = &mut self.entries[idx as usize];
            e.prev = prev;
            e.next = next;
        }
        match prev {
            Some(p) => self.entries[p as usize].next = Some(idx),
            None => self.head = Some(idx),
        }
        match next {
            Some(n) => self.entries[n as usize].prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.len += 1;
    }

    fn handle_of(&self, idx: u32) -> ListHandle {
        ListHandle {
            index: idx,
            generation: self.entries[idx as usize].generation,
        }
    }
}

/// Iterator over the values of an [`OrderedList`], in list order.
#[derive(Debug)]
pub struct Iter<'a, T> {
    list: &'a OrderedList<T>,
    cursor: Option<u32>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cursor?;
        let entry = &self.list.entries[idx as usize];
        self.cursor = entry.next;
        self.remaining -= 1;
        entry.value.as_ref()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<'a, T> IntoIterator for &'a OrderedList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
