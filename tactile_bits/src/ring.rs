// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Power-of-two circular queue.

use alloc::collections::TryReserveError;
use alloc::vec::Vec;
use core::fmt;
use core::iter::FusedIterator;

/// A FIFO queue with a fixed power-of-two capacity.
///
/// Producer and consumer counters increase monotonically and are reduced to
/// storage indices by masking with `capacity - 1`. The queue never grows: a
/// [`push`](Self::push) into a full queue evicts the oldest unread entry,
/// returns it, and bumps [`overwritten`](Self::overwritten).
pub struct RingBuffer<T> {
    items: Vec<Option<T>>,
    mask: usize,
    head: usize,
    tail: usize,
    overwritten: u64,
}

impl<T> RingBuffer<T> {
    /// Creates a queue holding at least `capacity` entries.
    ///
    /// The capacity is rounded up to the next power of two, and is at least 1.
    ///
    /// # Panics
    ///
    /// Panics if the backing storage cannot be allocated. Use
    /// [`try_with_capacity`](Self::try_with_capacity) to handle that case.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        match Self::try_with_capacity(capacity) {
            Ok(ring) => ring,
            Err(err) => panic!("ring buffer allocation failed: {err}"),
        }
    }

    /// Creates a queue holding at least `capacity` entries, reporting
    /// allocation failure instead of aborting.
    pub fn try_with_capacity(capacity: usize) -> Result<Self, TryReserveError> {
        let capacity = capacity.max(1).next_power_of_two();
        let mut items = Vec::new();
        items.try_reserve_exact(capacity)?;
        items.resize_with(capacity, || None);
        Ok(Self {
            items,
            mask: capacity - 1,
            head: 0,
            tail: 0,
            overwritten: 0,
        })
    }

    /// Returns the fixed capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    /// Returns the number of unread entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.head.wrapping_sub(self.tail)
    }

    /// Returns `true` if there are no unread entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Returns `true` if the next push will evict an entry.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    /// Returns how many entries have been evicted by overflow so far.
    #[must_use]
    pub fn overwritten(&self) -> u64 {
        self.overwritten
    }

    /// Appends `item`. If the queue was full, the oldest entry is removed and
    /// returned.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.is_full() {
            self.overwritten += 1;
            self.pop()
        } else {
            None
        };
        let idx = self.head & self.mask;
        self.items[idx] = Some(item);
        self.head = self.head.wrapping_add(1);
        evicted
    }

    /// Removes and returns the oldest entry.
    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let idx = self.tail & self.mask;
        self.tail = self.tail.wrapping_add(1);
        self.items[idx].take()
    }

    /// Returns the oldest entry without removing it.
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        self.items[self.tail & self.mask].as_ref()
    }

    /// Iterates over unread entries from oldest to newest without consuming them.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.len()).filter_map(move |i| {
            self.items[self.tail.wrapping_add(i) & self.mask].as_ref()
        })
    }

    /// Drops every unread entry.
    pub fn clear(&mut self) {
        while self.pop().is_some() {}
    }

    /// Removes unread entries from oldest to newest.
    ///
    /// Entries not consumed by the iterator are dropped when it is dropped.
    pub fn drain(&mut self) -> Drain<'_, T> {
        Drain { ring: self }
    }
}

impl<T> fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .field("overwritten", &self.overwritten)
            .finish_non_exhaustive()
    }
}

/// Draining iterator returned by [`RingBuffer::drain`].
#[derive(Debug)]
pub struct Drain<'a, T> {
    ring: &'a mut RingBuffer<T>,
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.ring.pop()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.ring.len();
        (len, Some(len))
    }
}

impl<T> ExactSizeIterator for Drain<'_, T> {}

impl<T> FusedIterator for Drain<'_, T> {}

impl<T> Drop for Drain<'_, T> {
    fn drop(&mut self) {
        self.ring.clear();
    }
}
