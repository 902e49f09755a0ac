// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Committed frame snapshots and history navigation.
//!
//! Frames live in a fixed ring owned by the engine. A [`FrameRef`] is a
//! borrowed view of one ring entry; its predecessor is the entry one step back
//! in the ring, so walking backwards never leaves the ring and never dangles.
//! [`ContactRef`] does the same for a single slot across frames.

use alloc::collections::TryReserveError;
use alloc::vec::Vec;
use core::fmt;
use core::ops::Deref;

use smallvec::SmallVec;
use tactile_bits::BitSet;

use crate::Contact;

/// Set of slot indices.
pub type SlotSet = BitSet<1>;

/// Largest number of slots an engine can track.
pub const MAX_SLOTS: usize = SlotSet::CAPACITY;

/// One surface-wide snapshot taken at a sync.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    /// Sequence number, increasing by one per committed frame.
    pub sequence_id: u64,
    /// Bumped whenever the number of active contacts changes.
    pub revision: u64,
    /// Bumped whenever the set of occupied slots or their identities change.
    pub slot_revision: u64,
    /// Sync time in milliseconds.
    pub time: u64,
    /// Time of the last `revision` bump.
    pub mod_time: u64,
    /// Time of the last `slot_revision` bump.
    pub slot_mod_time: u64,
    pub(crate) committed: bool,
    pub(crate) active: SmallVec<[usize; 8]>,
    pub(crate) slots: Vec<Contact>,
}

impl Frame {
    pub(crate) fn try_new(num_slots: usize) -> Result<Self, TryReserveError> {
        let mut slots = Vec::new();
        slots.try_reserve_exact(num_slots)?;
        slots.extend((0..num_slots).map(Contact::new));
        Ok(Self {
            slots,
            ..Self::default()
        })
    }

    /// Returns `true` once this entry has been committed by a sync.
    ///
    /// Ring entries that were never written are blank, uncommitted frames.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Number of active contacts.
    #[must_use]
    pub fn num_active(&self) -> usize {
        self.active.len()
    }

    /// Indices of active slots, ascending.
    #[must_use]
    pub fn active_slots(&self) -> &[usize] {
        &self.active
    }

    /// Active slots as a set.
    #[must_use]
    pub fn active_set(&self) -> SlotSet {
        self.active.iter().copied().collect()
    }

    /// Every slot, active or not.
    #[must_use]
    pub fn slots(&self) -> &[Contact] {
        &self.slots
    }

    /// The contact in `slot`, if the slot exists.
    #[must_use]
    pub fn slot(&self, slot: usize) -> Option<&Contact> {
        self.slots.get(slot)
    }

    /// Active contacts in slot order.
    pub fn active_contacts(&self) -> impl Iterator<Item = &Contact> + '_ {
        self.active.iter().map(|&i| &self.slots[i])
    }
}

/// Borrowed view of one frame in the engine's history ring.
#[derive(Clone, Copy)]
pub struct FrameRef<'a> {
    frames: &'a [Frame],
    index: usize,
}

impl<'a> FrameRef<'a> {
    pub(crate) fn new(frames: &'a [Frame], index: usize) -> Self {
        debug_assert!(index < frames.len(), "frame index out of range");
        Self { frames, index }
    }

    /// Position of this frame in the history ring.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The frame committed immediately before this one.
    ///
    /// The history is a ring: stepping back `history_len` times returns to the
    /// starting frame. Entries never committed are blank frames.
    #[must_use]
    pub fn prev(&self) -> Self {
        let n = self.frames.len();
        Self::new(self.frames, (self.index + n - 1) % n)
    }

    /// Number of entries in the history ring.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.frames.len()
    }

    /// Walks backwards from this frame through committed history, newest first.
    ///
    /// Stops at the first uncommitted entry or after visiting the whole ring.
    #[must_use]
    pub fn history(&self) -> History<'a> {
        History {
            next: Some(*self),
            remaining: self.frames.len(),
        }
    }

    /// The contact in `slot` of this frame.
    #[must_use]
    pub fn contact(&self, slot: usize) -> Option<ContactRef<'a>> {
        (slot < self.frames[self.index].slots.len()).then_some(ContactRef {
            frames: self.frames,
            frame: self.index,
            slot,
        })
    }

    /// Active contacts of this frame, in slot order.
    pub fn active(&self) -> impl Iterator<Item = ContactRef<'a>> + 'a {
        let frames = self.frames;
        let frame = self.index;
        frames[frame].active.iter().map(move |&slot| ContactRef {
            frames,
            frame,
            slot,
        })
    }

    /// Returns `true` if this frame has contacts and its predecessor had none.
    #[must_use]
    pub fn is_touch_start(&self) -> bool {
        self.num_active() > 0 && self.prev().num_active() == 0
    }
}

impl Deref for FrameRef<'_> {
    type Target = Frame;

    fn deref(&self) -> &Frame {
        &self.frames[self.index]
    }
}

impl fmt::Debug for FrameRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameRef")
            .field("index", &self.index)
            .field("sequence_id", &self.sequence_id)
            .field("time", &self.time)
            .field("active", &self.active_slots())
            .finish()
    }
}

/// Iterator returned by [`FrameRef::history`].
#[derive(Clone, Debug)]
pub struct History<'a> {
    next: Option<FrameRef<'a>>,
    remaining: usize,
}

impl<'a> Iterator for History<'a> {
    type Item = FrameRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.next.take()?;
        if self.remaining == 0 || !frame.is_committed() {
            return None;
        }
        self.remaining -= 1;
        self.next = Some(frame.prev());
        Some(frame)
    }
}

/// Borrowed view of one slot in one frame.
#[derive(Clone, Copy)]
pub struct ContactRef<'a> {
    frames: &'a [Frame],
    frame: usize,
    slot: usize,
}

impl<'a> ContactRef<'a> {
    /// The same slot in the preceding frame.
    #[must_use]
    pub fn prev(&self) -> Self {
        let n = self.frames.len();
        Self {
            frames: self.frames,
            frame: (self.frame + n - 1) % n,
            slot: self.slot,
        }
    }

    /// The frame holding this contact.
    #[must_use]
    pub fn frame(&self) -> FrameRef<'a> {
        FrameRef::new(self.frames, self.frame)
    }

    /// Returns `true` if this contact starts a touch in its slot.
    #[must_use]
    pub fn is_begin(&self) -> bool {
        self.active && !self.continues(&self.prev())
    }

    /// Returns `true` if the touch previously in this slot has ended.
    #[must_use]
    pub fn is_end(&self) -> bool {
        let prev = self.prev();
        prev.active && !self.continues(&prev)
    }
}

impl Deref for ContactRef<'_> {
    type Target = Contact;

    fn deref(&self) -> &Contact {
        &self.frames[self.frame].slots[self.slot]
    }
}

impl fmt::Debug for ContactRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContactRef")
            .field("frame", &self.frame)
            .field("contact", &**self)
            .finish()
    }
}
