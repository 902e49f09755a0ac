// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tactile Bits: small fixed-capacity containers shared by the touch engines.
//!
//! - [`BitSet`]: a bounded set over the universe `0..WORDS * 64` with O(1)
//!   insert, remove and test, a population count, and iteration in ascending
//!   order. Slots, gesture types and registry pool indices are all tracked
//!   with it, so every "for each member" loop in the pipeline visits members
//!   in the same deterministic order.
//! - [`RingBuffer`]: a circular queue with a power-of-two capacity. Indices
//!   wrap by masking. When a producer outruns the consumer the oldest entry
//!   is evicted and handed back to the caller, and the eviction is counted.
//!
//! ## Example
//!
//! ```rust
//! use tactile_bits::{BitSet, RingBuffer};
//!
//! let mut slots = BitSet::<1>::new();
//! slots.insert(3);
//! slots.insert(1);
//! assert_eq!(slots.iter().collect::<Vec<_>>(), [1, 3]);
//!
//! let mut queue = RingBuffer::with_capacity(2);
//! assert_eq!(queue.push('a'), None);
//! assert_eq!(queue.push('b'), None);
//! // Full: the oldest entry makes room.
//! assert_eq!(queue.push('c'), Some('a'));
//! assert_eq!(queue.overwritten(), 1);
//! assert_eq!(queue.pop(), Some('b'));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod ring;
mod set;

pub use ring::{Drain, RingBuffer};
pub use set::{BitSet, BitSetIter};
