// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounded bit set.

use core::fmt;
use core::iter::FusedIterator;
use core::ops::{BitAnd, BitOr, Not};

/// A set of small integers drawn from `0..WORDS * 64`.
///
/// Members are stored as a flat array of `u64` words. Out-of-range indices are
/// never members: inserting one is ignored and testing one returns `false`.
///
/// Iteration yields members in ascending order, which callers rely on for
/// deterministic processing.
///
/// # Example
///
/// ```
/// use tactile_bits::BitSet;
///
/// let mut set = BitSet::<2>::new();
/// set.insert(70);
/// set.insert(2);
/// assert!(set.contains(70));
/// assert_eq!(set.len(), 2);
/// assert_eq!(set.first(), Some(2));
///
/// set.remove(2);
/// assert_eq!(set.iter().collect::<Vec<_>>(), [70]);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct BitSet<const WORDS: usize> {
    words: [u64; WORDS],
}

impl<const WORDS: usize> BitSet<WORDS> {
    /// An empty set.
    pub const EMPTY: Self = Self { words: [0; WORDS] };

    /// Number of distinct members this set can hold.
    pub const CAPACITY: usize = WORDS * 64;

    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self::EMPTY
    }

    /// Creates a set containing every index in `0..n` (clamped to the capacity).
    #[must_use]
    pub fn first_n(n: usize) -> Self {
        let mut set = Self::new();
        for i in 0..n.min(Self::CAPACITY) {
            set.insert(i);
        }
        set
    }

    /// Returns the number of distinct members this set can hold.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        Self::CAPACITY
    }

    /// Inserts `index`. Returns `true` if it was not already present.
    pub fn insert(&mut self, index: usize) -> bool {
        if index >= Self::CAPACITY {
            return false;
        }
        let (word, bit) = (index / 64, 1_u64 << (index % 64));
        let fresh = self.words[word] & bit == 0;
        self.words[word] |= bit;
        fresh
    }

    /// Removes `index`. Returns `true` if it was present.
    pub fn remove(&mut self, index: usize) -> bool {
        if index >= Self::CAPACITY {
            return false;
        }
        let (word, bit) = (index / 64, 1_u64 << (index % 64));
        let present = self.words[word] & bit != 0;
        self.words[word] &= !bit;
        present
    }

    /// Inserts or removes `index` depending on `on`.
    pub fn set_to(&mut self, index: usize, on: bool) {
        if on {
            self.insert(index);
        } else {
            self.remove(index);
        }
    }

    /// Returns `true` if `index` is a member.
    #[must_use]
    pub const fn contains(&self, index: usize) -> bool {
        if index >= Self::CAPACITY {
            return false;
        }
        self.words[index / 64] & (1_u64 << (index % 64)) != 0
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns `true` if there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Returns the smallest member, if any.
    #[must_use]
    pub fn first(&self) -> Option<usize> {
        self.iter().next()
    }

    /// Returns the smallest index in `0..limit` that is *not* a member.
    #[must_use]
    pub fn first_vacant(&self, limit: usize) -> Option<usize> {
        (0..limit.min(Self::CAPACITY)).find(|&i| !self.contains(i))
    }

    /// Removes every member.
    pub fn clear(&mut self) {
        self.words = [0; WORDS];
    }

    /// Adds every member of `other` to `self`.
    pub fn union_with(&mut self, other: &Self) {
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            *a |= *b;
        }
    }

    /// Removes every member of `other` from `self`.
    pub fn difference_with(&mut self, other: &Self) {
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            *a &= !*b;
        }
    }

    /// Returns `true` if `self` and `other` share at least one member.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.words
            .iter()
            .zip(other.words.iter())
            .any(|(a, b)| a & b != 0)
    }

    /// Returns an iterator over the members in ascending order.
    #[must_use]
    pub fn iter(&self) -> BitSetIter<WORDS> {
        BitSetIter {
            words: self.words,
            word: 0,
        }
    }
}

impl<const WORDS: usize> Default for BitSet<WORDS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const WORDS: usize> fmt::Debug for BitSet<WORDS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<const WORDS: usize> BitOr for BitSet<WORDS> {
    type Output = Self;

    fn bitor(mut self, rhs: Self) -> Self::Output {
        self.union_with(&rhs);
        self
    }
}

impl<const WORDS: usize> BitAnd for BitSet<WORDS> {
    type Output = Self;

    fn bitand(mut self, rhs: Self) -> Self::Output {
        for (a, b) in self.words.iter_mut().zip(rhs.words.iter()) {
            *a &= *b;
        }
        self
    }
}

impl<const WORDS: usize> Not for BitSet<WORDS> {
    type Output = Self;

    fn not(mut self) -> Self::Output {
        for w in &mut self.words {
            *w = !*w;
        }
        self
    }
}

impl<const WORDS: usize> FromIterator<usize> for BitSet<WORDS> {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = Self::new();
        for i in iter {
            set.insert(i);
        }
        set
    }
}

impl<const WORDS: usize> Extend<usize> for BitSet<WORDS> {
    fn extend<I: IntoIterator<Item = usize>>(&mut self, iter: I) {
        for i in iter {
            self.insert(i);
        }
    }
}

impl<'a, const WORDS: usize> IntoIterator for &'a BitSet<WORDS> {
    type Item = usize;
    type IntoIter = BitSetIter<WORDS>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Ascending iterator over the members of a [`BitSet`].
#[derive(Clone, Debug)]
pub struct BitSetIter<const WORDS: usize> {
    words: [u64; WORDS],
    word: usize,
}

impl<const WORDS: usize> Iterator for BitSetIter<WORDS> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        while self.word < WORDS {
            let bits = self.words[self.word];
            if bits != 0 {
                let bit = bits.trailing_zeros() as usize;
                // Clear the lowest set bit.
                self.words[self.word] = bits & (bits - 1);
                return Some(self.word * 64 + bit);
            }
            self.word += 1;
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.words[self.word.min(WORDS)..]
            .iter()
            .map(|w| w.count_ones() as usize)
            .sum();
        (len, Some(len))
    }
}

impl<const WORDS: usize> ExactSizeIterator for BitSetIter<WORDS> {}

impl<const WORDS: usize> FusedIterator for BitSetIter<WORDS> {}
