// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gesture taxonomy, priorities and client routing identifiers.

use core::fmt;
use core::ops::{BitOr, BitOrAssign};

/// The closed set of recognizable gestures.
///
/// Discriminants are stable and double as bit positions in a [`GestureMask`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum GestureType {
    /// One-finger drag.
    Drag1 = 0,
    /// One-finger pinch. Reserved; never recognized.
    Pinch1 = 1,
    /// One-finger rotate. Reserved; never recognized.
    Rotate1 = 2,
    /// Two-finger drag.
    Drag2 = 3,
    /// Two-finger pinch.
    Pinch2 = 4,
    /// Two-finger rotate.
    Rotate2 = 5,
    /// Three-finger drag.
    Drag3 = 6,
    /// Three-finger pinch.
    Pinch3 = 7,
    /// Three-finger rotate.
    Rotate3 = 8,
    /// Four-finger drag.
    Drag4 = 9,
    /// Four-finger pinch.
    Pinch4 = 10,
    /// Four-finger rotate.
    Rotate4 = 11,
    /// Five-finger drag.
    Drag5 = 12,
    /// Five-finger pinch.
    Pinch5 = 13,
    /// Five-finger rotate.
    Rotate5 = 14,
    /// One-finger tap.
    Tap1 = 15,
    /// Two-finger tap.
    Tap2 = 16,
    /// Three-finger tap.
    Tap3 = 17,
    /// Four-finger tap.
    Tap4 = 18,
    /// Five-finger tap.
    Tap5 = 19,
    /// Three-finger environment drag.
    EnvDrag = 20,
    /// Three-finger environment pinch.
    EnvPinch = 21,
    /// Three-finger environment rotate.
    EnvRotate = 22,
    /// Four-finger meta drag.
    MetaDrag = 23,
    /// Four-finger meta pinch.
    MetaPinch = 24,
    /// Four-finger meta rotate.
    MetaRotate = 25,
    /// Not a gesture: a client subscribing to it grabs the touch sequence.
    SysFlag1 = 26,
}

/// Broad family a [`GestureType`] belongs to; selects the property layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Family {
    /// Translation.
    Drag,
    /// Scaling.
    Pinch,
    /// Rotation.
    Rotate,
    /// Short touch.
    Tap,
    /// System flags.
    System,
}

impl GestureType {
    /// Every gesture type, in discriminant order.
    pub const ALL: [Self; 27] = [
        Self::Drag1,
        Self::Pinch1,
        Self::Rotate1,
        Self::Drag2,
        Self::Pinch2,
        Self::Rotate2,
        Self::Drag3,
        Self::Pinch3,
        Self::Rotate3,
        Self::Drag4,
        Self::Pinch4,
        Self::Rotate4,
        Self::Drag5,
        Self::Pinch5,
        Self::Rotate5,
        Self::Tap1,
        Self::Tap2,
        Self::Tap3,
        Self::Tap4,
        Self::Tap5,
        Self::EnvDrag,
        Self::EnvPinch,
        Self::EnvRotate,
        Self::MetaDrag,
        Self::MetaPinch,
        Self::MetaRotate,
        Self::SysFlag1,
    ];

    /// Looks a type up by discriminant.
    #[must_use]
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    /// The discriminant.
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// `n`-finger drag, for `n` in `1..=5`.
    #[must_use]
    pub fn drag(n: usize) -> Option<Self> {
        Self::direct(n, 0)
    }

    /// `n`-finger pinch, for `n` in `2..=5`.
    #[must_use]
    pub fn pinch(n: usize) -> Option<Self> {
        if n < 2 { None } else { Self::direct(n, 1) }
    }

    /// `n`-finger rotate, for `n` in `2..=5`.
    #[must_use]
    pub fn rotate(n: usize) -> Option<Self> {
        if n < 2 { None } else { Self::direct(n, 2) }
    }

    /// `n`-finger tap, for `n` in `1..=5`.
    #[must_use]
    pub fn tap(n: usize) -> Option<Self> {
        (1..=5)
            .contains(&n)
            .then(|| Self::ALL[Self::Tap1 as usize + n - 1])
    }

    fn direct(n: usize, offset: usize) -> Option<Self> {
        (1..=5).contains(&n).then(|| Self::ALL[(n - 1) * 3 + offset])
    }

    /// The family this type belongs to.
    #[must_use]
    pub const fn family(self) -> Family {
        match self {
            Self::Drag1
            | Self::Drag2
            | Self::Drag3
            | Self::Drag4
            | Self::Drag5
            | Self::EnvDrag
            | Self::MetaDrag => Family::Drag,
            Self::Pinch1
            | Self::Pinch2
            | Self::Pinch3
            | Self::Pinch4
            | Self::Pinch5
            | Self::EnvPinch
            | Self::MetaPinch => Family::Pinch,
            Self::Rotate1
            | Self::Rotate2
            | Self::Rotate3
            | Self::Rotate4
            | Self::Rotate5
            | Self::EnvRotate
            | Self::MetaRotate => Family::Rotate,
            Self::Tap1 | Self::Tap2 | Self::Tap3 | Self::Tap4 | Self::Tap5 => Family::Tap,
            Self::SysFlag1 => Family::System,
        }
    }
}

/// A set of [`GestureType`]s, used as a client subscription.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct GestureMask(u64);

impl GestureMask {
    /// No types.
    pub const EMPTY: Self = Self(0);

    /// Every gesture type, without [`GestureType::SysFlag1`].
    pub const ALL_GESTURES: Self = Self((1_u64 << GestureType::SysFlag1 as u8) - 1);

    /// Creates an empty mask.
    #[must_use]
    pub const fn empty() -> Self {
        Self::EMPTY
    }

    /// Returns `true` if the mask holds no types.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if `ty` is in the mask.
    #[must_use]
    pub const fn contains(self, ty: GestureType) -> bool {
        self.0 & (1_u64 << ty as u8) != 0
    }

    /// Adds `ty`.
    pub fn insert(&mut self, ty: GestureType) {
        self.0 |= 1_u64 << ty as u8;
    }

    /// Returns the mask with `ty` added.
    #[must_use]
    pub const fn with(self, ty: GestureType) -> Self {
        Self(self.0 | (1_u64 << ty as u8))
    }

    /// Number of types in the mask.
    #[must_use]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Raw bits, one per discriminant.
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Iterates the types in the mask in discriminant order.
    pub fn iter(self) -> impl Iterator<Item = GestureType> {
        GestureType::ALL.into_iter().filter(move |&ty| self.contains(ty))
    }
}

impl fmt::Debug for GestureMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl BitOr for GestureMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for GestureMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl From<GestureType> for GestureMask {
    fn from(ty: GestureType) -> Self {
        Self::EMPTY.with(ty)
    }
}

impl FromIterator<GestureType> for GestureMask {
    fn from_iter<I: IntoIterator<Item = GestureType>>(iter: I) -> Self {
        let mut mask = Self::EMPTY;
        for ty in iter {
            mask.insert(ty);
        }
        mask
    }
}

/// Arbitration class of a gesture instance. Higher wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Priority {
    /// Pointer emulation.
    Pointer = 1,
    /// Direct drag, pinch and rotate.
    Gesture = 2,
    /// Three-finger window gestures.
    Environment = 3,
    /// Four-finger window gestures.
    Meta = 4,
    /// Taps.
    Tap = 5,
}

/// Lifecycle status carried by a gesture event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    /// First event of an instance.
    Begin,
    /// Continuing event.
    Update,
    /// Final event of an instance.
    End,
}

/// Rolling gesture instance identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GestureId(pub u16);

impl GestureId {
    /// Identifiers wrap to `0..=MAX`.
    pub const MAX: u16 = 0xfff;
}

impl fmt::Display for GestureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Routing identity of a gesture consumer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ClientId {
    /// Client (connection) identifier. Exclusive grabs are keyed on this.
    pub client: u32,
    /// Opaque delivery target within the client, such as a window.
    pub target: u64,
}

/// A client interested in some gesture types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClientInfo {
    /// Who to deliver to.
    pub id: ClientId,
    /// Which types to deliver.
    pub mask: GestureMask,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn discriminants_match_table_positions() {
        for (i, ty) in GestureType::ALL.iter().enumerate() {
            assert_eq!(usize::from(ty.index()), i);
            assert_eq!(GestureType::from_index(ty.index()), Some(*ty));
        }
        assert_eq!(GestureType::from_index(27), None);
    }

    #[test]
    fn finger_count_constructors() {
        assert_eq!(GestureType::drag(1), Some(GestureType::Drag1));
        assert_eq!(GestureType::drag(5), Some(GestureType::Drag5));
        assert_eq!(GestureType::drag(0), None);
        assert_eq!(GestureType::drag(6), None);
        assert_eq!(GestureType::pinch(1), None);
        assert_eq!(GestureType::pinch(3), Some(GestureType::Pinch3));
        assert_eq!(GestureType::rotate(4), Some(GestureType::Rotate4));
        assert_eq!(GestureType::tap(2), Some(GestureType::Tap2));
        assert_eq!(GestureType::tap(6), None);
        assert_eq!(GestureType::MetaRotate.family(), Family::Rotate);
        assert_eq!(GestureType::Tap5.family(), Family::Tap);
    }

    #[test]
    fn mask_membership() {
        let mask: GestureMask = [GestureType::Tap1, GestureType::Drag2].into_iter().collect();
        assert!(mask.contains(GestureType::Tap1));
        assert!(!mask.contains(GestureType::Drag1));
        assert_eq!(mask.len(), 2);
        assert_eq!(
            mask.iter().collect::<Vec<_>>(),
            [GestureType::Drag2, GestureType::Tap1]
        );
        assert!(GestureMask::ALL_GESTURES.contains(GestureType::MetaRotate));
        assert!(!GestureMask::ALL_GESTURES.contains(GestureType::SysFlag1));
        assert!((GestureMask::ALL_GESTURES | GestureType::SysFlag1.into())
            .contains(GestureType::SysFlag1));
    }

    #[test]
    fn priorities_are_ordered() {
        assert!(Priority::Tap > Priority::Meta);
        assert!(Priority::Meta > Priority::Environment);
        assert!(Priority::Environment > Priority::Gesture);
        assert!(Priority::Gesture > Priority::Pointer);
    }
}
