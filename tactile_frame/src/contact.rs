// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-slot touch contacts.

use kurbo::{Point, Vec2};

/// The tool touching the surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ToolType {
    /// A finger.
    #[default]
    Finger,
    /// A pen or stylus.
    Pen,
    /// Any other tool code reported by the device.
    Other(i32),
}

impl ToolType {
    /// Decodes a raw tool code.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::Finger,
            1 => Self::Pen,
            other => Self::Other(other),
        }
    }

    /// Encodes this tool as a raw tool code.
    #[must_use]
    pub const fn to_raw(self) -> i32 {
        match self {
            Self::Finger => 0,
            Self::Pen => 1,
            Self::Other(raw) => raw,
        }
    }
}

/// One touch in one slot.
///
/// In the engine's write buffer the fields hold native device values as they
/// arrive. In a committed frame they hold mapped values: position, axis
/// lengths and distance in mapped units, orientation in radians and pressure
/// on the mapped pressure scale. `velocity` is in mapped units per
/// millisecond.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Contact {
    /// Slot index this contact occupies.
    pub slot: usize,
    /// Tracking id of the touch.
    pub id: i32,
    /// Whether the slot currently holds a touch.
    pub active: bool,
    /// Tool type.
    pub tool_type: ToolType,
    /// Position.
    pub pos: Point,
    /// Major axis of the touch ellipse.
    pub touch_major: f64,
    /// Minor axis of the touch ellipse.
    pub touch_minor: f64,
    /// Major axis of the approach ellipse.
    pub width_major: f64,
    /// Minor axis of the approach ellipse.
    pub width_minor: f64,
    /// Ellipse orientation.
    pub orientation: f64,
    /// Contact pressure.
    pub pressure: f64,
    /// Hover distance.
    pub distance: f64,
    /// Smoothed velocity.
    pub velocity: Vec2,
}

impl Contact {
    /// Creates an inactive contact for `slot`.
    #[must_use]
    pub fn new(slot: usize) -> Self {
        Self {
            slot,
            ..Self::default()
        }
    }

    /// Clears the contact back to an inactive, zeroed state, keeping its slot.
    pub fn reset(&mut self) {
        *self = Self::new(self.slot);
    }

    /// Returns `true` if `self` and `other` differ in identity: tracking id,
    /// tool or presence.
    #[must_use]
    pub fn identity_differs(&self, other: &Self) -> bool {
        self.id != other.id || self.tool_type != other.tool_type || self.active != other.active
    }

    /// Returns `true` if any transformed value differs between `self` and `other`.
    #[must_use]
    pub fn values_differ(&self, other: &Self) -> bool {
        self.pos != other.pos
            || self.touch_major != other.touch_major
            || self.touch_minor != other.touch_minor
            || self.width_major != other.width_major
            || self.width_minor != other.width_minor
            || self.orientation != other.orientation
            || self.pressure != other.pressure
            || self.distance != other.distance
    }

    /// Returns `true` if `self` continues the touch recorded in `prev`.
    #[must_use]
    pub fn continues(&self, prev: &Self) -> bool {
        self.active && prev.active && self.id == prev.id
    }
}
