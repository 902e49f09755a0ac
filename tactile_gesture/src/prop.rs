// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gesture property vectors.
//!
//! Every event carries a flat vector of `f64` properties whose layout depends
//! on the gesture family. Each family starts with its own motion values,
//! followed by the bounding box of the active contacts and then up to
//! [`MAX_TOUCHES`] `(id, x, y)` triples, one per active contact in slot order.
//! All positions are in output coordinates.
//!
//! ```rust
//! use tactile_gesture::prop;
//!
//! assert_eq!(prop::drag::X1, 6);
//! assert_eq!(prop::pinch::touch(1), 10);
//! ```

use kurbo::Point;
use smallvec::SmallVec;
use tactile_frame::Frame;

use crate::CoordMap;

/// Largest number of properties an event can carry.
pub const MAX_PROPS: usize = 32;

/// Largest number of touches listed in a property vector.
pub const MAX_TOUCHES: usize = 5;

/// A property vector.
pub type Props = SmallVec<[f64; MAX_PROPS]>;

/// Drag layout.
pub mod drag {
    /// Horizontal displacement this event.
    pub const DX: usize = 0;
    /// Vertical displacement this event.
    pub const DY: usize = 1;
    /// Horizontal velocity.
    pub const VX: usize = 2;
    /// Vertical velocity.
    pub const VY: usize = 3;
    /// Horizontal centroid.
    pub const X: usize = 4;
    /// Vertical centroid.
    pub const Y: usize = 5;
    /// Left edge of the contact bounding box.
    pub const X1: usize = 6;
    /// Top edge of the contact bounding box.
    pub const Y1: usize = 7;
    /// Right edge of the contact bounding box.
    pub const X2: usize = 8;
    /// Bottom edge of the contact bounding box.
    pub const Y2: usize = 9;
    /// Index of the first touch triple.
    pub const TOUCHES: usize = 10;

    /// Index of the id of touch `n`; its x and y follow.
    #[must_use]
    pub const fn touch(n: usize) -> usize {
        TOUCHES + 3 * n
    }
}

/// Pinch layout.
pub mod pinch {
    /// Radius change since the gesture committed.
    pub const DR: usize = 0;
    /// Radius velocity.
    pub const VR: usize = 1;
    /// Current radius.
    pub const R: usize = 2;
    /// Left edge of the contact bounding box.
    pub const X1: usize = 3;
    /// Top edge of the contact bounding box.
    pub const Y1: usize = 4;
    /// Right edge of the contact bounding box.
    pub const X2: usize = 5;
    /// Bottom edge of the contact bounding box.
    pub const Y2: usize = 6;
    /// Index of the first touch triple.
    pub const TOUCHES: usize = 7;

    /// Index of the id of touch `n`; its x and y follow.
    #[must_use]
    pub const fn touch(n: usize) -> usize {
        TOUCHES + 3 * n
    }
}

/// Rotate layout. Angles are in radians.
pub mod rotate {
    /// Angle change since the gesture committed.
    pub const DA: usize = 0;
    /// Angular velocity.
    pub const VA: usize = 1;
    /// Current angle.
    pub const A: usize = 2;
    /// Left edge of the contact bounding box.
    pub const X1: usize = 3;
    /// Top edge of the contact bounding box.
    pub const Y1: usize = 4;
    /// Right edge of the contact bounding box.
    pub const X2: usize = 5;
    /// Bottom edge of the contact bounding box.
    pub const Y2: usize = 6;
    /// Index of the first touch triple.
    pub const TOUCHES: usize = 7;

    /// Index of the id of touch `n`; its x and y follow.
    #[must_use]
    pub const fn touch(n: usize) -> usize {
        TOUCHES + 3 * n
    }
}

/// Tap layout.
pub mod tap {
    /// Tap duration in milliseconds.
    pub const DT: usize = 0;
    /// Horizontal centroid.
    pub const X: usize = 1;
    /// Vertical centroid.
    pub const Y: usize = 2;
    /// Left edge of the contact bounding box.
    pub const X1: usize = 3;
    /// Top edge of the contact bounding box.
    pub const Y1: usize = 4;
    /// Right edge of the contact bounding box.
    pub const X2: usize = 5;
    /// Bottom edge of the contact bounding box.
    pub const Y2: usize = 6;
    /// Index of the first touch triple.
    pub const TOUCHES: usize = 7;

    /// Index of the id of touch `n`; its x and y follow.
    #[must_use]
    pub const fn touch(n: usize) -> usize {
        TOUCHES + 3 * n
    }
}

/// Appends the bounding box and touch triples of `frame`'s active contacts.
///
/// Appends nothing when no contact is active.
pub(crate) fn push_contact_props(props: &mut Props, map: &CoordMap, frame: &Frame) {
    let mut contacts = frame.active_contacts();
    let Some(first) = contacts.next() else {
        return;
    };
    let (mut min, mut max) = (first.pos, first.pos);
    for c in contacts {
        min = Point::new(min.x.min(c.pos.x), min.y.min(c.pos.y));
        max = Point::new(max.x.max(c.pos.x), max.y.max(c.pos.y));
    }
    let (min, max) = (map.point(min), map.point(max));
    props.extend([min.x, min.y, max.x, max.y]);
    for c in frame.active_contacts().take(MAX_TOUCHES) {
        let p = map.point(c.pos);
        props.extend([f64::from(c.id), p.x, p.y]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;
    use tactile_frame::{ContactAxis, FrameConfig, FrameEngine, InputEvent, Surface};

    fn frame_with(points: &[(i32, f64, f64)]) -> FrameEngine {
        let surface = Surface::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        let mut engine = FrameEngine::new(FrameConfig::default(), surface).unwrap();
        for (slot, &(id, x, y)) in points.iter().enumerate() {
            engine.pump(&InputEvent::Slot(slot as i32));
            engine.pump(&InputEvent::TrackingId(id));
            engine.pump(&InputEvent::Axis(ContactAxis::PositionX, x as i32));
            engine.pump(&InputEvent::Axis(ContactAxis::PositionY, y as i32));
        }
        engine.sync(0);
        engine
    }

    #[test]
    fn layouts_share_the_contact_tail() {
        assert_eq!(drag::TOUCHES, 10);
        assert_eq!(pinch::X1, 3);
        assert_eq!(rotate::A, 2);
        assert_eq!(tap::touch(0), tap::TOUCHES);
        assert_eq!(drag::touch(MAX_TOUCHES), MAX_PROPS - 7);
    }

    #[test]
    fn contact_props_list_bbox_and_touches() {
        let engine = frame_with(&[(7, 10.0, 40.0), (8, 30.0, 20.0)]);
        let frame = engine.current().unwrap();
        let map = CoordMap::between(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            Rect::new(0.0, 0.0, 200.0, 200.0),
        );
        let mut props = Props::new();
        push_contact_props(&mut props, &map, &frame);
        assert_eq!(
            props.as_slice(),
            &[20.0, 40.0, 60.0, 80.0, 7.0, 20.0, 80.0, 8.0, 60.0, 40.0]
        );
    }

    #[test]
    fn contact_props_cap_touch_list() {
        let points: alloc::vec::Vec<_> = (0..7).map(|i| (i, f64::from(i), 0.0)).collect();
        let engine = frame_with(&points);
        let mut props = Props::new();
        push_contact_props(&mut props, &CoordMap::IDENTITY, &engine.current().unwrap());
        assert_eq!(props.len(), 4 + 3 * MAX_TOUCHES);
        assert_eq!(props[2], 6.0);
    }

    #[test]
    fn no_contacts_no_props() {
        let mut engine = frame_with(&[(1, 5.0, 5.0)]);
        engine.pump(&InputEvent::TrackingId(-1));
        let frame = engine.sync(50).unwrap();
        let mut props = Props::new();
        push_contact_props(&mut props, &CoordMap::IDENTITY, &frame);
        assert!(props.is_empty());
    }
}
