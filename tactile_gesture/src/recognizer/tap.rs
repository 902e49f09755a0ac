// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Taps.
//!
//! A tap opens as soon as fingers land and is named after the largest number
//! of fingers seen together. It fires once the count falls back to where it
//! started, provided the fingers stayed put and lifted within the bar time
//! of the x axis.

use kurbo::Point;
use tactile_frame::{Frame, FrameRef};

use crate::motion::{Axis, AxisMask};
use crate::prop::{Props, push_contact_props, tap};
use crate::{GestureId, GestureType, MotionFilter, Priority, Registry};

const MASK: AxisMask = AxisMask::POSITION.union(AxisMask::RADIUS);

#[derive(Clone, Debug, Default)]
pub(super) struct Tapping {
    start: u64,
    min_touch: usize,
    max_touch: usize,
    pub(super) active: bool,
    id: Option<GestureId>,
    /// Centroid at the last update, in frame coordinates.
    pos: Point,
    props: Props,
}

impl Tapping {
    pub(super) fn update(&mut self, m: &MotionFilter, registry: &mut Registry, frame: FrameRef<'_>) {
        if frame.is_touch_start() {
            self.min_touch = 0;
            self.max_touch = 0;
        }
        let touches = m.touches();
        if touches > self.max_touch {
            self.discard(registry);
            self.start = m.time();
            self.max_touch = touches;
            self.set_props(m, registry, &frame);
            if let Some(ty) = GestureType::tap(touches) {
                self.id = registry.begin(ty, Priority::Tap, &frame);
                self.active = true;
            }
            return;
        }
        if !self.active {
            self.rest(touches);
            return;
        }
        let elapsed = m.time().saturating_sub(self.start);
        let limit = m.axis(Axis::X).bar_ms();
        if touches <= self.min_touch {
            if elapsed > limit {
                self.discard(registry);
            } else {
                self.props[tap::DT] = elapsed as f64;
                if let Some(id) = self.id {
                    registry.event(id, self.pos, self.max_touch, &self.props, true);
                }
                self.active = false;
            }
            self.rest(touches);
            return;
        }
        if touches == 0 {
            return;
        }
        self.set_props(m, registry, &frame);
        if m.active().intersects(MASK) || elapsed > limit {
            self.discard(registry);
            self.rest(touches);
        }
    }

    fn rest(&mut self, touches: usize) {
        self.min_touch = touches;
        self.max_touch = touches;
    }

    fn discard(&mut self, registry: &mut Registry) {
        if !self.active {
            return;
        }
        if let Some(id) = self.id {
            registry.discard(id);
        }
        self.active = false;
    }

    fn set_props(&mut self, m: &MotionFilter, registry: &Registry, frame: &Frame) {
        let map = registry.map();
        self.pos = m.position();
        self.props.clear();
        self.props.extend([
            m.time().saturating_sub(self.start) as f64,
            map.x(self.pos.x),
            map.y(self.pos.y),
        ]);
        push_contact_props(&mut self.props, map, frame);
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use crate::prop::tap;
    use crate::recognizer::testing::Rig;
    use crate::{GestureEvent, GestureType, Status};

    fn taps(events: &[GestureEvent]) -> Vec<&GestureEvent> {
        events
            .iter()
            .filter(|e| e.gesture_type.family() == crate::Family::Tap)
            .collect()
    }

    #[test]
    fn quick_release_taps_once() {
        let mut rig = Rig::new();
        assert!(rig.step(0, &[(100.0, 200.0)]).is_empty());
        let events = rig.step(100, &[]);
        let taps = taps(&events);
        assert_eq!(taps.len(), 1);
        let ev = taps[0];
        assert_eq!(ev.gesture_type, GestureType::Tap1);
        assert_eq!(ev.status, Status::Update);
        assert_eq!(ev.touches, 1);
        assert_eq!(ev.pos.x, 100.0);
        assert_eq!(ev.pos.y, 200.0);
        assert_eq!(ev.props[tap::DT], 100.0);
        assert_eq!(ev.props[tap::X], 100.0);
        assert_eq!(rig.registry.len(), 0);
    }

    #[test]
    fn slow_release_is_not_a_tap() {
        let mut rig = Rig::new();
        rig.step(0, &[(100.0, 200.0)]);
        assert!(taps(&rig.step(400, &[])).is_empty());
    }

    #[test]
    fn release_at_the_time_limit_still_taps() {
        let mut rig = Rig::new();
        let limit = rig.motion.axis(crate::Axis::X).bar_ms();
        assert_eq!(limit, 300);
        rig.step(0, &[(100.0, 200.0)]);
        let events = rig.step(limit, &[]);
        let taps = taps(&events);
        assert_eq!(taps.len(), 1);
        assert_eq!(taps[0].gesture_type, GestureType::Tap1);
        assert_eq!(taps[0].props[tap::DT], 300.0);
    }

    #[test]
    fn release_past_the_time_limit_is_not_a_tap() {
        let mut rig = Rig::new();
        let limit = rig.motion.axis(crate::Axis::X).bar_ms();
        rig.step(0, &[(100.0, 200.0)]);
        assert!(taps(&rig.step(limit + 1, &[])).is_empty());
        assert_eq!(rig.registry.len(), 0);
    }

    #[test]
    fn moving_finger_cancels_the_tap() {
        let mut rig = Rig::new();
        rig.step(0, &[(100.0, 200.0)]);
        rig.step(100, &[(150.0, 200.0)]);
        assert!(!rig.recognizer.tap.active);
        assert!(taps(&rig.step(120, &[])).is_empty());
    }

    #[test]
    fn late_finger_upgrades_the_tap() {
        let mut rig = Rig::new();
        rig.step(0, &[(100.0, 200.0)]);
        rig.step(30, &[(100.0, 200.0), (300.0, 200.0)]);
        let events = rig.step(100, &[]);
        let taps = taps(&events);
        assert_eq!(taps.len(), 1);
        assert_eq!(taps[0].gesture_type, GestureType::Tap2);
        assert_eq!(taps[0].touches, 2);
        assert_eq!(taps[0].props[tap::DT], 70.0);
    }
}
