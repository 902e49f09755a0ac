// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag and window drag.

use tactile_frame::Frame;

use super::Combo;
use crate::motion::{Axis, AxisMask};
use crate::prop::push_contact_props;
use crate::{CoordMap, GestureType, MotionFilter, Priority, Registry};

const MASK: AxisMask = AxisMask::POSITION;

/// Single-finger drags report the per-frame delta; multi-finger drags report
/// the displacement since the gesture committed.
fn set_props(s: &mut Combo, m: &MotionFilter, map: &CoordMap, frame: &Frame) {
    let (x, y) = (m.axis(Axis::X), m.axis(Axis::Y));
    let (dx, dy) = if m.is_single() {
        (x.raw_delta(), y.raw_delta())
    } else {
        (x.action_delta(), y.action_delta())
    };
    s.props.clear();
    s.props.extend([
        map.scale_x() * dx,
        map.scale_y() * dy,
        map.scale_x() * x.velocity(),
        map.scale_y() * y.velocity(),
        map.x(x.value()),
        map.y(y.value()),
    ]);
    push_contact_props(&mut s.props, map, frame);
}

/// Reports once movement passed the gate and, past the first frame, only on
/// axes that committed.
fn report(s: &mut Combo, m: &MotionFilter, registry: &mut Registry, frame: &Frame, gate: AxisMask) {
    if !m.tickle().intersects(gate) {
        return;
    }
    if !m.is_single() && !m.active().intersects(MASK) {
        return;
    }
    let map = *registry.map();
    set_props(s, m, &map, frame);
    s.emit(registry, m);
}

/// Drag with as many fingers as are down.
pub(super) fn direct(s: &mut Combo, m: &MotionFilter, registry: &mut Registry, frame: &Frame) {
    let gate = if s.active { m.active() & MASK } else { MASK };
    if !m.is_multi() && !m.is_single() && s.active {
        s.end(registry, m);
    }
    if m.timeout().contains(MASK) {
        s.discard(registry);
        return;
    }
    if !s.active {
        let Some(ty) = GestureType::drag(m.touches()) else {
            return;
        };
        s.begin(registry, ty, Priority::Gesture, frame);
    }
    report(s, m, registry, frame, gate);
}

/// Three- and four-finger drag, surviving finger count changes within range.
pub(super) fn window(s: &mut Combo, m: &MotionFilter, registry: &mut Registry, frame: &Frame) {
    let gate = if s.active { m.active() & MASK } else { MASK };
    if !m.is_multi() && !m.is_single() && s.active && s.out_of_bounds(m.touches()) {
        s.end(registry, m);
    }
    if m.timeout().contains(MASK) {
        s.discard(registry);
        return;
    }
    if !s.active {
        match m.touches() {
            4 => s.begin_window(registry, GestureType::MetaDrag, Priority::Meta, (1, 4), frame),
            3 => s.begin_window(
                registry,
                GestureType::EnvDrag,
                Priority::Environment,
                (1, 3),
                frame,
            ),
            _ => return,
        }
    }
    report(s, m, registry, frame, gate);
}
