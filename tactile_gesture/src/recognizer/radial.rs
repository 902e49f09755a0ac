// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pinch and rotate, direct and windowed.
//!
//! Both follow the same state machine over a single axis of the motion
//! filter, so they share one implementation parameterized by [`Family`].

use tactile_frame::Frame;

use super::Combo;
use crate::motion::{Axis, AxisMask};
use crate::prop::push_contact_props;
use crate::{CoordMap, GestureType, MotionFilter, Priority, Registry};

pub(super) struct Family {
    mask: AxisMask,
    axis: Axis,
    direct: fn(usize) -> Option<GestureType>,
    env: GestureType,
    meta: GestureType,
    /// Whether values are lengths, scaled into output units.
    scaled: bool,
}

pub(super) const PINCH: Family = Family {
    mask: AxisMask::RADIUS,
    axis: Axis::Radius,
    direct: GestureType::pinch,
    env: GestureType::EnvPinch,
    meta: GestureType::MetaPinch,
    scaled: true,
};

pub(super) const ROTATE: Family = Family {
    mask: AxisMask::ANGLE,
    axis: Axis::Angle,
    direct: GestureType::rotate,
    env: GestureType::EnvRotate,
    meta: GestureType::MetaRotate,
    scaled: false,
};

fn set_props(f: &Family, s: &mut Combo, m: &MotionFilter, map: &CoordMap, frame: &Frame) {
    let k = if f.scaled { map.scale_r() } else { 1.0 };
    let a = m.axis(f.axis);
    s.props.clear();
    s.props
        .extend([k * a.action_delta(), k * a.velocity(), k * a.value()]);
    push_contact_props(&mut s.props, map, frame);
}

fn report(f: &Family, s: &mut Combo, m: &MotionFilter, registry: &mut Registry, frame: &Frame) {
    if !m.active().intersects(f.mask) {
        return;
    }
    let map = *registry.map();
    set_props(f, s, m, &map, frame);
    s.emit(registry, m);
}

/// Two or more fingers moving together on the family's axis.
pub(super) fn direct(
    f: &Family,
    s: &mut Combo,
    m: &MotionFilter,
    registry: &mut Registry,
    frame: &Frame,
) {
    let gate = if s.active { m.active() & f.mask } else { f.mask };
    if !m.is_multi() && !m.is_single() {
        if s.active {
            s.end(registry, m);
        }
        return;
    }
    if m.timeout().contains(f.mask) {
        s.discard(registry);
        return;
    }
    if !m.tickle().intersects(gate) {
        return;
    }
    if !s.active {
        let Some(ty) = (f.direct)(m.touches()) else {
            return;
        };
        s.begin(registry, ty, Priority::Gesture, frame);
    }
    report(f, s, m, registry, frame);
}

/// Three- and four-finger variant that survives dropping to two fingers.
pub(super) fn window(
    f: &Family,
    s: &mut Combo,
    m: &MotionFilter,
    registry: &mut Registry,
    frame: &Frame,
) {
    let gate = if s.active { m.active() & f.mask } else { f.mask };
    if !m.is_multi() {
        if s.active && s.out_of_bounds(m.touches()) {
            s.end(registry, m);
        }
        return;
    }
    if m.timeout().contains(f.mask) {
        s.discard(registry);
        return;
    }
    if !m.tickle().intersects(gate) {
        return;
    }
    if !s.active {
        match m.touches() {
            4 => s.begin_window(registry, f.meta, Priority::Meta, (2, 4), frame),
            3 => s.begin_window(registry, f.env, Priority::Environment, (2, 3), frame),
            _ => return,
        }
    }
    report(f, s, m, registry, frame);
}
