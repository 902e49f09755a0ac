// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use tactile_frame::Frame;

use crate::prop::Props;
use crate::{GestureId, GestureType, MotionFilter, Priority, Registry};

/// State shared by the drag, pinch and rotate detectors.
///
/// `id` is `None` while active when the registry had no room; the detector
/// then runs its state machine without reporting anything.
#[derive(Clone, Debug, Default)]
pub(super) struct Combo {
    pub(super) active: bool,
    id: Option<GestureId>,
    min_touch: usize,
    max_touch: usize,
    pub(super) props: Props,
}

impl Combo {
    pub(super) fn begin(
        &mut self,
        registry: &mut Registry,
        gesture_type: GestureType,
        priority: Priority,
        frame: &Frame,
    ) {
        self.id = registry.begin(gesture_type, priority, frame);
        self.active = true;
    }

    /// Begins a window gesture that stays alive for `min..=max` touches.
    pub(super) fn begin_window(
        &mut self,
        registry: &mut Registry,
        gesture_type: GestureType,
        priority: Priority,
        touches: (usize, usize),
        frame: &Frame,
    ) {
        (self.min_touch, self.max_touch) = touches;
        self.begin(registry, gesture_type, priority, frame);
    }

    pub(super) fn id(&self) -> Option<GestureId> {
        self.id
    }

    pub(super) fn out_of_bounds(&self, touches: usize) -> bool {
        touches < self.min_touch || touches > self.max_touch
    }

    /// Reports the current props.
    pub(super) fn emit(&self, registry: &mut Registry, motion: &MotionFilter) {
        if let Some(id) = self.id {
            registry.event(id, motion.position(), motion.touches(), &self.props, false);
        }
    }

    /// Ends an active gesture with the last reported props.
    pub(super) fn end(&mut self, registry: &mut Registry, motion: &MotionFilter) {
        if let Some(id) = self.id {
            registry.end(id, motion.position(), motion.touches(), &self.props);
        }
        self.active = false;
    }

    /// Drops an active gesture without a trace.
    pub(super) fn discard(&mut self, registry: &mut Registry) {
        if !self.active {
            return;
        }
        if let Some(id) = self.id {
            registry.discard(id);
        }
        self.active = false;
    }
}
