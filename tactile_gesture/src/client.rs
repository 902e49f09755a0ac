// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

use kurbo::Point;
use tactile_frame::{InputEvent, SlotSet};

use crate::{ClientInfo, GestureEvent, GestureMask};

/// The consumer side of a [`GestureEngine`](crate::GestureEngine).
///
/// The engine never stores clients itself: it asks who is interested when new
/// gesture instances appear, and hands every outgoing event to this sink.
pub trait GestureClient {
    /// Lists clients interested in any of `types` at `positions`.
    ///
    /// `positions` are the output coordinates of the touches in `span`, in
    /// slot order. Called at most once per frame, only when new instances
    /// began. Matches are pushed onto `out`, which arrives empty.
    fn get_clients(
        &self,
        positions: &[Point],
        types: GestureMask,
        span: SlotSet,
        out: &mut Vec<ClientInfo>,
    );

    /// Receives one gesture event.
    fn gesture(&mut self, event: &GestureEvent);

    /// Receives one raw input event that was not consumed by a gesture.
    fn raw_event(&mut self, event: &InputEvent);
}
