// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::Point;

use crate::prop::Props;
use crate::{ClientId, GestureId, GestureType, Status};

/// A gesture event as delivered to a client.
#[derive(Clone, Debug, PartialEq)]
pub struct GestureEvent {
    /// Gesture type.
    pub gesture_type: GestureType,
    /// Instance the event belongs to.
    pub id: GestureId,
    /// Receiving client.
    pub client: ClientId,
    /// Lifecycle status.
    pub status: Status,
    /// Number of touches involved.
    pub touches: usize,
    /// Centroid in output coordinates.
    pub pos: Point,
    /// Frame time in milliseconds.
    pub time: u64,
    /// Properties, laid out per [`prop`](crate::prop).
    pub props: Props,
}

/// An event waiting in an instance queue, before arbitration.
///
/// `pos` is still in frame coordinates.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct QueuedEvent {
    pub(crate) status: Status,
    pub(crate) touches: usize,
    pub(crate) pos: Point,
    pub(crate) time: u64,
    pub(crate) props: Props,
}
