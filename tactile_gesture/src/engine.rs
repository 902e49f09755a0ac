// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The gesture engine: frames in, gestures or raw events out.
//!
//! Every input event is kept in a raw buffer and, when the frame engine
//! cares about it, pumped into frame reconstruction. Committed frames drive
//! motion, detection and arbitration while a touch sequence is *ongoing*.
//! At each sync point the engine decides what the client sees:
//!
//! - while no sequence is ongoing, buffered raw events are replayed as-is;
//! - once a gesture has produced events, raw events are replayed with the
//!   touch data stripped, followed by the gesture events;
//! - otherwise raw events are held back until the sequence is decided.
//!
//! A sequence becomes ongoing when the first finger lands. It stops being
//! ongoing without a gesture when all fingers lift, or when nothing is live
//! in the registry and the contact count has been stable for longer than the
//! hold time of the x axis.

use alloc::collections::TryReserveError;
use core::fmt;

use kurbo::{Point, Rect, Size};
use smallvec::SmallVec;
use tactile_bits::RingBuffer;
use tactile_frame::{
    AttachError, DeviceCaps, FrameConfig, FrameEngine, FrameError, FrameRef, InputEvent, Surface,
    ToolType,
};
use tracing::{trace, warn};

use crate::motion::Axis;
use crate::recognizer::Recognizer;
use crate::{CoordMap, GestureClient, GestureEvent, MotionConfig, MotionFilter, Registry};

/// Sizing of a [`GestureEngine`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineConfig {
    /// Frame reconstruction settings.
    pub frame: FrameConfig,
    /// Motion filter thresholds.
    pub motion: MotionConfig,
    /// Raw events held back while a sequence is undecided.
    pub raw_capacity: usize,
    /// Gesture events awaiting delivery.
    pub gesture_capacity: usize,
    /// Events queued per gesture instance while arbitration is pending.
    pub instance_queue: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            motion: MotionConfig::default(),
            raw_capacity: 4096,
            gesture_capacity: 512,
            instance_queue: 64,
        }
    }
}

/// Errors from creating a [`GestureEngine`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineError {
    /// Frame reconstruction could not be set up.
    Frame(FrameError),
    /// The device is not a supported touch surface.
    Attach(AttachError),
    /// Event buffers could not be allocated.
    Alloc(TryReserveError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Frame(err) => write!(f, "frame engine: {err}"),
            Self::Attach(err) => write!(f, "cannot attach device: {err}"),
            Self::Alloc(err) => write!(f, "event buffer allocation failed: {err}"),
        }
    }
}

impl core::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Frame(err) => Some(err),
            Self::Attach(err) => Some(err),
            Self::Alloc(err) => Some(err),
        }
    }
}

impl From<FrameError> for EngineError {
    fn from(err: FrameError) -> Self {
        Self::Frame(err)
    }
}

impl From<AttachError> for EngineError {
    fn from(err: AttachError) -> Self {
        Self::Attach(err)
    }
}

impl From<TryReserveError> for EngineError {
    fn from(err: TryReserveError) -> Self {
        Self::Alloc(err)
    }
}

/// An active contact in output coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchPoint {
    /// Tracking id.
    pub id: i32,
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
    /// Ellipse orientation in radians.
    pub orientation: f64,
    /// Pressure.
    pub pressure: f64,
}

/// Recognition state that runs once per committed frame.
#[derive(Debug)]
struct Session {
    motion: MotionFilter,
    recognizer: Recognizer,
    registry: Registry,
    outbox: RingBuffer<GestureEvent>,
    ongoing: bool,
    gesture: bool,
}

impl Session {
    fn report_frame<C>(&mut self, frame: FrameRef<'_>, client: &C)
    where
        C: GestureClient + ?Sized,
    {
        if frame.is_touch_start() {
            trace!(time = frame.time, "touch sequence started");
            self.ongoing = true;
            self.gesture = false;
        }
        if !self.ongoing {
            return;
        }
        self.registry.frame_begin(frame);
        self.motion.update(frame);
        self.recognizer
            .recognize(&self.motion, &mut self.registry, frame);
        self.registry.frame_end(&frame, client, &mut self.outbox);

        if !self.outbox.is_empty() {
            self.gesture = true;
        }
        let stable = frame.time.saturating_sub(frame.mod_time);
        let idle = self.registry.is_empty() && stable > self.motion.axis(Axis::X).hold_ms();
        if frame.num_active() == 0 || idle {
            self.ongoing &= self.gesture;
            if !self.ongoing {
                trace!(time = frame.time, "touch sequence passed through");
            }
        }
    }
}

/// Multi-touch gesture recognition for one touch surface.
///
/// Feed decoded input with [`pump`](Self::pump). Results arrive at the
/// [`GestureClient`] passed at construction.
///
/// ```
/// use kurbo::{Point, Rect};
/// use tactile_frame::{InputEvent, SlotSet, Surface};
/// use tactile_gesture::{
///     ClientInfo, EngineConfig, GestureClient, GestureEngine, GestureEvent, GestureMask,
/// };
///
/// #[derive(Default)]
/// struct Log(Vec<InputEvent>);
///
/// impl GestureClient for Log {
///     fn get_clients(&self, _: &[Point], _: GestureMask, _: SlotSet, _: &mut Vec<ClientInfo>) {}
///     fn gesture(&mut self, _: &GestureEvent) {}
///     fn raw_event(&mut self, event: &InputEvent) {
///         self.0.push(*event);
///     }
/// }
///
/// let surface = Surface::new(Rect::new(0.0, 0.0, 1000.0, 1000.0));
/// let mut engine = GestureEngine::new(surface, &EngineConfig::default(), Log::default()).unwrap();
///
/// // No touch sequence is in progress, so events pass straight through.
/// engine.pump(&InputEvent::Other { kind: 2, code: 0, value: 5 });
/// engine.pump(&InputEvent::Report { time_ms: 10 });
/// assert_eq!(engine.client().0.len(), 2);
/// ```
#[derive(Debug)]
pub struct GestureEngine<C> {
    frames: FrameEngine,
    session: Session,
    raw: RingBuffer<InputEvent>,
    filter_abs: bool,
    client: C,
}

impl<C: GestureClient> GestureEngine<C> {
    /// Creates an engine for `surface`.
    pub fn new(surface: Surface, config: &EngineConfig, client: C) -> Result<Self, EngineError> {
        let motion = MotionFilter::new(&config.motion, surface.mapped);
        let frames = FrameEngine::new(config.frame, surface)?;
        let session = Session {
            motion,
            recognizer: Recognizer::default(),
            registry: Registry::new(config.instance_queue)?,
            outbox: RingBuffer::try_with_capacity(config.gesture_capacity)?,
            ongoing: false,
            gesture: false,
        };
        Ok(Self {
            frames,
            session,
            raw: RingBuffer::try_with_capacity(config.raw_capacity)?,
            filter_abs: false,
            client,
        })
    }

    /// Creates an engine for a probed device.
    pub fn attach(caps: &DeviceCaps, config: &EngineConfig, client: C) -> Result<Self, EngineError> {
        Self::new(Surface::from_caps(caps)?, config, client)
    }

    /// Processes one input event.
    pub fn pump(&mut self, event: &InputEvent) {
        if self.raw.push(*event).is_some() {
            warn!("raw event buffer full, oldest event dropped");
        }
        if event.is_frame_input()
            && let Some(frame) = self.frames.pump(event)
        {
            self.session.report_frame(frame, &self.client);
        }
        if event.is_sync() {
            if !self.session.ongoing {
                self.flush_events();
            }
            if self.session.gesture {
                self.flush_gestures();
            }
        }
    }

    /// Replays held-back raw events untouched and drops pending gestures.
    fn flush_events(&mut self) {
        self.session.outbox.clear();
        for ev in self.raw.drain() {
            if self.filter_abs && ev.is_absolute() {
                continue;
            }
            self.client.raw_event(&ev);
        }
    }

    /// Replays raw events minus touch data, then delivers gesture events.
    fn flush_gestures(&mut self) {
        let mut count = 0_usize;
        for ev in self.raw.drain() {
            let skip = match ev {
                _ if ev.is_absolute() => true,
                InputEvent::Digitizer(..) | InputEvent::ContactSeparator => true,
                InputEvent::Report { .. } => count == 0,
                _ => false,
            };
            if skip {
                continue;
            }
            self.client.raw_event(&ev);
            if matches!(ev, InputEvent::Report { .. }) {
                count = 0;
            } else {
                count += 1;
            }
        }
        for ev in self.session.outbox.drain() {
            self.client.gesture(&ev);
        }
    }

    /// Maps gesture output onto `bbox`, in place of the surface range.
    pub fn set_output_bbox(&mut self, bbox: Rect) {
        let map = CoordMap::between(self.frames.surface().mapped, bbox);
        self.session.registry.set_map(map);
    }

    /// Overrides the probed physical size, in millimetres.
    pub fn set_physical_size(&mut self, size: Size) {
        self.frames.set_physical_size(size);
    }

    /// Strips absolute-axis events from raw pass-through.
    pub fn filter_abs_events(&mut self, enable: bool) {
        self.filter_abs = enable;
    }

    /// Native coordinate range of the surface.
    #[must_use]
    pub fn units(&self) -> Rect {
        self.frames.surface().native
    }

    /// Physical size of the surface, in millimetres.
    #[must_use]
    pub fn physical_size(&self) -> Size {
        self.frames.surface().physical
    }

    /// The active contacts of the last frame, in output coordinates.
    #[must_use]
    pub fn contacts(&self) -> SmallVec<[TouchPoint; 8]> {
        let Some(frame) = self.frames.current() else {
            return SmallVec::new();
        };
        let map = self.session.registry.map();
        let k = map.scale_r();
        frame
            .active_contacts()
            .map(|c| TouchPoint {
                id: c.id,
                tool_type: c.tool_type,
                pos: map.point(c.pos),
                touch_major: k * c.touch_major,
                touch_minor: k * c.touch_minor,
                width_major: k * c.width_major,
                width_minor: k * c.width_minor,
                orientation: c.orientation,
                pressure: c.pressure,
            })
            .collect()
    }

    /// The client.
    #[must_use]
    pub fn client(&self) -> &C {
        &self.client
    }

    /// The client, mutably.
    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    /// Consumes the engine, returning the client.
    pub fn into_client(self) -> C {
        self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::testing::Everyone;

    fn square(side: f64) -> Surface {
        Surface::new(Rect::new(0.0, 0.0, side, side))
    }

    #[test]
    fn invalid_frame_config_is_rejected() {
        let config = EngineConfig {
            frame: FrameConfig {
                history: 1,
                ..FrameConfig::default()
            },
            ..EngineConfig::default()
        };
        let err = GestureEngine::new(square(100.0), &config, Everyone).unwrap_err();
        assert!(matches!(err, EngineError::Frame(FrameError::InvalidConfig(_))));
    }

    #[test]
    fn relative_devices_do_not_attach() {
        let caps = DeviceCaps {
            relative_axes: true,
            ..DeviceCaps::default()
        };
        let err = GestureEngine::attach(&caps, &EngineConfig::default(), Everyone).unwrap_err();
        assert_eq!(err, EngineError::Attach(AttachError::RelativeAxes));
    }

    #[test]
    fn output_bbox_scales_contacts() {
        use tactile_frame::ContactAxis;

        let mut engine = GestureEngine::new(square(1000.0), &EngineConfig::default(), Everyone).unwrap();
        assert!(engine.contacts().is_empty());
        engine.set_output_bbox(Rect::new(0.0, 0.0, 500.0, 500.0));
        for ev in [
            InputEvent::Slot(0),
            InputEvent::TrackingId(3),
            InputEvent::Axis(ContactAxis::PositionX, 200),
            InputEvent::Axis(ContactAxis::PositionY, 400),
            InputEvent::Axis(ContactAxis::TouchMajor, 10),
            InputEvent::Report { time_ms: 5 },
        ] {
            engine.pump(&ev);
        }
        let contacts = engine.contacts();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].id, 3);
        assert_eq!(contacts[0].pos, Point::new(100.0, 200.0));
        assert_eq!(contacts[0].touch_major, 5.0);
        assert_eq!(engine.units(), Rect::new(0.0, 0.0, 1000.0, 1000.0));
    }
}
