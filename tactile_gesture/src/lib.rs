// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tactile Gesture: multi-finger gesture recognition over touch frames.
//!
//! Frames from [`tactile_frame`] are reduced to the aggregate motion of the
//! contacts, from which seven detectors recognize drags, pinches, rotations
//! and taps with one to five fingers, plus three- and four-finger "window"
//! variants that survive fingers being added or lifted. Competing gesture
//! instances are arbitrated by [`Priority`] before their events reach the
//! client.
//!
//! - [`GestureEngine`]: the entry point. Pump [`InputEvent`]s in; gesture
//!   events and passed-through raw events come out at a [`GestureClient`].
//! - [`MotionFilter`]: hysteresis filtering of centroid, radius and angle,
//!   with per-axis commit rules.
//! - [`Registry`]: the bounded pool of live instances and the arbitration
//!   between them.
//! - [`prop`]: the property layout of each gesture family.
//!
//! Raw events are held back while a touch sequence is undecided. If the
//! sequence turns into a gesture, the client receives the raw stream minus
//! touch data followed by the gesture events; otherwise it receives the raw
//! stream unchanged.
//!
//! ## Example
//!
//! ```rust
//! use kurbo::{Point, Rect};
//! use tactile_frame::{ContactAxis, InputEvent, SlotSet, Surface};
//! use tactile_gesture::{
//!     ClientId, ClientInfo, EngineConfig, GestureClient, GestureEngine, GestureEvent,
//!     GestureMask, GestureType, prop,
//! };
//!
//! #[derive(Default)]
//! struct Taps(Vec<GestureEvent>);
//!
//! impl GestureClient for Taps {
//!     fn get_clients(&self, _: &[Point], _: GestureMask, _: SlotSet, out: &mut Vec<ClientInfo>) {
//!         out.push(ClientInfo {
//!             id: ClientId::default(),
//!             mask: GestureMask::from(GestureType::Tap1),
//!         });
//!     }
//!     fn gesture(&mut self, event: &GestureEvent) {
//!         self.0.push(event.clone());
//!     }
//!     fn raw_event(&mut self, _: &InputEvent) {}
//! }
//!
//! let surface = Surface::new(Rect::new(0.0, 0.0, 1000.0, 1000.0));
//! let mut engine = GestureEngine::new(surface, &EngineConfig::default(), Taps::default()).unwrap();
//!
//! for ev in [
//!     InputEvent::Slot(0),
//!     InputEvent::TrackingId(1),
//!     InputEvent::Axis(ContactAxis::PositionX, 300),
//!     InputEvent::Axis(ContactAxis::PositionY, 400),
//!     InputEvent::Report { time_ms: 1000 },
//!     InputEvent::TrackingId(-1),
//!     InputEvent::Report { time_ms: 1080 },
//! ] {
//!     engine.pump(&ev);
//! }
//!
//! let taps = &engine.client().0;
//! assert_eq!(taps.len(), 1);
//! assert_eq!(taps[0].gesture_type, GestureType::Tap1);
//! assert_eq!(taps[0].props[prop::tap::DT], 80.0);
//! ```
//!
//! This crate is `no_std` and uses `alloc`. Float math in `no_std` builds
//! needs the `libm` feature.
//!
//! [`InputEvent`]: tactile_frame::InputEvent

#![no_std]

extern crate alloc;

mod client;
mod coord;
mod engine;
mod event;
mod motion;
pub mod prop;
mod recognizer;
mod registry;
mod types;

pub use client::GestureClient;
pub use coord::CoordMap;
pub use engine::{EngineConfig, EngineError, GestureEngine, TouchPoint};
pub use event::GestureEvent;
pub use motion::{Axis, AxisFilter, AxisMask, MotionConfig, MotionFilter};
pub use registry::{POOL_SIZE, Registry};
pub use types::{ClientId, ClientInfo, Family, GestureId, GestureMask, GestureType, Priority, Status};
