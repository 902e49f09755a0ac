// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tactile Frame: multi-touch frame reconstruction.
//!
//! A touch digitizer reports per-slot attribute changes (position, shape,
//! pressure, tracking id) followed by an end-of-report marker. This crate
//! buffers those writes and, at each marker, turns them into a committed
//! [`Frame`]: a time-stamped snapshot of every slot with coordinates mapped
//! into the surface's output range and a smoothed per-contact velocity.
//!
//! - [`Surface`]: static calibration, built by hand or probed from
//!   [`DeviceCaps`] with [`Surface::from_caps`].
//! - [`FrameEngine`]: owns a fixed ring of frames plus one write buffer.
//!   [`FrameEngine::pump`] consumes decoded [`InputEvent`]s;
//!   [`FrameEngine::sync`] commits.
//! - [`FrameRef`] / [`ContactRef`]: borrowed views into the ring with O(1)
//!   access to the previous frame or the previous state of a slot.
//!
//! ## Commit rules
//!
//! A sync that changes nothing commits nothing. A sync that only moves or
//! reshapes existing contacts commits at most once per hold interval
//! (`1000 / frame_rate` ms). Any touch appearing, disappearing or changing
//! identity commits immediately and bumps [`Frame::slot_revision`]; a change
//! in the number of contacts also bumps [`Frame::revision`].
//!
//! Semi-MT surfaces report a bounding pair and a finger count; the engine
//! places the extra fingers at the midpoint of the pair.
//!
//! ## Example
//!
//! ```rust
//! use kurbo::Rect;
//! use tactile_frame::{ContactAxis, FrameConfig, FrameEngine, InputEvent, Surface};
//!
//! let surface = Surface::new(Rect::new(0.0, 0.0, 4096.0, 4096.0));
//! let mut engine = FrameEngine::new(FrameConfig::default(), surface).unwrap();
//!
//! for ev in [
//!     InputEvent::Slot(0),
//!     InputEvent::TrackingId(12),
//!     InputEvent::Axis(ContactAxis::PositionX, 1000),
//!     InputEvent::Axis(ContactAxis::PositionY, 2000),
//! ] {
//!     engine.pump(&ev);
//! }
//! let frame = engine.pump(&InputEvent::Report { time_ms: 40 }).unwrap();
//! let touch = frame.active().next().unwrap();
//! assert_eq!(touch.id, 12);
//! assert!(touch.is_begin());
//! ```
//!
//! This crate is `no_std` and uses `alloc`. Float math in `no_std` builds
//! needs the `libm` feature.

#![no_std]

extern crate alloc;

mod contact;
mod engine;
mod frame;
mod input;
mod surface;

pub use contact::{Contact, ToolType};
pub use engine::{FrameConfig, FrameEngine, FrameError};
pub use frame::{ContactRef, Frame, FrameRef, History, MAX_SLOTS, SlotSet};
pub use input::{ContactAxis, DigitizerKey, InputEvent};
pub use surface::{
    AbsInfo, AttachError, DEFAULT_MAX_ID, DEFAULT_MIN_ID, DeviceCaps, InputProps, Surface,
    SurfaceFlags,
};
