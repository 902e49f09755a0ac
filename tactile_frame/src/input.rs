// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Decoded input events and their effect on the frame engine.

use tracing::debug;

use crate::frame::FrameRef;
use crate::{FrameEngine, SurfaceFlags, ToolType};

/// A per-contact attribute carried by an [`InputEvent::Axis`] write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContactAxis {
    /// Horizontal position.
    PositionX,
    /// Vertical position.
    PositionY,
    /// Touch ellipse major axis.
    TouchMajor,
    /// Touch ellipse minor axis.
    TouchMinor,
    /// Approach ellipse major axis.
    WidthMajor,
    /// Approach ellipse minor axis.
    WidthMinor,
    /// Ellipse orientation.
    Orientation,
    /// Contact pressure.
    Pressure,
    /// Hover distance.
    Distance,
    /// Tool type code.
    ToolType,
}

/// Digitizer keys: touch state and tool-count indicators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DigitizerKey {
    /// Something touches the surface.
    Touch,
    /// One finger present.
    ToolFinger,
    /// Two fingers present.
    ToolDoubleTap,
    /// Three fingers present.
    ToolTripleTap,
    /// Four fingers present.
    ToolQuadTap,
    /// Any other digitizer key (pen, stylus buttons, ...).
    Other(u16),
}

impl DigitizerKey {
    /// Finger count announced by a tool key.
    #[must_use]
    pub const fn finger_count(self) -> Option<usize> {
        match self {
            Self::ToolFinger => Some(1),
            Self::ToolDoubleTap => Some(2),
            Self::ToolTripleTap => Some(3),
            Self::ToolQuadTap => Some(4),
            Self::Touch | Self::Other(_) => None,
        }
    }
}

/// One raw input event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputEvent {
    /// Selects the slot subsequent writes apply to.
    Slot(i32),
    /// Sets the tracking id of the current slot; `-1` ends the touch.
    TrackingId(i32),
    /// Writes one attribute of the current slot.
    Axis(ContactAxis, i32),
    /// A non multi-touch absolute axis (single-touch emulation and the like).
    Abs {
        /// Axis code.
        code: u16,
        /// Value.
        value: i32,
    },
    /// A digitizer key changed state.
    Digitizer(DigitizerKey, bool),
    /// Any other key or button.
    Button {
        /// Key code.
        code: u16,
        /// Pressed or released.
        pressed: bool,
    },
    /// Separator between contacts in anonymous-contact reports.
    ContactSeparator,
    /// End of a report, stamped in milliseconds.
    Report {
        /// Report time.
        time_ms: u64,
    },
    /// Anything else, passed through untouched.
    Other {
        /// Event type.
        kind: u16,
        /// Event code.
        code: u16,
        /// Event value.
        value: i32,
    },
}

impl InputEvent {
    /// Returns `true` for absolute-axis events, multi-touch or not.
    #[must_use]
    pub const fn is_absolute(&self) -> bool {
        matches!(
            self,
            Self::Slot(_) | Self::TrackingId(_) | Self::Axis(..) | Self::Abs { .. }
        )
    }

    /// Returns `true` for synchronization markers.
    #[must_use]
    pub const fn is_sync(&self) -> bool {
        matches!(self, Self::Report { .. } | Self::ContactSeparator)
    }

    /// Returns `true` for events the frame engine interprets.
    #[must_use]
    pub const fn is_frame_input(&self) -> bool {
        self.is_absolute() || self.is_sync() || matches!(self, Self::Digitizer(..))
    }
}

impl FrameEngine {
    /// Applies one input event. Returns the committed frame when the event is
    /// an end-of-report marker and the sync produced one.
    ///
    /// Addressing failures (bad slot, no free slot) are logged and the write
    /// is dropped.
    pub fn pump(&mut self, event: &InputEvent) -> Option<FrameRef<'_>> {
        match *event {
            InputEvent::Report { time_ms } => return self.sync(time_ms),
            InputEvent::Slot(slot) => {
                if let Err(err) = self.set_current_slot(slot) {
                    debug!(%err, "slot switch ignored");
                }
            }
            InputEvent::TrackingId(id) => {
                let contact = self.current_slot_mut();
                if id == -1 {
                    contact.active = false;
                } else {
                    contact.id = id;
                    contact.active = true;
                }
            }
            InputEvent::Axis(axis, value) => self.write_axis(axis, value),
            InputEvent::Digitizer(key, pressed) => self.digitizer_key(key, pressed),
            InputEvent::Abs { .. }
            | InputEvent::Button { .. }
            | InputEvent::ContactSeparator
            | InputEvent::Other { .. } => {}
        }
        None
    }

    fn write_axis(&mut self, axis: ContactAxis, value: i32) {
        let c = self.current_slot_mut();
        let v = f64::from(value);
        match axis {
            ContactAxis::PositionX => {
                c.pos.x = v;
                c.velocity.x = 0.0;
            }
            ContactAxis::PositionY => {
                c.pos.y = v;
                c.velocity.y = 0.0;
            }
            ContactAxis::TouchMajor => c.touch_major = v,
            ContactAxis::TouchMinor => c.touch_minor = v,
            ContactAxis::WidthMajor => c.width_major = v,
            ContactAxis::WidthMinor => c.width_minor = v,
            ContactAxis::Orientation => c.orientation = v,
            ContactAxis::Pressure => c.pressure = v,
            ContactAxis::Distance => c.distance = v,
            ContactAxis::ToolType => c.tool_type = ToolType::from_raw(value),
        }
    }

    /// Digitizer keys only matter on semi-MT surfaces, where they carry the
    /// touch count.
    fn digitizer_key(&mut self, key: DigitizerKey, pressed: bool) {
        if !self.surface().has(SurfaceFlags::SEMI_MT) {
            return;
        }
        if key == DigitizerKey::Touch && !pressed {
            self.set_semi_mt_count(0);
            return;
        }
        if !pressed {
            return;
        }
        if let Some(n) = key.finger_count() {
            self.set_semi_mt_count(n);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FrameConfig, Surface};
    use kurbo::{Point, Rect};

    fn engine(flags: SurfaceFlags) -> FrameEngine {
        let surface = Surface::new(Rect::new(0.0, 0.0, 1000.0, 1000.0)).with_flags(flags);
        FrameEngine::new(FrameConfig::default(), surface).unwrap()
    }

    #[test]
    fn decodes_a_two_finger_report() {
        let mut e = engine(SurfaceFlags::DIRECT);
        let events = [
            InputEvent::Slot(0),
            InputEvent::TrackingId(40),
            InputEvent::Axis(ContactAxis::PositionX, 100),
            InputEvent::Axis(ContactAxis::PositionY, 200),
            InputEvent::Axis(ContactAxis::Pressure, 50),
            InputEvent::Slot(3),
            InputEvent::TrackingId(41),
            InputEvent::Axis(ContactAxis::PositionX, 300),
            InputEvent::Axis(ContactAxis::PositionY, 400),
            InputEvent::Axis(ContactAxis::ToolType, 1),
        ];
        for ev in &events {
            assert!(e.pump(ev).is_none());
        }
        let f = e.pump(&InputEvent::Report { time_ms: 16 }).unwrap();
        assert_eq!(f.active_slots(), &[0, 3]);
        let c = f.contact(3).unwrap();
        assert_eq!(c.id, 41);
        assert_eq!(c.pos, Point::new(300.0, 400.0));
        assert_eq!(c.tool_type, ToolType::Pen);
        assert_eq!(f.contact(0).unwrap().pressure, 50.0);
    }

    #[test]
    fn tracking_id_minus_one_ends_touch() {
        let mut e = engine(SurfaceFlags::DIRECT);
        e.pump(&InputEvent::TrackingId(5));
        e.pump(&InputEvent::Report { time_ms: 0 }).unwrap();
        e.pump(&InputEvent::TrackingId(-1));
        let f = e.pump(&InputEvent::Report { time_ms: 8 }).unwrap();
        assert_eq!(f.num_active(), 0);
        assert!(f.contact(0).unwrap().is_end());
    }

    #[test]
    fn bad_slot_keeps_previous_target() {
        let mut e = engine(SurfaceFlags::DIRECT);
        e.pump(&InputEvent::Slot(2));
        e.pump(&InputEvent::Slot(99));
        assert_eq!(e.current_slot(), 2);
    }

    #[test]
    fn position_write_clears_buffered_velocity() {
        let mut e = engine(SurfaceFlags::DIRECT);
        e.current_slot_mut().velocity = kurbo::Vec2::new(3.0, 4.0);
        e.pump(&InputEvent::Axis(ContactAxis::PositionX, 1));
        let v = e.buffered(0).unwrap().velocity;
        assert_eq!((v.x, v.y), (0.0, 4.0));
    }

    #[test]
    fn tool_keys_set_semi_mt_count() {
        let mut e = engine(SurfaceFlags::SEMI_MT);
        e.pump(&InputEvent::Digitizer(DigitizerKey::ToolTripleTap, true));
        assert_eq!(e.semi_mt_count(), 3);
        e.pump(&InputEvent::Digitizer(DigitizerKey::ToolTripleTap, false));
        assert_eq!(e.semi_mt_count(), 3);
        e.pump(&InputEvent::Digitizer(DigitizerKey::Touch, false));
        assert_eq!(e.semi_mt_count(), 0);

        let mut plain = engine(SurfaceFlags::DIRECT);
        plain.pump(&InputEvent::Digitizer(DigitizerKey::ToolDoubleTap, true));
        assert_eq!(plain.semi_mt_count(), 0);
    }

    #[test]
    fn classifies_events() {
        assert!(InputEvent::Abs { code: 0, value: 1 }.is_absolute());
        assert!(!InputEvent::Abs { code: 0, value: 1 }.is_sync());
        assert!(InputEvent::ContactSeparator.is_sync());
        assert!(InputEvent::Digitizer(DigitizerKey::Touch, true).is_frame_input());
        assert!(!InputEvent::Button { code: 272, pressed: true }.is_frame_input());
    }
}
