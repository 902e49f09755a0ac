// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The frame engine: buffered slot writes in, committed frames out.

use alloc::collections::TryReserveError;
use alloc::vec::Vec;
use core::f64::consts::FRAC_PI_2;
use core::fmt;

use kurbo::{Point, Size, Vec2};
use tracing::{debug, trace};

use crate::frame::{Frame, FrameRef, MAX_SLOTS};
use crate::{Contact, Surface, SurfaceFlags};

/// Weight of the newest sample in the velocity estimate.
const VELOCITY_BLEND: f64 = 1.0 / 3.0;

/// Sizing and pacing of a [`FrameEngine`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameConfig {
    /// Number of frames kept in the history ring.
    pub history: usize,
    /// Number of contact slots. At most [`MAX_SLOTS`].
    pub slots: usize,
    /// Highest rate, in frames per second, at which modify-only changes commit.
    pub frame_rate: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            history: 100,
            slots: 32,
            frame_rate: 100,
        }
    }
}

impl FrameConfig {
    /// Minimum interval between modify-only commits, in milliseconds.
    #[must_use]
    pub fn hold_ms(&self) -> u64 {
        1000 / u64::from(self.frame_rate.max(1))
    }

    fn validate(&self) -> Result<(), FrameError> {
        if self.history < 2 {
            return Err(FrameError::InvalidConfig("history must hold at least two frames"));
        }
        if self.slots == 0 || self.slots > MAX_SLOTS {
            return Err(FrameError::InvalidConfig("slot count must be within 1..=64"));
        }
        if self.frame_rate == 0 {
            return Err(FrameError::InvalidConfig("frame rate must be positive"));
        }
        Ok(())
    }
}

/// Errors reported by the frame engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameError {
    /// The configuration cannot be honored.
    InvalidConfig(&'static str),
    /// Backing storage could not be allocated.
    Alloc(TryReserveError),
    /// A slot index outside the configured slot count.
    InvalidSlot(i32),
    /// A tracking id was not found and every slot is occupied.
    NoFreeSlot(i32),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(reason) => write!(f, "invalid frame configuration: {reason}"),
            Self::Alloc(err) => write!(f, "frame storage allocation failed: {err}"),
            Self::InvalidSlot(slot) => write!(f, "slot {slot} is out of range"),
            Self::NoFreeSlot(id) => write!(f, "no free slot for tracking id {id}"),
        }
    }
}

impl core::error::Error for FrameError {}

impl From<TryReserveError> for FrameError {
    fn from(err: TryReserveError) -> Self {
        Self::Alloc(err)
    }
}

/// Converts per-slot writes into a ring of committed [`Frame`]s.
///
/// Writes go to a single buffered "next" frame through
/// [`current_slot_mut`](Self::current_slot_mut), addressed with
/// [`set_current_slot`](Self::set_current_slot) or
/// [`set_current_id`](Self::set_current_id). [`sync`](Self::sync) transforms
/// the buffer into the next ring entry and commits it if anything changed.
///
/// ```
/// use kurbo::{Point, Rect};
/// use tactile_frame::{FrameConfig, FrameEngine, Surface};
///
/// let surface = Surface::new(Rect::new(0.0, 0.0, 1000.0, 1000.0));
/// let mut engine = FrameEngine::new(FrameConfig::default(), surface).unwrap();
///
/// engine.set_current_id(7).unwrap();
/// engine.current_slot_mut().pos = Point::new(10.0, 20.0);
/// let frame = engine.sync(100).unwrap();
/// assert_eq!(frame.num_active(), 1);
///
/// // Nothing changed: no frame.
/// assert!(engine.sync(200).is_none());
/// ```
#[derive(Debug)]
pub struct FrameEngine {
    surface: Surface,
    hold_ms: u64,
    frames: Vec<Frame>,
    next: Frame,
    /// Candidate for the next ring entry; swapped in on commit.
    staged: Frame,
    cursor: usize,
    slot: usize,
    semi_mt_active: usize,
}

impl FrameEngine {
    /// Creates an engine for `surface`.
    ///
    /// Fails if the configuration is out of range or storage cannot be
    /// allocated.
    pub fn new(config: FrameConfig, surface: Surface) -> Result<Self, FrameError> {
        config.validate()?;
        let mut frames = Vec::new();
        frames.try_reserve_exact(config.history)?;
        for _ in 0..config.history {
            frames.push(Frame::try_new(config.slots)?);
        }
        let next = Frame::try_new(config.slots)?;
        let staged = Frame::try_new(config.slots)?;
        debug!(
            history = config.history,
            slots = config.slots,
            hold_ms = config.hold_ms(),
            "frame engine created"
        );
        Ok(Self {
            surface,
            hold_ms: config.hold_ms(),
            frames,
            next,
            staged,
            cursor: 0,
            slot: 0,
            semi_mt_active: 0,
        })
    }

    /// The surface calibration.
    #[must_use]
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Updates the physical size of the surface, in millimetres.
    pub fn set_physical_size(&mut self, size: Size) {
        self.surface.physical = size;
    }

    /// Number of contact slots.
    #[must_use]
    pub fn num_slots(&self) -> usize {
        self.next.slots.len()
    }

    /// Minimum interval between modify-only commits, in milliseconds.
    #[must_use]
    pub fn hold_ms(&self) -> u64 {
        self.hold_ms
    }

    /// Index of the slot writes currently go to.
    #[must_use]
    pub fn current_slot(&self) -> usize {
        self.slot
    }

    /// Buffered state of the current slot.
    pub fn current_slot_mut(&mut self) -> &mut Contact {
        &mut self.next.slots[self.slot]
    }

    /// Buffered state of `slot`, in native units.
    #[must_use]
    pub fn buffered(&self, slot: usize) -> Option<&Contact> {
        self.next.slots.get(slot)
    }

    /// Directs subsequent writes to `slot`.
    ///
    /// An out-of-range slot is rejected and the current slot is unchanged.
    pub fn set_current_slot(&mut self, slot: i32) -> Result<usize, FrameError> {
        match usize::try_from(slot) {
            Ok(s) if s < self.num_slots() => {
                self.slot = s;
                Ok(s)
            }
            _ => Err(FrameError::InvalidSlot(slot)),
        }
    }

    /// Directs subsequent writes to the slot holding tracking id `id`.
    ///
    /// If no active slot carries `id`, the first inactive slot is claimed for it.
    pub fn set_current_id(&mut self, id: i32) -> Result<usize, FrameError> {
        if let Some(slot) = self.next.slots.iter().position(|c| c.active && c.id == id) {
            self.slot = slot;
            return Ok(slot);
        }
        let Some(slot) = self.next.slots.iter().position(|c| !c.active) else {
            return Err(FrameError::NoFreeSlot(id));
        };
        let contact = &mut self.next.slots[slot];
        contact.active = true;
        contact.id = id;
        self.slot = slot;
        Ok(slot)
    }

    /// Sets the touch count reported by a semi-MT surface.
    pub fn set_semi_mt_count(&mut self, count: usize) {
        self.semi_mt_active = count.min(self.num_slots());
    }

    /// Touch count last reported by a semi-MT surface.
    #[must_use]
    pub fn semi_mt_count(&self) -> usize {
        self.semi_mt_active
    }

    /// The most recently committed frame, if any.
    #[must_use]
    pub fn current(&self) -> Option<FrameRef<'_>> {
        let n = self.frames.len();
        let last = FrameRef::new(&self.frames, (self.cursor + n - 1) % n);
        last.is_committed().then_some(last)
    }

    /// Commits the buffered writes as of `time` (milliseconds).
    ///
    /// Returns `None` when nothing changed, or when only values changed and
    /// less than [`hold_ms`](Self::hold_ms) has passed since the last commit.
    /// A suppressed sync leaves the committed history untouched.
    pub fn sync(&mut self, time: u64) -> Option<FrameRef<'_>> {
        let n = self.frames.len();
        let cursor = self.cursor;
        let prev_index = (cursor + n - 1) % n;

        if self.surface.has(SurfaceFlags::SEMI_MT) {
            self.synthesize_semi_mt();
        }

        let (prev_time, prev_active) = {
            let prev = &self.frames[prev_index];
            (prev.time, prev.num_active())
        };
        let dt = time.saturating_sub(prev_time) as f64;

        let mut addrem = false;
        let mut modified = false;
        {
            let prev = &self.frames[prev_index];
            let frame = &mut self.staged;
            frame.committed = false;
            frame.time = time;
            frame.active.clear();
            for (slot, buffered) in self.next.slots.iter_mut().enumerate() {
                let before = &prev.slots[slot];
                let contact = &mut frame.slots[slot];
                commit_contact(&self.surface, contact, buffered, before, dt);
                if contact.active {
                    frame.active.push(slot);
                }
                addrem |= before.identity_differs(contact);
                modified |= before.values_differ(contact);
            }
        }

        if !addrem && !modified {
            return None;
        }
        if !addrem && time < prev_time + self.hold_ms {
            return None;
        }

        let next = &mut self.next;
        let frame = &mut self.staged;
        if frame.num_active() != prev_active {
            next.mod_time = time;
            next.revision += 1;
        }
        if addrem {
            next.slot_mod_time = time;
            next.slot_revision += 1;
        }
        frame.revision = next.revision;
        frame.slot_revision = next.slot_revision;
        frame.mod_time = next.mod_time;
        frame.slot_mod_time = next.slot_mod_time;
        frame.sequence_id = next.sequence_id;
        frame.committed = true;
        next.sequence_id += 1;
        // The evicted oldest entry becomes the next candidate.
        core::mem::swap(&mut self.frames[cursor], &mut self.staged);
        self.cursor = (cursor + 1) % n;
        let frame = &self.frames[cursor];

        trace!(
            sequence = frame.sequence_id,
            time,
            active = frame.num_active(),
            revision = frame.revision,
            slot_revision = frame.slot_revision,
            "frame committed"
        );
        Some(FrameRef::new(&self.frames, cursor))
    }

    /// Expands a semi-MT report into individual contacts.
    ///
    /// Touches beyond the first two sit at the midpoint of the reported pair,
    /// with ids taken from the opposite half of the id range.
    fn synthesize_semi_mt(&mut self) {
        let count = self.semi_mt_active;
        let s = &self.surface;
        let span = i64::from(s.max_id) - i64::from(s.min_id);
        if self.next.slots.len() >= 2 {
            let (a, b) = (&self.next.slots[0], &self.next.slots[1]);
            let mut id = i64::from(a.id) + span / 2;
            let mid = a.pos.midpoint(b.pos);
            for c in self.next.slots.iter_mut().take(count).skip(2) {
                c.reset();
                c.active = true;
                if id > i64::from(s.max_id) {
                    id -= span + 1;
                }
                c.id = i32::try_from(id).unwrap_or(s.max_id);
                c.pos = mid;
                id += 1;
            }
        }
        for c in self.next.slots.iter_mut().skip(count) {
            c.active = false;
        }
    }
}

/// Copies one buffered slot into a frame entry, applying the surface transform
/// and updating velocity against the slot's previous committed state.
fn commit_contact(s: &Surface, dst: &mut Contact, src: &mut Contact, prev: &Contact, dt: f64) {
    let (fx, fy) = s.scale();
    let f = s.length_scale();
    let use_touch_minor = s.has(SurfaceFlags::TOUCH_MINOR) && src.touch_minor > 0.0;
    let use_width_minor = s.has(SurfaceFlags::WIDTH_MINOR) && src.width_minor > 0.0;

    dst.active = src.active;
    dst.id = src.id;
    dst.tool_type = src.tool_type;
    dst.pos = Point::new(
        fx * (src.pos.x - s.native.x0) + s.mapped.x0,
        fy * (src.pos.y - s.native.y0) + s.mapped.y0,
    );
    dst.touch_major = f * src.touch_major;
    dst.touch_minor = f * if use_touch_minor {
        src.touch_minor
    } else {
        src.touch_major
    };
    dst.width_major = f * src.width_major;
    dst.width_minor = f * if use_width_minor {
        src.width_minor
    } else {
        src.width_major
    };
    dst.orientation = src.orientation * FRAC_PI_2 / s.max_orientation;
    dst.pressure = src.pressure * s.mapped_max_pressure / s.max_pressure;
    dst.distance = f * src.distance;

    if dst.continues(prev) {
        // Predict silent contacts; a fresh position write zeroes the buffered velocity.
        dst.pos += src.velocity * dt;
        if dt > 0.0 {
            let observed = (dst.pos - prev.pos) / dt;
            dst.velocity = prev.velocity * (1.0 - VELOCITY_BLEND) + observed * VELOCITY_BLEND;
        } else {
            dst.velocity = prev.velocity;
        }
    } else {
        dst.velocity = Vec2::ZERO;
    }
    src.velocity = dst.velocity;
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use kurbo::Rect;

    fn engine(config: FrameConfig) -> FrameEngine {
        let surface = Surface::new(Rect::new(0.0, 0.0, 1000.0, 1000.0));
        FrameEngine::new(config, surface).unwrap()
    }

    fn touch(engine: &mut FrameEngine, id: i32, x: f64, y: f64) {
        engine.set_current_id(id).unwrap();
        let c = engine.current_slot_mut();
        c.pos = Point::new(x, y);
        c.velocity = Vec2::ZERO;
    }

    #[test]
    fn rejects_bad_config() {
        let surface = Surface::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        for config in [
            FrameConfig { history: 1, ..FrameConfig::default() },
            FrameConfig { slots: 0, ..FrameConfig::default() },
            FrameConfig { slots: 65, ..FrameConfig::default() },
            FrameConfig { frame_rate: 0, ..FrameConfig::default() },
        ] {
            assert!(matches!(
                FrameEngine::new(config, surface.clone()),
                Err(FrameError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn slot_addressing_failures_do_not_mutate() {
        let mut e = engine(FrameConfig { slots: 2, ..FrameConfig::default() });
        assert_eq!(e.set_current_slot(1), Ok(1));
        assert_eq!(e.set_current_slot(2), Err(FrameError::InvalidSlot(2)));
        assert_eq!(e.set_current_slot(-1), Err(FrameError::InvalidSlot(-1)));
        assert_eq!(e.current_slot(), 1);

        assert_eq!(e.set_current_id(10), Ok(0));
        assert_eq!(e.set_current_id(11), Ok(1));
        assert_eq!(e.set_current_id(10), Ok(0));
        assert_eq!(e.set_current_id(12), Err(FrameError::NoFreeSlot(12)));
        assert_eq!(e.current_slot(), 0);
    }

    #[test]
    fn stable_input_is_idempotent() {
        let mut e = engine(FrameConfig::default());
        touch(&mut e, 1, 100.0, 100.0);
        assert!(e.sync(10).is_some());
        assert!(e.sync(20).is_none());
        assert!(e.sync(500).is_none());
        assert_eq!(e.current().unwrap().sequence_id, 0);
    }

    #[test]
    fn modify_only_commits_are_rate_limited() {
        let mut e = engine(FrameConfig::default());
        assert_eq!(e.hold_ms(), 10);
        touch(&mut e, 1, 100.0, 100.0);
        assert!(e.sync(0).is_some());

        touch(&mut e, 1, 101.0, 100.0);
        assert!(e.sync(5).is_none(), "within hold interval");
        touch(&mut e, 1, 102.0, 100.0);
        let f = e.sync(10).unwrap();
        assert_eq!(f.sequence_id, 1);
        assert!(f.time - f.prev().time >= 10);

        // Add/remove bypasses the rate limit.
        touch(&mut e, 2, 300.0, 300.0);
        assert!(e.sync(11).is_some());
    }

    #[test]
    fn revisions_track_count_and_identity() {
        let mut e = engine(FrameConfig::default());
        touch(&mut e, 1, 100.0, 100.0);
        let f = e.sync(0).unwrap();
        assert_eq!((f.revision, f.slot_revision), (1, 1));

        // Same count, different identity.
        e.set_current_slot(0).unwrap();
        e.current_slot_mut().id = 5;
        let f = e.sync(20).unwrap();
        assert_eq!((f.revision, f.slot_revision), (1, 2));
        assert_eq!(f.slot_mod_time, 20);
        assert_eq!(f.mod_time, 0);

        e.current_slot_mut().active = false;
        let f = e.sync(40).unwrap();
        assert_eq!((f.revision, f.slot_revision), (2, 3));
        assert_eq!(f.num_active(), 0);
    }

    #[test]
    fn velocity_blends_and_extrapolates() {
        let mut e = engine(FrameConfig::default());
        touch(&mut e, 1, 0.0, 0.0);
        e.sync(0).unwrap();
        touch(&mut e, 1, 30.0, 0.0);
        let f = e.sync(10).unwrap();
        let v = f.contact(0).unwrap().velocity;
        assert!((v.x - 1.0).abs() < 1e-9, "one third of 3 units/ms, got {v:?}");

        // No new position: the contact is carried forward by its velocity.
        let f = e.sync(20).unwrap();
        let c = f.contact(0).unwrap();
        assert!((c.pos.x - 40.0).abs() < 1e-9);
        assert_eq!(c.prev().pos.x, 30.0);
    }

    #[test]
    fn transform_maps_into_output_range() {
        let surface = Surface::new(Rect::new(0.0, 0.0, 100.0, 200.0))
            .with_flags(SurfaceFlags::DIRECT | SurfaceFlags::TOUCH_MAJOR)
            .with_mapped(Rect::new(10.0, 10.0, 210.0, 210.0));
        let mut e = FrameEngine::new(FrameConfig::default(), surface).unwrap();
        e.set_current_id(1).unwrap();
        let c = e.current_slot_mut();
        c.pos = Point::new(50.0, 100.0);
        c.touch_major = 4.0;
        c.touch_minor = 2.0;
        c.orientation = 1.0;
        c.pressure = 128.0;
        let f = e.sync(0).unwrap();
        let c = f.contact(0).unwrap();
        assert_eq!(c.pos, Point::new(110.0, 110.0));
        assert_eq!(c.touch_major, 8.0);
        // No distinct minor axis on this surface.
        assert_eq!(c.touch_minor, 8.0);
        assert!((c.orientation - FRAC_PI_2).abs() < 1e-12);
        assert_eq!(c.pressure, 128.0);
    }

    #[test]
    fn contact_history_is_a_closed_ring() {
        let config = FrameConfig {
            history: 4,
            ..FrameConfig::default()
        };
        let mut e = engine(config);
        for i in 0..10_u32 {
            touch(&mut e, 1, f64::from(i) * 50.0, 0.0);
            assert!(e.sync(u64::from(i) * 20).is_some());
        }
        let newest = e.current().unwrap();
        let start = newest.contact(0).unwrap();
        let mut c = start;
        for _ in 0..config.history {
            c = c.prev();
            assert!(c.active);
        }
        assert_eq!(c.frame().index(), start.frame().index());
        assert_eq!(newest.history().count(), 4);
        let seqs: Vec<_> = newest.history().map(|f| f.sequence_id).collect();
        assert_eq!(seqs, [9, 8, 7, 6]);
    }

    #[test]
    fn lengths_follow_the_larger_axis_scale() {
        let surface = Surface::new(Rect::new(0.0, 0.0, 100.0, 200.0))
            .with_flags(SurfaceFlags::DIRECT | SurfaceFlags::WIDTH_MAJOR)
            .with_mapped(Rect::new(0.0, 0.0, 100.0, 800.0));
        let scale = surface.length_scale();
        assert_eq!(scale, 4.0);
        let mut e = FrameEngine::new(FrameConfig::default(), surface).unwrap();
        e.set_current_id(1).unwrap();
        let c = e.current_slot_mut();
        c.width_major = 3.0;
        c.distance = 0.5;
        let f = e.sync(0).unwrap();
        let c = f.contact(0).unwrap();
        assert_eq!(c.width_major, 3.0 * scale);
        assert_eq!(c.width_minor, 3.0 * scale);
        assert_eq!(c.distance, 0.5 * scale);
    }

    #[test]
    fn suppressed_sync_keeps_full_history() {
        let config = FrameConfig {
            history: 4,
            ..FrameConfig::default()
        };
        let mut e = engine(config);
        for i in 0..4_u32 {
            touch(&mut e, 1, f64::from(i) * 50.0, 0.0);
            assert!(e.sync(u64::from(i) * 20).is_some());
        }
        touch(&mut e, 1, 151.0, 0.0);
        assert!(e.sync(65).is_none(), "within hold interval");
        let seqs: Vec<_> = e.current().unwrap().history().map(|f| f.sequence_id).collect();
        assert_eq!(seqs, [3, 2, 1, 0]);

        touch(&mut e, 1, 151.0, 0.0);
        let f = e.sync(70).unwrap();
        assert_eq!(f.contact(0).unwrap().pos.x, 151.0);
        let seqs: Vec<_> = f.history().map(|f| f.sequence_id).collect();
        assert_eq!(seqs, [4, 3, 2, 1]);
    }

    fn semi_mt_engine() -> FrameEngine {
        let surface = Surface::new(Rect::new(0.0, 0.0, 100.0, 100.0))
            .with_flags(SurfaceFlags::NEEDS_POINTER | SurfaceFlags::SEMI_MT);
        FrameEngine::new(FrameConfig::default(), surface).unwrap()
    }

    #[test]
    fn semi_mt_synthesizes_extra_touches() {
        let mut e = semi_mt_engine();
        touch(&mut e, 10, 0.0, 0.0);
        touch(&mut e, 11, 10.0, 10.0);
        e.set_semi_mt_count(3);
        let (min, max) = (e.surface().min_id, e.surface().max_id);
        let f = e.sync(0).unwrap();
        assert_eq!(f.active_slots(), &[0, 1, 2]);
        let third = f.contact(2).unwrap();
        assert_eq!(third.pos, Point::new(5.0, 5.0));
        assert!(third.id > min + (max - min) / 2);
        assert!(third.id <= max);

        e.set_semi_mt_count(2);
        let f = e.sync(20).unwrap();
        assert_eq!(f.active_slots(), &[0, 1]);
        assert!(f.contact(2).unwrap().is_end());
        assert!(!f.contact(0).unwrap().is_end());
    }

    #[test]
    fn semi_mt_ids_wrap_within_range() {
        let mut surface = Surface::new(Rect::new(0.0, 0.0, 100.0, 100.0))
            .with_flags(SurfaceFlags::SEMI_MT);
        surface.min_id = 0;
        surface.max_id = 9;
        let mut e = FrameEngine::new(FrameConfig::default(), surface).unwrap();
        touch(&mut e, 8, 0.0, 0.0);
        touch(&mut e, 9, 0.0, 0.0);
        e.set_semi_mt_count(4);
        let f = e.sync(0).unwrap();
        let ids: Vec<_> = f.active().map(|c| c.id).collect();
        assert_eq!(ids, [8, 9, 2, 3]);
    }
}
