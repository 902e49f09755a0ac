// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The motion filter.
//!
//! Each committed frame is reduced to four aggregate axes: the centroid of
//! the active contacts (x, y), their RMS distance from the centroid (radius)
//! and an integrated rotation angle. Each axis runs through a hysteresis
//! filter and tracks two deltas:
//!
//! - the *raw* delta, against the previous frame;
//! - the *action* delta, against the value at the last reset. It stays zero
//!   until the axis commits, either by moving past the amplitude bar after
//!   the hold time, or by outliving the bar time (a *timeout*).
//!
//! Axes reset whenever the number of active contacts changes.

use core::f64::consts::TAU;

use bitflags::bitflags;
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Point, Rect};
use tactile_frame::FrameRef;

/// One aggregate axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Horizontal centroid.
    X = 0,
    /// Vertical centroid.
    Y = 1,
    /// RMS distance of the contacts from the centroid.
    Radius = 2,
    /// Integrated rotation angle, in radians.
    Angle = 3,
}

impl Axis {
    /// All axes in index order.
    pub const ALL: [Self; 4] = [Self::X, Self::Y, Self::Radius, Self::Angle];

    /// The single-axis mask for this axis.
    #[must_use]
    pub const fn mask(self) -> AxisMask {
        AxisMask::from_bits_retain(1 << self as u8)
    }
}

bitflags! {
    /// A set of [`Axis`] values.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct AxisMask: u8 {
        /// Horizontal centroid.
        const X = 1 << 0;
        /// Vertical centroid.
        const Y = 1 << 1;
        /// Radius.
        const RADIUS = 1 << 2;
        /// Angle.
        const ANGLE = 1 << 3;
        /// Both centroid axes.
        const POSITION = Self::X.bits() | Self::Y.bits();
    }
}

/// Thresholds and timings of the motion filter, per axis in [`Axis`] order.
///
/// Distances are derived from the surface: the fuzz band of an axis is its
/// extent divided by `signal_to_noise`, the amplitude bar its extent divided
/// by `bar_divisor`. The extent of the radius axis is the surface diagonal
/// and that of the angle axis a full turn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionConfig {
    /// Extent over fuzz band.
    pub signal_to_noise: [f64; 4],
    /// Extent over amplitude bar.
    pub bar_divisor: [f64; 4],
    /// Time after which an axis may commit on amplitude, in milliseconds.
    pub hold_ms: [u64; 4],
    /// Time after which an axis commits regardless, in milliseconds.
    ///
    /// The x entry also bounds the duration of a tap.
    pub bar_ms: [u64; 4],
    /// Minimum interval between velocity samples, in milliseconds.
    pub sample_ms: u64,
    /// Smallest raw delta that counts as movement.
    pub epsilon: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            signal_to_noise: [1000.0; 4],
            bar_divisor: [50.0; 4],
            hold_ms: [60; 4],
            bar_ms: [300, 300, 500, 500],
            sample_ms: 10,
            epsilon: 1e-3,
        }
    }
}

impl MotionConfig {
    /// Short hold and bar times for touch screens that report sparsely.
    #[must_use]
    pub fn responsive() -> Self {
        Self {
            hold_ms: [10; 4],
            bar_ms: [170, 170, 240, 240],
            sample_ms: 0,
            ..Self::default()
        }
    }
}

/// Filter state of one axis.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AxisFilter {
    raw_delta: f64,
    action_delta: f64,
    velocity: f64,
    value: f64,
    original: f64,
    sample: f64,
    fuzz: f64,
    bar: f64,
    original_ms: u64,
    sample_ms: u64,
    hold_ms: u64,
    bar_ms: u64,
}

impl AxisFilter {
    /// Change since the previous frame.
    #[must_use]
    pub fn raw_delta(&self) -> f64 {
        self.raw_delta
    }

    /// Change since the last reset; zero until the axis commits.
    #[must_use]
    pub fn action_delta(&self) -> f64 {
        self.action_delta
    }

    /// Velocity per millisecond over the last sample interval.
    #[must_use]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Filtered value.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Half-width of the dead band.
    #[must_use]
    pub fn fuzz(&self) -> f64 {
        self.fuzz
    }

    /// Amplitude needed to commit.
    #[must_use]
    pub fn bar(&self) -> f64 {
        self.bar
    }

    /// Hold time in milliseconds.
    #[must_use]
    pub fn hold_ms(&self) -> u64 {
        self.hold_ms
    }

    /// Bar time in milliseconds.
    #[must_use]
    pub fn bar_ms(&self) -> u64 {
        self.bar_ms
    }

    /// Hysteresis: small moves are ignored, medium ones damped.
    fn filter(&self, val: f64) -> f64 {
        let d = (val - self.value).abs();
        if d < self.fuzz / 2.0 {
            self.value
        } else if d < self.fuzz {
            (self.value * 3.0 + val) / 4.0
        } else if d < self.fuzz * 2.0 {
            (self.value + val) / 2.0
        } else {
            val
        }
    }
}

/// Aggregate motion of the active contact set.
#[derive(Clone, Debug, PartialEq)]
pub struct MotionFilter {
    axes: [AxisFilter; 4],
    tickle: AxisMask,
    active: AxisMask,
    timeout: AxisMask,
    single: bool,
    multi: bool,
    touches: usize,
    time: u64,
    sample_ms: u64,
    epsilon: f64,
}

impl MotionFilter {
    /// Creates a filter for frames whose coordinates span `range`.
    #[must_use]
    pub fn new(config: &MotionConfig, range: Rect) -> Self {
        let (w, h) = (range.width().abs(), range.height().abs());
        let extent = [w, h, (w * w + h * h).sqrt(), TAU];
        let mut axes = [AxisFilter::default(); 4];
        for (i, fm) in axes.iter_mut().enumerate() {
            fm.fuzz = extent[i] / config.signal_to_noise[i];
            fm.bar = extent[i] / config.bar_divisor[i];
            fm.hold_ms = config.hold_ms[i];
            fm.bar_ms = config.bar_ms[i];
        }
        Self {
            axes,
            tickle: AxisMask::empty(),
            active: AxisMask::empty(),
            timeout: AxisMask::empty(),
            single: false,
            multi: false,
            touches: 0,
            time: 0,
            sample_ms: config.sample_ms,
            epsilon: config.epsilon,
        }
    }

    /// Folds a newly committed frame into the filter.
    pub fn update(&mut self, frame: FrameRef<'_>) {
        let t = frame.time;
        let centroid = centroid(&frame);
        if frame.prev().revision != frame.revision {
            let r = radius(centroid, &frame);
            self.reset(Axis::X, centroid.x, t);
            self.reset(Axis::Y, centroid.y, t);
            self.reset(Axis::Radius, r, t);
            self.reset(Axis::Angle, 0.0, t);
            self.single = false;
            self.multi = false;
        } else if frame.num_active() < 2 {
            self.advance(Axis::X, centroid.x, t);
            self.advance(Axis::Y, centroid.y, t);
            self.reset(Axis::Radius, 0.0, t);
            self.reset(Axis::Angle, 0.0, t);
            self.single = true;
            self.multi = false;
        } else {
            let c = Point::new(
                self.axes[Axis::X as usize].filter(centroid.x),
                self.axes[Axis::Y as usize].filter(centroid.y),
            );
            let r = self.axes[Axis::Radius as usize].filter(radius(c, &frame));
            let angle = &self.axes[Axis::Angle as usize];
            let a = angle.filter(angle.value + rotation(c, r, &frame));
            self.advance(Axis::X, c.x, t);
            self.advance(Axis::Y, c.y, t);
            self.advance(Axis::Radius, r, t);
            self.advance(Axis::Angle, a, t);
            self.single = false;
            self.multi = true;
        }
        self.touches = frame.num_active();
        self.time = t;
    }

    fn reset(&mut self, axis: Axis, value: f64, t: u64) {
        let fm = &mut self.axes[axis as usize];
        fm.raw_delta = 0.0;
        fm.action_delta = 0.0;
        fm.velocity = 0.0;
        fm.value = value;
        fm.original = value;
        fm.original_ms = t;
        fm.sample = value;
        fm.sample_ms = t;
        self.tickle.remove(axis.mask());
        self.active.remove(axis.mask());
        self.timeout.remove(axis.mask());
    }

    fn advance(&mut self, axis: Axis, value: f64, t: u64) {
        let bit = axis.mask();
        let fm = &mut self.axes[axis as usize];
        let dt = t.saturating_sub(fm.sample_ms);
        fm.raw_delta = value - fm.value;
        fm.action_delta = fm.raw_delta;
        fm.value = value;
        if dt > self.sample_ms {
            fm.velocity = (value - fm.sample) / dt as f64;
            fm.sample = value;
            fm.sample_ms = t;
        }
        self.tickle.set(bit, fm.raw_delta.abs() > self.epsilon);
        if self.active.contains(bit) {
            return;
        }
        fm.action_delta = value - fm.original;
        let elapsed = t.saturating_sub(fm.original_ms);
        if elapsed > fm.hold_ms && fm.action_delta.abs() > fm.bar {
            self.active.insert(bit);
        } else if elapsed > fm.bar_ms {
            self.active.insert(bit);
            self.timeout.insert(bit);
        } else {
            fm.action_delta = 0.0;
        }
    }

    /// State of one axis.
    #[must_use]
    pub fn axis(&self, axis: Axis) -> &AxisFilter {
        &self.axes[axis as usize]
    }

    /// Filtered centroid.
    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(
            self.axes[Axis::X as usize].value,
            self.axes[Axis::Y as usize].value,
        )
    }

    /// Axes that moved perceptibly in the last frame.
    #[must_use]
    pub fn tickle(&self) -> AxisMask {
        self.tickle
    }

    /// Axes committed to gesture motion.
    #[must_use]
    pub fn active(&self) -> AxisMask {
        self.active
    }

    /// Axes that committed by timing out rather than by amplitude.
    #[must_use]
    pub fn timeout(&self) -> AxisMask {
        self.timeout
    }

    /// Exactly one contact, unchanged in count since the previous frame.
    #[must_use]
    pub fn is_single(&self) -> bool {
        self.single
    }

    /// Two or more contacts, unchanged in count since the previous frame.
    #[must_use]
    pub fn is_multi(&self) -> bool {
        self.multi
    }

    /// Number of active contacts in the last frame.
    #[must_use]
    pub fn touches(&self) -> usize {
        self.touches
    }

    /// Time of the last frame.
    #[must_use]
    pub fn time(&self) -> u64 {
        self.time
    }
}

fn centroid(frame: &FrameRef<'_>) -> Point {
    let n = frame.num_active();
    if n == 0 {
        return Point::ORIGIN;
    }
    let sum = frame
        .active_contacts()
        .fold(kurbo::Vec2::ZERO, |acc, c| acc + c.pos.to_vec2());
    (sum / n as f64).to_point()
}

fn radius(c: Point, frame: &FrameRef<'_>) -> f64 {
    let n = frame.num_active();
    if n < 2 {
        return 0.0;
    }
    let r2: f64 = frame
        .active_contacts()
        .map(|t| (t.pos - c).hypot2())
        .sum();
    (r2 / n as f64).sqrt()
}

/// Mean angular displacement of the contacts around `c` since the previous
/// frame.
fn rotation(c: Point, r: f64, frame: &FrameRef<'_>) -> f64 {
    let n = frame.num_active();
    if n < 2 || r == 0.0 {
        return 0.0;
    }
    let darc2: f64 = frame
        .active()
        .map(|t| (t.pos - c).cross(t.pos - t.prev().pos))
        .sum();
    darc2 / n as f64 / (r * r)
}
