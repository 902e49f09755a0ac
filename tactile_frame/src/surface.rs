// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Surface calibration and device capability probing.

use core::fmt;

use kurbo::{Rect, Size};

/// Lowest tracking id assumed when a device does not advertise a range.
pub const DEFAULT_MIN_ID: i32 = 0;
/// Highest tracking id assumed when a device does not advertise a range.
pub const DEFAULT_MAX_ID: i32 = 65535;

bitflags::bitflags! {
    /// Static feature flags of a touch surface.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct SurfaceFlags: u16 {
        /// The surface drives a pointer (touchpad-like, indirect).
        const NEEDS_POINTER = 1 << 0;
        /// Touches land directly on the display (touchscreen).
        const DIRECT        = 1 << 1;
        /// The whole pad is a clickable button.
        const BUTTONPAD     = 1 << 2;
        /// Two or more touches are reported as a bounding pair plus a count.
        const SEMI_MT       = 1 << 3;
        /// Reports the major axis of the touch ellipse.
        const TOUCH_MAJOR   = 1 << 4;
        /// Reports a distinct minor axis of the touch ellipse.
        const TOUCH_MINOR   = 1 << 5;
        /// Reports the major axis of the approach ellipse.
        const WIDTH_MAJOR   = 1 << 6;
        /// Reports a distinct minor axis of the approach ellipse.
        const WIDTH_MINOR   = 1 << 7;
        /// Reports ellipse orientation.
        const ORIENTATION   = 1 << 8;
        /// Reports contact pressure.
        const PRESSURE      = 1 << 9;
        /// Reports hover distance.
        const DISTANCE      = 1 << 10;
    }
}

bitflags::bitflags! {
    /// Input properties a device may advertise alongside its axes.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct InputProps: u8 {
        /// Device needs a pointer on screen.
        const POINTER   = 1 << 0;
        /// Device is a direct input device.
        const DIRECT    = 1 << 1;
        /// Device has a button under the pad.
        const BUTTONPAD = 1 << 2;
        /// Device reports semi multi-touch data.
        const SEMI_MT   = 1 << 3;
    }
}

/// Calibration of one touch surface.
///
/// Native coordinates are what the device reports. Mapped coordinates are what
/// frames carry after the sync transform, a linear map from `native` onto
/// `mapped`.
#[derive(Clone, Debug, PartialEq)]
pub struct Surface {
    /// Feature flags.
    pub flags: SurfaceFlags,
    /// Native coordinate range.
    pub native: Rect,
    /// Target coordinate range of the sync transform.
    pub mapped: Rect,
    /// Largest native pressure value.
    pub max_pressure: f64,
    /// Pressure value the native maximum maps to.
    pub mapped_max_pressure: f64,
    /// Native orientation value corresponding to a quarter turn.
    pub max_orientation: f64,
    /// Physical size in millimetres.
    pub physical: Size,
    /// Pressure at the native maximum, in N/cm².
    pub physical_pressure: f64,
    /// Smallest tracking id the device hands out.
    pub min_id: i32,
    /// Largest tracking id the device hands out.
    pub max_id: i32,
}

impl Surface {
    /// Creates a surface with the given native range and an identity mapping.
    ///
    /// A degenerate axis (zero width or height) falls back to `0..1024`
    /// horizontally and `0..768` vertically.
    #[must_use]
    pub fn new(native: Rect) -> Self {
        let native = sanitize_range(native);
        Self {
            flags: SurfaceFlags::DIRECT,
            native,
            mapped: native,
            max_pressure: 256.0,
            mapped_max_pressure: 256.0,
            max_orientation: 1.0,
            physical: Size::new(250.0, 160.0),
            physical_pressure: 10.0,
            min_id: DEFAULT_MIN_ID,
            max_id: DEFAULT_MAX_ID,
        }
    }

    /// Returns the surface with `flags` replacing the current flags.
    #[must_use]
    pub fn with_flags(mut self, flags: SurfaceFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Returns the surface with a different mapped range.
    #[must_use]
    pub fn with_mapped(mut self, mapped: Rect) -> Self {
        self.mapped = mapped;
        self
    }

    /// Builds a surface from probed device capabilities.
    ///
    /// Devices with relative axes, or without both multi-touch position axes,
    /// are rejected.
    pub fn from_caps(caps: &DeviceCaps) -> Result<Self, AttachError> {
        if caps.relative_axes {
            return Err(AttachError::RelativeAxes);
        }
        let (Some(px), Some(py)) = (caps.position_x, caps.position_y) else {
            return Err(AttachError::MissingPosition);
        };

        let props = caps.properties;
        let mut flags = SurfaceFlags::empty();
        flags.set(
            SurfaceFlags::NEEDS_POINTER,
            caps.pointer_buttons || props.contains(InputProps::POINTER),
        );
        flags.set(
            SurfaceFlags::DIRECT,
            !caps.pointer_buttons || props.contains(InputProps::DIRECT),
        );
        flags.set(SurfaceFlags::BUTTONPAD, props.contains(InputProps::BUTTONPAD));
        flags.set(SurfaceFlags::SEMI_MT, props.contains(InputProps::SEMI_MT));
        flags.set(SurfaceFlags::TOUCH_MAJOR, caps.touch_major.is_some());
        flags.set(SurfaceFlags::TOUCH_MINOR, caps.touch_minor.is_some());
        flags.set(SurfaceFlags::WIDTH_MAJOR, caps.width_major.is_some());
        flags.set(SurfaceFlags::WIDTH_MINOR, caps.width_minor.is_some());
        flags.set(SurfaceFlags::ORIENTATION, caps.orientation.is_some());
        flags.set(SurfaceFlags::PRESSURE, caps.pressure.is_some());
        flags.set(SurfaceFlags::DISTANCE, caps.distance.is_some());

        let (min_id, max_id) = caps
            .tracking_id
            .map_or((DEFAULT_MIN_ID, DEFAULT_MAX_ID), |a| (a.minimum, a.maximum));

        let native = sanitize_range(Rect::new(
            f64::from(px.minimum),
            f64::from(py.minimum),
            f64::from(px.maximum),
            f64::from(py.maximum),
        ));

        let max_pressure = match caps.pressure.map_or(0, |a| a.maximum) {
            0 => 256.0,
            m => f64::from(m),
        };
        let max_orientation = match caps.orientation.map_or(0, |a| a.maximum) {
            0 => 1.0,
            m => f64::from(m),
        };

        let pointer = flags.contains(SurfaceFlags::NEEDS_POINTER);
        let res_x = resolution(Some(px), caps.single_x);
        let res_y = resolution(Some(py), caps.single_y);
        let width = match res_x {
            Some(r) => native.width() / r,
            None if pointer => 100.0,
            None => 250.0,
        };
        let height = match res_y {
            Some(r) => native.height() / r,
            None if pointer => 65.0,
            None => 160.0,
        };
        let physical_pressure = match resolution(caps.pressure, None) {
            Some(r) => max_pressure / r,
            None => 10.0,
        };

        Ok(Self {
            flags,
            native,
            mapped: native,
            max_pressure,
            mapped_max_pressure: max_pressure,
            max_orientation,
            physical: Size::new(width, height),
            physical_pressure,
            min_id,
            max_id,
        })
    }

    /// Returns `true` if every flag in `flags` is set.
    #[must_use]
    pub fn has(&self, flags: SurfaceFlags) -> bool {
        self.flags.contains(flags)
    }

    /// Per-axis scale factors from native to mapped coordinates.
    #[must_use]
    pub fn scale(&self) -> (f64, f64) {
        (
            self.mapped.width() / self.native.width(),
            self.mapped.height() / self.native.height(),
        )
    }

    /// Uniform scale applied to lengths: the larger of the two axis scales,
    /// which keeps shapes intact when the mapped view clips one axis.
    #[must_use]
    pub fn length_scale(&self) -> f64 {
        let (fx, fy) = self.scale();
        fx.max(fy)
    }
}

fn sanitize_range(mut r: Rect) -> Rect {
    if r.x0 == r.x1 {
        r.x0 = 0.0;
        r.x1 = 1024.0;
    }
    if r.y0 == r.y1 {
        r.y0 = 0.0;
        r.y1 = 768.0;
    }
    r
}

fn resolution(primary: Option<AbsInfo>, fallback: Option<AbsInfo>) -> Option<f64> {
    let res = match primary.map_or(0, |a| a.resolution) {
        0 => fallback.map_or(0, |a| a.resolution),
        r => r,
    };
    (res > 0).then(|| f64::from(res))
}

/// Range and resolution of one absolute axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AbsInfo {
    /// Smallest reported value.
    pub minimum: i32,
    /// Largest reported value.
    pub maximum: i32,
    /// Units per millimetre, or 0 if unknown.
    pub resolution: i32,
}

impl AbsInfo {
    /// Creates axis info without a resolution.
    #[must_use]
    pub const fn new(minimum: i32, maximum: i32) -> Self {
        Self {
            minimum,
            maximum,
            resolution: 0,
        }
    }

    /// Returns this axis info with a resolution.
    #[must_use]
    pub const fn with_resolution(mut self, resolution: i32) -> Self {
        self.resolution = resolution;
        self
    }
}

/// Capabilities probed from an input device, as far as the frame engine cares.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceCaps {
    /// Multi-touch horizontal position axis.
    pub position_x: Option<AbsInfo>,
    /// Multi-touch vertical position axis.
    pub position_y: Option<AbsInfo>,
    /// Single-touch horizontal axis, consulted for resolution only.
    pub single_x: Option<AbsInfo>,
    /// Single-touch vertical axis, consulted for resolution only.
    pub single_y: Option<AbsInfo>,
    /// Touch ellipse major axis.
    pub touch_major: Option<AbsInfo>,
    /// Touch ellipse minor axis.
    pub touch_minor: Option<AbsInfo>,
    /// Approach ellipse major axis.
    pub width_major: Option<AbsInfo>,
    /// Approach ellipse minor axis.
    pub width_minor: Option<AbsInfo>,
    /// Ellipse orientation.
    pub orientation: Option<AbsInfo>,
    /// Contact pressure.
    pub pressure: Option<AbsInfo>,
    /// Hover distance.
    pub distance: Option<AbsInfo>,
    /// Tracking id axis.
    pub tracking_id: Option<AbsInfo>,
    /// Device reports relative motion.
    pub relative_axes: bool,
    /// Device has pointer-style buttons or tools (finger/pen/stylus tool keys, mouse buttons).
    pub pointer_buttons: bool,
    /// Advertised input properties.
    pub properties: InputProps,
}

/// A device could not be attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachError {
    /// The device reports relative motion; only absolute devices are supported.
    RelativeAxes,
    /// The device lacks one or both multi-touch position axes.
    MissingPosition,
}

impl fmt::Display for AttachError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RelativeAxes => f.write_str("device reports relative axes"),
            Self::MissingPosition => f.write_str("device lacks multi-touch position axes"),
        }
    }
}

impl core::error::Error for AttachError {}
