// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Output coordinate mapping.

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Affine, Point, Rect};

/// Maps frame coordinates into client coordinates.
///
/// An axis-aligned scale plus translation, with an extra isotropic scale for
/// lengths such as radii and contact axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordMap {
    transform: Affine,
    scale_r: f64,
}

impl Default for CoordMap {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl CoordMap {
    /// The identity mapping.
    pub const IDENTITY: Self = Self {
        transform: Affine::IDENTITY,
        scale_r: 1.0,
    };

    /// Maps `from` onto `to`, corner to corner.
    ///
    /// Lengths scale by the ratio of the two diagonals.
    #[must_use]
    pub fn between(from: Rect, to: Rect) -> Self {
        let (dx, dy) = (from.width(), from.height());
        let (tx, ty) = (to.width(), to.height());
        let sx = tx / dx;
        let sy = ty / dy;
        let scale_r = ((tx * tx + ty * ty) / (dx * dx + dy * dy)).sqrt();
        Self {
            transform: Affine::new([sx, 0.0, 0.0, sy, to.x0 - from.x0 * sx, to.y0 - from.y0 * sy]),
            scale_r,
        }
    }

    /// Maps a point.
    #[must_use]
    pub fn point(&self, p: Point) -> Point {
        self.transform * p
    }

    /// Maps a horizontal coordinate.
    #[must_use]
    pub fn x(&self, x: f64) -> f64 {
        let [sx, _, _, _, tx, _] = self.transform.as_coeffs();
        sx * x + tx
    }

    /// Maps a vertical coordinate.
    #[must_use]
    pub fn y(&self, y: f64) -> f64 {
        let [_, _, _, sy, _, ty] = self.transform.as_coeffs();
        sy * y + ty
    }

    /// Horizontal scale, for deltas and velocities.
    #[must_use]
    pub fn scale_x(&self) -> f64 {
        self.transform.as_coeffs()[0]
    }

    /// Vertical scale, for deltas and velocities.
    #[must_use]
    pub fn scale_y(&self) -> f64 {
        self.transform.as_coeffs()[3]
    }

    /// Isotropic scale, for lengths.
    #[must_use]
    pub fn scale_r(&self) -> f64 {
        self.scale_r
    }
}
