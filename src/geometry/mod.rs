//! View geometry for perspective dewarping.
//!
//! This module resolves, for each destination pixel of a rectilinear output
//! grid, the spherical direction that pixel observes on the fisheye sphere
//! after the view's pan/tilt rotation is applied. The per-pixel computation is
//! a pure function of the view parameters and the grid size, so it can be
//! evaluated independently per pixel (see [`crate::projection`] for the
//! parallel table build).

use crate::camera::{DewarpError, OutputGrid};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

/// A scalar constrained to the closed interval [0, 1].
///
/// Pan, tilt, and field of view are all expressed as normalized fractions of
/// their angular range. Validating at construction keeps range checks out of
/// the inner geometry math.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Normalized(f64);

impl Normalized {
    pub fn new(name: &'static str, value: f64) -> Result<Self, DewarpError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(DewarpError::ParameterOutOfRange { name, value });
        }
        Ok(Normalized(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Normalized {
    type Error = DewarpError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Normalized::new("normalized", value)
    }
}

impl From<Normalized> for f64 {
    fn from(value: Normalized) -> f64 {
        value.0
    }
}

/// Selects which angular slice of the fisheye sphere is rendered.
///
/// * `pan` maps [0, 1] onto a full 2π rotation around the optical axis.
/// * `tilt` scales how far the view axis leans from the optical axis toward
///   the horizon.
/// * `fov` maps [0, 1] onto a horizontal angular extent of (0, π].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ViewParameters {
    pub pan: Normalized,
    pub tilt: Normalized,
    pub fov: Normalized,
}

impl ViewParameters {
    /// Creates view parameters from raw normalized values.
    ///
    /// # Errors
    ///
    /// [`DewarpError::ParameterOutOfRange`] naming the offending parameter if
    /// any value falls outside [0, 1].
    pub fn new(pan: f64, tilt: f64, fov: f64) -> Result<Self, DewarpError> {
        Ok(ViewParameters {
            pan: Normalized::new("pan", pan)?,
            tilt: Normalized::new("tilt", tilt)?,
            fov: Normalized::new("fov", fov)?,
        })
    }

    /// The four quadrant views of the classic 2×2 quad layout, 90° apart in
    /// pan with shared tilt and field of view.
    ///
    /// Order matches the reference layout row-major: top row pan 3/8 and 1/8,
    /// bottom row pan 7/8 and 5/8.
    pub fn quad(tilt: f64, fov: f64) -> Result<[ViewParameters; 4], DewarpError> {
        Ok([
            ViewParameters::new(3.0 / 8.0, tilt, fov)?,
            ViewParameters::new(1.0 / 8.0, tilt, fov)?,
            ViewParameters::new(7.0 / 8.0, tilt, fov)?,
            ViewParameters::new(5.0 / 8.0, tilt, fov)?,
        ])
    }
}

/// Per-view constants for resolving destination pixels to spherical angles.
///
/// Construction folds the view parameters and grid size into the linear
/// pixel-to-angle coefficients and the rotation sines/cosines, so
/// [`ViewGeometry::spherical_ray`] is cheap enough to call once per pixel.
#[derive(Debug, Clone)]
pub struct ViewGeometry {
    x_scale: f64,
    y_scale: f64,
    x_offset: f64,
    y_offset: f64,
    sin_phi: f64,
    cos_phi: f64,
    sin_theta: f64,
    cos_theta: f64,
}

impl ViewGeometry {
    pub fn new(view: &ViewParameters, grid: &OutputGrid) -> Self {
        let width = grid.width as f64;
        let height = grid.height as f64;

        let view_width = PI * view.fov.value();
        let view_height = view_width * height / width;

        let rotation_theta = 2.0 * PI * view.pan.value();
        let rotation_phi = (FRAC_PI_2 - view_height / 2.0) * view.tilt.value();

        ViewGeometry {
            x_scale: view_width / width,
            y_scale: view_height / height,
            x_offset: view_width / 2.0,
            y_offset: view_height / 2.0,
            sin_phi: (-rotation_phi).sin(),
            cos_phi: (-rotation_phi).cos(),
            sin_theta: (-rotation_theta).sin(),
            cos_theta: (-rotation_theta).cos(),
        }
    }

    /// Resolves a destination pixel to spherical angles `(theta, phi)` in the
    /// fisheye's optical-axis-centered frame.
    ///
    /// `x` and `y` are destination coordinates with (0, 0) at the top-left
    /// pixel; fractional and one-past-the-edge coordinates are accepted since
    /// the mapping is defined on the whole plane.
    ///
    /// The tilt step below is deliberately an affine combination rather than a
    /// pure rotation matrix; the constant terms translate the ray's base. The
    /// exact form is load-bearing for compatibility with existing calibration
    /// conventions and must not be replaced with a textbook rotation.
    ///
    /// Near `fov = 1` the angular offset of edge pixels approaches π/2 and the
    /// tangents below grow without bound. Pixel centers never reach the
    /// singularity exactly (offsets stay strictly inside ±π/2 for coordinates
    /// inside the grid), so results remain finite, but views with `fov` close
    /// to 1 magnify extremely toward the edges.
    pub fn spherical_ray(&self, x: f64, y: f64) -> (f64, f64) {
        // Symmetric angular offset of this pixel about the view center.
        let xr = x * self.x_scale - self.x_offset;
        let yr = y * self.y_scale - self.y_offset;

        // Rectilinear projection: the tangent turns angular offsets into a
        // view-local ray.
        let vx = -yr.tan();
        let vy = xr.tan();

        // Tilt about the horizontal axis (affine form, see above).
        let vx_tilted = self.cos_phi * vx - self.sin_phi;
        let vy_tilted = vy;
        let vz_tilted = -self.cos_phi - self.sin_phi * vx;

        // Pan about the vertical axis.
        let vx_panned = self.cos_theta * vx_tilted - self.sin_theta * vy_tilted;
        let vy_panned = self.sin_theta * vx_tilted + self.cos_theta * vy_tilted;

        let theta = vy_panned.atan2(vx_panned);
        let phi = vx_panned.hypot(vy_panned).atan2(-vz_tilted);

        (theta, phi)
    }
}
