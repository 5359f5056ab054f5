//! Projection map construction.
//!
//! A [`ProjectionMap`] is the precomputed lookup table that turns fisheye
//! dewarping into plain resampling: one fractional source coordinate per
//! destination pixel. The table depends only on the calibration, the view
//! parameters, and the grid size, so it is built once and reused across every
//! frame rendered with that view.

use crate::camera::{DewarpError, FisheyeCalibration, OutputGrid};
use crate::geometry::{ViewGeometry, ViewParameters};
use rayon::iter::{IndexedParallelIterator, ParallelIterator};
use rayon::prelude::ParallelSliceMut;

/// Dense per-pixel source-coordinate tables for one dewarped view.
///
/// Row-major, `height` rows of `width` entries each, 32-bit floats as the
/// resampling consumers expect. Immutable after construction; share it freely
/// across threads and frames.
///
/// Entries are not clamped to any source image bounds. Destination pixels
/// whose ray leaves the captured hemisphere map outside the fisheye circle,
/// and the resampler's boundary policy decides what they sample.
#[derive(Debug, Clone)]
pub struct ProjectionMap {
    width: u32,
    height: u32,
    map_x: Vec<f32>,
    map_y: Vec<f32>,
}

impl ProjectionMap {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Source coordinate sampled by destination pixel `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the map dimensions.
    pub fn sample_at(&self, x: u32, y: u32) -> (f32, f32) {
        assert!(x < self.width && y < self.height, "pixel outside map");
        let idx = y as usize * self.width as usize + x as usize;
        (self.map_x[idx], self.map_y[idx])
    }

    /// Row-major X-coordinate table.
    pub fn map_x(&self) -> &[f32] {
        &self.map_x
    }

    /// Row-major Y-coordinate table.
    pub fn map_y(&self) -> &[f32] {
        &self.map_y
    }
}

/// Builds the projection map for one view.
///
/// For every destination pixel the view geometry resolves the spherical
/// direction observed through that pixel, and the equidistant calibration
/// turns the direction into a fisheye source coordinate. The computation is a
/// pure function of its inputs: identical arguments produce bit-identical
/// tables. Rows carry no data dependencies between each other and are filled
/// in parallel.
///
/// # Errors
///
/// Calibration and grid are re-validated before any computation so stale or
/// hand-built values fail fast:
///
/// * [`DewarpError::RadiusMustBePositive`] / [`DewarpError::CenterMustBeFinite`]
///   for a bad calibration.
/// * [`DewarpError::EmptyGrid`] for zero grid dimensions.
pub fn build_projection_map(
    calibration: &FisheyeCalibration,
    view: &ViewParameters,
    grid: &OutputGrid,
) -> Result<ProjectionMap, DewarpError> {
    calibration.validate_params()?;
    if grid.width == 0 || grid.height == 0 {
        return Err(DewarpError::EmptyGrid);
    }

    let geometry = ViewGeometry::new(view, grid);
    let width = grid.width as usize;
    let height = grid.height as usize;

    let mut map_x = vec![0.0f32; width * height];
    let mut map_y = vec![0.0f32; width * height];

    map_x
        .par_chunks_mut(width)
        .zip(map_y.par_chunks_mut(width))
        .enumerate()
        .for_each(|(y, (row_x, row_y))| {
            for x in 0..width {
                let (theta, phi) = geometry.spherical_ray(x as f64, y as f64);
                let source = calibration.project_ray(theta, phi);
                row_x[x] = source.x as f32;
                row_y[x] = source.y as f32;
            }
        });

    Ok(ProjectionMap {
        width: grid.width,
        height: grid.height,
        map_x,
        map_y,
    })
}
