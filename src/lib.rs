//! Fisheye Dewarp Library
//!
//! Converts equidistant circular fisheye images into rectified perspective
//! views. The core artifact is the [`ProjectionMap`]: a dense per-pixel table
//! of fractional source coordinates, built once per
//! (calibration, view, grid) combination and reused across every frame
//! rendered with that view. The library provides:
//! - Fisheye circle calibration with YAML load/save
//! - Pan/tilt/FOV view geometry resolution
//! - Parallel projection map construction
//! - Bilinear remapping and multi-view grid composition

pub mod camera;
pub mod geometry;
pub mod projection;
pub mod util;

// Re-export commonly used types
pub use camera::{DewarpError, FisheyeCalibration, OutputGrid};
pub use geometry::{Normalized, ViewGeometry, ViewParameters};
pub use projection::{build_projection_map, ProjectionMap};
pub use util::{compose_grid, remap, BoundaryPolicy};
