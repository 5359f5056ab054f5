//! Glue around the projection maps: bilinear remapping of a source frame
//! through a [`ProjectionMap`] and grid composition of several dewarped views.
//!
//! None of this is geometrically interesting; the heavy lifting happens in
//! [`crate::projection`]. These helpers exist so the `dewarp` binary can go
//! end to end from a fisheye frame to a saved perspective image.

use crate::camera::DewarpError;
use crate::projection::ProjectionMap;
use image::{imageops, Rgb, RgbImage};

/// What a remap samples when a map entry falls outside the source image.
#[derive(Debug, Clone, Copy)]
pub enum BoundaryPolicy {
    /// Fill with a constant color (the reference uses black).
    Constant(Rgb<u8>),
    /// Clamp the coordinate to the nearest valid source pixel.
    Clamp,
}

/// Resamples a source frame through a projection map with bilinear
/// interpolation.
///
/// The output has the map's dimensions. Map entries outside the source image
/// are resolved by `policy`; everything else samples the four surrounding
/// source pixels weighted by the fractional coordinate.
pub fn remap(source: &RgbImage, map: &ProjectionMap, policy: BoundaryPolicy) -> RgbImage {
    let mut output = RgbImage::new(map.width(), map.height());

    for y in 0..map.height() {
        for x in 0..map.width() {
            let (sx, sy) = map.sample_at(x, y);
            let color = sample_bilinear(source, sx as f64, sy as f64, policy);
            output.put_pixel(x, y, color);
        }
    }

    output
}

fn sample_bilinear(source: &RgbImage, x: f64, y: f64, policy: BoundaryPolicy) -> Rgb<u8> {
    let (width, height) = source.dimensions();

    let (x, y) = match policy {
        BoundaryPolicy::Clamp => (
            x.clamp(0.0, (width - 1) as f64),
            y.clamp(0.0, (height - 1) as f64),
        ),
        BoundaryPolicy::Constant(fill) => {
            if x < 0.0 || y < 0.0 || x > (width - 1) as f64 || y > (height - 1) as f64 {
                return fill;
            }
            (x, y)
        }
    };

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);

    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = source.get_pixel(x0, y0);
    let p10 = source.get_pixel(x1, y0);
    let p01 = source.get_pixel(x0, y1);
    let p11 = source.get_pixel(x1, y1);

    let mut channels = [0u8; 3];
    for (c, channel) in channels.iter_mut().enumerate() {
        let top = p00[c] as f64 * (1.0 - fx) + p10[c] as f64 * fx;
        let bottom = p01[c] as f64 * (1.0 - fx) + p11[c] as f64 * fx;
        *channel = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }

    Rgb(channels)
}

/// Concatenates equally sized tiles into a row-major grid with `columns`
/// tiles per row.
///
/// # Errors
///
/// [`DewarpError::InvalidParams`] if the tile list is empty, its length is not
/// a multiple of `columns`, or the tiles disagree in size.
pub fn compose_grid(tiles: &[RgbImage], columns: u32) -> Result<RgbImage, DewarpError> {
    if tiles.is_empty() || columns == 0 {
        return Err(DewarpError::InvalidParams(
            "grid composition needs at least one tile and one column".to_string(),
        ));
    }
    if tiles.len() % columns as usize != 0 {
        return Err(DewarpError::InvalidParams(format!(
            "{} tiles do not fill rows of {columns}",
            tiles.len()
        )));
    }

    let (tile_width, tile_height) = tiles[0].dimensions();
    if tiles
        .iter()
        .any(|tile| tile.dimensions() != (tile_width, tile_height))
    {
        return Err(DewarpError::InvalidParams(
            "all tiles must share the same dimensions".to_string(),
        ));
    }

    let rows = tiles.len() as u32 / columns;
    let mut canvas = RgbImage::new(tile_width * columns, tile_height * rows);

    for (index, tile) in tiles.iter().enumerate() {
        let col = index as u32 % columns;
        let row = index as u32 / columns;
        imageops::replace(
            &mut canvas,
            tile,
            (col * tile_width) as i64,
            (row * tile_height) as i64,
        );
    }

    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{FisheyeCalibration, OutputGrid};
    use crate::geometry::ViewParameters;
    use crate::projection::build_projection_map;
    use nalgebra::Point2;

    fn checker(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([200, 100, 50])
            } else {
                Rgb([20, 40, 80])
            }
        })
    }

    #[test]
    fn test_bilinear_midpoint_blends_neighbors() {
        let mut source = RgbImage::new(2, 1);
        source.put_pixel(0, 0, Rgb([0, 0, 0]));
        source.put_pixel(1, 0, Rgb([100, 200, 50]));

        let color = sample_bilinear(&source, 0.5, 0.0, BoundaryPolicy::Clamp);
        assert_eq!(color, Rgb([50, 100, 25]));
    }

    #[test]
    fn test_constant_policy_fills_outside() {
        let source = checker(4, 4);
        let fill = Rgb([1, 2, 3]);

        assert_eq!(
            sample_bilinear(&source, -0.5, 1.0, BoundaryPolicy::Constant(fill)),
            fill
        );
        assert_eq!(
            sample_bilinear(&source, 1.0, 7.2, BoundaryPolicy::Constant(fill)),
            fill
        );
        // Inside the image the fill color is not used.
        assert_ne!(
            sample_bilinear(&source, 1.0, 1.0, BoundaryPolicy::Constant(fill)),
            fill
        );
    }

    #[test]
    fn test_clamp_policy_uses_edge_pixels() {
        let source = checker(4, 4);
        let clamped = sample_bilinear(&source, -3.0, -3.0, BoundaryPolicy::Clamp);
        assert_eq!(clamped, *source.get_pixel(0, 0));
    }

    #[test]
    fn test_remap_output_dimensions() {
        let calibration = FisheyeCalibration::new(Point2::new(32.0, 32.0), 30.0).unwrap();
        let view = ViewParameters::new(0.125, 0.95, 0.4).unwrap();
        let grid = OutputGrid::new(48, 32).unwrap();
        let map = build_projection_map(&calibration, &view, &grid).unwrap();

        let source = checker(64, 64);
        let output = remap(&source, &map, BoundaryPolicy::Constant(Rgb([0, 0, 0])));
        assert_eq!(output.dimensions(), (48, 32));
    }

    #[test]
    fn test_compose_grid_places_tiles_row_major() {
        let red = RgbImage::from_pixel(2, 2, Rgb([255, 0, 0]));
        let green = RgbImage::from_pixel(2, 2, Rgb([0, 255, 0]));
        let blue = RgbImage::from_pixel(2, 2, Rgb([0, 0, 255]));
        let white = RgbImage::from_pixel(2, 2, Rgb([255, 255, 255]));

        let quad = compose_grid(&[red, green, blue, white], 2).unwrap();
        assert_eq!(quad.dimensions(), (4, 4));
        assert_eq!(*quad.get_pixel(0, 0), Rgb([255, 0, 0]));
        assert_eq!(*quad.get_pixel(3, 0), Rgb([0, 255, 0]));
        assert_eq!(*quad.get_pixel(0, 3), Rgb([0, 0, 255]));
        assert_eq!(*quad.get_pixel(3, 3), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_compose_grid_rejects_bad_input() {
        let tile = RgbImage::from_pixel(2, 2, Rgb([0, 0, 0]));
        assert!(compose_grid(&[], 2).is_err());
        assert!(compose_grid(&[tile.clone(), tile.clone(), tile.clone()], 2).is_err());

        let other = RgbImage::from_pixel(3, 2, Rgb([0, 0, 0]));
        assert!(compose_grid(&[tile, other], 2).is_err());
    }
}
