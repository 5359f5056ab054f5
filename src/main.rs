//! Fisheye dewarping tool.
//!
//! Builds a projection map for the requested view and remaps a fisheye image
//! into a rectified perspective image. With `--quad`, renders the four classic
//! quadrant views (90° apart in pan) composited into one 2×2 image.
//!
//! Usage:
//! ```bash
//! dewarp -i fisheye.jpg -o dewarped.jpg --radius 845 --theta 0.125
//! ```

use clap::Parser;
use fisheye_dewarp::{
    build_projection_map, compose_grid, remap, BoundaryPolicy, FisheyeCalibration, OutputGrid,
    ViewParameters,
};
use image::Rgb;
use log::{error, info};
use nalgebra::Point2;
use std::error::Error;
use std::path::PathBuf;
use std::process;

/// Dewarp an equidistant fisheye image into perspective views
#[derive(Parser, Debug)]
#[command(name = "dewarp", author, version, about, long_about = None)]
struct Cli {
    /// Path to the input fisheye image
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Path to the output dewarped image
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// X-coordinate of the fisheye circle center
    #[arg(long = "circle_x", alias = "cw", default_value_t = 1301.0)]
    circle_x: f64,

    /// Y-coordinate of the fisheye circle center
    #[arg(long = "circle_y", alias = "ch", default_value_t = 935.0)]
    circle_y: f64,

    /// Fisheye circle radius in pixels
    #[arg(long = "radius", alias = "cr", default_value_t = 845.0)]
    radius: f64,

    /// Output width in pixels
    #[arg(long = "remap_w", alias = "rw", default_value_t = 1280)]
    remap_w: u32,

    /// Output height in pixels
    #[arg(long = "remap_h", alias = "rh", default_value_t = 720)]
    remap_h: u32,

    /// Pan angle, normalized to [0, 1]
    #[arg(short = 't', long, default_value_t = 0.125)]
    theta: f64,

    /// Tilt angle, normalized to [0, 1]
    #[arg(short = 'p', long, default_value_t = 0.95)]
    phi: f64,

    /// Horizontal field of view, normalized to [0, 1]
    #[arg(short = 'f', long, default_value_t = 0.4)]
    fov: f64,

    /// Render the four quadrant views composited into a 2×2 grid
    #[arg(long)]
    quad: bool,
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let calibration =
        FisheyeCalibration::new(Point2::new(cli.circle_x, cli.circle_y), cli.radius)?;
    let grid = OutputGrid::new(cli.remap_w, cli.remap_h)?;

    let frame = image::open(&cli.input)
        .map_err(|e| format!("Failed to load image {}: {e}", cli.input.display()))?
        .to_rgb8();
    info!(
        "Loaded {} ({}x{})",
        cli.input.display(),
        frame.width(),
        frame.height()
    );

    let views: Vec<ViewParameters> = if cli.quad {
        ViewParameters::quad(cli.phi, cli.fov)?.to_vec()
    } else {
        vec![ViewParameters::new(cli.theta, cli.phi, cli.fov)?]
    };

    let background = BoundaryPolicy::Constant(Rgb([0, 0, 0]));
    let mut tiles = Vec::with_capacity(views.len());
    for view in &views {
        let map = build_projection_map(&calibration, view, &grid)?;
        info!(
            "Built {}x{} projection map for pan {}",
            map.width(),
            map.height(),
            view.pan.value()
        );
        tiles.push(remap(&frame, &map, background));
    }

    let output = if cli.quad {
        compose_grid(&tiles, 2)?
    } else {
        tiles.remove(0)
    };

    output
        .save(&cli.output)
        .map_err(|e| format!("Failed to save image {}: {e}", cli.output.display()))?;
    println!("Dewarped image saved to {}", cli.output.display());

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        error!("{err}");
        process::exit(1);
    }
}
