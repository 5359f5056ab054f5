use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use std::fs;
use std::io::Write;
use yaml_rust::YamlLoader;

#[derive(thiserror::Error, Debug)]
pub enum DewarpError {
    #[error("Parameter '{name}' must lie in [0, 1], got {value}")]
    ParameterOutOfRange { name: &'static str, value: f64 },
    #[error("Circle radius must be positive")]
    RadiusMustBePositive,
    #[error("Circle center must be finite")]
    CenterMustBeFinite,
    #[error("Output grid dimensions must be positive")]
    EmptyGrid,
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
    #[error("Failed to load YAML: {0}")]
    YamlError(String),
    #[error("IO Error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for DewarpError {
    fn from(err: std::io::Error) -> Self {
        DewarpError::IOError(err.to_string())
    }
}

impl From<yaml_rust::ScanError> for DewarpError {
    fn from(err: yaml_rust::ScanError) -> Self {
        DewarpError::YamlError(err.to_string())
    }
}

/// Calibration of an equidistant fisheye lens within its source image.
///
/// The fisheye circle is described by its optical center in source pixel
/// coordinates and the radius, in pixels, at which a ray 90° off the optical
/// axis lands. The center does not have to lie inside the image bounds,
/// although it typically does.
#[derive(Debug, Clone)]
pub struct FisheyeCalibration {
    /// Pixel coordinates of the optical center in the source image.
    pub circle_center: Point2<f64>,
    /// Pixels from the center to the edge of the fisheye circle (the 90° ring).
    pub circle_radius: f64,
}

impl FisheyeCalibration {
    /// Creates a validated calibration.
    ///
    /// # Errors
    ///
    /// * [`DewarpError::RadiusMustBePositive`] if `circle_radius <= 0` or NaN.
    /// * [`DewarpError::CenterMustBeFinite`] if either center coordinate is
    ///   NaN or infinite.
    pub fn new(circle_center: Point2<f64>, circle_radius: f64) -> Result<Self, DewarpError> {
        let calibration = FisheyeCalibration {
            circle_center,
            circle_radius,
        };
        calibration.validate_params()?;
        Ok(calibration)
    }

    /// Projects spherical view angles onto the fisheye circle.
    ///
    /// Under the equidistant model the angular distance `phi` from the optical
    /// axis maps linearly to radial pixel distance, reaching `circle_radius`
    /// exactly at `phi = π/2`:
    ///
    /// `r = phi / (π/2) * circle_radius`
    /// `x = r * cos(theta) + center.x`
    /// `y = r * sin(theta) + center.y`
    ///
    /// The result is not clamped to any image bounds; rays beyond the captured
    /// hemisphere land outside the circle and the consuming resampler decides
    /// what to do with them.
    pub fn project_ray(&self, theta: f64, phi: f64) -> Point2<f64> {
        let r = (phi / FRAC_PI_2) * self.circle_radius;
        Point2::new(
            r * theta.cos() + self.circle_center.x,
            r * theta.sin() + self.circle_center.y,
        )
    }

    pub fn validate_params(&self) -> Result<(), DewarpError> {
        if !(self.circle_radius > 0.0) {
            return Err(DewarpError::RadiusMustBePositive);
        }
        if !self.circle_center.x.is_finite() || !self.circle_center.y.is_finite() {
            return Err(DewarpError::CenterMustBeFinite);
        }
        Ok(())
    }

    /// Loads a calibration from a YAML file.
    ///
    /// Expected structure:
    ///
    /// ```yaml
    /// fisheye:
    ///   circle_center: [1301.0, 935.0]
    ///   circle_radius: 845.0
    /// ```
    pub fn load_from_yaml(path: &str) -> Result<Self, DewarpError> {
        let contents = fs::read_to_string(path)?;
        let docs = YamlLoader::load_from_str(&contents)?;
        let doc = &docs[0];

        let center_yaml = doc["fisheye"]["circle_center"].as_vec().ok_or_else(|| {
            DewarpError::InvalidParams("YAML missing 'circle_center' or not an array".to_string())
        })?;

        let cx = center_yaml[0].as_f64().ok_or_else(|| {
            DewarpError::InvalidParams("Invalid circle_center x: not a float".to_string())
        })?;
        let cy = center_yaml[1].as_f64().ok_or_else(|| {
            DewarpError::InvalidParams("Invalid circle_center y: not a float".to_string())
        })?;
        let radius = doc["fisheye"]["circle_radius"].as_f64().ok_or_else(|| {
            DewarpError::InvalidParams("Invalid circle_radius: not a float".to_string())
        })?;

        FisheyeCalibration::new(Point2::new(cx, cy), radius)
    }

    /// Saves the calibration to a YAML file in the layout accepted by
    /// [`FisheyeCalibration::load_from_yaml`].
    pub fn save_to_yaml(&self, path: &str) -> Result<(), DewarpError> {
        let yaml = serde_yaml::to_value(serde_yaml::Mapping::from_iter([(
            serde_yaml::Value::String("fisheye".to_string()),
            serde_yaml::to_value(serde_yaml::Mapping::from_iter([
                (
                    serde_yaml::Value::String("circle_center".to_string()),
                    serde_yaml::to_value(vec![self.circle_center.x, self.circle_center.y])
                        .map_err(|e| DewarpError::YamlError(e.to_string()))?,
                ),
                (
                    serde_yaml::Value::String("circle_radius".to_string()),
                    serde_yaml::to_value(self.circle_radius)
                        .map_err(|e| DewarpError::YamlError(e.to_string()))?,
                ),
            ]))
            .map_err(|e| DewarpError::YamlError(e.to_string()))?,
        )]))
        .map_err(|e| DewarpError::YamlError(e.to_string()))?;

        let yaml_string =
            serde_yaml::to_string(&yaml).map_err(|e| DewarpError::YamlError(e.to_string()))?;

        let mut file = fs::File::create(path).map_err(|e| DewarpError::IOError(e.to_string()))?;
        file.write_all(yaml_string.as_bytes())
            .map_err(|e| DewarpError::IOError(e.to_string()))?;

        Ok(())
    }
}

/// Dimensions of a dewarped output image.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OutputGrid {
    pub width: u32,
    pub height: u32,
}

impl OutputGrid {
    /// Creates a grid, rejecting zero dimensions.
    pub fn new(width: u32, height: u32) -> Result<Self, DewarpError> {
        if width == 0 || height == 0 {
            return Err(DewarpError::EmptyGrid);
        }
        Ok(OutputGrid { width, height })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_calibration_rejects_nonpositive_radius() {
        let center = Point2::new(1301.0, 935.0);
        assert!(matches!(
            FisheyeCalibration::new(center, 0.0),
            Err(DewarpError::RadiusMustBePositive)
        ));
        assert!(matches!(
            FisheyeCalibration::new(center, -845.0),
            Err(DewarpError::RadiusMustBePositive)
        ));
        assert!(matches!(
            FisheyeCalibration::new(center, f64::NAN),
            Err(DewarpError::RadiusMustBePositive)
        ));
    }

    #[test]
    fn test_calibration_rejects_nonfinite_center() {
        assert!(matches!(
            FisheyeCalibration::new(Point2::new(f64::NAN, 935.0), 845.0),
            Err(DewarpError::CenterMustBeFinite)
        ));
    }

    #[test]
    fn test_project_ray_at_optical_axis() {
        let calibration = FisheyeCalibration::new(Point2::new(1301.0, 935.0), 845.0).unwrap();
        // phi = 0 is the optical axis itself, landing on the circle center
        // regardless of theta.
        for theta in [0.0, 1.0, -2.5] {
            let p = calibration.project_ray(theta, 0.0);
            assert_relative_eq!(p.x, 1301.0, epsilon = 1e-12);
            assert_relative_eq!(p.y, 935.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_project_ray_at_ninety_degrees_lands_on_circle() {
        let calibration = FisheyeCalibration::new(Point2::new(1301.0, 935.0), 845.0).unwrap();
        for theta in [0.0, 0.7, 2.1, -1.3] {
            let p = calibration.project_ray(theta, FRAC_PI_2);
            let dx = p.x - 1301.0;
            let dy = p.y - 935.0;
            assert_relative_eq!((dx * dx + dy * dy).sqrt(), 845.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_grid_rejects_zero_dimensions() {
        assert!(matches!(OutputGrid::new(0, 720), Err(DewarpError::EmptyGrid)));
        assert!(matches!(OutputGrid::new(1280, 0), Err(DewarpError::EmptyGrid)));
        assert!(OutputGrid::new(1280, 720).is_ok());
    }

    #[test]
    fn test_load_from_yaml() {
        let path = "samples/fisheye.yaml";
        let calibration = FisheyeCalibration::load_from_yaml(path).unwrap();

        assert_eq!(calibration.circle_center.x, 1301.0);
        assert_eq!(calibration.circle_center.y, 935.0);
        assert_eq!(calibration.circle_radius, 845.0);
    }

    #[test]
    fn test_yaml_round_trip() {
        let calibration = FisheyeCalibration::new(Point2::new(640.5, 480.25), 512.0).unwrap();
        let path = std::env::temp_dir().join("fisheye_dewarp_roundtrip.yaml");
        let path = path.to_str().unwrap().to_string();

        calibration.save_to_yaml(&path).unwrap();
        let reloaded = FisheyeCalibration::load_from_yaml(&path).unwrap();

        assert_eq!(reloaded.circle_center.x, 640.5);
        assert_eq!(reloaded.circle_center.y, 480.25);
        assert_eq!(reloaded.circle_radius, 512.0);
    }
}
