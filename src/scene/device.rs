use crate::foundation::color::Color;
use crate::foundation::core::Canvas;
use crate::foundation::error::{InkframeError, InkframeResult};
use crate::scene::model::Scene;
use crate::scene::validate::validate_device;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

/// Default recursion guard for nested `run_node` calls.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Persisted device configuration: output geometry plus the active scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Human-readable device name.
    #[serde(default = "default_name")]
    pub name: String,
    /// Physical output width in pixels.
    pub width: u32,
    /// Physical output height in pixels.
    pub height: u32,
    /// Rotation applied to the rendered frame before it reaches the driver.
    #[serde(default)]
    pub rotate: Rotation,
    /// How a scene image of the wrong size is fitted to the output.
    #[serde(default)]
    pub scaling_mode: ScalingMode,
    /// Canvas fill and letterbox color.
    #[serde(default)]
    pub background_color: Color,
    /// Periodic refresh interval in seconds.
    #[serde(default = "default_interval")]
    pub interval: f64,
    /// Maximum nesting of explicit node invocations (branches, splits).
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// The active scene.
    pub scene: Scene,
}

fn default_name() -> String {
    "inkframe".to_owned()
}

fn default_interval() -> f64 {
    300.0
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl DeviceConfig {
    /// Parse a device configuration from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> InkframeResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| InkframeError::validation(format!("parse device config JSON: {e}")))
    }

    /// Parse a device configuration from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> InkframeResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            InkframeError::validation(format!("open device config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Validate geometry, timing and scene references.
    pub fn validate(&self) -> InkframeResult<()> {
        validate_device(self)
            .map_err(|e| InkframeError::validation(format!("device config validation failed: {e}")))
    }

    /// Physical output size, as the driver expects it.
    pub fn output_canvas(&self) -> Canvas {
        Canvas::new(self.width, self.height)
    }

    /// Size of the canvas scenes draw into, before rotation.
    pub fn render_canvas(&self) -> Canvas {
        if self.rotate.swaps_axes() {
            self.output_canvas().swapped()
        } else {
            self.output_canvas()
        }
    }

    /// Periodic refresh interval.
    pub fn interval(&self) -> InkframeResult<Duration> {
        interval_from_secs(self.interval)
    }
}

/// Convert a refresh interval in seconds, rejecting values that are not positive or do not fit in
/// a [`Duration`].
pub fn interval_from_secs(secs: f64) -> InkframeResult<Duration> {
    if secs <= 0.0 {
        return Err(InkframeError::validation(format!(
            "interval must be a positive number of seconds (got {secs})"
        )));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| {
        InkframeError::validation(format!("interval {secs} is out of range: {e}"))
    })
}

/// Clockwise output rotation in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Rotation {
    /// No rotation.
    #[default]
    Deg0,
    /// Quarter turn clockwise.
    Deg90,
    /// Half turn.
    Deg180,
    /// Three quarter turns clockwise.
    Deg270,
}

impl Rotation {
    /// Whether width and height trade places.
    pub fn swaps_axes(self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }
}

impl TryFrom<u32> for Rotation {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Deg0),
            90 => Ok(Self::Deg90),
            180 => Ok(Self::Deg180),
            270 => Ok(Self::Deg270),
            other => Err(format!("rotate must be 0, 90, 180 or 270 (got {other})")),
        }
    }
}

impl From<Rotation> for u32 {
    fn from(value: Rotation) -> Self {
        match value {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }
}

/// Policy for fitting a scene image to the output size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalingMode {
    /// Scale to fill, crop the overflow.
    Cover,
    /// Scale to fit, letterbox with the background color.
    #[default]
    Contain,
    /// Resize ignoring aspect ratio.
    Stretch,
    /// Paste at native size, centered, cropping any overflow.
    Center,
}
