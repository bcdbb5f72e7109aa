/// Command-line arguments and the TOML render configuration
use std::path::{Path, PathBuf};
use std::time::Duration;

use cell3d_core::{GeometryError, Pipeline, PipelineConfig, SceneConfig, Viewport};
use clap::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Viewport used to validate projection settings before the terminal is known
const VALIDATION_VIEWPORT: (u32, u32) = (80, 24);

/// Spin a triangle mesh in the terminal
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "cell3d-terminal", version)]
pub struct Args {
    /// OBJ mesh to display; a unit cube when omitted
    pub mesh: Option<PathBuf>,

    /// TOML file with render settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Vertical field of view in degrees
    #[arg(long)]
    pub fov: Option<f32>,

    #[arg(long)]
    pub near: Option<f32>,

    #[arg(long)]
    pub far: Option<f32>,

    /// Distance from the camera to the spinning mesh
    #[arg(long)]
    pub distance: Option<f32>,

    #[arg(long)]
    pub fps: Option<u32>,

    /// Fixed surface width in cells instead of the terminal width
    #[arg(long)]
    pub width: Option<u32>,

    /// Fixed surface height in cells instead of the terminal height
    #[arg(long)]
    pub height: Option<u32>,

    /// Tint triangles produced by clipping
    #[arg(long)]
    pub highlight_clipped: bool,

    /// Write log output to this file while the terminal is in use
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Configuration problems, reported before the terminal is touched
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("target_fps must be at least 1")]
    ZeroFrameRate,

    #[error("model_distance must be finite, got {0}")]
    InvalidDistance(f32),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Everything the terminal runtime needs to know up front
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub target_fps: u32,
    /// Fixed surface width; follows the terminal when unset
    pub width: Option<u32>,
    /// Fixed surface height; follows the terminal when unset
    pub height: Option<u32>,
    pub pipeline: PipelineConfig,
    pub scene: SceneConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            target_fps: 30,
            width: None,
            height: None,
            pipeline: PipelineConfig::default(),
            scene: SceneConfig::default(),
        }
    }
}

impl RenderConfig {
    /// Load configuration from TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// File settings (or defaults), then command-line overrides, then validation
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => {
                log::info!("Loading config from {}", path.display());
                Self::load(path)?
            }
            None => Self::default(),
        };
        config.apply_args(args);
        config.validate()?;
        Ok(config)
    }

    /// Overwrite values given on the command line
    pub fn apply_args(&mut self, args: &Args) {
        let projection = &mut self.pipeline.projection;
        if let Some(fov) = args.fov {
            projection.fov_degrees = fov;
        }
        if let Some(near) = args.near {
            projection.near = near;
        }
        if let Some(far) = args.far {
            projection.far = far;
        }
        if let Some(distance) = args.distance {
            self.scene.model_distance = distance;
        }
        if let Some(fps) = args.fps {
            self.target_fps = fps;
        }
        if args.width.is_some() {
            self.width = args.width;
        }
        if args.height.is_some() {
            self.height = args.height;
        }
        if args.highlight_clipped {
            self.pipeline.highlight_clipped = true;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_fps == 0 {
            return Err(ConfigError::ZeroFrameRate);
        }
        if !self.scene.model_distance.is_finite() {
            return Err(ConfigError::InvalidDistance(self.scene.model_distance));
        }

        let viewport = Viewport::new(
            self.width.unwrap_or(VALIDATION_VIEWPORT.0),
            self.height.unwrap_or(VALIDATION_VIEWPORT.1),
        )?;
        Pipeline::new(self.pipeline, viewport)?;
        Ok(())
    }

    /// Surface size pinned by configuration, if both sides are set
    pub fn fixed_size(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height)
    }

    pub fn frame_budget(&self) -> Duration {
        Duration::from_secs(1) / self.target_fps.max(1)
    }
}
