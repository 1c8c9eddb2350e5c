//! Pipeline configuration, loadable from TOML.
//!
//! Every section carries `#[serde(default)]` so a config file only needs the
//! keys it wants to change.

use serde::{ Deserialize, Serialize };

use std::path::{ Path, PathBuf };

use crate::error::AnprError;

pub const DEFAULT_BILATERAL_DIAMETER: u32 = 11;
pub const DEFAULT_BILATERAL_SIGMA_COLOR: f32 = 17.0;
pub const DEFAULT_BILATERAL_SIGMA_SPACE: f32 = 17.0;
pub const DEFAULT_CANNY_LOW: f32 = 30.0;
pub const DEFAULT_CANNY_HIGH: f32 = 200.0;
/// how many of the largest contours are tried as plate candidates
pub const DEFAULT_MAX_CANDIDATES: usize = 10;
/// polygon approximation tolerance, as a fraction of the contour perimeter
pub const DEFAULT_APPROX_EPSILON_RATIO: f64 = 0.018;
/// tesseract "treat the image as a single word"
pub const DEFAULT_PSM: u8 = 8;
pub const DEFAULT_TESSERACT_CMD: &str = "tesseract";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnprConfig {
    pub detection: DetectionConfig,
    pub ocr: OcrConfig,
    pub debug: DebugConfig,
}

/// Parameters of the filter / edge / contour stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Diameter of the bilateral filter window in pixels
    pub bilateral_diameter: u32,
    pub bilateral_sigma_color: f32,
    pub bilateral_sigma_space: f32,
    pub canny_low: f32,
    pub canny_high: f32,
    pub max_candidates: usize,
    pub approx_epsilon_ratio: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            bilateral_diameter: DEFAULT_BILATERAL_DIAMETER,
            bilateral_sigma_color: DEFAULT_BILATERAL_SIGMA_COLOR,
            bilateral_sigma_space: DEFAULT_BILATERAL_SIGMA_SPACE,
            canny_low: DEFAULT_CANNY_LOW,
            canny_high: DEFAULT_CANNY_HIGH,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            approx_epsilon_ratio: DEFAULT_APPROX_EPSILON_RATIO,
        }
    }
}

/// How the tesseract executable is invoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Path of the tesseract executable, looked up in PATH when bare
    pub tesseract_cmd: PathBuf,
    /// Page segmentation mode
    pub psm: u8,
    /// Language pack, e.g. "eng"
    pub lang: Option<String>,
    /// OCR engine mode
    pub oem: Option<u8>,
    /// Restrict recognized characters, e.g. "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789"
    pub char_whitelist: Option<String>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_cmd: PathBuf::from(DEFAULT_TESSERACT_CMD),
            psm: DEFAULT_PSM,
            lang: None,
            oem: None,
            char_whitelist: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Show the intermediate images in windows (needs the `display-window` feature)
    pub display: bool,
    /// Write the intermediate images into this directory
    pub dump_dir: Option<PathBuf>,
}

/// Load configuration from file
pub fn load_config(path: impl AsRef<Path>) -> Result<AnprConfig, AnprError> {
    let content = std::fs::read_to_string(path)?;
    let config: AnprConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AnprConfig, path: impl AsRef<Path>) -> Result<(), AnprError> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
