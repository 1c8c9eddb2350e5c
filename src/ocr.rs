//! Text recognition on the cropped plate.
//!
//! The pipeline only talks to [`OcrEngine`]. [`TesseractCli`] hands the crop
//! to tesseract through `rusty_tesseract`.

use image::{ GrayImage, ImageFormat };
use rusty_tesseract::{ Args, Image };
use tracing::debug;

use std::collections::HashMap;
use std::env;
use std::path::{ Path, PathBuf };

use crate::config::OcrConfig;
use crate::error::AnprError;

pub trait OcrEngine {
    /// Raw text found in `image`, untrimmed.
    fn recognize(&self, image: &GrayImage) -> Result<String, AnprError>;
}

pub struct TesseractCli {
    config: OcrConfig,
}

impl TesseractCli {

    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    /// Tesseract arguments for the configured page segmentation mode, language,
    /// engine mode and character whitelist.
    pub fn args(&self) -> Args {
        let config = &self.config;
        let mut config_variables = HashMap::new();
        if let Some(whitelist) = &config.char_whitelist {
            config_variables.insert("tessedit_char_whitelist".to_string(), whitelist.clone());
        }
        Args {
            lang: config.lang.clone().unwrap_or_else(|| "eng".to_string()),
            config_variables,
            psm: Some(config.psm as i32),
            oem: config.oem.map(|oem| oem as i32),
            ..Args::default()
        }
    }

    fn command(&self) -> String {
        self.config.tesseract_cmd.display().to_string()
    }
}

/// rusty_tesseract looks tesseract up in PATH, so an executable given with a
/// directory has that directory put in front of PATH.
pub fn ensure_on_path(cmd: &Path) -> Result<(), AnprError> {
    let dir = match cmd.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => return Ok(()),
    };
    if !cmd.is_file() {
        return Err(AnprError::ocr(cmd.display().to_string(), "executable not found"));
    }

    let current = env::var_os("PATH").unwrap_or_default();
    let mut paths: Vec<PathBuf> = env::split_paths(&current).collect();
    if paths.first().map(PathBuf::as_path) == Some(dir) {
        return Ok(());
    }
    paths.insert(0, dir.to_path_buf());
    let joined = env::join_paths(paths)
        .map_err(|e| AnprError::ocr(cmd.display().to_string(), e.to_string()))?;
    env::set_var("PATH", joined);
    debug!(dir = %dir.display(), "tesseract directory added to PATH");
    Ok(())
}

impl OcrEngine for TesseractCli {

    fn recognize(&self, image: &GrayImage) -> Result<String, AnprError> {
        let command = self.command();
        ensure_on_path(&self.config.tesseract_cmd)?;

        let input = tempfile::Builder::new()
            .prefix("anpr-plate-")
            .suffix(".png")
            .tempfile()?;
        image.save_with_format(input.path(), ImageFormat::Png)?;

        let tess_image = Image::from_path(input.path().to_path_buf())
            .map_err(|e| AnprError::ocr(command.as_str(), e.to_string()))?;
        let args = self.args();
        debug!(%command, psm = ?args.psm, lang = %args.lang, "running tesseract");
        rusty_tesseract::image_to_string(&tess_image, &args)
            .map_err(|e| AnprError::ocr(command, e.to_string()))
    }
}
