use image::ImageError;
use toml::de::Error as TomlError;
use toml::ser::Error as TomlSerError;

use std::error::Error;
use std::fmt;
use std::io::Error as IOError;

#[derive(Debug)]
pub struct AnprError(AnprErrorKind);

#[derive(Debug)]
pub enum AnprErrorKind {
    IOError(IOError),
    ImageError(ImageError),
    ConfigError(TomlError),
    ConfigSerializeError(TomlSerError),
    /// the OCR engine could not be run or reported a failure
    OcrError { command: String, detail: String },
}

impl AnprError {
    pub fn kind(&self) -> &AnprErrorKind {
        &self.0
    }

    pub fn ocr(command: impl Into<String>, detail: impl Into<String>) -> Self {
        Self(AnprErrorKind::OcrError { command: command.into(), detail: detail.into() })
    }
}

impl<T> From<T> for AnprError
where T: Into<AnprErrorKind>
{
    fn from(e: T) -> Self {
        Self(e.into())
    }
}

impl fmt::Display for AnprError {

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            AnprErrorKind::IOError(e) => e.fmt(f),
            AnprErrorKind::ImageError(e) => e.fmt(f),
            AnprErrorKind::ConfigError(e) => write!(f, "invalid config: {}", e),
            AnprErrorKind::ConfigSerializeError(e) => e.fmt(f),
            AnprErrorKind::OcrError { command, detail } => write!(f, "ocr failed ({}): {}", command, detail),
        }
    }
}

impl Error for AnprError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self.kind() {
            AnprErrorKind::IOError(e) => Some(e),
            AnprErrorKind::ImageError(e) => Some(e),
            AnprErrorKind::ConfigError(e) => Some(e),
            AnprErrorKind::ConfigSerializeError(e) => Some(e),
            AnprErrorKind::OcrError { .. } => None,
        }
    }
}

impl From<IOError> for AnprErrorKind {
    fn from(e: IOError) -> Self {
        Self::IOError(e)
    }
}

impl From<ImageError> for AnprErrorKind {
    fn from(e: ImageError) -> Self {
        Self::ImageError(e)
    }
}

impl From<TomlError> for AnprErrorKind {
    fn from(e: TomlError) -> Self {
        Self::ConfigError(e)
    }
}

impl From<TomlSerError> for AnprErrorKind {
    fn from(e: TomlSerError) -> Self {
        Self::ConfigSerializeError(e)
    }
}
