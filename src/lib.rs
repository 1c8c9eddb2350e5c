use image::{ DynamicImage, GrayImage };
use tracing::{ debug, info, warn };

use std::path::Path;

use config::{ AnprConfig, DebugConfig, DetectionConfig };
use error::AnprError;
use image_process::PlateRegion;
use ocr::{ OcrEngine, TesseractCli };

pub mod config;
pub mod error;
pub mod image_process;
pub mod ocr;
pub mod utils;


/// Outcome of one recognition run. `text` is empty and `region` is `None`
/// when no plate-shaped region was found.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    pub text: String,
    pub region: Option<PlateRegion>,
}

impl Recognition {
    pub fn not_detected() -> Self {
        Self { text: String::new(), region: None }
    }

    pub fn is_detected(&self) -> bool {
        self.region.is_some()
    }
}

pub struct Anpr<E = TesseractCli> {
    detection: DetectionConfig,
    debug: DebugConfig,
    ocr: E,
}

impl Anpr<TesseractCli> {

    /// Pipeline reading plates with the tesseract executable named in `config.ocr`.
    pub fn new(config: AnprConfig) -> Self {
        let AnprConfig { detection, ocr, debug } = config;
        Self { detection, debug, ocr: TesseractCli::new(ocr) }
    }
}

impl<E: OcrEngine> Anpr<E> {

    pub fn with_engine(detection: DetectionConfig, debug: DebugConfig, ocr: E) -> Self {
        Self { detection, debug, ocr }
    }

    pub fn engine(&self) -> &E {
        &self.ocr
    }

    /// Decode the image at `path` and recognize it
    pub fn recognize_path(&self, path: impl AsRef<Path>) -> Result<Recognition, AnprError> {
        let path = path.as_ref();
        let img = image::open(path)?;
        debug!(path = %path.display(), "image loaded");
        self.recognize(&img)
    }

    /// Recognize one image
    pub fn recognize(&self, img: &DynamicImage) -> Result<Recognition, AnprError> {
        let gray = img.to_luma8();
        debug!(width = gray.width(), height = gray.height(), "grayscale ready");

        let (region, edge_map) = image_process::locate_plate(&gray, &self.detection);
        let region = match region {
            Some(region) => region,
            None => {
                warn!("license plate not detected");
                self.show_debug(img, &gray, &edge_map, None)?;
                return Ok(Recognition::not_detected());
            }
        };

        let cropped = image_process::crop_plate(&gray, &region);
        let text = self.ocr.recognize(&cropped)?.trim().to_string();
        info!(text = %text, bounds = ?region.bounds, "license plate text");

        self.show_debug(img, &gray, &edge_map, Some((&region, &cropped)))?;
        Ok(Recognition { text, region: Some(region) })
    }

    fn show_debug(
        &self,
        img: &DynamicImage,
        gray: &GrayImage,
        edge_map: &GrayImage,
        plate: Option<(&PlateRegion, &GrayImage)>,
    ) -> Result<(), AnprError> {
        let debug = &self.debug;
        if !debug.display && debug.dump_dir.is_none() {
            return Ok(());
        }

        let original = match plate {
            Some((region, _)) => DynamicImage::ImageRgba8(image_process::highlight_plate(img, region)),
            None => img.clone(),
        };
        let gray = utils::gray_to_dynamic(gray);
        let edges = utils::gray_to_dynamic(edge_map);
        let cropped = plate.map(|(_, cropped)| utils::gray_to_dynamic(cropped));

        if let Some(dir) = &debug.dump_dir {
            let mut images = vec![("original", &original), ("grayscale", &gray), ("edges", &edges)];
            if let Some(cropped) = &cropped {
                images.push(("cropped", cropped));
            }
            utils::save_debug_images(dir, &images)?;
        }

        if debug.display {
            let mut titles = vec!["Original Image", "Grayscale Image"];
            let mut images = vec![&original, &gray];
            if let Some(cropped) = &cropped {
                titles.push("Cropped License Plate");
                images.push(cropped);
            }
            utils::display_images(&titles, &images);
        }
        Ok(())
    }
}
