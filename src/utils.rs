use image::{ DynamicImage, GrayImage };
use imageproc::point::Point;
use imageproc::rect::Rect;
use tracing::{ debug, warn };

use std::fs;
use std::path::Path;

use crate::error::AnprError;

/// Open one window per image and block until every window is closed.
#[cfg(feature = "display-window")]
pub fn display_images(titles: &[&str], images: &[&DynamicImage]) {
    use imageproc::window;

    let images: Vec<image::RgbaImage> = images.iter().map(|img| img.to_rgba8()).collect();
    let refs: Vec<&image::RgbaImage> = images.iter().collect();
    let (width, height) = images.iter().fold((0, 0), |(w, h), img| {
        (w.max(img.width()), h.max(img.height()))
    });
    let title = titles.join(" | ");
    window::display_multiple_images(&title, &refs, width.clamp(150, 900), height.clamp(150, 700));
}

#[cfg(not(feature = "display-window"))]
pub fn display_images(_titles: &[&str], _images: &[&DynamicImage]) {
    warn!("built without the display-window feature, not showing images");
}

/// Write each image as `<name>.png` into `dir`, creating it if needed.
pub fn save_debug_images(dir: impl AsRef<Path>, images: &[(&str, &DynamicImage)]) -> Result<(), AnprError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    for (name, img) in images {
        let path = dir.join(format!("{}.png", name));
        img.save(&path)?;
        debug!(path = %path.display(), "wrote debug image");
    }
    Ok(())
}

/// Drop the interior points of straight runs, keeping only the points where
/// the walking direction changes. The contour is treated as closed.
pub fn compress_chain(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let len = points.len();
    if len <= 2 {
        return points.to_vec();
    }
    let step = |from: Point<i32>, to: Point<i32>| ((to.x - from.x).signum(), (to.y - from.y).signum());

    let compressed: Vec<Point<i32>> = (0..len).filter(|&i| {
        let prev = points[(i + len - 1) % len];
        let current = points[i];
        let next = points[(i + 1) % len];
        step(prev, current) != step(current, next)
    }).map(|i| points[i]).collect();

    if compressed.is_empty() {
        points.to_vec()
    } else {
        compressed
    }
}

/// Area enclosed by a closed polygon (shoelace formula), always non-negative.
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let doubled: i64 = points.iter().zip(points.iter().cycle().skip(1)).map(|(a, b)| {
        a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64
    }).sum();
    doubled.abs() as f64 / 2.0
}

/// Smallest axis-aligned rectangle containing every point, pixel inclusive.
pub fn bounding_rect(points: &[Point<i32>]) -> Option<Rect> {
    let first = points.first()?;
    let (min_x, min_y, max_x, max_y) = points.iter().fold(
        (first.x, first.y, first.x, first.y),
        |(min_x, min_y, max_x, max_y), p| (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y)),
    );
    let width = (max_x - min_x + 1) as u32;
    let height = (max_y - min_y + 1) as u32;
    Some(Rect::at(min_x, min_y).of_size(width, height))
}

/// Restrict `rect` to an image of the given size. `None` when nothing is left.
pub fn clamp_rect(rect: Rect, width: u32, height: u32) -> Option<Rect> {
    if width == 0 || height == 0 {
        return None;
    }
    rect.intersect(Rect::at(0, 0).of_size(width, height))
}

pub fn gray_to_dynamic(img: &GrayImage) -> DynamicImage {
    DynamicImage::ImageLuma8(img.clone())
}
