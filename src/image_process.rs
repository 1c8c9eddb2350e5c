//! Classical plate localisation: smoothing, edges, contours and the
//! search for the largest four-cornered contour.

use image::{ DynamicImage, GrayImage, Rgba, RgbaImage, imageops };
use imageproc::contours::find_contours;
use imageproc::point::Point;
use imageproc::rect::Rect;
use imageproc::{ drawing, edges, filter, geometry };
use tracing::{ debug, trace };

use std::cmp::Ordering;

use crate::config::DetectionConfig;
use crate::utils;

/// A contour in compressed form together with the area it encloses.
#[derive(Debug, Clone)]
pub struct PlateContour {
    pub points: Vec<Point<i32>>,
    pub area: f64,
}

/// The region chosen as the plate.
#[derive(Debug, Clone, PartialEq)]
pub struct PlateRegion {
    /// The four corners of the approximated polygon, in contour order
    pub corners: Vec<Point<i32>>,
    /// Area of the contour the corners were approximated from
    pub area: f64,
    /// Axis-aligned bounds of `corners`, clamped to the image
    pub bounds: Rect,
}

/// Edge-preserving smoothing ahead of edge detection.
pub fn smooth(gray: &GrayImage, config: &DetectionConfig) -> GrayImage {
    // imageproc takes the full side length of the square window
    let window_size = config.bilateral_diameter.max(1);
    filter::bilateral_filter(gray, window_size, config.bilateral_sigma_color, config.bilateral_sigma_space)
}

pub fn detect_edges(smoothed: &GrayImage, config: &DetectionConfig) -> GrayImage {
    edges::canny(smoothed, config.canny_low, config.canny_high)
}

/// All contours of the edge map, largest enclosed area first, at most `max_candidates`.
/// Ties keep the order in which the contours were traced.
pub fn candidate_contours(edge_map: &GrayImage, max_candidates: usize) -> Vec<PlateContour> {
    let contours = find_contours::<i32>(edge_map);
    debug!(count = contours.len(), "contours found");

    let mut candidates: Vec<PlateContour> = contours.into_iter().map(|contour| {
        let points = utils::compress_chain(&contour.points);
        let area = utils::contour_area(&points);
        PlateContour { points, area }
    }).collect();
    candidates.sort_by(|a, b| b.area.partial_cmp(&a.area).unwrap_or(Ordering::Equal));
    candidates.truncate(max_candidates);
    candidates
}

/// Douglas-Peucker on a closed contour. The curve is split at the point
/// farthest from the first one and each half is approximated as an open curve.
pub fn approximate_closed(points: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    let start = match points.first() {
        Some(p) => *p,
        None => return Vec::new(),
    };
    let distance = |p: &Point<i32>| {
        let dx = (p.x - start.x) as i64;
        let dy = (p.y - start.y) as i64;
        dx * dx + dy * dy
    };
    let far = points.iter().enumerate().fold((0, 0), |(best, best_d), (i, p)| {
        let d = distance(p);
        if d > best_d { (i, d) } else { (best, best_d) }
    }).0;
    if far == 0 {
        return vec![start];
    }

    let mut head = geometry::approximate_polygon_dp(&points[..=far], epsilon, false);
    let mut closing = points[far..].to_vec();
    closing.push(start);
    let mut tail = geometry::approximate_polygon_dp(&closing, epsilon, false);

    // `far` opens the tail and `start` closes it
    head.pop();
    tail.pop();
    head.append(&mut tail);
    head
}

/// Walk the candidates in order and keep the first whose polygon has exactly four corners.
pub fn select_plate(
    candidates: &[PlateContour],
    epsilon_ratio: f64,
    image_size: (u32, u32),
) -> Option<PlateRegion> {
    for (rank, candidate) in candidates.iter().enumerate() {
        if candidate.points.len() < 4 {
            continue;
        }
        let epsilon = epsilon_ratio * geometry::arc_length(&candidate.points, true);
        // no tolerance keeps every point of the compressed contour
        let corners = if epsilon > 0.0 {
            approximate_closed(&candidate.points, epsilon)
        } else {
            candidate.points.clone()
        };
        trace!(rank, vertices = corners.len(), area = candidate.area, "approximated candidate");
        if corners.len() != 4 {
            continue;
        }
        let bounds = utils::bounding_rect(&corners)
            .and_then(|rect| utils::clamp_rect(rect, image_size.0, image_size.1));
        if let Some(bounds) = bounds {
            debug!(rank, area = candidate.area, ?bounds, "plate candidate selected");
            return Some(PlateRegion { corners, area: candidate.area, bounds });
        }
    }
    None
}

/// Full localisation on a grayscale image. Returns the edge map as well so
/// callers can inspect it.
pub fn locate_plate(gray: &GrayImage, config: &DetectionConfig) -> (Option<PlateRegion>, GrayImage) {
    let smoothed = smooth(gray, config);
    let edge_map = detect_edges(&smoothed, config);
    let candidates = candidate_contours(&edge_map, config.max_candidates);
    let region = select_plate(&candidates, config.approx_epsilon_ratio, gray.dimensions());
    (region, edge_map)
}

/// Cut the plate bounds out of the grayscale image.
pub fn crop_plate(gray: &GrayImage, region: &PlateRegion) -> GrayImage {
    let bounds = region.bounds;
    imageops::crop_imm(gray, bounds.left() as u32, bounds.top() as u32, bounds.width(), bounds.height()).to_image()
}

/// Copy of `img` with the plate polygon filled in white.
pub fn highlight_plate(img: &DynamicImage, region: &PlateRegion) -> RgbaImage {
    let mut canvas = img.to_rgba8();
    let corners = &region.corners;
    if corners.len() >= 3 && corners.first() != corners.last() {
        drawing::draw_polygon_mut(&mut canvas, corners, Rgba([255, 255, 255, 255]));
    }
    canvas
}


#[cfg(test)]
mod test {

    use image::{ GrayImage, Luma };
    use imageproc::drawing::{ draw_filled_rect_mut, draw_hollow_rect_mut };
    use imageproc::point::Point;
    use imageproc::rect::Rect;

    use std::f64::consts::PI;

    use super::*;
    use crate::config::DetectionConfig;

    fn hollow_rect_edges(width: u32, height: u32, rect: Rect) -> GrayImage {
        let mut img = GrayImage::new(width, height);
        draw_hollow_rect_mut(&mut img, rect, Luma([255]));
        img
    }

    fn circle_contour(cx: f64, cy: f64, r: f64) -> PlateContour {
        let points: Vec<Point<i32>> = (0..360).map(|deg| {
            let t = deg as f64 * PI / 180.0;
            Point::new((cx + r * t.cos()).round() as i32, (cy + r * t.sin()).round() as i32)
        }).collect();
        let points = crate::utils::compress_chain(&points);
        let area = crate::utils::contour_area(&points);
        PlateContour { points, area }
    }

    #[test]
    fn candidates_are_sorted_by_area_and_truncated() {
        let mut img = GrayImage::new(200, 120);
        draw_hollow_rect_mut(&mut img, Rect::at(10, 10).of_size(30, 20), Luma([255]));
        draw_hollow_rect_mut(&mut img, Rect::at(60, 10).of_size(100, 60), Luma([255]));
        draw_hollow_rect_mut(&mut img, Rect::at(10, 80).of_size(50, 30), Luma([255]));

        let all = candidate_contours(&img, 10);
        assert!(all.len() >= 3);
        assert!(all.windows(2).all(|w| w[0].area >= w[1].area));

        let top = candidate_contours(&img, 2);
        assert_eq!(top.len(), 2);
        assert!(top[0].area > 99.0 * 59.0 - 1.0);
    }

    #[test]
    fn approximation_of_rectangle_has_four_corners() {
        let img = hollow_rect_edges(100, 60, Rect::at(20, 10).of_size(60, 30));
        let candidates = candidate_contours(&img, 10);
        let largest = &candidates[0];
        let epsilon = 0.018 * geometry::arc_length(&largest.points, true);
        let corners = approximate_closed(&largest.points, epsilon);
        assert_eq!(corners.len(), 4);
        assert!(corners.contains(&Point::new(20, 10)));
        assert!(corners.contains(&Point::new(79, 39)));
    }

    #[test]
    fn selects_rectangle_bounds() {
        let img = hollow_rect_edges(100, 60, Rect::at(20, 10).of_size(60, 30));
        let candidates = candidate_contours(&img, 10);
        let region = select_plate(&candidates, 0.018, (100, 60)).expect("rectangle should be found");
        assert_eq!(region.bounds, Rect::at(20, 10).of_size(60, 30));
        assert_eq!(region.corners.len(), 4);
    }

    #[test]
    fn circle_is_not_a_plate() {
        let candidates = vec![circle_contour(50.0, 50.0, 40.0)];
        assert!(select_plate(&candidates, 0.018, (100, 100)).is_none());
    }

    #[test]
    fn larger_tolerance_changes_selection() {
        // once the tolerance exceeds the radius only the diameter is left
        let candidates = vec![circle_contour(50.0, 50.0, 40.0)];
        let fine = approximate_closed(&candidates[0].points, 0.018 * geometry::arc_length(&candidates[0].points, true));
        let coarse = approximate_closed(&candidates[0].points, 0.2 * geometry::arc_length(&candidates[0].points, true));
        assert!(fine.len() > 4);
        assert!(coarse.len() < fine.len());
    }

    #[test]
    fn empty_candidates_select_nothing() {
        let img = hollow_rect_edges(100, 60, Rect::at(20, 10).of_size(60, 30));
        assert!(select_plate(&[], 0.018, (100, 60)).is_none());
        assert!(candidate_contours(&img, 0).is_empty());
    }

    #[test]
    fn zero_tolerance_keeps_compressed_corners() {
        let img = hollow_rect_edges(100, 60, Rect::at(20, 10).of_size(60, 30));
        let candidates = candidate_contours(&img, 10);
        let region = select_plate(&candidates, 0.0, (100, 60)).expect("rectangle should be found");
        assert_eq!(region.bounds, Rect::at(20, 10).of_size(60, 30));
    }

    #[test]
    fn tolerance_decides_which_candidate_wins() {
        // a rectangle whose top edge bends up by 15 px, larger than the plain one next to it
        let bent = vec![
            Point::new(0, 20), Point::new(100, 5), Point::new(200, 20), Point::new(200, 120), Point::new(0, 120),
        ];
        let plain = vec![Point::new(300, 10), Point::new(340, 10), Point::new(340, 30), Point::new(300, 30)];
        let candidates: Vec<PlateContour> = vec![bent, plain].into_iter().map(|points| {
            let area = crate::utils::contour_area(&points);
            PlateContour { points, area }
        }).collect();
        assert!(candidates[0].area > candidates[1].area);

        let fine = select_plate(&candidates, 0.018, (400, 200)).expect("plain rectangle should be found");
        assert_eq!(fine.bounds, Rect::at(300, 10).of_size(41, 21));

        let coarse = select_plate(&candidates, 0.05, (400, 200)).expect("bent rectangle should be found");
        assert_eq!(coarse.bounds, Rect::at(0, 20).of_size(201, 101));
        assert!(!coarse.corners.contains(&Point::new(100, 5)));
    }

    #[test]
    fn smoothing_window_spans_the_full_diameter() {
        let mut gray = GrayImage::new(40, 20);
        for (x, _, pixel) in gray.enumerate_pixels_mut() {
            if x >= 10 {
                *pixel = Luma([10]);
            }
        }
        let smoothed = smooth(&gray, &DetectionConfig::default());
        // 4 px left of the step is still inside an 11 px window
        assert!(smoothed.get_pixel(6, 10).0[0] > 0);
        assert_eq!(smoothed.get_pixel(3, 10).0[0], 0);
    }

    #[test]
    fn locate_filled_rectangle() {
        let mut gray = GrayImage::new(240, 160);
        draw_filled_rect_mut(&mut gray, Rect::at(60, 50).of_size(120, 50), Luma([255]));

        let (region, edge_map) = locate_plate(&gray, &DetectionConfig::default());
        assert_eq!(edge_map.dimensions(), (240, 160));
        let bounds = region.expect("plate should be located").bounds;
        assert!(bounds.width() > 0 && bounds.height() > 0);
        assert!(bounds.right() < 240 && bounds.bottom() < 160);
        assert!((bounds.left() - 60).abs() <= 4, "left {}", bounds.left());
        assert!((bounds.top() - 50).abs() <= 4, "top {}", bounds.top());
        assert!((bounds.right() - 179).abs() <= 4, "right {}", bounds.right());
        assert!((bounds.bottom() - 99).abs() <= 4, "bottom {}", bounds.bottom());
    }

    #[test]
    fn crop_uses_region_bounds() {
        let mut gray = GrayImage::new(50, 40);
        draw_filled_rect_mut(&mut gray, Rect::at(10, 5).of_size(20, 10), Luma([255]));
        let region = PlateRegion {
            corners: vec![Point::new(10, 5), Point::new(29, 5), Point::new(29, 14), Point::new(10, 14)],
            area: 171.0,
            bounds: Rect::at(10, 5).of_size(20, 10),
        };
        let crop = crop_plate(&gray, &region);
        assert_eq!(crop.dimensions(), (20, 10));
        assert!(crop.pixels().all(|p| p.0[0] == 255));

        let highlighted = highlight_plate(&image::DynamicImage::ImageLuma8(GrayImage::new(50, 40)), &region);
        assert_eq!(highlighted.get_pixel(15, 8).0, [255, 255, 255, 255]);
        assert_eq!(highlighted.get_pixel(40, 30).0, [0, 0, 0, 255]);
    }
}
