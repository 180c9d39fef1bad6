//! Drawing surface abstraction and annotation overlays
//!
//! [`Surface`] is a small path-based drawing API in screen space.
//! [`draw_overlays`] renders every polygon through it, and [`RasterSurface`]
//! implements it on an in-memory RGBA image.

use crate::annotation::AnnotationEngine;
use crate::types::{Point2D, Size};
use crate::view::ViewTransform;
use image::{GrayImage, Pixel, Rgba, RgbaImage};

pub const LABEL_COLOR: Rgba<u8> = Rgba([0x00, 0xff, 0x00, 0xff]);
pub const EDIT_COLOR: Rgba<u8> = Rgba([0xff, 0x00, 0x00, 0xff]);
pub const FIRST_VERTEX_COLOR: Rgba<u8> = Rgba([0xff, 0xa5, 0x00, 0xff]);
pub const BACKGROUND: Rgba<u8> = Rgba([0x00, 0x00, 0x00, 0xff]);

const FILL_ALPHA: u8 = 0x33;
const LINE_WIDTH: f64 = 2.0;
const VERTEX_RADIUS: f64 = 4.0;
const FIRST_VERTEX_RADIUS: f64 = 8.0;
const ARC_SEGMENTS: usize = 24;

pub trait Surface {
    /// Drawable area in screen pixels
    fn size(&self) -> Size;

    fn clear(&mut self);

    /// Paint the bitmap as seen through `view`
    fn draw_bitmap(&mut self, bitmap: &GrayImage, view: &ViewTransform);

    /// Start a new, empty path
    fn begin_path(&mut self);
    fn move_to(&mut self, point: Point2D);
    fn line_to(&mut self, point: Point2D);
    fn close_path(&mut self);
    /// Add a full circle to the path as its own closed sub-path
    fn arc(&mut self, center: Point2D, radius: f64);

    fn stroke(&mut self, color: Rgba<u8>, width: f64);
    fn fill(&mut self, color: Rgba<u8>);
}

fn translucent(color: Rgba<u8>) -> Rgba<u8> {
    let [r, g, b, _] = color.0;
    Rgba([r, g, b, FILL_ALPHA])
}

fn draw_polygon(surface: &mut dyn Surface, view: &ViewTransform, points: &[Point2D], editing: bool) {
    let Some((&first, rest)) = points.split_first() else {
        return;
    };
    let color = if editing { EDIT_COLOR } else { LABEL_COLOR };

    surface.begin_path();
    surface.move_to(view.image_to_screen(first));
    for &point in rest {
        surface.line_to(view.image_to_screen(point));
    }
    if !editing && points.len() >= 3 {
        surface.close_path();
    }
    surface.stroke(color, LINE_WIDTH);
    if points.len() > 2 {
        surface.fill(translucent(color));
    }

    if editing && points.len() >= 3 {
        surface.begin_path();
        surface.arc(view.image_to_screen(first), FIRST_VERTEX_RADIUS);
        surface.fill(FIRST_VERTEX_COLOR);
    }

    for &point in points {
        surface.begin_path();
        surface.arc(view.image_to_screen(point), VERTEX_RADIUS);
        surface.fill(color);
    }
}

/// Draw committed polygons and the one being drawn, in screen space
pub fn draw_overlays(surface: &mut dyn Surface, view: &ViewTransform, engine: &AnnotationEngine) {
    let editing = engine.editing_index();
    for (index, polygon) in engine.labels().iter().enumerate() {
        draw_polygon(surface, view, &polygon.points, editing == Some(index));
    }
    if let Some(points) = engine.drawing_points() {
        draw_polygon(surface, view, points, true);
    }
}

#[derive(Debug, Clone, Default)]
struct SubPath {
    points: Vec<Point2D>,
    closed: bool,
}

/// Software surface; screen point `(x, y)` is pixel `(x, y)` of the canvas
#[derive(Debug, Clone)]
pub struct RasterSurface {
    canvas: RgbaImage,
    path: Vec<SubPath>,
}

impl RasterSurface {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: RgbaImage::from_pixel(width, height, BACKGROUND),
            path: Vec::new(),
        }
    }

    #[must_use]
    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    #[must_use]
    pub fn into_canvas(self) -> RgbaImage {
        self.canvas
    }

    fn blend(&mut self, x: i64, y: i64, color: Rgba<u8>) {
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            return;
        };
        if x < self.canvas.width() && y < self.canvas.height() {
            self.canvas.get_pixel_mut(x, y).blend(&color);
        }
    }

    fn stamp(&mut self, x: i64, y: i64, color: Rgba<u8>, half_width: i64) {
        for dy in -half_width..=half_width {
            for dx in -half_width..=half_width {
                self.blend(x + dx, y + dy, color);
            }
        }
    }

    /// Bresenham segment, clipped to the canvas grown by the pen size
    fn segment(&mut self, from: Point2D, to: Point2D, color: Rgba<u8>, half_width: i64) {
        let margin = half_width as f64 + 1.0;
        let min = Point2D::new(-margin, -margin);
        let max = Point2D::new(
            f64::from(self.canvas.width()) + margin,
            f64::from(self.canvas.height()) + margin,
        );
        let Some((from, to)) = clip_segment(from, to, min, max) else {
            return;
        };
        let (mut x0, mut y0) = (from.x.round() as i64, from.y.round() as i64);
        let (x1, y1) = (to.x.round() as i64, to.y.round() as i64);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.stamp(x0, y0, color, half_width);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }
}

/// Liang-Barsky clip of `from..to` against the box `min..max`.
/// `None` when the segment misses the box or has a non-finite end.
fn clip_segment(from: Point2D, to: Point2D, min: Point2D, max: Point2D) -> Option<(Point2D, Point2D)> {
    let d = to - from;
    if !from.is_finite() || !to.is_finite() || !d.is_finite() {
        return None;
    }
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    for (p, q) in [
        (-d.x, from.x - min.x),
        (d.x, max.x - from.x),
        (-d.y, from.y - min.y),
        (d.y, max.y - from.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    let clipped_from = if t0 > 0.0 { from + d * t0 } else { from };
    let clipped_to = if t1 < 1.0 { from + d * t1 } else { to };
    Some((clipped_from, clipped_to))
}

impl Surface for RasterSurface {
    fn size(&self) -> Size {
        Size::new(f64::from(self.canvas.width()), f64::from(self.canvas.height()))
    }

    fn clear(&mut self) {
        for pixel in self.canvas.pixels_mut() {
            *pixel = BACKGROUND;
        }
        self.path.clear();
    }

    fn draw_bitmap(&mut self, bitmap: &GrayImage, view: &ViewTransform) {
        let (width, height) = (self.canvas.width(), self.canvas.height());
        for y in 0..height {
            for x in 0..width {
                let screen = Point2D::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                let image = view.screen_to_image(screen);
                if image.x < 0.0 || image.y < 0.0 {
                    continue;
                }
                // Nearest neighbour
                let (ix, iy) = (image.x as u32, image.y as u32);
                if ix < bitmap.width() && iy < bitmap.height() {
                    let gray = bitmap.get_pixel(ix, iy).0[0];
                    self.canvas.put_pixel(x, y, Rgba([gray, gray, gray, 0xff]));
                }
            }
        }
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, point: Point2D) {
        self.path.push(SubPath {
            points: vec![point],
            closed: false,
        });
    }

    fn line_to(&mut self, point: Point2D) {
        if let Some(sub) = self.path.last_mut().filter(|sub| !sub.closed) {
            sub.points.push(point);
        } else {
            self.move_to(point);
        }
    }

    fn close_path(&mut self) {
        if let Some(sub) = self.path.last_mut() {
            sub.closed = true;
        }
    }

    fn arc(&mut self, center: Point2D, radius: f64) {
        let points = (0..ARC_SEGMENTS)
            .map(|i| {
                let angle = std::f64::consts::TAU * i as f64 / ARC_SEGMENTS as f64;
                center + Point2D::new(angle.cos(), angle.sin()) * radius
            })
            .collect();
        self.path.push(SubPath { points, closed: true });
    }

    fn stroke(&mut self, color: Rgba<u8>, width: f64) {
        let half_width = ((width - 1.0) / 2.0).round().max(0.0) as i64;
        let path = std::mem::take(&mut self.path);

        for sub in &path {
            for pair in sub.points.windows(2) {
                self.segment(pair[0], pair[1], color, half_width);
            }
            if sub.closed
                && let (Some(&first), Some(&last)) = (sub.points.first(), sub.points.last())
            {
                self.segment(last, first, color, half_width);
            }
            if sub.points.len() == 1 {
                self.segment(sub.points[0], sub.points[0], color, half_width);
            }
        }
        self.path = path;
    }

    /// Even-odd scanline fill; every sub-path is treated as closed
    fn fill(&mut self, color: Rgba<u8>) {
        let edges: Vec<(Point2D, Point2D)> = self
            .path
            .iter()
            .filter(|sub| sub.points.len() >= 3 && sub.points.iter().all(Point2D::is_finite))
            .flat_map(|sub| {
                let n = sub.points.len();
                (0..n).map(move |i| (sub.points[i], sub.points[(i + 1) % n]))
            })
            .collect();
        if edges.is_empty() {
            return;
        }

        let (min_y, max_y) = edges.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (a, b)| {
            (lo.min(a.y).min(b.y), hi.max(a.y).max(b.y))
        });
        let first_row = min_y.floor().max(0.0) as i64;
        let last_row = max_y.ceil().min(f64::from(self.canvas.height())) as i64;

        let last_col = i64::from(self.canvas.width()) - 1;
        let mut crossings = Vec::new();
        for row in first_row..last_row {
            let y = row as f64 + 0.5;
            crossings.clear();
            for (a, b) in &edges {
                if (a.y <= y) != (b.y <= y) {
                    crossings.push(a.x + (y - a.y) / (b.y - a.y) * (b.x - a.x));
                }
            }
            crossings.sort_by(f64::total_cmp);

            for span in crossings.chunks_exact(2) {
                let start = ((span[0] - 0.5).ceil() as i64).max(0);
                let end = ((span[1] - 0.5).floor() as i64).min(last_col);
                for x in start..=end {
                    self.blend(x, row, color);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every call as text
    #[derive(Default)]
    struct RecordingSurface {
        ops: Vec<String>,
    }

    impl Surface for RecordingSurface {
        fn size(&self) -> Size {
            Size::new(100.0, 100.0)
        }
        fn clear(&mut self) {
            self.ops.push("clear".into());
        }
        fn draw_bitmap(&mut self, _bitmap: &GrayImage, _view: &ViewTransform) {
            self.ops.push("bitmap".into());
        }
        fn begin_path(&mut self) {
            self.ops.push("begin".into());
        }
        fn move_to(&mut self, p: Point2D) {
            self.ops.push(format!("move {p}"));
        }
        fn line_to(&mut self, p: Point2D) {
            self.ops.push(format!("line {p}"));
        }
        fn close_path(&mut self) {
            self.ops.push("close".into());
        }
        fn arc(&mut self, center: Point2D, radius: f64) {
            self.ops.push(format!("arc {center} r{radius}"));
        }
        fn stroke(&mut self, color: Rgba<u8>, _width: f64) {
            self.ops.push(format!("stroke {:?}", color.0));
        }
        fn fill(&mut self, color: Rgba<u8>) {
            self.ops.push(format!("fill {:?}", color.0));
        }
    }

    fn view() -> ViewTransform {
        ViewTransform::new(Point2D::ORIGIN, Size::new(100.0, 100.0))
    }

    fn triangle(engine: &mut AnnotationEngine) {
        engine.start_drawing().unwrap();
        for (x, y) in [(10.0, 10.0), (20.0, 10.0), (20.0, 20.0)] {
            engine.add_point(Point2D::new(x, y)).unwrap();
        }
        engine.finish_drawing().unwrap();
    }

    #[test]
    fn test_committed_polygon_is_closed_green() {
        let mut engine = AnnotationEngine::new();
        triangle(&mut engine);

        let mut surface = RecordingSurface::default();
        draw_overlays(&mut surface, &view(), &engine);

        assert_eq!(
            &surface.ops[..6],
            [
                "begin",
                "move (10.0, 10.0)",
                "line (20.0, 10.0)",
                "line (20.0, 20.0)",
                "close",
                "stroke [0, 255, 0, 255]",
            ]
        );
        assert_eq!(surface.ops[6], "fill [0, 255, 0, 51]");
        assert_eq!(surface.ops.iter().filter(|op| op.ends_with("r4")).count(), 3);
        assert!(!surface.ops.iter().any(|op| op.ends_with("r8")));
    }

    #[test]
    fn test_edited_polygon_is_open_red_with_marker() {
        let mut engine = AnnotationEngine::new();
        triangle(&mut engine);
        engine.start_editing(0).unwrap();

        let mut surface = RecordingSurface::default();
        draw_overlays(&mut surface, &view(), &engine);

        assert!(!surface.ops.contains(&"close".to_string()));
        assert!(surface.ops.contains(&"stroke [255, 0, 0, 255]".to_string()));
        assert!(surface.ops.contains(&"arc (10.0, 10.0) r8".to_string()));
        assert!(surface.ops.contains(&"fill [255, 165, 0, 255]".to_string()));
    }

    #[test]
    fn test_short_drawing_has_no_fill() {
        let mut engine = AnnotationEngine::new();
        engine.start_drawing().unwrap();
        engine.add_point(Point2D::new(1.0, 1.0)).unwrap();
        engine.add_point(Point2D::new(5.0, 1.0)).unwrap();

        let mut surface = RecordingSurface::default();
        draw_overlays(&mut surface, &view(), &engine);

        assert!(surface.ops.contains(&"stroke [255, 0, 0, 255]".to_string()));
        assert!(!surface.ops.iter().any(|op| op.starts_with("fill [255, 0, 0, 51]")));
    }

    #[test]
    fn test_raster_bitmap_is_scaled_nearest_neighbour() {
        let bitmap = GrayImage::from_raw(2, 2, vec![10, 20, 30, 40]).unwrap();
        let mut view = ViewTransform::new(Point2D::ORIGIN, Size::new(4.0, 4.0));
        view.set_image_size(Size::new(2.0, 2.0));

        let mut surface = RasterSurface::new(4, 4);
        surface.draw_bitmap(&bitmap, &view);

        assert_eq!(surface.canvas().get_pixel(0, 0).0, [10, 10, 10, 255]);
        assert_eq!(surface.canvas().get_pixel(3, 0).0, [20, 20, 20, 255]);
        assert_eq!(surface.canvas().get_pixel(1, 3).0, [30, 30, 30, 255]);
        assert_eq!(surface.canvas().get_pixel(3, 3).0, [40, 40, 40, 255]);
    }

    #[test]
    fn test_raster_stroke_and_fill() {
        let mut surface = RasterSurface::new(20, 20);
        surface.begin_path();
        surface.move_to(Point2D::new(2.0, 2.0));
        surface.line_to(Point2D::new(12.0, 2.0));
        surface.line_to(Point2D::new(12.0, 12.0));
        surface.line_to(Point2D::new(2.0, 12.0));
        surface.close_path();
        surface.stroke(LABEL_COLOR, 1.0);
        surface.fill(EDIT_COLOR);

        assert_eq!(surface.canvas().get_pixel(7, 2).0, [255, 0, 0, 255]);
        assert_eq!(surface.canvas().get_pixel(7, 7).0, [255, 0, 0, 255]);
        assert_eq!(surface.canvas().get_pixel(15, 15).0, BACKGROUND.0);

        surface.clear();
        assert_eq!(surface.canvas().get_pixel(7, 7).0, BACKGROUND.0);
    }

    #[test]
    fn test_far_away_vertices_are_clipped() {
        let mut surface = RasterSurface::new(8, 8);
        surface.begin_path();
        surface.move_to(Point2D::new(0.0, 1.0));
        surface.line_to(Point2D::new(2.0e8, 1.0));
        surface.line_to(Point2D::new(0.0, 7.0));
        surface.close_path();
        surface.fill(EDIT_COLOR);
        assert_eq!(surface.canvas().get_pixel(7, 4).0, EDIT_COLOR.0);
        assert_eq!(surface.canvas().get_pixel(3, 0).0, BACKGROUND.0);

        surface.clear();
        surface.begin_path();
        surface.move_to(Point2D::new(-1.0e12, 3.0));
        surface.line_to(Point2D::new(1.0e12, 3.0));
        surface.stroke(LABEL_COLOR, 1.0);
        for x in 0..8 {
            assert_eq!(surface.canvas().get_pixel(x, 3).0, LABEL_COLOR.0);
        }
        assert_eq!(surface.canvas().get_pixel(4, 2).0, BACKGROUND.0);
    }

    #[test]
    fn test_non_finite_edges_are_skipped() {
        let mut surface = RasterSurface::new(8, 8);
        surface.begin_path();
        surface.move_to(Point2D::new(0.0, 0.0));
        surface.line_to(Point2D::new(f64::INFINITY, 0.0));
        surface.line_to(Point2D::new(0.0, 5.0));
        surface.close_path();
        surface.stroke(LABEL_COLOR, 1.0);
        surface.fill(EDIT_COLOR);

        // Only the finite closing edge is drawn
        assert_eq!(surface.canvas().get_pixel(0, 3).0, LABEL_COLOR.0);
        assert_eq!(surface.canvas().get_pixel(2, 0).0, BACKGROUND.0);
        assert_eq!(surface.canvas().get_pixel(1, 1).0, BACKGROUND.0);
    }
}
