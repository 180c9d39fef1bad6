//! Mapping between screen space and image-pixel space
//!
//! The bitmap is drawn stretched over the display surface, so one surface
//! pixel covers `image_size / surface_size` image pixels at scale 1. Zoom and
//! pan act on top of that:
//!
//! ```text
//! image = ((screen - origin) / scale) * (image_size / surface_size) + offset
//! ```

use crate::types::{Point2D, Size};
use log::debug;

pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 10.0;
pub const ZOOM_IN_STEP: f64 = 1.1;
pub const ZOOM_OUT_STEP: f64 = 0.9;
/// Vertex hit radius, in image pixels
pub const DEFAULT_HIT_RADIUS: f64 = 10.0;

/// Named image position for directional jumps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    #[must_use]
    pub fn factor(self) -> f64 {
        match self {
            Self::In => ZOOM_IN_STEP,
            Self::Out => ZOOM_OUT_STEP,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewTransform {
    scale: f64,
    /// Image-space point shown at the surface origin
    offset: Point2D,
    surface_origin: Point2D,
    surface_size: Size,
    image_size: Size,
    /// Last pointer position of an active pan drag
    drag_last: Option<Point2D>,
}

impl ViewTransform {
    /// A transform for a surface showing an image of the same size
    #[must_use]
    pub fn new(surface_origin: Point2D, surface_size: Size) -> Self {
        Self {
            scale: 1.0,
            offset: Point2D::ORIGIN,
            surface_origin,
            surface_size,
            image_size: surface_size,
            drag_last: None,
        }
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[must_use]
    pub fn offset(&self) -> Point2D {
        self.offset
    }

    #[must_use]
    pub fn surface_origin(&self) -> Point2D {
        self.surface_origin
    }

    #[must_use]
    pub fn surface_size(&self) -> Size {
        self.surface_size
    }

    #[must_use]
    pub fn image_size(&self) -> Size {
        self.image_size
    }

    pub fn set_surface(&mut self, origin: Point2D, size: Size) {
        self.surface_origin = origin;
        self.surface_size = size;
    }

    pub fn set_image_size(&mut self, size: Size) {
        self.image_size = size;
    }

    /// Image pixels per surface pixel at scale 1, per axis
    fn ratio(&self) -> Point2D {
        if !self.surface_size.is_valid() || !self.image_size.is_valid() {
            return Point2D::new(1.0, 1.0);
        }
        Point2D::new(
            self.image_size.width / self.surface_size.width,
            self.image_size.height / self.surface_size.height,
        )
    }

    /// Portion of the image visible on the surface, in image pixels
    #[must_use]
    pub fn visible_extent(&self) -> Size {
        let ratio = self.ratio();
        Size::new(
            self.surface_size.width * ratio.x / self.scale,
            self.surface_size.height * ratio.y / self.scale,
        )
    }

    #[must_use]
    pub fn screen_to_image(&self, screen: Point2D) -> Point2D {
        let canvas = (screen - self.surface_origin) / self.scale;
        let ratio = self.ratio();
        Point2D::new(canvas.x * ratio.x, canvas.y * ratio.y) + self.offset
    }

    #[must_use]
    pub fn image_to_screen(&self, image: Point2D) -> Point2D {
        let ratio = self.ratio();
        let canvas = image - self.offset;
        Point2D::new(canvas.x / ratio.x, canvas.y / ratio.y) * self.scale + self.surface_origin
    }

    /// Zoom by `factor` keeping the image point under `cursor` in place.
    ///
    /// Rejected (returns `false`, nothing changes) when the new scale would
    /// leave `[MIN_SCALE, MAX_SCALE]`.
    pub fn zoom(&mut self, cursor: Point2D, factor: f64) -> bool {
        let new_scale = self.scale * factor;
        if !new_scale.is_finite() || !(MIN_SCALE..=MAX_SCALE).contains(&new_scale) {
            debug!("Zoom to {new_scale} rejected");
            return false;
        }
        self.zoom_to(cursor, new_scale);
        true
    }

    /// Step zoom anchored at the surface centre; the scale is clamped to the valid range
    pub fn zoom_step(&mut self, direction: ZoomDirection) -> bool {
        let new_scale = (self.scale * direction.factor()).clamp(MIN_SCALE, MAX_SCALE);
        if new_scale == self.scale {
            return false;
        }
        let center = self.surface_origin
            + Point2D::new(self.surface_size.width, self.surface_size.height) / 2.0;
        self.zoom_to(center, new_scale);
        true
    }

    fn zoom_to(&mut self, cursor: Point2D, new_scale: f64) {
        let anchor = self.screen_to_image(cursor);
        let ratio = self.ratio();
        let canvas = (cursor - self.surface_origin) / new_scale;

        self.scale = new_scale;
        self.offset = anchor - Point2D::new(canvas.x * ratio.x, canvas.y * ratio.y);
    }

    /// Move the view by a screen-space delta
    pub fn pan(&mut self, delta: Point2D) {
        let ratio = self.ratio();
        let canvas = delta / self.scale;
        self.offset = self.offset - Point2D::new(canvas.x * ratio.x, canvas.y * ratio.y);
    }

    pub fn begin_drag(&mut self, screen: Point2D) {
        self.drag_last = Some(screen);
    }

    /// Pan by the pointer movement since the last drag event; `false` when not dragging
    pub fn drag_to(&mut self, screen: Point2D) -> bool {
        let Some(last) = self.drag_last else {
            return false;
        };
        self.pan(screen - last);
        self.drag_last = Some(screen);
        true
    }

    pub fn end_drag(&mut self) {
        self.drag_last = None;
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag_last.is_some()
    }

    pub fn reset(&mut self) {
        self.scale = 1.0;
        self.offset = Point2D::ORIGIN;
    }

    /// Largest scale not above 1 at which the whole image is visible
    pub fn fit_to_surface(&mut self) {
        let ratio = self.ratio();
        let drawable = Size::new(self.surface_size.width * ratio.x, self.surface_size.height * ratio.y);
        let fit = (drawable.width / self.image_size.width).min(drawable.height / self.image_size.height);

        self.scale = if fit.is_finite() { fit.clamp(MIN_SCALE, 1.0) } else { 1.0 };
        self.offset = Point2D::ORIGIN;
    }

    /// Place the named image anchor at the matching spot of the visible surface
    pub fn jump_to(&mut self, anchor: Anchor) {
        let visible = self.visible_extent();
        let (image_w, image_h) = (self.image_size.width, self.image_size.height);

        self.offset = match anchor {
            Anchor::TopLeft => Point2D::ORIGIN,
            Anchor::TopRight => Point2D::new(image_w - visible.width, 0.0),
            Anchor::BottomLeft => Point2D::new(0.0, image_h - visible.height),
            Anchor::BottomRight => Point2D::new(image_w - visible.width, image_h - visible.height),
            Anchor::Center => Point2D::new(
                (image_w - visible.width) / 2.0,
                (image_h - visible.height) / 2.0,
            ),
        };
    }
}

/// Index of the first vertex strictly closer than `radius` to `point`
#[must_use]
pub fn hit_test_vertex(point: Point2D, vertices: &[Point2D], radius: f64) -> Option<usize> {
    vertices.iter().position(|v| v.distance_to(point) < radius)
}
