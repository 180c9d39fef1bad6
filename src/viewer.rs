//! One viewing session: the loaded file, its window, view and annotations
//!
//! All state changes happen through [`Viewer`] on the caller's thread. Only
//! bitmap construction runs elsewhere (see [`ImageRenderer`]). Recoverable
//! problems are logged and forwarded to the [`Notifier`] before being
//! returned.

use crate::annotation::{AnnotationEngine, AnnotationError, ClickOutcome};
use crate::collab::{ByteSource, ConfirmPrompt, Notifier};
use crate::dicom::{self, DicomImage, LoadError};
use crate::image::{DecodedImage, ImageRenderer, Preset, RenderError, map_to_gray};
use crate::overlay::{Surface, draw_overlays};
use crate::types::{Point2D, Size, WindowSettings};
use crate::view::{DEFAULT_HIT_RADIUS, ViewTransform, hit_test_vertex};
use log::{info, warn};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("Failed to read {name}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Annotation(#[from] AnnotationError),

    #[error("No image loaded")]
    NoImage,

    #[error("Window width must be positive (got {0})")]
    InvalidWindowWidth(f64),
}

/// Runtime tunables
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerConfig {
    pub surface_origin: Point2D,
    pub surface_size: Size,
    /// Vertex hit and polygon-closing radius, image pixels
    pub hit_radius: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            surface_origin: Point2D::ORIGIN,
            surface_size: Size::new(512.0, 512.0),
            hit_radius: DEFAULT_HIT_RADIUS,
        }
    }
}

pub struct Viewer {
    config: ViewerConfig,
    image: Option<DicomImage>,
    window: WindowSettings,
    renderer: ImageRenderer,
    view: ViewTransform,
    annotations: AnnotationEngine,
    notifier: Box<dyn Notifier>,
    confirm: Box<dyn ConfirmPrompt>,
    /// (label, vertex) being dragged in editing mode
    vertex_drag: Option<(usize, usize)>,
}

impl Viewer {
    #[must_use]
    pub fn new(config: ViewerConfig, notifier: Box<dyn Notifier>, confirm: Box<dyn ConfirmPrompt>) -> Self {
        Self {
            config,
            image: None,
            window: WindowSettings::default(),
            renderer: ImageRenderer::new(),
            view: ViewTransform::new(config.surface_origin, config.surface_size),
            annotations: AnnotationEngine::new(),
            notifier,
            confirm,
            vertex_drag: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    #[must_use]
    pub fn image(&self) -> Option<&DicomImage> {
        self.image.as_ref()
    }

    #[must_use]
    pub fn window(&self) -> &WindowSettings {
        &self.window
    }

    #[must_use]
    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    /// Zoom and pan changes need no re-render, only a new [`Self::compose`]
    pub fn view_mut(&mut self) -> &mut ViewTransform {
        &mut self.view
    }

    #[must_use]
    pub fn annotations(&self) -> &AnnotationEngine {
        &self.annotations
    }

    #[must_use]
    pub fn bitmap(&self) -> Option<Arc<DecodedImage>> {
        self.renderer.current()
    }

    #[must_use]
    pub fn render_generation(&self) -> u64 {
        self.renderer.generation()
    }

    fn report<T, E>(&self, result: Result<T, E>) -> Result<T, ViewerError>
    where
        E: Into<ViewerError>,
    {
        result.map_err(|e| {
            let e = e.into();
            warn!("{e}");
            self.notifier.notify(&e.to_string());
            e
        })
    }

    /// Load a file, replacing the current one only on success.
    ///
    /// # Errors
    ///
    /// Read or [`LoadError`] failures; the previous image, window, view and
    /// annotations are left untouched.
    pub fn load(&mut self, source: &dyn ByteSource) -> Result<(), ViewerError> {
        let name = source.describe();
        let bytes = self.report(
            source
                .read_bytes()
                .map_err(|source| ViewerError::Read { name: name.clone(), source }),
        )?;
        let image = self.report(dicom::load_from_bytes(&bytes))?;

        info!("Opened {name}");
        self.install(image)
    }

    /// Make `image` the current one and reset everything derived from the previous file
    ///
    /// # Errors
    ///
    /// Failure to start the initial render.
    pub fn install(&mut self, image: DicomImage) -> Result<(), ViewerError> {
        self.renderer.invalidate();
        self.window = image.default_window;
        self.view.reset();
        self.view.end_drag();
        self.view.set_image_size(image.size());
        self.annotations.clear();
        self.vertex_drag = None;
        self.image = Some(image);

        self.request_render().map(|_| ())
    }

    /// Re-map the samples with the current window and start building the bitmap
    ///
    /// # Errors
    ///
    /// [`ViewerError::NoImage`] or a worker spawn failure.
    pub fn request_render(&mut self) -> Result<u64, ViewerError> {
        let image = self.image.as_ref().ok_or(ViewerError::NoImage)?;
        let gray = map_to_gray(&image.samples, &image.photometric, &self.window);
        let (width, height) = (u32::from(image.cols()), u32::from(image.rows()));

        let submitted = self.renderer.submit(width, height, gray);
        self.report(submitted)
    }

    /// Non-blocking check for a finished bitmap; failures are reported and the
    /// previous bitmap stays on display
    pub fn poll_render(&mut self) -> Option<Arc<DecodedImage>> {
        let polled = self.renderer.poll();
        self.report(polled).ok().flatten()
    }

    /// Block until the latest render is done
    ///
    /// # Errors
    ///
    /// [`RenderError`] of the latest request.
    pub fn wait_render(&mut self) -> Result<Option<Arc<DecodedImage>>, ViewerError> {
        let waited = self.renderer.wait_latest();
        self.report(waited)
    }

    fn set_window(&mut self, window: WindowSettings) -> Result<(), ViewerError> {
        if self.image.is_none() {
            return Err(ViewerError::NoImage);
        }
        self.window = window;
        self.request_render().map(|_| ())
    }

    /// # Errors
    ///
    /// [`ViewerError::NoImage`] or a render failure.
    pub fn set_window_center(&mut self, center: f64) -> Result<(), ViewerError> {
        self.set_window(WindowSettings { center, ..self.window })
    }

    /// # Errors
    ///
    /// [`ViewerError::InvalidWindowWidth`] for a width that is not positive;
    /// the window is unchanged.
    pub fn set_window_width(&mut self, width: f64) -> Result<(), ViewerError> {
        if !(width > 0.0 && width.is_finite()) {
            return self.report(Err(ViewerError::InvalidWindowWidth(width)));
        }
        self.set_window(WindowSettings { width, ..self.window })
    }

    /// # Errors
    ///
    /// [`ViewerError::NoImage`] or a render failure.
    pub fn apply_preset(&mut self, preset: Preset) -> Result<(), ViewerError> {
        let image = self.image.as_ref().ok_or(ViewerError::NoImage)?;
        let window = preset.window(&image.default_window, &self.window);
        info!("Applying {preset} preset ({window})");
        self.set_window(window)
    }

    /// Swap MONOCHROME1 and MONOCHROME2; center and width are kept
    ///
    /// # Errors
    ///
    /// [`ViewerError::NoImage`] or a render failure.
    pub fn toggle_invert(&mut self) -> Result<(), ViewerError> {
        let image = self.image.as_mut().ok_or(ViewerError::NoImage)?;
        image.photometric.interpretation = image.photometric.interpretation.toggled();
        let inverted = image.photometric.is_inverted();
        self.set_window(WindowSettings { inverted, ..self.window })
    }

    /// Drop trailing pointer state before a session transition
    fn clear_pointer_state(&mut self) {
        self.view.end_drag();
        self.vertex_drag = None;
    }

    /// # Errors
    ///
    /// [`AnnotationError::InvalidState`] unless idle.
    pub fn start_drawing(&mut self) -> Result<(), ViewerError> {
        self.clear_pointer_state();
        let started = self.annotations.start_drawing();
        self.report(started)
    }

    /// # Errors
    ///
    /// [`AnnotationError::TooFewPoints`] when the drawing was discarded.
    pub fn finish_drawing(&mut self) -> Result<u64, ViewerError> {
        self.clear_pointer_state();
        let finished = self.annotations.finish_drawing();
        self.report(finished)
    }

    /// # Errors
    ///
    /// [`AnnotationError::InvalidState`] unless drawing.
    pub fn cancel_drawing(&mut self) -> Result<(), ViewerError> {
        self.clear_pointer_state();
        let cancelled = self.annotations.cancel_drawing();
        self.report(cancelled)
    }

    /// # Errors
    ///
    /// As [`AnnotationEngine::start_editing`].
    pub fn start_editing(&mut self, index: usize) -> Result<(), ViewerError> {
        self.clear_pointer_state();
        let started = self.annotations.start_editing(index);
        self.report(started)
    }

    /// # Errors
    ///
    /// [`AnnotationError::InvalidState`] unless editing.
    pub fn finish_editing(&mut self) -> Result<(), ViewerError> {
        self.clear_pointer_state();
        let finished = self.annotations.finish_editing();
        self.report(finished)
    }

    /// # Errors
    ///
    /// [`AnnotationError::InvalidState`] unless editing.
    pub fn cancel_editing(&mut self) -> Result<(), ViewerError> {
        self.clear_pointer_state();
        let cancelled = self.annotations.cancel_editing();
        self.report(cancelled)
    }

    /// Delete after asking the confirmation collaborator; returns whether it was removed
    ///
    /// # Errors
    ///
    /// As [`AnnotationEngine::delete_label`].
    pub fn delete_label(&mut self, index: usize) -> Result<bool, ViewerError> {
        let deleted = self.annotations.delete_label(index, self.confirm.as_ref());
        self.report(deleted)
    }

    /// Append a vertex given in image space
    ///
    /// # Errors
    ///
    /// [`AnnotationError::InvalidState`] when idle, [`AnnotationError::NonFinitePoint`] for NaN or infinite coordinates.
    pub fn add_point(&mut self, point: Point2D) -> Result<(), ViewerError> {
        let added = self.annotations.add_point(point);
        self.report(added)
    }

    /// Pointer click in screen space while drawing or editing
    ///
    /// # Errors
    ///
    /// As [`AnnotationEngine::click`].
    pub fn click(&mut self, screen: Point2D) -> Result<ClickOutcome, ViewerError> {
        let point = self.view.screen_to_image(screen);
        let clicked = self.annotations.click(point, self.config.hit_radius);
        self.report(clicked)
    }

    /// Start dragging the vertex of the edited polygon under `screen`, if any
    pub fn begin_vertex_drag(&mut self, screen: Point2D) -> bool {
        let Some(label_index) = self.annotations.editing_index() else {
            return false;
        };
        let Some(polygon) = self.annotations.labels().get(label_index) else {
            return false;
        };
        let point = self.view.screen_to_image(screen);
        self.vertex_drag = hit_test_vertex(point, &polygon.points, self.config.hit_radius)
            .map(|vertex| (label_index, vertex));
        self.vertex_drag.is_some()
    }

    #[must_use]
    pub fn is_dragging_vertex(&self) -> bool {
        self.vertex_drag.is_some()
    }

    /// Move the dragged vertex to `screen`; `false` when no vertex drag is active
    ///
    /// # Errors
    ///
    /// As [`AnnotationEngine::drag_vertex`].
    pub fn drag_vertex_to(&mut self, screen: Point2D) -> Result<bool, ViewerError> {
        let Some((label_index, vertex)) = self.vertex_drag else {
            return Ok(false);
        };
        let point = self.view.screen_to_image(screen);
        let dragged = self.annotations.drag_vertex(label_index, vertex, point);
        self.report(dragged).map(|()| true)
    }

    /// Pointer released: ends vertex drags and pans
    pub fn end_pointer(&mut self) {
        self.clear_pointer_state();
    }

    /// Draw the current bitmap and all overlays onto `surface`
    pub fn compose(&self, surface: &mut dyn Surface) {
        surface.clear();
        if let Some(decoded) = self.renderer.current() {
            surface.draw_bitmap(&decoded.bitmap, &self.view);
        }
        draw_overlays(surface, &self.view, &self.annotations);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationSession;
    use crate::collab::recording::RecordingNotifier;
    use crate::collab::{FixedAnswer, MemorySource};
    use crate::dicom::PhotometricInterpretation;
    use crate::dicom::test_support::DatasetBuilder;
    use crate::overlay::{LABEL_COLOR, RasterSurface};
    use assert_matches::assert_matches;
    use ::dicom::dictionary_std::tags;

    fn viewer(answer: bool) -> (Viewer, RecordingNotifier) {
        let notifier = RecordingNotifier::default();
        let config = ViewerConfig {
            surface_size: Size::new(4.0, 4.0),
            ..ViewerConfig::default()
        };
        let viewer = Viewer::new(config, Box::new(notifier.clone()), Box::new(FixedAnswer(answer)));
        (viewer, notifier)
    }

    fn two_by_two() -> MemorySource {
        MemorySource::new(
            "2x2",
            DatasetBuilder::new()
                .image_8bit(2, 2, vec![0, 128, 200, 255])
                .decimal(tags::WINDOW_CENTER, "127")
                .decimal(tags::WINDOW_WIDTH, "256")
                .build_bytes(),
        )
    }

    fn draw_triangle(viewer: &mut Viewer) {
        viewer.start_drawing().unwrap();
        for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)] {
            viewer.add_point(Point2D::new(x, y)).unwrap();
        }
        viewer.finish_drawing().unwrap();
    }

    #[test]
    fn test_load_renders_with_file_window() {
        let (mut viewer, _) = viewer(true);
        viewer.load(&two_by_two()).unwrap();

        let bitmap = viewer.wait_render().unwrap().expect("bitmap");
        assert_eq!(bitmap.bitmap.as_raw(), &vec![1, 128, 200, 255]);
        assert_eq!(viewer.view().image_size(), Size::new(2.0, 2.0));
    }

    #[test]
    fn test_poll_render_delivers_bitmap() {
        let (mut viewer, _) = viewer(true);
        viewer.load(&two_by_two()).unwrap();

        let generation = viewer.render_generation();
        let bitmap = loop {
            if let Some(bitmap) = viewer.poll_render() {
                break bitmap;
            }
            std::thread::yield_now();
        };
        assert_eq!(bitmap.generation, generation);
        assert_eq!(viewer.bitmap().unwrap().generation, generation);
    }

    #[test]
    fn test_failed_load_keeps_previous_state() {
        let (mut viewer, notifier) = viewer(true);
        viewer.load(&two_by_two()).unwrap();
        viewer.wait_render().unwrap();
        draw_triangle(&mut viewer);
        viewer.set_window_center(100.0).unwrap();
        let generation = viewer.render_generation();

        let garbage = MemorySource::new("garbage", b"garbage".to_vec());
        assert_matches!(viewer.load(&garbage), Err(ViewerError::Load(LoadError::Parse(_))));

        assert_eq!(viewer.annotations().labels().len(), 1);
        assert_eq!(viewer.window().center, 100.0);
        assert_eq!(viewer.image().unwrap().rows(), 2);
        assert_eq!(viewer.render_generation(), generation);
        assert_eq!(notifier.0.borrow().len(), 1);
    }

    #[test]
    fn test_new_load_resets_state() {
        let (mut viewer, _) = viewer(true);
        viewer.load(&two_by_two()).unwrap();
        draw_triangle(&mut viewer);
        viewer.set_window_width(10.0).unwrap();
        viewer.view_mut().zoom(Point2D::new(1.0, 1.0), 2.0);
        let generation = viewer.render_generation();

        viewer.load(&two_by_two()).unwrap();
        assert!(viewer.annotations().labels().is_empty());
        assert_eq!(viewer.window(), &WindowSettings::new(127.0, 256.0, false));
        assert_eq!(viewer.view().scale(), 1.0);
        assert!(viewer.render_generation() > generation);
    }

    #[test]
    fn test_window_width_must_be_positive() {
        let (mut viewer, notifier) = viewer(true);
        viewer.load(&two_by_two()).unwrap();

        assert_matches!(viewer.set_window_width(0.0), Err(ViewerError::InvalidWindowWidth(_)));
        assert_matches!(viewer.set_window_width(-3.0), Err(ViewerError::InvalidWindowWidth(_)));
        assert_eq!(viewer.window().width, 256.0);
        assert_eq!(notifier.0.borrow().len(), 2);
    }

    #[test]
    fn test_invert_toggles_polarity() {
        let (mut viewer, _) = viewer(true);
        viewer.load(&two_by_two()).unwrap();

        viewer.toggle_invert().unwrap();
        assert!(viewer.window().inverted);
        assert_eq!(
            viewer.image().unwrap().photometric.interpretation,
            PhotometricInterpretation::Monochrome1
        );
        let bitmap = viewer.wait_render().unwrap().unwrap();
        assert_eq!(bitmap.bitmap.as_raw(), &vec![254, 127, 55, 0]);

        viewer.toggle_invert().unwrap();
        assert!(!viewer.window().inverted);
    }

    #[test]
    fn test_preset_changes_center_and_width() {
        let (mut viewer, _) = viewer(true);
        viewer.load(&two_by_two()).unwrap();

        viewer.apply_preset(Preset::Bone).unwrap();
        assert_eq!((viewer.window().center, viewer.window().width), (480.0, 2500.0));
        viewer.apply_preset(Preset::Default).unwrap();
        assert_eq!((viewer.window().center, viewer.window().width), (127.0, 256.0));
    }

    #[test]
    fn test_window_changes_need_an_image() {
        let (mut viewer, _) = viewer(true);
        assert_matches!(viewer.set_window_center(1.0), Err(ViewerError::NoImage));
        assert_matches!(viewer.toggle_invert(), Err(ViewerError::NoImage));
    }

    #[test]
    fn test_short_drawing_notifies() {
        let (mut viewer, notifier) = viewer(true);
        viewer.start_drawing().unwrap();
        viewer.add_point(Point2D::new(1.0, 1.0)).unwrap();

        assert_matches!(
            viewer.finish_drawing(),
            Err(ViewerError::Annotation(AnnotationError::TooFewPoints(1)))
        );
        assert_eq!(viewer.annotations().session(), &AnnotationSession::Idle);
        assert!(notifier.0.borrow()[0].contains("At least 3 points"));
    }

    #[test]
    fn test_declined_delete_keeps_label() {
        let (mut viewer, _) = viewer(false);
        draw_triangle(&mut viewer);
        assert!(!viewer.delete_label(0).unwrap());
        assert_eq!(viewer.annotations().labels().len(), 1);
    }

    #[test]
    fn test_vertex_drag_through_screen_points() {
        let (mut viewer, _) = viewer(true);
        draw_triangle(&mut viewer);
        viewer.start_editing(0).unwrap();

        // Within the hit radius of the first vertex
        assert!(viewer.begin_vertex_drag(Point2D::new(1.2, 0.1)));
        assert!(viewer.drag_vertex_to(Point2D::new(3.0, 0.0)).unwrap());
        viewer.end_pointer();
        assert!(!viewer.drag_vertex_to(Point2D::new(0.0, 3.0)).unwrap());

        assert_eq!(viewer.annotations().labels().get(0).unwrap().points[0], Point2D::new(3.0, 0.0));

        viewer.cancel_editing().unwrap();
        assert_eq!(viewer.annotations().labels().get(0).unwrap().points[0], Point2D::new(0.0, 0.0));
    }

    #[test]
    fn test_session_transitions_clear_pointer_state() {
        let (mut viewer, _) = viewer(true);
        draw_triangle(&mut viewer);

        viewer.view_mut().begin_drag(Point2D::new(1.0, 1.0));
        viewer.start_drawing().unwrap();
        assert!(!viewer.view().is_dragging());
        viewer.cancel_drawing().unwrap();

        viewer.view_mut().begin_drag(Point2D::new(1.0, 1.0));
        viewer.start_editing(0).unwrap();
        assert!(!viewer.view().is_dragging());

        assert!(viewer.begin_vertex_drag(Point2D::new(0.0, 0.0)));
        viewer.finish_editing().unwrap();
        assert!(!viewer.is_dragging_vertex());

        viewer.start_editing(0).unwrap();
        assert!(viewer.begin_vertex_drag(Point2D::new(0.0, 0.0)));
        viewer.cancel_editing().unwrap();
        assert!(!viewer.is_dragging_vertex());
        assert!(!viewer.drag_vertex_to(Point2D::new(3.0, 3.0)).unwrap());
    }

    #[test]
    fn test_compose_draws_bitmap_and_labels() {
        let (mut viewer, _) = viewer(true);
        viewer.load(&two_by_two()).unwrap();
        viewer.wait_render().unwrap();

        let mut surface = RasterSurface::new(4, 4);
        viewer.compose(&mut surface);
        // 2x2 image stretched over a 4x4 surface
        assert_eq!(surface.canvas().get_pixel(3, 3).0, [255, 255, 255, 255]);
        assert_eq!(surface.canvas().get_pixel(2, 0).0, [128, 128, 128, 255]);

        draw_triangle(&mut viewer);
        viewer.compose(&mut surface);
        assert_eq!(surface.canvas().get_pixel(0, 0).0, LABEL_COLOR.0);
    }
}
