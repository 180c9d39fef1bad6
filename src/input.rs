//! Pointer and keyboard routing
//!
//! Front-ends translate their native events into [`InputEvent`]s and hand
//! them to an [`InputDispatcher`], which decides what they mean for the
//! current session.

use crate::annotation::AnnotationSession;
use crate::types::Point2D;
use crate::view::{Anchor, ZoomDirection};
use crate::viewer::{Viewer, ViewerError};
use std::collections::HashMap;

/// Wheel zoom factors: scrolling down (positive delta) zooms out
const WHEEL_OUT: f64 = 0.9;
const WHEEL_IN: f64 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Scroll at a screen position
    Wheel { position: Point2D, delta: f64 },
    PointerDown(Point2D),
    PointerMove(Point2D),
    PointerUp(Point2D),
    /// Press and release without movement
    Click(Point2D),
    Key(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    ResetView,
    FitToSurface,
    Jump(Anchor),
    Zoom(ZoomDirection),
    ToggleInvert,
}

#[derive(Debug, Clone)]
pub struct InputDispatcher {
    bindings: HashMap<char, KeyAction>,
}

impl Default for InputDispatcher {
    fn default() -> Self {
        let bindings = [
            ('0', KeyAction::ResetView),
            ('1', KeyAction::FitToSurface),
            ('2', KeyAction::Jump(Anchor::Center)),
            ('3', KeyAction::Jump(Anchor::TopLeft)),
            ('4', KeyAction::Jump(Anchor::TopRight)),
            ('5', KeyAction::Jump(Anchor::BottomLeft)),
            ('6', KeyAction::Jump(Anchor::BottomRight)),
            ('+', KeyAction::Zoom(ZoomDirection::In)),
            ('=', KeyAction::Zoom(ZoomDirection::In)),
            ('-', KeyAction::Zoom(ZoomDirection::Out)),
            ('i', KeyAction::ToggleInvert),
        ]
        .into_iter()
        .collect();
        Self { bindings }
    }
}

impl InputDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, key: char, action: KeyAction) {
        self.bindings.insert(key, action);
    }

    #[must_use]
    pub fn action_for(&self, key: char) -> Option<KeyAction> {
        self.bindings.get(&key).copied()
    }

    /// Apply one event; returns whether the display needs to be recomposed
    ///
    /// # Errors
    ///
    /// Whatever the triggered viewer operation reports.
    pub fn dispatch(&self, viewer: &mut Viewer, event: InputEvent) -> Result<bool, ViewerError> {
        match event {
            InputEvent::Key(key) => self.key(viewer, key),
            InputEvent::Wheel { position, delta } => {
                let factor = if delta > 0.0 { WHEEL_OUT } else { WHEEL_IN };
                Ok(viewer.view_mut().zoom(position, factor))
            }
            InputEvent::PointerDown(position) => {
                if viewer.begin_vertex_drag(position) {
                    return Ok(true);
                }
                if viewer.annotations().session().is_idle() {
                    viewer.view_mut().begin_drag(position);
                }
                Ok(false)
            }
            InputEvent::PointerMove(position) => {
                if viewer.is_dragging_vertex() {
                    return viewer.drag_vertex_to(position);
                }
                Ok(viewer.view_mut().drag_to(position))
            }
            InputEvent::PointerUp(_) => {
                viewer.end_pointer();
                Ok(false)
            }
            InputEvent::Click(position) => {
                if viewer.annotations().session().is_idle() {
                    return Ok(false);
                }
                viewer.click(position).map(|_| true)
            }
        }
    }

    fn key(&self, viewer: &mut Viewer, key: char) -> Result<bool, ViewerError> {
        // Shortcuts are disabled while a polygon is being drawn or edited
        if !matches!(viewer.annotations().session(), AnnotationSession::Idle) {
            return Ok(false);
        }
        let Some(action) = self.action_for(key) else {
            return Ok(false);
        };

        match action {
            KeyAction::ResetView => viewer.view_mut().reset(),
            KeyAction::FitToSurface => viewer.view_mut().fit_to_surface(),
            KeyAction::Jump(anchor) => viewer.view_mut().jump_to(anchor),
            KeyAction::Zoom(direction) => return Ok(viewer.view_mut().zoom_step(direction)),
            KeyAction::ToggleInvert => viewer.toggle_invert()?,
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{FixedAnswer, LogNotifier};
    use crate::types::Size;
    use crate::viewer::ViewerConfig;
    use approx::assert_relative_eq;

    fn viewer() -> Viewer {
        let config = ViewerConfig {
            surface_size: Size::new(100.0, 100.0),
            ..ViewerConfig::default()
        };
        Viewer::new(config, Box::new(LogNotifier), Box::new(FixedAnswer(true)))
    }

    #[test]
    fn test_wheel_direction() {
        let dispatcher = InputDispatcher::new();
        let mut viewer = viewer();
        let position = Point2D::new(50.0, 50.0);

        assert!(dispatcher.dispatch(&mut viewer, InputEvent::Wheel { position, delta: 120.0 }).unwrap());
        assert_relative_eq!(viewer.view().scale(), 0.9);
        assert!(dispatcher.dispatch(&mut viewer, InputEvent::Wheel { position, delta: -120.0 }).unwrap());
        assert_relative_eq!(viewer.view().scale(), 0.99, epsilon = 1e-12);
    }

    #[test]
    fn test_key_bindings() {
        let dispatcher = InputDispatcher::new();
        let mut viewer = viewer();

        dispatcher.dispatch(&mut viewer, InputEvent::Key('+')).unwrap();
        dispatcher.dispatch(&mut viewer, InputEvent::Key('=')).unwrap();
        assert_relative_eq!(viewer.view().scale(), 1.21, epsilon = 1e-12);

        dispatcher.dispatch(&mut viewer, InputEvent::Key('6')).unwrap();
        assert!(viewer.view().offset().x > 0.0);

        dispatcher.dispatch(&mut viewer, InputEvent::Key('0')).unwrap();
        assert_eq!(viewer.view().scale(), 1.0);
        assert_eq!(viewer.view().offset(), Point2D::ORIGIN);

        assert!(!dispatcher.dispatch(&mut viewer, InputEvent::Key('z')).unwrap());
    }

    #[test]
    fn test_rebinding_a_key() {
        let mut dispatcher = InputDispatcher::new();
        dispatcher.bind('z', KeyAction::Zoom(ZoomDirection::In));
        let mut viewer = viewer();

        assert!(dispatcher.dispatch(&mut viewer, InputEvent::Key('z')).unwrap());
        assert_relative_eq!(viewer.view().scale(), 1.1, epsilon = 1e-12);
    }

    #[test]
    fn test_keys_ignored_while_drawing() {
        let dispatcher = InputDispatcher::new();
        let mut viewer = viewer();
        viewer.start_drawing().unwrap();

        assert!(!dispatcher.dispatch(&mut viewer, InputEvent::Key('+')).unwrap());
        assert_eq!(viewer.view().scale(), 1.0);
    }

    #[test]
    fn test_pan_only_when_idle() {
        let dispatcher = InputDispatcher::new();
        let mut viewer = viewer();

        dispatcher.dispatch(&mut viewer, InputEvent::PointerDown(Point2D::new(10.0, 10.0))).unwrap();
        assert!(dispatcher.dispatch(&mut viewer, InputEvent::PointerMove(Point2D::new(20.0, 10.0))).unwrap());
        dispatcher.dispatch(&mut viewer, InputEvent::PointerUp(Point2D::new(20.0, 10.0))).unwrap();
        assert_eq!(viewer.view().offset(), Point2D::new(-10.0, 0.0));

        viewer.start_drawing().unwrap();
        dispatcher.dispatch(&mut viewer, InputEvent::PointerDown(Point2D::new(10.0, 10.0))).unwrap();
        assert!(!dispatcher.dispatch(&mut viewer, InputEvent::PointerMove(Point2D::new(30.0, 10.0))).unwrap());
        assert_eq!(viewer.view().offset(), Point2D::new(-10.0, 0.0));
    }

    #[test]
    fn test_clicks_draw_and_close_polygon() {
        let dispatcher = InputDispatcher::new();
        let mut viewer = viewer();
        assert!(!dispatcher.dispatch(&mut viewer, InputEvent::Click(Point2D::new(5.0, 5.0))).unwrap());

        viewer.start_drawing().unwrap();
        for (x, y) in [(10.0, 10.0), (60.0, 10.0), (60.0, 60.0), (11.0, 12.0)] {
            dispatcher.dispatch(&mut viewer, InputEvent::Click(Point2D::new(x, y))).unwrap();
        }

        assert_eq!(viewer.annotations().labels().len(), 1);
        assert_eq!(viewer.annotations().labels().get(0).unwrap().points.len(), 3);
        assert!(viewer.annotations().session().is_idle());
    }

    #[test]
    fn test_vertex_drag_in_editing() {
        let dispatcher = InputDispatcher::new();
        let mut viewer = viewer();
        viewer.start_drawing().unwrap();
        for (x, y) in [(10.0, 10.0), (60.0, 10.0), (60.0, 60.0)] {
            viewer.add_point(Point2D::new(x, y)).unwrap();
        }
        viewer.finish_drawing().unwrap();
        viewer.start_editing(0).unwrap();

        assert!(dispatcher.dispatch(&mut viewer, InputEvent::PointerDown(Point2D::new(61.0, 59.0))).unwrap());
        assert!(dispatcher.dispatch(&mut viewer, InputEvent::PointerMove(Point2D::new(80.0, 80.0))).unwrap());
        dispatcher.dispatch(&mut viewer, InputEvent::PointerUp(Point2D::new(80.0, 80.0))).unwrap();

        assert_eq!(viewer.annotations().labels().get(0).unwrap().points[2], Point2D::new(80.0, 80.0));
        assert_eq!(viewer.view().offset(), Point2D::ORIGIN);
    }

    fn committed_triangle(viewer: &mut Viewer) {
        viewer.start_drawing().unwrap();
        for (x, y) in [(10.0, 10.0), (60.0, 10.0), (60.0, 60.0)] {
            viewer.add_point(Point2D::new(x, y)).unwrap();
        }
        viewer.finish_drawing().unwrap();
    }

    #[test]
    fn test_starting_a_session_ends_the_pan() {
        let dispatcher = InputDispatcher::new();
        let mut viewer = viewer();
        committed_triangle(&mut viewer);

        dispatcher.dispatch(&mut viewer, InputEvent::PointerDown(Point2D::new(30.0, 80.0))).unwrap();
        assert!(dispatcher.dispatch(&mut viewer, InputEvent::PointerMove(Point2D::new(40.0, 80.0))).unwrap());
        viewer.start_drawing().unwrap();
        assert!(!viewer.view().is_dragging());
        assert!(!dispatcher.dispatch(&mut viewer, InputEvent::PointerMove(Point2D::new(90.0, 80.0))).unwrap());
        assert_eq!(viewer.view().offset(), Point2D::new(-10.0, 0.0));
        viewer.cancel_drawing().unwrap();

        dispatcher.dispatch(&mut viewer, InputEvent::PointerDown(Point2D::new(30.0, 80.0))).unwrap();
        assert!(dispatcher.dispatch(&mut viewer, InputEvent::PointerMove(Point2D::new(30.0, 90.0))).unwrap());
        viewer.start_editing(0).unwrap();
        assert!(!viewer.view().is_dragging());
        assert!(!dispatcher.dispatch(&mut viewer, InputEvent::PointerMove(Point2D::new(30.0, 20.0))).unwrap());
        assert_eq!(viewer.view().offset(), Point2D::new(-10.0, -10.0));
    }

    #[test]
    fn test_ending_a_session_drops_the_vertex_drag() {
        let dispatcher = InputDispatcher::new();
        let mut viewer = viewer();
        committed_triangle(&mut viewer);

        viewer.start_editing(0).unwrap();
        assert!(dispatcher.dispatch(&mut viewer, InputEvent::PointerDown(Point2D::new(61.0, 59.0))).unwrap());
        viewer.finish_editing().unwrap();
        assert!(!viewer.is_dragging_vertex());
        assert!(!dispatcher.dispatch(&mut viewer, InputEvent::PointerMove(Point2D::new(80.0, 80.0))).unwrap());
        assert_eq!(viewer.annotations().labels().get(0).unwrap().points[2], Point2D::new(60.0, 60.0));

        viewer.start_editing(0).unwrap();
        assert!(dispatcher.dispatch(&mut viewer, InputEvent::PointerDown(Point2D::new(10.0, 11.0))).unwrap());
        assert!(viewer.is_dragging_vertex());
        viewer.cancel_editing().unwrap();
        assert!(!viewer.is_dragging_vertex());
        assert!(!dispatcher.dispatch(&mut viewer, InputEvent::PointerMove(Point2D::new(0.0, 0.0))).unwrap());
        assert_eq!(viewer.annotations().labels().get(0).unwrap().points[0], Point2D::new(10.0, 10.0));
        assert_eq!(viewer.view().offset(), Point2D::ORIGIN);
    }
}
