//! Polygon annotations and the drawing/editing session
//!
//! All points are in image-pixel space. A session is one of:
//!
//! * `Idle`: nothing in progress
//! * `Drawing`: points accumulate until the polygon is finished or cancelled
//! * `Editing`: one committed polygon is modified in place; a copy taken on
//!   entry is restored on cancel
//!
//! Committed polygons always have at least three points. [`LabelList`]
//! checks this on every insert and replace.

use crate::collab::ConfirmPrompt;
use crate::types::Point2D;
use log::{debug, info};
use std::mem;
use thiserror::Error;

pub const MIN_POLYGON_POINTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnotationError {
    #[error("At least 3 points required (got {0})")]
    TooFewPoints(usize),

    #[error("Cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },

    #[error("Label {index} does not exist ({len} labels)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Vertex {index} does not exist ({len} vertices)")]
    VertexOutOfRange { index: usize, len: usize },

    #[error("Point coordinates must be finite")]
    NonFinitePoint,
}

/// A committed region of interest
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub id: u64,
    pub points: Vec<Point2D>,
}

/// Ordered polygons, each with at least [`MIN_POLYGON_POINTS`] points
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelList {
    labels: Vec<Polygon>,
}

impl LabelList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn check(polygon: &Polygon) -> Result<(), AnnotationError> {
        if polygon.points.len() < MIN_POLYGON_POINTS {
            return Err(AnnotationError::TooFewPoints(polygon.points.len()));
        }
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), AnnotationError> {
        if index >= self.labels.len() {
            return Err(AnnotationError::IndexOutOfRange {
                index,
                len: self.labels.len(),
            });
        }
        Ok(())
    }

    /// # Errors
    ///
    /// `TooFewPoints`, or `IndexOutOfRange` when `index > len`.
    pub fn insert(&mut self, index: usize, polygon: Polygon) -> Result<(), AnnotationError> {
        Self::check(&polygon)?;
        if index > self.labels.len() {
            return Err(AnnotationError::IndexOutOfRange {
                index,
                len: self.labels.len(),
            });
        }
        self.labels.insert(index, polygon);
        Ok(())
    }

    /// # Errors
    ///
    /// `TooFewPoints`.
    pub fn push(&mut self, polygon: Polygon) -> Result<(), AnnotationError> {
        self.insert(self.labels.len(), polygon)
    }

    /// # Errors
    ///
    /// `IndexOutOfRange`.
    pub fn remove_at(&mut self, index: usize) -> Result<Polygon, AnnotationError> {
        self.check_index(index)?;
        Ok(self.labels.remove(index))
    }

    /// Replace the polygon at `index`, returning the previous one
    ///
    /// # Errors
    ///
    /// `TooFewPoints` or `IndexOutOfRange`; the list is unchanged on error.
    pub fn replace_at(&mut self, index: usize, polygon: Polygon) -> Result<Polygon, AnnotationError> {
        Self::check(&polygon)?;
        self.check_index(index)?;
        Ok(mem::replace(&mut self.labels[index], polygon))
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Polygon> {
        self.labels.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Polygon> {
        self.labels.iter()
    }

    pub fn clear(&mut self) {
        self.labels.clear();
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum AnnotationSession {
    #[default]
    Idle,
    Drawing {
        points: Vec<Point2D>,
    },
    Editing {
        label_index: usize,
        backup: Polygon,
    },
}

impl AnnotationSession {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Drawing { .. } => "drawing",
            Self::Editing { .. } => "editing",
        }
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Result of a pointer click routed to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// A vertex was appended
    PointAdded,
    /// The click closed the drawing; the new polygon's id
    Closed(u64),
}

#[derive(Debug, Clone)]
pub struct AnnotationEngine {
    labels: LabelList,
    session: AnnotationSession,
    next_id: u64,
}

impl Default for AnnotationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationEngine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            labels: LabelList::new(),
            session: AnnotationSession::Idle,
            next_id: 1,
        }
    }

    #[must_use]
    pub fn labels(&self) -> &LabelList {
        &self.labels
    }

    #[must_use]
    pub fn session(&self) -> &AnnotationSession {
        &self.session
    }

    /// Points of the polygon being drawn, if any
    #[must_use]
    pub fn drawing_points(&self) -> Option<&[Point2D]> {
        match &self.session {
            AnnotationSession::Drawing { points } => Some(points),
            _ => None,
        }
    }

    /// Index of the polygon being edited, if any
    #[must_use]
    pub fn editing_index(&self) -> Option<usize> {
        match &self.session {
            AnnotationSession::Editing { label_index, .. } => Some(*label_index),
            _ => None,
        }
    }

    fn invalid(&self, action: &'static str) -> AnnotationError {
        AnnotationError::InvalidState {
            action,
            state: self.session.name(),
        }
    }

    /// Drop all polygons and any session; ids keep increasing
    pub fn clear(&mut self) {
        self.labels.clear();
        self.session = AnnotationSession::Idle;
    }

    /// # Errors
    ///
    /// `InvalidState` unless idle.
    pub fn start_drawing(&mut self) -> Result<(), AnnotationError> {
        if !self.session.is_idle() {
            return Err(self.invalid("start drawing"));
        }
        self.session = AnnotationSession::Drawing { points: Vec::new() };
        Ok(())
    }

    /// Append a vertex to the polygon being drawn or edited
    ///
    /// # Errors
    ///
    /// `InvalidState` when idle, `NonFinitePoint` for NaN or infinite coordinates.
    pub fn add_point(&mut self, point: Point2D) -> Result<(), AnnotationError> {
        if !point.is_finite() {
            return Err(AnnotationError::NonFinitePoint);
        }
        match &mut self.session {
            AnnotationSession::Drawing { points } => {
                points.push(point);
                Ok(())
            }
            AnnotationSession::Editing { label_index, .. } => {
                let index = *label_index;
                let mut polygon = self
                    .labels
                    .get(index)
                    .cloned()
                    .ok_or(AnnotationError::IndexOutOfRange { index, len: self.labels.len() })?;
                polygon.points.push(point);
                self.labels.replace_at(index, polygon)?;
                Ok(())
            }
            AnnotationSession::Idle => Err(AnnotationError::InvalidState {
                action: "add a point",
                state: "idle",
            }),
        }
    }

    /// Commit the drawing as a new polygon and return its id.
    ///
    /// With fewer than three points the drawing is discarded; the session is
    /// idle afterwards either way.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless drawing, `TooFewPoints` for a discarded drawing.
    pub fn finish_drawing(&mut self) -> Result<u64, AnnotationError> {
        let points = match mem::take(&mut self.session) {
            AnnotationSession::Drawing { points } => points,
            other => {
                self.session = other;
                return Err(self.invalid("finish drawing"));
            }
        };

        if points.len() < MIN_POLYGON_POINTS {
            debug!("Discarding drawing with {} points", points.len());
            return Err(AnnotationError::TooFewPoints(points.len()));
        }

        let id = self.next_id;
        self.labels.push(Polygon { id, points })?;
        self.next_id += 1;
        info!("Committed label {id} ({} labels)", self.labels.len());
        Ok(id)
    }

    /// # Errors
    ///
    /// `InvalidState` unless drawing.
    pub fn cancel_drawing(&mut self) -> Result<(), AnnotationError> {
        if !matches!(self.session, AnnotationSession::Drawing { .. }) {
            return Err(self.invalid("cancel drawing"));
        }
        self.session = AnnotationSession::Idle;
        Ok(())
    }

    /// # Errors
    ///
    /// `InvalidState` unless idle, `IndexOutOfRange` for a bad index.
    pub fn start_editing(&mut self, index: usize) -> Result<(), AnnotationError> {
        if !self.session.is_idle() {
            return Err(self.invalid("start editing"));
        }
        let backup = self
            .labels
            .get(index)
            .cloned()
            .ok_or(AnnotationError::IndexOutOfRange { index, len: self.labels.len() })?;
        self.session = AnnotationSession::Editing {
            label_index: index,
            backup,
        };
        Ok(())
    }

    /// Keep the edits
    ///
    /// # Errors
    ///
    /// `InvalidState` unless editing.
    pub fn finish_editing(&mut self) -> Result<(), AnnotationError> {
        if !matches!(self.session, AnnotationSession::Editing { .. }) {
            return Err(self.invalid("finish editing"));
        }
        self.session = AnnotationSession::Idle;
        Ok(())
    }

    /// Restore the polygon as it was when editing started
    ///
    /// # Errors
    ///
    /// `InvalidState` unless editing.
    pub fn cancel_editing(&mut self) -> Result<(), AnnotationError> {
        let (label_index, backup) = match mem::take(&mut self.session) {
            AnnotationSession::Editing { label_index, backup } => (label_index, backup),
            other => {
                self.session = other;
                return Err(self.invalid("cancel editing"));
            }
        };
        self.labels.replace_at(label_index, backup)?;
        Ok(())
    }

    /// Move one vertex of the polygon being edited
    ///
    /// # Errors
    ///
    /// `InvalidState` unless `label_index` is the polygon being edited,
    /// `VertexOutOfRange` for a bad vertex index.
    pub fn drag_vertex(
        &mut self,
        label_index: usize,
        point_index: usize,
        point: Point2D,
    ) -> Result<(), AnnotationError> {
        if self.editing_index() != Some(label_index) {
            return Err(self.invalid("drag a vertex of another label"));
        }
        if !point.is_finite() {
            return Err(AnnotationError::NonFinitePoint);
        }
        let mut polygon = self
            .labels
            .get(label_index)
            .cloned()
            .ok_or(AnnotationError::IndexOutOfRange { index: label_index, len: self.labels.len() })?;
        let len = polygon.points.len();
        let vertex = polygon
            .points
            .get_mut(point_index)
            .ok_or(AnnotationError::VertexOutOfRange { index: point_index, len })?;
        *vertex = point;
        self.labels.replace_at(label_index, polygon)?;
        Ok(())
    }

    /// Delete a committed polygon once `confirm` approves.
    ///
    /// Returns whether the polygon was removed; a declined confirmation
    /// changes nothing.
    ///
    /// # Errors
    ///
    /// `InvalidState` while drawing or editing, `IndexOutOfRange` for a bad index.
    pub fn delete_label(&mut self, index: usize, confirm: &dyn ConfirmPrompt) -> Result<bool, AnnotationError> {
        if !self.session.is_idle() {
            return Err(self.invalid("delete a label"));
        }
        let id = self
            .labels
            .get(index)
            .map(|p| p.id)
            .ok_or(AnnotationError::IndexOutOfRange { index, len: self.labels.len() })?;

        if !confirm.confirm(&format!("Delete label {id}?")) {
            debug!("Deletion of label {id} declined");
            return Ok(false);
        }
        self.labels.remove_at(index)?;
        info!("Deleted label {id}");
        Ok(true)
    }

    /// Route a click: close the drawing when it lands near the first vertex,
    /// otherwise append a vertex
    ///
    /// # Errors
    ///
    /// As [`Self::add_point`] and [`Self::finish_drawing`].
    pub fn click(&mut self, point: Point2D, radius: f64) -> Result<ClickOutcome, AnnotationError> {
        if let Some(points) = self.drawing_points()
            && points.len() >= MIN_POLYGON_POINTS
            && points[0].distance_to(point) < radius
        {
            return self.finish_drawing().map(ClickOutcome::Closed);
        }
        self.add_point(point).map(|()| ClickOutcome::PointAdded)
    }
}
