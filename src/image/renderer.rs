//! Off-thread bitmap construction keyed by a generation token
//!
//! Every request is tagged with the generation current at submission and runs
//! on its own worker thread. Results older than the latest request are dropped
//! when they arrive, so a slow render can never replace a newer one.

use image::GrayImage;
use log::{debug, warn};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    /// The gray levels do not fill a `width x height` bitmap
    #[error("Failed to build {width}x{height} bitmap from {len} gray levels")]
    ImageGeneration { width: u32, height: u32, len: usize },

    #[error("Render worker for generation {0} exited without a result")]
    WorkerLost(u64),

    #[error("Failed to spawn render worker")]
    Spawn(#[from] std::io::Error),
}

/// A finished bitmap, shared read-only with whoever displays it
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub generation: u64,
    pub bitmap: GrayImage,
}

impl DecodedImage {
    #[must_use]
    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }
}

/// What a worker sends back
#[derive(Debug)]
pub struct RenderOutcome {
    pub generation: u64,
    pub result: Result<GrayImage, RenderError>,
}

/// Pack mapped gray levels into a bitmap
///
/// # Errors
///
/// [`RenderError::ImageGeneration`] when `pixels` is not exactly
/// `width * height` long.
pub fn build_bitmap(width: u32, height: u32, pixels: Vec<u8>) -> Result<GrayImage, RenderError> {
    let len = pixels.len();
    GrayImage::from_raw(width, height, pixels)
        .filter(|_| len == width as usize * height as usize)
        .ok_or(RenderError::ImageGeneration { width, height, len })
}

#[derive(Debug, Default)]
pub struct ImageRenderer {
    generation: u64,
    pending: Vec<(u64, Receiver<RenderOutcome>)>,
    current: Option<Arc<DecodedImage>>,
}

impl ImageRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation of the most recent request (or invalidation)
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Bitmap currently on display
    #[must_use]
    pub fn current(&self) -> Option<Arc<DecodedImage>> {
        self.current.clone()
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Invalidate everything in flight and the displayed bitmap; used when a new file is loaded
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.pending.clear();
        self.current = None;
        debug!("Render generation bumped to {} on invalidate", self.generation);
    }

    /// Start building a bitmap on a worker thread, returning its generation
    ///
    /// # Errors
    ///
    /// [`RenderError::Spawn`] if the worker thread cannot be started.
    pub fn submit(&mut self, width: u32, height: u32, pixels: Vec<u8>) -> Result<u64, RenderError> {
        self.generation += 1;
        let generation = self.generation;
        let (tx, rx) = mpsc::channel();

        thread::Builder::new()
            .name(format!("render-{generation}"))
            .spawn(move || {
                let result = build_bitmap(width, height, pixels);
                // The receiver is gone when the request was invalidated
                let _ = tx.send(RenderOutcome { generation, result });
            })?;

        self.pending.push((generation, rx));
        debug!("Submitted render generation {generation} ({width}x{height})");
        Ok(generation)
    }

    /// Collect finished work without blocking.
    ///
    /// Returns the new bitmap if the latest request completed.
    ///
    /// # Errors
    ///
    /// Rendering failure of the latest request, or a worker that vanished.
    pub fn poll(&mut self) -> Result<Option<Arc<DecodedImage>>, RenderError> {
        let mut updated = None;
        let mut index = 0;

        while index < self.pending.len() {
            let generation = self.pending[index].0;
            match self.pending[index].1.try_recv() {
                Ok(outcome) => {
                    self.pending.remove(index);
                    if let Some(image) = self.accept(outcome)? {
                        updated = Some(image);
                    }
                }
                Err(TryRecvError::Empty) => index += 1,
                Err(TryRecvError::Disconnected) => {
                    self.pending.remove(index);
                    return Err(RenderError::WorkerLost(generation));
                }
            }
        }

        Ok(updated)
    }

    /// Block until the latest request finishes; older requests are abandoned.
    ///
    /// Returns the displayed bitmap, which is unchanged if nothing was pending.
    ///
    /// # Errors
    ///
    /// Rendering failure of the latest request, or a worker that vanished.
    pub fn wait_latest(&mut self) -> Result<Option<Arc<DecodedImage>>, RenderError> {
        let Some((generation, rx)) = self.pending.pop() else {
            return Ok(self.current.clone());
        };
        self.pending.clear();

        let outcome = rx.recv().map_err(|_| RenderError::WorkerLost(generation))?;
        self.accept(outcome)?;
        Ok(self.current.clone())
    }

    /// Apply a worker result, discarding it if a newer request exists
    pub(crate) fn accept(&mut self, outcome: RenderOutcome) -> Result<Option<Arc<DecodedImage>>, RenderError> {
        if outcome.generation < self.generation {
            debug!(
                "Discarding stale render generation {} (latest {})",
                outcome.generation, self.generation
            );
            return Ok(None);
        }

        match outcome.result {
            Ok(bitmap) => {
                let image = Arc::new(DecodedImage {
                    generation: outcome.generation,
                    bitmap,
                });
                self.current = Some(Arc::clone(&image));
                Ok(Some(image))
            }
            Err(e) => {
                warn!("Render generation {} failed: {e}", outcome.generation);
                Err(e)
            }
        }
    }
}
