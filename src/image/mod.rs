mod grayscale;
mod presets;
mod renderer;

pub use grayscale::{map_sample, map_to_gray, window_value};
pub use presets::Preset;
pub use renderer::{DecodedImage, ImageRenderer, RenderError, RenderOutcome, build_bitmap};

use crate::dicom::DicomImage;
use crate::types::WindowSettings;
use image::GrayImage;

/// Map and pack a loaded image synchronously with the given window
///
/// # Errors
///
/// Returns [`RenderError::ImageGeneration`] if the samples do not fill the raster
pub fn render_now(image: &DicomImage, window: &WindowSettings) -> Result<GrayImage, RenderError> {
    let gray = map_to_gray(&image.samples, &image.photometric, window);
    build_bitmap(u32::from(image.cols()), u32::from(image.rows()), gray)
}
