use thiserror::Error;

/// Fatal failures while loading a file. None of them leaves partial state behind.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The byte stream is not a valid tagged dataset
    #[error("Failed to parse DICOM data: {0}")]
    Parse(String),

    /// The dataset parsed but carries no (7FE0,0010) element
    #[error("No pixel data element found")]
    MissingPixelData,

    /// Sample count does not match the declared geometry
    #[error("Pixel data holds {actual} samples, expected {expected} ({rows}x{cols}x{samples_per_pixel})")]
    DecodeSizeMismatch {
        expected: usize,
        actual: usize,
        rows: u16,
        cols: u16,
        samples_per_pixel: u16,
    },

    /// Compressed, color or otherwise out-of-scope pixel data
    #[error("Unsupported pixel data: {0}")]
    UnsupportedPixelData(String),
}
