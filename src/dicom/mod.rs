//! DICOM parsing and metadata extraction
//!
//! This module turns a raw DICOM Part 10 byte buffer into a [`DicomImage`]:
//! the parsed dataset, geometry and windowing defaults, patient attributes and
//! the decoded raw samples.

mod error;
mod metadata;
pub mod parser;
pub mod patient;
mod photometric;
mod pixel_data;
mod validation;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export public API
pub use error::LoadError;
pub use metadata::{DicomImage, PhotometricParams};
pub use photometric::PhotometricInterpretation;
pub use pixel_data::{RawSamples, decode_pixel_data};

use chrono::NaiveDate;
use dicom::dictionary_std::tags;
use log::info;
use std::io::Cursor;

/// Parsed tag dictionary of one file
pub type Dataset = dicom::object::DefaultDicomObject;

const PREAMBLE_LEN: usize = 128;
const MAGIC: &[u8; 4] = b"DICM";

/// Parse a byte buffer into a dataset.
///
/// The buffer may start with the 128-byte preamble or directly with the
/// `DICM` magic code.
///
/// # Errors
///
/// [`LoadError::Parse`] when the buffer is not a valid DICOM file; no partial
/// dataset is returned.
pub fn parse_dataset(bytes: &[u8]) -> Result<Dataset, LoadError> {
    let start = if bytes.get(PREAMBLE_LEN..PREAMBLE_LEN + MAGIC.len()) == Some(MAGIC.as_slice()) {
        PREAMBLE_LEN
    } else if bytes.starts_with(MAGIC) {
        0
    } else {
        return Err(LoadError::Parse("missing DICM magic code".to_string()));
    };

    dicom::object::from_reader(Cursor::new(bytes[start..].to_vec()))
        .map_err(|e| LoadError::Parse(e.to_string()))
}

/// Parse a buffer and extract everything needed to display and annotate it
///
/// # Errors
///
/// Any [`LoadError`]; all of them are fatal for this load.
pub fn load_from_bytes(bytes: &[u8]) -> Result<DicomImage, LoadError> {
    load_from_bytes_on(bytes, chrono::Local::now().date_naive())
}

/// Same as [`load_from_bytes`], with the date used for age inference supplied
///
/// # Errors
///
/// Any [`LoadError`]; all of them are fatal for this load.
pub fn load_from_bytes_on(bytes: &[u8], today: NaiveDate) -> Result<DicomImage, LoadError> {
    let dataset = parse_dataset(bytes)?;

    let geometry = parser::extract_geometry(&dataset);
    let photometric = parser::extract_photometric(&dataset);
    let transfer_syntax = parser::extract_transfer_syntax(&dataset);
    let sop_class = parser::extract_sop_class(&dataset);

    let pixel_element = dataset
        .get(tags::PIXEL_DATA)
        .ok_or(LoadError::MissingPixelData)?;

    validation::validate_image(&geometry, &photometric.interpretation, &transfer_syntax)?;

    let value = pixel_element.value().primitive().ok_or_else(|| {
        LoadError::UnsupportedPixelData("encapsulated pixel data".to_string())
    })?;
    let samples = decode_pixel_data(value, &geometry, transfer_syntax.is_big_endian())?;

    let mut default_window = parser::extract_window(&dataset, &photometric.rescale_type);
    default_window.inverted = photometric.is_inverted();

    let mut patient = parser::extract_patient_info(&dataset);
    patient::infer_age_fields(&mut patient, today);
    let study = parser::extract_study_info(&dataset);

    info!(
        "Loaded {} image ({geometry}), window {default_window}",
        photometric.interpretation
    );

    Ok(DicomImage {
        dataset,
        geometry,
        photometric,
        default_window,
        samples,
        patient,
        study,
        sop_class,
        transfer_syntax,
    })
}
