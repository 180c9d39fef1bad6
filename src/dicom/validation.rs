use super::error::LoadError;
use crate::dicom::PhotometricInterpretation;
use crate::types::{ImageGeometry, TransferSyntax};

#[inline]
pub fn validate_photometric_samples(
    photometric_interpretation: &PhotometricInterpretation,
    samples_per_pixel: u16,
) -> Result<(), LoadError> {
    if !photometric_interpretation.is_grayscale() {
        return Err(LoadError::UnsupportedPixelData(format!(
            "photometric interpretation {photometric_interpretation} (only MONOCHROME1/MONOCHROME2)"
        )));
    }

    if samples_per_pixel != 1 {
        return Err(LoadError::UnsupportedPixelData(format!(
            "{samples_per_pixel} samples per pixel for {photometric_interpretation}"
        )));
    }

    Ok(())
}

#[inline]
pub fn validate_bit_depth(geometry: &ImageGeometry) -> Result<(), LoadError> {
    if !geometry.has_supported_depth() {
        return Err(LoadError::UnsupportedPixelData(format!(
            "{} of {} bits (expected 8 or 16 bits allocated)",
            geometry.bits_stored, geometry.bits_allocated
        )));
    }

    Ok(())
}

#[inline]
pub fn validate_transfer_syntax(transfer_syntax: &TransferSyntax) -> Result<(), LoadError> {
    if transfer_syntax.is_compressed() {
        return Err(LoadError::UnsupportedPixelData(format!(
            "compressed transfer syntax {transfer_syntax}"
        )));
    }

    Ok(())
}

pub fn validate_image(
    geometry: &ImageGeometry,
    photometric_interpretation: &PhotometricInterpretation,
    transfer_syntax: &TransferSyntax,
) -> Result<(), LoadError> {
    validate_transfer_syntax(transfer_syntax)?;
    validate_photometric_samples(photometric_interpretation, geometry.samples_per_pixel)?;
    validate_bit_depth(geometry)?;
    if geometry.is_empty() {
        return Err(LoadError::UnsupportedPixelData(format!(
            "empty raster {}x{}",
            geometry.cols, geometry.rows
        )));
    }
    Ok(())
}
