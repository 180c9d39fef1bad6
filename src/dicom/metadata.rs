//! Loaded image structure

use super::Dataset;
use super::photometric::PhotometricInterpretation;
use super::pixel_data::RawSamples;
use crate::types::*;

/// Polarity and calibration of the stored values
#[derive(Debug, Clone, PartialEq)]
pub struct PhotometricParams {
    pub interpretation: PhotometricInterpretation,
    pub rescale: RescaleParams,
    /// (0028,1054), `"HU"` for calibrated CT values
    pub rescale_type: String,
}

impl PhotometricParams {
    #[inline]
    #[must_use]
    pub fn is_inverted(&self) -> bool {
        self.interpretation.is_inverted()
    }
}

/// Everything extracted from one file: the parsed dataset, the image geometry
/// and display defaults, the patient block and the decoded raw samples
#[derive(Debug, Clone)]
pub struct DicomImage {
    pub dataset: Dataset,
    pub geometry: ImageGeometry,
    pub photometric: PhotometricParams,
    /// Window stored in (or defaulted for) the file
    pub default_window: WindowSettings,
    pub samples: RawSamples,

    pub patient: PatientInfo,
    pub study: StudyInfo,

    pub sop_class: Option<SopClass>,
    pub transfer_syntax: TransferSyntax,
}

impl DicomImage {
    #[inline(always)]
    #[must_use]
    pub fn rows(&self) -> u16 {
        self.geometry.rows
    }

    #[inline(always)]
    #[must_use]
    pub fn cols(&self) -> u16 {
        self.geometry.cols
    }

    /// Native image size in pixels
    #[must_use]
    pub fn size(&self) -> Size {
        self.geometry.size()
    }
}
