//! Tag readers with default substitution.
//!
//! Every read falls back to a documented default when the tag is missing,
//! empty or cannot be converted; individual tag failures never propagate.

use super::Dataset;
use super::metadata::PhotometricParams;
use crate::dicom::PhotometricInterpretation;
use crate::types::{
    ImageGeometry, PatientInfo, PixelRepresentation, RescaleParams, SopClass, StudyInfo,
    TransferSyntax, UNKNOWN, WindowSettings,
};
use dicom::core::Tag;
use dicom::dictionary_std::tags;
use log::debug;

pub const DEFAULT_DIMENSION: u16 = 512;
pub const DEFAULT_TRANSFER_SYNTAX: &str = "1.2.840.10008.1.2";

fn clean(value: &str) -> &str {
    value.trim_matches(|c: char| c == '\0' || c.is_whitespace())
}

/// Read a text attribute; missing, empty and unreadable values yield `default`
pub fn read_string(obj: &Dataset, tag: Tag, default: &str) -> String {
    let Some(element) = obj.get(tag) else {
        return default.to_string();
    };

    match element.value().to_str() {
        Ok(s) if !clean(&s).is_empty() => clean(&s).to_string(),
        Ok(_) => default.to_string(),
        Err(e) => {
            debug!("Unreadable {tag}: {e}; using {default:?}");
            default.to_string()
        }
    }
}

/// Read an unsigned short attribute
pub fn read_u16(obj: &Dataset, tag: Tag, default: u16) -> u16 {
    let Some(element) = obj.get(tag) else {
        return default;
    };

    element.to_int::<u16>().unwrap_or_else(|e| {
        debug!("Unreadable {tag}: {e}; using {default}");
        default
    })
}

/// Read the first value of a decimal string attribute (`40\400` reads as 40)
pub fn read_decimal(obj: &Dataset, tag: Tag) -> Option<f64> {
    let element = obj.get(tag)?;

    let parsed = match element.value().to_str() {
        Ok(s) => s.split('\\').next().map(clean).and_then(|v| v.parse::<f64>().ok()),
        Err(_) => None,
    }
    .or_else(|| element.to_float64().ok());

    if parsed.is_none() {
        debug!("Unreadable decimal {tag}; using default");
    }
    parsed.filter(|v| v.is_finite())
}

/// Image pixel module; missing rows/columns default to 512 and depth to 8 bits
pub fn extract_geometry(obj: &Dataset) -> ImageGeometry {
    let u16_or = |tag, default| read_u16(obj, tag, default);
    ImageGeometry {
        rows: u16_or(tags::ROWS, DEFAULT_DIMENSION),
        cols: u16_or(tags::COLUMNS, DEFAULT_DIMENSION),
        samples_per_pixel: u16_or(tags::SAMPLES_PER_PIXEL, 1),
        bits_allocated: u16_or(tags::BITS_ALLOCATED, 8),
        bits_stored: u16_or(tags::BITS_STORED, 8),
        high_bit: u16_or(tags::HIGH_BIT, 7),
        pixel_representation: PixelRepresentation::from(u16_or(tags::PIXEL_REPRESENTATION, 0)),
        planar_configuration: u16_or(tags::PLANAR_CONFIGURATION, 0),
    }
}

pub fn extract_rescale_params(obj: &Dataset) -> RescaleParams {
    // Rescale tags are mostly present for CT/PET; other modalities store display values directly
    let slope = read_decimal(obj, tags::RESCALE_SLOPE).unwrap_or(1.0);
    let intercept = read_decimal(obj, tags::RESCALE_INTERCEPT).unwrap_or(0.0);
    RescaleParams::new(slope, intercept)
}

pub fn extract_photometric(obj: &Dataset) -> PhotometricParams {
    let interpretation = read_string(obj, tags::PHOTOMETRIC_INTERPRETATION, "MONOCHROME2")
        .parse::<PhotometricInterpretation>()
        .unwrap_or(PhotometricInterpretation::Monochrome2);

    PhotometricParams {
        interpretation,
        rescale: extract_rescale_params(obj),
        rescale_type: read_string(obj, tags::RESCALE_TYPE, ""),
    }
}

/// Window defaults stored in the file, corrected so the width is always positive
pub fn extract_window(obj: &Dataset, rescale_type: &str) -> WindowSettings {
    let center = read_decimal(obj, tags::WINDOW_CENTER);
    let width = read_decimal(obj, tags::WINDOW_WIDTH);

    match (center, width) {
        (Some(center), Some(width)) => WindowSettings::corrected(center, width, rescale_type),
        (_, None) if rescale_type == "HU" => WindowSettings::corrected(0.0, 0.0, rescale_type),
        (center, width) => WindowSettings::corrected(
            center.unwrap_or(WindowSettings::DEFAULT_CENTER),
            width.unwrap_or(WindowSettings::DEFAULT_WIDTH),
            rescale_type,
        ),
    }
}

/// Patient attributes as stored; age/birth date inference happens afterwards
pub fn extract_patient_info(obj: &Dataset) -> PatientInfo {
    PatientInfo {
        name: read_string(obj, tags::PATIENT_NAME, UNKNOWN),
        id: read_string(obj, tags::PATIENT_ID, UNKNOWN),
        birth_date: read_string(obj, tags::PATIENT_BIRTH_DATE, UNKNOWN),
        birth_time: read_string(obj, tags::PATIENT_BIRTH_TIME, UNKNOWN),
        age: read_string(obj, tags::PATIENT_AGE, UNKNOWN),
        sex: read_string(obj, tags::PATIENT_SEX, UNKNOWN),
        height: read_string(obj, tags::PATIENT_SIZE, UNKNOWN),
        weight: read_string(obj, tags::PATIENT_WEIGHT, UNKNOWN),
    }
}

pub fn extract_study_info(obj: &Dataset) -> StudyInfo {
    StudyInfo {
        date: read_string(obj, tags::STUDY_DATE, UNKNOWN),
        body_part_examined: read_string(obj, tags::BODY_PART_EXAMINED, UNKNOWN),
        patient_position: read_string(obj, tags::PATIENT_POSITION, UNKNOWN),
        modality: obj
            .get(tags::MODALITY)
            .and_then(|e| e.value().to_str().ok())
            .map(|s| clean(&s).to_string())
            .filter(|s| !s.is_empty()),
    }
}

pub fn extract_transfer_syntax(obj: &Dataset) -> TransferSyntax {
    match clean(obj.meta().transfer_syntax()) {
        "" => TransferSyntax::from_uid(DEFAULT_TRANSFER_SYNTAX),
        uid => TransferSyntax::from_uid(uid),
    }
}

pub fn extract_sop_class(obj: &Dataset) -> Option<SopClass> {
    let uid = obj.get(tags::SOP_CLASS_UID)?.value().to_str().ok()?;
    SopClass::lookup(clean(&uid))
}
