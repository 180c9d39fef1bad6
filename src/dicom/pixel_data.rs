//! DICOM pixel data extraction
//!
//! Turns the native (uncompressed) pixel data element into a typed sample
//! array according to the declared bit depth and signedness.

use super::error::LoadError;
use crate::types::{ImageGeometry, PixelRepresentation};
use dicom::core::PrimitiveValue;

/// Raw stored samples, one variant per supported storage type
#[derive(Clone, PartialEq)]
pub enum RawSamples {
    U8(Vec<u8>),
    U16(Vec<u16>),
    I16(Vec<i16>),
}

impl std::fmt::Debug for RawSamples {
    // Don't print every sample, just the type and length.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Self::U8(_) => "U8",
            Self::U16(_) => "U16",
            Self::I16(_) => "I16",
        };
        f.debug_struct("RawSamples")
            .field("kind", &kind)
            .field("len", &self.len())
            .finish()
    }
}

impl RawSamples {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::U8(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::I16(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decode the pixel data element value into typed samples.
///
/// The element may hold raw bytes (OB, or OW kept as bytes) or 16-bit words
/// already decoded by the parser. Byte input is read little-endian unless
/// `big_endian` is set.
///
/// # Errors
///
/// `UnsupportedPixelData` for bit depths other than 8/16 or values that are not
/// a native byte/word array, `DecodeSizeMismatch` when the sample count differs
/// from `rows x columns x samples per pixel`.
pub fn decode_pixel_data(
    value: &PrimitiveValue,
    geometry: &ImageGeometry,
    big_endian: bool,
) -> Result<RawSamples, LoadError> {
    let signed = geometry.pixel_representation == PixelRepresentation::Signed;

    let samples = match (geometry.bits_allocated, value) {
        (8, PrimitiveValue::U8(bytes)) => RawSamples::U8(without_pad_byte(bytes.to_vec(), geometry)),
        (8, PrimitiveValue::U16(words)) => {
            // 8-bit samples packed into OW words, two per word
            let bytes = words
                .iter()
                .flat_map(|w| if big_endian { w.to_be_bytes() } else { w.to_le_bytes() })
                .collect();
            RawSamples::U8(without_pad_byte(bytes, geometry))
        }
        (16, PrimitiveValue::U8(bytes)) => {
            if !bytes.len().is_multiple_of(2) {
                return Err(size_mismatch(geometry, bytes.len() / 2));
            }
            let words: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|chunk| {
                    let pair = [chunk[0], chunk[1]];
                    if big_endian {
                        u16::from_be_bytes(pair)
                    } else {
                        u16::from_le_bytes(pair)
                    }
                })
                .collect();
            words_to_samples(words, signed)
        }
        (16, PrimitiveValue::U16(words)) => words_to_samples(words.to_vec(), signed),
        (16, PrimitiveValue::I16(words)) => {
            if signed {
                RawSamples::I16(words.to_vec())
            } else {
                RawSamples::U16(words.iter().map(|&w| w.cast_unsigned()).collect())
            }
        }
        (8 | 16, PrimitiveValue::Empty) => return Err(LoadError::MissingPixelData),
        (8 | 16, _) => {
            return Err(LoadError::UnsupportedPixelData(
                "pixel data is not a native byte or word array".to_string(),
            ));
        }
        (bits, _) => {
            return Err(LoadError::UnsupportedPixelData(format!(
                "{bits} bits allocated"
            )));
        }
    };

    if samples.len() != geometry.sample_count() {
        return Err(size_mismatch(geometry, samples.len()));
    }

    Ok(samples)
}

/// Values have even length, so an odd 8-bit sample count carries one trailing pad byte
fn without_pad_byte(mut bytes: Vec<u8>, geometry: &ImageGeometry) -> Vec<u8> {
    let expected = geometry.sample_count();
    if expected % 2 == 1 && bytes.len() == expected + 1 {
        bytes.truncate(expected);
    }
    bytes
}

fn words_to_samples(words: Vec<u16>, signed: bool) -> RawSamples {
    if signed {
        RawSamples::I16(words.into_iter().map(u16::cast_signed).collect())
    } else {
        RawSamples::U16(words)
    }
}

fn size_mismatch(geometry: &ImageGeometry, actual: usize) -> LoadError {
    LoadError::DecodeSizeMismatch {
        expected: geometry.sample_count(),
        actual,
        rows: geometry.rows,
        cols: geometry.cols,
        samples_per_pixel: geometry.samples_per_pixel,
    }
}
