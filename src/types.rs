//! Domain types shared by the decode pipeline and the view/annotation engine

use dicom::core::dictionary::UidDictionary;
use dicom::dictionary_std::sop_class::StandardSopClassDictionary;
use dicom::encoding::TransferSyntaxIndex;
use dicom::transfer_syntax::{TransferSyntaxRegistry, entries};
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

/// Placeholder reported for any text attribute that is missing or unreadable
pub const UNKNOWN: &str = "Unknown";

/// Transfer syntax of the file meta group, resolved against the codec registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSyntax {
    pub uid: String,
    pub name: String,
}

impl TransferSyntax {
    #[must_use]
    pub fn new(uid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
        }
    }

    /// Unregistered UIDs keep the UID with an unknown name
    #[must_use]
    pub fn from_uid(uid: &str) -> Self {
        let name = TransferSyntaxRegistry.get(uid).map_or(UNKNOWN, |ts| ts.name());
        Self::new(uid, name)
    }

    #[inline]
    #[must_use]
    #[allow(deprecated)] // Explicit VR Big Endian is retired but still in use
    pub fn is_big_endian(&self) -> bool {
        self.uid == entries::EXPLICIT_VR_BIG_ENDIAN.uid()
    }

    /// JPEG, JPEG-LS, JPEG 2000 and RLE families carry encapsulated pixel data
    #[inline]
    #[must_use]
    pub fn is_compressed(&self) -> bool {
        ["1.2.840.10008.1.2.4", "1.2.840.10008.1.2.5"]
            .iter()
            .any(|family| self.uid.starts_with(family))
    }
}

impl fmt::Display for TransferSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.uid)
    }
}

/// Standard storage SOP class of the instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SopClass {
    pub uid: String,
    pub name: String,
}

impl SopClass {
    /// `None` for UIDs outside the standard dictionary
    #[must_use]
    pub fn lookup(uid: &str) -> Option<Self> {
        StandardSopClassDictionary.by_uid(uid).map(|entry| Self {
            uid: uid.to_owned(),
            name: entry.name.to_owned(),
        })
    }
}

impl fmt::Display for SopClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.uid)
    }
}

/// Modality LUT: `calibrated = stored * slope + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RescaleParams {
    pub slope: f64,
    pub intercept: f64,
}

impl RescaleParams {
    pub const IDENTITY: Self = Self::new(1.0, 0.0);

    #[must_use]
    pub const fn new(slope: f64, intercept: f64) -> Self {
        Self { slope, intercept }
    }

    /// Runs once per sample
    #[inline(always)]
    #[must_use]
    pub fn apply(&self, stored: f64) -> f64 {
        stored * self.slope + self.intercept
    }
}

impl Default for RescaleParams {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl fmt::Display for RescaleParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stored * {} {:+}", self.slope, self.intercept)
    }
}

/// Signedness of the stored samples, (0028,0103)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelRepresentation {
    #[default]
    Unsigned,
    Signed,
}

impl From<u16> for PixelRepresentation {
    fn from(value: u16) -> Self {
        if value == 0 { Self::Unsigned } else { Self::Signed }
    }
}

/// Raster layout of a loaded image. Fixed for the lifetime of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageGeometry {
    pub rows: u16,
    pub cols: u16,
    pub samples_per_pixel: u16,
    pub bits_allocated: u16,
    pub bits_stored: u16,
    pub high_bit: u16,
    pub pixel_representation: PixelRepresentation,
    pub planar_configuration: u16,
}

impl ImageGeometry {
    #[inline]
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        usize::from(self.rows) * usize::from(self.cols)
    }

    /// Number of samples the pixel data element must hold
    #[inline]
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.pixel_count() * usize::from(self.samples_per_pixel)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// One or two bytes per sample, with the stored bits fitting the allocation
    #[must_use]
    pub fn has_supported_depth(&self) -> bool {
        matches!(self.bits_allocated, 8 | 16) && self.bits_stored <= self.bits_allocated
    }

    /// Native size in pixels, width first
    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(f64::from(self.cols), f64::from(self.rows))
    }
}

impl fmt::Display for ImageGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = match self.pixel_representation {
            PixelRepresentation::Unsigned => "unsigned",
            PixelRepresentation::Signed => "signed",
        };
        write!(
            f,
            "{}x{}, {} of {} bits {sign}",
            self.cols, self.rows, self.bits_stored, self.bits_allocated
        )
    }
}

/// Current window/level applied to the calibrated values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSettings {
    pub center: f64,
    pub width: f64,
    pub inverted: bool,
}

impl WindowSettings {
    pub const DEFAULT_CENTER: f64 = 127.0;
    pub const DEFAULT_WIDTH: f64 = 256.0;
    pub const HU_CENTER: f64 = 40.0;
    pub const HU_WIDTH: f64 = 400.0;

    #[must_use]
    pub fn new(center: f64, width: f64, inverted: bool) -> Self {
        Self {
            center,
            width,
            inverted,
        }
    }

    /// Replace a non-positive width with the modality default for the rescale type
    #[must_use]
    pub fn corrected(center: f64, width: f64, rescale_type: &str) -> Self {
        if width > 0.0 && width.is_finite() && center.is_finite() {
            Self::new(center, width, false)
        } else if rescale_type == "HU" {
            Self::new(Self::HU_CENTER, Self::HU_WIDTH, false)
        } else {
            Self::new(Self::DEFAULT_CENTER, Self::DEFAULT_WIDTH, false)
        }
    }

    #[inline]
    #[must_use]
    pub fn low(&self) -> f64 {
        self.center - 0.5 * self.width
    }

    #[inline]
    #[must_use]
    pub fn high(&self) -> f64 {
        self.center + 0.5 * self.width
    }
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CENTER, Self::DEFAULT_WIDTH, false)
    }
}

impl fmt::Display for WindowSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C={} W={}", self.center, self.width)?;
        if self.inverted {
            write!(f, " (inverted)")?;
        }
        Ok(())
    }
}

/// Patient attributes, with every missing field reported as [`UNKNOWN`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientInfo {
    pub name: String,
    pub id: String,
    pub birth_date: String,
    pub birth_time: String,
    pub age: String,
    pub sex: String,
    pub height: String,
    pub weight: String,
}

impl PatientInfo {
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: UNKNOWN.to_string(),
            id: UNKNOWN.to_string(),
            birth_date: UNKNOWN.to_string(),
            birth_time: UNKNOWN.to_string(),
            age: UNKNOWN.to_string(),
            sex: UNKNOWN.to_string(),
            height: UNKNOWN.to_string(),
            weight: UNKNOWN.to_string(),
        }
    }
}

impl Default for PatientInfo {
    fn default() -> Self {
        Self::new()
    }
}

/// Study-level attributes shown next to the patient block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyInfo {
    pub date: String,
    pub body_part_examined: String,
    pub patient_position: String,
    pub modality: Option<String>,
}

impl StudyInfo {
    #[must_use]
    pub fn new() -> Self {
        Self {
            date: UNKNOWN.to_string(),
            body_part_examined: UNKNOWN.to_string(),
            patient_position: UNKNOWN.to_string(),
            modality: None,
        }
    }
}

impl Default for StudyInfo {
    fn default() -> Self {
        Self::new()
    }
}

/// A point in image-pixel space (or screen space, depending on context)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance_to(&self, other: Point2D) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point2D {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2D {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point2D {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Point2D {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl fmt::Display for Point2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Width/height pair in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
