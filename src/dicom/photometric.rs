//! Grayscale polarity of the stored samples

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

const MONOCHROME1: &str = "MONOCHROME1";
const MONOCHROME2: &str = "MONOCHROME2";

/// `(0028,0004)`. Colour models are kept by name only so they can be reported and rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotometricInterpretation {
    /// Minimum sample is displayed white
    Monochrome1,
    Monochrome2,
    Other(String),
}

impl FromStr for PhotometricInterpretation {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim_matches(|c: char| c.is_whitespace() || c == '\0');
        Ok(match value {
            MONOCHROME1 => Self::Monochrome1,
            MONOCHROME2 => Self::Monochrome2,
            other => Self::Other(other.to_owned()),
        })
    }
}

impl PhotometricInterpretation {
    #[must_use]
    pub fn is_grayscale(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    #[inline]
    #[must_use]
    pub fn is_inverted(&self) -> bool {
        *self == Self::Monochrome1
    }

    /// MONOCHROME1 <-> MONOCHROME2; anything else is returned unchanged
    #[must_use]
    pub fn toggled(&self) -> Self {
        match self {
            Self::Monochrome1 => Self::Monochrome2,
            Self::Monochrome2 => Self::Monochrome1,
            Self::Other(name) => Self::Other(name.clone()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Monochrome1 => MONOCHROME1,
            Self::Monochrome2 => MONOCHROME2,
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for PhotometricInterpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_polarity() {
        let pi = PhotometricInterpretation::Monochrome2;
        assert!(!pi.is_inverted());
        assert!(pi.toggled().is_inverted());
        assert_eq!(pi.toggled().toggled(), pi);

        let rgb = PhotometricInterpretation::Other("RGB".into());
        assert_eq!(rgb.toggled(), rgb);
        assert!(!rgb.is_grayscale());
    }

    #[test]
    fn test_parse_trims_padding() {
        let pi: PhotometricInterpretation = "MONOCHROME1 ".parse().unwrap();
        assert_eq!(pi, PhotometricInterpretation::Monochrome1);
        assert_eq!(pi.to_string(), "MONOCHROME1");

        let palette: PhotometricInterpretation = "PALETTE COLOR".parse().unwrap();
        assert_eq!(palette.to_string(), "PALETTE COLOR");
    }
}
