use crate::image::Preset;
use crate::types::Point2D;
use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

/// A terminal DICOM viewer with window/level control and polygon labels
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// DICOM file path(s) to display
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Output width in terminal columns
    #[arg(short = 'W', long)]
    pub width: Option<u32>,

    /// Output height in terminal rows
    #[arg(short = 'H', long)]
    pub height: Option<u32>,

    /// Show DICOM metadata
    #[arg(short, long)]
    pub verbose: bool,

    /// Window center, in calibrated units
    #[arg(long, allow_negative_numbers = true)]
    pub center: Option<f64>,

    /// Window width, in calibrated units (must be positive)
    #[arg(long)]
    pub window_width: Option<f64>,

    /// Window preset applied before --center/--window-width
    #[arg(long, value_enum)]
    pub preset: Option<Preset>,

    /// Swap the grayscale polarity
    #[arg(long)]
    pub invert: bool,

    /// Polygon label in image pixels, e.g. "10,10 20,10 20,20" (repeatable)
    #[arg(short, long = "label", value_name = "POINTS")]
    pub labels: Vec<PolygonArg>,

    /// Display surface size in pixels, e.g. 512x512 (defaults to the image size)
    #[arg(long, value_name = "WxH")]
    pub surface: Option<SurfaceSize>,

    /// Write the composited view to a PNG file instead of printing it
    #[arg(short, long, value_name = "PNG")]
    pub output: Option<PathBuf>,

    /// Keyboard-driven session after loading
    #[arg(short, long)]
    pub interactive: bool,
}

/// Polygon vertices as given on the command line
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonArg(pub Vec<Point2D>);

impl FromStr for PolygonArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split_whitespace()
            .map(|pair| {
                let (x, y) = pair
                    .split_once(',')
                    .ok_or_else(|| format!("expected x,y but got {pair:?}"))?;
                let x = x.trim().parse::<f64>().map_err(|e| format!("bad x in {pair:?}: {e}"))?;
                let y = y.trim().parse::<f64>().map_err(|e| format!("bad y in {pair:?}: {e}"))?;
                let point = Point2D::new(x, y);
                if !point.is_finite() {
                    return Err(format!("coordinates must be finite in {pair:?}"));
                }
                Ok(point)
            })
            .collect::<Result<Vec<_>, String>>()
            .map(Self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl FromStr for SurfaceSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WxH but got {s:?}"))?;
        let width = w.trim().parse::<u32>().map_err(|e| format!("bad width {w:?}: {e}"))?;
        let height = h.trim().parse::<u32>().map_err(|e| format!("bad height {h:?}: {e}"))?;
        if width == 0 || height == 0 {
            return Err(format!("surface must not be empty: {s:?}"));
        }
        Ok(Self { width, height })
    }
}
