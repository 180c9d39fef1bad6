//! Named window/level presets

use crate::types::WindowSettings;
use clap::ValueEnum;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// Window stored in the file
    Default,
    Brain,
    Lung,
    Abdomen,
    Bone,
}

impl Preset {
    pub const ALL: [Self; 5] = [Self::Default, Self::Brain, Self::Lung, Self::Abdomen, Self::Bone];

    /// Center and width in calibrated units, `None` for the file default
    #[must_use]
    pub fn center_width(self) -> Option<(f64, f64)> {
        match self {
            Self::Default => None,
            Self::Brain => Some((40.0, 80.0)),
            Self::Lung => Some((-600.0, 1500.0)),
            Self::Abdomen => Some((50.0, 350.0)),
            Self::Bone => Some((480.0, 2500.0)),
        }
    }

    /// Window for this preset; polarity is carried over from `current`
    #[must_use]
    pub fn window(self, file_default: &WindowSettings, current: &WindowSettings) -> WindowSettings {
        let (center, width) = self
            .center_width()
            .unwrap_or((file_default.center, file_default.width));
        WindowSettings::new(center, width, current.inverted)
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Default => "default",
            Self::Brain => "brain",
            Self::Lung => "lung",
            Self::Abdomen => "abdomen",
            Self::Bone => "bone",
        };
        f.write_str(name)
    }
}
