pub mod annotation;
pub mod cli;
pub mod collab;
pub mod dicom;
pub mod display;
pub mod display_metadata;
pub mod image;
pub mod input;
pub mod interactive;
pub mod overlay;
pub mod types;
pub mod view;
pub mod viewer;

// Re-export commonly used items
pub use display_metadata::print_metadata;
pub use viewer::{Viewer, ViewerConfig, ViewerError};
