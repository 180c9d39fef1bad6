use anyhow::{Result, anyhow};
use image::{DynamicImage, RgbaImage};
use viuer::{Config as ViuerConfig, print};
use crate::cli::Args;
use std::io::{IsTerminal, Write};

fn viuer_config(args: &Args, absolute_offset: bool) -> ViuerConfig {
    let is_tty = std::io::stdout().is_terminal();

    let (config_width, config_height) = match (args.width, args.height) {
        (Some(w), ..) => (Some(w), None),
        (None, Some(h)) => (None, Some(h)),
        (None, None) => (Some(48), None),
    };

    ViuerConfig {
        width: config_width,
        height: config_height,
        absolute_offset,
        x: 0,
        y: 0,
        use_kitty: is_tty,
        use_iterm: is_tty,
        use_sixel: is_tty,
        ..Default::default()
    }
}

/// Print the composited view to the terminal
pub fn print_view(canvas: &RgbaImage, args: &Args) -> Result<()> {
    print_with(canvas, args, false)
}

/// Print the view at the top-left corner, for redraws in interactive mode
pub fn print_view_at_origin(canvas: &RgbaImage, args: &Args) -> Result<()> {
    print_with(canvas, args, true)
}

fn print_with(canvas: &RgbaImage, args: &Args, absolute_offset: bool) -> Result<()> {
    let config = viuer_config(args, absolute_offset);
    let image = DynamicImage::ImageRgba8(canvas.clone());

    std::io::stdout().flush()
        .map_err(|e| anyhow!("Failed to flush stdout: {e}"))?;

    print(&image, &config)
        .map_err(|e| anyhow!("Failed to display image: {e}"))?;

    Ok(())
}
