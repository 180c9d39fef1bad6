use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser};
use dcmlabel::cli::Args;
use dcmlabel::collab::{ConfirmPrompt, FixedAnswer, Notifier};
use dcmlabel::interactive::{self, TerminalPrompt};
use dcmlabel::overlay::RasterSurface;
use dcmlabel::types::Size;
use dcmlabel::viewer::{Viewer, ViewerConfig};
use dcmlabel::{display, print_metadata};
use log::info;
use std::path::Path;

/// Recoverable problems go to stderr next to the image
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str) {
        eprintln!("Warning: {message}");
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if args.files.is_empty() {
        let _ = Args::command().print_help();
        println!();
        return;
    }

    if args.output.is_some() && args.files.len() > 1 {
        println!("Error: --output needs exactly one input file");
        std::process::exit(2);
    }

    let multiple_files = args.files.len() > 1;
    let mut any_failed = false;

    for (idx, file_path) in args.files.iter().enumerate() {
        if multiple_files {
            println!("{}", file_path.display());
        }

        if let Err(e) = process_file(file_path, &args) {
            println!("Error: {e:#}");
            any_failed = true;
        }

        if multiple_files && idx < args.files.len() - 1 {
            println!();
        }
    }

    if any_failed {
        std::process::exit(1);
    }
}

/// Load, adjust, annotate and show a single DICOM file
fn process_file(file_path: &Path, args: &Args) -> Result<()> {
    let confirm: Box<dyn ConfirmPrompt> = if args.interactive {
        Box::new(TerminalPrompt)
    } else {
        Box::new(FixedAnswer(false))
    };
    let mut viewer = Viewer::new(ViewerConfig::default(), Box::new(ConsoleNotifier), confirm);

    // Stage 1: Load
    viewer
        .load(&file_path.to_path_buf())
        .with_context(|| format!("Failed to load {}", file_path.display()))?;
    let Some(image) = viewer.image() else {
        bail!("No image after loading {}", file_path.display());
    };

    let (surface_w, surface_h) = args
        .surface
        .map_or((u32::from(image.cols()), u32::from(image.rows())), |s| (s.width, s.height));
    let origin = viewer.config().surface_origin;
    viewer
        .view_mut()
        .set_surface(origin, Size::new(f64::from(surface_w), f64::from(surface_h)));

    // Stage 2: Window adjustments
    if let Some(preset) = args.preset {
        viewer.apply_preset(preset)?;
    }
    if let Some(center) = args.center {
        viewer.set_window_center(center)?;
    }
    if let Some(width) = args.window_width {
        viewer.set_window_width(width)?;
    }
    if args.invert {
        viewer.toggle_invert()?;
    }

    // Stage 3: Verbose output
    if args.verbose
        && let Some(image) = viewer.image()
    {
        print_metadata(image, viewer.window());
    }

    // Stage 4: Labels
    for polygon in &args.labels {
        viewer.start_drawing()?;
        for &point in &polygon.0 {
            viewer.add_point(point)?;
        }
        let id = viewer.finish_drawing()?;
        info!("Label {id} added from the command line");
    }

    viewer.wait_render().context("Failed to render image")?;

    if args.interactive {
        return interactive::run(&mut viewer, args, (surface_w, surface_h));
    }

    // Stage 5: Compose and output
    let mut surface = RasterSurface::new(surface_w, surface_h);
    viewer.compose(&mut surface);
    let canvas = surface.into_canvas();

    match &args.output {
        Some(output) => canvas
            .save(output)
            .with_context(|| format!("Failed to write {}", output.display()))?,
        None => display::print_view(&canvas, args)?,
    }

    Ok(())
}
