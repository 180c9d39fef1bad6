//! Keyboard-driven terminal session
//!
//! View shortcuts go through the [`InputDispatcher`]; arrow keys pan by
//! simulating a pointer drag, and a few extra keys adjust the window and
//! manage labels.

use crate::cli::Args;
use crate::collab::ConfirmPrompt;
use crate::display;
use crate::image::Preset;
use crate::input::{InputDispatcher, InputEvent};
use crate::overlay::RasterSurface;
use crate::types::Point2D;
use crate::viewer::Viewer;
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::{cursor, execute, terminal};
use log::debug;
use std::io::{Write, stdout};

/// Pan distance of one arrow key press, as a fraction of the surface
const PAN_FRACTION: f64 = 0.1;
const WIDTH_STEP: f64 = 1.1;
const CENTER_STEP_FRACTION: f64 = 0.05;

const HELP: &str = "0-6 view  +/- zoom  arrows pan  i invert  p preset  [ ] width  , . center  \
                    d draw  Enter finish  Esc cancel  e edit  x delete  q quit";

/// Asks yes/no on the terminal; any key other than `y` declines
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt;

impl ConfirmPrompt for TerminalPrompt {
    fn confirm(&self, message: &str) -> bool {
        print!("\r\n{message} [y/N] ");
        if stdout().flush().is_err() {
            return false;
        }
        loop {
            match event::read() {
                Ok(Event::Key(KeyEvent { code, kind: KeyEventKind::Press, .. })) => {
                    return matches!(code, KeyCode::Char('y' | 'Y'));
                }
                Ok(_) => {}
                Err(e) => {
                    debug!("Prompt read failed: {e}");
                    return false;
                }
            }
        }
    }
}

#[derive(Debug)]
enum Step {
    Redraw,
    Continue,
    Quit,
}

/// Run until the user quits. The terminal is restored on every exit path.
pub fn run(viewer: &mut Viewer, args: &Args, surface: (u32, u32)) -> Result<()> {
    terminal::enable_raw_mode().context("Failed to enable raw terminal mode")?;
    let result = event_loop(viewer, args, surface);
    let restored = terminal::disable_raw_mode().context("Failed to restore terminal");
    result.and(restored)
}

fn redraw(viewer: &mut Viewer, args: &Args, surface: (u32, u32)) -> Result<()> {
    viewer.wait_render()?;
    let mut raster = RasterSurface::new(surface.0, surface.1);
    viewer.compose(&mut raster);

    execute!(stdout(), terminal::Clear(terminal::ClearType::All), cursor::MoveTo(0, 0))?;
    display::print_view_at_origin(raster.canvas(), args)?;

    let labels = viewer.annotations().labels().len();
    print!(
        "\r\n{}  scale {:.2}  {} label(s)  [{}]\r\n{HELP}\r\n",
        viewer.window(),
        viewer.view().scale(),
        labels,
        viewer.annotations().session().name()
    );
    stdout().flush()?;
    Ok(())
}

fn event_loop(viewer: &mut Viewer, args: &Args, surface: (u32, u32)) -> Result<()> {
    let dispatcher = InputDispatcher::new();
    let mut preset_index = 0;
    redraw(viewer, args, surface)?;

    loop {
        let Event::Key(KeyEvent { code, kind: KeyEventKind::Press, .. }) = event::read()? else {
            continue;
        };

        // Recoverable errors already went to the notifier
        let step = handle_key(viewer, &dispatcher, code, surface, &mut preset_index).unwrap_or(Step::Redraw);
        match step {
            Step::Quit => return Ok(()),
            Step::Redraw => redraw(viewer, args, surface)?,
            Step::Continue => {}
        }
    }
}

fn handle_key(
    viewer: &mut Viewer,
    dispatcher: &InputDispatcher,
    code: KeyCode,
    surface: (u32, u32),
    preset_index: &mut usize,
) -> Result<Step> {
    let center = Point2D::new(f64::from(surface.0), f64::from(surface.1)) / 2.0;
    let pan_step = f64::from(surface.0.min(surface.1)) * PAN_FRACTION;
    let window = *viewer.window();

    match code {
        KeyCode::Char('q') => return Ok(Step::Quit),
        KeyCode::Esc => {
            if viewer.annotations().drawing_points().is_some() {
                viewer.cancel_drawing()?;
            } else if viewer.annotations().editing_index().is_some() {
                viewer.cancel_editing()?;
            } else {
                return Ok(Step::Quit);
            }
        }
        KeyCode::Left | KeyCode::Right | KeyCode::Up | KeyCode::Down => {
            let delta = match code {
                KeyCode::Left => Point2D::new(pan_step, 0.0),
                KeyCode::Right => Point2D::new(-pan_step, 0.0),
                KeyCode::Up => Point2D::new(0.0, pan_step),
                _ => Point2D::new(0.0, -pan_step),
            };
            viewer.view_mut().pan(delta);
        }
        KeyCode::Char('p') => {
            *preset_index = (*preset_index + 1) % Preset::ALL.len();
            viewer.apply_preset(Preset::ALL[*preset_index])?;
        }
        KeyCode::Char('[') => viewer.set_window_width(window.width / WIDTH_STEP)?,
        KeyCode::Char(']') => viewer.set_window_width(window.width * WIDTH_STEP)?,
        KeyCode::Char(',') => viewer.set_window_center(window.center - window.width * CENTER_STEP_FRACTION)?,
        KeyCode::Char('.') => viewer.set_window_center(window.center + window.width * CENTER_STEP_FRACTION)?,
        KeyCode::Char('d') => viewer.start_drawing()?,
        KeyCode::Char('e') => {
            let last = viewer.annotations().labels().len().checked_sub(1);
            if let Some(index) = last {
                viewer.start_editing(index)?;
            }
        }
        KeyCode::Char('x') => {
            let last = viewer.annotations().labels().len().checked_sub(1);
            if let Some(index) = last {
                viewer.delete_label(index)?;
            }
        }
        KeyCode::Enter => {
            if viewer.annotations().drawing_points().is_some() {
                viewer.finish_drawing()?;
            } else if viewer.annotations().editing_index().is_some() {
                viewer.finish_editing()?;
            }
        }
        KeyCode::Char(' ') => {
            // Add a vertex at the surface centre
            dispatcher.dispatch(viewer, InputEvent::Click(center))?;
        }
        KeyCode::Char(c) => {
            if !dispatcher.dispatch(viewer, InputEvent::Key(c))? {
                return Ok(Step::Continue);
            }
        }
        _ => return Ok(Step::Continue),
    }
    Ok(Step::Redraw)
}
