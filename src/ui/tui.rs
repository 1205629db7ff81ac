// src/ui/tui.rs
//! Terminal host: owns the screen, feeds input and frames to the app.

use std::{io, time::Instant};

use anyhow::Result;
use crossterm::{
    event::{self, Event as CEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::info;
use ratatui::{Terminal, backend::CrosstermBackend, layout::Rect};

use crate::{app::App, audio::AudioBackend, ui::layout::compute_layout};

type Term = Terminal<CrosstermBackend<io::Stdout>>;

pub fn run<B: AudioBackend>(mut app: App<B>) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = event_loop(&mut terminal, &mut app);

    // Restore the terminal even when the loop failed
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

fn raster_size(terminal: &Term) -> Result<(u32, u32)> {
    let size = terminal.size()?;
    let layout = compute_layout(Rect::new(0, 0, size.width, size.height));
    Ok(layout.raster_pixels())
}

fn event_loop<B: AudioBackend>(terminal: &mut Term, app: &mut App<B>) -> Result<()> {
    let (width, height) = raster_size(terminal)?;
    app.mount(width, height);
    info!("tui: raster {}x{}", width, height);

    let frame_interval = app.frame_interval();
    let mut last_frame = Instant::now();

    loop {
        app.process_metadata();
        app.tick();
        terminal.draw(|f| app.draw(f))?;

        // Handle input until the next frame is due
        loop {
            let remaining = frame_interval.saturating_sub(last_frame.elapsed());
            if remaining.is_zero() || !event::poll(remaining)? {
                break;
            }
            match event::read()? {
                CEvent::Key(key) => {
                    if app.on_key(key) {
                        return Ok(());
                    }
                }
                CEvent::Resize(_, _) => {
                    let (width, height) = raster_size(terminal)?;
                    app.sync_size(width, height);
                }
                _ => {}
            }
        }
        last_frame = Instant::now();
    }
}
