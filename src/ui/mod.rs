use std::{
    error::Error,
    io,
    time::{Duration, Instant},
};

use crossterm::{
    event::{self, Event as CrosstermEvent, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Terminal,
};
use tracing::{debug, info};

use crate::{
    config::{self, FieldConfig},
    core::ParticleField,
    render::{self, FrameBuffer, RenderCell, Viewport},
    types::ColorId,
};

type Term = Terminal<CrosstermBackend<io::Stdout>>;

pub fn run(config: FieldConfig, seed: Option<u64>) -> Result<(), Box<dyn Error>> {
    let mut driver = Driver::start(config, seed)?;
    let result = driver.run();
    driver.stop()?;
    result
}

/// Owns the terminal and the frame loop; the field itself only ever sees
/// `tick`, `resize` and reads.
pub struct Driver {
    terminal: Option<Term>,
    field: ParticleField,
    framebuf: FrameBuffer,
    last_frame: Option<Instant>,
    paused: bool,
    frame_counter: u32,
    last_fps_sample: Instant,
    fps: f32,
}

impl Driver {
    pub fn start(config: FieldConfig, seed: Option<u64>) -> Result<Self, Box<dyn Error>> {
        enable_raw_mode()?;
        let terminal = undo_on_err(enter_screen(), || {
            let _ = disable_raw_mode();
        })?;

        let viewport = pane_viewport(terminal.size()?);
        let (width, height) = (viewport.logical_width(), viewport.logical_height());
        let field = match seed {
            Some(seed) => ParticleField::seeded(config, width, height, seed),
            None => ParticleField::from_entropy(config, width, height),
        };
        info!(
            particles = field.particles().len(),
            reduced_motion = config.reduced_motion,
            ?seed,
            "particle field started"
        );
        debug!(effective = ?field.effective(), "effective configuration");

        Ok(Self {
            terminal: Some(terminal),
            field,
            framebuf: FrameBuffer::new(viewport),
            last_frame: None,
            paused: false,
            frame_counter: 0,
            last_fps_sample: Instant::now(),
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> Result<(), Box<dyn Error>> {
        let frame_interval = Duration::from_secs_f32(1.0 / config::TARGET_FPS);

        loop {
            let frame_start = Instant::now();

            while event::poll(Duration::from_millis(0))? {
                match event::read()? {
                    CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                            KeyCode::Char(' ') => self.toggle_pause(),
                            _ => {}
                        }
                    }
                    CrosstermEvent::Resize(cols, rows) => {
                        self.ensure_viewport(pane_viewport(Rect::new(0, 0, cols, rows)));
                    }
                    _ => {}
                }
            }

            if !self.paused {
                let elapsed_ms = self
                    .last_frame
                    .map(|last| last.elapsed().as_secs_f64() * 1000.0);
                self.last_frame = Some(Instant::now());
                self.field.tick(elapsed_ms);
                self.frame_counter += 1;
            }
            self.sample_fps();
            self.draw()?;

            if let Some(rest) = frame_interval.checked_sub(frame_start.elapsed()) {
                std::thread::sleep(rest);
            }
        }
    }

    /// Restores the terminal. Safe to call more than once.
    pub fn stop(&mut self) -> Result<(), Box<dyn Error>> {
        let Some(mut terminal) = self.terminal.take() else {
            return Ok(());
        };
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        info!("particle field stopped");
        Ok(())
    }

    fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        // first frame after resuming must not see the pause as elapsed time
        self.last_frame = None;
        debug!(paused = self.paused, "toggled pause");
    }

    fn ensure_viewport(&mut self, viewport: Viewport) {
        if self.framebuf.viewport() == viewport {
            return;
        }
        self.framebuf.resize(viewport);
        self.field
            .resize(viewport.logical_width(), viewport.logical_height());
        self.last_frame = None;
        info!(
            cols = viewport.cols,
            rows = viewport.rows,
            particles = self.field.particles().len(),
            "viewport resized, field respawned"
        );
    }

    fn sample_fps(&mut self) {
        let since = self.last_fps_sample.elapsed();
        if since >= Duration::from_secs(1) {
            self.fps = self.frame_counter as f32 / since.as_secs_f32();
            self.frame_counter = 0;
            self.last_fps_sample = Instant::now();
        }
    }

    fn draw(&mut self) -> Result<(), Box<dyn Error>> {
        let Some(terminal) = self.terminal.as_mut() else {
            return Ok(());
        };
        let stats = self.field.stats();
        let dot_radius = self.field.effective().dot_radius;
        let connect_radius = self.field.effective().connect_radius;
        let reduced_motion = self.field.config().reduced_motion;
        let paused = self.paused;
        let fps = self.fps;
        let field = &self.field;
        let framebuf = &mut self.framebuf;

        terminal.draw(|frame| {
            let chunks = split(frame.size());
            let header = Paragraph::new(format!(
                "particles: {} | edges: {} | cand/particle: {:.1} | r: {:.0} | fps: {:.1} | reduced motion: {}{}",
                stats.particles,
                stats.edges,
                stats.candidates_avg,
                connect_radius,
                fps,
                if reduced_motion { "on" } else { "off" },
                if paused { " | PAUSED" } else { "" },
            ))
            .block(Block::default().borders(Borders::ALL).title("particlefield"));
            frame.render_widget(header, chunks[0]);

            framebuf.clear();
            render::render(field.particles(), field.edges(), dot_radius, framebuf);
            let lines: Vec<Line> = (0..framebuf.height())
                .map(|y| {
                    let spans: Vec<Span> = (0..framebuf.width())
                        .map(|x| {
                            let cell = framebuf.get(x, y);
                            Span::styled(cell.ch.to_string(), Style::default().fg(color_for(&cell)))
                        })
                        .collect();
                    Line::from(spans)
                })
                .collect();
            let pane = Paragraph::new(lines)
                .block(Block::default().borders(Borders::ALL).title("Field"));
            frame.render_widget(pane, chunks[1]);

            let footer = Paragraph::new("space: pause/resume | q: quit")
                .block(Block::default().borders(Borders::ALL).title("Controls"));
            frame.render_widget(footer, chunks[2]);
        })?;
        Ok(())
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Runs `undo` when `result` failed, e.g. to leave raw mode before a `Driver` exists.
fn undo_on_err<T>(
    result: Result<T, Box<dyn Error>>,
    undo: impl FnOnce(),
) -> Result<T, Box<dyn Error>> {
    if result.is_err() {
        undo();
    }
    result
}

fn enter_screen() -> Result<Term, Box<dyn Error>> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    Ok(terminal)
}

fn split(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(area)
        .to_vec()
}

/// Cell grid inside the bordered field pane for a terminal of `size`.
fn pane_viewport(size: Rect) -> Viewport {
    let inner = Block::default().borders(Borders::ALL).inner(split(size)[1]);
    Viewport {
        cols: inner.width,
        rows: inner.height,
        px_per_col: config::CELL_PX_X,
        px_per_row: config::CELL_PX_Y,
    }
}

fn color_for(cell: &RenderCell) -> Color {
    match cell.color {
        ColorId::Background => Color::Reset,
        ColorId::Dot => Color::White,
        ColorId::Line if cell.coverage < 0.12 => Color::DarkGray,
        ColorId::Line if cell.coverage < 0.3 => Color::Gray,
        ColorId::Line => Color::Cyan,
    }
}
