/// Terminal runtime: input thread, frame loop and character-cell surface
use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use std::collections::HashSet;
use std::io::{self, stdout, Write};
use std::sync::mpsc::{self, Receiver};
use std::time::Instant;

use cell3d_core::{
    Error, FrameStats, Key, Mesh, Result, Scene, SceneSetup, SpinningMeshScene, Viewport,
};

pub mod config;
pub mod input;
pub mod renderer;

pub use config::{Args, ConfigError, RenderConfig};
pub use input::{InputEvent, RunState};
pub use renderer::CellRenderer;

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    scene: SpinningMeshScene,
    renderer: CellRenderer,
    config: RenderConfig,
    state: RunState,
    keep_logging: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    /// Build the scene for the current terminal (or the configured fixed size)
    pub fn new(mesh: Mesh, config: RenderConfig) -> Result<Self> {
        let (width, height) = match config.fixed_size() {
            Some(size) => size,
            None => {
                let (columns, rows) = terminal::size()?;
                (
                    config.width.unwrap_or(u32::from(columns)),
                    config.height.unwrap_or(u32::from(rows)),
                )
            }
        };
        let viewport = Viewport::new(width, height)?;
        log::info!("Surface {}x{} cells at {} fps", width, height, config.target_fps);

        let scene = SpinningMeshScene::on_init(SceneSetup {
            mesh,
            pipeline: config.pipeline,
            scene: config.scene,
            viewport,
        })?;

        Ok(Self {
            scene,
            renderer: CellRenderer::new(width as usize, height as usize),
            config,
            state: RunState::new(),
            keep_logging: false,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    /// Keep log output enabled on the alternate screen (log goes to a file)
    pub fn keep_logging(mut self, enabled: bool) -> Self {
        self.keep_logging = enabled;
        self
    }

    /// Handle that stops the frame loop from another thread
    pub fn run_state(&self) -> RunState {
        self.state.clone()
    }

    pub fn run(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        // Log lines would land on the cell surface
        let log_level = log::max_level();
        if !self.keep_logging {
            log::set_max_level(log::LevelFilter::Off);
        }

        let (sender, receiver) = mpsc::channel();
        let input = input::spawn_input_thread(self.state.clone(), sender);

        let result = self.main_loop(&receiver);

        // Cleanup
        self.state.stop();
        let joined = input.join();
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;
        log::set_max_level(log_level);

        match joined {
            Ok(input_result) => input_result?,
            Err(_) => return Err(Error::Io(io::Error::other("input thread panicked"))),
        }
        result
    }

    fn main_loop(&mut self, events: &Receiver<InputEvent>) -> Result<()> {
        let target_frame_time = self.config.frame_budget();
        let mut previous = Instant::now();

        while self.state.is_running() {
            let frame_start = Instant::now();
            let elapsed = frame_start.duration_since(previous).as_secs_f32();
            previous = frame_start;

            // A key counts as held for the frame its event arrives in
            let mut held = HashSet::new();
            for event in events.try_iter() {
                match event {
                    InputEvent::Key(key) => {
                        held.insert(key);
                    }
                    InputEvent::Resize(columns, rows) => self.resize(columns, rows)?,
                }
            }
            if held.contains(&Key::Quit) {
                self.state.stop();
                break;
            }

            let output = self.scene.on_frame(elapsed, &held)?;
            self.renderer.clear();
            output.rasterize(&mut self.renderer);
            self.present(&output.stats)?;

            // Frame timing
            self.frame_count += 1;
            let spent = frame_start.elapsed();
            if spent < target_frame_time {
                std::thread::sleep(target_frame_time - spent);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn resize(&mut self, columns: u16, rows: u16) -> Result<()> {
        if self.config.fixed_size().is_some() {
            return Ok(());
        }
        let width = self.config.width.unwrap_or(u32::from(columns));
        let height = self.config.height.unwrap_or(u32::from(rows));
        let viewport = match Viewport::new(width, height) {
            Ok(viewport) => viewport,
            Err(err) => {
                log::warn!("Ignoring resize to {}x{}: {}", width, height, err);
                return Ok(());
            }
        };

        self.scene.on_resize(viewport)?;
        self.renderer.resize(width as usize, height as usize);
        execute!(stdout(), terminal::Clear(ClearType::All))?;
        log::debug!("Resized to {}x{}", width, height);
        Ok(())
    }

    fn present(&self, stats: &FrameStats) -> Result<()> {
        let mut stdout = stdout();
        self.renderer.draw(&mut stdout)?;

        // Draw UI overlay
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetBackgroundColor(Color::Black),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "cell3d | FPS: {:.1} | {}/{} tris | Arrows=Move W/S=Fly A/D=Turn R/F=Look Q=Quit",
                self.fps, stats.emitted, stats.input
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}
