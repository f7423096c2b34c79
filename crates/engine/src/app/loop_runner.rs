use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window as OsWindow, WindowBuilder};

use crate::content::RegistryError;
use crate::world::WorldError;
use crate::StartupError;

use super::input::InputCollector;
use super::timing::{non_zero, FixedStep, FramePacer, LoopMetrics};
use super::{BackgroundWorker, Presenter, Screen, ScreenCommand, SoftwareWindow};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    /// Initial OS window size.
    pub window_width: u32,
    pub window_height: u32,
    /// Resolution the game renders at before scaling to the window.
    pub logical_width: u32,
    pub logical_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub max_render_fps: Option<u32>,
    /// Fixed pause after each presented frame.
    pub render_loop_delay: Duration,
    pub background_interval: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Overworld".to_string(),
            window_width: 960,
            window_height: 704,
            logical_width: 240,
            logical_height: 176,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            max_render_fps: Some(60),
            render_loop_delay: Duration::ZERO,
            background_interval: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to load maps: {0}")]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    World(#[from] WorldError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize presenter: {0}")]
    CreatePresenter(#[source] PixelsError),
    #[error("failed to spawn background worker: {0}")]
    SpawnBackground(#[source] std::io::Error),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Opens the window and drives `screen` until the window closes or the
/// screen asks to quit.
pub fn run_screen(config: LoopConfig, screen: Box<dyn Screen>) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    // The presenter's surface borrows the window for the rest of the process.
    let window: &'static OsWindow = Box::leak(Box::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    ));
    let mut runner = Runner::new(&config, window, screen)?;
    event_loop.set_control_flow(ControlFlow::Poll);

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => {
                if runner.window_event(event, window) == Flow::Exit {
                    window_target.exit();
                }
            }
            Event::AboutToWait => window.request_redraw(),
            Event::LoopExiting => runner.shutdown(),
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

struct Runner {
    screen: Box<dyn Screen>,
    canvas: SoftwareWindow,
    presenter: Presenter,
    input: InputCollector,
    background: BackgroundWorker,
    step: FixedStep,
    pacer: FramePacer,
    metrics: LoopMetrics,
    last_frame: Instant,
    default_title: String,
    applied_title: Option<String>,
}

impl Runner {
    fn new(
        config: &LoopConfig,
        window: &'static OsWindow,
        mut screen: Box<dyn Screen>,
    ) -> Result<Self, AppError> {
        let logical = (config.logical_width.max(1), config.logical_height.max(1));
        let presenter =
            Presenter::new(window, logical.0, logical.1).map_err(AppError::CreatePresenter)?;
        let mut canvas = SoftwareWindow::new(logical.0, logical.1);
        let background = BackgroundWorker::spawn(non_zero(
            config.background_interval,
            Duration::from_millis(100),
        ))
        .map_err(AppError::SpawnBackground)?;

        let now = Instant::now();
        let step = FixedStep::new(
            config.target_tps,
            config.max_frame_delta,
            config.max_ticks_per_frame,
        );
        let pacer = FramePacer::new(config.max_render_fps, config.render_loop_delay, now);
        let metrics_interval = non_zero(config.metrics_log_interval, Duration::from_secs(1));
        info!(
            tick_ms = step.dt().as_secs_f64() * 1000.0,
            max_frame_delta_ms = step.max_frame_delta().as_millis() as u64,
            max_ticks_per_frame = step.max_ticks(),
            render_fps_cap = %pacer.cap_label(),
            render_loop_delay_ms = config.render_loop_delay.as_millis() as u64,
            logical_width = logical.0,
            logical_height = logical.1,
            "loop_config"
        );

        screen.start(&mut canvas);
        Ok(Self {
            screen,
            canvas,
            presenter,
            input: InputCollector::default(),
            background,
            step,
            pacer,
            metrics: LoopMetrics::new(metrics_interval, now),
            last_frame: now,
            default_title: config.window_title.clone(),
            applied_title: None,
        })
    }

    fn window_event(&mut self, event: WindowEvent, window: &OsWindow) -> Flow {
        match event {
            WindowEvent::CloseRequested => {
                self.input.mark_quit_requested();
                info!(reason = "window_close", "shutdown_requested");
                Flow::Exit
            }
            WindowEvent::Resized(size) => self.resize(size.width, size.height),
            WindowEvent::ScaleFactorChanged { .. } => {
                let size = window.inner_size();
                self.resize(size.width, size.height)
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.input.handle_keyboard_input(&event);
                if self.input.quit_requested() {
                    info!(reason = "escape_key", "shutdown_requested");
                    return Flow::Exit;
                }
                Flow::Continue
            }
            WindowEvent::RedrawRequested => self.frame(window),
            _ => Flow::Continue,
        }
    }

    fn resize(&mut self, width: u32, height: u32) -> Flow {
        match self.presenter.resize(width, height) {
            Ok(()) => Flow::Continue,
            Err(error) => {
                warn!(error = %error, "presenter_resize_failed");
                Flow::Exit
            }
        }
    }

    /// Background ticks, then fixed world updates, then one rendered frame.
    fn frame(&mut self, window: &OsWindow) -> Flow {
        for tick in self.background.drain() {
            self.screen.update_in_background(tick);
        }

        let now = Instant::now();
        let frame_dt = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;

        let mut flow = Flow::Continue;
        let steps = self.step.advance(frame_dt);
        for _ in 0..steps.ticks {
            let input = self.input.snapshot_for_tick();
            self.metrics.tick();
            if self.screen.update(self.step.dt(), &input, now) == ScreenCommand::Quit {
                info!(reason = "screen_quit", "shutdown_requested");
                flow = Flow::Exit;
                break;
            }
        }
        if !steps.dropped.is_zero() {
            warn!(
                dropped_backlog_ms = steps.dropped.as_millis() as u64,
                max_ticks_per_frame = self.step.max_ticks(),
                "sim_clamp_triggered"
            );
        }

        let delay = self.pacer.delay(Instant::now());
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        self.canvas.clear_screen();
        self.screen.render(&mut self.canvas);
        if let Err(error) = self.presenter.present(&self.canvas) {
            warn!(error = %error, "present_failed");
            flow = Flow::Exit;
        }
        self.pacer.presented(Instant::now());

        self.refresh_title(window);
        self.metrics.frame(frame_dt);
        if let Some(snapshot) = self.metrics.take_snapshot(now) {
            info!(
                fps = snapshot.fps,
                tps = snapshot.tps,
                frame_time_ms = snapshot.frame_time_ms,
                "loop_metrics"
            );
        }
        flow
    }

    fn refresh_title(&mut self, window: &OsWindow) {
        let title = self.screen.debug_title();
        if title != self.applied_title {
            window.set_title(title.as_deref().unwrap_or(&self.default_title));
            self.applied_title = title;
        }
    }

    fn shutdown(&mut self) {
        self.background.shutdown();
        self.screen.stop(&mut self.canvas);
        info!("shutdown");
    }
}
