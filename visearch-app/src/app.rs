use anyhow::{Context, Result, anyhow};
use pixels::{Pixels, SurfaceTexture};
use rand::rngs::ThreadRng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};
use visearch_core::{KeyInput, ResponseKey};
use visearch_experiment::{
    ExperimentConfig, ExperimentEvent, ExperimentStateMachine, IconPool, SessionError,
    SessionRecorder,
};
use visearch_render::{FontVec, FrameTimings, SkiaRenderer};
use visearch_timing::{HighPrecisionTimer, Timer};
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalSize, Size},
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};

/// Deadlines closer than this are waited out with a precise sleep instead
/// of another trip through the event loop
const SPIN_WINDOW: Duration = Duration::from_millis(2);

pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    experiment: ExperimentStateMachine<HighPrecisionTimer, ThreadRng>,
    renderer: Option<SkiaRenderer>,
    font: Option<FontVec>,
    icons_dir: PathBuf,
    fullscreen: bool,
    window_size: PhysicalSize<u32>,
    scale_factor: f64,
    refresh_rate: Option<f64>,

    save_error: Option<SessionError>,
    should_exit: bool,
}

fn map_key(code: KeyCode) -> Option<KeyInput> {
    match code {
        KeyCode::ShiftLeft => Some(KeyInput::Response(ResponseKey::LeftShift)),
        KeyCode::ShiftRight => Some(KeyInput::Response(ResponseKey::RightShift)),
        KeyCode::Space => Some(KeyInput::Space),
        KeyCode::Escape => Some(KeyInput::Escape),
        _ => None,
    }
}

impl App {
    pub fn new(
        config: ExperimentConfig,
        recorder: SessionRecorder,
        icons: IconPool,
        font: Option<FontVec>,
        icons_dir: PathBuf,
    ) -> Self {
        let fullscreen = config.display.fullscreen;
        let window_size =
            PhysicalSize::new(config.display.screen_width, config.display.screen_height);
        let timer = HighPrecisionTimer::new();
        let rng = rand::rng();
        let experiment = ExperimentStateMachine::new(config, recorder, icons, timer, rng);

        Self {
            window: None,
            pixels: None,
            experiment,
            renderer: None,
            font,
            icons_dir,
            fullscreen,
            window_size,
            scale_factor: 1.0,
            refresh_rate: None,
            save_error: None,
            should_exit: false,
        }
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        info!(
            platform = std::env::consts::OS,
            arch = std::env::consts::ARCH,
            trials = self.experiment.trials_planned(),
            "starting session, SPACE advances, ESC aborts"
        );

        event_loop.run_app(&mut self)?;

        let stats = self.experiment.timer.frame_stats();
        if stats.samples > 0 {
            info!(
                frames = stats.samples,
                avg_ms = stats.average_frame_time_ns / 1e6,
                jitter_ms = stats.jitter_ns / 1e6,
                fps = stats.effective_fps,
                "frame timing"
            );
        }

        match self.save_error.take() {
            Some(e) => Err(anyhow!(e).context("session results were not saved")),
            None => Ok(()),
        }
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next());

        self.refresh_rate = monitor
            .as_ref()
            .and_then(|m| m.refresh_rate_millihertz())
            .map(|rate| rate as f64 / 1000.0);

        let mut window_attributes = Window::default_attributes()
            .with_title("Visual search")
            .with_resizable(false);
        window_attributes = if self.fullscreen {
            let monitor = monitor.context("no monitor available for fullscreen")?;
            window_attributes.with_fullscreen(Some(Fullscreen::Borderless(Some(monitor))))
        } else {
            window_attributes.with_inner_size(Size::Physical(self.window_size))
        };

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let physical_size = window.inner_size();
        self.scale_factor = window.scale_factor();

        info!(
            width = physical_size.width,
            height = physical_size.height,
            scale = self.scale_factor,
            refresh_hz = self.refresh_rate,
            fullscreen = self.fullscreen,
            "display configured"
        );

        let surface_texture =
            SurfaceTexture::new(physical_size.width, physical_size.height, window.clone());
        self.pixels = Some(Pixels::new(
            physical_size.width,
            physical_size.height,
            surface_texture,
        )?);

        self.renderer = Some(SkiaRenderer::new(
            physical_size.width,
            physical_size.height,
            self.font.take(),
            self.icons_dir.clone(),
        )?);

        window.set_cursor_visible(false);
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pixels), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };
        let screen = self.experiment.screen();
        let timer = &self.experiment.timer;

        let stats: FrameTimings = renderer.render_frame(&screen, pixels.frame_mut(), timer)?;
        let t = timer.now();
        pixels.render()?;
        let present = timer.elapsed(t);

        trace!(
            draw_ms = stats.draw.as_secs_f64() * 1e3,
            copy_ms = stats.copy.as_secs_f64() * 1e3,
            present_ms = present.as_secs_f64() * 1e3,
            "frame"
        );
        self.experiment.timer.record_frame(stats.total + present);
        Ok(())
    }

    fn dispatch(&mut self, events: Vec<ExperimentEvent>, event_loop: &ActiveEventLoop) {
        for event in events {
            match event {
                ExperimentEvent::TrialRecorded {
                    trial_number,
                    practice,
                    correct,
                } => debug!(trial_number, practice, correct, "trial recorded"),
                ExperimentEvent::BlockStarted(block) => info!(block, "block started"),
                ExperimentEvent::Exit { aborted, saved } => {
                    match saved {
                        Ok(Some(artifacts)) => {
                            let summary = self.experiment.recorder().summary();
                            info!(
                                aborted,
                                accuracy_pct = summary.accuracy_pct,
                                mean_rt_ms = summary.mean_rt_ms,
                                table = %artifacts.table.display(),
                                summary = %artifacts.summary.display(),
                                "session finished"
                            );
                        }
                        Ok(None) => info!(aborted, "session finished without recorded trials"),
                        Err(e) => {
                            error!(error = %e, "saving the session failed");
                            self.save_error = Some(e);
                        }
                    }
                    self.cleanup_and_exit(event_loop);
                }
            }
        }
    }

    fn update(&mut self, event_loop: &ActiveEventLoop) {
        let events = self.experiment.update();
        self.dispatch(events, event_loop);
    }

    fn handle_input(&mut self, key: PhysicalKey, event_loop: &ActiveEventLoop) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        if let Some(input) = map_key(code) {
            let events = self.experiment.handle_key(input);
            self.dispatch(events, event_loop);
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                warn!(error = %e, "failed to resize surface");
            }
            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                warn!(error = %e, "failed to resize buffer");
            }
        }
        if let Some(renderer) = &mut self.renderer {
            if let Err(e) = renderer.resize(new_size.width, new_size.height) {
                warn!(error = format!("{e:#}"), "failed to resize canvas");
            }
        }
        debug!(width = new_size.width, height = new_size.height, "display resized");
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
        }
        self.should_exit = true;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                error!(error = format!("{e:#}"), "failed to create window and surface");
                let events = self.experiment.handle_key(KeyInput::Escape);
                self.dispatch(events, event_loop);
                self.cleanup_and_exit(event_loop);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                // closing the window counts as an abort
                let events = self.experiment.handle_key(KeyInput::Escape);
                self.dispatch(events, event_loop);
                self.cleanup_and_exit(event_loop);
            }
            WindowEvent::RedrawRequested => {
                self.update(event_loop);
                if self.should_exit {
                    return;
                }
                if let Err(e) = self.render() {
                    error!(error = format!("{e:#}"), "render failed");
                }
                if let Some(win) = &self.window {
                    win.request_redraw();
                }
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() && !event.repeat => {
                self.handle_input(event.physical_key, event_loop);
            }
            WindowEvent::Resized(sz) => self.handle_resize(sz),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = scale_factor;
                if let Some(window) = &self.window {
                    let size = window.inner_size();
                    self.handle_resize(size);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
            return;
        }
        // wait out an imminent phase change precisely, then redraw
        if let Some(deadline) = self.experiment.next_deadline_ns() {
            let now = self.experiment.timer.now();
            let remaining = Duration::from_nanos(deadline.saturating_sub(now));
            if remaining <= SPIN_WINDOW {
                self.experiment.timer.sleep(remaining);
                if let Some(win) = &self.window {
                    win.request_redraw();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_response_keys() {
        assert_eq!(
            map_key(KeyCode::ShiftLeft),
            Some(KeyInput::Response(ResponseKey::LeftShift))
        );
        assert_eq!(
            map_key(KeyCode::ShiftRight),
            Some(KeyInput::Response(ResponseKey::RightShift))
        );
        assert_eq!(map_key(KeyCode::Space), Some(KeyInput::Space));
        assert_eq!(map_key(KeyCode::Escape), Some(KeyInput::Escape));
        assert_eq!(map_key(KeyCode::KeyA), None);
    }
}
