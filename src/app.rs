use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::config::DemoConfig;
use crate::core::{Command, Error, GpuContext, TraceContext};
use crate::shadow::ShadowDemo;
use crate::ui::{repaint_after, Overlay};

/// Everything that exists once the window is up
struct Session {
    window: Arc<Window>,
    gpu: GpuContext,
    demo: ShadowDemo,
    overlay: Overlay,
    repaint_at: Option<Instant>,
}

impl Session {
    fn new(event_loop: &ActiveEventLoop, config: &DemoConfig) -> Result<Self> {
        let window = event_loop
            .create_window(
                Window::default_attributes()
                    .with_title("Shadow Scene")
                    .with_inner_size(winit::dpi::PhysicalSize::new(config.width, config.height)),
            )
            .context("Failed to create window")?;
        let window = Arc::new(window);

        let mut gpu = pollster::block_on(GpuContext::new(window.clone()))
            .context("Failed to initialize GPU context")?;

        // The window manager may not honour the requested size
        let (width, height) = gpu.surface_size();
        let config = DemoConfig {
            width,
            height,
            ..config.clone()
        };
        let demo = ShadowDemo::new(&mut gpu, &config).context("Failed to build scene")?;
        let overlay = Overlay::new(&window, &gpu);

        Ok(Self {
            window,
            gpu,
            demo,
            overlay,
            repaint_at: None,
        })
    }

    fn render(&mut self) -> Result<()> {
        let (output, changes) = self.overlay.run(&self.window, &self.demo);
        let repaint = repaint_after(&output);
        for (target, value) in changes {
            debug!("{} -> {}", target.label(), value);
            self.demo.apply(target, value);
        }

        match self.demo.redraw(&mut self.gpu) {
            Ok(()) => {}
            Err(Error::Surface(e)) => warn!("Skipping frame: {}", e),
            Err(e) => return Err(e).context("Redraw failed"),
        }

        // Texture uploads still apply when the frame was skipped
        self.overlay.paint(&self.window, &self.gpu, output);
        self.gpu.present();
        self.repaint_at = repaint.and_then(|delay| Instant::now().checked_add(delay));
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.gpu.resize(width, height);
        self.demo
            .resize(&mut self.gpu, width, height)
            .context("Failed to resize shadow target")
    }
}

/// What the event loop does once it has drained its events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wake {
    Redraw,
    At(Instant),
    Idle,
}

fn next_wake(repaint_at: Option<Instant>, now: Instant) -> Wake {
    match repaint_at {
        Some(at) if at <= now => Wake::Redraw,
        Some(at) => Wake::At(at),
        None => Wake::Idle,
    }
}

/// Window + event loop around a [`ShadowDemo`]
pub struct App {
    config: DemoConfig,
    session: Option<Session>,
    error: Option<anyhow::Error>,
}

impl App {
    pub fn new(config: DemoConfig) -> Self {
        Self {
            config,
            session: None,
            error: None,
        }
    }

    /// The error that stopped the event loop, if any
    pub fn into_result(self) -> Result<()> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{:#}", err);
        self.error = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() {
            return;
        }

        match Session::new(event_loop, &self.config) {
            Ok(session) => {
                session.window.request_redraw();
                self.session = Some(session);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        match next_wake(session.repaint_at, Instant::now()) {
            Wake::Redraw => {
                session.repaint_at = None;
                session.window.request_redraw();
                event_loop.set_control_flow(ControlFlow::Wait);
            }
            Wake::At(at) => event_loop.set_control_flow(ControlFlow::WaitUntil(at)),
            Wake::Idle => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        // Let egui handle the event first
        let response = session.overlay.handle_event(&session.window, &event);
        if response.repaint {
            session.window.request_redraw();
        }
        if response.consumed {
            return;
        }

        let result = match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => {
                event_loop.exit();
                Ok(())
            }
            WindowEvent::Resized(size) => {
                let resized = session.resize(size.width, size.height);
                session.window.request_redraw();
                resized
            }
            WindowEvent::RedrawRequested => session.render(),
            _ => Ok(()),
        };

        if let Err(err) = result {
            self.fail(event_loop, err);
        }
    }
}

/// Open the window and run until it is closed or a frame fails
pub fn run(config: DemoConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = App::new(config);

    info!("Shadow Scene - drag the sliders to move the letter and the light, Escape to quit");
    event_loop.run_app(&mut app)?;

    app.into_result()
}

/// Build the scene against a recording context and sweep every control
/// across its range for `frames` redraws
pub fn run_headless(config: &DemoConfig, frames: u32) -> Result<()> {
    let mut ctx = TraceContext::new();
    let mut demo = ShadowDemo::new(&mut ctx, config).context("Failed to build scene")?;
    info!("Headless setup issued {} commands", ctx.take_commands().len());

    let controls = demo.controls();
    for frame in 0..frames {
        let t = if frames > 1 {
            frame as f32 / (frames - 1) as f32
        } else {
            0.0
        };
        for control in &controls {
            demo.apply(control.target, control.min + (control.max - control.min) * t);
        }

        demo.redraw(&mut ctx)
            .with_context(|| format!("Frame {} failed", frame))?;

        let commands = ctx.take_commands();
        let draws = commands
            .iter()
            .filter(|c| matches!(c, Command::Draw { .. }))
            .count();
        info!(
            "Frame {}: {} commands, {} draws, light at {:?}",
            frame,
            commands.len(),
            draws,
            demo.scene().light()
        );
    }

    Ok(())
}
