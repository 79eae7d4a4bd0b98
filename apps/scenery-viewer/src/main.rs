mod config;

use anyhow::{Context, Result};
use clap::Parser;
use config::{Overrides, ViewerConfig};
use glam::Vec2;
use scenery_camera::{Camera, OrbitController};
use scenery_input::{InputEvent, PointerButton, PointerTracker, TouchTracker, Viewport};
use scenery_render::{DemoScene, FrameOutcome, FrameRenderer};
use scenery_render_wgpu::WgpuBackend;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// Pixels of trackpad scroll that count as one wheel notch.
const PIXELS_PER_NOTCH: f32 = 50.0;

#[derive(Parser)]
#[command(name = "scenery-viewer", about = "Orbit around a demo scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Window width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Window height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Vertical field of view in degrees
    #[arg(long)]
    fov: Option<f32>,

    /// Start with auto-rotate on
    #[arg(long)]
    auto_rotate: bool,

    /// Disable orbit damping
    #[arg(long)]
    no_damping: bool,
}

struct Gpu {
    window: Arc<Window>,
    renderer: FrameRenderer<WgpuBackend>,
    demo: Option<DemoScene>,
}

/// Application state.
struct ViewerApp {
    config: ViewerConfig,
    gpu: Option<Gpu>,
    camera: Camera,
    pointer: PointerTracker,
    touches: TouchTracker,
    last_frame: Instant,
    fatal: Option<anyhow::Error>,
}

impl ViewerApp {
    fn new(config: ViewerConfig) -> Self {
        let mut camera = Camera::new(config.camera.rig());
        let orbit = OrbitController::new(&camera.rig)
            .with_settings(config.orbit.settings)
            .with_constraints(config.orbit.constraints);
        camera.attach(orbit).save_state();

        Self {
            config,
            gpu: None,
            camera,
            pointer: PointerTracker::new(),
            touches: TouchTracker::new(),
            last_frame: Instant::now(),
            fatal: None,
        }
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let size = window.inner_size();
        let backend =
            pollster::block_on(WgpuBackend::new(&instance, surface, size.width, size.height))?;
        let mut renderer = FrameRenderer::new(backend, self.config.renderer);
        renderer.initialize()?;
        let demo = DemoScene::build(&mut renderer)?;

        self.camera.rig.on_output_resized(size.width, size.height);
        self.last_frame = Instant::now();
        window.request_redraw();
        self.gpu = Some(Gpu {
            window,
            renderer,
            demo: Some(demo),
        });
        Ok(())
    }

    fn viewport(&self) -> Viewport {
        let (width, height) = self.camera.rig.output_size();
        Viewport::new(width as f32, height as f32)
    }

    fn feed(&mut self, event: InputEvent) {
        let viewport = self.viewport();
        if let Some((orbit, rig)) = self.camera.orbit_mut() {
            orbit.handle_input(&event, viewport, rig);
        }
    }

    fn handle_key(&mut self, key: KeyCode, event_loop: &ActiveEventLoop) {
        match key {
            KeyCode::KeyR => self.camera.reset_orbit(),
            KeyCode::Space => {
                if let Some((orbit, _)) = self.camera.orbit_mut() {
                    orbit.settings.auto_rotate = !orbit.settings.auto_rotate;
                    tracing::info!(enabled = orbit.settings.auto_rotate, "auto-rotate toggled");
                }
            }
            KeyCode::Escape => event_loop.exit(),
            _ => {}
        }
    }

    fn shutdown(&mut self) {
        if let Some(mut gpu) = self.gpu.take() {
            if let Some(demo) = gpu.demo.take() {
                demo.release(&mut gpu.renderer);
            }
            gpu.renderer.dispose();
        }
    }
}

fn pointer_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Right => Some(PointerButton::Secondary),
        MouseButton::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        if let Err(e) = self.init_gpu(event_loop) {
            tracing::error!(error = %e, "renderer initialization failed");
            self.fatal = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.renderer
                        .backend_mut()
                        .resize(new_size.width, new_size.height);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => self.handle_key(key, event_loop),
            WindowEvent::MouseInput { button, state, .. } => {
                if let Some(button) = pointer_button(button) {
                    match state {
                        ElementState::Pressed => self.pointer.press(button),
                        ElementState::Released => self.pointer.release(button),
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let position = Vec2::new(position.x as f32, position.y as f32);
                if let Some(event) = self.pointer.moved(position) {
                    self.feed(event);
                }
            }
            WindowEvent::CursorLeft { .. } => self.pointer.leave(),
            WindowEvent::MouseWheel { delta, .. } => {
                let notches = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_NOTCH,
                };
                let event = self.pointer.wheel(notches);
                self.feed(event);
            }
            WindowEvent::Touch(touch) => {
                let position = Vec2::new(touch.location.x as f32, touch.location.y as f32);
                match touch.phase {
                    TouchPhase::Started => self.touches.start(touch.id, position),
                    TouchPhase::Moved => {
                        for event in self.touches.moved(touch.id, position) {
                            self.feed(event);
                        }
                    }
                    TouchPhase::Ended | TouchPhase::Cancelled => self.touches.end(touch.id),
                }
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = (now - self.last_frame).as_secs_f32().min(0.1);
                self.last_frame = now;
                self.camera.update(dt);

                let Some(gpu) = &mut self.gpu else {
                    return;
                };
                if let Some(demo) = &gpu.demo {
                    if let FrameOutcome::NoImage(e) =
                        gpu.renderer.render_frame(&demo.scene, &mut self.camera.rig)
                    {
                        tracing::debug!(error = %e, "frame dropped");
                    }
                }
                gpu.window.request_redraw();
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    let mut config = ViewerConfig::load(cli.config.as_deref())?;
    config.apply(&Overrides {
        width: cli.width,
        height: cli.height,
        fov: cli.fov,
        auto_rotate: cli.auto_rotate,
        no_damping: cli.no_damping,
    });

    tracing::info!("starting scenery-viewer");
    tracing::info!("left drag: orbit | right drag: pan | wheel: zoom | R: reset | Space: auto-rotate");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = ViewerApp::new(config);
    event_loop.run_app(&mut app)?;

    match app.fatal.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
