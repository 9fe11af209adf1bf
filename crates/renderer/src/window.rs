//! Desktop host: a winit window with a glutin GL context driving a
//! [`ShaderCanvas`].
//!
//! ```text
//!   worker thread ──CanvasProxy──▶ EventLoopProxy ──▶ UserEvent(Load/Clear)
//!                                                          │
//!   RedrawRequested ◀── request_redraw ◀── WindowFrameHost ◀┘ ShaderCanvas
//! ```
//!
//! Only the event-loop thread touches GL. Other threads talk to the canvas
//! through [`CanvasProxy`], which blocks until the event loop has applied the
//! command and reports the outcome back.

use std::ffi::CString;
use std::num::NonZeroU32;
use std::thread;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{bounded, Sender};
use glutin::config::{Config, ConfigTemplateBuilder};
use glutin::context::{ContextApi, ContextAttributesBuilder, Version};
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin::surface::{SurfaceAttributesBuilder, SwapInterval, WindowSurface};
use glutin_winit::DisplayBuilder;
use raw_window_handle::HasRawWindowHandle;
use tracing::{debug, error, info, warn};
use winit::dpi::PhysicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy};
use winit::window::{Window, WindowBuilder};

use crate::canvas::ShaderCanvas;
use crate::error::ShaderError;
use crate::gl::GlowBackend;
use crate::runtime::{FrameHost, FrameOutcome, FrameRequest, FrameToken};
use crate::types::CanvasOptions;

/// Window and canvas settings for [`run`].
#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    pub size: (u32, u32),
    /// Wait for vertical blank on swap, pacing the loop to the display.
    pub vsync: bool,
    pub canvas: CanvasOptions,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "textshader".to_string(),
            size: (400, 300),
            vsync: true,
            canvas: CanvasOptions::default(),
        }
    }
}

#[derive(Debug)]
enum CanvasCommand {
    Load {
        source: String,
        reply: Sender<Result<(), ShaderError>>,
    },
    Clear {
        reply: Sender<()>,
    },
    Shutdown,
}

/// Thread-safe handle for feeding the window's canvas.
#[derive(Clone)]
pub struct CanvasProxy {
    proxy: EventLoopProxy<CanvasCommand>,
}

impl CanvasProxy {
    /// Loads `source` on the GL thread and waits for the outcome. The outer
    /// error means the window is gone.
    pub fn load(&self, source: impl Into<String>) -> Result<Result<(), ShaderError>> {
        let (reply, outcome) = bounded(1);
        self.send(CanvasCommand::Load {
            source: source.into(),
            reply,
        })?;
        outcome
            .recv()
            .map_err(|_| anyhow!("canvas window closed before applying the shader"))
    }

    /// Tears the canvas down, leaving an empty cleared window.
    pub fn clear(&self) -> Result<()> {
        let (reply, done) = bounded(1);
        self.send(CanvasCommand::Clear { reply })?;
        done.recv()
            .map_err(|_| anyhow!("canvas window closed before clearing"))
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(CanvasCommand::Shutdown)
    }

    fn send(&self, command: CanvasCommand) -> Result<()> {
        self.proxy
            .send_event(command)
            .map_err(|_| anyhow!("canvas window is closed"))
    }
}

/// Frame host backed by `Window::request_redraw`.
struct WindowFrameHost {
    window: Window,
    next_request: u64,
    pending: Option<(FrameRequest, FrameToken)>,
}

impl WindowFrameHost {
    fn new(window: Window) -> Self {
        Self {
            window,
            next_request: 0,
            pending: None,
        }
    }

    fn window(&self) -> &Window {
        &self.window
    }

    fn take_due(&mut self) -> Option<FrameToken> {
        self.pending.take().map(|(_, token)| token)
    }
}

impl FrameHost for WindowFrameHost {
    fn request_frame(&mut self, token: FrameToken) -> FrameRequest {
        self.next_request += 1;
        let request = FrameRequest(self.next_request);
        self.pending = Some((request, token));
        self.window.request_redraw();
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if matches!(self.pending, Some((pending, _)) if pending == request) {
            self.pending = None;
        }
    }
}

/// Opens the window, optionally installs `initial` source, hands a
/// [`CanvasProxy`] to `feeder` on a worker thread, and runs the event loop
/// until the window closes or the proxy requests shutdown.
///
/// Errors are only returned for start-up failures, including a failure to
/// install `initial`; afterwards the process exits with the event loop.
pub fn run<F>(config: WindowConfig, initial: Option<String>, feeder: F) -> Result<()>
where
    F: FnOnce(CanvasProxy) + Send + 'static,
{
    let event_loop = EventLoopBuilder::<CanvasCommand>::with_user_event().build();

    let (width, height) = (config.size.0.max(1), config.size.1.max(1));
    let window_builder = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(PhysicalSize::new(width, height));

    let template = ConfigTemplateBuilder::new()
        .with_alpha_size(8)
        .with_transparency(false);

    let (window, gl_config) = DisplayBuilder::new()
        .with_window_builder(Some(window_builder))
        .build(&event_loop, template, pick_config)
        .map_err(|err| anyhow!("failed to create GL display: {err}"))?;
    let window = window.context("GL display did not create a window")?;
    let gl_display = gl_config.display();
    let raw_window_handle = window.raw_window_handle();

    // Generated shaders target GLSL ES 1.00; prefer a GLES 2 context and fall
    // back to whatever the platform offers.
    let gles_attributes = ContextAttributesBuilder::new()
        .with_context_api(ContextApi::Gles(Some(Version::new(2, 0))))
        .build(Some(raw_window_handle));
    let fallback_attributes = ContextAttributesBuilder::new().build(Some(raw_window_handle));
    let not_current = unsafe {
        gl_display
            .create_context(&gl_config, &gles_attributes)
            .or_else(|err| {
                warn!(%err, "GLES 2 context unavailable; falling back to default GL context");
                gl_display.create_context(&gl_config, &fallback_attributes)
            })
            .map_err(|err| anyhow!("failed to create GL context: {err}"))?
    };

    let surface_attributes = SurfaceAttributesBuilder::<WindowSurface>::new().build(
        raw_window_handle,
        NonZeroU32::new(width).unwrap_or(NonZeroU32::MIN),
        NonZeroU32::new(height).unwrap_or(NonZeroU32::MIN),
    );
    let gl_surface = unsafe {
        gl_display
            .create_window_surface(&gl_config, &surface_attributes)
            .map_err(|err| anyhow!("failed to create window surface: {err}"))?
    };
    let gl_context = not_current
        .make_current(&gl_surface)
        .map_err(|err| anyhow!("failed to make GL context current: {err}"))?;

    if config.vsync {
        if let Err(err) =
            gl_surface.set_swap_interval(&gl_context, SwapInterval::Wait(NonZeroU32::MIN))
        {
            warn!(%err, "failed to enable vsync; frames will not be paced");
        }
    }

    let gl = unsafe {
        glow::Context::from_loader_function(|symbol| match CString::new(symbol) {
            Ok(name) => gl_display.get_proc_address(name.as_c_str()) as *const _,
            Err(_) => std::ptr::null(),
        })
    };
    // SAFETY: the context was made current above and stays current on this
    // thread, which is the only one that touches the canvas.
    let backend = unsafe { GlowBackend::new(gl) };
    let mut canvas = ShaderCanvas::new(backend, WindowFrameHost::new(window), config.canvas);
    canvas.resize(width, height);

    if let Some(source) = initial {
        if let Err(err) = canvas.load_source(&source, Instant::now()) {
            canvas.teardown();
            return Err(anyhow!(err.user_message()));
        }
    } else {
        canvas.host().window().request_redraw();
    }

    let proxy = CanvasProxy {
        proxy: event_loop.create_proxy(),
    };
    thread::Builder::new()
        .name("textshader-feeder".into())
        .spawn(move || feeder(proxy))
        .context("failed to spawn canvas feeder thread")?;

    info!(title = %config.title, width, height, "canvas window running");
    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => *control_flow = ControlFlow::Exit,
                WindowEvent::Resized(size) => {
                    let (w, h) = (size.width.max(1), size.height.max(1));
                    gl_surface.resize(
                        &gl_context,
                        NonZeroU32::new(w).unwrap_or(NonZeroU32::MIN),
                        NonZeroU32::new(h).unwrap_or(NonZeroU32::MIN),
                    );
                    canvas.resize(w, h);
                    canvas.host().window().request_redraw();
                }
                _ => {}
            },

            Event::UserEvent(command) => match command {
                CanvasCommand::Load { source, reply } => {
                    let outcome = canvas.load_source(&source, Instant::now());
                    if let Err(err) = &outcome {
                        error!(error = %err, "failed to apply shader");
                    }
                    let _ = reply.send(outcome);
                }
                CanvasCommand::Clear { reply } => {
                    canvas.teardown();
                    canvas.host().window().request_redraw();
                    let _ = reply.send(());
                }
                CanvasCommand::Shutdown => *control_flow = ControlFlow::Exit,
            },

            Event::RedrawRequested(_) => {
                let drawn = match canvas.host_mut().take_due() {
                    Some(token) => matches!(
                        canvas.fire_frame(token, Instant::now()),
                        FrameOutcome::Drawn(_)
                    ),
                    None => false,
                };
                if !drawn && !canvas.is_installed() {
                    canvas.clear();
                } else if !drawn {
                    return;
                }
                if let Err(err) = gl_surface.swap_buffers(&gl_context) {
                    error!(%err, "failed to swap buffers");
                }
            }

            Event::LoopDestroyed => {
                canvas.teardown();
                debug!("canvas window closed");
            }

            _ => {}
        }
    })
}

fn pick_config(configs: Box<dyn Iterator<Item = Config> + '_>) -> Config {
    configs
        .reduce(|best, config| {
            if config.num_samples() > best.num_samples() {
                config
            } else {
                best
            }
        })
        .expect("display offered no GL configs")
}
