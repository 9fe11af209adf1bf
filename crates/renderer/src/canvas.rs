//! Owner of whatever is currently on screen.
//!
//! `ShaderCanvas` holds the one active installation (linked program plus quad
//! geometry) and the render loop bound to it. Attempts to load new source are
//! all-or-nothing: a failed split, compile, link, or upload releases what the
//! attempt created and leaves the running installation alone, while a
//! successful one cancels the old loop, releases the old objects, and starts
//! a new loop.

use std::fmt;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::compile::{GpuProgram, ProgramBuilder};
use crate::error::ShaderError;
use crate::gl::GlBackend;
use crate::runtime::{FrameHost, FrameOutcome, FrameToken, LoopState, RenderLoop};
use crate::source::split_shader_source;
use crate::types::{CanvasOptions, QUAD_POSITIONS};

/// Vertex buffer with the full-screen quad, created per program.
pub struct Geometry<B: GlBackend> {
    quad: B::Quad,
}

impl<B: GlBackend> Geometry<B> {
    /// Uploads [`QUAD_POSITIONS`] and binds them to the program's position
    /// attribute.
    pub fn create(gl: &mut B, program: &GpuProgram<B>) -> Result<Self, ShaderError> {
        let quad = gl
            .create_quad(&QUAD_POSITIONS, program.position_attribute())
            .map_err(|reason| ShaderError::Allocation {
                what: "vertex buffer",
                reason,
            })?;
        Ok(Self { quad })
    }

    pub fn quad(&self) -> B::Quad {
        self.quad
    }

    pub fn release(self, gl: &mut B) {
        gl.delete_quad(self.quad);
    }
}

impl<B: GlBackend> fmt::Debug for Geometry<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Geometry").field("quad", &self.quad).finish()
    }
}

struct Installation<B: GlBackend> {
    program: GpuProgram<B>,
    geometry: Geometry<B>,
}

pub struct ShaderCanvas<B: GlBackend, H: FrameHost> {
    gl: B,
    host: H,
    options: CanvasOptions,
    active: Option<Installation<B>>,
    render_loop: RenderLoop,
}

impl<B: GlBackend, H: FrameHost> ShaderCanvas<B, H> {
    pub fn new(gl: B, host: H, options: CanvasOptions) -> Self {
        Self {
            gl,
            host,
            options,
            active: None,
            render_loop: RenderLoop::new(),
        }
    }

    pub fn options(&self) -> &CanvasOptions {
        &self.options
    }

    pub fn backend(&self) -> &B {
        &self.gl
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.gl
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn is_installed(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_program(&self) -> Option<B::Program> {
        self.active
            .as_ref()
            .map(|installation| installation.program.handle())
    }

    pub fn has_time_uniform(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|installation| installation.program.time_uniform().is_some())
    }

    pub fn loop_state(&self) -> LoopState {
        self.render_loop.state()
    }

    pub fn pending_frame(&self) -> Option<FrameToken> {
        self.render_loop.pending()
    }

    /// Splits, compiles, and links `blob`, then uploads quad geometry for the
    /// new program. Nothing is installed; on error every object the attempt
    /// created has been released.
    pub fn build(&mut self, blob: &str) -> Result<(GpuProgram<B>, Geometry<B>), ShaderError> {
        let split = split_shader_source(blob, &self.options.sentinel)?;
        let program = ProgramBuilder::new(&mut self.gl, &self.options.bindings).build(&split)?;
        match Geometry::create(&mut self.gl, &program) {
            Ok(geometry) => Ok((program, geometry)),
            Err(err) => {
                program.release(&mut self.gl);
                Err(err)
            }
        }
    }

    /// Replaces the active installation and starts a loop timed from `now`.
    pub fn install(&mut self, program: GpuProgram<B>, geometry: Geometry<B>, now: Instant) {
        self.render_loop.cancel(&mut self.host);
        if let Some(previous) = self.active.take() {
            self.release(previous);
        }
        debug!(program = ?program.handle(), geometry = ?geometry.quad(), "installing shader program");
        self.active = Some(Installation { program, geometry });
        self.render_loop.start(&mut self.host, now);
    }

    /// One full attempt: build `blob` and install it on success.
    pub fn load_source(&mut self, blob: &str, now: Instant) -> Result<(), ShaderError> {
        match self.build(blob) {
            Ok((program, geometry)) => {
                self.install(program, geometry, now);
                info!(
                    time_uniform = self.has_time_uniform(),
                    "shader installed"
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    error = %err,
                    kept_previous = self.active.is_some(),
                    "shader load failed"
                );
                Err(err)
            }
        }
    }

    /// Cancels the loop and releases the active installation. Safe to call
    /// any number of times; returns whether anything was released.
    pub fn teardown(&mut self) -> bool {
        let cancelled = self.render_loop.cancel(&mut self.host);
        let released = match self.active.take() {
            Some(installation) => {
                self.release(installation);
                true
            }
            None => false,
        };
        if cancelled || released {
            debug!(cancelled, released, "canvas torn down");
        }
        cancelled || released
    }

    /// Delivers a frame the host was asked for. Stale tokens are discarded
    /// without touching the GPU.
    pub fn fire_frame(&mut self, token: FrameToken, now: Instant) -> FrameOutcome {
        let Some(installation) = self.active.as_ref() else {
            return FrameOutcome::Stale;
        };
        self.render_loop.fire(
            token,
            now,
            &mut self.gl,
            &mut self.host,
            &installation.program,
            installation.geometry.quad(),
            self.options.clear_color,
        )
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        let width = i32::try_from(width.max(1)).unwrap_or(i32::MAX);
        let height = i32::try_from(height.max(1)).unwrap_or(i32::MAX);
        self.gl.viewport(width, height);
    }

    /// Clears the target without drawing; used when nothing is installed.
    pub fn clear(&mut self) {
        self.gl.clear(self.options.clear_color);
    }

    fn release(&mut self, installation: Installation<B>) {
        self.gl.use_program(None);
        installation.geometry.release(&mut self.gl);
        installation.program.release(&mut self.gl);
    }
}
