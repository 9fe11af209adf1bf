//! Live shader canvas: turns a generated source blob into a running
//! full-screen fragment effect.
//!
//! ```text
//!   source blob ──split_shader_source──▶ SplitSource
//!                                            │
//!                               ProgramBuilder::build (compile + link)
//!                                            │
//!                                   GpuProgram + Geometry
//!                                            │
//!   ShaderCanvas::install ──▶ RenderLoop ──▶ FrameHost ──▶ fire_frame ─┐
//!                                 ▲                                    │
//!                                 └────────── next frame ◀─────────────┘
//! ```
//!
//! GPU calls go through the [`GlBackend`] trait. [`GlowBackend`] drives a real
//! context; the `testing` feature adds a recording backend and a hand-cranked
//! frame host so the lifecycle can be exercised without a display.

mod canvas;
mod compile;
mod error;
pub mod gl;
mod runtime;
mod source;
mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
#[cfg(feature = "window")]
pub mod window;

pub use canvas::{Geometry, ShaderCanvas};
pub use compile::{CompiledStage, GpuProgram, ProgramBuilder};
pub use error::{FormatError, ShaderError};
pub use gl::{GlBackend, GlowBackend};
pub use runtime::{
    FrameHost, FrameOutcome, FrameRequest, FrameToken, LoopState, RenderLoop, TimeSample,
};
pub use source::{split_shader_source, SplitSource};
pub use types::{
    BindingNames, CanvasOptions, StageKind, DEFAULT_POSITION_ATTRIBUTE, DEFAULT_SENTINEL,
    DEFAULT_TIME_UNIFORM, QUAD_POSITIONS, QUAD_VERTEX_COUNT,
};
