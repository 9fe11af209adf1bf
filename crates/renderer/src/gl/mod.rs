//! Narrow view of the OpenGL API the shader pipeline needs.
//!
//! [`GlBackend`] mirrors the handful of GL entry points used to compile, link,
//! and draw a generated program. The production implementation wraps a
//! [`glow::Context`]; the `testing` feature adds a recording backend that runs
//! without a GPU.

use std::fmt::Debug;

use crate::types::StageKind;

mod native;
#[cfg(any(test, feature = "testing"))]
pub mod recording;

pub use native::{GlowBackend, GlowQuad};

/// GL operations consumed by the program builder, lifecycle manager, and
/// render loop.
///
/// Object creation reports failures as strings, as `glow` does. Every handle
/// returned by a `create_*` call must eventually be passed to the matching
/// `delete_*` call.
pub trait GlBackend {
    type Shader: Copy + Debug + PartialEq;
    type Program: Copy + Debug + PartialEq;
    type Quad: Copy + Debug + PartialEq;
    type UniformLocation: Clone + Debug;

    fn create_shader(&mut self, stage: StageKind) -> Result<Self::Shader, String>;
    fn shader_source(&mut self, shader: Self::Shader, source: &str);
    fn compile_shader(&mut self, shader: Self::Shader);
    fn shader_compile_status(&mut self, shader: Self::Shader) -> bool;
    fn shader_info_log(&mut self, shader: Self::Shader) -> String;
    fn delete_shader(&mut self, shader: Self::Shader);

    fn create_program(&mut self) -> Result<Self::Program, String>;
    fn attach_shader(&mut self, program: Self::Program, shader: Self::Shader);
    fn detach_shader(&mut self, program: Self::Program, shader: Self::Shader);
    fn link_program(&mut self, program: Self::Program);
    fn program_link_status(&mut self, program: Self::Program) -> bool;
    fn program_info_log(&mut self, program: Self::Program) -> String;
    fn delete_program(&mut self, program: Self::Program);

    fn attrib_location(&mut self, program: Self::Program, name: &str) -> Option<u32>;
    fn uniform_location(
        &mut self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation>;

    /// Uploads `positions` (two floats per vertex) into a fresh vertex buffer and
    /// points `attribute` at it when the program declares one.
    fn create_quad(
        &mut self,
        positions: &[f32],
        attribute: Option<u32>,
    ) -> Result<Self::Quad, String>;
    fn delete_quad(&mut self, quad: Self::Quad);

    fn viewport(&mut self, width: i32, height: i32);
    fn clear(&mut self, color: [f32; 4]);
    fn use_program(&mut self, program: Option<Self::Program>);
    fn bind_quad(&mut self, quad: Self::Quad);
    fn uniform_f32(&mut self, location: &Self::UniformLocation, value: f32);
    fn draw_triangle_strip(&mut self, first: i32, count: i32);
}
