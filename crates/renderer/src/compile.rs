use std::fmt;

use tracing::{debug, warn};

use crate::error::ShaderError;
use crate::gl::GlBackend;
use crate::source::SplitSource;
use crate::types::{BindingNames, StageKind};

/// A compiled shader object waiting to be linked.
///
/// Stages only live for the duration of one build; [`ProgramBuilder::link`]
/// consumes them and releases the underlying objects whatever the outcome.
pub struct CompiledStage<B: GlBackend> {
    kind: StageKind,
    shader: B::Shader,
}

impl<B: GlBackend> CompiledStage<B> {
    pub fn kind(&self) -> StageKind {
        self.kind
    }

    pub fn handle(&self) -> B::Shader {
        self.shader
    }
}

impl<B: GlBackend> fmt::Debug for CompiledStage<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledStage")
            .field("kind", &self.kind)
            .field("shader", &self.shader)
            .finish()
    }
}

/// Linked program together with the locations resolved right after linking.
pub struct GpuProgram<B: GlBackend> {
    handle: B::Program,
    position_attribute: Option<u32>,
    time_uniform: Option<B::UniformLocation>,
}

impl<B: GlBackend> GpuProgram<B> {
    pub fn handle(&self) -> B::Program {
        self.handle
    }

    pub fn position_attribute(&self) -> Option<u32> {
        self.position_attribute
    }

    pub fn time_uniform(&self) -> Option<&B::UniformLocation> {
        self.time_uniform.as_ref()
    }

    /// Deletes the program object.
    pub fn release(self, gl: &mut B) {
        debug!(program = ?self.handle, "releasing shader program");
        gl.delete_program(self.handle);
    }
}

impl<B: GlBackend> fmt::Debug for GpuProgram<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuProgram")
            .field("handle", &self.handle)
            .field("position_attribute", &self.position_attribute)
            .field("time_uniform", &self.time_uniform)
            .finish()
    }
}

/// Compiles stage sources and links them into a [`GpuProgram`].
pub struct ProgramBuilder<'a, B: GlBackend> {
    gl: &'a mut B,
    bindings: &'a BindingNames,
}

impl<'a, B: GlBackend> ProgramBuilder<'a, B> {
    pub fn new(gl: &'a mut B, bindings: &'a BindingNames) -> Self {
        Self { gl, bindings }
    }

    /// Compiles both stages of `source` and links them.
    ///
    /// When the fragment stage fails, the already compiled vertex stage is
    /// released before the error is returned.
    pub fn build(&mut self, source: &SplitSource) -> Result<GpuProgram<B>, ShaderError> {
        let vertex = self.compile_stage(StageKind::Vertex, &source.vertex)?;
        let fragment = match self.compile_stage(StageKind::Fragment, &source.fragment) {
            Ok(fragment) => fragment,
            Err(err) => {
                self.release_stage(vertex);
                return Err(err);
            }
        };
        self.link(vertex, fragment)
    }

    pub fn compile_stage(
        &mut self,
        kind: StageKind,
        source: &str,
    ) -> Result<CompiledStage<B>, ShaderError> {
        let shader = self
            .gl
            .create_shader(kind)
            .map_err(|reason| ShaderError::Allocation {
                what: match kind {
                    StageKind::Vertex => "vertex shader",
                    StageKind::Fragment => "fragment shader",
                },
                reason,
            })?;
        self.gl.shader_source(shader, source);
        self.gl.compile_shader(shader);

        if !self.gl.shader_compile_status(shader) {
            let log = self.gl.shader_info_log(shader);
            self.gl.delete_shader(shader);
            let log = if log.trim().is_empty() {
                format!("{kind} shader failed to compile (no diagnostics reported)")
            } else {
                log.trim_end().to_string()
            };
            warn!(stage = %kind, %log, "shader compilation failed");
            return Err(ShaderError::Compile { stage: kind, log });
        }

        debug!(stage = %kind, shader = ?shader, "compiled shader stage");
        Ok(CompiledStage { kind, shader })
    }

    pub fn link(
        &mut self,
        vertex: CompiledStage<B>,
        fragment: CompiledStage<B>,
    ) -> Result<GpuProgram<B>, ShaderError> {
        debug_assert_eq!(vertex.kind, StageKind::Vertex);
        debug_assert_eq!(fragment.kind, StageKind::Fragment);

        let program = match self.gl.create_program() {
            Ok(program) => program,
            Err(reason) => {
                self.release_stage(vertex);
                self.release_stage(fragment);
                return Err(ShaderError::Allocation {
                    what: "shader program",
                    reason,
                });
            }
        };

        self.gl.attach_shader(program, vertex.shader);
        self.gl.attach_shader(program, fragment.shader);
        self.gl.link_program(program);

        // Stage objects are not needed once linking has run, whatever the result.
        self.gl.detach_shader(program, vertex.shader);
        self.gl.detach_shader(program, fragment.shader);
        self.release_stage(vertex);
        self.release_stage(fragment);

        if !self.gl.program_link_status(program) {
            let log = self.gl.program_info_log(program);
            self.gl.delete_program(program);
            let log = if log.trim().is_empty() {
                "shader program failed to link (no diagnostics reported)".to_string()
            } else {
                log.trim_end().to_string()
            };
            warn!(%log, "shader program link failed");
            return Err(ShaderError::Link { log });
        }

        let position_attribute = self
            .gl
            .attrib_location(program, &self.bindings.position_attribute);
        if position_attribute.is_none() {
            warn!(
                attribute = %self.bindings.position_attribute,
                "vertex stage does not declare the position attribute; quad vertices will not be fed"
            );
        }
        let time_uniform = self.gl.uniform_location(program, &self.bindings.time_uniform);
        if time_uniform.is_none() {
            debug!(uniform = %self.bindings.time_uniform, "program has no time uniform");
        }

        debug!(
            program = ?program,
            ?position_attribute,
            has_time_uniform = time_uniform.is_some(),
            "linked shader program"
        );
        Ok(GpuProgram {
            handle: program,
            position_attribute,
            time_uniform,
        })
    }

    fn release_stage(&mut self, stage: CompiledStage<B>) {
        self.gl.delete_shader(stage.shader);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::recording::{GlCall, RecordingGl};

    const VERTEX: &str = "attribute vec2 a_position;\nvoid main() { gl_Position = vec4(a_position, 0.0, 1.0); }";
    const FRAGMENT: &str = "precision mediump float;\nuniform float u_time;\nvoid main() { gl_FragColor = vec4(sin(u_time)); }";

    fn split(vertex: &str, fragment: &str) -> SplitSource {
        SplitSource {
            vertex: vertex.to_string(),
            fragment: fragment.to_string(),
        }
    }

    #[test]
    fn build_links_and_releases_stages() {
        let mut gl = RecordingGl::new();
        let bindings = BindingNames::default();
        let program = ProgramBuilder::new(&mut gl, &bindings)
            .build(&split(VERTEX, FRAGMENT))
            .expect("program builds");

        assert_eq!(program.position_attribute(), Some(0));
        assert!(program.time_uniform().is_some());
        assert_eq!(gl.live_shaders(), 0);
        assert_eq!(gl.live_programs(), 1);
        assert!(gl.violations().is_empty());

        program.release(&mut gl);
        assert_eq!(gl.live_programs(), 0);
    }

    #[test]
    fn missing_time_uniform_is_not_an_error() {
        let mut gl = RecordingGl::new();
        let bindings = BindingNames::default();
        let program = ProgramBuilder::new(&mut gl, &bindings)
            .build(&split(VERTEX, "void main() { gl_FragColor = vec4(1.0); }"))
            .expect("program builds");
        assert!(program.time_uniform().is_none());
    }

    #[test]
    fn compile_failure_releases_failing_stage() {
        let mut gl = RecordingGl::new();
        let bindings = BindingNames::default();
        let err = ProgramBuilder::new(&mut gl, &bindings)
            .compile_stage(StageKind::Vertex, "#error broken\nvoid main() {}")
            .unwrap_err();

        match err {
            ShaderError::Compile { stage, log } => {
                assert_eq!(stage, StageKind::Vertex);
                assert!(log.contains("#error"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(gl.live_shaders(), 0);
        assert!(matches!(gl.calls().last(), Some(GlCall::DeleteShader { .. })));
    }

    #[test]
    fn fragment_failure_releases_vertex_stage_too() {
        let mut gl = RecordingGl::new();
        gl.fail_compile(StageKind::Fragment, "0:3: 'gl_FragColour' : undeclared identifier");
        let bindings = BindingNames::default();
        let err = ProgramBuilder::new(&mut gl, &bindings)
            .build(&split(VERTEX, FRAGMENT))
            .unwrap_err();

        assert_eq!(err.stage(), Some(StageKind::Fragment));
        assert_eq!(gl.live_shaders(), 0);
        assert_eq!(gl.live_programs(), 0);
        assert!(!gl
            .calls()
            .iter()
            .any(|call| matches!(call, GlCall::CreateProgram { .. })));
    }

    #[test]
    fn link_failure_releases_program_and_stages() {
        let mut gl = RecordingGl::new();
        gl.fail_link("varying v_uv not written by vertex shader");
        let bindings = BindingNames::default();
        let err = ProgramBuilder::new(&mut gl, &bindings)
            .build(&split(VERTEX, FRAGMENT))
            .unwrap_err();

        assert_eq!(
            err,
            ShaderError::Link {
                log: "varying v_uv not written by vertex shader".into()
            }
        );
        assert_eq!(gl.live_shaders(), 0);
        assert_eq!(gl.live_programs(), 0);
        assert!(gl.violations().is_empty());
    }

    #[test]
    fn program_allocation_failure_releases_stages() {
        let mut gl = RecordingGl::new();
        gl.refuse_program_allocation(true);
        let bindings = BindingNames::default();
        let err = ProgramBuilder::new(&mut gl, &bindings)
            .build(&split(VERTEX, FRAGMENT))
            .unwrap_err();

        assert!(matches!(
            err,
            ShaderError::Allocation {
                what: "shader program",
                ..
            }
        ));
        assert_eq!(gl.live_shaders(), 0);
    }

    #[test]
    fn custom_binding_names_are_resolved() {
        let mut gl = RecordingGl::new();
        let bindings = BindingNames {
            position_attribute: "position".into(),
            time_uniform: "iTime".into(),
        };
        let program = ProgramBuilder::new(&mut gl, &bindings)
            .build(&split(
                "attribute vec2 position;\nvoid main() { gl_Position = vec4(position, 0.0, 1.0); }",
                "uniform float iTime;\nvoid main() { gl_FragColor = vec4(iTime); }",
            ))
            .unwrap();
        assert_eq!(program.position_attribute(), Some(0));
        assert!(program.time_uniform().is_some());
    }
}
