//! Headless [`GlBackend`] that records every call.
//!
//! Shader "compilation" succeeds unless a failure was injected for the stage
//! or the source contains an `#error` directive, mirroring what a real GLSL
//! compiler does with it. Attribute and uniform lookups succeed when the
//! requested name appears in the program's sources. Any use of a released
//! object is recorded as a violation rather than panicking so tests can assert
//! on it.

use std::collections::{HashMap, HashSet};

use super::GlBackend;
use crate::types::StageKind;

/// One recorded GL call.
#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    CreateShader { shader: u32, stage: StageKind },
    CompileShader { shader: u32 },
    DeleteShader { shader: u32 },
    CreateProgram { program: u32 },
    AttachShader { program: u32, shader: u32 },
    DetachShader { program: u32, shader: u32 },
    LinkProgram { program: u32 },
    DeleteProgram { program: u32 },
    CreateQuad { quad: u32, attribute: Option<u32> },
    DeleteQuad { quad: u32 },
    Viewport { width: i32, height: i32 },
    Clear,
    UseProgram { program: Option<u32> },
    BindQuad { quad: u32 },
    UniformF32 { program: u32, name: String, value: f32 },
    DrawTriangleStrip { first: i32, count: i32 },
}

/// Uniform location handed out by [`RecordingGl`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedUniform {
    program: u32,
    name: String,
}

#[derive(Debug)]
struct ShaderState {
    stage: StageKind,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Debug, Default)]
struct ProgramState {
    attached: Vec<u32>,
    sources: Vec<(StageKind, String)>,
    linked: bool,
    log: String,
}

#[derive(Debug, Default)]
pub struct RecordingGl {
    next_id: u32,
    shaders: HashMap<u32, ShaderState>,
    programs: HashMap<u32, ProgramState>,
    quads: HashSet<u32>,
    current_program: Option<u32>,
    calls: Vec<GlCall>,
    violations: Vec<String>,
    compile_failures: HashMap<StageKind, String>,
    link_failure: Option<String>,
    refuse_programs: bool,
    refuse_quads: bool,
}

impl RecordingGl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every compile of `stage` fail with `log` until cleared.
    pub fn fail_compile(&mut self, stage: StageKind, log: impl Into<String>) {
        self.compile_failures.insert(stage, log.into());
    }

    /// Makes every link fail with `log` until cleared.
    pub fn fail_link(&mut self, log: impl Into<String>) {
        self.link_failure = Some(log.into());
    }

    pub fn refuse_program_allocation(&mut self, refuse: bool) {
        self.refuse_programs = refuse;
    }

    pub fn refuse_quad_allocation(&mut self, refuse: bool) {
        self.refuse_quads = refuse;
    }

    pub fn clear_failures(&mut self) {
        self.compile_failures.clear();
        self.link_failure = None;
        self.refuse_programs = false;
        self.refuse_quads = false;
    }

    pub fn calls(&self) -> &[GlCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<GlCall> {
        std::mem::take(&mut self.calls)
    }

    /// Accesses to objects that were already deleted (or never existed).
    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    pub fn live_shaders(&self) -> usize {
        self.shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn live_quads(&self) -> usize {
        self.quads.len()
    }

    pub fn is_program_live(&self, program: u32) -> bool {
        self.programs.contains_key(&program)
    }

    pub fn draw_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, GlCall::DrawTriangleStrip { .. }))
            .count()
    }

    /// Programs that were active when each draw call was issued.
    pub fn drawn_programs(&self) -> Vec<Option<u32>> {
        let mut current = None;
        let mut drawn = Vec::new();
        for call in &self.calls {
            match call {
                GlCall::UseProgram { program } => current = *program,
                GlCall::DrawTriangleStrip { .. } => drawn.push(current),
                _ => {}
            }
        }
        drawn
    }

    /// Values uploaded through `uniform_f32`, in call order.
    pub fn uniform_values(&self, name: &str) -> Vec<f32> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                GlCall::UniformF32 {
                    name: uniform,
                    value,
                    ..
                } if uniform == name => Some(*value),
                _ => None,
            })
            .collect()
    }

    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn violation(&mut self, message: String) {
        tracing::warn!(%message, "recorded GL violation");
        self.violations.push(message);
    }

    fn program_mentions(&self, program: u32, stage: Option<StageKind>, name: &str) -> bool {
        self.programs.get(&program).is_some_and(|state| {
            state.linked
                && state
                    .sources
                    .iter()
                    .filter(|(kind, _)| stage.map_or(true, |wanted| *kind == wanted))
                    .any(|(_, source)| source.contains(name))
        })
    }
}

impl GlBackend for RecordingGl {
    type Shader = u32;
    type Program = u32;
    type Quad = u32;
    type UniformLocation = RecordedUniform;

    fn create_shader(&mut self, stage: StageKind) -> Result<u32, String> {
        let shader = self.allocate();
        self.shaders.insert(
            shader,
            ShaderState {
                stage,
                source: String::new(),
                compiled: false,
                log: String::new(),
            },
        );
        self.calls.push(GlCall::CreateShader { shader, stage });
        Ok(shader)
    }

    fn shader_source(&mut self, shader: u32, source: &str) {
        match self.shaders.get_mut(&shader) {
            Some(state) => state.source = source.to_string(),
            None => self.violation(format!("shader_source on released shader {shader}")),
        }
    }

    fn compile_shader(&mut self, shader: u32) {
        self.calls.push(GlCall::CompileShader { shader });
        let Some(state) = self.shaders.get_mut(&shader) else {
            self.violation(format!("compile_shader on released shader {shader}"));
            return;
        };
        if let Some(log) = self.compile_failures.get(&state.stage) {
            state.compiled = false;
            state.log = log.clone();
        } else if let Some(line) = state
            .source
            .lines()
            .position(|line| line.trim_start().starts_with("#error"))
        {
            state.compiled = false;
            state.log = format!("ERROR: 0:{}: '#error' : directive", line + 1);
        } else {
            state.compiled = true;
            state.log.clear();
        }
    }

    fn shader_compile_status(&mut self, shader: u32) -> bool {
        self.shaders.get(&shader).is_some_and(|state| state.compiled)
    }

    fn shader_info_log(&mut self, shader: u32) -> String {
        self.shaders
            .get(&shader)
            .map(|state| state.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&mut self, shader: u32) {
        self.calls.push(GlCall::DeleteShader { shader });
        if self.shaders.remove(&shader).is_none() {
            self.violation(format!("delete_shader on released shader {shader}"));
        }
    }

    fn create_program(&mut self) -> Result<u32, String> {
        if self.refuse_programs {
            return Err("out of program objects".to_string());
        }
        let program = self.allocate();
        self.programs.insert(program, ProgramState::default());
        self.calls.push(GlCall::CreateProgram { program });
        Ok(program)
    }

    fn attach_shader(&mut self, program: u32, shader: u32) {
        self.calls.push(GlCall::AttachShader { program, shader });
        if !self.shaders.contains_key(&shader) {
            self.violation(format!("attach of released shader {shader}"));
            return;
        }
        match self.programs.get_mut(&program) {
            Some(state) => state.attached.push(shader),
            None => self.violation(format!("attach to released program {program}")),
        }
    }

    fn detach_shader(&mut self, program: u32, shader: u32) {
        self.calls.push(GlCall::DetachShader { program, shader });
        match self.programs.get_mut(&program) {
            Some(state) => state.attached.retain(|attached| *attached != shader),
            None => self.violation(format!("detach from released program {program}")),
        }
    }

    fn link_program(&mut self, program: u32) {
        self.calls.push(GlCall::LinkProgram { program });
        let Some(state) = self.programs.get_mut(&program) else {
            self.violation(format!("link of released program {program}"));
            return;
        };
        let mut sources = Vec::new();
        let mut problem = self.link_failure.clone();
        for shader in &state.attached {
            match self.shaders.get(shader) {
                Some(shader) if shader.compiled => {
                    sources.push((shader.stage, shader.source.clone()))
                }
                _ => problem = Some(format!("shader {shader} is not compiled")),
            }
        }
        for stage in [StageKind::Vertex, StageKind::Fragment] {
            if !sources.iter().any(|(kind, _)| *kind == stage) {
                problem.get_or_insert_with(|| format!("missing {stage} shader"));
            }
        }
        state.sources = sources;
        match problem {
            Some(log) => {
                state.linked = false;
                state.log = log;
            }
            None => {
                state.linked = true;
                state.log.clear();
            }
        }
    }

    fn program_link_status(&mut self, program: u32) -> bool {
        self.programs.get(&program).is_some_and(|state| state.linked)
    }

    fn program_info_log(&mut self, program: u32) -> String {
        self.programs
            .get(&program)
            .map(|state| state.log.clone())
            .unwrap_or_default()
    }

    fn delete_program(&mut self, program: u32) {
        self.calls.push(GlCall::DeleteProgram { program });
        if self.programs.remove(&program).is_none() {
            self.violation(format!("delete_program on released program {program}"));
        }
        if self.current_program == Some(program) {
            self.current_program = None;
        }
    }

    fn attrib_location(&mut self, program: u32, name: &str) -> Option<u32> {
        self.program_mentions(program, Some(StageKind::Vertex), name)
            .then_some(0)
    }

    fn uniform_location(&mut self, program: u32, name: &str) -> Option<RecordedUniform> {
        self.program_mentions(program, None, name)
            .then(|| RecordedUniform {
                program,
                name: name.to_string(),
            })
    }

    fn create_quad(&mut self, positions: &[f32], attribute: Option<u32>) -> Result<u32, String> {
        if self.refuse_quads {
            return Err("out of buffer objects".to_string());
        }
        if positions.len() % 2 != 0 {
            return Err(format!("{} floats do not form 2D vertices", positions.len()));
        }
        let quad = self.allocate();
        self.quads.insert(quad);
        self.calls.push(GlCall::CreateQuad { quad, attribute });
        Ok(quad)
    }

    fn delete_quad(&mut self, quad: u32) {
        self.calls.push(GlCall::DeleteQuad { quad });
        if !self.quads.remove(&quad) {
            self.violation(format!("delete_quad on released quad {quad}"));
        }
    }

    fn viewport(&mut self, width: i32, height: i32) {
        self.calls.push(GlCall::Viewport { width, height });
    }

    fn clear(&mut self, _color: [f32; 4]) {
        self.calls.push(GlCall::Clear);
    }

    fn use_program(&mut self, program: Option<u32>) {
        self.calls.push(GlCall::UseProgram { program });
        if let Some(id) = program {
            if !self.programs.contains_key(&id) {
                self.violation(format!("use_program on released program {id}"));
            }
        }
        self.current_program = program;
    }

    fn bind_quad(&mut self, quad: u32) {
        self.calls.push(GlCall::BindQuad { quad });
        if !self.quads.contains(&quad) {
            self.violation(format!("bind of released quad {quad}"));
        }
    }

    fn uniform_f32(&mut self, location: &RecordedUniform, value: f32) {
        self.calls.push(GlCall::UniformF32 {
            program: location.program,
            name: location.name.clone(),
            value,
        });
        if !self.programs.contains_key(&location.program) {
            self.violation(format!(
                "uniform upload to released program {}",
                location.program
            ));
        } else if self.current_program != Some(location.program) {
            self.violation(format!(
                "uniform upload to program {} while it is not in use",
                location.program
            ));
        }
    }

    fn draw_triangle_strip(&mut self, first: i32, count: i32) {
        self.calls.push(GlCall::DrawTriangleStrip { first, count });
        match self.current_program {
            Some(program) if self.programs.contains_key(&program) => {}
            Some(program) => self.violation(format!("draw with released program {program}")),
            None => self.violation("draw without a program".to_string()),
        }
    }
}
