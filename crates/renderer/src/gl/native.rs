use glow::HasContext;

use super::GlBackend;
use crate::types::StageKind;

type Gl = glow::Context;

/// Vertex buffer holding the full-screen quad, plus the vertex array that
/// captures its attribute binding when the context supports one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlowQuad {
    buffer: <Gl as HasContext>::Buffer,
    vertex_array: Option<<Gl as HasContext>::VertexArray>,
    attribute: Option<u32>,
}

/// [`GlBackend`] on top of a `glow` context (desktop GL, GLES, or WebGL).
pub struct GlowBackend {
    gl: Gl,
    vertex_arrays: bool,
}

impl GlowBackend {
    /// Wraps an already-loaded context.
    ///
    /// # Safety
    ///
    /// `gl` must be current on the calling thread for as long as the backend is
    /// used, and every call must happen on that thread.
    pub unsafe fn new(gl: Gl) -> Self {
        let version = gl.version();
        // GLES 2 / WebGL 1 lack core vertex array objects.
        let vertex_arrays = version.major >= 3;
        tracing::debug!(
            major = version.major,
            minor = version.minor,
            embedded = version.is_embedded,
            vertex_arrays,
            vendor = %version.vendor_info,
            "initialised glow backend"
        );
        Self { gl, vertex_arrays }
    }

    pub fn gl(&self) -> &Gl {
        &self.gl
    }

    fn point_attribute(&self, attribute: u32) {
        unsafe {
            self.gl.enable_vertex_attrib_array(attribute);
            self.gl
                .vertex_attrib_pointer_f32(attribute, 2, glow::FLOAT, false, 0, 0);
        }
    }
}

impl GlBackend for GlowBackend {
    type Shader = <Gl as HasContext>::Shader;
    type Program = <Gl as HasContext>::Program;
    type Quad = GlowQuad;
    type UniformLocation = <Gl as HasContext>::UniformLocation;

    fn create_shader(&mut self, stage: StageKind) -> Result<Self::Shader, String> {
        let kind = match stage {
            StageKind::Vertex => glow::VERTEX_SHADER,
            StageKind::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe { self.gl.create_shader(kind) }
    }

    fn shader_source(&mut self, shader: Self::Shader, source: &str) {
        unsafe { self.gl.shader_source(shader, source) }
    }

    fn compile_shader(&mut self, shader: Self::Shader) {
        unsafe { self.gl.compile_shader(shader) }
    }

    fn shader_compile_status(&mut self, shader: Self::Shader) -> bool {
        unsafe { self.gl.get_shader_compile_status(shader) }
    }

    fn shader_info_log(&mut self, shader: Self::Shader) -> String {
        unsafe { self.gl.get_shader_info_log(shader) }
    }

    fn delete_shader(&mut self, shader: Self::Shader) {
        unsafe { self.gl.delete_shader(shader) }
    }

    fn create_program(&mut self) -> Result<Self::Program, String> {
        unsafe { self.gl.create_program() }
    }

    fn attach_shader(&mut self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.attach_shader(program, shader) }
    }

    fn detach_shader(&mut self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.detach_shader(program, shader) }
    }

    fn link_program(&mut self, program: Self::Program) {
        unsafe { self.gl.link_program(program) }
    }

    fn program_link_status(&mut self, program: Self::Program) -> bool {
        unsafe { self.gl.get_program_link_status(program) }
    }

    fn program_info_log(&mut self, program: Self::Program) -> String {
        unsafe { self.gl.get_program_info_log(program) }
    }

    fn delete_program(&mut self, program: Self::Program) {
        unsafe { self.gl.delete_program(program) }
    }

    fn attrib_location(&mut self, program: Self::Program, name: &str) -> Option<u32> {
        unsafe { self.gl.get_attrib_location(program, name) }
    }

    fn uniform_location(
        &mut self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { self.gl.get_uniform_location(program, name) }
    }

    fn create_quad(
        &mut self,
        positions: &[f32],
        attribute: Option<u32>,
    ) -> Result<Self::Quad, String> {
        unsafe {
            let vertex_array = if self.vertex_arrays {
                let vao = self.gl.create_vertex_array()?;
                self.gl.bind_vertex_array(Some(vao));
                Some(vao)
            } else {
                None
            };

            let buffer = match self.gl.create_buffer() {
                Ok(buffer) => buffer,
                Err(err) => {
                    if let Some(vao) = vertex_array {
                        self.gl.bind_vertex_array(None);
                        self.gl.delete_vertex_array(vao);
                    }
                    return Err(err);
                }
            };
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            self.gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(positions),
                glow::STATIC_DRAW,
            );
            if let Some(attribute) = attribute {
                self.point_attribute(attribute);
            }
            if vertex_array.is_some() {
                self.gl.bind_vertex_array(None);
            }

            Ok(GlowQuad {
                buffer,
                vertex_array,
                attribute,
            })
        }
    }

    fn delete_quad(&mut self, quad: Self::Quad) {
        unsafe {
            if let Some(vao) = quad.vertex_array {
                self.gl.bind_vertex_array(None);
                self.gl.delete_vertex_array(vao);
            }
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
            self.gl.delete_buffer(quad.buffer);
        }
    }

    fn viewport(&mut self, width: i32, height: i32) {
        unsafe { self.gl.viewport(0, 0, width, height) }
    }

    fn clear(&mut self, color: [f32; 4]) {
        unsafe {
            self.gl.clear_color(color[0], color[1], color[2], color[3]);
            self.gl.clear(glow::COLOR_BUFFER_BIT);
        }
    }

    fn use_program(&mut self, program: Option<Self::Program>) {
        unsafe { self.gl.use_program(program) }
    }

    fn bind_quad(&mut self, quad: Self::Quad) {
        match quad.vertex_array {
            Some(vao) => unsafe { self.gl.bind_vertex_array(Some(vao)) },
            None => {
                unsafe { self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(quad.buffer)) };
                if let Some(attribute) = quad.attribute {
                    self.point_attribute(attribute);
                }
            }
        }
    }

    fn uniform_f32(&mut self, location: &Self::UniformLocation, value: f32) {
        unsafe { self.gl.uniform_1_f32(Some(location), value) }
    }

    fn draw_triangle_strip(&mut self, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(glow::TRIANGLE_STRIP, first, count) }
    }
}
