use std::fmt;

/// Sentinel line that separates the vertex stage from the fragment stage in a
/// generated shader blob.
pub const DEFAULT_SENTINEL: &str = "// Fragment Shader";

/// Attribute the vertex stage must declare for the full-screen quad positions.
pub const DEFAULT_POSITION_ATTRIBUTE: &str = "a_position";

/// Optional scalar uniform fed with elapsed seconds every frame.
pub const DEFAULT_TIME_UNIFORM: &str = "u_time";

/// Full-screen quad drawn as a triangle strip, two floats per vertex.
pub const QUAD_POSITIONS: [f32; 8] = [-1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, 1.0];

/// Number of vertices in [`QUAD_POSITIONS`].
pub const QUAD_VERTEX_COUNT: i32 = 4;

/// Pipeline stage a shader object belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Vertex,
    Fragment,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Vertex => f.write_str("vertex"),
            StageKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// Names the generated shaders are expected to use for their inputs.
///
/// The generation service has to honour these; they are not negotiated from the
/// source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingNames {
    pub position_attribute: String,
    pub time_uniform: String,
}

impl Default for BindingNames {
    fn default() -> Self {
        Self {
            position_attribute: DEFAULT_POSITION_ATTRIBUTE.to_string(),
            time_uniform: DEFAULT_TIME_UNIFORM.to_string(),
        }
    }
}

/// Knobs for a [`ShaderCanvas`](crate::ShaderCanvas).
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasOptions {
    /// Line that divides the vertex and fragment stage in a source blob.
    pub sentinel: String,
    /// Attribute/uniform names resolved after linking.
    pub bindings: BindingNames,
    /// RGBA colour the target is cleared to before each draw.
    pub clear_color: [f32; 4],
}

impl Default for CanvasOptions {
    fn default() -> Self {
        Self {
            sentinel: DEFAULT_SENTINEL.to_string(),
            bindings: BindingNames::default(),
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}
