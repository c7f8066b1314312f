use rita_math::{vec2, vec3, vec4};

use crate::color::Color;

/// Input vertex, as supplied by the caller's vertex/index buffer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Vertex {
    pub pos: vec4,
    pub normal: vec3,
    pub tangent: vec3,
    pub uv: vec2,
    pub color: Color,
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            pos: vec4::new(0.0, 0.0, 0.0, 1.0),
            normal: vec3::default(),
            tangent: vec3::default(),
            uv: vec2::default(),
            color: Color::WHITE,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum VertexBufferMode {
    #[default]
    Array,
    Indexed,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum WindingOrder {
    #[default]
    CounterClockwise,
    Clockwise,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PrimitiveMode {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}
