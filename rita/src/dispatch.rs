//! Pure, allocation-light helpers shared by the serial and parallel vertex
//! paths and by the primitive dispatcher in [`crate::context`]: vertex
//! buffer walking, the default vertex stage, primitive-stream enumeration,
//! and backface determination.

use rita_math::vec4;
use rita_types::{Fragment, PrimitiveMode, Vertex, VertexBufferMode, WindingOrder};

use crate::shader::{ShaderContext, VertexShader};

/// Resolves logical vertex-stream position `i` to an index into `vbuf`,
/// honoring `ARRAY` vs `INDEXED` mode. Returns `None` once the active
/// buffer is exhausted - this is how a draw call's vertex stream ends,
/// there being no separate explicit count parameter.
pub fn next_vertex_index(
    mode: VertexBufferMode,
    ibuf: Option<&[i32]>,
    vbuf: &[Vertex],
    i: usize,
) -> Option<usize> {
    match mode {
        VertexBufferMode::Array => (i < vbuf.len()).then_some(i),
        VertexBufferMode::Indexed => {
            let ibuf = ibuf?;
            let idx = *ibuf.get(i)?;
            let idx = usize::try_from(idx).ok()?;
            (idx < vbuf.len()).then_some(idx)
        }
    }
}

/// Runs the vertex stage for one vertex (§4.4): shade (user callback or
/// the default pipeline), perspective divide, NDC clip test, viewport
/// mapping, producing a screen-space [`Fragment`].
pub fn shade_vertex(
    ctx: &ShaderContext,
    vertex: &Vertex,
    vertex_shader: Option<&VertexShader>,
    z_clipping: bool,
) -> Fragment {
    let shaded = match vertex_shader {
        Some(shader) => shader(ctx, vertex),
        None => {
            let t = &ctx.transforms;
            let pos_clip = t.mvp().mul_vec4(vec4::new(vertex.pos.x, vertex.pos.y, vertex.pos.z, 1.0));
            Vertex {
                pos: pos_clip,
                normal: t.normal_matrix.mul_vec3(vertex.normal),
                tangent: t.normal_matrix.mul_vec3(vertex.tangent),
                uv: vertex.uv,
                color: vertex.color,
            }
        }
    };

    let ndc = shaded.pos.perspective_divide();
    let clipping = ndc.x < -1.0
        || ndc.x > 1.0
        || ndc.y < -1.0
        || ndc.y > 1.0
        || (z_clipping && (ndc.z < -1.0 || ndc.z > 1.0));

    let screen = ctx.transforms.viewport.mul_vec4(ndc);

    let world_pos = ctx
        .transforms
        .model
        .mul_vec4(vec4::new(vertex.pos.x, vertex.pos.y, vertex.pos.z, 1.0))
        .xyz();

    Fragment {
        world_pos,
        world_normal: shaded.normal,
        world_tangent: shaded.tangent,
        uv: shaded.uv,
        color: shaded.color,
        x: rita_math::round_to_int(screen.x),
        y: rita_math::round_to_int(screen.y),
        inv_z: if ndc.z != 0.0 { 1.0 / ndc.z } else { f32::INFINITY },
        clipping,
    }
}

/// One primitive assembled from positions in the walked vertex stream
/// (indices into the per-draw fragment array, not the vertex buffer).
#[derive(Debug, Copy, Clone)]
pub enum Primitive {
    Point(usize),
    Line(usize, usize),
    Triangle(usize, usize, usize),
}

/// Enumerates the primitives a vertex stream of length `n` produces under
/// `mode` (§4.3 step 3).
pub fn enumerate_primitives(mode: PrimitiveMode, n: usize) -> Vec<Primitive> {
    match mode {
        PrimitiveMode::Points => (0..n).map(Primitive::Point).collect(),
        PrimitiveMode::Lines => (0..n).step_by(2).filter(|&i| i + 1 < n).map(|i| Primitive::Line(i, i + 1)).collect(),
        PrimitiveMode::LineStrip => (0..n.saturating_sub(1)).map(|i| Primitive::Line(i, i + 1)).collect(),
        PrimitiveMode::Triangles => (0..n)
            .step_by(3)
            .filter(|&i| i + 2 < n)
            .map(|i| Primitive::Triangle(i, i + 1, i + 2))
            .collect(),
        PrimitiveMode::TriangleStrip => (0..n.saturating_sub(2))
            .map(|i| if i % 2 == 0 { Primitive::Triangle(i, i + 1, i + 2) } else { Primitive::Triangle(i, i + 2, i + 1) })
            .collect(),
        PrimitiveMode::TriangleFan => (1..n.saturating_sub(1)).map(|i| Primitive::Triangle(0, i, i + 1)).collect(),
    }
}

/// Whether a screen-space triangle faces the camera under `winding`,
/// measured from its signed 2D area (screen space is y-down, so a
/// counter-clockwise triangle in world space has negative signed area here).
pub fn is_front_facing(f0: &Fragment, f1: &Fragment, f2: &Fragment, winding: WindingOrder) -> bool {
    let area = (f1.x - f0.x) as f32 * (f2.y - f0.y) as f32 - (f2.x - f0.x) as f32 * (f1.y - f0.y) as f32;
    match winding {
        WindingOrder::CounterClockwise => area < 0.0,
        WindingOrder::Clockwise => area > 0.0,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn array_mode_walks_vertex_buffer_in_order() {
        let vbuf = vec![Vertex::default(); 3];
        assert_eq!(next_vertex_index(VertexBufferMode::Array, None, &vbuf, 0), Some(0));
        assert_eq!(next_vertex_index(VertexBufferMode::Array, None, &vbuf, 2), Some(2));
        assert_eq!(next_vertex_index(VertexBufferMode::Array, None, &vbuf, 3), None);
    }

    #[test]
    fn indexed_mode_walks_index_buffer() {
        let vbuf = vec![Vertex::default(); 5];
        let ibuf = [4i32, 0, 2];
        assert_eq!(next_vertex_index(VertexBufferMode::Indexed, Some(&ibuf), &vbuf, 0), Some(4));
        assert_eq!(next_vertex_index(VertexBufferMode::Indexed, Some(&ibuf), &vbuf, 2), Some(2));
        assert_eq!(next_vertex_index(VertexBufferMode::Indexed, Some(&ibuf), &vbuf, 3), None);
    }

    #[test]
    fn triangle_strip_alternates_winding() {
        let prims = enumerate_primitives(PrimitiveMode::TriangleStrip, 4);
        assert_eq!(prims.len(), 2);
        assert!(matches!(prims[0], Primitive::Triangle(0, 1, 2)));
        assert!(matches!(prims[1], Primitive::Triangle(1, 3, 2)));
    }

    #[test]
    fn triangle_fan_shares_first_vertex() {
        let prims = enumerate_primitives(PrimitiveMode::TriangleFan, 4);
        assert_eq!(prims.len(), 2);
        assert!(matches!(prims[0], Primitive::Triangle(0, 1, 2)));
        assert!(matches!(prims[1], Primitive::Triangle(0, 2, 3)));
    }
}
