use rita_math::{vec2, vec3};

use crate::color::Color;

/// A vertex after projection into screen space, or an interpolated point
/// along an edge/inside a triangle. This is the unit of work a tile worker
/// rasterizes and shades.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Fragment {
    pub world_pos: vec3,
    pub world_normal: vec3,
    pub world_tangent: vec3,
    pub uv: vec2,
    pub color: Color,
    pub x: i32,
    pub y: i32,
    /// `1 / ndc.z`; the depth test and interpolation both work in this
    /// space, not linear depth.
    pub inv_z: f32,
    /// Set when the projected vertex fell outside the `[-1, 1]` NDC cube.
    /// A primitive is discarded only when *every* vertex is flagged, which
    /// is an approximation, not proper clipping (see
    /// [`crate::error`] for the tradeoffs this implies).
    pub clipping: bool,
}

impl Default for Fragment {
    fn default() -> Self {
        Self {
            world_pos: vec3::default(),
            world_normal: vec3::default(),
            world_tangent: vec3::default(),
            uv: vec2::default(),
            color: Color::default(),
            x: 0,
            y: 0,
            inv_z: 1.0,
            clipping: false,
        }
    }
}

impl Fragment {
    /// Linear interpolation along an edge between two fragments, used while
    /// clipping/stepping a rasterized line.
    pub fn lerp(f0: Fragment, f1: Fragment, x: i32, y: i32, t: f32) -> Fragment {
        Fragment {
            world_pos: vec3::lerp(f0.world_pos, f1.world_pos, t),
            world_tangent: vec3::lerp(f0.world_tangent, f1.world_tangent, t),
            world_normal: vec3::lerp(f0.world_normal, f1.world_normal, t),
            uv: vec2::lerp(f0.uv, f1.uv, t),
            color: Color::lerp(f0.color, f1.color, t),
            x,
            y,
            inv_z: rita_math::lerp(f0.inv_z, f1.inv_z, t),
            clipping: false,
        }
    }

    /// Barycentric interpolation of a triangle's three fragments at weights
    /// `(u, v, 1 - u - v)`.
    pub fn berp(f0: Fragment, f1: Fragment, f2: Fragment, u: f32, v: f32, x: i32, y: i32) -> Fragment {
        let w = 1.0 - u - v;
        let lerp3 = |a: f32, b: f32, c: f32| u * a + v * b + w * c;
        Fragment {
            world_pos: vec3::new(
                lerp3(f0.world_pos.x, f1.world_pos.x, f2.world_pos.x),
                lerp3(f0.world_pos.y, f1.world_pos.y, f2.world_pos.y),
                lerp3(f0.world_pos.z, f1.world_pos.z, f2.world_pos.z),
            ),
            world_tangent: vec3::new(
                lerp3(f0.world_tangent.x, f1.world_tangent.x, f2.world_tangent.x),
                lerp3(f0.world_tangent.y, f1.world_tangent.y, f2.world_tangent.y),
                lerp3(f0.world_tangent.z, f1.world_tangent.z, f2.world_tangent.z),
            ),
            world_normal: vec3::new(
                lerp3(f0.world_normal.x, f1.world_normal.x, f2.world_normal.x),
                lerp3(f0.world_normal.y, f1.world_normal.y, f2.world_normal.y),
                lerp3(f0.world_normal.z, f1.world_normal.z, f2.world_normal.z),
            ),
            uv: vec2::new(lerp3(f0.uv.x, f1.uv.x, f2.uv.x), lerp3(f0.uv.y, f1.uv.y, f2.uv.y)),
            color: Color {
                r: lerp3(f0.color.r as f32, f1.color.r as f32, f2.color.r as f32) as u8,
                g: lerp3(f0.color.g as f32, f1.color.g as f32, f2.color.g as f32) as u8,
                b: lerp3(f0.color.b as f32, f1.color.b as f32, f2.color.b as f32) as u8,
                a: lerp3(f0.color.a as f32, f1.color.a as f32, f2.color.a as f32) as u8,
            },
            x,
            y,
            inv_z: lerp3(f0.inv_z, f1.inv_z, f2.inv_z),
            clipping: false,
        }
    }
}
