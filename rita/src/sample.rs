//! Texel/UV/direction sampling shared by the fragment processor and the
//! blit engine's view-direction samplers.

use rita_math::{vec2, vec3};
use rita_types::{Color, Texture, TextureFilter, TextureWrap};

/// Nudges a UV coordinate just off its edge so `NEAREST`/`BILINEAR`
/// sampling at `u == 1.0` or `v == 1.0` lands on the last texel instead of
/// one past it.
const EDGE_BIAS: f32 = 0.001;

fn apply_wrap_1d(v: f32, wrap: TextureWrap) -> f32 {
    match wrap {
        TextureWrap::None => v,
        TextureWrap::Clamp => v.clamp(0.0, 1.0),
        TextureWrap::Repeat => {
            let f = v.fract();
            if f < 0.0 {
                1.0 + f
            } else {
                f
            }
        }
    }
}

fn apply_wrap(uv: vec2, wrap: TextureWrap) -> vec2 {
    vec2::new(apply_wrap_1d(uv.x, wrap), apply_wrap_1d(uv.y, wrap))
}

fn texel_coords(tex: &Texture, uv: vec2) -> (f32, f32) {
    (uv.x * tex.width as f32 - EDGE_BIAS, uv.y * tex.height as f32 - EDGE_BIAS)
}

fn lerp_color(a: Color, b: Color, t: f32) -> Color {
    Color::lerp(a, b, t)
}

/// Samples `tex` at normalized `uv`, honoring `filter` and `wrap`.
pub fn sample_uv(tex: &Texture, uv: vec2, filter: TextureFilter, wrap: TextureWrap) -> Color {
    let uv = apply_wrap(uv, wrap);
    match filter {
        TextureFilter::Nearest => {
            let (tx, ty) = texel_coords(tex, uv);
            tex.sample_texel(tx.floor() as i32, ty.floor() as i32)
        }
        TextureFilter::Bilinear => {
            let (tx, ty) = texel_coords(tex, uv);
            let x0 = tx.floor();
            let y0 = ty.floor();
            let fx = tx - x0;
            let fy = ty - y0;
            let x0 = x0 as i32;
            let y0 = y0 as i32;
            let c00 = tex.sample_texel(x0, y0);
            let c10 = tex.sample_texel(x0 + 1, y0);
            let c01 = tex.sample_texel(x0, y0 + 1);
            let c11 = tex.sample_texel(x0 + 1, y0 + 1);
            let top = lerp_color(c00, c10, fx);
            let bottom = lerp_color(c01, c11, fx);
            lerp_color(top, bottom, fy)
        }
    }
}

/// Equirectangular mapping of a (not necessarily normalized) direction onto
/// `uv` and samples `tex` there.
pub fn sample_rectilinear(tex: &Texture, dir: vec3, filter: TextureFilter, wrap: TextureWrap) -> Color {
    let d = dir.normalize();
    let u = d.z.atan2(d.x) / (2.0 * rita_math::PI) + 0.5;
    let v = d.y * 0.5 + 0.5;
    sample_uv(tex, vec2::new(u, v), filter, wrap)
}

/// Which of the six cubemap faces a direction's dominant axis selects, and
/// the face-local `(u, v)` it maps to. Face layout follows the original's
/// 4-wide x 3-tall cross: top-center, then left/front/right/back across the
/// middle row, then bottom-center.
fn cubemap_face_uv(dir: vec3) -> (usize, f32, f32) {
    let (ax, ay, az) = (dir.x.abs(), dir.y.abs(), dir.z.abs());
    // Face indices into the 4x3 cross grid cells, row-major, (col, row):
    // 0=+Y(top), 1=-X(left), 2=+Z(front), 3=+X(right), 4=-Z(back), 5=-Y(bottom)
    if ax >= ay && ax >= az {
        if dir.x > 0.0 {
            (3, -dir.z / ax * 0.5 + 0.5, -dir.y / ax * 0.5 + 0.5)
        } else {
            (1, dir.z / ax * 0.5 + 0.5, -dir.y / ax * 0.5 + 0.5)
        }
    } else if ay >= ax && ay >= az {
        if dir.y > 0.0 {
            (0, dir.x / ay * 0.5 + 0.5, dir.z / ay * 0.5 + 0.5)
        } else {
            (5, dir.x / ay * 0.5 + 0.5, -dir.z / ay * 0.5 + 0.5)
        }
    } else {
        if dir.z > 0.0 {
            (2, dir.x / az * 0.5 + 0.5, -dir.y / az * 0.5 + 0.5)
        } else {
            (4, -dir.x / az * 0.5 + 0.5, -dir.y / az * 0.5 + 0.5)
        }
    }
}

/// Samples a 4-wide x 3-tall cross-layout cubemap texture by direction.
pub fn sample_cubemap(tex: &Texture, dir: vec3, filter: TextureFilter) -> Color {
    let (face, u, v) = cubemap_face_uv(dir);
    let cell_w = tex.width as f32 / 4.0;
    let cell_h = tex.height as f32 / 3.0;
    let (col, row) = match face {
        0 => (1, 0), // +Y top-center
        1 => (0, 1), // -X left
        2 => (1, 1), // +Z front
        3 => (2, 1), // +X right
        4 => (3, 1), // -Z back
        5 => (1, 2), // -Y bottom-center
        _ => unreachable!(),
    };
    let px = (col as f32 + u) * cell_w;
    let py = (row as f32 + v) * cell_h;
    let full_uv = vec2::new(px / tex.width as f32, py / tex.height as f32);
    sample_uv(tex, full_uv, filter, TextureWrap::Clamp)
}

#[cfg(test)]
mod test {
    use super::*;
    use rita_types::PixelFormat;

    fn solid(w: u32, h: u32, c: Color) -> Texture {
        let tex = Texture::new(PixelFormat::Rgba8, w, h);
        for y in 0..h {
            for x in 0..w {
                unsafe { tex.set_rgba8_unchecked(x, y, c) };
            }
        }
        tex
    }

    #[test]
    fn nearest_clamp_left_edge_is_monotone() {
        let tex = solid(4, 4, Color::WHITE);
        let a = sample_uv(&tex, vec2::new(-1.0, 0.5), TextureFilter::Nearest, TextureWrap::Clamp);
        let b = sample_uv(&tex, vec2::new(0.0, 0.5), TextureFilter::Nearest, TextureWrap::Clamp);
        assert_eq!(a, b);
    }

    #[test]
    fn repeat_wraps_negative_into_unit_range() {
        assert!((apply_wrap_1d(-0.25, TextureWrap::Repeat) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn cubemap_face_centers_are_consistent() {
        let tex = Texture::new(PixelFormat::Rgba8, 4, 3);
        let faces = [
            (vec3::new(1.0, 0.0, 0.0), (2, 1), Color::new(255, 0, 0, 255)),
            (vec3::new(-1.0, 0.0, 0.0), (0, 1), Color::new(0, 255, 0, 255)),
            (vec3::new(0.0, 1.0, 0.0), (1, 0), Color::new(0, 0, 255, 255)),
            (vec3::new(0.0, -1.0, 0.0), (1, 2), Color::new(255, 255, 0, 255)),
            (vec3::new(0.0, 0.0, 1.0), (1, 1), Color::new(0, 255, 255, 255)),
            (vec3::new(0.0, 0.0, -1.0), (3, 1), Color::new(255, 0, 255, 255)),
        ];
        for &(_, (col, row), color) in &faces {
            for y in 0..1u32 {
                for x in 0..1u32 {
                    unsafe { tex.set_rgba8_unchecked(col + x, row + y, color) };
                }
            }
        }
        for &(dir, _, color) in &faces {
            assert_eq!(sample_cubemap(&tex, dir, TextureFilter::Nearest), color);
        }
    }
}
