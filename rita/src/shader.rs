use std::sync::Arc;

use rita_math::{mat3, mat4};
use rita_types::{Color, Fragment, RenderOptions, Texture, TextureFilter, TextureUnit, TextureWrap, Vertex};

use crate::sample;

/// A vertex stage: takes the bound context and a raw input vertex, returns
/// a shaded vertex in clip space (`pos`), with `normal`/`tangent` rotated
/// into world space and `uv`/`color` passed through or remapped. Matches
/// the original's function-pointer vertex callback, reshaped into a
/// `dyn Fn` closure per the "function pointer -> closure" design note.
pub type VertexShader = dyn Fn(&ShaderContext, &Vertex) -> Vertex + Send + Sync;

/// A fragment stage: takes the bound context and the interpolated
/// fragment, returns the final shaded color.
pub type FragmentShader = dyn Fn(&ShaderContext, &Fragment) -> Color + Send + Sync;

/// Derived matrices for one draw call, computed once by the dispatcher and
/// shared read-only across every tile worker for the duration of that draw.
#[derive(Debug, Copy, Clone)]
pub struct Transforms {
    pub model: mat4,
    pub view: mat4,
    pub proj: mat4,
    pub viewport: mat4,
    pub normal_matrix: mat3,
    /// Upper-left 3x3 of the view matrix, transposed (= inverted, since the
    /// view matrix's rotational part is orthonormal). Used to rotate a
    /// view-space ray back into world space for blit's view-direction
    /// samplers.
    pub inverse_view: mat3,
}

impl Transforms {
    pub fn mv(&self) -> mat4 {
        self.view * self.model
    }

    pub fn mvp(&self) -> mat4 {
        self.proj * self.view * self.model
    }
}

/// The read-only state a vertex/fragment shader or a blit view-direction
/// sampler may need: bound matrices, texture units, and the active
/// filter/wrap/option settings. Built fresh for each draw/blit dispatch and
/// shared (never mutated) by every tile worker touched by it.
pub struct ShaderContext {
    pub transforms: Transforms,
    pub textures: [Option<Arc<Texture>>; TextureUnit::ALL.len()],
    pub options: RenderOptions,
    pub texture_filter: TextureFilter,
    pub texture_wrap: TextureWrap,
    /// Viewport aspect ratio (`width / height`), used by blit's
    /// view-direction samplers to reconstruct a ray from screen coordinates.
    pub aspect: f32,
}

impl ShaderContext {
    pub fn texture(&self, unit: TextureUnit) -> Option<&Texture> {
        self.textures[unit.index()].as_ref()
    }

    /// Samples a bound texture unit at normalized `uv`, honoring the
    /// context's active filter and wrap mode. Returns `None` if nothing is
    /// bound to `unit`.
    pub fn sample(&self, unit: TextureUnit, uv: rita_math::vec2) -> Option<Color> {
        let tex = self.texture(unit)?;
        Some(sample::sample_uv(tex, uv, self.texture_filter, self.texture_wrap))
    }
}
