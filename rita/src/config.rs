use rita_types::{RitaError, RitaResult};

/// Which vertex fields a draw call produces and interpolates. `Simple`
/// drops `tangent` and the fragment's world position/tangent, matching the
/// original's SIMPLE build variant; `Default` carries the full set. Chosen
/// at [`RendererConfig`] construction rather than at compile time, since
/// Rust has no portable stand-in for recompiling against a different
/// `#define`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum VertexVariant {
    Simple,
    #[default]
    Default,
}

/// Whether vertex shading for a draw call is done by the dispatching thread
/// alone, or fanned out across the leading tile workers via the shared
/// fragment-staging buffer (§4.3 step 2).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum VertexProcessingMode {
    #[default]
    Serial,
    Parallel,
}

/// Tunable constants the original exposed as compile-time macros
/// (`TILE_W`, `TILE_H`, `TILE_Q_CAPACITY`, `MAX_TILES`, vertex
/// variant/processing choice), gathered into one runtime struct passed to
/// [`crate::context::Context::init`].
#[derive(Debug, Copy, Clone)]
pub struct RendererConfig {
    pub tile_width: u32,
    pub tile_height: u32,
    pub queue_capacity: usize,
    pub max_tiles: usize,
    pub vertex_variant: VertexVariant,
    pub vertex_processing: VertexProcessingMode,
}

impl RendererConfig {
    pub fn validate(&self) -> RitaResult<()> {
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err(RitaError::InvalidArgument("tile dimensions must be nonzero"));
        }
        if !self.queue_capacity.is_power_of_two() || self.queue_capacity < 2 {
            return Err(RitaError::InvalidArgument("queue capacity must be a power of two >= 2"));
        }
        if self.max_tiles == 0 {
            return Err(RitaError::InvalidArgument("max_tiles must be nonzero"));
        }
        Ok(())
    }

    /// `256x64x256_SERIAL_VERTEX_PROCESSING` in the original's naming
    /// convention: the default preset for most of its demos.
    pub fn preset_256x64x256_serial() -> Self {
        Self {
            tile_width: 256,
            tile_height: 64,
            queue_capacity: 256,
            max_tiles: 64,
            vertex_variant: VertexVariant::Default,
            vertex_processing: VertexProcessingMode::Serial,
        }
    }

    /// Same tile geometry, with parallel vertex processing enabled.
    pub fn preset_256x64x256_parallel() -> Self {
        Self { vertex_processing: VertexProcessingMode::Parallel, ..Self::preset_256x64x256_serial() }
    }

    /// Smaller tiles, useful for tests exercising many tile boundaries on a
    /// small framebuffer.
    pub fn preset_64x64x64_serial() -> Self {
        Self {
            tile_width: 64,
            tile_height: 64,
            queue_capacity: 64,
            max_tiles: 256,
            vertex_variant: VertexVariant::Default,
            vertex_processing: VertexProcessingMode::Serial,
        }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self::preset_256x64x256_serial()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn presets_validate() {
        assert!(RendererConfig::preset_256x64x256_serial().validate().is_ok());
        assert!(RendererConfig::preset_256x64x256_parallel().validate().is_ok());
        assert!(RendererConfig::preset_64x64x64_serial().validate().is_ok());
    }

    #[test]
    fn non_power_of_two_queue_capacity_rejected() {
        let mut cfg = RendererConfig::default();
        cfg.queue_capacity = 100;
        assert!(cfg.validate().is_err());
    }
}
