use bitflags::bitflags;

/// Texture binding points a render context exposes. `Specular` and
/// `Roughness`/`Gloss` and `FrameBuffer`/`DepthBuffer` are distinct slots;
/// unlike the original header, which let `ROUGHNESS` alias `GLOSS` as the
/// same numeric unit, each unit here is its own enum variant - no payload
/// scheme reuses an index for two different roles.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TextureUnit {
    Diffuse,
    Specular,
    Roughness,
    Emissive,
    Normal,
    Displacement,
    FrameBuffer,
    DepthBuffer,
}

impl TextureUnit {
    pub const ALL: [TextureUnit; 8] = [
        TextureUnit::Diffuse,
        TextureUnit::Specular,
        TextureUnit::Roughness,
        TextureUnit::Emissive,
        TextureUnit::Normal,
        TextureUnit::Displacement,
        TextureUnit::FrameBuffer,
        TextureUnit::DepthBuffer,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

bitflags! {
    /// Per-context render options. Mirrors the original header's bit
    /// layout in spirit (one bit per toggle) but as a `bitflags` type
    /// instead of raw shifted constants.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct RenderOptions: u32 {
        const BACKFACE_CULLING          = 1 << 0;
        const DEPTH_TESTING             = 1 << 1;
        const ORDER_DEPENDENT_ALPHA_BLEND = 1 << 2;
        const Z_CLIPPING                = 1 << 3;
        const DEPTH_BUFFER_WRITING      = 1 << 4;
        const WIRE_FRAMES               = 1 << 5;
    }
}

impl Default for RenderOptions {
    /// Matches the original context defaults: depth writes on, everything
    /// else off (including depth testing itself - you can write depth
    /// without gating on it).
    fn default() -> Self {
        RenderOptions::DEPTH_BUFFER_WRITING
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TextureFilter {
    #[default]
    Nearest,
    Bilinear,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TextureWrap {
    #[default]
    None,
    Clamp,
    Repeat,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlitMask {
    Everywhere,
    ClearColor,
    NonClearColor,
    DepthInf,
    DepthNonInf,
}

bitflags! {
    /// Which attachments a `clear` call resets.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct ClearMask: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlitSampler {
    BoxCoord,
    ScreenCoord,
    ViewDirRectilinear,
    ViewDirCubemap,
    Shader,
}
