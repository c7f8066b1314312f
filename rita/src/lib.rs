//! A tiled, multi-threaded software rasterizer with a programmable
//! pipeline: vertex transformation, primitive assembly, spatial binning to
//! screen tiles, per-tile barycentric rasterization, texture sampling, and
//! a blit engine, coordinated across a worker pool with bounded per-tile
//! command queues.

pub mod aabb;
pub mod command;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod font;
pub mod queue;
pub mod sample;
pub mod shader;
pub mod staging;
pub mod tile;

pub use aabb::Aabb;
pub use command::{BlitInfo, TileCommand};
pub use config::{RendererConfig, VertexProcessingMode, VertexVariant};
pub use context::{blit_texture, Context};
pub use shader::{FragmentShader, ShaderContext, Transforms, VertexShader};

pub use rita_types::{
    BlendMethod, BlitMask, BlitSampler, ClearMask, Color, Fragment, PixelFormat, PrimitiveMode, RenderOptions,
    RitaError, RitaResult, Texture, TextureFilter, TextureUnit, TextureWrap, Vertex, VertexBufferMode, WindingOrder,
};
