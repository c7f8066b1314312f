//! Data model shared between the rita dispatcher, tile workers, and callers:
//! colors, textures, vertices, fragments, and the small enums that make up
//! bound render-context state.

pub mod color;
pub mod error;
pub mod fragment;
pub mod options;
pub mod texture;
pub mod vertex;

pub use color::{BlendMethod, Color};
pub use error::{RitaError, RitaResult, TextureError};
pub use fragment::Fragment;
pub use options::{BlitMask, BlitSampler, ClearMask, RenderOptions, TextureFilter, TextureUnit, TextureWrap};
pub use texture::{PixelFormat, Texture};
pub use vertex::{PrimitiveMode, Vertex, VertexBufferMode, WindingOrder};
