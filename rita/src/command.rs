use std::sync::Arc;

use rita_types::{BlendMethod, BlitMask, BlitSampler, Color, Fragment, RenderOptions, Texture, Vertex, VertexBufferMode};

use crate::shader::{FragmentShader, ShaderContext, VertexShader};
use crate::staging::FragmentStaging;

/// Everything a tile worker needs to rasterize and shade a triangle, line,
/// or point, besides the fragments themselves. Built once by the
/// dispatcher per draw call and shared (read-only) by every tile command
/// that draw call produces - a tile worker never reaches back into the
/// context's live, possibly-already-changed state.
pub struct DrawState {
    pub framebuffer: Arc<Texture>,
    pub depth_buffer: Option<Arc<Texture>>,
    pub options: RenderOptions,
    pub fragment_shader: Option<Arc<FragmentShader>>,
    pub shader_ctx: Arc<ShaderContext>,
}

/// Everything a tile worker needs to run the vertex stage over a segment
/// of the bound vertex buffer during parallel vertex processing.
pub struct VertexStageState {
    pub vbuf: Arc<[Vertex]>,
    pub ibuf: Option<Arc<[i32]>>,
    pub buffer_mode: VertexBufferMode,
    pub vertex_shader: Option<Arc<VertexShader>>,
    pub shader_ctx: Arc<ShaderContext>,
    pub staging: Arc<FragmentStaging>,
    pub z_clipping: bool,
}

/// Parameters for a single `blit` call, shared read-only by every tile that
/// the target rectangle touches.
pub struct BlitInfo {
    pub dst_x: i32,
    pub dst_y: i32,
    pub dst_w: i32,
    pub dst_h: i32,
    pub src: Option<Arc<Texture>>,
    pub blend: BlendMethod,
    pub mask: BlitMask,
    pub sampler: BlitSampler,
    pub shader: Option<Arc<FragmentShader>>,
    pub framebuffer: Arc<Texture>,
    pub depth_buffer: Option<Arc<Texture>>,
    pub clear_color: Color,
    pub shader_ctx: Arc<ShaderContext>,
}

/// One unit of work handed to a tile's queue. Screen-space fragments are
/// fully resolved before being placed in a command.
pub enum TileCommand {
    RasterTriangle { fragments: Box<[Fragment; 3]>, state: Arc<DrawState> },
    RasterLine { fragments: Box<[Fragment; 2]>, state: Arc<DrawState> },
    RasterPoint { fragment: Box<Fragment>, state: Arc<DrawState> },
    ProcessVertexSegment { start: usize, end: usize, state: Arc<VertexStageState> },
    Blit(Arc<BlitInfo>),
    Terminate,
}
