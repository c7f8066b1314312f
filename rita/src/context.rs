use std::sync::Arc;

use log::{debug, warn};
use rita_math::{mat4, vec3};
use rita_types::{
    BlendMethod, BlitMask, BlitSampler, ClearMask, Color, PixelFormat, PrimitiveMode, RenderOptions, RitaError,
    RitaResult, Texture, TextureFilter, TextureUnit, TextureWrap, Vertex, VertexBufferMode, WindingOrder,
};

use crate::aabb::Aabb;
use crate::command::{BlitInfo, DrawState, TileCommand, VertexStageState};
use crate::config::{RendererConfig, VertexProcessingMode};
use crate::dispatch::{self, Primitive};
use crate::font;
use crate::shader::{FragmentShader, ShaderContext, Transforms, VertexShader};
use crate::staging::FragmentStaging;
use crate::tile::Tile;

const TEXTURE_UNIT_COUNT: usize = TextureUnit::ALL.len();

/// The render context: bound buffers/textures/shaders/matrices/options,
/// and the tile worker pool backing the currently bound framebuffer.
/// Threads the explicit handle through every operation, replacing the
/// original's process-wide singleton (§9 "Global context -> explicit
/// handle").
pub struct Context {
    config: RendererConfig,
    tiles: Vec<Tile>,
    tile_cols: u32,
    tile_rows: u32,

    textures: [Option<Arc<Texture>>; TEXTURE_UNIT_COUNT],
    viewport_width: u32,
    viewport_height: u32,

    vertex_buffer: Arc<[Vertex]>,
    index_buffer: Option<Arc<[i32]>>,
    vertex_buffer_mode: VertexBufferMode,

    winding_order: WindingOrder,
    clear_color: Color,
    texture_filter: TextureFilter,
    texture_wrap: TextureWrap,
    options: RenderOptions,

    vertex_shader: Option<Arc<VertexShader>>,
    fragment_shader: Option<Arc<FragmentShader>>,

    model: mat4,
    view: mat4,
    proj: mat4,
    aspect: f32,

    fragment_staging: Option<Arc<FragmentStaging>>,
}

impl Context {
    /// `init`: zero-initialized bound state, no shaders, no tiles - workers
    /// are spawned lazily on first framebuffer binding (§4.7).
    pub fn init(config: RendererConfig) -> RitaResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            tiles: Vec::new(),
            tile_cols: 0,
            tile_rows: 0,
            textures: [None, None, None, None, None, None, None, None],
            viewport_width: 0,
            viewport_height: 0,
            vertex_buffer: Arc::from(Vec::new()),
            index_buffer: None,
            vertex_buffer_mode: VertexBufferMode::default(),
            winding_order: WindingOrder::default(),
            clear_color: Color::new(0, 0, 0, 255),
            texture_filter: TextureFilter::default(),
            texture_wrap: TextureWrap::default(),
            options: RenderOptions::default(),
            vertex_shader: None,
            fragment_shader: None,
            model: mat4::identity(),
            view: mat4::identity(),
            proj: mat4::identity(),
            aspect: 1.0,
            fragment_staging: None,
        })
    }

    /// `finish`: blocks until every tile's queue is empty and its worker is
    /// idle (§4.1, §5). Establishes a happens-before edge for everything
    /// submitted before this call.
    pub fn finish(&self) {
        for tile in &self.tiles {
            tile.wait_idle();
        }
    }

    // ---- binding -------------------------------------------------------

    pub fn bind_buffer_vertices(&mut self, buf: Vec<Vertex>) {
        self.vertex_buffer = Arc::from(buf);
    }

    pub fn bind_buffer_indices(&mut self, buf: Vec<i32>) {
        self.index_buffer = Some(Arc::from(buf));
    }

    pub fn bind_texture(&mut self, unit: TextureUnit, tex: Option<Arc<Texture>>) -> RitaResult<()> {
        match unit {
            TextureUnit::FrameBuffer => self.bind_framebuffer(tex)?,
            TextureUnit::DepthBuffer => {
                if let Some(tex) = &tex {
                    if tex.format != PixelFormat::R32 {
                        return Err(RitaError::InvalidArgument("depth buffer must use the R32 pixel format"));
                    }
                    if self.viewport_width != 0
                        && (tex.width != self.viewport_width || tex.height != self.viewport_height)
                    {
                        return Err(RitaError::InvalidArgument(
                            "depth buffer dimensions must match the bound frame buffer",
                        ));
                    }
                }
                self.textures[unit.index()] = tex;
            }
            other => self.textures[other.index()] = tex,
        }
        Ok(())
    }

    /// Spawns (or respawns, since a tile's AABB is fixed for its thread's
    /// lifetime) the tile pool covering the new framebuffer's dimensions.
    /// Resizing only grows the *covered area*; re-spawning the whole pool
    /// on every bind is a deliberate simplification over the original's
    /// "only grow, never touch live tiles" note - see DESIGN.md.
    fn bind_framebuffer(&mut self, tex: Option<Arc<Texture>>) -> RitaResult<()> {
        let Some(tex) = tex else {
            self.tiles.clear();
            self.tile_cols = 0;
            self.tile_rows = 0;
            self.viewport_width = 0;
            self.viewport_height = 0;
            self.textures[TextureUnit::FrameBuffer.index()] = None;
            return Ok(());
        };
        if tex.format != PixelFormat::Rgba8 {
            return Err(RitaError::InvalidArgument("frame buffer must use the RGBA8 pixel format"));
        }

        let cols = tex.width.div_ceil(self.config.tile_width);
        let rows = tex.height.div_ceil(self.config.tile_height);
        let total = (cols as usize) * (rows as usize);
        if total > self.config.max_tiles {
            warn!(
                "frame buffer {}x{} needs {} tiles, exceeding the configured max of {}",
                tex.width, tex.height, total, self.config.max_tiles
            );
            return Err(RitaError::ResourceExhausted("frame buffer needs more tiles than configured"));
        }

        self.finish();
        let mut tiles = Vec::with_capacity(total);
        for row in 0..rows {
            for col in 0..cols {
                let aabb = Aabb::new(
                    (col * self.config.tile_width) as i32,
                    (row * self.config.tile_height) as i32,
                    self.config.tile_width as i32,
                    self.config.tile_height as i32,
                )
                .clip(0, 0, tex.width as i32, tex.height as i32);
                tiles.push(Tile::spawn(aabb, self.config.queue_capacity)?);
            }
        }
        debug!("bound frame buffer {}x{} -> {} tiles ({} cols x {} rows)", tex.width, tex.height, total, cols, rows);

        self.tiles = tiles;
        self.tile_cols = cols;
        self.tile_rows = rows;
        self.viewport_width = tex.width;
        self.viewport_height = tex.height;
        self.textures[TextureUnit::FrameBuffer.index()] = Some(tex);
        Ok(())
    }

    pub fn bind_vert_shader(&mut self, shader: Option<Arc<VertexShader>>) {
        self.vertex_shader = shader;
    }

    pub fn bind_frag_shader(&mut self, shader: Option<Arc<FragmentShader>>) {
        self.fragment_shader = shader;
    }

    // ---- state -----------------------------------------------------------

    pub fn enable(&mut self, opts: RenderOptions) {
        self.options.insert(opts);
    }

    pub fn disable(&mut self, opts: RenderOptions) {
        self.options.remove(opts);
    }

    pub fn use_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    pub fn use_texture_filter(&mut self, filter: TextureFilter) {
        self.texture_filter = filter;
    }

    pub fn use_texture_wrapping(&mut self, wrap: TextureWrap) {
        self.texture_wrap = wrap;
    }

    pub fn use_vertex_buffer_mode(&mut self, mode: VertexBufferMode) {
        self.vertex_buffer_mode = mode;
    }

    pub fn use_frontface_winding_order(&mut self, winding: WindingOrder) {
        self.winding_order = winding;
    }

    pub fn use_model_matrix(&mut self, m: mat4) {
        self.model = m;
    }

    pub fn use_view_matrix(&mut self, m: mat4) {
        self.view = m;
    }

    pub fn use_proj_matrix(&mut self, m: mat4) {
        self.proj = m;
    }

    pub fn use_camera_view(&mut self, eye: vec3, target: vec3, up: vec3) {
        self.view = mat4::look_at(eye, target, up);
    }

    pub fn use_perspective_proj(&mut self, fovy_radians: f32, aspect: f32, znear: f32, zfar: f32) {
        self.proj = mat4::perspective(fovy_radians, aspect, znear, zfar);
        self.aspect = aspect;
    }

    pub fn use_orthographic_proj(&mut self, left: f32, right: f32, bottom: f32, top: f32, znear: f32, zfar: f32) {
        self.proj = mat4::orthographic(left, right, bottom, top, znear, zfar);
    }

    pub fn use_viewport(&mut self, width: u32, height: u32) {
        self.viewport_width = width;
        self.viewport_height = height;
        if height != 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    fn shader_context(&self) -> ShaderContext {
        let normal_matrix = self.model.truncate().renormalize_columns();
        let inverse_view = self.view.truncate().transpose();
        let transforms = Transforms {
            model: self.model,
            view: self.view,
            proj: self.proj,
            viewport: mat4::viewport(self.viewport_width as f32, self.viewport_height as f32),
            normal_matrix,
            inverse_view,
        };
        ShaderContext {
            transforms,
            textures: self.textures.clone(),
            options: self.options,
            texture_filter: self.texture_filter,
            texture_wrap: self.texture_wrap,
            aspect: self.aspect,
        }
    }

    fn framebuffer(&self) -> RitaResult<Arc<Texture>> {
        self.textures[TextureUnit::FrameBuffer.index()]
            .clone()
            .ok_or(RitaError::PreconditionUnmet("no frame buffer bound"))
    }

    // ---- drawing -----------------------------------------------------------

    /// `clear`: resets the requested attachments to the bound clear color
    /// and/or `1.0` depth. Runs on the calling thread directly like
    /// `draw_text`, after a `finish()` fence, since it touches every tile's
    /// pixels rather than a disjoint subset.
    pub fn clear(&self, mask: ClearMask) -> RitaResult<()> {
        let fb = self.framebuffer()?;
        self.finish();
        if mask.contains(ClearMask::COLOR) {
            for y in 0..fb.height {
                for x in 0..fb.width {
                    unsafe { fb.set_rgba8_unchecked(x, y, self.clear_color) };
                }
            }
        }
        if mask.contains(ClearMask::DEPTH) {
            if let Some(depth) = &self.textures[TextureUnit::DepthBuffer.index()] {
                for y in 0..depth.height {
                    for x in 0..depth.width {
                        unsafe { depth.set_r32_unchecked(x, y, 1.0) };
                    }
                }
            }
        }
        Ok(())
    }

    fn draw_state(&self, shader_ctx: Arc<ShaderContext>) -> Arc<DrawState> {
        Arc::new(DrawState {
            framebuffer: self.textures[TextureUnit::FrameBuffer.index()].clone().unwrap(),
            depth_buffer: self.textures[TextureUnit::DepthBuffer.index()].clone(),
            options: self.options,
            fragment_shader: self.fragment_shader.clone(),
            shader_ctx,
        })
    }

    fn tiles_intersecting(&self, aabb: Aabb) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().filter(move |t| Aabb::intersects(&t.aabb, &aabb))
    }

    fn push_triangle(&self, f: [rita_types::Fragment; 3], state: &Arc<DrawState>) {
        let fb_bounds = Aabb::new(0, 0, self.viewport_width as i32, self.viewport_height as i32);
        let aabb = Aabb::from_triangle(&f[0], &f[1], &f[2]).clip(fb_bounds.min_x, fb_bounds.min_y, fb_bounds.max_x, fb_bounds.max_y);
        if aabb.is_empty() {
            return;
        }
        for tile in self.tiles_intersecting(aabb) {
            tile.push(TileCommand::RasterTriangle { fragments: Box::new(f), state: state.clone() });
        }
    }

    fn push_line(&self, f: [rita_types::Fragment; 2], state: &Arc<DrawState>) {
        let fb_bounds = Aabb::new(0, 0, self.viewport_width as i32, self.viewport_height as i32);
        let aabb = Aabb::from_line(&f[0], &f[1]).clip(fb_bounds.min_x, fb_bounds.min_y, fb_bounds.max_x, fb_bounds.max_y);
        if aabb.is_empty() {
            return;
        }
        for tile in self.tiles_intersecting(aabb) {
            tile.push(TileCommand::RasterLine { fragments: Box::new(f), state: state.clone() });
        }
    }

    fn push_point(&self, f: rita_types::Fragment, state: &Arc<DrawState>) {
        if f.x < 0 || f.y < 0 || f.x as u32 >= self.viewport_width || f.y as u32 >= self.viewport_height {
            return;
        }
        let aabb = Aabb::new(f.x, f.y, 1, 1);
        for tile in self.tiles_intersecting(aabb) {
            tile.push(TileCommand::RasterPoint { fragment: Box::new(f), state: state.clone() });
        }
    }

    /// Lazily-detected diagnostic: warns (does not fail the draw) when depth
    /// testing and/or depth buffer writing is enabled but no depth buffer is
    /// bound, or when the bound depth buffer's dimensions don't match the
    /// bound frame buffer's.
    fn warn_on_unchecked_depth_state(&self) {
        let depth_ops_enabled = self
            .options
            .intersects(RenderOptions::DEPTH_TESTING | RenderOptions::DEPTH_BUFFER_WRITING);
        if !depth_ops_enabled {
            return;
        }
        match &self.textures[TextureUnit::DepthBuffer.index()] {
            None => warn!(
                "depth testing and/or depth buffer writing is enabled but no depth buffer is bound"
            ),
            Some(depth) => {
                if let Some(fb) = &self.textures[TextureUnit::FrameBuffer.index()] {
                    if fb.width != depth.width || fb.height != depth.height {
                        warn!(
                            "depth testing and/or depth buffer writing is enabled but the depth and frame buffers have different dimensions"
                        );
                    }
                }
            }
        }
    }

    /// `draw`: runs the full dispatcher (§4.3) for the bound vertex/index
    /// buffer against `mode`.
    pub fn draw(&mut self, mode: PrimitiveMode) -> RitaResult<()> {
        if self.textures[TextureUnit::FrameBuffer.index()].is_none() {
            return Err(RitaError::PreconditionUnmet("no frame buffer bound"));
        }
        self.warn_on_unchecked_depth_state();

        let shader_ctx = Arc::new(self.shader_context());
        let z_clipping = self.options.contains(RenderOptions::Z_CLIPPING);

        let mut n = 0usize;
        while dispatch::next_vertex_index(self.vertex_buffer_mode, self.index_buffer.as_deref(), &self.vertex_buffer, n)
            .is_some()
        {
            n += 1;
        }
        if n == 0 {
            return Ok(());
        }

        let fragments = self.shade_vertices(n, &shader_ctx, z_clipping)?;

        let state = self.draw_state(shader_ctx);
        let wireframe = self.options.contains(RenderOptions::WIRE_FRAMES);
        let backface_cull = self.options.contains(RenderOptions::BACKFACE_CULLING);

        for prim in dispatch::enumerate_primitives(mode, n) {
            match prim {
                Primitive::Point(i) => {
                    let f = fragments[i];
                    if !f.clipping {
                        self.push_point(f, &state);
                    }
                }
                Primitive::Line(i, j) => {
                    let (f0, f1) = (fragments[i], fragments[j]);
                    if f0.clipping && f1.clipping {
                        continue;
                    }
                    self.push_line([f0, f1], &state);
                }
                Primitive::Triangle(i, j, k) => {
                    let (f0, f1, f2) = (fragments[i], fragments[j], fragments[k]);
                    if f0.clipping && f1.clipping && f2.clipping {
                        continue;
                    }
                    if backface_cull && !dispatch::is_front_facing(&f0, &f1, &f2, self.winding_order) {
                        continue;
                    }
                    if wireframe {
                        self.push_line([f0, f1], &state);
                        self.push_line([f1, f2], &state);
                        self.push_line([f2, f0], &state);
                    } else {
                        self.push_triangle([f0, f1, f2], &state);
                    }
                }
            }
        }
        Ok(())
    }

    fn shade_vertices(
        &mut self,
        n: usize,
        shader_ctx: &Arc<ShaderContext>,
        z_clipping: bool,
    ) -> RitaResult<Vec<rita_types::Fragment>> {
        match self.config.vertex_processing {
            VertexProcessingMode::Serial => {
                let mut out = Vec::with_capacity(n);
                for i in 0..n {
                    let idx = dispatch::next_vertex_index(
                        self.vertex_buffer_mode,
                        self.index_buffer.as_deref(),
                        &self.vertex_buffer,
                        i,
                    )
                    .expect("i < n was already established by the exhaustion walk");
                    out.push(dispatch::shade_vertex(
                        shader_ctx,
                        &self.vertex_buffer[idx],
                        self.vertex_shader.as_deref(),
                        z_clipping,
                    ));
                }
                Ok(out)
            }
            VertexProcessingMode::Parallel => {
                if self.tiles.is_empty() {
                    return Err(RitaError::PreconditionUnmet("parallel vertex processing requires a bound frame buffer"));
                }
                self.finish();
                let staging = Arc::new(FragmentStaging::new(n));
                self.fragment_staging = Some(staging.clone());

                let state = Arc::new(VertexStageState {
                    vbuf: self.vertex_buffer.clone(),
                    ibuf: self.index_buffer.clone(),
                    buffer_mode: self.vertex_buffer_mode,
                    vertex_shader: self.vertex_shader.clone(),
                    shader_ctx: shader_ctx.clone(),
                    staging: staging.clone(),
                    z_clipping,
                });

                let n_segments = self.tiles.len().min(n).max(1);
                let chunk = n.div_ceil(n_segments);
                for (seg_index, tile) in self.tiles.iter().enumerate() {
                    let start = seg_index * chunk;
                    if start >= n {
                        break;
                    }
                    let end = (start + chunk).min(n);
                    tile.push(TileCommand::ProcessVertexSegment { start, end, state: state.clone() });
                }
                self.finish();

                Ok((0..n).map(|i| staging.read(i)).collect())
            }
        }
    }

    /// `blit`: copies a region into the framebuffer from `src` (or from
    /// fragments synthesized by `shader`), governed by `mask`/`sampler`/
    /// `blend` (§4.6).
    #[allow(clippy::too_many_arguments)]
    pub fn blit(
        &self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        src: Option<Arc<Texture>>,
        blend: BlendMethod,
        mask: BlitMask,
        sampler: BlitSampler,
        shader: Option<Arc<FragmentShader>>,
    ) -> RitaResult<()> {
        let framebuffer = self.framebuffer()?;
        let shader_ctx = Arc::new(self.shader_context());
        let info = Arc::new(BlitInfo {
            dst_x: x,
            dst_y: y,
            dst_w: w,
            dst_h: h,
            src,
            blend,
            mask,
            sampler,
            shader,
            framebuffer,
            depth_buffer: self.textures[TextureUnit::DepthBuffer.index()].clone(),
            clear_color: self.clear_color,
            shader_ctx,
        });

        let target = Aabb::new(x, y, w, h).clip(0, 0, self.viewport_width as i32, self.viewport_height as i32);
        if target.is_empty() {
            return Ok(());
        }
        for tile in self.tiles_intersecting(target) {
            tile.push(TileCommand::Blit(info.clone()));
        }
        Ok(())
    }

    /// `draw_text`: single-threaded, direct-to-framebuffer glyph blitter
    /// (§4.8). Requires a preceding `finish()` for exclusive access, which
    /// this call performs itself since it is the only writer allowed to
    /// bypass the tile system.
    pub fn draw_text(&self, x: i32, y: i32, scale: i32, color: Color, text: &str) -> RitaResult<()> {
        let fb = self.framebuffer()?;
        self.finish();

        let mut cursor_x = x;
        for ch in text.chars() {
            let glyph = font::glyph_for(ch);
            let base_y = y + glyph.vertical_offset as i32 * scale;
            for row in 0..6 {
                let bits = glyph.bitmap[row];
                for col in 0..5 {
                    if bits & (1 << (4 - col)) == 0 {
                        continue;
                    }
                    for dy in 0..scale {
                        for dx in 0..scale {
                            let px = cursor_x + col * scale + dx;
                            let py = base_y + row as i32 * scale + dy;
                            if px < 0 || py < 0 || px as u32 >= fb.width || py as u32 >= fb.height {
                                continue;
                            }
                            unsafe { fb.set_rgba8_unchecked(px as u32, py as u32, color) };
                        }
                    }
                }
            }
            cursor_x += glyph.stride as i32 * scale;
        }
        Ok(())
    }
}

/// Copies `src` into `dst` (both must already exist), optionally flipping
/// vertically, blended per `blend`. The "textures" family's one operation
/// that touches two textures at once rather than a single one in place.
pub fn blit_texture(dst: &Texture, src: &Texture, blend: BlendMethod, flip: bool) {
    let w = dst.width.min(src.width);
    let h = dst.height.min(src.height);
    for y in 0..h {
        let src_y = if flip { src.height - 1 - y } else { y };
        for x in 0..w {
            let src_color = src.sample_texel(x as i32, src_y as i32);
            let dst_color = unsafe { dst.get_rgba8_unchecked(x, y) };
            unsafe { dst.set_rgba8_unchecked(x, y, Color::blend(dst_color, src_color, blend)) };
        }
    }
}

/// End-to-end scenarios exercising the dispatcher, tile pool, and fragment
/// processor together, corresponding to the literal scenarios in the
/// `Context`'s expanded spec.
#[cfg(test)]
mod test {
    use super::*;
    use rita_math::vec4;

    fn small_config() -> RendererConfig {
        RendererConfig {
            tile_width: 16,
            tile_height: 16,
            queue_capacity: 1024,
            max_tiles: 16,
            vertex_variant: crate::config::VertexVariant::Default,
            vertex_processing: VertexProcessingMode::Serial,
        }
    }

    fn bind_framebuffer(ctx: &mut Context, w: u32, h: u32) -> Arc<Texture> {
        let fb = Arc::new(Texture::new(PixelFormat::Rgba8, w, h));
        ctx.bind_texture(TextureUnit::FrameBuffer, Some(fb.clone())).unwrap();
        fb
    }

    fn vertex(x: f32, y: f32, color: Color) -> Vertex {
        Vertex { pos: vec4::new(x, y, 0.0, 1.0), color, ..Vertex::default() }
    }

    #[test]
    fn hello_triangle_center_blends_away_from_clear_color() {
        let _ = env_logger::try_init();
        let mut ctx = Context::init(small_config()).unwrap();
        let fb = bind_framebuffer(&mut ctx, 16, 16);
        let clear_color = Color::new(30, 30, 30, 255);
        ctx.use_clear_color(clear_color);
        ctx.clear(ClearMask::COLOR).unwrap();

        ctx.bind_buffer_vertices(vec![
            vertex(0.0, 0.5, Color::new(255, 0, 0, 255)),
            vertex(-0.5, -0.5, Color::new(0, 0, 255, 255)),
            vertex(0.5, -0.5, Color::new(0, 255, 0, 255)),
        ]);
        ctx.draw(PrimitiveMode::Triangles).unwrap();
        ctx.finish();

        let center = unsafe { fb.get_rgba8_unchecked(8, 6) };
        assert_ne!(center, clear_color, "triangle interior should not read back as the clear color");

        let corner = unsafe { fb.get_rgba8_unchecked(0, 0) };
        assert_eq!(corner, clear_color, "corner outside the triangle should stay the clear color");
    }

    #[test]
    fn dispatch_finish_barrier_leaves_last_submitted_color() {
        let mut ctx = Context::init(small_config()).unwrap();
        let fb = bind_framebuffer(&mut ctx, 16, 16);

        // All 200 points map to the same screen pixel (ndc (0,0) -> viewport
        // center), exercising per-tile FIFO ordering: after `finish`, the
        // pixel must hold the color of the *last* point submitted.
        let n = 200;
        let verts: Vec<Vertex> = (0..n)
            .map(|i| vertex(0.0, 0.0, Color::new((i % 256) as u8, 0, 255 - (i % 256) as u8, 255)))
            .collect();
        let last_color = verts.last().unwrap().color;
        ctx.bind_buffer_vertices(verts);
        ctx.draw(PrimitiveMode::Points).unwrap();
        ctx.finish();

        let pixel = unsafe { fb.get_rgba8_unchecked(8, 8) };
        assert_eq!(pixel, last_color);
    }

    #[test]
    fn parallel_and_serial_vertex_processing_agree() {
        fn render(mode: VertexProcessingMode) -> Vec<Color> {
            let mut config = RendererConfig {
                tile_width: 16,
                tile_height: 16,
                queue_capacity: 1024,
                max_tiles: 16,
                vertex_variant: crate::config::VertexVariant::Default,
                vertex_processing: mode,
            };
            config.queue_capacity = 1024;
            let mut ctx = Context::init(config).unwrap();
            let fb = bind_framebuffer(&mut ctx, 32, 32);
            ctx.use_clear_color(Color::new(10, 10, 10, 255));
            ctx.clear(ClearMask::COLOR).unwrap();

            ctx.bind_buffer_vertices(vec![
                vertex(0.0, 0.8, Color::new(255, 0, 0, 255)),
                vertex(-0.8, -0.8, Color::new(0, 255, 0, 255)),
                vertex(0.8, -0.8, Color::new(0, 0, 255, 255)),
                vertex(-0.8, 0.8, Color::new(255, 255, 0, 255)),
                vertex(0.8, 0.8, Color::new(0, 255, 255, 255)),
                vertex(-0.8, -0.8, Color::new(255, 0, 255, 255)),
            ]);
            ctx.draw(PrimitiveMode::Triangles).unwrap();
            ctx.finish();

            (0..32)
                .flat_map(|y| (0..32).map(move |x| (x, y)))
                .map(|(x, y)| unsafe { fb.get_rgba8_unchecked(x, y) })
                .collect()
        }

        let serial = render(VertexProcessingMode::Serial);
        let parallel = render(VertexProcessingMode::Parallel);
        assert_eq!(serial, parallel);
    }

    #[test]
    fn blit_clear_color_mask_only_touches_background() {
        let mut ctx = Context::init(small_config()).unwrap();
        let fb = bind_framebuffer(&mut ctx, 16, 16);
        let clear_color = Color::BLACK;
        ctx.use_clear_color(clear_color);
        ctx.clear(ClearMask::COLOR).unwrap();

        let gradient = Arc::new(Texture::new(PixelFormat::Rgba8, 16, 16));
        for y in 0..16 {
            for x in 0..16 {
                unsafe { gradient.set_rgba8_unchecked(x, y, Color::MAGENTA) };
            }
        }
        ctx.blit(0, 0, 16, 16, Some(gradient), BlendMethod::Replace, BlitMask::ClearColor, BlitSampler::BoxCoord, None)
            .unwrap();
        ctx.finish();

        ctx.bind_buffer_vertices(vec![
            vertex(-0.4, 0.4, Color::WHITE),
            vertex(-0.4, -0.4, Color::WHITE),
            vertex(0.4, -0.4, Color::WHITE),
        ]);
        ctx.draw(PrimitiveMode::Triangles).unwrap();
        ctx.finish();

        let before: Vec<Color> = (0..16)
            .flat_map(|y| (0..16).map(move |x| (x, y)))
            .map(|(x, y)| unsafe { fb.get_rgba8_unchecked(x, y) })
            .collect();

        let second_src = Arc::new(Texture::new(PixelFormat::Rgba8, 16, 16));
        for y in 0..16 {
            for x in 0..16 {
                unsafe { second_src.set_rgba8_unchecked(x, y, Color::CYAN) };
            }
        }
        ctx.blit(
            0,
            0,
            16,
            16,
            Some(second_src),
            BlendMethod::Replace,
            BlitMask::ClearColor,
            BlitSampler::BoxCoord,
            None,
        )
        .unwrap();
        ctx.finish();

        let after: Vec<Color> = (0..16)
            .flat_map(|y| (0..16).map(move |x| (x, y)))
            .map(|(x, y)| unsafe { fb.get_rgba8_unchecked(x, y) })
            .collect();

        assert_eq!(before, after, "no pixel remained clear-colored, so the second blit must be a no-op");
    }
}
