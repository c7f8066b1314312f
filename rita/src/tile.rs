use std::sync::Arc;
use std::thread;

use log::debug;
use rita_types::{BlitMask, BlitSampler, Color, Fragment, RenderOptions, RitaError, RitaResult, TextureUnit};

use crate::aabb::Aabb;
use crate::command::{BlitInfo, DrawState, TileCommand, VertexStageState};
use crate::dispatch;
use crate::queue::TileQueue;
use crate::sample;

/// A screen-space partition owned by exactly one worker thread. The
/// dispatcher only ever talks to a tile through its queue; the worker
/// thread owns `aabb` for its whole lifetime and never shares it.
pub struct Tile {
    pub aabb: Aabb,
    queue: Arc<TileQueue<TileCommand>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Tile {
    pub fn spawn(aabb: Aabb, queue_capacity: usize) -> RitaResult<Self> {
        let queue = Arc::new(TileQueue::new(queue_capacity)?);
        let worker_queue = queue.clone();
        debug!("spawning tile worker for {:?}", aabb);
        let handle = thread::Builder::new()
            .name(format!("rita-tile-{}-{}", aabb.min_x, aabb.min_y))
            .spawn(move || tile_worker_main(aabb, worker_queue))
            .map_err(|_| RitaError::ResourceExhausted("failed to spawn tile worker thread"))?;
        Ok(Self { aabb, queue, handle: Some(handle) })
    }

    pub fn push(&self, cmd: TileCommand) {
        self.queue.push(cmd);
    }

    pub fn wait_idle(&self) {
        self.queue.wait_until_idle(1);
    }
}

impl Drop for Tile {
    fn drop(&mut self) {
        self.queue.push(TileCommand::Terminate);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn tile_worker_main(aabb: Aabb, queue: Arc<TileQueue<TileCommand>>) {
    loop {
        match queue.pop() {
            TileCommand::Terminate => break,
            TileCommand::RasterTriangle { fragments, state } => {
                rasterize_triangle(aabb, &fragments, &state)
            }
            TileCommand::RasterLine { fragments, state } => rasterize_line(aabb, &fragments, &state),
            TileCommand::RasterPoint { fragment, state } => rasterize_point(aabb, &fragment, &state),
            TileCommand::ProcessVertexSegment { start, end, state } => {
                process_vertex_segment(start, end, &state)
            }
            TileCommand::Blit(info) => process_blit(aabb, &info),
        }
    }
}

/// Affine 2D edge function `a*x + b*y + c`, incrementally stepped across a
/// scanline (`+a` per column) and down rows (`+b` per row) rather than
/// recomputed from scratch at every pixel.
#[derive(Clone, Copy)]
struct EdgeFn {
    a: f32,
    b: f32,
    c: f32,
}

impl EdgeFn {
    fn new(v0: (f32, f32), v1: (f32, f32)) -> Self {
        let a = v1.1 - v0.1;
        let b = v0.0 - v1.0;
        let c = -(a * v0.0 + b * v0.1);
        Self { a, b, c }
    }

    fn eval(&self, x: f32, y: f32) -> f32 {
        self.a * x + self.b * y + self.c
    }
}

const MIN_TRIANGLE_AREA: f32 = 1e-6;

fn rasterize_triangle(tile: Aabb, fragments: &[Fragment; 3], state: &DrawState) {
    let (f0, f1, f2) = (fragments[0], fragments[1], fragments[2]);
    let tri_aabb = Aabb::from_triangle(&f0, &f1, &f2);
    let clip = tri_aabb.clip(tile.min_x, tile.min_y, tile.max_x, tile.max_y);
    if clip.is_empty() {
        return;
    }

    let p0 = (f0.x as f32, f0.y as f32);
    let p1 = (f1.x as f32, f1.y as f32);
    let p2 = (f2.x as f32, f2.y as f32);

    let e12 = EdgeFn::new(p1, p2); // weight of v0
    let e20 = EdgeFn::new(p2, p0); // weight of v1
    let e01 = EdgeFn::new(p0, p1); // weight of v2
    let area = e01.eval(p2.0, p2.1);
    if area.abs() < MIN_TRIANGLE_AREA {
        return;
    }

    let start_x = clip.min_x as f32 + 0.5;
    let start_y = clip.min_y as f32 + 0.5;
    let mut row_w0 = e12.eval(start_x, start_y);
    let mut row_w1 = e20.eval(start_x, start_y);
    let mut row_w2 = e01.eval(start_x, start_y);

    for y in clip.min_y..clip.max_y {
        let mut w0 = row_w0;
        let mut w1 = row_w1;
        let mut w2 = row_w2;
        for x in clip.min_x..clip.max_x {
            let inside = if area > 0.0 {
                w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0
            } else {
                w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0
            };
            if inside {
                let u = w0 / area;
                let v = w1 / area;
                let frag = Fragment::berp(f0, f1, f2, u, v, x, y);
                process_fragment(frag, state);
            }
            w0 += e12.a;
            w1 += e20.a;
            w2 += e01.a;
        }
        row_w0 += e12.b;
        row_w1 += e20.b;
        row_w2 += e01.b;
    }
}

/// Cohen-Sutherland outcodes against the tile's half-open AABB.
fn outcode(aabb: Aabb, x: f32, y: f32) -> u8 {
    let mut code = 0u8;
    if x < aabb.min_x as f32 {
        code |= 1;
    } else if x >= aabb.max_x as f32 {
        code |= 2;
    }
    if y < aabb.min_y as f32 {
        code |= 4;
    } else if y >= aabb.max_y as f32 {
        code |= 8;
    }
    code
}

/// Clips `(x0,y0)-(x1,y1)` to `aabb`, returning the clipped parametric
/// range `[t0, t1]` along the original segment, or `None` if trivially
/// rejected.
fn cohen_sutherland_clip(aabb: Aabb, x0: f32, y0: f32, x1: f32, y1: f32) -> Option<(f32, f32)> {
    let (mut t0, mut t1) = (0.0f32, 1.0f32);
    let (dx, dy) = (x1 - x0, y1 - y0);
    let mut code0 = outcode(aabb, x0, y0);
    let mut code1 = outcode(aabb, x1, y1);

    loop {
        if code0 == 0 && code1 == 0 {
            return Some((t0, t1));
        }
        if code0 & code1 != 0 {
            return None;
        }
        let out = if code0 != 0 { code0 } else { code1 };
        let t = if out & 1 != 0 {
            if dx == 0.0 {
                return None;
            }
            (aabb.min_x as f32 - x0) / dx
        } else if out & 2 != 0 {
            if dx == 0.0 {
                return None;
            }
            (aabb.max_x as f32 - x0) / dx
        } else if out & 4 != 0 {
            if dy == 0.0 {
                return None;
            }
            (aabb.min_y as f32 - y0) / dy
        } else {
            if dy == 0.0 {
                return None;
            }
            (aabb.max_y as f32 - y0) / dy
        };
        if out == code0 {
            if t < 0.0 || t > 1.0 {
                return None;
            }
            t0 = t;
            code0 = outcode(aabb, x0 + t * dx, y0 + t * dy);
        } else {
            if t < 0.0 || t > 1.0 {
                return None;
            }
            t1 = t;
            code1 = outcode(aabb, x0 + t * dx, y0 + t * dy);
        }
    }
}

fn rasterize_line(tile: Aabb, fragments: &[Fragment; 2], state: &DrawState) {
    let (f0, f1) = (fragments[0], fragments[1]);
    let (x0, y0) = (f0.x as f32, f0.y as f32);
    let (x1, y1) = (f1.x as f32, f1.y as f32);

    let Some((t0, t1)) = cohen_sutherland_clip(tile, x0, y0, x1, y1) else {
        return;
    };

    let clipped_x0 = rita_math::lerp(x0, x1, t0);
    let clipped_y0 = rita_math::lerp(y0, y1, t0);
    let clipped_x1 = rita_math::lerp(x0, x1, t1);
    let clipped_y1 = rita_math::lerp(y0, y1, t1);

    let cf0 = Fragment::lerp(f0, f1, clipped_x0.round() as i32, clipped_y0.round() as i32, t0);
    let cf1 = Fragment::lerp(f0, f1, clipped_x1.round() as i32, clipped_y1.round() as i32, t1);

    let dx = clipped_x1 - clipped_x0;
    let dy = clipped_y1 - clipped_y0;
    let steps = dx.abs().max(dy.abs()).round().max(1.0) as i32;

    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let x = rita_math::lerp(clipped_x0, clipped_x1, t).round() as i32;
        let y = rita_math::lerp(clipped_y0, clipped_y1, t).round() as i32;
        let frag = Fragment::lerp(cf0, cf1, x, y, t);
        process_fragment(frag, state);
    }
}

fn rasterize_point(tile: Aabb, fragment: &Fragment, state: &DrawState) {
    if fragment.x >= tile.min_x && fragment.x < tile.max_x && fragment.y >= tile.min_y && fragment.y < tile.max_y {
        process_fragment(*fragment, state);
    }
}

/// The per-pixel fragment processor (§4.5): depth test, shade, alpha
/// blend, color write, depth write.
fn process_fragment(frag: Fragment, state: &DrawState) {
    if frag.x < 0 || frag.y < 0 {
        return;
    }
    let (x, y) = (frag.x as u32, frag.y as u32);
    if x >= state.framebuffer.width || y >= state.framebuffer.height {
        return;
    }

    let depth = rita_math::clamp(0.0, 1.0, 1.0 / frag.inv_z);

    if state.options.contains(RenderOptions::DEPTH_TESTING) {
        if let Some(depth_buffer) = &state.depth_buffer {
            let current = unsafe { depth_buffer.get_r32_unchecked(x, y) };
            if current < depth {
                return;
            }
        }
    }

    let mut color = if let Some(shader) = &state.fragment_shader {
        shader(&state.shader_ctx, &frag)
    } else if let Some(diffuse) = state.shader_ctx.texture(TextureUnit::Diffuse) {
        let sampled = sample::sample_uv(diffuse, frag.uv, state.shader_ctx.texture_filter, state.shader_ctx.texture_wrap);
        Color::mul(frag.color, sampled)
    } else {
        frag.color
    };

    if state.options.contains(RenderOptions::ORDER_DEPENDENT_ALPHA_BLEND) {
        let dst = unsafe { state.framebuffer.get_rgba8_unchecked(x, y) };
        let a = color.a as f32 / 256.0;
        color = Color::lerp(dst, color, a);
        color.a = 255;
    }

    unsafe { state.framebuffer.set_rgba8_unchecked(x, y, color) };

    if state.options.contains(RenderOptions::DEPTH_BUFFER_WRITING) {
        if let Some(depth_buffer) = &state.depth_buffer {
            unsafe { depth_buffer.set_r32_unchecked(x, y, depth) };
        }
    }
}

fn process_vertex_segment(start: usize, end: usize, state: &VertexStageState) {
    for i in start..end {
        let vertex_index = dispatch::next_vertex_index(state.buffer_mode, state.ibuf.as_deref(), &state.vbuf, i);
        let Some(vertex_index) = vertex_index else { continue };
        let vertex = state.vbuf[vertex_index];
        let frag = dispatch::shade_vertex(&state.shader_ctx, &vertex, state.vertex_shader.as_deref(), state.z_clipping);
        unsafe { state.staging.write(i, frag) };
    }
}

fn mask_allows(mask: BlitMask, color: Color, clear_color: Color, depth: f32) -> bool {
    match mask {
        BlitMask::Everywhere => true,
        BlitMask::ClearColor => color == clear_color,
        BlitMask::NonClearColor => color != clear_color,
        BlitMask::DepthInf => depth >= 1.0,
        BlitMask::DepthNonInf => depth < 1.0,
    }
}

fn process_blit(tile: Aabb, info: &BlitInfo) {
    let target = Aabb::new(info.dst_x, info.dst_y, info.dst_w, info.dst_h);
    let clip = target.clip(tile.min_x, tile.min_y, tile.max_x, tile.max_y);
    if clip.is_empty() {
        return;
    }

    for y in clip.min_y..clip.max_y {
        for x in clip.min_x..clip.max_x {
            if x < 0 || y < 0 || x as u32 >= info.framebuffer.width || y as u32 >= info.framebuffer.height {
                continue;
            }
            let (xu, yu) = (x as u32, y as u32);
            let dst_color = unsafe { info.framebuffer.get_rgba8_unchecked(xu, yu) };
            let depth = info
                .depth_buffer
                .as_ref()
                .map(|d| unsafe { d.get_r32_unchecked(xu, yu) })
                .unwrap_or(1.0);

            if !mask_allows(info.mask, dst_color, info.clear_color, depth) {
                continue;
            }

            let box_u = (x - target.min_x) as f32 / target.width().max(1) as f32;
            let box_v = (y - target.min_y) as f32 / target.height().max(1) as f32;

            let mut fragment = Fragment {
                x,
                y,
                uv: rita_math::vec2::new(box_u, box_v),
                inv_z: if depth > 0.0 { 1.0 / depth } else { 1.0 },
                ..Fragment::default()
            };

            let src_color = match info.sampler {
                BlitSampler::BoxCoord => sample_src(info, box_u, box_v),
                BlitSampler::ScreenCoord => {
                    let su = xu as f32 / info.framebuffer.width as f32;
                    let sv = yu as f32 / info.framebuffer.height as f32;
                    sample_src(info, su, sv)
                }
                BlitSampler::ViewDirRectilinear | BlitSampler::ViewDirCubemap => {
                    let dir = view_direction(info, xu, yu);
                    match &info.src {
                        Some(src) if info.sampler == BlitSampler::ViewDirRectilinear => sample::sample_rectilinear(
                            src,
                            dir,
                            info.shader_ctx.texture_filter,
                            info.shader_ctx.texture_wrap,
                        ),
                        Some(src) => sample::sample_cubemap(src, dir, info.shader_ctx.texture_filter),
                        None => dst_color,
                    }
                }
                BlitSampler::Shader => {
                    fragment.color = sample_src(info, box_u, box_v);
                    if let Some(shader) = &info.shader {
                        shader(&info.shader_ctx, &fragment)
                    } else {
                        fragment.color
                    }
                }
            };

            let blended = Color::blend(dst_color, src_color, info.blend);
            unsafe { info.framebuffer.set_rgba8_unchecked(xu, yu, blended) };
        }
    }
}

fn sample_src(info: &BlitInfo, u: f32, v: f32) -> Color {
    match &info.src {
        Some(src) => sample::sample_uv(src, rita_math::vec2::new(u, v), info.shader_ctx.texture_filter, info.shader_ctx.texture_wrap),
        None => Color::default(),
    }
}

/// Reconstructs a world-space view ray through screen pixel `(x, y)` using
/// the projection matrix's y-scale term and the bound camera's aspect
/// ratio, then rotates it into world space by the inverse view.
fn view_direction(info: &BlitInfo, x: u32, y: u32) -> rita_math::vec3 {
    let w = info.framebuffer.width as f32;
    let h = info.framebuffer.height as f32;
    let ndc_x = (x as f32 + 0.5) / w * 2.0 - 1.0;
    let ndc_y = 1.0 - (y as f32 + 0.5) / h * 2.0;
    let proj_scale = info.shader_ctx.transforms.proj.m11();
    let view_x = ndc_x * info.shader_ctx.aspect / proj_scale;
    let view_y = ndc_y / proj_scale;
    let view_dir = rita_math::vec3::new(view_x, view_y, -1.0);
    info.shader_ctx.transforms.inverse_view.mul_vec3(view_dir).normalize()
}
