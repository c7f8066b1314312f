use std::cell::UnsafeCell;
use std::sync::Arc;

use crate::color::Color;
use crate::error::TextureError;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba8,
    R32,
}

/// A flat pixel grid shared between an owning [`Texture`] and any
/// subtextures carved out of it.
///
/// Tile workers write disjoint regions of the same framebuffer/depth
/// texture concurrently, which plain `&mut [T]` can't express across thread
/// boundaries. `UnsafeCell` plus `unsafe impl Sync` gives each worker a raw
/// per-pixel slot; the dispatcher's tile partitioning is what keeps writes
/// disjoint, not the type system.
struct PixelGrid<T> {
    cells: Box<[UnsafeCell<T>]>,
}

unsafe impl<T> Sync for PixelGrid<T> {}

impl<T: Copy + Default> PixelGrid<T> {
    fn filled(len: usize, value: T) -> Self {
        Self { cells: (0..len).map(|_| UnsafeCell::new(value)).collect() }
    }

    /// # Safety
    /// `idx` must be in bounds and no other thread may concurrently access
    /// the same index.
    unsafe fn get(&self, idx: usize) -> T {
        *self.cells[idx].get()
    }

    /// # Safety
    /// `idx` must be in bounds and no other thread may concurrently access
    /// the same index.
    unsafe fn set(&self, idx: usize, value: T) {
        *self.cells[idx].get() = value;
    }

    fn len(&self) -> usize {
        self.cells.len()
    }
}

enum TextureData {
    Rgba8(Arc<PixelGrid<Color>>),
    R32(Arc<PixelGrid<f32>>),
}

impl Clone for TextureData {
    fn clone(&self) -> Self {
        match self {
            TextureData::Rgba8(d) => TextureData::Rgba8(d.clone()),
            TextureData::R32(d) => TextureData::R32(d.clone()),
        }
    }
}

/// An immutable-shape RGBA8 or R32 pixel buffer. A texture created via
/// [`Texture::subtexture`] shares the parent's backing memory (same
/// convention as a stride-cropped image view): it reads/writes into the
/// same allocation through a `stride` wider than its own `width`.
#[derive(Clone)]
pub struct Texture {
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    data: TextureData,
    /// Pixel offset of `(0, 0)` of this view within `data`.
    origin: usize,
    is_subtexture: bool,
}

impl Texture {
    pub fn new(format: PixelFormat, width: u32, height: u32) -> Self {
        let len = (width * height) as usize;
        let data = match format {
            PixelFormat::Rgba8 => TextureData::Rgba8(Arc::new(PixelGrid::filled(len, Color::default()))),
            PixelFormat::R32 => TextureData::R32(Arc::new(PixelGrid::filled(len, 0.0))),
        };
        Self { format, width, height, stride: width, data, origin: 0, is_subtexture: false }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        self.origin + (y * self.stride + x) as usize
    }

    /// # Safety
    /// Caller must ensure no other thread concurrently writes the same
    /// `(x, y)` pixel of the backing allocation (guaranteed by tile
    /// partitioning when called from tile workers).
    pub unsafe fn get_rgba8_unchecked(&self, x: u32, y: u32) -> Color {
        match &self.data {
            TextureData::Rgba8(d) => d.get(self.index(x, y)),
            TextureData::R32(_) => unreachable!("wrong format"),
        }
    }

    /// # Safety
    /// See [`Texture::get_rgba8_unchecked`].
    pub unsafe fn set_rgba8_unchecked(&self, x: u32, y: u32, color: Color) {
        match &self.data {
            TextureData::Rgba8(d) => d.set(self.index(x, y), color),
            TextureData::R32(_) => unreachable!("wrong format"),
        }
    }

    /// # Safety
    /// See [`Texture::get_rgba8_unchecked`].
    pub unsafe fn get_r32_unchecked(&self, x: u32, y: u32) -> f32 {
        match &self.data {
            TextureData::R32(d) => d.get(self.index(x, y)),
            TextureData::Rgba8(_) => unreachable!("wrong format"),
        }
    }

    /// # Safety
    /// See [`Texture::get_rgba8_unchecked`].
    pub unsafe fn set_r32_unchecked(&self, x: u32, y: u32, value: f32) {
        match &self.data {
            TextureData::R32(d) => d.set(self.index(x, y), value),
            TextureData::Rgba8(_) => unreachable!("wrong format"),
        }
    }

    /// Samples the texel at `(x, y)`, clamped to bounds. R32 textures write
    /// the stored value into the red channel only, leaving green/blue/alpha
    /// at zero - matches the asymmetric grayscale-into-red convention of the
    /// original sampler rather than broadcasting into every channel.
    pub fn sample_texel(&self, x: i32, y: i32) -> Color {
        let x = x.clamp(0, self.width as i32 - 1) as u32;
        let y = y.clamp(0, self.height as i32 - 1) as u32;
        match self.format {
            PixelFormat::Rgba8 => unsafe { self.get_rgba8_unchecked(x, y) },
            PixelFormat::R32 => {
                let v = unsafe { self.get_r32_unchecked(x, y) };
                Color { r: (255.0 * v) as u8, g: 0, b: 0, a: 0 }
            }
        }
    }

    /// Carves a non-owning view sharing this texture's backing memory.
    /// Nesting (a subtexture of a subtexture) is not supported.
    pub fn subtexture(&self, x: u32, y: u32, width: u32, height: u32) -> Result<Texture, TextureError> {
        if self.is_subtexture {
            return Err(TextureError::NestedSubtexture);
        }
        if x + width > self.width || y + height > self.height {
            return Err(TextureError::OutOfBounds);
        }
        Ok(Texture {
            format: self.format,
            width,
            height,
            stride: self.stride,
            data: self.data.clone(),
            origin: self.origin + (y * self.stride + x) as usize,
            is_subtexture: true,
        })
    }

    /// Flips the texture vertically in place. Not valid on a subtexture
    /// view, since its rows are interleaved with the parent's.
    pub fn flip_vertically(&self) -> Result<(), TextureError> {
        if self.is_subtexture {
            return Err(TextureError::NestedSubtexture);
        }
        for y in 0..self.height / 2 {
            let y2 = self.height - 1 - y;
            for x in 0..self.width {
                unsafe {
                    match self.format {
                        PixelFormat::Rgba8 => {
                            let a = self.get_rgba8_unchecked(x, y);
                            let b = self.get_rgba8_unchecked(x, y2);
                            self.set_rgba8_unchecked(x, y, b);
                            self.set_rgba8_unchecked(x, y2, a);
                        }
                        PixelFormat::R32 => {
                            let a = self.get_r32_unchecked(x, y);
                            let b = self.get_r32_unchecked(x, y2);
                            self.set_r32_unchecked(x, y, b);
                            self.set_r32_unchecked(x, y2, a);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    pub fn is_subtexture(&self) -> bool {
        self.is_subtexture
    }

    pub fn len(&self) -> usize {
        match &self.data {
            TextureData::Rgba8(d) => d.len(),
            TextureData::R32(d) => d.len(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn subtexture_shares_backing_storage() {
        let tex = Texture::new(PixelFormat::Rgba8, 4, 4);
        let sub = tex.subtexture(1, 1, 2, 2).unwrap();
        unsafe {
            sub.set_rgba8_unchecked(0, 0, Color::WHITE);
            assert_eq!(tex.get_rgba8_unchecked(1, 1), Color::WHITE);
        }
    }

    #[test]
    fn nested_subtexture_rejected() {
        let tex = Texture::new(PixelFormat::Rgba8, 4, 4);
        let sub = tex.subtexture(0, 0, 2, 2).unwrap();
        assert!(matches!(sub.subtexture(0, 0, 1, 1), Err(TextureError::NestedSubtexture)));
    }

    #[test]
    fn subtexture_out_of_bounds_rejected() {
        let tex = Texture::new(PixelFormat::Rgba8, 4, 4);
        assert!(matches!(tex.subtexture(3, 3, 2, 2), Err(TextureError::OutOfBounds)));
    }

    #[test]
    fn r32_sample_writes_red_channel_only() {
        let tex = Texture::new(PixelFormat::R32, 1, 1);
        unsafe { tex.set_r32_unchecked(0, 0, 1.0) };
        let c = tex.sample_texel(0, 0);
        assert_eq!(c, Color { r: 255, g: 0, b: 0, a: 0 });
    }
}
