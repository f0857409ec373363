//! CPU raster implementation of [`Surface`].
//!
//! Pixels are stored as straight-alpha RGBA8, row-major, top row first, so
//! the buffer can be handed directly to an image upload (an egui texture, a
//! browser `ImageData`, a PNG encoder). Compositing is Porter-Duff
//! source-over; there is no anti-aliasing, a pixel is covered when its
//! center lies inside the shape.

use glam::Vec2;

use crate::{
    error::SurfaceResult,
    surface::{GradientStop, ImageData, Rgba, Surface, sample_gradient},
    viewport::ViewportSize,
};

#[derive(Clone, Debug)]
pub struct PixelSurface {
    size: ViewportSize,
    pixels: Vec<u8>,
}

impl PixelSurface {
    pub fn new(size: ViewportSize) -> Self {
        Self {
            size,
            pixels: vec![0; size.area() as usize * 4],
        }
    }

    /// Raw RGBA8 buffer, `width * height * 4` bytes.
    pub fn as_rgba(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let i = self.offset(x, y);
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.size.width as usize + x as usize) * 4
    }

    #[inline]
    fn blend_at(&mut self, x: u32, y: u32, src: Rgba) {
        let i = self.offset(x, y);
        let px = &mut self.pixels[i..i + 4];
        blend_over(px, src);
    }

    /// Visits every pixel whose center lies within `radius` of `center`,
    /// passing the pixel and its distance from `center`.
    fn for_each_in_disc(
        &mut self,
        center: Vec2,
        radius: f32,
        mut f: impl FnMut(&mut Self, u32, u32, f32),
    ) {
        if self.size.is_empty() || !(radius > 0.0) || !center.is_finite() {
            return;
        }
        let w = self.size.width as f32;
        let h = self.size.height as f32;
        let x0 = (center.x - radius).floor().max(0.0);
        let y0 = (center.y - radius).floor().max(0.0);
        let x1 = (center.x + radius).ceil().min(w);
        let y1 = (center.y + radius).ceil().min(h);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let r2 = radius * radius;
        for y in y0 as u32..y1 as u32 {
            for x in x0 as u32..x1 as u32 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let d2 = (p - center).length_squared();
                if d2 <= r2 {
                    f(self, x, y, d2.sqrt());
                }
            }
        }
    }
}

/// Straight-alpha source-over of `src` onto one RGBA8 pixel.
fn blend_over(dst: &mut [u8], src: Rgba) {
    let sa = src.a.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        dst.fill(0);
        return;
    }

    let mix = |s: u8, d: u8| {
        let c = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
        c.round().clamp(0.0, 255.0) as u8
    };
    dst[0] = mix(src.r, dst[0]);
    dst[1] = mix(src.g, dst[1]);
    dst[2] = mix(src.b, dst[2]);
    dst[3] = (out_a * 255.0).round() as u8;
}

impl Surface for PixelSurface {
    fn size(&self) -> ViewportSize {
        self.size
    }

    fn set_size(&mut self, size: ViewportSize) {
        self.size = size;
        self.pixels.clear();
        self.pixels.resize(size.area() as usize * 4, 0);
    }

    fn clear(&mut self) -> SurfaceResult<()> {
        self.pixels.fill(0);
        Ok(())
    }

    fn fill(&mut self, color: Rgba) -> SurfaceResult<()> {
        for px in self.pixels.chunks_exact_mut(4) {
            blend_over(px, color);
        }
        Ok(())
    }

    fn fill_radial_gradient(
        &mut self,
        center: Vec2,
        radius: f32,
        stops: &[GradientStop],
    ) -> SurfaceResult<()> {
        self.for_each_in_disc(center, radius, |s, x, y, d| {
            s.blend_at(x, y, sample_gradient(stops, d / radius));
        });
        Ok(())
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) -> SurfaceResult<()> {
        self.for_each_in_disc(center, radius, |s, x, y, _| s.blend_at(x, y, color));
        Ok(())
    }

    fn put_image(&mut self, image: &ImageData, x: i32, y: i32) -> SurfaceResult<()> {
        let sw = self.size.width as i64;
        let sh = self.size.height as i64;
        let (x, y) = (x as i64, y as i64);
        let iw = image.width() as i64;
        let ih = image.height() as i64;

        let col0 = x.max(0);
        let col1 = (x + iw).min(sw);
        if col0 >= col1 {
            return Ok(());
        }
        let row_bytes = ((col1 - col0) * 4) as usize;
        let src = image.data();

        for dy in y.max(0)..(y + ih).min(sh) {
            let sy = dy - y;
            let src_start = ((sy * iw + (col0 - x)) * 4) as usize;
            let dst_start = ((dy * sw + col0) * 4) as usize;
            self.pixels[dst_start..dst_start + row_bytes]
                .copy_from_slice(&src[src_start..src_start + row_bytes]);
        }
        Ok(())
    }
}
