//! The drawable surface each effect owns.
//!
//! The operation set mirrors the handful of 2-D canvas calls the effects
//! need. Coordinates are in surface pixels with the origin at the top-left.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{error::SurfaceResult, viewport::ViewportSize};

/// Straight-alpha colour, `rgba(r, g, b, a)` with `a` in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: f32,
}

fn opaque() -> f32 {
    1.0
}

impl Rgba {
    pub const WHITE: Self = Self::opaque(255, 255, 255);
    pub const BLACK: Self = Self::opaque(0, 0, 0);
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0.0);

    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 1.0)
    }

    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Component-wise interpolation, `t` clamped to `[0, 1]`.
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: self.a + (other.a - self.a) * t,
        }
    }
}

/// One colour stop of a radial gradient. `offset` is in `[0, 1]`, measured
/// from the center outward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Rgba,
}

impl GradientStop {
    pub const fn new(offset: f32, color: Rgba) -> Self {
        Self { offset, color }
    }
}

/// Samples a stop list at `t`. Stops must be sorted by offset.
///
/// Before the first stop the first colour is used, after the last stop the
/// last colour; an empty list samples as transparent.
pub fn sample_gradient(stops: &[GradientStop], t: f32) -> Rgba {
    let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
        return Rgba::TRANSPARENT;
    };
    if t <= first.offset {
        return first.color;
    }
    if t >= last.offset {
        return last.color;
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t >= a.offset && t <= b.offset {
            let span = b.offset - a.offset;
            if span <= f32::EPSILON {
                return b.color;
            }
            return a.color.lerp(b.color, (t - a.offset) / span);
        }
    }
    last.color
}

/// RGBA8 pixel block, the equivalent of a canvas `ImageData`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageData {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ImageData {
    /// A fully transparent image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// A drawable resource handed to an effect at start.
///
/// Drawing calls fail only when the surface has gone away underneath the
/// effect (for example, an unmounted canvas); the effect then stops its
/// loop. Resizing is infallible and, like a canvas backing store, clears
/// the contents.
pub trait Surface {
    fn size(&self) -> ViewportSize;

    fn set_size(&mut self, size: ViewportSize);

    /// Resets every pixel to transparent black.
    fn clear(&mut self) -> SurfaceResult<()>;

    /// Composites `color` over the whole surface.
    fn fill(&mut self, color: Rgba) -> SurfaceResult<()>;

    /// Composites a disc of `radius` around `center`, coloured by sampling
    /// `stops` at `distance / radius`.
    fn fill_radial_gradient(
        &mut self,
        center: Vec2,
        radius: f32,
        stops: &[GradientStop],
    ) -> SurfaceResult<()>;

    /// Composites a solid disc.
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) -> SurfaceResult<()>;

    /// Copies `image` with its top-left corner at `(x, y)`, replacing the
    /// destination pixels. Parts outside the surface are clipped.
    fn put_image(&mut self, image: &ImageData, x: i32, y: i32) -> SurfaceResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_stop_gradient_fades_linearly() {
        let stops = [
            GradientStop::new(0.0, Rgba::BLACK),
            GradientStop::new(1.0, Rgba::TRANSPARENT),
        ];

        assert_eq!(sample_gradient(&stops, 0.0), Rgba::BLACK);
        assert_eq!(sample_gradient(&stops, 1.0), Rgba::TRANSPARENT);
        let mid = sample_gradient(&stops, 0.5);
        assert!((mid.a - 0.5).abs() < 1e-6);
    }

    #[test]
    fn gradient_clamps_outside_stop_range() {
        let stops = [
            GradientStop::new(0.25, Rgba::WHITE),
            GradientStop::new(0.75, Rgba::BLACK),
        ];
        assert_eq!(sample_gradient(&stops, 0.0), Rgba::WHITE);
        assert_eq!(sample_gradient(&stops, 1.0), Rgba::BLACK);
        assert_eq!(sample_gradient(&[], 0.5), Rgba::TRANSPARENT);
    }

    #[test]
    fn rgba_defaults_to_opaque_when_alpha_missing() {
        let c: Rgba = toml::from_str("r = 9\ng = 9\nb = 11").unwrap();
        assert_eq!(c, Rgba::opaque(9, 9, 11));
    }

    #[test]
    fn new_image_is_transparent() {
        let img = ImageData::new(3, 2);
        assert_eq!(img.data().len(), 3 * 2 * 4);
        assert!(img.data().iter().all(|&b| b == 0));
    }
}
