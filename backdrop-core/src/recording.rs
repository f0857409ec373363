//! A [`Surface`] that records draw calls instead of rasterizing them.
//!
//! Used to inspect exactly what an effect drew on a given frame, and to
//! simulate a canvas that disappears mid-loop via [`RecordingSurface::detach`].

use glam::Vec2;

use crate::{
    error::{SurfaceError, SurfaceResult},
    surface::{GradientStop, ImageData, Rgba, Surface},
    viewport::ViewportSize,
};

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Resize(ViewportSize),
    Clear,
    Fill(Rgba),
    RadialGradient {
        center: Vec2,
        radius: f32,
        stops: Vec<GradientStop>,
    },
    Circle {
        center: Vec2,
        radius: f32,
        color: Rgba,
    },
    PutImage {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
}

#[derive(Debug, Default)]
pub struct RecordingSurface {
    size: ViewportSize,
    commands: Vec<DrawCommand>,
    detached: bool,
}

impl RecordingSurface {
    pub fn new(size: ViewportSize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Returns the recorded commands and starts a fresh log.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// From now on every drawing call fails with [`SurfaceError::Detached`].
    pub fn detach(&mut self) {
        self.detached = true;
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    pub fn count(&self, pred: impl Fn(&DrawCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }

    fn record(&mut self, cmd: DrawCommand) -> SurfaceResult<()> {
        if self.detached {
            return Err(SurfaceError::Detached);
        }
        self.commands.push(cmd);
        Ok(())
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> ViewportSize {
        self.size
    }

    fn set_size(&mut self, size: ViewportSize) {
        self.size = size;
        if !self.detached {
            self.commands.push(DrawCommand::Resize(size));
        }
    }

    fn clear(&mut self) -> SurfaceResult<()> {
        self.record(DrawCommand::Clear)
    }

    fn fill(&mut self, color: Rgba) -> SurfaceResult<()> {
        self.record(DrawCommand::Fill(color))
    }

    fn fill_radial_gradient(
        &mut self,
        center: Vec2,
        radius: f32,
        stops: &[GradientStop],
    ) -> SurfaceResult<()> {
        self.record(DrawCommand::RadialGradient {
            center,
            radius,
            stops: stops.to_vec(),
        })
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) -> SurfaceResult<()> {
        self.record(DrawCommand::Circle {
            center,
            radius,
            color,
        })
    }

    fn put_image(&mut self, image: &ImageData, x: i32, y: i32) -> SurfaceResult<()> {
        self.record(DrawCommand::PutImage {
            x,
            y,
            width: image.width(),
            height: image.height(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_calls_in_order() {
        let mut s = RecordingSurface::new(ViewportSize::new(10, 10));
        s.clear().unwrap();
        s.fill(Rgba::BLACK).unwrap();
        s.fill_circle(Vec2::ONE, 2.0, Rgba::WHITE).unwrap();

        assert_eq!(
            s.take_commands(),
            vec![
                DrawCommand::Clear,
                DrawCommand::Fill(Rgba::BLACK),
                DrawCommand::Circle {
                    center: Vec2::ONE,
                    radius: 2.0,
                    color: Rgba::WHITE,
                },
            ]
        );
        assert!(s.commands().is_empty());
    }

    #[test]
    fn detached_surface_rejects_drawing() {
        let mut s = RecordingSurface::new(ViewportSize::new(10, 10));
        s.detach();

        assert_eq!(s.clear(), Err(SurfaceError::Detached));
        assert_eq!(
            s.put_image(&ImageData::new(1, 1), 0, 0),
            Err(SurfaceError::Detached)
        );
        assert!(s.commands().is_empty());
    }
}
