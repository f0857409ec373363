//! Decorative backdrop effects: a particle field drawn into a central
//! attractor and a film-grain overlay.
//!
//! Main components:
//! - [`field`]: the particle field effect.
//! - [`phases`]: per-frame physics phases (attraction, integration, respawn).
//! - [`grain`]: the film-grain overlay and its noise tile.
//! - [`viewport`]: live viewport size and the surface resize binding.
//! - [`scheduler`]: host-driven frame scheduling.
//! - [`surface`], [`raster`], [`recording`]: the drawable surface trait and
//!   its two implementations.
//! - [`cursor`]: the ambient cursor follower.
//! - [`config`]: TOML-backed configuration for all of the above.

pub mod config;
pub mod cursor;
pub mod error;
pub mod field;
mod frame_loop;
pub mod grain;
pub mod particle;
pub mod phases;
pub mod proximity;
pub mod raster;
pub mod recording;
pub mod scheduler;
pub mod surface;
pub mod types;
pub mod viewport;

pub use config::{BackdropConfig, CursorConfig, GrainConfig, ParticleConfig, TrailMode};
pub use cursor::CursorFollower;
pub use error::{ConfigError, SurfaceError};
pub use field::ParticleField;
pub use proximity::PullStats;
pub use grain::{GrainOverlay, GrainTile};
pub use raster::PixelSurface;
pub use recording::{DrawCommand, RecordingSurface};
pub use scheduler::{FrameScheduler, Scheduler};
pub use surface::{Rgba, Surface};
pub use viewport::{Viewport, ViewportBinding, ViewportSize};
