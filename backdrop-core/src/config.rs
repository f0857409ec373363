//! Configuration for both effects and the cursor follower.
//!
//! Every field is optional in TOML and falls back to the defaults below.
//! Unknown keys are rejected so typos surface as errors instead of silently
//! using a default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, ConfigResult},
    surface::Rgba,
};

/// How the particle field treats the previous frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum TrailMode {
    /// Composite the background at `alpha` over the last frame, leaving
    /// fading streaks behind moving particles.
    Fade { alpha: f32 },
    /// Clear, then paint the background opaque. No trail.
    Clear,
}

impl Default for TrailMode {
    fn default() -> Self {
        Self::Clear
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParticleConfig {
    pub population: usize,
    pub trail: TrailMode,
    /// Radius of the occluding disc drawn at the attractor.
    pub disc_radius: f32,
    pub background: Rgba,
    pub particle_color: Rgba,
    /// Scale of the per-frame pull; the velocity change is
    /// `displacement * (pull_strength / distance)`.
    pub pull_strength: f32,
    /// Particles at or inside this distance receive no pull.
    pub impulse_min_distance: f32,
    /// Particles strictly inside this distance are respawned.
    pub capture_radius: f32,
}

impl ParticleConfig {
    /// The denser, trail-free variant; this is the default.
    pub fn dense() -> Self {
        Self {
            population: 25,
            trail: TrailMode::Clear,
            disc_radius: 100.0,
            background: Rgba::opaque(9, 9, 11),
            particle_color: Rgba::WHITE,
            pull_strength: 0.5,
            impulse_min_distance: 50.0,
            capture_radius: 30.0,
        }
    }

    /// The sparse variant with a persistent fading trail.
    pub fn minimal() -> Self {
        Self {
            population: 10,
            trail: TrailMode::Fade { alpha: 0.1 },
            disc_radius: 200.0,
            ..Self::dense()
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if let TrailMode::Fade { alpha } = self.trail
            && !(0.0..=1.0).contains(&alpha)
        {
            return Err(ConfigError::invalid(
                "particles.trail.alpha",
                format!("must be within [0, 1], got {alpha}"),
            ));
        }
        non_negative("particles.disc_radius", self.disc_radius)?;
        non_negative("particles.pull_strength", self.pull_strength)?;
        non_negative("particles.impulse_min_distance", self.impulse_min_distance)?;
        non_negative("particles.capture_radius", self.capture_radius)?;
        unit_alpha("particles.background.a", self.background.a)?;
        unit_alpha("particles.particle_color.a", self.particle_color.a)?;
        Ok(())
    }
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self::dense()
    }
}

/// Largest accepted grain tile edge, in pixels.
pub const MAX_TILE_SIZE: u32 = 4096;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GrainConfig {
    /// Edge length of the square noise tile, in pixels.
    pub tile_size: u32,
    /// Horizontal stride multiplier when repeating the tile.
    pub tile_scale_x: f32,
    /// Vertical stride multiplier when repeating the tile.
    pub tile_scale_y: f32,
    /// Alpha written into every tile pixel.
    pub alpha: u8,
    /// Frames between tile regenerations.
    pub refresh_interval: u32,
    /// Opacity the host applies when compositing the whole overlay.
    pub opacity: f32,
}

impl GrainConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.tile_size == 0 {
            return Err(ConfigError::invalid("grain.tile_size", "must be positive"));
        }
        if self.tile_size > MAX_TILE_SIZE {
            return Err(ConfigError::invalid(
                "grain.tile_size",
                format!("must be at most {MAX_TILE_SIZE}, got {}", self.tile_size),
            ));
        }
        if self.refresh_interval == 0 {
            return Err(ConfigError::invalid(
                "grain.refresh_interval",
                "must be positive",
            ));
        }
        for (field, scale) in [
            ("grain.tile_scale_x", self.tile_scale_x),
            ("grain.tile_scale_y", self.tile_scale_y),
        ] {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(ConfigError::invalid(
                    field,
                    format!("must be a positive number, got {scale}"),
                ));
            }
            // A sub-pixel stride would never advance the blit cursor.
            if self.tile_size as f32 * scale < 1.0 {
                return Err(ConfigError::invalid(
                    field,
                    format!("tile stride {} is below one pixel", self.tile_size as f32 * scale),
                ));
            }
        }
        unit_alpha("grain.opacity", self.opacity)
    }

    /// Distance between tile origins along each axis.
    pub fn stride(&self) -> (f32, f32) {
        let size = self.tile_size as f32;
        (size * self.tile_scale_x, size * self.tile_scale_y)
    }
}

impl Default for GrainConfig {
    fn default() -> Self {
        Self {
            tile_size: 250,
            tile_scale_x: 1.0,
            tile_scale_y: 1.0,
            alpha: 15,
            refresh_interval: 100,
            opacity: 0.1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CursorConfig {
    pub enabled: bool,
    pub diameter: f32,
    /// Time constant of the ease toward the pointer, in seconds.
    pub transition_secs: f32,
}

impl CursorConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        non_negative("cursor.diameter", self.diameter)?;
        non_negative("cursor.transition_secs", self.transition_secs)
    }
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            diameter: 24.0,
            transition_secs: 0.1,
        }
    }
}

/// Top-level configuration file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackdropConfig {
    /// Seed for every random source. `None` seeds from the OS.
    pub seed: Option<u64>,
    pub particles: ParticleConfig,
    pub grain: GrainConfig,
    pub cursor: CursorConfig,
}

impl BackdropConfig {
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let cfg: Self = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded backdrop config");
        Ok(cfg)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.particles.validate()?;
        self.grain.validate()?;
        self.cursor.validate()
    }
}

fn non_negative(field: &'static str, value: f32) -> ConfigResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("must be a finite non-negative number, got {value}"),
        ))
    }
}

fn unit_alpha(field: &'static str, value: f32) -> ConfigResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("must be within [0, 1], got {value}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = BackdropConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, BackdropConfig::default());
        assert_eq!(cfg.particles.population, 25);
        assert_eq!(cfg.particles.trail, TrailMode::Clear);
        assert_eq!(cfg.grain.tile_size, 250);
        assert_eq!(cfg.grain.alpha, 15);
        assert_eq!(cfg.grain.refresh_interval, 100);
        assert!(cfg.seed.is_none());
    }

    #[test]
    fn parses_partial_sections_and_trail_mode() {
        let cfg = BackdropConfig::from_toml_str(
            r#"
            seed = 7

            [particles]
            population = 10
            disc_radius = 200.0
            trail = { mode = "fade", alpha = 0.1 }

            [grain]
            tile_size = 128
            refresh_interval = 4
            "#,
        )
        .unwrap();

        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.particles.population, 10);
        assert_eq!(cfg.particles.trail, TrailMode::Fade { alpha: 0.1 });
        assert_eq!(cfg.particles.pull_strength, 0.5);
        assert_eq!(cfg.grain.tile_size, 128);
        assert_eq!(cfg.grain.refresh_interval, 4);
        assert_eq!(cfg.grain.tile_scale_x, 1.0);
    }

    #[test]
    fn minimal_preset_matches_sparse_variant() {
        let cfg = ParticleConfig::minimal();
        assert_eq!(cfg.population, 10);
        assert_eq!(cfg.trail, TrailMode::Fade { alpha: 0.1 });
        assert_eq!(cfg.disc_radius, 200.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn unknown_field_is_a_parse_error() {
        let err = BackdropConfig::from_toml_str("[grain]\ntile_sise = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn alpha_above_255_is_rejected_by_type() {
        let err = BackdropConfig::from_toml_str("[grain]\nalpha = 300").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn zero_refresh_interval_is_invalid() {
        let err = BackdropConfig::from_toml_str("[grain]\nrefresh_interval = 0").unwrap_err();
        match err {
            ConfigError::Invalid { field, .. } => assert_eq!(field, "grain.refresh_interval"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn oversized_tile_is_invalid() {
        let err = BackdropConfig::from_toml_str("[grain]\ntile_size = 100000").unwrap_err();
        match err {
            ConfigError::Invalid { field, reason } => {
                assert_eq!(field, "grain.tile_size");
                assert!(reason.contains("4096"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }

        let cfg = GrainConfig {
            tile_size: MAX_TILE_SIZE,
            ..GrainConfig::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn non_positive_scale_is_invalid() {
        let cfg = GrainConfig {
            tile_scale_y: 0.0,
            ..GrainConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Invalid {
                field: "grain.tile_scale_y",
                ..
            })
        ));
    }

    #[test]
    fn out_of_range_trail_alpha_is_invalid() {
        let cfg = ParticleConfig {
            trail: TrailMode::Fade { alpha: 1.5 },
            ..ParticleConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn stride_scales_tile_size() {
        let cfg = GrainConfig {
            tile_size: 100,
            tile_scale_x: 2.0,
            tile_scale_y: 1.5,
            ..GrainConfig::default()
        };
        assert_eq!(cfg.stride(), (200.0, 150.0));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = BackdropConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
