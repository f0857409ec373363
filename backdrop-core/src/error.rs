//! Error types for the backdrop layer.
//!
//! Only configuration errors ever reach a caller. Surface errors are
//! consumed by the effect loops, which log them and stop.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration text is not valid TOML for the expected schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field holds a value outside its accepted range.
    #[error("invalid config field `{field}`: {reason}")]
    Invalid {
        /// Dotted field name, e.g. `grain.tile_size`.
        field: &'static str,
        /// Human readable constraint that was violated.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors a drawable surface can report mid-frame.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceError {
    /// The surface is no longer attached to anything that can be drawn on.
    #[error("surface detached")]
    Detached,
}

/// Result type for surface operations.
pub type SurfaceResult<T> = Result<T, SurfaceError>;
