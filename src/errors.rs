//! Error Types
//!
//! This module defines the error types used throughout the overlay.
//!
//! # Overview
//!
//! The main error type [`Error`] covers every failure mode of a mounted scene:
//! - Asset loading and decoding errors (recoverable, the effect stays inert)
//! - Tracking start-up failures (fatal to the session)
//! - Animation and named-resource lookups (recovered or degraded)
//! - Configuration and lifecycle misuse
//!
//! Per-effect failures are caught at the effect boundary and logged; only
//! [`Error::TrackingStartFailure`] and lifecycle errors reach the caller of
//! the frame loop.
//!
//! ```rust,ignore
//! use arfx::errors::{Error, Result};
//!
//! fn start() -> Result<()> {
//!     Err(Error::TrackingStartFailure("camera permission denied".into()))
//! }
//! ```

use thiserror::Error;

/// The main error type for the overlay.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Asset Loading Errors
    // ========================================================================
    /// An external asset (model, logo image) could not be loaded.
    #[error("Failed to load asset '{path}': {reason}")]
    AssetLoad {
        /// Path or URI of the asset
        path: String,
        /// Human readable cause reported by the loader
        reason: String,
    },

    /// Image decoding error.
    #[error("Image decode error: {0}")]
    ImageDecode(String),

    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ========================================================================
    // Tracking Errors
    // ========================================================================
    /// The tracking host failed to start. No overlay is possible without it.
    #[error("Tracking host failed to start: {0}")]
    TrackingStartFailure(String),

    // ========================================================================
    // Animation & Named Resource Errors
    // ========================================================================
    /// A clip with the requested name does not exist on the model.
    #[error("Animation clip '{0}' not found")]
    MissingAnimationClip(String),

    /// A named resource (morph target, node, ...) expected by the
    /// configuration is absent from the loaded asset.
    #[error("Missing named resource '{name}' on '{owner}'")]
    MissingNamedResource {
        /// The resource that was looked up
        name: String,
        /// The asset or effect that should have provided it
        owner: String,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // Lifecycle & Async Errors
    // ========================================================================
    /// Another scene already owns the render context on this thread.
    #[error("A scene is already mounted on this render thread")]
    SceneAlreadyMounted,

    /// A pending operation was abandoned before it completed.
    #[error("Operation cancelled")]
    Cancelled,

    /// Task join error (when a background loader task fails to complete).
    #[error("Task join error: {0}")]
    TaskJoin(String),
}

// ============================================================================
// Convenient conversion implementations
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::TaskJoin(err.to_string())
    }
}

impl Error {
    /// Convenience constructor for [`Error::AssetLoad`].
    pub fn asset_load(path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::AssetLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
