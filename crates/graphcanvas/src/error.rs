// SPDX-License-Identifier: MIT OR Apache-2.0
//! Canvas-level errors.

use thiserror::Error;

/// Errors raised while setting up a canvas or its configuration
#[derive(Debug, Error)]
pub enum CanvasError {
    /// The drawing surface has no area
    #[error("Invalid drawing surface: {width}x{height}")]
    InvalidSurface {
        /// Surface width in pixels
        width: f32,
        /// Surface height in pixels
        height: f32,
    },

    /// Settings or scene text could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Settings or scene could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for canvas setup
pub type Result<T> = std::result::Result<T, CanvasError>;
