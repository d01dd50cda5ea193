//! Error types for the pascalian engine.

use thiserror::Error;

/// Result type for board and engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while manipulating the board.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A cell index outside the populated board was requested.
    #[error("cell index {index} out of bounds for board of {len} cells")]
    IndexOutOfBounds { index: usize, len: usize },

    /// A color index outside 0..=2 reached the color model.
    #[error("invalid color index: {0}")]
    InvalidColorIndex(u8),
}
