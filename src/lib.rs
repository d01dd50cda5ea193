// Pascalian triangle tri-color puzzle - library modules

pub mod board;
pub mod config;
pub mod engine;
pub mod error;
pub mod sequence;

// Re-export the primary types
pub use board::{combine, BoardState, Cell, CellChange, Color, CycleDirection, TriangleLayout};
pub use engine::PropagationEngine;
pub use error::{Error, Result};
