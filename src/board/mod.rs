mod color;
mod layout;
mod state;

pub use color::{combine, Cell, Color, CycleDirection};
pub use layout::TriangleLayout;
pub use state::{BoardState, CellChange};
