use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::board::color::Cell;
use crate::error::{Error, Result};

/// A single cell write, delivered to subscribers for re-rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellChange {
    pub index: usize,
    pub old: Cell,
    pub new: Cell,
}

/// The flat, observable store of every cell on the board.
///
/// Notifications are observational only: subscribers see each write that
/// actually changed a cell, in the order the writes happened. A write
/// that stores the value already present emits nothing.
pub struct BoardState {
    cells: Vec<Cell>,
    watchers: Vec<Sender<CellChange>>,
}

impl BoardState {
    /// Creates a board of `len` unset cells.
    pub fn new(len: usize) -> Self {
        Self {
            cells: vec![Cell::Unset; len],
            watchers: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Read-only view of the backing cells, row-major.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn get(&self, index: usize) -> Result<Cell> {
        self.cells.get(index).copied().ok_or(Error::IndexOutOfBounds {
            index,
            len: self.cells.len(),
        })
    }

    /// Writes a cell, notifying subscribers if the stored value changed.
    pub fn set(&mut self, index: usize, cell: Cell) -> Result<()> {
        let old = self.get(index)?;
        if old == cell {
            return Ok(());
        }
        self.cells[index] = cell;
        self.notify(CellChange { index, old, new: cell });
        Ok(())
    }

    /// Blanks every cell, notifying for each one that was not already
    /// blank. The blanked state is distinct from `Unset`.
    pub fn clear(&mut self) {
        for index in 0..self.cells.len() {
            let old = self.cells[index];
            if old == Cell::Cleared {
                continue;
            }
            self.cells[index] = Cell::Cleared;
            self.notify(CellChange {
                index,
                old,
                new: Cell::Cleared,
            });
        }
    }

    /// Replaces every cell wholesale on a rebuild. No per-cell
    /// notifications are emitted; the board contents change identity.
    pub fn reset(&mut self, cells: Vec<Cell>) {
        self.cells = cells;
    }

    /// Registers a subscriber. Each subscriber receives every actual
    /// change exactly once; a dropped receiver is pruned on the next
    /// write.
    pub fn subscribe(&mut self) -> Receiver<CellChange> {
        let (tx, rx) = unbounded();
        self.watchers.push(tx);
        rx
    }

    fn notify(&mut self, change: CellChange) {
        self.watchers.retain(|tx| tx.send(change).is_ok());
    }
}
