use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use rand::Rng;

use crate::board::{combine, BoardState, Cell, CellChange, Color, CycleDirection, TriangleLayout};
use crate::config;
use crate::error::Result;
use crate::sequence;

/// Drives the board: seeds it, rebuilds it, and propagates the effect of
/// a single-cell color change down the triangle one row at a time.
///
/// A full build makes the whole board a pure function of the seed row.
/// An activation cycles one cell's color and starts a background pass
/// that recomputes strictly descendant rows in increasing order, pausing
/// only between rows. At most one pass is in flight at a time; an
/// activation arriving while a pass runs is dropped.
pub struct PropagationEngine {
    layout: TriangleLayout,
    board: Arc<Mutex<BoardState>>,
    /// Set while a pass is in flight. Acquired with a single
    /// compare-exchange so two passes can never race.
    updating: Arc<AtomicBool>,
    /// Bumped on every rebuild, resize, or clear; an in-flight pass exits
    /// at its next between-rows check once the generation it captured is
    /// stale.
    generation: Arc<AtomicU64>,
    /// Inter-row pause in milliseconds, shared with in-flight passes.
    step_delay_millis: Arc<AtomicU64>,
}

impl PropagationEngine {
    /// Creates an engine with an unseeded board of the given size,
    /// clamped into the supported range.
    pub fn new(size: usize) -> Self {
        let layout = TriangleLayout::new(config::clamp_board_size(size));
        log::info!("creating board: size {}, {} cells", layout.size(), layout.cell_count());
        Self {
            layout,
            board: Arc::new(Mutex::new(BoardState::new(layout.cell_count()))),
            updating: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
            step_delay_millis: Arc::new(AtomicU64::new(config::DEFAULT_STEP_DELAY_MILLIS)),
        }
    }

    /// Number of cells in the seed row.
    pub fn size(&self) -> usize {
        self.layout.size()
    }

    /// Total number of cells on the board.
    pub fn cell_count(&self) -> usize {
        self.layout.cell_count()
    }

    pub fn layout(&self) -> TriangleLayout {
        self.layout
    }

    /// Current state of a cell by flat index.
    pub fn cell(&self, index: usize) -> Result<Cell> {
        self.lock_board().get(index)
    }

    /// Snapshot of every cell, row-major.
    pub fn snapshot(&self) -> Vec<Cell> {
        self.lock_board().cells().to_vec()
    }

    /// Registers a renderer subscription on the current board. A rebuild
    /// replaces the board wholesale, so collaborators subscribe again
    /// after rebuilding.
    pub fn subscribe(&self) -> Receiver<CellChange> {
        self.lock_board().subscribe()
    }

    /// True while a propagation pass is in flight.
    pub fn is_updating(&self) -> bool {
        self.updating.load(Ordering::SeqCst)
    }

    /// Sets the inter-row animation delay from a normalized [0, 1] value.
    /// Takes effect from the next row of any in-flight pass.
    pub fn set_step_delay_fraction(&self, fraction: f64) {
        let millis = config::step_delay_millis(fraction);
        self.step_delay_millis.store(millis, Ordering::Relaxed);
        log::debug!("inter-row delay set to {millis} ms");
    }

    /// The recommended board sizes exposed as UI anchor points.
    pub fn size_checkpoints() -> [usize; 4] {
        sequence::checkpoints()
    }

    /// Rebuilds the whole board from a uniformly random seed row.
    pub fn rebuild_random(&mut self, rng: &mut impl Rng) {
        let seed: Vec<Color> = (0..self.layout.size()).map(|_| Color::random(rng)).collect();
        self.rebuild_from_seed(&seed);
    }

    /// Rebuilds the whole board from the fixed pattern: Yellow
    /// everywhere, Red in the middle position(s) of the seed row.
    pub fn rebuild_pattern(&mut self) {
        let size = self.layout.size();
        let seed: Vec<Color> = (0..size)
            .map(|i| if is_middle_index(i, size) { Color::Red } else { Color::Yellow })
            .collect();
        self.rebuild_from_seed(&seed);
    }

    /// Rebuilds the whole board from an explicit seed row, one color per
    /// seed-row cell. The previous `BoardState` is discarded: an
    /// in-flight pass keeps its handle to the discarded allocation and
    /// exits at its next between-rows check, so none of its writes reach
    /// the new board. Subscribers of the old board stop receiving and
    /// subscribe again.
    pub fn rebuild_from_seed(&mut self, seed: &[Color]) {
        assert_eq!(
            seed.len(),
            self.layout.size(),
            "seed row must hold one color per seed cell",
        );
        self.invalidate_in_flight();
        let mut board = BoardState::new(self.layout.cell_count());
        board.reset(build_cells(self.layout, seed));
        self.board = Arc::new(Mutex::new(board));
        log::info!("board rebuilt: size {}", self.layout.size());
    }

    /// Changes the seed-row length (clamped) and rebuilds from a fresh
    /// random seed.
    pub fn resize(&mut self, size: usize, rng: &mut impl Rng) {
        let clamped = config::clamp_board_size(size);
        if clamped != self.layout.size() {
            log::info!("resizing board: {} -> {}", self.layout.size(), clamped);
            self.layout = TriangleLayout::new(clamped);
        }
        self.rebuild_random(rng);
    }

    /// Blanks the board in place. An in-flight pass is invalidated first
    /// so it cannot recolor the blanked cells.
    pub fn clear(&mut self) {
        self.invalidate_in_flight();
        self.lock_board().clear();
    }

    /// Reacts to a cell activation: cycles the cell's color and starts a
    /// background pass recomputing every dependent row. Returns `true`
    /// when the activation was applied, `false` when it was dropped
    /// because a pass is already in flight.
    ///
    /// Activating an unresolved (blank) cell starts the cycle over:
    /// Forward yields Blue, Reverse yields Red.
    pub fn activate_cell(&self, index: usize, direction: CycleDirection) -> Result<bool> {
        if self
            .updating
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::debug!("activation at {index} dropped: pass in flight");
            return Ok(false);
        }

        let start_row = match self.apply_activation(index, direction) {
            Ok(row) => row,
            Err(e) => {
                self.updating.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        // A cell's own row is never recomputed from parents; descendants
        // start one row down. For a seed-row activation the authoritative
        // store was just written above, so its descendants likewise start
        // at row 1.
        let first_row = start_row + 1;

        let layout = self.layout;
        let board = Arc::clone(&self.board);
        let updating = Arc::clone(&self.updating);
        let generation = Arc::clone(&self.generation);
        let step_delay_millis = Arc::clone(&self.step_delay_millis);
        let pass_generation = generation.load(Ordering::SeqCst);

        thread::spawn(move || {
            run_pass(layout, &board, first_row, pass_generation, &generation, &step_delay_millis);
            updating.store(false, Ordering::SeqCst);
        });

        Ok(true)
    }

    /// Blocks until no pass is in flight or the timeout elapses. Returns
    /// `true` if the engine went idle.
    pub fn wait_until_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.is_updating() {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
        true
    }

    fn apply_activation(&self, index: usize, direction: CycleDirection) -> Result<usize> {
        let mut board = self.lock_board();
        let old = board.get(index)?;
        let new = match old.color() {
            Some(color) => color.cycled(direction),
            None => match direction {
                CycleDirection::Forward => Color::Blue,
                CycleDirection::Reverse => Color::Red,
            },
        };
        board.set(index, Cell::Color(new))?;
        Ok(self.layout.row_of(index))
    }

    fn invalidate_in_flight(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn lock_board(&self) -> std::sync::MutexGuard<'_, BoardState> {
        self.board.lock().expect("board lock poisoned")
    }
}

/// True when `index` is a middle position of a seed row of `size` cells.
/// Odd sizes have one middle position, even sizes two.
fn is_middle_index(index: usize, size: usize) -> bool {
    let half = size / 2;
    index == half || (size % 2 == 0 && index + 1 == half)
}

/// Computes a full board from a resolved seed row: one top-down pass,
/// each cell from its two parents.
fn build_cells(layout: TriangleLayout, seed: &[Color]) -> Vec<Cell> {
    let mut cells = vec![Cell::Unset; layout.cell_count()];
    for (col, &color) in seed.iter().enumerate() {
        cells[col] = Cell::Color(color);
    }
    for row in 1..layout.size() {
        for col in 0..layout.row_len(row) {
            let (left, right) = layout.parents(row, col);
            cells[layout.cell_index(row, col)] = combine(cells[left], cells[right], Cell::Unset);
        }
    }
    cells
}

/// One propagation pass: recomputes rows `first_row..` strictly in
/// increasing order, pausing between rows, and exits without further
/// writes once its generation goes stale. Each row is recomputed under a
/// single lock acquisition, so a pass never pauses mid-row.
fn run_pass(
    layout: TriangleLayout,
    board: &Mutex<BoardState>,
    first_row: usize,
    pass_generation: u64,
    generation: &AtomicU64,
    step_delay_millis: &AtomicU64,
) {
    for row in first_row..layout.size() {
        if generation.load(Ordering::SeqCst) != pass_generation {
            log::debug!("pass cancelled before row {row}");
            return;
        }
        {
            let mut board = board.lock().expect("board lock poisoned");
            if let Err(e) = recompute_row(layout, &mut board, row) {
                log::error!("pass aborted at row {row}: {e}");
                return;
            }
        }
        if row + 1 < layout.size() {
            let delay = step_delay_millis.load(Ordering::Relaxed);
            if delay > 0 {
                thread::sleep(Duration::from_millis(delay));
            }
        }
    }
}

/// Recomputes one row from its parents, writing (and thereby notifying)
/// only cells whose computed color differs from the stored color.
fn recompute_row(layout: TriangleLayout, board: &mut BoardState, row: usize) -> Result<()> {
    for col in 0..layout.row_len(row) {
        let child = layout.cell_index(row, col);
        let (left, right) = layout.parents(row, col);
        // The child index is the largest of the three. A board shorter
        // than the layout expects can only happen during a partial
        // build; stop the row rather than fault.
        if child >= board.len() {
            log::warn!(
                "row {row} truncated at column {col}: board holds {} cells, layout expects {}",
                board.len(),
                layout.cell_count(),
            );
            break;
        }
        let current = board.get(child)?;
        let new = combine(board.get(left)?, board.get(right)?, current);
        if new != current {
            board.set(child, new)?;
        }
    }
    Ok(())
}
