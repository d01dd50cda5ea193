/// Flat-array indexing for a Pascalian triangle with `size` cells in its
/// top row.
///
/// Row r holds `size - r` cells and rows are stored back to back, so the
/// whole board is a single sequence of `size * (size + 1) / 2` cells.
/// Every method takes 0-indexed (row, column) positions; out-of-range
/// positions are a programming error and fail fast.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TriangleLayout {
    size: usize,
}

impl TriangleLayout {
    pub fn new(size: usize) -> Self {
        assert!(size >= 1, "triangle needs at least one row, got size {size}");
        Self { size }
    }

    /// Number of cells in the seed row (and number of rows).
    pub fn size(&self) -> usize {
        self.size
    }

    /// Total number of cells in the triangle.
    pub fn cell_count(&self) -> usize {
        self.size * (self.size + 1) / 2
    }

    /// Flat index of the first cell of `row`.
    pub fn offset(&self, row: usize) -> usize {
        self.check_row(row);
        // Closed form of sum_{k=0}^{row-1} (size - k).
        row * self.size - row * (row.saturating_sub(1)) / 2
    }

    /// Number of cells in `row`.
    pub fn row_len(&self, row: usize) -> usize {
        self.check_row(row);
        self.size - row
    }

    /// Flat index of the cell at (row, col).
    pub fn cell_index(&self, row: usize, col: usize) -> usize {
        self.check_cell(row, col);
        self.offset(row) + col
    }

    /// Flat indices of the left and right parents of (row, col).
    /// Only rows below the seed row have parents.
    pub fn parents(&self, row: usize, col: usize) -> (usize, usize) {
        assert!(row >= 1, "seed row cells have no parents");
        self.check_cell(row, col);
        let left = self.offset(row - 1) + col;
        (left, left + 1)
    }

    /// Row containing the given flat index.
    pub fn row_of(&self, index: usize) -> usize {
        assert!(
            index < self.cell_count(),
            "index {index} out of range for {} cells",
            self.cell_count(),
        );
        let mut row = 0;
        let mut start = 0;
        while start + self.row_len(row) <= index {
            start += self.row_len(row);
            row += 1;
        }
        row
    }

    fn check_row(&self, row: usize) {
        assert!(row < self.size, "row {row} out of range for size {}", self.size);
    }

    fn check_cell(&self, row: usize, col: usize) {
        self.check_row(row);
        assert!(
            col < self.size - row,
            "column {col} out of range for row {row} of size {}",
            self.size,
        );
    }
}
