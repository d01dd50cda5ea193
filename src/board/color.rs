use rand::Rng;

use crate::error::{Error, Result};

/// One of the three cell colors, encoded 0-Blue, 1-Red, 2-Yellow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Color {
    Blue,
    Red,
    Yellow,
}

/// Which way a cell activation cycles through the colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleDirection {
    /// Blue -> Red -> Yellow -> Blue.
    Forward,
    /// Blue -> Yellow -> Red -> Blue.
    Reverse,
}

impl Color {
    /// Numeric encoding of the color (0-Blue, 1-Red, 2-Yellow).
    pub fn index(self) -> u8 {
        match self {
            Color::Blue => 0,
            Color::Red => 1,
            Color::Yellow => 2,
        }
    }

    /// Decodes a numeric color index. Anything outside 0..=2 is a
    /// reportable inconsistency, never coerced to a fallback color.
    pub fn from_index(index: u8) -> Result<Self> {
        match index {
            0 => Ok(Color::Blue),
            1 => Ok(Color::Red),
            2 => Ok(Color::Yellow),
            other => Err(Error::InvalidColorIndex(other)),
        }
    }

    /// The color distinct from two differing colors (any two distinct
    /// colors produce the third; equal inputs produce themselves).
    pub fn third(a: Color, b: Color) -> Color {
        use Color::*;
        match (a, b) {
            (Blue, Red) | (Red, Blue) => Yellow,
            (Blue, Yellow) | (Yellow, Blue) => Red,
            (Red, Yellow) | (Yellow, Red) => Blue,
            (Blue, Blue) | (Red, Red) | (Yellow, Yellow) => a,
        }
    }

    /// The next color in cycle order for a cell activation.
    pub fn cycled(self, direction: CycleDirection) -> Color {
        use Color::*;
        match (self, direction) {
            (Blue, CycleDirection::Forward) => Red,
            (Red, CycleDirection::Forward) => Yellow,
            (Yellow, CycleDirection::Forward) => Blue,
            (Blue, CycleDirection::Reverse) => Yellow,
            (Red, CycleDirection::Reverse) => Blue,
            (Yellow, CycleDirection::Reverse) => Red,
        }
    }

    /// Uniformly random color from a caller-supplied source.
    pub fn random(rng: &mut impl Rng) -> Color {
        match rng.gen_range(0..3u8) {
            0 => Color::Blue,
            1 => Color::Red,
            _ => Color::Yellow,
        }
    }
}

/// The state held by one triangle position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    /// Newly created, not yet computed from its parents.
    Unset,
    /// Blanked by the user; stays blank until the next rebuild.
    Cleared,
    /// A resolved color.
    Color(Color),
}

impl Cell {
    /// The resolved color, if any.
    pub fn color(self) -> Option<Color> {
        match self {
            Cell::Color(color) => Some(color),
            Cell::Unset | Cell::Cleared => None,
        }
    }

    pub fn is_resolved(self) -> bool {
        self.color().is_some()
    }

    /// Single-character label for terminal output.
    pub fn label_char(self) -> char {
        match self {
            Cell::Unset => '?',
            Cell::Cleared => '.',
            Cell::Color(Color::Blue) => 'B',
            Cell::Color(Color::Red) => 'R',
            Cell::Color(Color::Yellow) => 'Y',
        }
    }
}

/// Computes a child cell from its two parents.
///
/// An unresolved parent (`Unset` or `Cleared`) leaves the child at
/// `current`. Equal parents produce their shared color; differing parents
/// produce the third color.
pub fn combine(left: Cell, right: Cell, current: Cell) -> Cell {
    match (left.color(), right.color()) {
        (Some(l), Some(r)) => Cell::Color(Color::third(l, r)),
        _ => current,
    }
}
