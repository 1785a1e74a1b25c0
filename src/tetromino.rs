//! Tetromino definitions and shapes
//!
//! All 7 pieces with their rotation states as 4x4 occupancy grids.

use ratatui::style::Color;

/// One rotation state: a 4x4 occupancy grid, row-major, top to bottom.
pub type Mask = [[u8; 4]; 4];

/// The 7 tetromino types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TetrominoType {
    I, // Cyan - long bar
    O, // Yellow - square
    T, // Purple - T-shape
    S, // Green - S-shape
    Z, // Red - Z-shape
    J, // Blue - J-shape
    L, // Orange - L-shape
}

impl TetrominoType {
    /// Get the color for this tetromino
    pub fn color(&self) -> Color {
        match self {
            TetrominoType::I => Color::Cyan,
            TetrominoType::O => Color::Yellow,
            TetrominoType::T => Color::Magenta,
            TetrominoType::S => Color::Green,
            TetrominoType::Z => Color::Red,
            TetrominoType::J => Color::Blue,
            TetrominoType::L => Color::Rgb(255, 165, 0), // Orange
        }
    }

    /// Get all tetromino types, in canonical order
    pub fn all() -> [TetrominoType; 7] {
        [
            TetrominoType::I,
            TetrominoType::O,
            TetrominoType::T,
            TetrominoType::S,
            TetrominoType::Z,
            TetrominoType::J,
            TetrominoType::L,
        ]
    }

    /// The rotation states for this kind. Every kind has at least one;
    /// rotation indices are taken modulo this slice's length.
    pub fn masks(&self) -> &'static [Mask] {
        match self {
            TetrominoType::I => &I_MASKS,
            TetrominoType::O => &O_MASKS,
            TetrominoType::T => &T_MASKS,
            TetrominoType::S => &S_MASKS,
            TetrominoType::Z => &Z_MASKS,
            TetrominoType::J => &J_MASKS,
            TetrominoType::L => &L_MASKS,
        }
    }

    /// Number of distinct rotation states for this kind
    pub fn rotation_count(&self) -> usize {
        self.masks().len()
    }
}

const I_MASKS: [Mask; 2] = [
    [
        [0, 0, 0, 0],
        [1, 1, 1, 1],
        [0, 0, 0, 0],
        [0, 0, 0, 0],
    ],
    [
        [0, 0, 1, 0],
        [0, 0, 1, 0],
        [0, 0, 1, 0],
        [0, 0, 1, 0],
    ],
];

// O piece doesn't rotate
const O_MASKS: [Mask; 1] = [[
    [0, 1, 1, 0],
    [0, 1, 1, 0],
    [0, 0, 0, 0],
    [0, 0, 0, 0],
]];

const T_MASKS: [Mask; 4] = [
    [
        [0, 1, 0, 0],
        [1, 1, 1, 0],
        [0, 0, 0, 0],
        [0, 0, 0, 0],
    ],
    [
        [0, 1, 0, 0],
        [0, 1, 1, 0],
        [0, 1, 0, 0],
        [0, 0, 0, 0],
    ],
    [
        [0, 0, 0, 0],
        [1, 1, 1, 0],
        [0, 1, 0, 0],
        [0, 0, 0, 0],
    ],
    [
        [0, 1, 0, 0],
        [1, 1, 0, 0],
        [0, 1, 0, 0],
        [0, 0, 0, 0],
    ],
];

const S_MASKS: [Mask; 2] = [
    [
        [0, 1, 1, 0],
        [1, 1, 0, 0],
        [0, 0, 0, 0],
        [0, 0, 0, 0],
    ],
    [
        [0, 1, 0, 0],
        [0, 1, 1, 0],
        [0, 0, 1, 0],
        [0, 0, 0, 0],
    ],
];

const Z_MASKS: [Mask; 2] = [
    [
        [1, 1, 0, 0],
        [0, 1, 1, 0],
        [0, 0, 0, 0],
        [0, 0, 0, 0],
    ],
    [
        [0, 0, 1, 0],
        [0, 1, 1, 0],
        [0, 1, 0, 0],
        [0, 0, 0, 0],
    ],
];

const J_MASKS: [Mask; 4] = [
    [
        [1, 0, 0, 0],
        [1, 1, 1, 0],
        [0, 0, 0, 0],
        [0, 0, 0, 0],
    ],
    [
        [0, 1, 1, 0],
        [0, 1, 0, 0],
        [0, 1, 0, 0],
        [0, 0, 0, 0],
    ],
    [
        [0, 0, 0, 0],
        [1, 1, 1, 0],
        [0, 0, 1, 0],
        [0, 0, 0, 0],
    ],
    [
        [0, 1, 0, 0],
        [0, 1, 0, 0],
        [1, 1, 0, 0],
        [0, 0, 0, 0],
    ],
];

const L_MASKS: [Mask; 4] = [
    [
        [0, 0, 1, 0],
        [1, 1, 1, 0],
        [0, 0, 0, 0],
        [0, 0, 0, 0],
    ],
    [
        [0, 1, 0, 0],
        [0, 1, 0, 0],
        [0, 1, 1, 0],
        [0, 0, 0, 0],
    ],
    [
        [0, 0, 0, 0],
        [1, 1, 1, 0],
        [1, 0, 0, 0],
        [0, 0, 0, 0],
    ],
    [
        [1, 1, 0, 0],
        [0, 1, 0, 0],
        [0, 1, 0, 0],
        [0, 0, 0, 0],
    ],
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_rotation_states() {
        for kind in TetrominoType::all() {
            assert!(kind.rotation_count() >= 1);
        }
    }

    #[test]
    fn test_every_mask_has_four_cells() {
        for kind in TetrominoType::all() {
            for mask in kind.masks() {
                let cells: u8 = mask.iter().flatten().sum();
                assert_eq!(cells, 4, "{:?} has a malformed rotation state", kind);
            }
        }
    }
}
