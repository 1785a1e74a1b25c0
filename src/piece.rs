//! Active falling piece
//!
//! A `Piece` is an immutable value: moving or rotating produces a new one,
//! so candidates can be collision-tested before they replace the current
//! piece.

use crate::board::COLS;
use crate::tetromino::{Mask, TetrominoType};

/// A tetromino with a board position and rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    /// The type of tetromino
    pub kind: TetrominoType,
    /// Column of the 4x4 bounding box's left edge in board space.
    /// May sit out of bounds transiently while a candidate is checked.
    pub x: i32,
    /// Row of the bounding box's top edge in board space
    pub y: i32,
    /// Unbounded rotation index, normalized against the kind's state count
    pub rotation: i32,
}

impl Piece {
    /// Create a piece at the spawn position: centered, top row, unrotated
    pub fn spawn(kind: TetrominoType) -> Self {
        Self {
            kind,
            x: COLS as i32 / 2 - 2,
            y: 0,
            rotation: 0,
        }
    }

    /// The occupancy grid for the current rotation state
    pub fn mask(&self) -> &'static Mask {
        let count = self.kind.rotation_count() as i32;
        &self.kind.masks()[self.rotation.rem_euclid(count) as usize]
    }

    /// The same piece translated by (dx, dy)
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// The same piece with the rotation index advanced by `delta`
    pub fn rotated(&self, delta: i32) -> Self {
        Self {
            rotation: self.rotation + delta,
            ..*self
        }
    }

    /// Board-space (x, y) of every occupied cell of the current mask
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> {
        let mask = self.mask();
        let (x, y) = (self.x, self.y);
        (0..4).flat_map(move |r| {
            (0..4).filter_map(move |c| {
                (mask[r][c] != 0).then_some((x + c as i32, y + r as i32))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_position() {
        let piece = Piece::spawn(TetrominoType::T);
        // Bounding box centered on a 10-wide board
        assert_eq!(piece.x, 3);
        assert_eq!(piece.y, 0);
        assert_eq!(piece.rotation, 0);
    }

    #[test]
    fn test_cells_count() {
        for kind in TetrominoType::all() {
            let piece = Piece::spawn(kind);
            assert_eq!(piece.cells().count(), 4);
        }
    }

    #[test]
    fn test_rotation_wraps() {
        let piece = Piece::spawn(TetrominoType::T);
        let full_turn = piece.rotated(4);
        assert_eq!(piece.mask(), full_turn.mask());
    }

    #[test]
    fn test_negative_rotation() {
        let piece = Piece::spawn(TetrominoType::J);
        // -1 lands on the last of the 4 J states
        assert_eq!(piece.rotated(-1).mask(), piece.rotated(3).mask());
    }

    #[test]
    fn test_translated_is_a_new_value() {
        let piece = Piece::spawn(TetrominoType::I);
        let moved = piece.translated(1, 2);
        assert_eq!(piece.x, 3);
        assert_eq!(moved.x, 4);
        assert_eq!(moved.y, 2);
    }
}
