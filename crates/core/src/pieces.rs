//! Pieces module - Tetromino shapes and SRS kick tables
//!
//! Shapes are mino offsets inside the SRS bounding box (3x3 for JLSTZ, 4x4
//! for I). Board rows grow downward, so the kick tables below are the
//! standard SRS tables with their vertical component negated.
//! Reference: https://tetris.wiki/SRS

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use crate::types::{CellColor, Gravity, PieceKind, Rotation};

/// Offset of a single mino relative to piece origin
pub type MinoOffset = (i8, i8);

/// Shape of a piece - 4 mino offsets from piece origin
pub type PieceShape = [MinoOffset; 4];

/// Ordered kick candidates for one rotation transition
pub type KickSet = [(i8, i8); 5];

/// Get the shape (mino offsets) for a piece kind and rotation
pub fn get_shape(kind: PieceKind, rotation: Rotation) -> PieceShape {
    match kind {
        PieceKind::I => get_i_shape(rotation),
        PieceKind::O => get_o_shape(rotation),
        PieceKind::T => get_t_shape(rotation),
        PieceKind::S => get_s_shape(rotation),
        PieceKind::Z => get_z_shape(rotation),
        PieceKind::J => get_j_shape(rotation),
        PieceKind::L => get_l_shape(rotation),
    }
}

/// I piece shapes
fn get_i_shape(rotation: Rotation) -> PieceShape {
    match rotation {
        // N: horizontal, centered on row 1
        Rotation::North => [(0, 1), (1, 1), (2, 1), (3, 1)],
        // E: vertical, right-aligned
        Rotation::East => [(2, 0), (2, 1), (2, 2), (2, 3)],
        // S: horizontal, centered on row 2
        Rotation::South => [(0, 2), (1, 2), (2, 2), (3, 2)],
        // W: vertical, left-aligned
        Rotation::West => [(1, 0), (1, 1), (1, 2), (1, 3)],
    }
}

/// O piece shapes (same for all rotations)
fn get_o_shape(_rotation: Rotation) -> PieceShape {
    [(1, 0), (2, 0), (1, 1), (2, 1)]
}

/// T piece shapes
fn get_t_shape(rotation: Rotation) -> PieceShape {
    match rotation {
        Rotation::North => [(1, 0), (0, 1), (1, 1), (2, 1)],
        Rotation::East => [(1, 0), (1, 1), (2, 1), (1, 2)],
        Rotation::South => [(0, 1), (1, 1), (2, 1), (1, 2)],
        Rotation::West => [(1, 0), (0, 1), (1, 1), (1, 2)],
    }
}

/// S piece shapes
fn get_s_shape(rotation: Rotation) -> PieceShape {
    match rotation {
        Rotation::North => [(1, 0), (2, 0), (0, 1), (1, 1)],
        Rotation::East => [(1, 0), (1, 1), (2, 1), (2, 2)],
        Rotation::South => [(1, 1), (2, 1), (0, 2), (1, 2)],
        Rotation::West => [(0, 0), (0, 1), (1, 1), (1, 2)],
    }
}

/// Z piece shapes
fn get_z_shape(rotation: Rotation) -> PieceShape {
    match rotation {
        Rotation::North => [(0, 0), (1, 0), (1, 1), (2, 1)],
        Rotation::East => [(2, 0), (1, 1), (2, 1), (1, 2)],
        Rotation::South => [(0, 1), (1, 1), (1, 2), (2, 2)],
        Rotation::West => [(1, 0), (0, 1), (1, 1), (0, 2)],
    }
}

/// J piece shapes
fn get_j_shape(rotation: Rotation) -> PieceShape {
    match rotation {
        Rotation::North => [(0, 0), (0, 1), (1, 1), (2, 1)],
        Rotation::East => [(1, 0), (2, 0), (1, 1), (1, 2)],
        Rotation::South => [(0, 1), (1, 1), (2, 1), (2, 2)],
        Rotation::West => [(1, 0), (1, 1), (0, 2), (1, 2)],
    }
}

/// L piece shapes
fn get_l_shape(rotation: Rotation) -> PieceShape {
    match rotation {
        Rotation::North => [(2, 0), (0, 1), (1, 1), (2, 1)],
        Rotation::East => [(1, 0), (1, 1), (1, 2), (2, 2)],
        Rotation::South => [(0, 1), (1, 1), (2, 1), (0, 2)],
        Rotation::West => [(0, 0), (1, 0), (1, 1), (1, 2)],
    }
}

/// Active falling piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tetromino {
    pub kind: PieceKind,
    pub rotation: Rotation,
    pub x: i32,
    pub y: i32,
    /// Paint applied to the cells this piece locks into
    pub color: Option<CellColor>,
}

impl Tetromino {
    /// Create a tetromino in spawn orientation at (x, y)
    pub fn new(kind: PieceKind, x: i32, y: i32) -> Self {
        Self {
            kind,
            rotation: Rotation::North,
            x,
            y,
            color: None,
        }
    }

    /// Spawn position: centered horizontally, touching the ceiling edge for
    /// the given gravity. Pieces may poke past the ceiling.
    pub fn spawn(kind: PieceKind, width: usize, height: usize, gravity: Gravity) -> Self {
        let shape = get_shape(kind, Rotation::North);
        let x = (width as i32 - box_width(kind) as i32) / 2;
        let y = match gravity {
            Gravity::Normal => -(shape.iter().map(|&(_, dy)| dy).min().unwrap_or(0) as i32),
            Gravity::Flipped => {
                height as i32 - 1 - shape.iter().map(|&(_, dy)| dy).max().unwrap_or(0) as i32
            }
        };
        Self::new(kind, x, y)
    }

    /// Get the shape (mino offsets) for current rotation
    pub fn shape(&self) -> PieceShape {
        get_shape(self.kind, self.rotation)
    }

    /// Absolute board positions of the four minos
    pub fn cells(&self) -> ArrayVec<(i32, i32), 4> {
        self.shape()
            .iter()
            .map(|&(dx, dy)| (self.x + dx as i32, self.y + dy as i32))
            .collect()
    }

    /// Same piece moved by (dx, dy)
    pub fn shifted(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

/// Width of the piece's bounding box (used to center spawns)
pub fn box_width(kind: PieceKind) -> i8 {
    match kind {
        PieceKind::I | PieceKind::O => 4,
        _ => 3,
    }
}

/// Clockwise JLSTZ kicks, indexed by the rotation state being left.
/// 0->1, 1->2, 2->3, 3->0
const JLSTZ_KICKS: [KickSet; 4] = [
    [(0, 0), (-1, 0), (-1, -1), (0, 2), (-1, 2)],
    [(0, 0), (1, 0), (1, 1), (0, -2), (1, -2)],
    [(0, 0), (1, 0), (1, -1), (0, 2), (1, 2)],
    [(0, 0), (-1, 0), (-1, 1), (0, -2), (-1, -2)],
];

/// Clockwise I kicks, indexed the same way.
const I_KICKS: [KickSet; 4] = [
    [(0, 0), (-2, 0), (1, 0), (-2, 1), (1, -2)],
    [(0, 0), (-1, 0), (2, 0), (-1, -2), (2, 1)],
    [(0, 0), (2, 0), (-1, 0), (2, -1), (-1, 2)],
    [(0, 0), (1, 0), (-2, 0), (1, 2), (-2, -1)],
];

/// Ordered kick candidates for rotating `kind` out of `rotation`.
///
/// `direction` is `+1` for clockwise and `-1` for counter-clockwise. A
/// counter-clockwise `from->to` transition uses the clockwise `to->from` set
/// with every offset negated.
pub fn get_wall_kicks(kind: PieceKind, rotation: Rotation, direction: i8) -> KickSet {
    let table = match kind {
        PieceKind::I => &I_KICKS,
        _ => &JLSTZ_KICKS,
    };

    if direction >= 0 {
        table[rotation.index() as usize]
    } else {
        let to = rotation.rotate_ccw();
        let mut kicks = table[to.index() as usize];
        for kick in kicks.iter_mut() {
            *kick = (-kick.0, -kick.1);
        }
        kicks
    }
}

/// Human-readable transition key, e.g. `"0->1"`
pub fn kick_key(from: Rotation, direction: i8) -> String {
    format!("{}->{}", from.index(), from.rotate(direction).index())
}
