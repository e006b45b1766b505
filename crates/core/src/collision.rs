//! Collision and kick resolution
//!
//! Pure functions over a piece and a board. Nothing here mutates state: the
//! lifecycle machine asks, then commits.

use crate::board::Board;
use crate::pieces::{get_wall_kicks, kick_key, Tetromino};
use crate::types::{Gravity, PieceKind};

/// T piece corner offsets inside its 3x3 box
const T_CORNERS: [(i32, i32); 4] = [(0, 0), (2, 0), (0, 2), (2, 2)];

/// Is `y` beyond the floor edge for this gravity?
#[inline]
fn past_floor(board: &Board, y: i32, gravity: Gravity) -> bool {
    match gravity {
        Gravity::Normal => y >= board.height() as i32,
        Gravity::Flipped => y < 0,
    }
}

/// Is `y` beyond the ceiling edge (spawn overhang) for this gravity?
#[inline]
fn past_ceiling(board: &Board, y: i32, gravity: Gravity) -> bool {
    match gravity {
        Gravity::Normal => y < 0,
        Gravity::Flipped => y >= board.height() as i32,
    }
}

/// Does `piece`, moved by `offset`, overlap a wall, the floor, or a non-clear cell?
///
/// Cells past the ceiling never collide, so pieces can spawn partly off-board.
pub fn collides(piece: &Tetromino, board: &Board, offset: (i32, i32), gravity: Gravity) -> bool {
    piece.cells().iter().any(|&(cx, cy)| {
        let x = cx + offset.0;
        let y = cy + offset.1;
        if x < 0 || x >= board.width() as i32 {
            return true;
        }
        if past_floor(board, y, gravity) {
            return true;
        }
        if past_ceiling(board, y, gravity) {
            return false;
        }
        !board.is_clear_at(x, y)
    })
}

/// Resting on something: one more step toward the floor would collide
pub fn is_grounded(piece: &Tetromino, board: &Board, gravity: Gravity) -> bool {
    collides(piece, board, (0, gravity.dir() as i32), gravity)
}

/// How many cells the piece can fall before it lands
pub fn drop_distance(piece: &Tetromino, board: &Board, gravity: Gravity) -> i32 {
    let step = gravity.dir() as i32;
    let mut distance = 0;
    while !collides(piece, board, (0, (distance + 1) * step), gravity) {
        distance += 1;
        // A piece can't fall further than the board is tall.
        if distance > board.height() as i32 * 2 {
            break;
        }
    }
    distance
}

/// Try every kick for a rotation in order and return the first placement that fits.
///
/// `direction` is `+1` (clockwise) or `-1`. Under flipped gravity the vertical
/// component of each kick is mirrored so floor kicks still push away from the
/// floor. `None` means every candidate collided; the caller keeps its piece.
pub fn try_rotate(
    piece: &Tetromino,
    board: &Board,
    direction: i8,
    gravity: Gravity,
) -> Option<Tetromino> {
    let rotated = Tetromino {
        rotation: piece.rotation.rotate(direction),
        ..*piece
    };

    let kicked = get_wall_kicks(piece.kind, piece.rotation, direction)
        .iter()
        .map(|&(dx, dy)| (dx as i32, dy as i32 * gravity.dir() as i32))
        .find(|&offset| !collides(&rotated, board, offset, gravity))
        .map(|(dx, dy)| rotated.shifted(dx, dy));
    if kicked.is_none() {
        log::trace!(
            "{:?} rotation {} blocked at ({}, {})",
            piece.kind,
            kick_key(piece.rotation, direction),
            piece.x,
            piece.y
        );
    }
    kicked
}

/// Three-corner T-spin test.
///
/// A corner of the T's 3x3 box counts as occupied when it is off the side
/// walls, past the floor, or on a non-clear cell. True iff at least 3 of 4.
/// The caller is responsible for only asking right after a rotation.
pub fn is_t_spin(piece: &Tetromino, board: &Board, gravity: Gravity) -> bool {
    if piece.kind != PieceKind::T {
        return false;
    }

    let occupied = T_CORNERS
        .iter()
        .filter(|&&(cx, cy)| {
            let x = piece.x + cx;
            let y = piece.y + cy;
            if x < 0 || x >= board.width() as i32 || past_floor(board, y, gravity) {
                return true;
            }
            if past_ceiling(board, y, gravity) {
                return false;
            }
            !board.is_clear_at(x, y)
        })
        .count();

    occupied >= 3
}
