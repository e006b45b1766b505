//! Move oracles.
//!
//! An oracle looks at a request and names the best landing spot for the
//! current piece. It is advisory only; the game never applies a suggestion on
//! its own.

use crate::core::advice::{AdviceRequest, MoveSuggestion};
use crate::core::board::Board;
use crate::core::collision::{collides, drop_distance};
use crate::core::pieces::Tetromino;
use crate::types::{Cell, Gravity, Occupant, PieceKind, Rotation};

/// `bestMove(board, type)`
pub trait MoveOracle {
    fn best_move(&self, request: &AdviceRequest) -> Option<MoveSuggestion>;
}

/// Feature weights for [`HeuristicOracle`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub aggregate_height: f64,
    pub lines: f64,
    pub holes: f64,
    pub bumpiness: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            aggregate_height: 0.510066,
            lines: 0.760666,
            holes: 0.35663,
            bumpiness: 0.184483,
        }
    }
}

/// Tries every rotation and column, drops the piece, and scores the result
/// by height, cleared lines, holes and bumpiness.
#[derive(Debug, Clone, Default)]
pub struct HeuristicOracle {
    pub weights: Weights,
}

impl HeuristicOracle {
    pub fn new(weights: Weights) -> Self {
        Self { weights }
    }

    fn evaluate(&self, board: &Board, piece: &Tetromino, gravity: Gravity) -> f64 {
        let mut after = board.clone();
        after.lock_cells(&piece.cells(), Occupant::Piece(piece.kind), None);
        let lines = after.sweep_rows(None, gravity).lines_cleared;

        let (heights, holes) = column_profile(&after, gravity);
        let aggregate: usize = heights.iter().sum();
        let bumpiness: usize = heights.windows(2).map(|w| w[0].abs_diff(w[1])).sum();

        self.weights.lines * lines as f64
            - self.weights.aggregate_height * aggregate as f64
            - self.weights.holes * holes as f64
            - self.weights.bumpiness * bumpiness as f64
    }
}

impl MoveOracle for HeuristicOracle {
    fn best_move(&self, request: &AdviceRequest) -> Option<MoveSuggestion> {
        let board = board_from_request(request)?;
        let gravity = request.gravity;
        let spawn = Tetromino::spawn(request.piece, request.width, request.height, gravity);

        let rotations: &[Rotation] = if request.piece == PieceKind::O {
            &[Rotation::North]
        } else {
            &[
                Rotation::North,
                Rotation::East,
                Rotation::South,
                Rotation::West,
            ]
        };

        let mut best: Option<MoveSuggestion> = None;
        for &rotation in rotations {
            for x in -3..request.width as i32 {
                let piece = Tetromino {
                    rotation,
                    x,
                    ..spawn
                };
                if collides(&piece, &board, (0, 0), gravity) {
                    continue;
                }
                let distance = drop_distance(&piece, &board, gravity);
                let landed = piece.shifted(0, distance * gravity.dir() as i32);
                let score = self.evaluate(&board, &landed, gravity);
                if best.map_or(true, |b| score > b.score) {
                    best = Some(MoveSuggestion {
                        rotation,
                        x,
                        y: landed.y,
                        score,
                    });
                }
            }
        }
        best
    }
}

/// Rebuild a board from the request's code grid
fn board_from_request(request: &AdviceRequest) -> Option<Board> {
    if request.width == 0
        || request.board.len() != request.height
        || request.board.iter().any(|row| row.len() != request.width)
    {
        log::warn!(
            "advice request for turn {} has a malformed board",
            request.turn_id
        );
        return None;
    }

    let cells = request
        .board
        .iter()
        .flatten()
        .map(|&code| match code {
            0 => Cell::EMPTY,
            1..=7 => Cell::filled(Occupant::Piece(PieceKind::ALL[code as usize - 1])),
            _ => Cell::filled(Occupant::Garbage),
        })
        .collect();
    Some(Board::from_parts(request.width, request.height, cells, 0))
}

/// Column heights measured from the floor, and the number of covered holes
fn column_profile(board: &Board, gravity: Gravity) -> (Vec<usize>, usize) {
    let height = board.height();
    let mut heights = vec![0; board.width()];
    let mut holes = 0;

    for (x, column_height) in heights.iter_mut().enumerate() {
        let mut covered = false;
        // Walk from the ceiling toward the floor.
        for step in 0..height {
            let y = match gravity {
                Gravity::Normal => step,
                Gravity::Flipped => height - 1 - step,
            };
            let filled = !board.is_clear_at(x as i32, y as i32);
            if filled && !covered {
                covered = true;
                *column_height = height - step;
            } else if !filled && covered {
                holes += 1;
            }
        }
    }
    (heights, holes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(piece: PieceKind, board: Vec<Vec<u8>>, gravity: Gravity) -> AdviceRequest {
        AdviceRequest {
            turn_id: 7,
            width: board[0].len(),
            height: board.len(),
            board,
            piece,
            hold: None,
            next: Vec::new(),
            gravity,
        }
    }

    fn suggested_cells(kind: PieceKind, s: &MoveSuggestion) -> Vec<(i32, i32)> {
        Tetromino {
            kind,
            rotation: s.rotation,
            x: s.x,
            y: s.y,
            color: None,
        }
        .cells()
        .to_vec()
    }

    #[test]
    fn test_finds_the_tetris_well() {
        let mut board = vec![vec![0u8; 4]; 2];
        board.extend(std::iter::repeat(vec![8, 8, 8, 0]).take(4));
        let req = request(PieceKind::I, board, Gravity::Normal);

        let best = HeuristicOracle::default().best_move(&req).unwrap();
        let cells = suggested_cells(PieceKind::I, &best);
        assert!(cells.iter().all(|&(x, _)| x == 3));
        assert!(best.score > 0.0);
    }

    #[test]
    fn test_flipped_gravity_lands_on_row_zero() {
        let board = vec![vec![0u8; 6]; 6];
        let req = request(PieceKind::O, board, Gravity::Flipped);

        let best = HeuristicOracle::default().best_move(&req).unwrap();
        let cells = suggested_cells(PieceKind::O, &best);
        assert_eq!(cells.iter().map(|c| c.1).min(), Some(0));
    }

    #[test]
    fn test_malformed_board_gives_no_advice() {
        let mut req = request(PieceKind::T, vec![vec![0u8; 5]; 5], Gravity::Normal);
        req.board[2].pop();
        assert!(HeuristicOracle::default().best_move(&req).is_none());
    }

    #[test]
    fn test_column_profile_counts_holes() {
        let mut board = Board::new(3, 4);
        board.set(1, 1, Cell::filled(Occupant::Garbage));
        board.set(1, 3, Cell::filled(Occupant::Garbage));
        let (heights, holes) = column_profile(&board, Gravity::Normal);
        assert_eq!(heights, vec![0, 3, 0]);
        assert_eq!(holes, 1);
    }
}
