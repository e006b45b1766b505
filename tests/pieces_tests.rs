//! Pieces module tests - shapes, kick tables and rotation through the public API

use blockfall::core::collision::{collides, try_rotate};
use blockfall::core::pieces::{box_width, get_shape, get_wall_kicks, kick_key, Tetromino};
use blockfall::core::Board;
use blockfall::types::{Cell, Gravity, Occupant, PieceKind, Rotation};

fn garbage() -> Cell {
    Cell::filled(Occupant::Garbage)
}

// ============== Shape Tests ==============

#[test]
fn test_i_piece_shapes() {
    assert_eq!(
        get_shape(PieceKind::I, Rotation::North),
        [(0, 1), (1, 1), (2, 1), (3, 1)]
    );
    assert_eq!(
        get_shape(PieceKind::I, Rotation::East),
        [(2, 0), (2, 1), (2, 2), (2, 3)]
    );
    assert_eq!(
        get_shape(PieceKind::I, Rotation::South),
        [(0, 2), (1, 2), (2, 2), (3, 2)]
    );
    assert_eq!(
        get_shape(PieceKind::I, Rotation::West),
        [(1, 0), (1, 1), (1, 2), (1, 3)]
    );
}

#[test]
fn test_o_piece_is_rotation_invariant() {
    let north = get_shape(PieceKind::O, Rotation::North);
    for rotation in [Rotation::East, Rotation::South, Rotation::West] {
        assert_eq!(get_shape(PieceKind::O, rotation), north);
    }
}

#[test]
fn test_t_piece_north_points_up() {
    assert_eq!(
        get_shape(PieceKind::T, Rotation::North),
        [(1, 0), (0, 1), (1, 1), (2, 1)]
    );
    assert_eq!(
        get_shape(PieceKind::T, Rotation::South),
        [(0, 1), (1, 1), (2, 1), (1, 2)]
    );
}

#[test]
fn test_all_shapes_fit_their_box() {
    for kind in PieceKind::ALL {
        let size = box_width(kind);
        for rotation in [
            Rotation::North,
            Rotation::East,
            Rotation::South,
            Rotation::West,
        ] {
            for (dx, dy) in get_shape(kind, rotation) {
                assert!((0..size).contains(&dx), "{:?} {:?}", kind, rotation);
                assert!((0..size).contains(&dy), "{:?} {:?}", kind, rotation);
            }
        }
    }
}

// ============== Kick Table Tests ==============

#[test]
fn test_jlstz_share_kicks() {
    let t = get_wall_kicks(PieceKind::T, Rotation::North, 1);
    for kind in [PieceKind::J, PieceKind::L, PieceKind::S, PieceKind::Z] {
        assert_eq!(get_wall_kicks(kind, Rotation::North, 1), t);
    }
    assert_ne!(get_wall_kicks(PieceKind::I, Rotation::North, 1), t);
}

#[test]
fn test_ccw_from_east_is_negated_cw_into_east() {
    assert_eq!(
        get_wall_kicks(PieceKind::T, Rotation::East, -1),
        [(0, 0), (1, 0), (1, 1), (0, -2), (1, -2)]
    );
    assert_eq!(kick_key(Rotation::East, -1), "1->0");
    assert_eq!(kick_key(Rotation::West, 1), "3->0");
}

// ============== Rotation Tests ==============

#[test]
fn test_rotate_in_open_space_keeps_position() {
    let board = Board::new(11, 22);
    let piece = Tetromino::new(PieceKind::T, 4, 10);
    let rotated = try_rotate(&piece, &board, 1, Gravity::Normal).unwrap();
    assert_eq!(rotated.rotation, Rotation::East);
    assert_eq!((rotated.x, rotated.y), (4, 10));

    let back = try_rotate(&rotated, &board, -1, Gravity::Normal).unwrap();
    assert_eq!(back, piece);
}

#[test]
fn test_i_kicks_off_left_wall() {
    let board = Board::new(10, 20);
    // Vertical I hugging the left wall.
    let piece = Tetromino {
        rotation: Rotation::East,
        ..Tetromino::new(PieceKind::I, -2, 5)
    };
    assert!(!collides(&piece, &board, (0, 0), Gravity::Normal));

    let rotated = try_rotate(&piece, &board, 1, Gravity::Normal).unwrap();
    assert_eq!(rotated.rotation, Rotation::South);
    assert_eq!((rotated.x, rotated.y), (0, 5));
}

#[test]
fn test_flipped_gravity_mirrors_vertical_kicks() {
    let mut board = Board::new(11, 22);
    // Block the in-place rotation and the first sideways kick.
    board.set(5, 12, garbage());
    board.set(4, 12, garbage());
    let piece = Tetromino::new(PieceKind::T, 4, 10);

    let normal = try_rotate(&piece, &board, 1, Gravity::Normal).unwrap();
    assert_eq!(normal.rotation, Rotation::East);
    assert_eq!((normal.x, normal.y), (3, 9));

    // The same kick mirrored lands on the garbage, so the next one wins.
    let flipped = try_rotate(&piece, &board, 1, Gravity::Flipped).unwrap();
    assert_eq!(flipped.rotation, Rotation::East);
    assert_eq!((flipped.x, flipped.y), (4, 8));
}

#[test]
fn test_rotate_fails_when_every_kick_collides() {
    let mut board = Board::new(4, 4);
    for y in 0..4 {
        for x in 0..4 {
            board.set(x, y, garbage());
        }
    }
    let piece = Tetromino::new(PieceKind::T, 0, 1);
    assert!(try_rotate(&piece, &board, 1, Gravity::Normal).is_none());
}

#[test]
fn test_spawn_positions() {
    let normal = Tetromino::spawn(PieceKind::T, 11, 22, Gravity::Normal);
    assert_eq!((normal.x, normal.y), (4, 0));
    assert_eq!(normal.rotation, Rotation::North);

    // I's minos sit in the second row of its box.
    let i = Tetromino::spawn(PieceKind::I, 11, 22, Gravity::Normal);
    assert_eq!((i.x, i.y), (3, -1));

    let flipped = Tetromino::spawn(PieceKind::T, 11, 22, Gravity::Flipped);
    let max_y = flipped.cells().iter().map(|c| c.1).max();
    assert_eq!(max_y, Some(21));
}
