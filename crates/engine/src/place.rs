use thiserror::Error;

use crate::core::{Game, RandomSource};
use crate::types::{GameAction, Rotation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlaceError {
    #[error("hold requested when unavailable")]
    HoldUnavailable,
    #[error("could not rotate to target rotation")]
    RotationBlocked,
    #[error("target x would place piece out of bounds")]
    XOutOfBounds,
    #[error("could not move to target x due to collision")]
    XBlocked,
    #[error("game is not playable")]
    NotPlayable,
    #[error("no active piece")]
    NoActive,
}

impl PlaceError {
    pub fn code(self) -> &'static str {
        match self {
            PlaceError::HoldUnavailable => "hold_unavailable",
            PlaceError::RotationBlocked
            | PlaceError::XOutOfBounds
            | PlaceError::XBlocked
            | PlaceError::NotPlayable
            | PlaceError::NoActive => "invalid_place",
        }
    }
}

/// Move the active piece to `target_x` / `target_rot` and hard drop it.
///
/// Uses the same actions a player would. On any error the game is rolled
/// back to the state it had before the call.
pub fn apply_place<R: RandomSource + Clone>(
    game: &mut Game<R>,
    target_x: i32,
    target_rot: Rotation,
    use_hold: bool,
) -> Result<(), PlaceError> {
    let saved = game.clone();
    let result = place(game, target_x, target_rot, use_hold);
    if let Err(err) = result {
        log::debug!("place ({}, {:?}) rejected: {}", target_x, target_rot, err);
        *game = saved;
    }
    result
}

fn place<R: RandomSource + Clone>(
    game: &mut Game<R>,
    target_x: i32,
    target_rot: Rotation,
    use_hold: bool,
) -> Result<(), PlaceError> {
    if game.paused() || game.is_game_over() || game.boosters().selecting().is_some() {
        return Err(PlaceError::NotPlayable);
    }

    // Hold first if requested.
    if use_hold && !game.dispatch(GameAction::Hold) {
        return Err(PlaceError::HoldUnavailable);
    }

    let Some(active0) = game.active() else {
        return Err(PlaceError::NoActive);
    };

    let cur = active0.rotation.index() as i8;
    let tgt = target_rot.index() as i8;
    let cw = (tgt - cur).rem_euclid(4) as u8;
    let ccw = (cur - tgt).rem_euclid(4) as u8;

    // Try the shorter direction first; for 180 both are 2.
    let mut plans = [(GameAction::RotateCw, cw), (GameAction::RotateCcw, ccw)];
    if plans[1].1 < plans[0].1 {
        plans.swap(0, 1);
    }

    let before_rotation = game.clone();
    let mut rotated = false;
    for (action, steps) in plans {
        *game = before_rotation.clone();
        if (0..steps).all(|_| game.dispatch(action)) {
            rotated = true;
            break;
        }
    }
    if !rotated {
        return Err(PlaceError::RotationBlocked);
    }

    let Some(active) = game.active() else {
        return Err(PlaceError::NoActive);
    };
    if active.rotation != target_rot {
        return Err(PlaceError::RotationBlocked);
    }

    // Validate x bounds based on current shape.
    let shape = active.shape();
    let min_dx = shape.iter().map(|&(dx, _)| dx as i32).min().unwrap_or(0);
    let max_dx = shape.iter().map(|&(dx, _)| dx as i32).max().unwrap_or(0);
    if target_x + min_dx < 0 || target_x + max_dx >= game.board().width() as i32 {
        return Err(PlaceError::XOutOfBounds);
    }

    let dx = target_x - active.x;
    let step = if dx > 0 {
        GameAction::MoveRight
    } else {
        GameAction::MoveLeft
    };
    for _ in 0..dx.abs() {
        if !game.dispatch(step) {
            return Err(PlaceError::XBlocked);
        }
    }

    if !game.dispatch(GameAction::HardDrop) {
        return Err(if game.active().is_none() {
            PlaceError::NoActive
        } else {
            PlaceError::NotPlayable
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::objective::BoardGimmicks;
    use crate::core::{ObjectiveConfig, ObjectiveKind, RulesConfig};
    use crate::types::{GameMode, PieceKind};

    fn new_game() -> Game {
        Game::new(RulesConfig::default()).unwrap()
    }

    #[test]
    fn place_rejected_when_paused() {
        let mut game = new_game();
        assert!(game.dispatch(GameAction::Pause));

        let a = game.active().expect("expected active piece");
        let err = apply_place(&mut game, a.x, a.rotation, false).unwrap_err();
        assert_eq!(err, PlaceError::NotPlayable);
        assert_eq!(err.code(), "invalid_place");
    }

    #[test]
    fn place_rejected_when_x_out_of_bounds() {
        let mut game = new_game();
        let before = game.snapshot();

        let a = game.active().expect("expected active piece");
        let err = apply_place(&mut game, -50, a.rotation, false).unwrap_err();
        assert_eq!(err, PlaceError::XOutOfBounds);
        assert_eq!(game.snapshot(), before);
    }

    #[test]
    fn place_rejected_when_x_blocked_by_collision() {
        // O spawns at x = 1 (cells 2..=3); a block at (1, 0) stops it moving left.
        let config = RulesConfig {
            width: 6,
            height: 4,
            visible_height: 4,
            bag_pool: "O".to_string(),
            ..RulesConfig::default()
        };
        let layout = [".#....", "......", "......", "......"];
        let objective = ObjectiveConfig::new(ObjectiveKind::Lines, 10).with_gimmicks(BoardGimmicks {
            layout: layout.iter().map(|s| s.to_string()).collect(),
            ..BoardGimmicks::default()
        });
        let mut game = Game::new(config).unwrap();
        game.reset(GameMode::Adventure, 0, Some(objective), &[])
            .unwrap();
        let before = game.snapshot();

        let err = apply_place(&mut game, 0, Rotation::North, false).unwrap_err();
        assert_eq!(err, PlaceError::XBlocked);
        assert_eq!(game.snapshot(), before);
    }

    fn t_only() -> Game {
        Game::new(RulesConfig {
            bag_pool: "T".to_string(),
            ..RulesConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn place_with_hold_then_drop() {
        let mut game = t_only();
        let spawn_x = game.active().unwrap().x;

        apply_place(&mut game, spawn_x, Rotation::North, true).unwrap();
        assert_eq!(game.hold_piece(), Some(PieceKind::T));
        assert_eq!(game.stats().moves, 1);
        assert_eq!(game.board().filled_count(), 4);

        // Hold is available again after the lock.
        assert!(apply_place(&mut game, 0, Rotation::North, true).is_ok());
        assert_eq!(game.stats().moves, 2);
    }

    #[test]
    fn hold_unavailable_is_rolled_back() {
        let mut game = new_game();
        assert!(game.dispatch(GameAction::Hold));
        let before = game.snapshot();

        let a = game.active().unwrap();
        let err = apply_place(&mut game, a.x, a.rotation, true).unwrap_err();
        assert_eq!(err, PlaceError::HoldUnavailable);
        assert_eq!(err.code(), "hold_unavailable");
        assert_eq!(game.snapshot(), before);
    }

    #[test]
    fn place_rotates_to_target() {
        let mut game = t_only();
        let a = game.active().unwrap();
        apply_place(&mut game, a.x, Rotation::West, false).unwrap();
        assert_eq!(game.stats().moves, 1);
        assert_eq!(game.board().filled_count(), 4);
    }
}
