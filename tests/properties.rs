//! Property tests for rules that must hold for every seed and input sequence

use proptest::prelude::*;

use blockfall::core::collision::collides;
use blockfall::core::objective::{BossAbility, BossConfig, ObjectiveState};
use blockfall::core::rng::{PieceQueue, SimpleRng};
use blockfall::core::{Board, Game, ObjectiveConfig, ObjectiveKind, PiecePhase, RulesConfig};
use blockfall::types::{Cell, GameAction, Gravity, Occupant, PieceKind};

fn action(code: u8) -> GameAction {
    match code % 7 {
        0 => GameAction::MoveLeft,
        1 => GameAction::MoveRight,
        2 => GameAction::SoftDrop,
        3 => GameAction::HardDrop,
        4 => GameAction::RotateCw,
        5 => GameAction::RotateCcw,
        _ => GameAction::Hold,
    }
}

proptest! {
    #[test]
    fn every_bag_holds_each_piece_once(seed in any::<u32>(), bags in 1usize..12) {
        let mut rng = SimpleRng::new(seed);
        let mut queue = PieceQueue::new(PieceKind::ALL.to_vec(), &mut rng);

        for _ in 0..bags {
            let mut bag: Vec<PieceKind> = (0..7)
                .map(|_| queue.draw(&mut rng).unwrap())
                .collect();
            bag.sort_by_key(|k| k.as_str());
            let mut all = PieceKind::ALL.to_vec();
            all.sort_by_key(|k| k.as_str());
            prop_assert_eq!(bag, all);
        }
    }

    #[test]
    fn sweep_without_full_rows_changes_nothing(
        rows in proptest::collection::vec((any::<u16>(), 0usize..8), 10)
    ) {
        let mut board = Board::new(8, 10);
        for (y, (mask, hole)) in rows.into_iter().enumerate() {
            for x in 0..8usize {
                if x != hole && mask & (1 << x) != 0 {
                    board.set(x as i32, y as i32, Cell::filled(Occupant::Garbage));
                }
            }
        }
        let before = board.clone();
        let sweep = board.sweep_rows(None, Gravity::Normal);
        prop_assert_eq!(sweep.lines_cleared, 0);
        prop_assert_eq!(board, before);
    }

    #[test]
    fn garbage_leaves_one_hole_per_row(
        width in 4usize..14,
        lines in 1u32..6,
        seed in any::<u32>(),
        flipped in any::<bool>(),
    ) {
        let gravity = if flipped { Gravity::Flipped } else { Gravity::Normal };
        let mut board = Board::new(width, 22);
        let mut rng = SimpleRng::new(seed);

        prop_assert!(!board.add_garbage_lines(lines, gravity, &mut rng));
        prop_assert_eq!(board.filled_count(), lines as usize * (width - 1));
        prop_assert!(board.full_rows().is_empty());
    }

    #[test]
    fn boss_is_defeated_exactly_once(
        target in 1u32..3_000,
        deltas in proptest::collection::vec(0u32..1_500, 1..40),
    ) {
        let config = ObjectiveConfig::new(ObjectiveKind::Boss, target).with_boss(BossConfig {
            hp: None,
            ability: BossAbility::GarbageRain,
            interval_ms: 10_000,
        });
        let mut state = ObjectiveState::new(config).unwrap();
        let start = state.boss_hp().unwrap();
        prop_assert_eq!(start, target.div_ceil(100));

        let mut defeats = 0;
        let mut damage = 0;
        for delta in deltas {
            if state.apply_boss_damage(delta) {
                defeats += 1;
            }
            damage += delta / 100;
            let hp = state.boss_hp().unwrap();
            prop_assert_eq!(hp, start.saturating_sub(damage));
        }
        prop_assert_eq!(defeats, u32::from(damage >= start));
    }

    #[test]
    fn active_piece_never_overlaps_the_board(
        seed in 1u32..u32::MAX,
        codes in proptest::collection::vec(any::<u8>(), 1..120),
        frame in 0u32..400,
    ) {
        let mut game = Game::new(RulesConfig { seed, ..RulesConfig::default() }).unwrap();
        for code in codes {
            game.dispatch(action(code));
            game.tick(frame);
            if game.is_game_over() {
                prop_assert_eq!(game.phase(), PiecePhase::GameOver);
                break;
            }
            let piece = game.active().unwrap();
            prop_assert!(!collides(&piece, game.board(), (0, 0), game.gravity()));
        }
    }
}
