use criterion::{black_box, criterion_group, criterion_main, Criterion};
use blockfall::core::board::Board;
use blockfall::core::collision::{collides, try_rotate};
use blockfall::core::{Game, RulesConfig, Tetromino};
use blockfall::types::{Cell, GameAction, Gravity, Occupant, PieceKind};

fn bench_tick(c: &mut Criterion) {
    let mut game = Game::new(RulesConfig::default()).unwrap();

    c.bench_function("game_tick_16ms", |b| {
        b.iter(|| {
            game.tick(black_box(16));
            if game.is_game_over() {
                game.reset(game.mode(), 0, None, &[]).unwrap();
            }
        })
    });
}

fn bench_line_clear(c: &mut Criterion) {
    c.bench_function("clear_4_lines", |b| {
        b.iter(|| {
            let mut board = Board::new(11, 22);
            // Fill bottom 4 rows
            for y in 18..22 {
                for x in 0..11 {
                    board.set(x, y, Cell::filled(Occupant::Piece(PieceKind::I)));
                }
            }
            board.sweep_rows(None, Gravity::Normal)
        })
    });
}

fn bench_hard_drop(c: &mut Criterion) {
    let mut game = Game::new(RulesConfig::default()).unwrap();

    c.bench_function("hard_drop_and_spawn", |b| {
        b.iter(|| {
            game.dispatch(GameAction::HardDrop);
            if game.is_game_over() {
                game.reset(game.mode(), 0, None, &[]).unwrap();
            }
        })
    });
}

fn bench_try_move(c: &mut Criterion) {
    let board = Board::new(11, 22);
    let piece = Tetromino::spawn(PieceKind::T, 11, 22, Gravity::Normal);

    c.bench_function("try_move", |b| {
        b.iter(|| collides(black_box(&piece), &board, (1, 0), Gravity::Normal))
    });
}

fn bench_try_rotate(c: &mut Criterion) {
    let board = Board::new(11, 22);
    let piece = Tetromino::spawn(PieceKind::T, 11, 22, Gravity::Normal);

    c.bench_function("try_rotate", |b| {
        b.iter(|| try_rotate(black_box(&piece), &board, 1, Gravity::Normal))
    });
}

criterion_group!(
    benches,
    bench_tick,
    bench_line_clear,
    bench_hard_drop,
    bench_try_move,
    bench_try_rotate
);
criterion_main!(benches);
