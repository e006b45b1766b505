//! Headless autoplay runner (default binary).
//!
//! Plays one session with the heuristic advisor choosing every placement,
//! advancing the clock one frame per piece, then prints the final stats.
//!
//! Usage: `blockfall [marathon|blitz|puzzle|adventure] [max_pieces]`
//! Board and bag settings come from `BLOCKFALL_*` environment variables.

use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use blockfall::advisor::{AdvisorWorker, HeuristicOracle};
use blockfall::core::{Game, RulesConfig};
use blockfall::engine::apply_place;
use blockfall::types::{Effect, GameAction, GameMode};

const FRAME_MS: u32 = 16;
const DEFAULT_MAX_PIECES: u32 = 500;
const ADVICE_TIMEOUT: Duration = Duration::from_secs(2);

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let mode = match args.next() {
        Some(name) => {
            GameMode::from_str(&name).with_context(|| format!("unknown mode '{}'", name))?
        }
        None => GameMode::Marathon,
    };
    let max_pieces = match args.next() {
        Some(n) => n
            .parse::<u32>()
            .with_context(|| format!("invalid piece limit '{}'", n))?,
        None => DEFAULT_MAX_PIECES,
    };

    let mut game = Game::new(RulesConfig::from_env())?;
    game.reset(mode, 0, None, &[])?;
    let mut worker = AdvisorWorker::spawn(HeuristicOracle::default())?;

    while !game.is_game_over() && game.stats().moves < max_pieces {
        let Some(request) = game.advice_request() else {
            break;
        };
        if !worker.submit(request) {
            bail!("advisor refused a request");
        }
        let Some(response) = worker.wait(ADVICE_TIMEOUT) else {
            bail!("advisor did not answer within {:?}", ADVICE_TIMEOUT);
        };

        let placed = game.accept_advice(&response)
            && match game.current_advice() {
                Some(best) => apply_place(&mut game, best.x, best.rotation, false).is_ok(),
                None => false,
            };
        if !placed {
            game.dispatch(GameAction::HardDrop);
        }

        game.tick(FRAME_MS);
        for effect in game.drain_effects() {
            if let Effect::GameOver(outcome) = effect {
                println!("session ended: {:?}", outcome);
            }
        }
    }

    let stats = game.stats();
    println!(
        "mode={} pieces={} score={} rows={} level={} tetrises={} tspins={} max_combo={}",
        mode.as_str(),
        stats.moves,
        stats.score,
        stats.rows,
        stats.level,
        stats.tetrises,
        stats.tspins,
        stats.max_combo
    );
    Ok(())
}
