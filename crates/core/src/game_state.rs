//! Game state module - the piece lifecycle state machine
//!
//! [`Game`] ties the rules together: it owns the board, the active piece and
//! its timers, and drives scoring, objectives and boosters. A driver calls
//! [`Game::tick`] once per frame and [`Game::dispatch`] for each input, then
//! drains the [`Effect`] records the call produced.
//!
//! Everything happens synchronously inside those calls. Soft blocks next to
//! a cleared row crumble right after each sweep. Effects that must wait until
//! the sweep has finished (laser rows, nukes, drills) go on an internal queue
//! that is drained at a fixed point:
//!
//! ```text
//! lock:  t-spin test -> write piece -> tick bombs -> sweep -> score
//!        -> drain queue -> detonate -> garbage -> victory/loss -> spawn -> powerup
//! tick:  clock -> timers -> boss -> gravity/lock delay -> drain queue -> objectives
//! ```

use std::collections::VecDeque;

use crate::advice::{AdviceRequest, AdviceResponse, AdviceSlot, MoveSuggestion};
use crate::board::{Board, SweepResult};
use crate::booster::{BoosterKind, BoosterSet};
use crate::collision::{collides, drop_distance, is_grounded, is_t_spin, try_rotate};
use crate::config::RulesConfig;
use crate::error::{ConfigError, LoadError};
use crate::objective::{apply_gimmicks, BossAbility, ObjectiveConfig, ObjectiveState};
use crate::pieces::Tetromino;
use crate::rng::{PieceQueue, RandomSource, SimpleRng};
use crate::scoring::{calculate_drop_score, ClearOutcome, ScoreKeeper, Stats};
use crate::snapshot::{GameSnapshot, PiecePhase, TimersSnapshot};
use crate::types::*;

/// Board mutation scheduled until the current sweep is done
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    /// Clear whatever row is at the floor edge when drained
    Laser,
    Nuke,
    Drill { x: usize },
}

/// A complete session
#[derive(Debug, Clone)]
pub struct Game<R: RandomSource = SimpleRng> {
    config: RulesConfig,
    rng: R,
    board: Board,
    queue: PieceQueue,
    active: Option<Tetromino>,
    hold: Option<PieceKind>,
    can_hold: bool,
    phase: PiecePhase,
    mode: GameMode,
    gravity: Gravity,
    stats: Stats,
    scorer: ScoreKeeper,
    objective: ObjectiveState,
    boosters: BoosterSet,
    timers: TimersSnapshot,
    last_move_was_rotation: bool,
    paused: bool,
    outcome: Option<SessionOutcome>,
    wildcard_armed: bool,
    deferred: VecDeque<Deferred>,
    effects: Vec<Effect>,
    advice: AdviceSlot,
}

impl Game<SimpleRng> {
    /// Create a Marathon session seeded from `config.seed`
    pub fn new(config: RulesConfig) -> Result<Self, ConfigError> {
        let rng = SimpleRng::new(config.seed);
        Self::with_rng(config, rng)
    }

    /// Full serializable state, RNG included
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            config: self.config.clone(),
            mode: self.mode,
            rng_state: self.rng.state(),
            width: self.board.width(),
            height: self.board.height(),
            cells: self.board.cells().to_vec(),
            pending_garbage: self.board.pending_garbage(),
            queue: self.queue.queued(),
            active: self.active,
            hold: self.hold,
            can_hold: self.can_hold,
            phase: self.phase,
            gravity: self.gravity,
            stats: self.stats.clone(),
            scorer: self.scorer.clone(),
            objective: self.objective.clone(),
            boosters: self.boosters.clone(),
            timers: self.timers,
            last_move_was_rotation: self.last_move_was_rotation,
            paused: self.paused,
            outcome: self.outcome,
            wildcard_armed: self.wildcard_armed,
            advice: self.advice.clone(),
        }
    }

    /// Rebuild a session from a snapshot.
    ///
    /// Nothing is partially applied: any inconsistency is a [`LoadError`]
    /// and the caller should start a fresh session instead.
    pub fn restore(snapshot: GameSnapshot) -> Result<Self, LoadError> {
        let pool = snapshot.config.validate()?;

        if snapshot.width != snapshot.config.width
            || snapshot.height != snapshot.config.height
            || snapshot.cells.len() != snapshot.width * snapshot.height
        {
            return Err(LoadError::InconsistentDimensions {
                width: snapshot.width,
                height: snapshot.height,
                cells: snapshot.cells.len(),
            });
        }

        if let Some(index) = snapshot
            .cells
            .iter()
            .position(|c| c.is_clear() != c.occupant().is_none())
        {
            return Err(LoadError::InvalidCell { index });
        }

        let rng = SimpleRng::from_state(snapshot.rng_state)
            .ok_or(LoadError::InvalidSeed(snapshot.rng_state))?;

        let board = Board::from_parts(
            snapshot.width,
            snapshot.height,
            snapshot.cells,
            snapshot.pending_garbage,
        );

        if let Some(piece) = snapshot.active {
            if collides(&piece, &board, (0, 0), snapshot.gravity) {
                return Err(LoadError::InvalidPiece {
                    x: piece.x,
                    y: piece.y,
                });
            }
        }

        Ok(Self {
            config: snapshot.config,
            rng,
            board,
            queue: PieceQueue::from_parts(pool, snapshot.queue),
            active: snapshot.active,
            hold: snapshot.hold,
            can_hold: snapshot.can_hold,
            phase: snapshot.phase,
            mode: snapshot.mode,
            gravity: snapshot.gravity,
            stats: snapshot.stats,
            scorer: snapshot.scorer,
            objective: snapshot.objective,
            boosters: snapshot.boosters,
            timers: snapshot.timers,
            last_move_was_rotation: snapshot.last_move_was_rotation,
            paused: snapshot.paused,
            outcome: snapshot.outcome,
            wildcard_armed: snapshot.wildcard_armed,
            deferred: VecDeque::new(),
            effects: Vec::new(),
            advice: snapshot.advice,
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        self.snapshot().to_json()
    }

    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        Self::restore(GameSnapshot::from_json(json)?)
    }
}

impl<R: RandomSource> Game<R> {
    /// Create a Marathon session drawing randomness from `rng`
    pub fn with_rng(config: RulesConfig, rng: R) -> Result<Self, ConfigError> {
        let pool = config.validate()?;
        let board = Board::new(config.width, config.height);
        let mut game = Self {
            config,
            rng,
            board,
            queue: PieceQueue::from_parts(pool, Vec::new()),
            active: None,
            hold: None,
            can_hold: true,
            phase: PiecePhase::Spawning,
            mode: GameMode::Marathon,
            gravity: Gravity::Normal,
            stats: Stats::default(),
            scorer: ScoreKeeper::new(GameMode::Marathon, 0),
            objective: ObjectiveState::none(),
            boosters: BoosterSet::default(),
            timers: TimersSnapshot::default(),
            last_move_was_rotation: false,
            paused: false,
            outcome: None,
            wildcard_armed: false,
            deferred: VecDeque::new(),
            effects: Vec::new(),
            advice: AdviceSlot::default(),
        };
        game.reset(GameMode::Marathon, 0, None, &[])?;
        Ok(game)
    }

    /// Start a new session.
    ///
    /// Configuration problems are reported before anything changes.
    pub fn reset(
        &mut self,
        mode: GameMode,
        level: u32,
        objective: Option<ObjectiveConfig>,
        boosters: &[BoosterKind],
    ) -> Result<(), ConfigError> {
        let pool = self.config.validate()?;
        let objective = match objective {
            Some(config) => ObjectiveState::new(config)?,
            None => ObjectiveState::none(),
        };
        let mut board = Board::new(self.config.width, self.config.height);
        if let Some(config) = objective.config() {
            apply_gimmicks(&mut board, &config.gimmicks, Gravity::Normal, &mut self.rng)?;
        }

        self.queue = PieceQueue::new(pool, &mut self.rng);
        self.board = board;
        self.active = None;
        self.hold = None;
        self.can_hold = true;
        self.phase = PiecePhase::Spawning;
        self.mode = mode;
        self.gravity = Gravity::Normal;
        self.stats = Stats::new(level);
        self.scorer = ScoreKeeper::new(mode, level);
        self.objective = objective;
        self.boosters = BoosterSet::new(boosters);
        self.timers = TimersSnapshot::default();
        self.last_move_was_rotation = false;
        self.paused = false;
        self.outcome = None;
        self.wildcard_armed = false;
        self.deferred.clear();
        self.effects.clear();
        self.advice = AdviceSlot::default();

        log::info!(
            "session reset: mode={} level={} objective={:?} boosters={:?}",
            mode.as_str(),
            level,
            self.objective.config().map(|c| c.kind),
            boosters
        );

        self.spawn_piece();
        self.effects.push(Effect::StatsChanged);
        Ok(())
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    #[cfg(test)]
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn active(&self) -> Option<Tetromino> {
        self.active
    }

    pub fn hold_piece(&self) -> Option<PieceKind> {
        self.hold
    }

    pub fn can_hold(&self) -> bool {
        self.can_hold || self.boosters.is_active(BoosterKind::InfiniteHold)
    }

    pub fn phase(&self) -> PiecePhase {
        self.phase
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn gravity(&self) -> Gravity {
        self.gravity
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn objective(&self) -> &ObjectiveState {
        &self.objective
    }

    pub fn boosters(&self) -> &BoosterSet {
        &self.boosters
    }

    pub fn timers(&self) -> TimersSnapshot {
        self.timers
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn outcome(&self) -> Option<SessionOutcome> {
        self.outcome
    }

    pub fn is_game_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn frenzy_active(&self) -> bool {
        self.scorer.frenzy_active()
    }

    pub fn wildcard_armed(&self) -> bool {
        self.wildcard_armed
    }

    /// Upcoming pieces, as many as the preview length
    pub fn next_queue(&self) -> Vec<PieceKind> {
        self.queue.peek_queue(self.config.preview_len)
    }

    /// Where the active piece would land
    pub fn ghost_position(&self) -> Option<Tetromino> {
        let piece = self.active?;
        let distance = drop_distance(&piece, &self.board, self.gravity);
        Some(piece.shifted(0, distance * self.gravity.dir() as i32))
    }

    /// Current gravity interval, temporary effects included
    pub fn drop_interval_ms(&self) -> u32 {
        let mut interval = self.scorer.base_drop_interval_ms(&self.stats);
        if self.boosters.is_active(BoosterKind::SlowTime) {
            interval = interval.saturating_mul(2);
        }
        if self.timers.slow_ms > 0 {
            interval = interval.saturating_mul(2);
        }
        if self.timers.surge_ms > 0 {
            interval /= 2;
        }
        interval.max(1)
    }

    /// Take every effect emitted since the last drain, in order
    pub fn drain_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    /// Apply a player action. Rejected actions return false and change nothing.
    pub fn dispatch(&mut self, action: GameAction) -> bool {
        if self.outcome.is_some() {
            return false;
        }
        if action == GameAction::Pause {
            self.paused = !self.paused;
            return true;
        }
        if self.paused || self.boosters.selecting().is_some() {
            return false;
        }

        match action {
            GameAction::MoveLeft => self.try_move(-1),
            GameAction::MoveRight => self.try_move(1),
            GameAction::SoftDrop => self.soft_drop(),
            GameAction::HardDrop => self.hard_drop(),
            GameAction::RotateCw => self.rotate(1),
            GameAction::RotateCcw => self.rotate(-1),
            GameAction::Hold => self.hold(),
            GameAction::Pause => false,
        }
    }

    /// Advance the session clock by `elapsed_ms`
    pub fn tick(&mut self, elapsed_ms: u32) {
        if self.paused || self.outcome.is_some() || self.boosters.selecting().is_some() {
            return;
        }

        self.stats.time_ms += elapsed_ms as u64;

        for kind in self.boosters.tick(elapsed_ms) {
            self.expire_booster(kind);
        }
        if self.scorer.tick(elapsed_ms) {
            self.effects.push(Effect::Visual(VisualCue::FrenzyEnded));
        }
        self.timers.surge_ms = self.timers.surge_ms.saturating_sub(elapsed_ms);
        self.timers.slow_ms = self.timers.slow_ms.saturating_sub(elapsed_ms);
        self.timers.freeze_ms = self.timers.freeze_ms.saturating_sub(elapsed_ms);

        if let Some(ability) = self.objective.tick_boss(elapsed_ms) {
            log::debug!("boss ability {:?}", ability);
            match ability {
                BossAbility::GarbageRain => self.board.add_garbage(1),
                BossAbility::SpeedSurge => self.timers.surge_ms = SPEED_SURGE_MS,
            }
            self.effects.push(Effect::Audio(AudioCue::BossAttack));
        }

        self.apply_gravity(elapsed_ms);
        self.drain_deferred();
        self.check_objectives(false);

        if self.outcome.is_none()
            && self.mode == GameMode::Blitz
            && self.stats.time_ms >= BLITZ_DURATION_MS as u64
        {
            self.end_session(SessionOutcome::TimeUp);
        }
    }

    /// Put `kind` at the front of the queue if a wildcard is armed
    pub fn choose_wildcard(&mut self, kind: PieceKind) -> bool {
        if !self.wildcard_armed || self.outcome.is_some() {
            return false;
        }
        self.wildcard_armed = false;
        self.queue.push_front(kind);
        true
    }

    /// Tagged request for the move advisor
    pub fn advice_request(&self) -> Option<AdviceRequest> {
        let piece = self.active?;
        Some(AdviceRequest {
            turn_id: self.advice.turn_id(),
            width: self.board.width(),
            height: self.board.height(),
            board: self.board.code_grid(),
            piece: piece.kind,
            hold: self.hold,
            next: self.next_queue(),
            gravity: self.gravity,
        })
    }

    /// Store an advisor answer unless it was computed for an older turn
    pub fn accept_advice(&mut self, response: &AdviceResponse) -> bool {
        self.advice.accept(response)
    }

    pub fn current_advice(&self) -> Option<MoveSuggestion> {
        self.advice.current()
    }

    pub fn turn_id(&self) -> u64 {
        self.advice.turn_id()
    }

    // ----- boosters -----

    /// Start a booster. Selection boosters enter selection mode instead.
    pub fn activate_booster(&mut self, kind: BoosterKind) -> bool {
        if self.outcome.is_some() || self.paused {
            return false;
        }
        if kind.is_selection() {
            return self.activate_booster_selection(kind);
        }
        if !self.boosters.activate(kind) {
            return false;
        }

        log::debug!("booster {:?} activated", kind);
        self.effects.push(Effect::Audio(AudioCue::Booster));
        match kind {
            BoosterKind::FlipGravity => self.set_gravity(self.gravity.flipped()),
            BoosterKind::InfiniteHold => self.can_hold = true,
            _ => {}
        }
        true
    }

    /// Enter the modal target selection for a row-clearing booster
    pub fn activate_booster_selection(&mut self, kind: BoosterKind) -> bool {
        if self.outcome.is_some() || self.paused {
            return false;
        }
        let started = self.boosters.begin_selection(kind);
        if started {
            log::debug!("booster {:?} selecting", kind);
        }
        started
    }

    /// Fire the selected booster at `row`.
    ///
    /// An out-of-range row fizzles: selection ends, the booster stays armed.
    pub fn confirm_booster_selection(&mut self, row: i32) -> bool {
        let Some(kind) = self.boosters.selecting() else {
            return false;
        };
        if row < 0 || row as usize >= self.board.height() {
            log::warn!("{:?} target row {} out of range, fizzled", kind, row);
            self.boosters.cancel_selection();
            self.effects.push(Effect::Visual(VisualCue::Fizzled));
            return false;
        }
        self.boosters.confirm_selection();

        let row = row as usize;
        let last = self.board.height() - 1;
        let targets: Vec<usize> = match kind {
            BoosterKind::BombRows => {
                (row.saturating_sub(BOMB_ROWS_RADIUS)..=(row + BOMB_ROWS_RADIUS).min(last)).collect()
            }
            _ => vec![row],
        };
        let rows: Vec<usize> = targets
            .into_iter()
            .filter(|&y| {
                let cells = self.board.row(y);
                cells.iter().any(|c| !c.is_clear()) && !cells.iter().any(Cell::is_bedrock)
            })
            .collect();

        log::debug!("booster {:?} fired at row {} clearing {:?}", kind, row, rows);
        self.effects.push(Effect::Audio(AudioCue::Booster));
        if !rows.is_empty() {
            let sweep = self.board.sweep_rows(Some(&rows), self.gravity);
            self.apply_manual_sweep(&sweep);
            self.advice.advance();
        }
        self.drain_deferred();
        self.check_objectives(false);
        self.effects.push(Effect::StatsChanged);
        true
    }

    /// Leave selection mode. No other state changes.
    pub fn cancel_booster_selection(&mut self) -> bool {
        self.boosters.cancel_selection().is_some()
    }

    fn expire_booster(&mut self, kind: BoosterKind) {
        log::debug!("booster {:?} expired", kind);
        if kind == BoosterKind::FlipGravity {
            self.set_gravity(Gravity::Normal);
        }
    }

    fn set_gravity(&mut self, gravity: Gravity) {
        if self.gravity == gravity {
            return;
        }
        self.gravity = gravity;
        self.timers.drop_ms = 0;
        self.effects
            .push(Effect::Visual(VisualCue::GravityChanged { gravity }));
        self.settle_active();
        self.advice.advance();
    }

    // ----- piece lifecycle -----

    fn spawn_piece(&mut self) -> bool {
        self.phase = PiecePhase::Spawning;
        match self.queue.draw(&mut self.rng) {
            Some(kind) => self.spawn_kind(kind),
            None => {
                self.end_session(SessionOutcome::Defeat);
                false
            }
        }
    }

    fn spawn_kind(&mut self, kind: PieceKind) -> bool {
        let piece = Tetromino::spawn(kind, self.board.width(), self.board.height(), self.gravity);
        if collides(&piece, &self.board, (0, 0), self.gravity) {
            log::debug!("spawn blocked for {:?}", kind);
            self.active = None;
            let outcome = if self.mode == GameMode::Puzzle && self.board.is_empty() {
                SessionOutcome::Victory
            } else {
                SessionOutcome::Defeat
            };
            self.end_session(outcome);
            return false;
        }

        self.active = Some(piece);
        self.timers.drop_ms = 0;
        self.timers.lock_ms = 0;
        self.timers.lock_resets = 0;
        self.last_move_was_rotation = false;
        self.refresh_phase();
        self.advice.advance();
        log::debug!("spawned {:?} at ({}, {})", kind, piece.x, piece.y);
        true
    }

    /// Recompute Active/Grounded for the current piece. Returns grounded.
    fn refresh_phase(&mut self) -> bool {
        let Some(piece) = self.active else {
            return false;
        };
        let grounded = is_grounded(&piece, &self.board, self.gravity);
        self.phase = if grounded {
            PiecePhase::Grounded
        } else {
            PiecePhase::Active
        };
        grounded
    }

    /// Lock-delay bookkeeping after a successful move or rotation
    fn after_manipulation(&mut self) {
        if self.refresh_phase() {
            self.timers.lock_resets += 1;
            if self.timers.lock_resets < self.config.lock_reset_limit {
                self.timers.lock_ms = 0;
            }
        }
    }

    fn try_move(&mut self, dx: i32) -> bool {
        let Some(piece) = self.active else {
            return false;
        };
        if collides(&piece, &self.board, (dx, 0), self.gravity) {
            return false;
        }
        self.active = Some(piece.shifted(dx, 0));
        self.last_move_was_rotation = false;
        self.after_manipulation();
        self.effects.push(Effect::Audio(AudioCue::Move));
        true
    }

    fn rotate(&mut self, direction: i8) -> bool {
        let Some(piece) = self.active else {
            return false;
        };
        // O piece doesn't rotate
        if piece.kind == PieceKind::O {
            return false;
        }
        let Some(rotated) = try_rotate(&piece, &self.board, direction, self.gravity) else {
            return false;
        };
        self.active = Some(rotated);
        self.last_move_was_rotation = true;
        self.after_manipulation();
        self.effects.push(Effect::Audio(AudioCue::Rotate));
        true
    }

    fn soft_drop(&mut self) -> bool {
        let Some(piece) = self.active else {
            return false;
        };
        let dy = self.gravity.dir() as i32;
        if collides(&piece, &self.board, (0, dy), self.gravity) {
            self.refresh_phase();
            return false;
        }
        self.active = Some(piece.shifted(0, dy));
        self.last_move_was_rotation = false;
        self.timers.drop_ms = 0;
        self.timers.lock_ms = 0;
        self.scorer
            .add_points(&mut self.stats, calculate_drop_score(1, false));
        self.refresh_phase();
        self.effects.push(Effect::Audio(AudioCue::SoftDrop));
        true
    }

    /// Drop to the landing row and lock immediately
    fn hard_drop(&mut self) -> bool {
        let Some(piece) = self.active else {
            return false;
        };
        let distance = drop_distance(&piece, &self.board, self.gravity);
        if distance > 0 {
            self.active = Some(piece.shifted(0, distance * self.gravity.dir() as i32));
            self.last_move_was_rotation = false;
        }
        self.scorer
            .add_points(&mut self.stats, calculate_drop_score(distance as u32, true));
        self.effects.push(Effect::Audio(AudioCue::HardDrop));
        self.lock_piece();
        true
    }

    /// Swap with the hold slot; an empty slot pulls from the queue
    fn hold(&mut self) -> bool {
        if !self.can_hold() {
            return false;
        }
        let Some(piece) = self.active.take() else {
            return false;
        };

        let spawned = match self.hold.replace(piece.kind) {
            Some(kind) => self.spawn_kind(kind),
            None => self.spawn_piece(),
        };
        self.can_hold = false;
        self.effects.push(Effect::Audio(AudioCue::Hold));
        spawned
    }

    fn apply_gravity(&mut self, elapsed_ms: u32) {
        if self.active.is_none() || self.timers.freeze_ms > 0 {
            return;
        }

        if self.refresh_phase() {
            self.timers.lock_ms = self.timers.lock_ms.saturating_add(elapsed_ms);
            if self.timers.lock_ms >= self.config.lock_delay_ms
                || self.timers.lock_resets >= self.config.lock_reset_limit
            {
                self.lock_piece();
            }
            return;
        }

        let interval = self.drop_interval_ms();
        let step = self.gravity.dir() as i32;
        self.timers.drop_ms = self.timers.drop_ms.saturating_add(elapsed_ms);
        while self.timers.drop_ms >= interval {
            let Some(piece) = self.active else {
                break;
            };
            if collides(&piece, &self.board, (0, step), self.gravity) {
                break;
            }
            self.timers.drop_ms -= interval;
            self.active = Some(piece.shifted(0, step));
            self.timers.lock_ms = 0;
            self.last_move_was_rotation = false;
        }
        if self.refresh_phase() {
            self.timers.drop_ms = 0;
        }
    }

    /// Merge the active piece into the board and run everything that follows
    fn lock_piece(&mut self) {
        let Some(piece) = self.active.take() else {
            return;
        };
        self.phase = PiecePhase::Locked;

        let tspin = self.last_move_was_rotation && is_t_spin(&piece, &self.board, self.gravity);
        let report = self
            .board
            .lock_cells(&piece.cells(), Occupant::Piece(piece.kind), piece.color);
        self.stats.moves += 1;
        let expired = self.board.tick_bombs();
        self.effects.push(Effect::Audio(AudioCue::Lock));
        log::debug!(
            "locked {:?} at ({}, {}) tspin={} ice_cracked={} ice_broken={} bombs_expired={}",
            piece.kind,
            piece.x,
            piece.y,
            tspin,
            report.ice_cracked,
            report.ice_broken,
            expired
        );

        let sweep = self.board.sweep_rows(None, self.gravity);
        let block_multiplier = self.apply_sweep(&sweep);
        self.stats.color_matches += sweep.mono_rows;

        let lines = sweep.lines_cleared;
        let mut roll_powerup = false;
        if let Some(outcome) =
            self.scorer
                .register_clear(&mut self.stats, lines, tspin, block_multiplier)
        {
            roll_powerup = (lines == 4 && !tspin) || (tspin && lines >= 2);
            self.emit_clear(&sweep, tspin, &outcome);
            if self.objective.apply_boss_damage(outcome.awarded) {
                log::debug!("boss defeated");
            }
        }

        self.drain_deferred();
        self.check_objectives(true);

        if self.outcome.is_none() {
            self.can_hold = true;
            if self.spawn_piece() && roll_powerup {
                self.roll_powerup();
            }
        }
        self.effects.push(Effect::StatsChanged);
    }

    /// Apply the modifiers of swept rows. Returns the score multiplier they grant.
    fn apply_sweep(&mut self, sweep: &SweepResult) -> u32 {
        if sweep.lines_cleared == 0 {
            return 1;
        }
        log::debug!("swept rows {:?}", sweep.cleared_indices);
        self.crumble_neighbours(&sweep.cleared_indices);

        let scale = self.stats.level + 1;
        let mut multiplier = 1;
        for trigger in &sweep.triggers {
            match trigger.modifier {
                Modifier::Gem => {
                    self.stats.gems += 1;
                    self.award_bonus(GEM_BONUS * scale);
                    self.effects.push(Effect::Audio(AudioCue::GemCollected));
                }
                Modifier::Bomb { .. } => {
                    self.stats.bombs_defused += 1;
                    self.award_bonus(BOMB_DEFUSE_BONUS * scale);
                    self.effects.push(Effect::Audio(AudioCue::BombDefused));
                }
                Modifier::Wildcard => {
                    self.wildcard_armed = true;
                    self.effects.push(Effect::Audio(AudioCue::Powerup));
                }
                Modifier::Laser => {
                    let row = self.board.floor_row(self.gravity);
                    self.board.zone_row(row);
                    self.deferred.push_back(Deferred::Laser);
                }
                Modifier::Nuke => self.deferred.push_back(Deferred::Nuke),
                Modifier::Drill => self.deferred.push_back(Deferred::Drill { x: trigger.x }),
                Modifier::Multiplier => multiplier = 2,
                Modifier::Slow => self.timers.slow_ms = SLOW_BLOCK_MS,
                Modifier::Freeze => self.timers.freeze_ms = FREEZE_BLOCK_MS,
                Modifier::Ice { .. } | Modifier::CrackedIce { .. } | Modifier::Bedrock | Modifier::Soft => {}
            }
        }
        multiplier
    }

    /// Modifier bonus points. Like clear points, they damage the boss.
    fn award_bonus(&mut self, points: u32) {
        let awarded = self.scorer.add_points(&mut self.stats, points);
        if self.objective.apply_boss_damage(awarded) {
            log::debug!("boss defeated by bonus");
        }
    }

    /// Rows removed outside normal scoring (laser, boosters)
    fn apply_manual_sweep(&mut self, sweep: &SweepResult) {
        if sweep.lines_cleared == 0 {
            return;
        }
        self.apply_sweep(sweep);
        if self
            .scorer
            .register_manual_rows(&mut self.stats, sweep.lines_cleared)
        {
            self.effects.push(Effect::Audio(AudioCue::LevelUp));
        }
        self.effects.push(Effect::Visual(VisualCue::LineClear {
            rows: sweep.cleared_indices.clone(),
        }));
    }

    /// Soft blocks next to a cleared row crumble as soon as the sweep is done,
    /// before any later sweep can move their rows
    fn crumble_neighbours(&mut self, cleared: &[usize]) {
        let height = self.board.height();
        let mut rows: Vec<usize> = cleared
            .iter()
            .flat_map(|&y| [y.checked_sub(1), Some(y + 1)])
            .flatten()
            .filter(|&y| y < height && cleared.binary_search(&y).is_err())
            .map(|y| self.swept_index(y, cleared))
            .collect();
        rows.sort_unstable();
        rows.dedup();

        let crumbled: u32 = rows.into_iter().map(|row| self.board.crumble_soft(row)).sum();
        if crumbled > 0 {
            log::debug!("{} soft blocks crumbled", crumbled);
        }
    }

    /// Where a surviving row ended up after `cleared` were swept
    fn swept_index(&self, y: usize, cleared: &[usize]) -> usize {
        match self.gravity {
            Gravity::Normal => y + cleared.iter().filter(|&&c| c > y).count(),
            Gravity::Flipped => y - cleared.iter().filter(|&&c| c < y).count(),
        }
    }

    fn drain_deferred(&mut self) {
        while let Some(effect) = self.deferred.pop_front() {
            match effect {
                Deferred::Laser => {
                    let row = self.board.floor_row(self.gravity);
                    if self.board.row(row).iter().all(Cell::is_clear) {
                        continue;
                    }
                    let sweep = self.board.sweep_rows(Some(&[row]), self.gravity);
                    self.apply_manual_sweep(&sweep);
                    self.effects
                        .push(Effect::Visual(VisualCue::LaserSweep { row }));
                    self.effects.push(Effect::Audio(AudioCue::Explosion));
                }
                Deferred::Nuke => {
                    let cleared = self.board.wipe();
                    log::debug!("nuke cleared {} cells", cleared);
                    self.effects.push(Effect::Visual(VisualCue::NukeFlash));
                    self.effects.push(Effect::Audio(AudioCue::Explosion));
                }
                Deferred::Drill { x } => {
                    self.board.clear_column(x);
                    self.effects
                        .push(Effect::Visual(VisualCue::DrillColumn { x }));
                }
            }
        }
        self.settle_active();
    }

    /// Push the active piece toward the ceiling until it no longer overlaps
    fn settle_active(&mut self) {
        let Some(piece) = self.active else {
            return;
        };
        if !collides(&piece, &self.board, (0, 0), self.gravity) {
            self.refresh_phase();
            return;
        }
        let up = -(self.gravity.dir() as i32);
        for step in 1..=self.board.height() as i32 {
            if !collides(&piece, &self.board, (0, up * step), self.gravity) {
                self.active = Some(piece.shifted(0, up * step));
                self.refresh_phase();
                return;
            }
        }
        self.active = None;
        self.end_session(SessionOutcome::Defeat);
    }

    /// Detonations, pending garbage, then victory and loss
    fn check_objectives(&mut self, after_lock: bool) {
        if self.outcome.is_some() {
            return;
        }

        let blown = self.board.detonate_bombs();
        if !blown.is_empty() {
            log::debug!("{} bombs detonated", blown.len());
            for &(x, y) in &blown {
                self.effects
                    .push(Effect::Visual(VisualCue::Explosion { x, y }));
            }
            self.effects.push(Effect::Audio(AudioCue::Explosion));
            self.board.add_garbage(blown.len() as u32);
        }

        self.apply_garbage();
        if self.outcome.is_some() {
            return;
        }

        let outcome = if after_lock && self.mode == GameMode::Puzzle && self.board.is_empty() {
            Some(SessionOutcome::Victory)
        } else {
            self.objective.evaluate(&self.stats)
        };
        if let Some(outcome) = outcome {
            self.end_session(outcome);
        }
    }

    fn apply_garbage(&mut self) {
        let lines = self.board.take_pending_garbage();
        if lines == 0 {
            return;
        }
        let overflow = self
            .board
            .add_garbage_lines(lines, self.gravity, &mut self.rng);
        log::debug!("inserted {} garbage lines (overflow={})", lines, overflow);
        self.effects
            .push(Effect::Visual(VisualCue::GarbageRise { lines }));
        self.advice.advance();

        if overflow {
            self.active = None;
            self.end_session(SessionOutcome::Defeat);
            return;
        }
        self.settle_active();
    }

    fn roll_powerup(&mut self) {
        let blitz = self.mode == GameMode::Blitz;
        let chance = if blitz {
            POWERUP_CHANCE * 2.0
        } else {
            POWERUP_CHANCE
        };
        if !self.rng.chance(chance) {
            return;
        }

        let pool: &[Modifier] = if blitz {
            &[Modifier::Wildcard, Modifier::Laser, Modifier::Nuke]
        } else {
            &[Modifier::Wildcard, Modifier::Laser]
        };
        let modifier = pool[self.rng.next_range(pool.len() as u32) as usize];
        let exclude: Vec<(i32, i32)> = self
            .active
            .map(|p| p.cells().to_vec())
            .unwrap_or_default();

        if let Some((x, y)) = self
            .board
            .place_random_modifier(modifier, &exclude, &mut self.rng)
        {
            log::debug!("powerup {:?} at ({}, {})", modifier, x, y);
            self.effects
                .push(Effect::Visual(VisualCue::PowerupSpawned { x, y, modifier }));
            self.effects.push(Effect::Audio(AudioCue::Powerup));
        }
    }

    fn emit_clear(&mut self, sweep: &SweepResult, tspin: bool, outcome: &ClearOutcome) {
        let lines = sweep.lines_cleared;
        let result = &outcome.result;

        if lines > 0 {
            self.effects.push(Effect::Visual(VisualCue::LineClear {
                rows: sweep.cleared_indices.clone(),
            }));
        }
        let cue = if tspin {
            AudioCue::TSpin
        } else if lines == 4 {
            AudioCue::Tetris
        } else {
            AudioCue::LineClear(lines)
        };
        self.effects.push(Effect::Audio(cue));
        if result.b2b_applied {
            self.effects.push(Effect::Audio(AudioCue::BackToBack));
        }
        if lines > 0 && self.stats.combo > 0 {
            self.effects
                .push(Effect::Audio(AudioCue::Combo(self.stats.combo)));
        }
        if outcome.frenzy_started {
            self.effects.push(Effect::Visual(VisualCue::FrenzyStarted));
            self.effects.push(Effect::Audio(AudioCue::Frenzy));
        }
        if outcome.level_up || outcome.sped_up {
            self.effects.push(Effect::Audio(AudioCue::LevelUp));
        }
        if outcome.sped_up {
            log::debug!("blitz speed-up at score {}", self.stats.score);
        }
        self.effects.push(Effect::Visual(VisualCue::ScorePopup {
            text: result.text.clone(),
            score: outcome.awarded,
        }));
        self.effects.push(Effect::Visual(VisualCue::Shake {
            intensity: result.shake_intensity,
        }));
    }

    fn end_session(&mut self, outcome: SessionOutcome) {
        if self.outcome.is_some() {
            return;
        }
        self.outcome = Some(outcome);
        self.phase = PiecePhase::GameOver;
        self.deferred.clear();

        let cue = match outcome {
            SessionOutcome::Victory => AudioCue::Victory,
            _ => AudioCue::GameOver,
        };
        self.effects.push(Effect::Audio(cue));
        self.effects.push(Effect::GameOver(outcome));
        log::info!(
            "session ended: {:?} score={} rows={} time={}ms",
            outcome,
            self.stats.score,
            self.stats.rows,
            self.stats.time_ms
        );
    }
}
