//! Objective module - adventure win/loss conditions and boss timers
//!
//! An [`ObjectiveConfig`] is fixed for the whole session. The mutable parts
//! (boss HP, boss attack timer) live in [`ObjectiveState`], which is the only
//! place objective-driven victory or defeat is decided.

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::error::ConfigError;
use crate::rng::RandomSource;
use crate::scoring::Stats;
use crate::types::{
    Cell, Gravity, Modifier, Occupant, PieceKind, SessionOutcome, BOSS_DAMAGE_PER_HP,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectiveKind {
    Lines,
    Score,
    /// Survive until the session clock reaches `target` ms
    TimeSurvival,
    Gems,
    Bombs,
    Tetris,
    #[serde(rename = "TSPIN")]
    TSpin,
    Combo,
    B2bChain,
    /// Place `target` pieces
    Moves,
    Boss,
    ColorMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BossAbility {
    GarbageRain,
    SpeedSurge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossConfig {
    /// Explicit HP. Only a BOSS objective may leave it out; HP then comes
    /// from the objective target.
    #[serde(default)]
    pub hp: Option<u32>,
    pub ability: BossAbility,
    pub interval_ms: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constraints {
    pub moves_limit: Option<u32>,
    pub time_limit_ms: Option<u64>,
}

/// Board setup applied at reset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardGimmicks {
    /// Text rows stamped at the floor edge: `.` empty, `#` garbage, piece letters
    pub layout: Vec<String>,
    pub garbage_rows: u32,
    pub bedrock_rows: u32,
    pub gems: u32,
    pub bombs: u32,
    pub bomb_timer: i32,
    pub ice: u32,
    pub ice_hits: u8,
}

impl Default for BoardGimmicks {
    fn default() -> Self {
        Self {
            layout: Vec::new(),
            garbage_rows: 0,
            bedrock_rows: 0,
            gems: 0,
            bombs: 0,
            bomb_timer: 10,
            ice: 0,
            ice_hits: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveConfig {
    #[serde(rename = "type")]
    pub kind: ObjectiveKind,
    #[serde(default)]
    pub target: u32,
    #[serde(default)]
    pub boss: Option<BossConfig>,
    #[serde(default)]
    pub constraints: Constraints,
    #[serde(default)]
    pub gimmicks: BoardGimmicks,
}

impl ObjectiveConfig {
    pub fn new(kind: ObjectiveKind, target: u32) -> Self {
        Self {
            kind,
            target,
            boss: None,
            constraints: Constraints::default(),
            gimmicks: BoardGimmicks::default(),
        }
    }

    pub fn with_boss(mut self, boss: BossConfig) -> Self {
        self.boss = Some(boss);
        self
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_gimmicks(mut self, gimmicks: BoardGimmicks) -> Self {
        self.gimmicks = gimmicks;
        self
    }

    /// Starting boss HP: explicit, or for a BOSS objective one HP per 100
    /// points of target (rounded up)
    pub fn boss_hp(&self) -> Option<u32> {
        if let Some(hp) = self.boss.as_ref().and_then(|b| b.hp) {
            return Some(hp);
        }
        if self.kind == ObjectiveKind::Boss {
            return Some(self.target.div_ceil(BOSS_DAMAGE_PER_HP));
        }
        None
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(boss) = &self.boss {
            if boss.interval_ms == 0 {
                return Err(ConfigError::InvalidObjective(
                    "boss interval must be positive".to_string(),
                ));
            }
            if boss.hp == Some(0) {
                return Err(ConfigError::InvalidObjective(
                    "boss hp must be positive".to_string(),
                ));
            }
            // Only a BOSS target converts into HP.
            if self.kind != ObjectiveKind::Boss && boss.hp.is_none() {
                return Err(ConfigError::InvalidObjective(format!(
                    "boss on a {:?} objective needs explicit hp",
                    self.kind
                )));
            }
        }
        if self.kind == ObjectiveKind::Boss && self.boss_hp().unwrap_or(0) == 0 {
            return Err(ConfigError::InvalidObjective(
                "BOSS needs a target or boss hp".to_string(),
            ));
        }
        if self.kind != ObjectiveKind::Boss && self.target == 0 {
            return Err(ConfigError::InvalidObjective(format!(
                "{:?} needs a positive target",
                self.kind
            )));
        }
        Ok(())
    }
}

/// Runtime objective state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveState {
    config: Option<ObjectiveConfig>,
    boss_hp: Option<u32>,
    boss_timer_ms: u32,
}

impl ObjectiveState {
    /// Endless session with no objective
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(config: ObjectiveConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            boss_hp: config.boss_hp(),
            config: Some(config),
            boss_timer_ms: 0,
        })
    }

    pub fn config(&self) -> Option<&ObjectiveConfig> {
        self.config.as_ref()
    }

    pub fn boss_hp(&self) -> Option<u32> {
        self.boss_hp
    }

    pub fn boss_timer_ms(&self) -> u32 {
        self.boss_timer_ms
    }

    pub fn boss_defeated(&self) -> bool {
        self.boss_hp == Some(0)
    }

    /// Convert a score delta into boss damage (floor of delta / 100).
    ///
    /// HP saturates at 0. Returns true only for the call that brings it there.
    pub fn apply_boss_damage(&mut self, score_delta: u32) -> bool {
        let Some(hp) = self.boss_hp else {
            return false;
        };
        if hp == 0 {
            return false;
        }
        let remaining = hp.saturating_sub(score_delta / BOSS_DAMAGE_PER_HP);
        self.boss_hp = Some(remaining);
        remaining == 0
    }

    /// Advance the boss attack timer. Returns the ability to apply when it fires.
    pub fn tick_boss(&mut self, elapsed_ms: u32) -> Option<BossAbility> {
        let boss = self.config.as_ref()?.boss.as_ref()?;
        if self.boss_defeated() {
            return None;
        }
        self.boss_timer_ms = self.boss_timer_ms.saturating_add(elapsed_ms);
        if self.boss_timer_ms >= boss.interval_ms {
            self.boss_timer_ms = 0;
            return Some(boss.ability);
        }
        None
    }

    /// Victory first, then loss
    pub fn evaluate(&self, stats: &Stats) -> Option<SessionOutcome> {
        let config = self.config.as_ref()?;

        if self.boss_defeated() {
            return Some(SessionOutcome::Victory);
        }

        let target = config.target;
        let won = match config.kind {
            ObjectiveKind::Lines => stats.rows >= target,
            ObjectiveKind::Score => stats.score >= target,
            ObjectiveKind::TimeSurvival => stats.time_ms >= target as u64,
            ObjectiveKind::Gems => stats.gems >= target,
            ObjectiveKind::Bombs => stats.bombs_defused >= target,
            ObjectiveKind::Tetris => stats.tetrises >= target,
            ObjectiveKind::TSpin => stats.tspins >= target,
            ObjectiveKind::Combo => stats.max_combo >= target as i32,
            ObjectiveKind::B2bChain => stats.b2b_chain >= target,
            ObjectiveKind::Moves => stats.moves >= target,
            ObjectiveKind::Boss => false,
            ObjectiveKind::ColorMatch => stats.color_matches >= target,
        };
        if won {
            return Some(SessionOutcome::Victory);
        }

        let limits = &config.constraints;
        if limits.moves_limit.is_some_and(|limit| stats.moves >= limit) {
            return Some(SessionOutcome::Defeat);
        }
        if limits.time_limit_ms.is_some_and(|limit| stats.time_ms > limit) {
            return Some(SessionOutcome::Defeat);
        }
        None
    }
}

/// Rows from the floor edge inward
fn floor_rows(board: &Board, gravity: Gravity, n: usize) -> Vec<usize> {
    let n = n.min(board.height());
    match gravity {
        Gravity::Normal => (board.height() - n..board.height()).rev().collect(),
        Gravity::Flipped => (0..n).collect(),
    }
}

fn layout_cell(c: char) -> Option<Cell> {
    match c {
        '.' | ' ' => Some(Cell::EMPTY),
        '#' | 'G' | 'g' => Some(Cell::filled(Occupant::Garbage)),
        _ => PieceKind::from_char(c).map(|kind| Cell::filled(Occupant::Piece(kind))),
    }
}

/// Stamp layout rows onto the floor edge. The last text row touches the floor.
pub fn stamp_layout(board: &mut Board, layout: &[String], gravity: Gravity) -> Result<(), ConfigError> {
    if layout.len() > board.height() {
        return Err(ConfigError::InvalidLayout {
            row: board.height(),
            reason: format!("{} rows on a board of height {}", layout.len(), board.height()),
        });
    }

    let mut parsed = Vec::with_capacity(layout.len());
    for (row, text) in layout.iter().enumerate() {
        let cells = text
            .chars()
            .map(|c| {
                layout_cell(c).ok_or_else(|| ConfigError::InvalidLayout {
                    row,
                    reason: format!("unknown cell '{}'", c),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if cells.len() != board.width() {
            return Err(ConfigError::InvalidLayout {
                row,
                reason: format!("expected {} cells, got {}", board.width(), cells.len()),
            });
        }
        parsed.push(cells);
    }

    let targets = floor_rows(board, gravity, parsed.len());
    for (cells, &y) in parsed.iter().rev().zip(targets.iter()) {
        for (x, cell) in cells.iter().enumerate() {
            board.set(x as i32, y as i32, *cell);
        }
    }
    Ok(())
}

/// Apply a session's board gimmicks: layout, bedrock, garbage, then gems,
/// bombs and ice placed with `rng`.
pub fn apply_gimmicks<R: RandomSource>(
    board: &mut Board,
    gimmicks: &BoardGimmicks,
    gravity: Gravity,
    rng: &mut R,
) -> Result<(), ConfigError> {
    stamp_layout(board, &gimmicks.layout, gravity)?;

    if gimmicks.garbage_rows > 0 {
        board.add_garbage_lines(gimmicks.garbage_rows, gravity, rng);
    }

    if gimmicks.bedrock_rows > 0 {
        let n = gimmicks.bedrock_rows;
        board.add_garbage_lines(n, gravity, rng);
        let bedrock = Cell::filled(Occupant::Garbage).with_modifier(Modifier::Bedrock);
        for y in floor_rows(board, gravity, n as usize) {
            for x in 0..board.width() {
                board.set(x as i32, y as i32, bedrock);
            }
        }
    }

    let solid = |c: &Cell| c.is_solid() && c.modifier().is_none();
    for _ in 0..gimmicks.gems {
        place_on(board, rng, &[], solid, Modifier::Gem);
    }
    for _ in 0..gimmicks.bombs {
        let bomb = Modifier::Bomb {
            timer: gimmicks.bomb_timer,
        };
        place_on(board, rng, &[], solid, bomb);
    }

    if gimmicks.ice > 0 {
        // Ice only goes in the floor half, where pieces actually land.
        let ceiling_half: Vec<(i32, i32)> = floor_rows(board, gravity.flipped(), board.height() / 2)
            .into_iter()
            .flat_map(|y| (0..board.width()).map(move |x| (x as i32, y as i32)))
            .collect();
        let ice = Modifier::Ice {
            hits: gimmicks.ice_hits.max(1),
        };
        for _ in 0..gimmicks.ice {
            place_on(
                board,
                rng,
                &ceiling_half,
                |c: &Cell| c.is_clear() && c.modifier().is_none(),
                ice,
            );
        }
    }
    Ok(())
}

fn place_on<R, F>(board: &mut Board, rng: &mut R, exclude: &[(i32, i32)], eligible: F, modifier: Modifier)
where
    R: RandomSource,
    F: Fn(&Cell) -> bool,
{
    match board.random_cell(rng, exclude, eligible) {
        Some((x, y)) => {
            if let Some(cell) = board.get_mut(x as i32, y as i32) {
                cell.set_modifier(Some(modifier));
            }
        }
        None => log::debug!("no room for {:?}", modifier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SimpleRng;

    #[test]
    fn test_boss_hp_from_target() {
        let config = ObjectiveConfig::new(ObjectiveKind::Boss, 1000);
        assert_eq!(config.boss_hp(), Some(10));
        let config = ObjectiveConfig::new(ObjectiveKind::Boss, 1050);
        assert_eq!(config.boss_hp(), Some(11));
        assert_eq!(ObjectiveConfig::new(ObjectiveKind::Lines, 10).boss_hp(), None);
    }

    #[test]
    fn test_boss_damage_victory_once() {
        let mut state = ObjectiveState::new(ObjectiveConfig::new(ObjectiveKind::Boss, 1000)).unwrap();
        let mut victories = 0;
        for _ in 0..10 {
            if state.apply_boss_damage(500) {
                victories += 1;
            }
        }
        assert_eq!(state.boss_hp(), Some(0));
        assert_eq!(victories, 1);
        assert_eq!(state.evaluate(&Stats::default()), Some(SessionOutcome::Victory));
    }

    #[test]
    fn test_boss_damage_floors() {
        let mut state = ObjectiveState::new(ObjectiveConfig::new(ObjectiveKind::Boss, 1000)).unwrap();
        state.apply_boss_damage(99);
        assert_eq!(state.boss_hp(), Some(10));
        state.apply_boss_damage(250);
        assert_eq!(state.boss_hp(), Some(8));
    }

    #[test]
    fn test_boss_timer_fires_and_resets() {
        let config = ObjectiveConfig::new(ObjectiveKind::Lines, 10).with_boss(BossConfig {
            hp: Some(5),
            ability: BossAbility::GarbageRain,
            interval_ms: 1000,
        });
        let mut state = ObjectiveState::new(config).unwrap();
        assert_eq!(state.tick_boss(600), None);
        assert_eq!(state.tick_boss(400), Some(BossAbility::GarbageRain));
        assert_eq!(state.boss_timer_ms(), 0);
        assert_eq!(state.tick_boss(999), None);
    }

    #[test]
    fn test_invalid_objectives() {
        assert!(ObjectiveState::new(ObjectiveConfig::new(ObjectiveKind::Boss, 0)).is_err());
        assert!(ObjectiveState::new(ObjectiveConfig::new(ObjectiveKind::Lines, 0)).is_err());
        let bad_boss = ObjectiveConfig::new(ObjectiveKind::Score, 100).with_boss(BossConfig {
            hp: None,
            ability: BossAbility::SpeedSurge,
            interval_ms: 0,
        });
        assert!(matches!(
            bad_boss.validate(),
            Err(ConfigError::InvalidObjective(_))
        ));
    }

    #[test]
    fn test_side_boss_needs_explicit_hp() {
        let boss = BossConfig {
            hp: None,
            ability: BossAbility::GarbageRain,
            interval_ms: 60_000,
        };
        let config = ObjectiveConfig::new(ObjectiveKind::Lines, 10).with_boss(boss.clone());
        assert_eq!(config.boss_hp(), None);
        assert!(matches!(
            ObjectiveState::new(config),
            Err(ConfigError::InvalidObjective(_))
        ));

        let zero = ObjectiveConfig::new(ObjectiveKind::Lines, 10).with_boss(BossConfig {
            hp: Some(0),
            ..boss.clone()
        });
        assert!(zero.validate().is_err());

        let explicit = ObjectiveConfig::new(ObjectiveKind::Lines, 10).with_boss(BossConfig {
            hp: Some(3),
            ..boss
        });
        assert_eq!(ObjectiveState::new(explicit).unwrap().boss_hp(), Some(3));
    }

    #[test]
    fn test_evaluate_victory_before_loss() {
        let config = ObjectiveConfig::new(ObjectiveKind::Lines, 4).with_constraints(Constraints {
            moves_limit: Some(3),
            time_limit_ms: None,
        });
        let state = ObjectiveState::new(config).unwrap();
        let mut stats = Stats::default();
        stats.moves = 3;
        assert_eq!(state.evaluate(&stats), Some(SessionOutcome::Defeat));
        stats.rows = 4;
        assert_eq!(state.evaluate(&stats), Some(SessionOutcome::Victory));
    }

    #[test]
    fn test_evaluate_time_limit() {
        let config = ObjectiveConfig::new(ObjectiveKind::Score, 5000).with_constraints(Constraints {
            moves_limit: None,
            time_limit_ms: Some(60_000),
        });
        let state = ObjectiveState::new(config).unwrap();
        let mut stats = Stats::default();
        stats.time_ms = 60_000;
        assert_eq!(state.evaluate(&stats), None);
        stats.time_ms = 60_001;
        assert_eq!(state.evaluate(&stats), Some(SessionOutcome::Defeat));
    }

    #[test]
    fn test_no_objective_never_ends() {
        let stats = Stats {
            rows: 1000,
            ..Stats::default()
        };
        assert_eq!(ObjectiveState::none().evaluate(&stats), None);
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "type": "BOSS",
            "target": 2000,
            "boss": {"ability": "SPEED_SURGE", "interval_ms": 8000},
            "constraints": {"moves_limit": 40},
            "gimmicks": {"garbage_rows": 3, "gems": 2}
        }"#;
        let config: ObjectiveConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.kind, ObjectiveKind::Boss);
        assert_eq!(config.boss_hp(), Some(20));
        assert_eq!(config.constraints.moves_limit, Some(40));
        assert_eq!(config.gimmicks.bomb_timer, 10);
    }

    #[test]
    fn test_stamp_layout_at_floor() {
        let mut board = Board::new(4, 6);
        let layout = vec!["..T.".to_string(), "##.#".to_string()];
        stamp_layout(&mut board, &layout, Gravity::Normal).unwrap();
        assert_eq!(board.get(2, 4).unwrap().occupant(), Some(Occupant::Piece(PieceKind::T)));
        assert!(board.get(2, 5).unwrap().is_clear());
        assert_eq!(board.filled_count(), 4);
    }

    #[test]
    fn test_stamp_layout_rejects_bad_rows() {
        let mut board = Board::new(4, 6);
        let short = vec!["...".to_string()];
        assert!(matches!(
            stamp_layout(&mut board, &short, Gravity::Normal),
            Err(ConfigError::InvalidLayout { row: 0, .. })
        ));
        let unknown = vec!["..x.".to_string()];
        assert!(stamp_layout(&mut board, &unknown, Gravity::Normal).is_err());
    }

    #[test]
    fn test_gimmicks_place_modifiers() {
        let mut board = Board::new(11, 22);
        let mut rng = SimpleRng::new(4);
        let gimmicks = BoardGimmicks {
            garbage_rows: 3,
            bedrock_rows: 1,
            gems: 2,
            bombs: 1,
            ice: 2,
            ..BoardGimmicks::default()
        };
        apply_gimmicks(&mut board, &gimmicks, Gravity::Normal, &mut rng).unwrap();

        assert!(board.row(21).iter().all(Cell::is_bedrock));
        let count = |pred: &dyn Fn(Modifier) -> bool| {
            board
                .cells()
                .iter()
                .filter(|c| c.modifier().is_some_and(pred))
                .count()
        };
        assert_eq!(count(&|m| m == Modifier::Gem), 2);
        assert_eq!(count(&|m| matches!(m, Modifier::Bomb { timer: 10 })), 1);
        assert_eq!(count(&|m| matches!(m, Modifier::Ice { .. })), 2);
    }
}
