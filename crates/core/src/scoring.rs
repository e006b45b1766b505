//! Scoring module - line clear scoring, combos, back-to-back and frenzy
//!
//! [`calculate_score`] is a pure function of one clear. [`ScoreKeeper`] is the
//! stateful wrapper around it: it owns the combo chain, the back-to-back flag,
//! the frenzy window and the per-mode speed curves, and writes the results
//! into [`Stats`].
//!
//! Rules:
//! - Regular clears use `LINE_SCORES[lines] * (level + 1)`.
//! - T-spins use `TSPIN_SCORES[min(lines, 3)] * (level + 1)` instead.
//! - A clear is "difficult" when it is a Tetris or a T-spin with lines.
//!   Two difficult clears in a row apply a 3/2 multiplier to the second.
//!   A T-spin with no lines neither starts nor breaks the chain.
//! - Combo bonus is `COMBO_FACTOR * combo * (level + 1)` once `combo > 0`.

use serde::{Deserialize, Serialize};

use crate::types::{
    GameMode, B2B_DENOMINATOR, B2B_NUMERATOR, BASE_DROP_MS, BLITZ_SPEED_THRESHOLDS, COMBO_FACTOR,
    FRENZY_COMBO_THRESHOLD, FRENZY_DURATION_MS, FRENZY_MULTIPLIER, HARD_DROP_POINTS,
    LEVEL_SPEED_FACTOR, LINES_PER_LEVEL, LINE_SCORES, MIN_DROP_MS, SOFT_DROP_POINTS, TSPIN_SCORES,
};

/// Score calculation result
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    /// Total points for the clear, B2B multiplier and combo bonus included
    pub score: u32,
    /// Popup text, e.g. `"TETRIS B2B +2 COMBO"`
    pub text: String,
    /// Back-to-back state after this clear
    pub is_back_to_back: bool,
    /// Suggested screen shake, 0.0..=1.0
    pub shake_intensity: f32,
    pub difficult: bool,
    pub b2b_applied: bool,
    pub combo_bonus: u32,
}

/// Difficult clears keep the back-to-back chain going
pub fn is_difficult(lines: u32, is_tspin: bool) -> bool {
    (is_tspin && lines >= 1) || (!is_tspin && lines == 4)
}

fn clear_name(lines: u32, is_tspin: bool) -> &'static str {
    match (is_tspin, lines) {
        (true, 0) => "T-SPIN",
        (true, 1) => "T-SPIN SINGLE",
        (true, 2) => "T-SPIN DOUBLE",
        (true, _) => "T-SPIN TRIPLE",
        (false, 0) => "",
        (false, 1) => "SINGLE",
        (false, 2) => "DOUBLE",
        (false, 3) => "TRIPLE",
        (false, _) => "TETRIS",
    }
}

fn shake_for(lines: u32, is_tspin: bool, b2b_applied: bool) -> f32 {
    let base = match (is_tspin, lines) {
        (_, 0) => 0.1,
        (false, 4) => 0.8,
        (true, l) if l >= 2 => 0.6,
        (_, l) => 0.15 * l as f32,
    };
    let bonus = if b2b_applied { 0.2 } else { 0.0 };
    (base + bonus).min(1.0)
}

/// Calculate the score descriptor for a single clear.
///
/// `combo` is the chain index *including* this clear (-1 none, 0 first clear).
pub fn calculate_score(
    lines: u32,
    level: u32,
    is_tspin: bool,
    was_back_to_back: bool,
    combo: i32,
) -> ScoreResult {
    let multiplier = level.saturating_add(1);
    let base = if is_tspin {
        TSPIN_SCORES[lines.min(3) as usize]
    } else {
        LINE_SCORES[lines.min(4) as usize]
    }
    .saturating_mul(multiplier);

    let difficult = is_difficult(lines, is_tspin);
    let b2b_applied = difficult && was_back_to_back;
    let mut score = if b2b_applied {
        base.saturating_mul(B2B_NUMERATOR) / B2B_DENOMINATOR
    } else {
        base
    };

    let is_back_to_back = if difficult {
        true
    } else if lines == 0 {
        was_back_to_back
    } else {
        false
    };

    let mut text = clear_name(lines, is_tspin).to_string();
    if b2b_applied {
        text.push_str(" B2B");
    }

    let mut combo_bonus = 0;
    if combo > 0 && lines > 0 {
        combo_bonus = COMBO_FACTOR
            .saturating_mul(combo as u32)
            .saturating_mul(multiplier);
        score = score.saturating_add(combo_bonus);
        text.push_str(&format!(" +{} COMBO", combo));
    }

    ScoreResult {
        score,
        text,
        is_back_to_back,
        shake_intensity: shake_for(lines, is_tspin, b2b_applied),
        difficult,
        b2b_applied,
        combo_bonus,
    }
}

/// Calculate drop score (not level-scaled)
pub fn calculate_drop_score(cells: u32, is_hard_drop: bool) -> u32 {
    if is_hard_drop {
        cells * HARD_DROP_POINTS
    } else {
        cells * SOFT_DROP_POINTS
    }
}

/// Level-derived gravity: `max(100, 1000 * 0.95^level)`
pub fn drop_interval_for_level(level: u32) -> u32 {
    let ms = BASE_DROP_MS as f64 * LEVEL_SPEED_FACTOR.powi(level.min(1000) as i32);
    (ms.floor() as u32).max(MIN_DROP_MS)
}

/// Session statistics, read-only outside the rules core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub score: u32,
    pub rows: u32,
    pub level: u32,
    pub time_ms: u64,
    /// -1 when no chain is running
    pub combo: i32,
    pub max_combo: i32,
    pub back_to_back: bool,
    /// Consecutive clears that received the B2B multiplier
    pub b2b_chain: u32,
    pub gems: u32,
    pub bombs_defused: u32,
    pub tetrises: u32,
    pub tspins: u32,
    /// Pieces locked; move limits count these
    pub moves: u32,
    pub color_matches: u32,
}

impl Stats {
    pub fn new(level: u32) -> Self {
        Self {
            score: 0,
            rows: 0,
            level,
            time_ms: 0,
            combo: -1,
            max_combo: -1,
            back_to_back: false,
            b2b_chain: 0,
            gems: 0,
            bombs_defused: 0,
            tetrises: 0,
            tspins: 0,
            moves: 0,
            color_matches: 0,
        }
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new(0)
    }
}

/// What a registered clear did
#[derive(Debug, Clone, PartialEq)]
pub struct ClearOutcome {
    pub result: ScoreResult,
    /// Points actually added (frenzy and block multipliers applied)
    pub awarded: u32,
    pub frenzy_started: bool,
    pub level_up: bool,
    pub sped_up: bool,
}

/// Stateful scoring wrapper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreKeeper {
    mode: GameMode,
    start_level: u32,
    frenzy_remaining_ms: u32,
    frenzy_multiplier: u32,
    /// Blitz thresholds crossed so far
    blitz_next: usize,
}

impl ScoreKeeper {
    pub fn new(mode: GameMode, start_level: u32) -> Self {
        Self {
            mode,
            start_level,
            frenzy_remaining_ms: 0,
            frenzy_multiplier: 1,
            blitz_next: 0,
        }
    }

    pub fn frenzy_active(&self) -> bool {
        self.frenzy_remaining_ms > 0
    }

    pub fn frenzy_remaining_ms(&self) -> u32 {
        self.frenzy_remaining_ms
    }

    pub fn multiplier(&self) -> u32 {
        self.frenzy_multiplier
    }

    /// Register a lock's sweep result.
    ///
    /// Returns `None` when nothing was cleared and no T-spin happened; the
    /// combo chain is broken in that case. `block_multiplier` comes from
    /// multiplier blocks in the cleared rows (1 when there are none).
    pub fn register_clear(
        &mut self,
        stats: &mut Stats,
        lines: u32,
        is_tspin: bool,
        block_multiplier: u32,
    ) -> Option<ClearOutcome> {
        if lines == 0 && !is_tspin {
            stats.combo = -1;
            return None;
        }

        if lines > 0 {
            stats.combo += 1;
            stats.max_combo = stats.max_combo.max(stats.combo);
        }

        let result = calculate_score(lines, stats.level, is_tspin, stats.back_to_back, stats.combo);

        if result.b2b_applied {
            stats.b2b_chain += 1;
        } else if lines > 0 && !result.difficult {
            stats.b2b_chain = 0;
        }
        stats.back_to_back = result.is_back_to_back;

        let mut frenzy_started = false;
        if lines > 0 && stats.combo >= FRENZY_COMBO_THRESHOLD {
            frenzy_started = !self.frenzy_active();
            self.frenzy_remaining_ms = FRENZY_DURATION_MS;
            self.frenzy_multiplier = FRENZY_MULTIPLIER;
        }

        let awarded = result
            .score
            .saturating_mul(block_multiplier.max(1))
            .saturating_mul(self.frenzy_multiplier);
        stats.score = stats.score.saturating_add(awarded);
        stats.rows += lines;
        if is_tspin {
            stats.tspins += 1;
        } else if lines == 4 {
            stats.tetrises += 1;
        }

        let level_up = self.update_level(stats);
        let sped_up = self.check_blitz_thresholds(stats.score);

        Some(ClearOutcome {
            result,
            awarded,
            frenzy_started,
            level_up,
            sped_up,
        })
    }

    /// Credit rows removed outside the scoring path (laser, boosters)
    pub fn register_manual_rows(&mut self, stats: &mut Stats, rows: u32) -> bool {
        stats.rows += rows;
        self.update_level(stats)
    }

    /// Add non-clear points (drops, gems, defused bombs) through the frenzy multiplier
    pub fn add_points(&mut self, stats: &mut Stats, points: u32) -> u32 {
        let awarded = points.saturating_mul(self.frenzy_multiplier);
        stats.score = stats.score.saturating_add(awarded);
        self.check_blitz_thresholds(stats.score);
        awarded
    }

    /// Marathon level follows total rows
    fn update_level(&mut self, stats: &mut Stats) -> bool {
        if self.mode != GameMode::Marathon {
            return false;
        }
        let level = (stats.rows / LINES_PER_LEVEL).max(self.start_level);
        let up = level > stats.level;
        stats.level = level;
        up
    }

    /// Blitz: each threshold fires once, in order
    fn check_blitz_thresholds(&mut self, score: u32) -> bool {
        if self.mode != GameMode::Blitz {
            return false;
        }
        let mut crossed = false;
        while let Some(&(threshold, _)) = BLITZ_SPEED_THRESHOLDS.get(self.blitz_next) {
            if score < threshold {
                break;
            }
            self.blitz_next += 1;
            crossed = true;
        }
        crossed
    }

    /// Advance the frenzy window. Returns true when it just ended.
    pub fn tick(&mut self, elapsed_ms: u32) -> bool {
        if self.frenzy_remaining_ms == 0 {
            return false;
        }
        self.frenzy_remaining_ms = self.frenzy_remaining_ms.saturating_sub(elapsed_ms);
        if self.frenzy_remaining_ms == 0 {
            self.frenzy_multiplier = 1;
            return true;
        }
        false
    }

    /// Mode-derived gravity before temporary effects
    pub fn base_drop_interval_ms(&self, stats: &Stats) -> u32 {
        let base = drop_interval_for_level(stats.level);
        match self.mode {
            GameMode::Blitz => {
                let factor: f64 = BLITZ_SPEED_THRESHOLDS[..self.blitz_next]
                    .iter()
                    .map(|&(_, f)| f)
                    .product();
                ((base as f64 * factor).floor() as u32).max(1)
            }
            _ => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SCORE_SINGLE, SCORE_TETRIS, SCORE_TSPIN, SCORE_TSPIN_DOUBLE};

    #[test]
    fn test_tetris_scores() {
        let r = calculate_score(4, 0, false, false, 0);
        assert_eq!(r.score, SCORE_TETRIS);
        assert_eq!(r.text, "TETRIS");
        assert!(r.is_back_to_back);

        let r = calculate_score(4, 0, false, true, 0);
        assert_eq!(r.score, SCORE_TETRIS * 3 / 2);
        assert_eq!(r.text, "TETRIS B2B");
    }

    #[test]
    fn test_single_breaks_b2b() {
        let r = calculate_score(1, 0, false, true, 0);
        assert_eq!(r.score, SCORE_SINGLE);
        assert!(!r.is_back_to_back);
        assert!(!r.b2b_applied);
    }

    #[test]
    fn test_level_multiplier() {
        assert_eq!(calculate_score(1, 4, false, false, 0).score, SCORE_SINGLE * 5);
        assert_eq!(calculate_score(2, 0, true, false, 0).score, SCORE_TSPIN_DOUBLE);
    }

    #[test]
    fn test_tspin_zero_maintains_b2b() {
        let r = calculate_score(0, 0, true, true, -1);
        assert_eq!(r.score, SCORE_TSPIN);
        assert!(r.is_back_to_back);
        assert!(!r.b2b_applied);

        let r = calculate_score(0, 0, true, false, -1);
        assert!(!r.is_back_to_back);
    }

    #[test]
    fn test_combo_bonus() {
        let r = calculate_score(1, 1, false, false, 2);
        assert_eq!(r.combo_bonus, COMBO_FACTOR * 2 * 2);
        assert_eq!(r.score, SCORE_SINGLE * 2 + COMBO_FACTOR * 4);
        assert_eq!(r.text, "SINGLE +2 COMBO");

        // First clear of a chain gets nothing.
        assert_eq!(calculate_score(1, 0, false, false, 0).combo_bonus, 0);
    }

    #[test]
    fn test_drop_scores() {
        assert_eq!(calculate_drop_score(10, false), 10);
        assert_eq!(calculate_drop_score(10, true), 20);
    }

    #[test]
    fn test_drop_intervals() {
        assert_eq!(drop_interval_for_level(0), 1000);
        assert_eq!(drop_interval_for_level(1), 950);
        assert_eq!(drop_interval_for_level(100), MIN_DROP_MS);
    }

    #[test]
    fn test_keeper_resets_combo_on_empty_lock() {
        let mut keeper = ScoreKeeper::new(GameMode::Marathon, 0);
        let mut stats = Stats::new(0);
        keeper.register_clear(&mut stats, 1, false, 1);
        assert_eq!(stats.combo, 0);
        keeper.register_clear(&mut stats, 1, false, 1);
        assert_eq!(stats.combo, 1);
        assert!(keeper.register_clear(&mut stats, 0, false, 1).is_none());
        assert_eq!(stats.combo, -1);
    }

    #[test]
    fn test_keeper_marathon_levels() {
        let mut keeper = ScoreKeeper::new(GameMode::Marathon, 0);
        let mut stats = Stats::new(0);
        for _ in 0..2 {
            keeper.register_clear(&mut stats, 4, false, 1);
        }
        let outcome = keeper.register_clear(&mut stats, 2, false, 1).unwrap();
        assert_eq!(stats.rows, 10);
        assert_eq!(stats.level, 1);
        assert!(outcome.level_up);
        assert_eq!(keeper.base_drop_interval_ms(&stats), 950);
    }

    #[test]
    fn test_keeper_frenzy_window() {
        let mut keeper = ScoreKeeper::new(GameMode::Adventure, 0);
        let mut stats = Stats::new(0);
        let mut started = false;
        for _ in 0..5 {
            let outcome = keeper.register_clear(&mut stats, 1, false, 1).unwrap();
            started |= outcome.frenzy_started;
        }
        assert!(started);
        assert_eq!(stats.combo, 4);
        assert_eq!(keeper.multiplier(), FRENZY_MULTIPLIER);

        assert!(!keeper.tick(FRENZY_DURATION_MS - 1));
        assert!(keeper.tick(1));
        assert_eq!(keeper.multiplier(), 1);
        assert!(!keeper.frenzy_active());
    }

    #[test]
    fn test_keeper_blitz_thresholds_fire_once() {
        let mut keeper = ScoreKeeper::new(GameMode::Blitz, 0);
        let mut stats = Stats::new(0);
        assert!(keeper.add_points(&mut stats, 2_000) > 0);
        let first = keeper.base_drop_interval_ms(&stats);
        assert_eq!(first, 900);

        // Same threshold doesn't fire again.
        keeper.add_points(&mut stats, 1);
        assert_eq!(keeper.base_drop_interval_ms(&stats), 900);

        // Jumping past two thresholds applies both, in order.
        keeper.add_points(&mut stats, 10_000);
        assert_eq!(
            keeper.base_drop_interval_ms(&stats),
            (1000.0 * (0.9 * 0.85 * 0.8f64)).floor() as u32
        );
    }

    #[test]
    fn test_clear_reports_blitz_speed_up() {
        let mut keeper = ScoreKeeper::new(GameMode::Blitz, 0);
        let mut stats = Stats::new(0);
        keeper.add_points(&mut stats, 1_950);

        let outcome = keeper.register_clear(&mut stats, 1, false, 1).unwrap();
        assert!(outcome.sped_up);
        let outcome = keeper.register_clear(&mut stats, 1, false, 1).unwrap();
        assert!(!outcome.sped_up);

        let mut marathon = ScoreKeeper::new(GameMode::Marathon, 0);
        let mut stats = Stats::new(0);
        marathon.add_points(&mut stats, 1_950);
        assert!(!marathon.register_clear(&mut stats, 1, false, 1).unwrap().sped_up);
    }

    #[test]
    fn test_keeper_b2b_chain() {
        let mut keeper = ScoreKeeper::new(GameMode::Adventure, 0);
        let mut stats = Stats::new(0);
        keeper.register_clear(&mut stats, 4, false, 1);
        assert_eq!(stats.b2b_chain, 0);
        keeper.register_clear(&mut stats, 4, false, 1);
        assert_eq!(stats.b2b_chain, 1);
        keeper.register_clear(&mut stats, 1, false, 1);
        assert_eq!(stats.b2b_chain, 0);
        assert!(!stats.back_to_back);
    }
}
