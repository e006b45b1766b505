//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the rules engine.
//! All types are plain data with no game logic attached, so they can be shared
//! between the rules core, the placement helper and the move advisor.
//!
//! # Board Dimensions
//!
//! Default playfield dimensions:
//!
//! - **Width**: 11 columns (indexed 0-10)
//! - **Height**: 22 rows (indexed 0-21), of which the bottom 20 are visible
//! - Row 0 is the top while gravity is [`Gravity::Normal`]; under
//!   [`Gravity::Flipped`] the floor is row 0 instead.
//!
//! # Game Timing Constants
//!
//! Timing values are in milliseconds:
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `BASE_DROP_MS` | 1000 | Gravity at level 0 |
//! | `MIN_DROP_MS` | 100 | Fastest level-derived gravity |
//! | `LOCK_DELAY_MS` | 500 | Time before a grounded piece locks |
//! | `LOCK_RESET_LIMIT` | 15 | Max lock timer resets per piece |
//! | `FRENZY_DURATION_MS` | 10000 | Frenzy window after a 4+ combo |
//! | `SPEED_SURGE_MS` | 5000 | Boss speed surge duration |
//! | `BLITZ_DURATION_MS` | 120000 | Length of a Blitz session |
//!
//! # Examples
//!
//! ```
//! use blockfall_types::{GameAction, PieceKind, Rotation, BOARD_HEIGHT, BOARD_WIDTH};
//!
//! let parsed = PieceKind::from_str("t").unwrap();
//! assert_eq!(parsed, PieceKind::T);
//!
//! assert_eq!(Rotation::North.rotate_cw(), Rotation::East);
//! assert_eq!(GameAction::from_str("hardDrop"), Some(GameAction::HardDrop));
//!
//! assert_eq!(BOARD_WIDTH, 11);
//! assert_eq!(BOARD_HEIGHT, 22);
//! ```

use serde::{Deserialize, Serialize};

/// Default board width in cells (11 columns)
pub const BOARD_WIDTH: u8 = 11;

/// Default board height in cells (22 rows, including the 2 hidden spawn rows)
pub const BOARD_HEIGHT: u8 = 22;

/// Default number of rows shown to the player
pub const VISIBLE_HEIGHT: u8 = 20;

/// Base gravity interval at level 0 (1000ms = 1 second per row)
pub const BASE_DROP_MS: u32 = 1000;

/// Level-derived gravity never gets faster than this
pub const MIN_DROP_MS: u32 = 100;

/// Per-level decay of the drop interval (`1000 * 0.95^level`)
pub const LEVEL_SPEED_FACTOR: f64 = 0.95;

/// Lines needed per level in Marathon
pub const LINES_PER_LEVEL: u32 = 10;

/// Lock delay when piece is grounded (500ms)
pub const LOCK_DELAY_MS: u32 = 500;

/// Maximum number of lock timer resets per piece (15)
pub const LOCK_RESET_LIMIT: u32 = 15;

/// Number of upcoming pieces exposed as preview
pub const NEXT_PREVIEW_LEN: usize = 5;

/// The piece queue is topped up with a fresh bag whenever it holds fewer pieces than this
pub const BAG_REFILL_THRESHOLD: usize = 7;

/// Points per cell for a soft drop (not level-scaled)
pub const SOFT_DROP_POINTS: u32 = 1;

/// Points per cell for a hard drop (not level-scaled)
pub const HARD_DROP_POINTS: u32 = 2;

pub const SCORE_SINGLE: u32 = 100;
pub const SCORE_DOUBLE: u32 = 300;
pub const SCORE_TRIPLE: u32 = 500;
pub const SCORE_TETRIS: u32 = 800;
pub const SCORE_TSPIN: u32 = 400;
pub const SCORE_TSPIN_SINGLE: u32 = 800;
pub const SCORE_TSPIN_DOUBLE: u32 = 1200;
pub const SCORE_TSPIN_TRIPLE: u32 = 1600;

/// Line clear scoring table, indexed by lines cleared.
///
/// Points are multiplied by (level + 1).
pub const LINE_SCORES: [u32; 5] = [0, SCORE_SINGLE, SCORE_DOUBLE, SCORE_TRIPLE, SCORE_TETRIS];

/// T-Spin scoring table, indexed by `min(lines, 3)`.
pub const TSPIN_SCORES: [u32; 4] = [
    SCORE_TSPIN,
    SCORE_TSPIN_SINGLE,
    SCORE_TSPIN_DOUBLE,
    SCORE_TSPIN_TRIPLE,
];

/// Back-to-back bonus numerator (3/2 = 1.5x multiplier)
pub const B2B_NUMERATOR: u32 = 3;

/// Back-to-back bonus denominator
pub const B2B_DENOMINATOR: u32 = 2;

/// Combo bonus per combo step, multiplied by (level + 1)
pub const COMBO_FACTOR: u32 = 50;

/// Combo count that starts (or refreshes) a frenzy
pub const FRENZY_COMBO_THRESHOLD: i32 = 4;

/// Frenzy window length
pub const FRENZY_DURATION_MS: u32 = 10_000;

/// Score multiplier while frenzy is active
pub const FRENZY_MULTIPLIER: u32 = 2;

/// Chance of spawning a powerup block after a Tetris or a T-spin double+
pub const POWERUP_CHANCE: f64 = 0.3;

/// Blitz session length
pub const BLITZ_DURATION_MS: u32 = 120_000;

/// Blitz speed-up thresholds: `(score, drop time factor)`, crossed in order.
pub const BLITZ_SPEED_THRESHOLDS: [(u32, f64); 5] = [
    (2_000, 0.9),
    (5_000, 0.85),
    (10_000, 0.8),
    (20_000, 0.75),
    (40_000, 0.7),
];

/// Points of score needed for one HP of boss damage
pub const BOSS_DAMAGE_PER_HP: u32 = 100;

/// Duration of a boss speed surge (drop time halved)
pub const SPEED_SURGE_MS: u32 = 5_000;

/// Bonus for collecting a gem, multiplied by (level + 1)
pub const GEM_BONUS: u32 = 100;

/// Bonus for defusing a bomb by clearing its row, multiplied by (level + 1)
pub const BOMB_DEFUSE_BONUS: u32 = 200;

/// Slow-time booster length (drop interval doubled)
pub const SLOW_TIME_MS: u32 = 15_000;

/// Flipped-gravity booster length
pub const FLIP_GRAVITY_MS: u32 = 15_000;

/// Slow effect from clearing a slow block
pub const SLOW_BLOCK_MS: u32 = 10_000;

/// Gravity pause from clearing a freeze block
pub const FREEZE_BLOCK_MS: u32 = 3_000;

/// Rows on each side of the target row removed by the bomb-rows booster
pub const BOMB_ROWS_RADIUS: usize = 1;


/// The seven tetromino piece kinds
///
/// Each piece has a distinct shape and default color:
/// - **I**: Cyan, horizontal bar
/// - **O**: Yellow, 2x2 square
/// - **T**: Magenta, T-shaped
/// - **S**: Green, S-shaped
/// - **Z**: Red, Z-shaped (mirror of S)
/// - **J**: Blue, J-shaped
/// - **L**: Orange, L-shaped (mirror of J)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl PieceKind {
    /// The standard seven, in canonical order.
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::J,
        PieceKind::L,
    ];

    /// Parse piece kind from string (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use blockfall_types::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_str("i"), Some(PieceKind::I));
    /// assert_eq!(PieceKind::from_str("O"), Some(PieceKind::O));
    /// assert_eq!(PieceKind::from_str("unknown"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "i" => Some(PieceKind::I),
            "o" => Some(PieceKind::O),
            "t" => Some(PieceKind::T),
            "s" => Some(PieceKind::S),
            "z" => Some(PieceKind::Z),
            "j" => Some(PieceKind::J),
            "l" => Some(PieceKind::L),
            _ => None,
        }
    }

    /// Parse a single piece letter (case-insensitive)
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'i' => Some(PieceKind::I),
            'o' => Some(PieceKind::O),
            't' => Some(PieceKind::T),
            's' => Some(PieceKind::S),
            'z' => Some(PieceKind::Z),
            'j' => Some(PieceKind::J),
            'l' => Some(PieceKind::L),
            _ => None,
        }
    }

    /// Convert to lowercase string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PieceKind::I => "i",
            PieceKind::O => "o",
            PieceKind::T => "t",
            PieceKind::S => "s",
            PieceKind::Z => "z",
            PieceKind::J => "j",
            PieceKind::L => "l",
        }
    }

    /// Default color of the piece (0xRRGGBB)
    pub fn color(&self) -> CellColor {
        match self {
            PieceKind::I => CellColor(0x00f0f0),
            PieceKind::O => CellColor(0xf0f000),
            PieceKind::T => CellColor(0xa000f0),
            PieceKind::S => CellColor(0x00f000),
            PieceKind::Z => CellColor(0xf00000),
            PieceKind::J => CellColor(0x0000f0),
            PieceKind::L => CellColor(0xf0a000),
        }
    }
}

/// Rotation states following the Super Rotation System (SRS)
///
/// The rotation cycle goes: North → East → South → West → North
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    North,
    East,
    South,
    West,
}

impl Rotation {
    /// Rotate clockwise (90°)
    ///
    /// ```
    /// use blockfall_types::Rotation;
    ///
    /// assert_eq!(Rotation::North.rotate_cw(), Rotation::East);
    /// assert_eq!(Rotation::West.rotate_cw(), Rotation::North);
    /// ```
    pub fn rotate_cw(&self) -> Self {
        match self {
            Rotation::North => Rotation::East,
            Rotation::East => Rotation::South,
            Rotation::South => Rotation::West,
            Rotation::West => Rotation::North,
        }
    }

    /// Rotate counter-clockwise (-90°)
    pub fn rotate_ccw(&self) -> Self {
        match self {
            Rotation::North => Rotation::West,
            Rotation::West => Rotation::South,
            Rotation::South => Rotation::East,
            Rotation::East => Rotation::North,
        }
    }

    /// Rotate by `direction` quarter turns (+1 clockwise, -1 counter-clockwise)
    pub fn rotate(&self, direction: i8) -> Self {
        Self::from_index((self.index() as i8 + direction).rem_euclid(4) as u8)
    }

    /// Rotation state as 0..3
    pub fn index(&self) -> u8 {
        match self {
            Rotation::North => 0,
            Rotation::East => 1,
            Rotation::South => 2,
            Rotation::West => 3,
        }
    }

    /// Build from a rotation state, taken `mod 4`
    pub fn from_index(index: u8) -> Self {
        match index % 4 {
            0 => Rotation::North,
            1 => Rotation::East,
            2 => Rotation::South,
            _ => Rotation::West,
        }
    }

    /// Convert to lowercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            Rotation::North => "north",
            Rotation::East => "east",
            Rotation::South => "south",
            Rotation::West => "west",
        }
    }
}

/// Game actions that can be dispatched by a player or a driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameAction {
    /// Move piece one cell left
    MoveLeft,
    /// Move piece one cell right
    MoveRight,
    /// Move piece one cell toward gravity (with soft drop scoring)
    SoftDrop,
    /// Drop to the landing position and lock immediately
    HardDrop,
    /// Rotate piece 90° clockwise
    RotateCw,
    /// Rotate piece 90° counter-clockwise
    RotateCcw,
    /// Hold current piece (once per spawn)
    Hold,
    /// Toggle pause state
    Pause,
}

impl GameAction {
    /// Parse action from string (case-insensitive camelCase)
    ///
    /// ```
    /// use blockfall_types::GameAction;
    ///
    /// assert_eq!(GameAction::from_str("moveLeft"), Some(GameAction::MoveLeft));
    /// assert_eq!(GameAction::from_str("rotateCcw"), Some(GameAction::RotateCcw));
    /// assert_eq!(GameAction::from_str("unknown"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "moveleft" => Some(GameAction::MoveLeft),
            "moveright" => Some(GameAction::MoveRight),
            "softdrop" => Some(GameAction::SoftDrop),
            "harddrop" => Some(GameAction::HardDrop),
            "rotatecw" => Some(GameAction::RotateCw),
            "rotateccw" => Some(GameAction::RotateCcw),
            "hold" => Some(GameAction::Hold),
            "pause" => Some(GameAction::Pause),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameAction::MoveLeft => "moveLeft",
            GameAction::MoveRight => "moveRight",
            GameAction::SoftDrop => "softDrop",
            GameAction::HardDrop => "hardDrop",
            GameAction::RotateCw => "rotateCw",
            GameAction::RotateCcw => "rotateCcw",
            GameAction::Hold => "hold",
            GameAction::Pause => "pause",
        }
    }
}

/// Direction pieces fall in.
///
/// Under `Normal` gravity pieces fall toward higher row indices and the floor
/// is the last row. `Flipped` inverts that: the floor is row 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Gravity {
    #[default]
    Normal,
    Flipped,
}

impl Gravity {
    /// Row delta of one step toward the floor
    pub fn dir(&self) -> i8 {
        match self {
            Gravity::Normal => 1,
            Gravity::Flipped => -1,
        }
    }

    pub fn flipped(&self) -> Self {
        match self {
            Gravity::Normal => Gravity::Flipped,
            Gravity::Flipped => Gravity::Normal,
        }
    }
}

/// Session rule sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameMode {
    /// Endless play; level follows `rows / 10` and gravity speeds up with it
    #[default]
    Marathon,
    /// Timed score attack; gravity speeds up at score thresholds
    Blitz,
    /// Clear a preset layout; an empty board is a win
    Puzzle,
    /// Objective-driven levels (lines, gems, bosses...)
    Adventure,
}

impl GameMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "marathon" => Some(GameMode::Marathon),
            "blitz" => Some(GameMode::Blitz),
            "puzzle" => Some(GameMode::Puzzle),
            "adventure" => Some(GameMode::Adventure),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Marathon => "marathon",
            GameMode::Blitz => "blitz",
            GameMode::Puzzle => "puzzle",
            GameMode::Adventure => "adventure",
        }
    }
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionOutcome {
    Victory,
    Defeat,
    /// A timed session ran out without a win/loss condition (Blitz)
    TimeUp,
}

/// An RGB color (0xRRGGBB)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellColor(pub u32);

/// Color used for garbage cells
pub const GARBAGE_COLOR: CellColor = CellColor(0x808080);

/// What fills an occupied cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Occupant {
    Piece(PieceKind),
    /// Garbage ("G"): penalty rows, puzzle layouts, gimmick blocks
    Garbage,
}

/// Lifecycle of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    Clear,
    Merged,
    /// Scheduled for a deferred clear; never counted toward a full row
    Zoned,
}

/// Special effect attached to a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modifier {
    Gem,
    Bomb { timer: i32 },
    Ice { hits: u8 },
    CrackedIce { hits: u8 },
    Wildcard,
    Laser,
    Nuke,
    Bedrock,
    Soft,
    Multiplier,
    Slow,
    Freeze,
    Drill,
}

/// A single board cell.
///
/// `state == Clear` exactly when there is no occupant; the constructors and
/// mutators below are the only way to change either, so the pair can't drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    occupant: Option<Occupant>,
    state: CellState,
    modifier: Option<Modifier>,
    color: Option<CellColor>,
}

impl Cell {
    pub const EMPTY: Cell = Cell {
        occupant: None,
        state: CellState::Clear,
        modifier: None,
        color: None,
    };

    pub fn filled(occupant: Occupant) -> Self {
        Self {
            occupant: Some(occupant),
            state: CellState::Merged,
            modifier: None,
            color: None,
        }
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifier = Some(modifier);
        self
    }

    pub fn with_color(mut self, color: CellColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn occupant(&self) -> Option<Occupant> {
        self.occupant
    }

    pub fn state(&self) -> CellState {
        self.state
    }

    pub fn modifier(&self) -> Option<Modifier> {
        self.modifier
    }

    pub fn color(&self) -> Option<CellColor> {
        self.color
    }

    /// Color override if any, otherwise the occupant's default color
    pub fn effective_color(&self) -> Option<CellColor> {
        match self.occupant? {
            _ if self.color.is_some() => self.color,
            Occupant::Piece(kind) => Some(kind.color()),
            Occupant::Garbage => Some(GARBAGE_COLOR),
        }
    }

    pub fn is_clear(&self) -> bool {
        self.state == CellState::Clear
    }

    /// Counts toward a full row
    pub fn is_solid(&self) -> bool {
        self.state == CellState::Merged
    }

    pub fn is_bedrock(&self) -> bool {
        self.modifier == Some(Modifier::Bedrock)
    }

    /// Fill the cell, keeping any overlay modifier
    pub fn fill(&mut self, occupant: Occupant, color: Option<CellColor>) {
        self.occupant = Some(occupant);
        self.state = CellState::Merged;
        self.color = color;
    }

    /// Mark an occupied cell for a deferred clear
    pub fn zone(&mut self) {
        if self.occupant.is_some() {
            self.state = CellState::Zoned;
        }
    }

    pub fn set_modifier(&mut self, modifier: Option<Modifier>) {
        self.modifier = modifier;
    }

    /// Reset to an empty cell, dropping any modifier
    pub fn clear(&mut self) {
        *self = Cell::EMPTY;
    }

    /// Compact numeric code: 0 empty, 1-7 piece kinds, 8 garbage
    pub fn code(&self) -> u8 {
        match self.occupant {
            None => 0,
            Some(Occupant::Piece(kind)) => match kind {
                PieceKind::I => 1,
                PieceKind::O => 2,
                PieceKind::T => 3,
                PieceKind::S => 4,
                PieceKind::Z => 5,
                PieceKind::J => 6,
                PieceKind::L => 7,
            },
            Some(Occupant::Garbage) => 8,
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::EMPTY
    }
}

/// Sound cues for the audio layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCue {
    Move,
    Rotate,
    SoftDrop,
    HardDrop,
    Lock,
    Hold,
    LineClear(u32),
    Tetris,
    TSpin,
    Combo(i32),
    BackToBack,
    Frenzy,
    LevelUp,
    GemCollected,
    BombDefused,
    Explosion,
    Powerup,
    BossAttack,
    Booster,
    GameOver,
    Victory,
}

/// Visual cues for the rendering layer
#[derive(Debug, Clone, PartialEq)]
pub enum VisualCue {
    LineClear { rows: Vec<usize> },
    ScorePopup { text: String, score: u32 },
    Shake { intensity: f32 },
    Explosion { x: usize, y: usize },
    FrenzyStarted,
    FrenzyEnded,
    LaserSweep { row: usize },
    DrillColumn { x: usize },
    NukeFlash,
    GarbageRise { lines: u32 },
    PowerupSpawned { x: usize, y: usize, modifier: Modifier },
    GravityChanged { gravity: Gravity },
    /// A booster target was rejected; nothing changed
    Fizzled,
}

/// Declarative output record for the rendering/audio layer.
///
/// The rules core never calls into audio or rendering directly; it emits
/// these in order and the driver drains them after each call.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Audio(AudioCue),
    Visual(VisualCue),
    StatsChanged,
    GameOver(SessionOutcome),
}
