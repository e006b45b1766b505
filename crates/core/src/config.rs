//! Rules configuration.
//!
//! Defaults match the standard 11x22 board. `from_env` lets a driver tweak
//! a session without code changes; nothing here is validated until the
//! config reaches `Game::new` or `Game::reset`.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{
    PieceKind, BOARD_HEIGHT, BOARD_WIDTH, LOCK_DELAY_MS, LOCK_RESET_LIMIT, NEXT_PREVIEW_LEN,
    VISIBLE_HEIGHT,
};

/// Narrowest board a tetromino can rotate in
const MIN_WIDTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub width: usize,
    pub height: usize,
    pub visible_height: usize,
    pub lock_delay_ms: u32,
    pub lock_reset_limit: u32,
    /// Piece letters making up one bag, e.g. `"IOTSZJL"`
    pub bag_pool: String,
    pub seed: u32,
    pub preview_len: usize,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            width: BOARD_WIDTH as usize,
            height: BOARD_HEIGHT as usize,
            visible_height: VISIBLE_HEIGHT as usize,
            lock_delay_ms: LOCK_DELAY_MS,
            lock_reset_limit: LOCK_RESET_LIMIT,
            bag_pool: "IOTSZJL".to_string(),
            seed: 1,
            preview_len: NEXT_PREVIEW_LEN,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

impl RulesConfig {
    /// Defaults overridden by `BLOCKFALL_*` environment variables.
    ///
    /// Values that don't parse are ignored.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bag_pool = std::env::var("BLOCKFALL_BAG")
            .ok()
            .map(|s| s.trim().to_string())
            .and_then(|s| if s.is_empty() { None } else { Some(s) })
            .unwrap_or(defaults.bag_pool);

        Self {
            width: env_parse("BLOCKFALL_WIDTH").unwrap_or(defaults.width),
            height: env_parse("BLOCKFALL_HEIGHT").unwrap_or(defaults.height),
            visible_height: env_parse("BLOCKFALL_VISIBLE_HEIGHT").unwrap_or(defaults.visible_height),
            lock_delay_ms: env_parse("BLOCKFALL_LOCK_DELAY_MS").unwrap_or(defaults.lock_delay_ms),
            lock_reset_limit: env_parse("BLOCKFALL_LOCK_RESET_LIMIT")
                .unwrap_or(defaults.lock_reset_limit),
            bag_pool,
            seed: env_parse("BLOCKFALL_SEED").unwrap_or(defaults.seed),
            preview_len: defaults.preview_len,
        }
    }

    /// Check dimensions and parse the bag pool
    pub fn validate(&self) -> Result<Vec<PieceKind>, ConfigError> {
        if self.width < MIN_WIDTH || self.height == 0 || self.visible_height > self.height {
            return Err(ConfigError::InvalidDimensions {
                width: self.width,
                height: self.height,
                visible_height: self.visible_height,
            });
        }
        parse_pool(&self.bag_pool)
    }
}

/// Parse piece letters, ignoring whitespace and commas
pub fn parse_pool(pool: &str) -> Result<Vec<PieceKind>, ConfigError> {
    let kinds = pool
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .map(|c| PieceKind::from_char(c).ok_or(ConfigError::UnknownPiece(c)))
        .collect::<Result<Vec<_>, _>>()?;
    if kinds.is_empty() {
        return Err(ConfigError::EmptyPool);
    }
    Ok(kinds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let pool = RulesConfig::default().validate().unwrap();
        assert_eq!(pool, PieceKind::ALL.to_vec());
    }

    #[test]
    fn test_rejects_bad_dimensions() {
        for (w, h, v) in [(0, 22, 20), (11, 0, 0), (3, 22, 20), (11, 10, 20)] {
            let config = RulesConfig {
                width: w,
                height: h,
                visible_height: v,
                ..RulesConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidDimensions { .. })
            ));
        }
    }

    #[test]
    fn test_pool_parsing() {
        assert_eq!(parse_pool("t, i").unwrap(), vec![PieceKind::T, PieceKind::I]);
        assert_eq!(parse_pool("IOX"), Err(ConfigError::UnknownPiece('X')));
        assert_eq!(parse_pool("  "), Err(ConfigError::EmptyPool));
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: RulesConfig = serde_json::from_str(r#"{"width": 10, "seed": 7}"#).unwrap();
        assert_eq!(config.width, 10);
        assert_eq!(config.seed, 7);
        assert_eq!(config.height, 22);
        assert_eq!(config.lock_reset_limit, 15);
    }

    #[test]
    fn test_from_env_does_not_panic() {
        let _config = RulesConfig::from_env();
    }
}
