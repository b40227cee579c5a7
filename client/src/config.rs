//! Session configuration.
//!
//! ```yaml
//! game_type: WHEEL_OF_FORTUNE
//! tick_ms: 1000
//! log_level: info
//! rules:
//!   - min_bet: 50
//!   - game_type: WHEEL_OF_FORTUNE
//!     wheel_tolerance_degrees: 3.0
//!     payouts:
//!       SEGMENT: 180000
//! ```

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use roundtable_execution::{RuleBook, RulesError, RulesOverride};
use roundtable_types::{GameType, DEFAULT_TICK_MS};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;

fn default_tick_ms() -> u64 {
    DEFAULT_TICK_MS
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub game_type: GameType,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Operator overrides layered over the built-in game rules.
    #[serde(default)]
    pub rules: Vec<RulesOverride>,
    /// Maximum age of a cached resolution. Unset keeps entries until invalidated.
    #[serde(default)]
    pub cache_ttl_ms: Option<u64>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid yaml: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
    #[error("{field} must be > 0 (got {value})")]
    InvalidNonZero { field: &'static str, value: u64 },
    #[error("invalid rules: {0}")]
    InvalidRules(#[from] RulesError),
}

#[derive(Clone, Debug)]
pub struct ValidatedConfig {
    pub game_type: GameType,
    pub tick: Duration,
    pub log_level: Level,
    pub rules: RuleBook,
    pub cache_ttl_ms: Option<u64>,
}

fn ensure_nonzero_u64(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidNonZero { field, value });
    }
    Ok(())
}

impl Config {
    /// Defaults for `game_type`.
    pub fn new(game_type: GameType) -> Self {
        Self {
            game_type,
            tick_ms: default_tick_ms(),
            log_level: default_log_level(),
            rules: Vec::new(),
            cache_ttl_ms: None,
        }
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        ensure_nonzero_u64("tick_ms", self.tick_ms)?;
        if let Some(ttl) = self.cache_ttl_ms {
            ensure_nonzero_u64("cache_ttl_ms", ttl)?;
        }
        let log_level =
            Level::from_str(&self.log_level).map_err(|_| ConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            })?;
        let rules = RuleBook::with_overrides(&self.rules)?;

        Ok(ValidatedConfig {
            game_type: self.game_type,
            tick: Duration::from_millis(self.tick_ms),
            log_level,
            rules,
            cache_ttl_ms: self.cache_ttl_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roundtable_types::BetShape;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_yaml("game_type: COIN_TOSS\n").unwrap();
        assert_eq!(config, Config::new(GameType::CoinToss));

        let validated = config.validate().unwrap();
        assert_eq!(validated.tick, Duration::from_millis(1_000));
        assert_eq!(validated.log_level, Level::INFO);
        assert_eq!(
            validated
                .rules
                .get(GameType::CoinToss)
                .payout_bps(BetShape::CoinSide),
            Some(19_600)
        );
    }

    #[test]
    fn test_overrides_applied() {
        let raw = r#"
game_type: WHEEL_OF_FORTUNE
tick_ms: 250
log_level: debug
rules:
  - min_bet: 50
  - game_type: WHEEL_OF_FORTUNE
    wheel_tolerance_degrees: 3.0
    payouts:
      SEGMENT: 180000
"#;
        let validated = Config::from_yaml(raw).unwrap().validate().unwrap();
        assert_eq!(validated.tick, Duration::from_millis(250));
        assert_eq!(validated.log_level, Level::DEBUG);

        let wheel = validated.rules.get(GameType::WheelOfFortune);
        assert_eq!(wheel.min_bet, 50);
        assert_eq!(wheel.wheel_tolerance_degrees, 3.0);
        assert_eq!(wheel.payout_bps(BetShape::Segment), Some(180_000));
        assert_eq!(validated.rules.get(GameType::Aviator).min_bet, 50);
    }

    #[test]
    fn test_zero_tick_rejected() {
        let mut config = Config::new(GameType::Aviator);
        config.tick_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidNonZero { field: "tick_ms", value: 0 })
        ));
    }

    #[test]
    fn test_bad_log_level_rejected() {
        let mut config = Config::new(GameType::Aviator);
        config.log_level = "loud".to_string();
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "invalid log level: loud");
    }

    #[test]
    fn test_invalid_rules_rejected() {
        let raw = "game_type: COIN_TOSS\nrules:\n  - min_bet: 0\n";
        let err = Config::from_yaml(raw).unwrap().validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRules(RulesError::ZeroMinimum { .. })));
    }

    #[test]
    fn test_unknown_game_rejected() {
        assert!(matches!(
            Config::from_yaml("game_type: BACCARAT\n"),
            Err(ConfigError::Parse(_))
        ));
    }
}
