//! Table configuration.
//!
//! Resolution order is defaults, then the TOML file named by
//! `BACCARAT_CONFIG`, then individual `BACCARAT_*` environment variables.
//! Every resolved value remembers where it came from.

use std::fs;

use baccarat_engine::payout::{Odds, PayoutTable};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    pub database: String,
    pub payouts: PayoutTable,
    pub lobby: LobbyConfig,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            database: "baccarat.db".into(),
            payouts: PayoutTable::default(),
            lobby: LobbyConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyConfig {
    pub enabled: bool,
    /// Seconds between the start of consecutive lobby rounds
    pub interval_secs: u64,
    /// Seconds a lobby round accepts bets
    pub betting_window_secs: u64,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 60,
            betting_window_secs: 45,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    Default,
    File,
    Env,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfigSources {
    pub database: ValueSource,
    pub player_odds: ValueSource,
    pub banker_odds: ValueSource,
    pub tie_odds: ValueSource,
    pub lucky6_two_card_odds: ValueSource,
    pub lucky6_three_card_odds: ValueSource,
    pub banker_lucky6_two_card_odds: ValueSource,
    pub banker_lucky6_three_card_odds: ValueSource,
    pub lobby_enabled: ValueSource,
    pub lobby_interval_secs: ValueSource,
    pub lobby_betting_window_secs: ValueSource,
}

impl Default for ConfigSources {
    fn default() -> Self {
        Self {
            database: ValueSource::Default,
            player_odds: ValueSource::Default,
            banker_odds: ValueSource::Default,
            tie_odds: ValueSource::Default,
            lucky6_two_card_odds: ValueSource::Default,
            lucky6_three_card_odds: ValueSource::Default,
            banker_lucky6_two_card_odds: ValueSource::Default,
            banker_lucky6_three_card_odds: ValueSource::Default,
            lobby_enabled: ValueSource::Default,
            lobby_interval_secs: ValueSource::Default,
            lobby_betting_window_secs: ValueSource::Default,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigResolved {
    pub config: TableConfig,
    pub sources: ConfigSources,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    database: Option<String>,
    #[serde(default)]
    payouts: FilePayouts,
    #[serde(default)]
    lobby: FileLobby,
}

#[derive(Debug, Default, Deserialize)]
struct FilePayouts {
    player_odds: Option<Odds>,
    banker_odds: Option<Odds>,
    tie_odds: Option<Odds>,
    lucky6_two_card_odds: Option<Odds>,
    lucky6_three_card_odds: Option<Odds>,
    banker_lucky6_two_card_odds: Option<Odds>,
    banker_lucky6_three_card_odds: Option<Odds>,
}

#[derive(Debug, Default, Deserialize)]
struct FileLobby {
    enabled: Option<bool>,
    interval_secs: Option<u64>,
    betting_window_secs: Option<u64>,
}

/// Resolves the configuration from the process environment.
pub fn load_with_sources() -> Result<ConfigResolved, ConfigError> {
    load_from(|key| std::env::var(key).ok())
}

/// Resolves the configuration with `env` standing in for the process
/// environment.
pub fn load_from(env: impl Fn(&str) -> Option<String>) -> Result<ConfigResolved, ConfigError> {
    let env = |key: &str| env(key).filter(|v| !v.is_empty());
    let mut cfg = TableConfig::default();
    let mut sources = ConfigSources::default();

    if let Some(path) = env("BACCARAT_CONFIG") {
        let s = fs::read_to_string(path)?;
        let f: FileConfig = toml::from_str(&s)?;
        apply_file(&mut cfg, &mut sources, f);
    }

    if let Some(db) = env("BACCARAT_DATABASE") {
        cfg.database = db;
        sources.database = ValueSource::Env;
    }

    let p = &mut cfg.payouts;
    let s = &mut sources;
    for (key, slot, source) in [
        ("BACCARAT_PLAYER_ODDS", &mut p.player_odds, &mut s.player_odds),
        ("BACCARAT_BANKER_ODDS", &mut p.banker_odds, &mut s.banker_odds),
        ("BACCARAT_TIE_ODDS", &mut p.tie_odds, &mut s.tie_odds),
        (
            "BACCARAT_LUCKY6_TWO_CARD_ODDS",
            &mut p.lucky6_two_card_odds,
            &mut s.lucky6_two_card_odds,
        ),
        (
            "BACCARAT_LUCKY6_THREE_CARD_ODDS",
            &mut p.lucky6_three_card_odds,
            &mut s.lucky6_three_card_odds,
        ),
        (
            "BACCARAT_BANKER_LUCKY6_TWO_CARD_ODDS",
            &mut p.banker_lucky6_two_card_odds,
            &mut s.banker_lucky6_two_card_odds,
        ),
        (
            "BACCARAT_BANKER_LUCKY6_THREE_CARD_ODDS",
            &mut p.banker_lucky6_three_card_odds,
            &mut s.banker_lucky6_three_card_odds,
        ),
    ] {
        if let Some(raw) = env(key) {
            *slot = parse_odds(key, &raw)?;
            *source = ValueSource::Env;
        }
    }

    if let Some(v) = env("BACCARAT_LOBBY_ENABLED") {
        cfg.lobby.enabled = parse_bool(&v)
            .ok_or_else(|| ConfigError::Invalid("Invalid BACCARAT_LOBBY_ENABLED".into()))?;
        sources.lobby_enabled = ValueSource::Env;
    }
    if let Some(v) = env("BACCARAT_LOBBY_INTERVAL_SECS") {
        cfg.lobby.interval_secs = v
            .parse()
            .map_err(|_| ConfigError::Invalid("Invalid BACCARAT_LOBBY_INTERVAL_SECS".into()))?;
        sources.lobby_interval_secs = ValueSource::Env;
    }
    if let Some(v) = env("BACCARAT_LOBBY_WINDOW_SECS") {
        cfg.lobby.betting_window_secs = v
            .parse()
            .map_err(|_| ConfigError::Invalid("Invalid BACCARAT_LOBBY_WINDOW_SECS".into()))?;
        sources.lobby_betting_window_secs = ValueSource::Env;
    }

    validate(&cfg)?;
    Ok(ConfigResolved {
        config: cfg,
        sources,
    })
}

fn apply_file(cfg: &mut TableConfig, sources: &mut ConfigSources, f: FileConfig) {
    if let Some(v) = f.database {
        cfg.database = v;
        sources.database = ValueSource::File;
    }
    let p = &mut cfg.payouts;
    let s = sources;
    for (value, slot, source) in [
        (f.payouts.player_odds, &mut p.player_odds, &mut s.player_odds),
        (f.payouts.banker_odds, &mut p.banker_odds, &mut s.banker_odds),
        (f.payouts.tie_odds, &mut p.tie_odds, &mut s.tie_odds),
        (
            f.payouts.lucky6_two_card_odds,
            &mut p.lucky6_two_card_odds,
            &mut s.lucky6_two_card_odds,
        ),
        (
            f.payouts.lucky6_three_card_odds,
            &mut p.lucky6_three_card_odds,
            &mut s.lucky6_three_card_odds,
        ),
        (
            f.payouts.banker_lucky6_two_card_odds,
            &mut p.banker_lucky6_two_card_odds,
            &mut s.banker_lucky6_two_card_odds,
        ),
        (
            f.payouts.banker_lucky6_three_card_odds,
            &mut p.banker_lucky6_three_card_odds,
            &mut s.banker_lucky6_three_card_odds,
        ),
    ] {
        if let Some(v) = value {
            *slot = v;
            *source = ValueSource::File;
        }
    }
    if let Some(v) = f.lobby.enabled {
        cfg.lobby.enabled = v;
        s.lobby_enabled = ValueSource::File;
    }
    if let Some(v) = f.lobby.interval_secs {
        cfg.lobby.interval_secs = v;
        s.lobby_interval_secs = ValueSource::File;
    }
    if let Some(v) = f.lobby.betting_window_secs {
        cfg.lobby.betting_window_secs = v;
        s.lobby_betting_window_secs = ValueSource::File;
    }
}

fn parse_odds(key: &str, raw: &str) -> Result<Odds, ConfigError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("Invalid {key}: '{raw}' is not a number")))?;
    Odds::try_from(value).map_err(|e| ConfigError::Invalid(format!("Invalid {key}: {e}")))
}

pub fn validate(cfg: &TableConfig) -> Result<(), ConfigError> {
    if cfg.database.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "Invalid configuration: database path must not be empty".into(),
        ));
    }
    cfg.lobby.validate()
}

impl LobbyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.betting_window_secs == 0 {
            return Err(ConfigError::Invalid(
                "Invalid configuration: betting window must be >0".into(),
            ));
        }
        if self.betting_window_secs >= self.interval_secs {
            return Err(ConfigError::Invalid(
                "Invalid configuration: betting window must be shorter than the round interval"
                    .into(),
            ));
        }
        Ok(())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let resolved = load_from(env_of(&[])).unwrap();
        assert_eq!(resolved.config, TableConfig::default());
        assert_eq!(resolved.sources, ConfigSources::default());
        assert_eq!(resolved.config.payouts.tie_odds.bps(), 80_000);
    }

    #[test]
    fn env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.toml");
        fs::write(
            &path,
            "database = \"file.db\"\n\
             [payouts]\n\
             tie_odds = 9\n\
             banker_odds = 0.95\n\
             [lobby]\n\
             interval_secs = 30\n\
             betting_window_secs = 20\n",
        )
        .unwrap();
        let path = path.to_string_lossy().to_string();
        let resolved = load_from(env_of(&[
            ("BACCARAT_CONFIG", path.as_str()),
            ("BACCARAT_TIE_ODDS", "7.5"),
        ]))
        .unwrap();
        let cfg = &resolved.config;
        assert_eq!(cfg.database, "file.db");
        assert_eq!(resolved.sources.database, ValueSource::File);
        assert_eq!(cfg.payouts.banker_odds.bps(), 9_500);
        assert_eq!(resolved.sources.banker_odds, ValueSource::File);
        assert_eq!(cfg.payouts.tie_odds.bps(), 75_000);
        assert_eq!(resolved.sources.tie_odds, ValueSource::Env);
        assert_eq!(cfg.lobby.interval_secs, 30);
        assert_eq!(resolved.sources.player_odds, ValueSource::Default);
    }

    #[test]
    fn negative_odds_are_rejected() {
        let err = load_from(env_of(&[("BACCARAT_PLAYER_ODDS", "-1")])).unwrap_err();
        assert!(err.to_string().contains("BACCARAT_PLAYER_ODDS"));
    }

    #[test]
    fn window_must_be_shorter_than_interval() {
        let err = load_from(env_of(&[
            ("BACCARAT_LOBBY_INTERVAL_SECS", "10"),
            ("BACCARAT_LOBBY_WINDOW_SECS", "10"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = load_from(env_of(&[("BACCARAT_LOBBY_WINDOW_SECS", "0")])).unwrap_err();
        assert!(err.to_string().contains(">0"));
    }

    #[test]
    fn lobby_flag_accepts_common_spellings() {
        let resolved = load_from(env_of(&[("BACCARAT_LOBBY_ENABLED", "yes")])).unwrap();
        assert!(resolved.config.lobby.enabled);
        assert_eq!(resolved.sources.lobby_enabled, ValueSource::Env);
        assert!(load_from(env_of(&[("BACCARAT_LOBBY_ENABLED", "maybe")])).is_err());
    }

    #[test]
    fn missing_config_file_is_an_io_error() {
        let err = load_from(env_of(&[("BACCARAT_CONFIG", "/nonexistent/baccarat.toml")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
