//! Server configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_PACKS_DIR: &str = "data/packs";
pub const DEFAULT_WORD_PACK: &str = "standard-pack";
pub const DEFAULT_ROUND_SECS: u64 = 100;
pub const DEFAULT_COUNTDOWN_SECS: u64 = 3;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: String, value: String },
}

/// Round pacing shared by every room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundTiming {
    /// Full round length. Scoring and reveal checkpoints are fractions of it.
    pub round: Duration,
    /// Pause between `roundStarting` and `roundStarted`.
    pub countdown: Duration,
}

impl RoundTiming {
    /// Elapsed offsets at which time-based reveals fire: 25%, 50%, 75%.
    #[must_use]
    pub fn reveal_checkpoints(&self) -> [Duration; 3] {
        [self.round / 4, self.round / 2, self.round * 3 / 4]
    }
}

impl Default for RoundTiming {
    fn default() -> Self {
        Self {
            round: Duration::from_secs(DEFAULT_ROUND_SECS),
            countdown: Duration::from_secs(DEFAULT_COUNTDOWN_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub packs_dir: PathBuf,
    pub word_pack: String,
    pub timing: RoundTiming,
    pub static_dir: Option<PathBuf>,
}

impl Config {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `PACKS_DIR`: directory of `*.json` word packs, default `data/packs`
    /// - `WORD_PACK`: active pack name, default `standard-pack`
    /// - `ROUND_SECS`: default 100
    /// - `COUNTDOWN_SECS`: default 3
    /// - `STATIC_DIR`: serve client files from this directory when set
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable is set but does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. `from_env` delegates here.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric value does not parse or `ROUND_SECS` is zero.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;
        let round_secs = parse_or(&lookup, "ROUND_SECS", DEFAULT_ROUND_SECS)?;
        if round_secs == 0 {
            return Err(ConfigError::Invalid { key: "ROUND_SECS".into(), value: "0".into() });
        }
        let countdown_secs = parse_or(&lookup, "COUNTDOWN_SECS", DEFAULT_COUNTDOWN_SECS)?;

        Ok(Self {
            port,
            packs_dir: lookup("PACKS_DIR").map_or_else(|| PathBuf::from(DEFAULT_PACKS_DIR), PathBuf::from),
            word_pack: lookup("WORD_PACK").unwrap_or_else(|| DEFAULT_WORD_PACK.to_string()),
            timing: RoundTiming {
                round: Duration::from_secs(round_secs),
                countdown: Duration::from_secs(countdown_secs),
            },
            static_dir: lookup("STATIC_DIR").filter(|s| !s.is_empty()).map(PathBuf::from),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key: key.to_string(), value: raw }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
