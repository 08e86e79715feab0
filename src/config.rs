//! Configuration for the bingopool engine and its HTTP surface.
//!
//! Defaults cover a classic 5x5 card over numbers 1..=75 with a center free
//! space. Values load from a TOML file, then `BINGO_*` environment variables
//! override, then the result is validated before anything is built from it.

use crate::errors::{BingoError, BingoResult};
use crate::token::Amount;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Full configuration: game rules plus API server settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BingoConfig {
    pub game: GameConfig,
    pub api: ApiConfig,
}

/// Rules applied to every game the engine creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Entry fee in smallest token units. Must be positive.
    pub entry_fee: Amount,
    /// Grid dimension; a `board_size x board_size` card.
    pub board_size: u8,
    /// Flat index of the automatically covered cell, if any.
    pub free_space_index: Option<u8>,
    /// Numbers are drawn from `1..=universe`.
    pub universe: u8,
    /// Whether players may still join after the first draw.
    pub allow_late_join: bool,
    /// Ledger account that escrows all pools.
    pub escrow_account: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            entry_fee: 1_000_000,
            board_size: 5,
            free_space_index: Some(12),
            universe: 75,
            allow_late_join: true,
            escrow_account: "bingopool-escrow".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
        }
    }
}

/// Loader with file, environment and validation stages.
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load, apply env overrides, validate.
    pub fn load(&self) -> BingoResult<BingoConfig> {
        let mut config = match &self.config_path {
            Some(path) => self.load_from_file(path)?,
            None => BingoConfig::default(),
        };

        self.apply_env_overrides(&mut config)?;
        validate(&config)?;
        Ok(config)
    }

    fn load_from_file(&self, path: &str) -> BingoResult<BingoConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BingoError::Config(format!("failed to read {}: {}", path, e)))?;
        toml::from_str(&content)
            .map_err(|e| BingoError::Config(format!("failed to parse {}: {}", path, e)))
    }

    fn apply_env_overrides(&self, config: &mut BingoConfig) -> BingoResult<()> {
        if let Ok(fee) = env::var("BINGO_ENTRY_FEE") {
            config.game.entry_fee = parse_env("BINGO_ENTRY_FEE", &fee)?;
        }
        if let Ok(size) = env::var("BINGO_BOARD_SIZE") {
            config.game.board_size = parse_env("BINGO_BOARD_SIZE", &size)?;
        }
        if let Ok(universe) = env::var("BINGO_UNIVERSE") {
            config.game.universe = parse_env("BINGO_UNIVERSE", &universe)?;
        }
        if let Ok(free) = env::var("BINGO_FREE_SPACE_INDEX") {
            // "none" or an empty value turns the free space off.
            config.game.free_space_index = if free.is_empty() || free.eq_ignore_ascii_case("none")
            {
                None
            } else {
                Some(parse_env("BINGO_FREE_SPACE_INDEX", &free)?)
            };
        }
        if let Ok(escrow) = env::var("BINGO_ESCROW_ACCOUNT") {
            config.game.escrow_account = escrow;
        }
        if let Ok(late) = env::var("BINGO_ALLOW_LATE_JOIN") {
            config.game.allow_late_join = parse_env("BINGO_ALLOW_LATE_JOIN", &late)?;
        }
        if let Ok(host) = env::var("BINGO_API_HOST") {
            config.api.host = host;
        }
        if let Ok(port) = env::var("BINGO_API_PORT") {
            config.api.port = parse_env("BINGO_API_PORT", &port)?;
        }
        Ok(())
    }

    /// Write the configuration out as pretty TOML.
    pub fn save(&self, config: &BingoConfig, path: &str) -> BingoResult<()> {
        let toml_string = toml::to_string_pretty(config)
            .map_err(|e| BingoError::Config(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, toml_string)
            .map_err(|e| BingoError::Config(format!("failed to write {}: {}", path, e)))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> BingoResult<T> {
    value
        .parse()
        .map_err(|_| BingoError::Config(format!("invalid value for {}: '{}'", name, value)))
}

/// Reject configurations the engine cannot honor.
pub fn validate(config: &BingoConfig) -> BingoResult<()> {
    let game = &config.game;
    let cells = game.board_size as usize * game.board_size as usize;

    if game.entry_fee == 0 {
        return Err(BingoError::Config("entry_fee must be positive".to_string()));
    }
    // The covered mask is one 64-bit word.
    if !(2..=8).contains(&game.board_size) {
        return Err(BingoError::Config(format!(
            "board_size must be between 2 and 8, got {}",
            game.board_size
        )));
    }
    // Boards hold distinct numbers, so the universe must at least fill a card.
    if (game.universe as usize) < cells {
        return Err(BingoError::Config(format!(
            "universe {} cannot fill a {}x{} board of {} cells",
            game.universe, game.board_size, game.board_size, cells
        )));
    }
    if let Some(free) = game.free_space_index {
        if free as usize >= cells {
            return Err(BingoError::Config(format!(
                "free_space_index {} is outside the {} cell grid",
                free, cells
            )));
        }
    }
    if game.escrow_account.is_empty() {
        return Err(BingoError::Config("escrow_account must be set".to_string()));
    }
    if config.api.port == 0 {
        return Err(BingoError::Config("api.port cannot be zero".to_string()));
    }
    Ok(())
}
