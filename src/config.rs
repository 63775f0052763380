use crate::card::HAND_SIZE;
use crate::error::GameError;
use crate::fanout::DEFAULT_CHANNEL_CAPACITY;
use crate::game::{DEFAULT_MAX_PLAYERS, GameConfig};

pub const DEFAULT_CODE_LENGTH: usize = 6;
const MIN_CODE_LENGTH: usize = 4;
const MAX_CODE_LENGTH: usize = 12;

/// Settings for a [`SessionService`](crate::service::SessionService).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceConfig {
    pub max_players: usize,
    pub hand_size: usize,
    pub code_length: usize,
    pub reshuffle_discard: bool,
    /// Fixed seed for every session's shuffle. Random per session when unset.
    pub seed: Option<u64>,
    pub channel_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_players: DEFAULT_MAX_PLAYERS,
            hand_size: HAND_SIZE,
            code_length: DEFAULT_CODE_LENGTH,
            reshuffle_discard: false,
            seed: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl ServiceConfig {
    /// Reads `CARDROOM_*` environment variables, falling back to defaults for anything
    /// missing or unparsable.
    pub fn from_env() -> Result<Self, GameError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GameError> {
        let defaults = Self::default();
        let config = Self {
            max_players: read(&lookup, "CARDROOM_MAX_PLAYERS", defaults.max_players),
            hand_size: read(&lookup, "CARDROOM_HAND_SIZE", defaults.hand_size),
            code_length: read(&lookup, "CARDROOM_CODE_LENGTH", defaults.code_length),
            reshuffle_discard: read(&lookup, "CARDROOM_RESHUFFLE", defaults.reshuffle_discard),
            seed: lookup("CARDROOM_SEED").and_then(|raw| raw.trim().parse().ok()),
            channel_capacity: read(
                &lookup,
                "CARDROOM_CHANNEL_CAPACITY",
                defaults.channel_capacity,
            ),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_players(mut self, max_players: usize) -> Self {
        self.max_players = max_players;
        self
    }

    pub fn with_reshuffle(mut self, enabled: bool) -> Self {
        self.reshuffle_discard = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), GameError> {
        if !(MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&self.code_length) {
            return Err(GameError::InvalidConfiguration(
                "code length must be between 4 and 12",
            ));
        }
        self.game_config(0).validate()
    }

    /// Table rules for a new session shuffled with `seed`.
    pub fn game_config(&self, seed: u64) -> GameConfig {
        GameConfig {
            max_players: self.max_players,
            hand_size: self.hand_size,
            seed,
            reshuffle_discard: self.reshuffle_discard,
        }
    }
}

fn read<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    fallback: T,
) -> T {
    lookup(key)
        .and_then(|raw| raw.trim().parse::<T>().ok())
        .unwrap_or(fallback)
}
