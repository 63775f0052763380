use thiserror::Error;

use crate::card::{Card, Color};

/// Errors that can occur when manipulating a session.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("session {0} not found")]
    SessionNotFound(String),
    #[error("player {0} is not in this session")]
    PlayerNotFound(String),
    #[error("name {0} is already taken")]
    NameTaken(String),
    #[error("session is full ({max_players} players)")]
    RoomFull { max_players: usize },
    #[error("session is not waiting for players")]
    NotWaiting,
    #[error("game is not in progress")]
    NotPlaying,
    #[error("not the specified player's turn")]
    NotYourTurn,
    #[error("no cards left to draw")]
    EmptyDeck,
    #[error("need at least {required} players to start, have {present}")]
    InsufficientPlayers { required: usize, present: usize },
    #[error("all players must be ready to start")]
    PlayersNotReady,
    #[error("invalid action: {0}")]
    InvalidAction(#[from] InvalidAction),
    #[error("session storage failure: {0}")]
    Storage(#[from] StoreError),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),
}

impl GameError {
    /// Machine-readable error kind for callers that map errors onto responses.
    pub fn kind(&self) -> &'static str {
        match self {
            GameError::SessionNotFound(_) => "session_not_found",
            GameError::PlayerNotFound(_) => "player_not_found",
            GameError::NameTaken(_) => "name_taken",
            GameError::RoomFull { .. } => "room_full",
            GameError::NotWaiting => "not_waiting",
            GameError::NotPlaying => "not_playing",
            GameError::NotYourTurn => "not_your_turn",
            GameError::EmptyDeck => "empty_deck",
            GameError::InsufficientPlayers { .. } => "insufficient_players",
            GameError::PlayersNotReady => "players_not_ready",
            GameError::InvalidAction(action) => action.kind(),
            GameError::Storage(_) => "storage_unavailable",
            GameError::InvalidConfiguration(_) => "invalid_configuration",
        }
    }

    /// Storage failures are infrastructure faults, everything else is a rule violation.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, GameError::Storage(_))
    }
}

/// Details of invalid player input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidAction {
    #[error("hand index {0} is out of range")]
    CardIndex(usize),
    #[error("{card} cannot be played on {top} while the active color is {color}")]
    IllegalMove { card: Card, top: Card, color: Color },
    #[error("a color must be chosen when playing a wild card")]
    ColorRequired,
    #[error("cards are still available to draw")]
    MustDraw,
    #[error("player name must not be empty")]
    InvalidName,
    #[error("malformed card")]
    InvalidCard,
}

impl InvalidAction {
    pub fn kind(&self) -> &'static str {
        match self {
            InvalidAction::CardIndex(_) => "invalid_card_index",
            InvalidAction::IllegalMove { .. } => "illegal_move",
            InvalidAction::ColorRequired => "color_required",
            InvalidAction::MustDraw => "must_draw",
            InvalidAction::InvalidName => "invalid_name",
            InvalidAction::InvalidCard => "invalid_card",
        }
    }
}

/// Failures of the session record store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("corrupt session record: {0}")]
    Codec(String),
}
