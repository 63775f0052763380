//! Multiplayer session manager for a shedding card game: rooms, readiness, and a turn
//! engine that keeps hands, deck and discard pile consistent under concurrent requests.

pub mod action;
pub mod bot;
pub mod bots;
pub mod card;
pub mod config;
pub mod error;
pub mod fanout;
pub mod game;
pub mod player;
pub mod rules;
pub mod service;
pub mod state;
pub mod store;

pub use crate::action::Action;
pub use crate::bot::Bot;
pub use crate::bots::{HeuristicBot, RandomBot, create_bot_from_spec, label_for_spec};
pub use crate::card::{Card, CardKind, Color, Deck, Face, full_deck, shuffle};
pub use crate::config::ServiceConfig;
pub use crate::error::{GameError, InvalidAction, StoreError};
pub use crate::fanout::{Event, Fanout};
pub use crate::game::{
    ActionOutcome, DrawOutcome, Game, GameBuilder, GameConfig, LeaveOutcome, Penalty,
    PlayOutcome,
};
pub use crate::player::{Player, PlayerId};
pub use crate::rules::{can_play, next_index};
pub use crate::service::{
    CreatedSession, Joined, ReadyChanged, SessionService, Started, TurnPassed, normalize_code,
};
pub use crate::state::{Direction, GameStatus, PlayerView, SessionSnapshot};
pub use crate::store::{MemoryStore, SessionStore};
