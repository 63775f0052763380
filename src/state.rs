use serde::{Deserialize, Serialize};

use crate::card::{Card, Color, Face};
use crate::player::PlayerId;

/// Lifecycle of a session.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum GameStatus {
    Waiting,
    Playing,
    Finished { winner: PlayerId },
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Waiting => "WAITING",
            GameStatus::Playing => "PLAYING",
            GameStatus::Finished { .. } => "FINISHED",
        }
    }
}

/// Direction of play around the table.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Direction {
    /// Increasing seat positions (+1).
    #[default]
    Forward,
    /// Decreasing seat positions (-1).
    Backward,
}

impl Direction {
    #[inline]
    pub fn step(&self) -> isize {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// Public view of a seated player. `hand` is present only while a game is in progress.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub position: usize,
    pub is_ready: bool,
    pub hand_size: usize,
    pub is_current: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hand: Option<Vec<Card>>,
}

/// Full session snapshot used for refresh and recovery after missed notifications.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub code: String,
    pub status: GameStatus,
    pub max_players: usize,
    pub players: Vec<PlayerView>,
    pub current_player_index: usize,
    pub direction: Direction,
    pub current_color: Option<Color>,
    pub current_value: Option<Face>,
    pub top_card: Option<Card>,
    pub deck_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deck: Option<Vec<Card>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discard_pile: Option<Vec<Card>>,
}

impl SessionSnapshot {
    pub fn current_player(&self) -> Option<&PlayerView> {
        match self.status {
            GameStatus::Playing => self.players.get(self.current_player_index),
            _ => None,
        }
    }

    pub fn player(&self, name: &str) -> Option<&PlayerView> {
        let wanted = name.trim().to_lowercase();
        self.players
            .iter()
            .find(|player| player.name.to_lowercase() == wanted)
    }
}
