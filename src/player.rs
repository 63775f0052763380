use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::card::{Card, HAND_SIZE};

/// Stable identity of a player for the lifetime of a session.
pub type PlayerId = Uuid;

/// A seated player. The hand is only meaningful once the game has started.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub position: usize,
    pub is_ready: bool,
    pub hand: Vec<Card>,
}

impl Player {
    pub fn new(name: impl Into<String>, position: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            position,
            is_ready: false,
            hand: Vec::with_capacity(HAND_SIZE),
        }
    }

    /// Names are compared case-insensitively and without surrounding whitespace.
    pub fn answers_to(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}
