use serde::{Deserialize, Serialize};

use crate::card::Color;

/// Action available to a player during their turn.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Play the card at `hand_index`. Wild cards need a nominated color.
    Play {
        hand_index: usize,
        chosen_color: Option<Color>,
    },
    /// Take the top card of the deck; this ends the turn.
    Draw,
    /// Give up the turn. Only legal when nothing is left to draw.
    Pass,
}

impl Action {
    /// Returns the hand index if the action is a play.
    pub fn hand_index(&self) -> Option<usize> {
        match self {
            Action::Play { hand_index, .. } => Some(*hand_index),
            _ => None,
        }
    }
}
