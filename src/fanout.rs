//! Best-effort notification fan-out to the participants of a session.
//!
//! Events are refresh triggers: a subscriber that lags or misses one recovers by
//! re-reading the full session snapshot.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

use crate::card::{Card, Color};
use crate::player::PlayerId;

pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Published after each committed mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum Event {
    StateUpdated {
        code: String,
    },
    ReadyChanged {
        code: String,
        player: String,
        is_ready: bool,
    },
    GameStarted {
        code: String,
    },
    CardPlayed {
        code: String,
        player: String,
        card: Card,
        active_color: Option<Color>,
    },
    /// The drawn card itself is private to the drawing player.
    CardDrawn {
        code: String,
        player: String,
        cards: usize,
    },
    TurnChanged {
        code: String,
        current_player_index: usize,
    },
    GameEnded {
        code: String,
        winner: PlayerId,
        winner_name: String,
    },
    PlayerLeft {
        code: String,
        player: String,
    },
}

impl Event {
    pub fn code(&self) -> &str {
        match self {
            Event::StateUpdated { code }
            | Event::ReadyChanged { code, .. }
            | Event::GameStarted { code }
            | Event::CardPlayed { code, .. }
            | Event::CardDrawn { code, .. }
            | Event::TurnChanged { code, .. }
            | Event::GameEnded { code, .. }
            | Event::PlayerLeft { code, .. } => code,
        }
    }
}

/// Per-session broadcast channels, keyed by session code. Connection tracking lives here,
/// never in the game record.
pub struct Fanout {
    capacity: usize,
    channels: Mutex<HashMap<String, broadcast::Sender<Event>>>,
}

impl Default for Fanout {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl Fanout {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            channels: Mutex::new(HashMap::new()),
        }
    }

    fn channels(&self) -> MutexGuard<'_, HashMap<String, broadcast::Sender<Event>>> {
        self.channels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn subscribe(&self, code: &str) -> broadcast::Receiver<Event> {
        let mut channels = self.channels();
        channels
            .entry(code.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Delivers to whoever is listening and returns how many receivers got the event.
    /// Nobody listening is not an error.
    pub fn publish(&self, event: Event) -> usize {
        let channels = self.channels();
        let Some(sender) = channels.get(event.code()) else {
            trace!(code = %event.code(), "no subscribers for event");
            return 0;
        };
        sender.send(event).unwrap_or(0)
    }

    pub fn publish_all(&self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            self.publish(event);
        }
    }

    pub fn subscriber_count(&self, code: &str) -> usize {
        self.channels()
            .get(code)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    pub fn has_channel(&self, code: &str) -> bool {
        self.channels().contains_key(code)
    }

    /// Drops the channel of a destroyed session; open receivers observe it as closed.
    pub fn forget(&self, code: &str) {
        self.channels().remove(code);
    }
}
