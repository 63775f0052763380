//! Request/response surface over the turn engine.
//!
//! Each mutation runs under a per-session lock: load the record, apply the transition to
//! the loaded copy, save it, release the lock, then publish events. A failed transition
//! drops the copy so nothing partial is ever stored. Different sessions never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex as AsyncMutex, broadcast};
use tracing::{debug, error, info};

use crate::action::Action;
use crate::card::Color;
use crate::config::ServiceConfig;
use crate::error::GameError;
use crate::fanout::{Event, Fanout};
use crate::game::{DrawOutcome, Game, GameBuilder, LeaveOutcome, PlayOutcome};
use crate::player::PlayerId;
use crate::state::{GameStatus, SessionSnapshot};
use crate::store::{MemoryStore, SessionStore};

const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedSession {
    pub code: String,
    pub player_id: PlayerId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Joined {
    pub code: String,
    pub player_id: PlayerId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyChanged {
    pub is_ready: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Started {
    pub status: GameStatus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnPassed {
    pub next_player_index: usize,
}

/// Session codes are case-insensitive; they are stored upper-case.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Entry point for all player actions.
pub struct SessionService {
    config: ServiceConfig,
    store: Arc<dyn SessionStore>,
    fanout: Arc<Fanout>,
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl Default for SessionService {
    fn default() -> Self {
        Self::new(ServiceConfig::default(), Arc::new(MemoryStore::new()))
    }
}

impl SessionService {
    pub fn new(config: ServiceConfig, store: Arc<dyn SessionStore>) -> Self {
        let fanout = Arc::new(Fanout::new(config.channel_capacity));
        Self {
            config,
            store,
            fanout,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn fanout(&self) -> &Arc<Fanout> {
        &self.fanout
    }

    pub async fn create_session(&self, host_name: &str) -> Result<CreatedSession, GameError> {
        loop {
            let code = self.generate_code();
            let seed = self.config.seed.unwrap_or_else(rand::random);
            let mut game = GameBuilder::new(code.as_str())
                .with_config(self.config.game_config(seed))
                .build()?;
            let player_id = game.join(host_name)?;

            let lock = self.lock_for(&code);
            let saved = {
                let _guard = lock.lock().await;
                self.create_locked(&game)
            };
            drop(lock);
            self.release_lock(&code);
            match saved {
                Ok(true) => {}
                Ok(false) => {
                    debug!(%code, "session code collision, regenerating");
                    continue;
                }
                Err(err) => return Err(self.log_failure("create", &code, err)),
            }

            info!(%code, host = %host_name.trim(), "session created");
            self.fanout.publish(Event::StateUpdated { code: code.clone() });
            return Ok(CreatedSession { code, player_id });
        }
    }

    pub async fn join_session(&self, code: &str, name: &str) -> Result<Joined, GameError> {
        let (player_id, game) = self.mutate(code, "join", |game| game.join(name)).await?;
        self.fanout.publish(Event::StateUpdated {
            code: game.code().to_string(),
        });
        Ok(Joined {
            code: game.code().to_string(),
            player_id,
        })
    }

    pub async fn set_ready(
        &self,
        code: &str,
        name: &str,
        is_ready: bool,
    ) -> Result<ReadyChanged, GameError> {
        let (is_ready, game) = self
            .mutate(code, "ready", |game| game.set_ready(name, is_ready))
            .await?;
        let code = game.code().to_string();
        self.fanout.publish_all([
            Event::ReadyChanged {
                code: code.clone(),
                player: canonical_name(&game, name),
                is_ready,
            },
            Event::StateUpdated { code },
        ]);
        Ok(ReadyChanged { is_ready })
    }

    pub async fn start_game(&self, code: &str, name: &str) -> Result<Started, GameError> {
        let ((), game) = self.mutate(code, "start", |game| game.start(name)).await?;
        let code = game.code().to_string();
        info!(%code, players = game.players().len(), "game started");
        self.fanout.publish_all([
            Event::GameStarted { code: code.clone() },
            Event::TurnChanged {
                code: code.clone(),
                current_player_index: game.current_player_index(),
            },
            Event::StateUpdated { code },
        ]);
        Ok(Started {
            status: game.status(),
        })
    }

    pub async fn play_card(
        &self,
        code: &str,
        name: &str,
        hand_index: usize,
        chosen_color: Option<Color>,
    ) -> Result<PlayOutcome, GameError> {
        let (outcome, game) = self
            .mutate(code, "play", |game| {
                game.play_card(name, hand_index, chosen_color)
            })
            .await?;
        let code = game.code().to_string();
        let mut events = vec![Event::CardPlayed {
            code: code.clone(),
            player: canonical_name(&game, name),
            card: outcome.card,
            active_color: outcome.active_color,
        }];
        if let Some(penalty) = outcome.penalty {
            if let Some(victim) = game.players().get(penalty.player_index) {
                events.push(Event::CardDrawn {
                    code: code.clone(),
                    player: victim.name.clone(),
                    cards: penalty.cards_drawn,
                });
            }
        }
        events.push(self.turn_or_end_event(&game));
        events.push(Event::StateUpdated { code });
        self.fanout.publish_all(events);
        Ok(outcome)
    }

    pub async fn draw_card(&self, code: &str, name: &str) -> Result<DrawOutcome, GameError> {
        let (outcome, game) = self.mutate(code, "draw", |game| game.draw_card(name)).await?;
        let code = game.code().to_string();
        self.fanout.publish_all([
            Event::CardDrawn {
                code: code.clone(),
                player: canonical_name(&game, name),
                cards: 1,
            },
            Event::TurnChanged {
                code: code.clone(),
                current_player_index: outcome.next_player_index,
            },
            Event::StateUpdated { code },
        ]);
        Ok(outcome)
    }

    pub async fn pass_turn(&self, code: &str, name: &str) -> Result<TurnPassed, GameError> {
        let (next_player_index, game) =
            self.mutate(code, "pass", |game| game.pass_turn(name)).await?;
        let code = game.code().to_string();
        self.fanout.publish_all([
            Event::TurnChanged {
                code: code.clone(),
                current_player_index: next_player_index,
            },
            Event::StateUpdated { code },
        ]);
        Ok(TurnPassed { next_player_index })
    }

    /// Removes the player; the session is destroyed when its last player leaves.
    pub async fn leave_session(&self, code: &str, name: &str) -> Result<LeaveOutcome, GameError> {
        let ((outcome, was_playing), game) = self
            .mutate(code, "leave", |game| {
                let was_playing = game.status() == GameStatus::Playing;
                game.leave(name).map(|outcome| (outcome, was_playing))
            })
            .await?;
        let code = game.code().to_string();
        let mut events = vec![Event::PlayerLeft {
            code: code.clone(),
            player: outcome.name.clone(),
        }];
        if outcome.room_empty {
            info!(%code, "last player left, session destroyed");
            self.fanout.publish_all(events);
            self.fanout.forget(&code);
            return Ok(outcome);
        }
        if was_playing {
            events.push(self.turn_or_end_event(&game));
        }
        events.push(Event::StateUpdated { code });
        self.fanout.publish_all(events);
        Ok(outcome)
    }

    /// Full-state read used for refresh after a missed or dropped notification.
    pub async fn get_state(&self, code: &str) -> Result<SessionSnapshot, GameError> {
        let code = normalize_code(code);
        let game = self
            .store
            .load(&code)
            .map_err(|err| self.log_failure("state", &code, err.into()))?
            .ok_or(GameError::SessionNotFound(code))?;
        Ok(game.snapshot())
    }

    /// Actions the named player may currently take; used by automated players.
    pub async fn legal_actions(
        &self,
        code: &str,
        name: &str,
    ) -> Result<Vec<Action>, GameError> {
        let code = normalize_code(code);
        let game = self
            .store
            .load(&code)
            .map_err(|err| self.log_failure("legal_actions", &code, err.into()))?
            .ok_or(GameError::SessionNotFound(code))?;
        game.legal_actions(name)
    }

    /// Opens a receiver for the session's events.
    ///
    /// The channel is opened before the existence check: a last leave that deletes the
    /// session afterwards also forgets the channel, and one that deleted it before is caught
    /// by the check.
    pub fn subscribe(&self, code: &str) -> Result<broadcast::Receiver<Event>, GameError> {
        let code = normalize_code(code);
        let receiver = self.fanout.subscribe(&code);
        match self.store.contains(&code) {
            Ok(true) => Ok(receiver),
            Ok(false) => {
                self.fanout.forget(&code);
                Err(GameError::SessionNotFound(code))
            }
            Err(err) => {
                self.fanout.forget(&code);
                Err(self.log_failure("subscribe", &code, err.into()))
            }
        }
    }

    async fn mutate<T>(
        &self,
        code: &str,
        action: &'static str,
        apply: impl FnOnce(&mut Game) -> Result<T, GameError>,
    ) -> Result<(T, Game), GameError> {
        let code = normalize_code(code);
        let lock = self.lock_for(&code);
        let result = {
            let _guard = lock.lock().await;
            self.mutate_locked(&code, apply)
        };
        drop(lock);
        self.release_lock(&code);
        match result {
            Ok((value, game)) => {
                debug!(%code, action, status = game.status().as_str(), "session updated");
                Ok((value, game))
            }
            Err(err) => Err(self.log_failure(action, &code, err)),
        }
    }

    fn mutate_locked<T>(
        &self,
        code: &str,
        apply: impl FnOnce(&mut Game) -> Result<T, GameError>,
    ) -> Result<(T, Game), GameError> {
        let mut game = self
            .store
            .load(code)?
            .ok_or_else(|| GameError::SessionNotFound(code.to_string()))?;
        let value = apply(&mut game)?;
        if game.players().is_empty() {
            self.store.delete(code)?;
        } else {
            self.store.save(&game)?;
        }
        Ok((value, game))
    }

    /// Saves a new session unless its code is already taken. Returns false on a collision.
    fn create_locked(&self, game: &Game) -> Result<bool, GameError> {
        if self.store.contains(game.code())? {
            return Ok(false);
        }
        self.store.save(game)?;
        Ok(true)
    }

    fn lock_for(&self, code: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(locks.entry(code.to_string()).or_default())
    }

    /// Drops the lock entry for `code` unless a request still holds or awaits it. The registry
    /// then only ever holds entries for sessions with requests in flight.
    fn release_lock(&self, code: &str) {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if locks
            .get(code)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(code);
        }
    }

    fn generate_code(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.config.code_length)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect()
    }

    fn turn_or_end_event(&self, game: &Game) -> Event {
        let code = game.code().to_string();
        match game.status() {
            GameStatus::Finished { winner } => {
                let winner_name = game
                    .players()
                    .iter()
                    .find(|player| player.id == winner)
                    .map(|player| player.name.clone())
                    .unwrap_or_default();
                info!(%code, winner = %winner_name, "game ended");
                Event::GameEnded {
                    code,
                    winner,
                    winner_name,
                }
            }
            _ => Event::TurnChanged {
                code,
                current_player_index: game.current_player_index(),
            },
        }
    }

    fn log_failure(&self, action: &'static str, code: &str, err: GameError) -> GameError {
        if err.is_infrastructure() {
            error!(%code, action, error = %err, "session store failure");
        } else {
            debug!(%code, action, kind = err.kind(), "action rejected");
        }
        err
    }
}

fn canonical_name(game: &Game, name: &str) -> String {
    game.player(name)
        .map(|player| player.name.clone())
        .unwrap_or_else(|| name.trim().to_string())
}
