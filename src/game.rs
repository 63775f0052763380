use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::action::Action;
use crate::card::{Card, Color, DECK_SIZE, Deck, Face, HAND_SIZE, WILD_COUNT, WILD_DRAW_FOUR_COUNT};
use crate::error::{GameError, InvalidAction};
use crate::player::{Player, PlayerId};
use crate::rules::{advance, can_play, next_index};
use crate::state::{Direction, GameStatus, PlayerView, SessionSnapshot};

const DEFAULT_SEED: u64 = 0x5EED_CA4D_5EED_CA4D;
pub const DEFAULT_MAX_PLAYERS: usize = 4;
pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 10;
const RESHUFFLE_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Table rules fixed at session creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub max_players: usize,
    pub hand_size: usize,
    pub seed: u64,
    /// Refill an empty deck from the discard pile (minus its top card).
    pub reshuffle_discard: bool,
}

impl GameConfig {
    pub fn new(max_players: usize, seed: u64) -> Result<Self, GameError> {
        let config = Self {
            max_players,
            hand_size: HAND_SIZE,
            seed,
            reshuffle_discard: false,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GameError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.max_players) {
            return Err(GameError::InvalidConfiguration(
                "max players must be between 2 and 10",
            ));
        }
        if self.hand_size == 0 {
            return Err(GameError::InvalidConfiguration("hand size must be positive"));
        }
        // A full table must still leave a non-wild card for the opening discard.
        let non_wild = DECK_SIZE - WILD_COUNT - WILD_DRAW_FOUR_COUNT;
        if self.max_players * self.hand_size >= non_wild {
            return Err(GameError::InvalidConfiguration(
                "hand size too large for the table size",
            ));
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_players: DEFAULT_MAX_PLAYERS,
            hand_size: HAND_SIZE,
            seed: DEFAULT_SEED,
            reshuffle_discard: false,
        }
    }
}

/// Builder for a fresh session in the waiting state.
pub struct GameBuilder {
    code: String,
    config: GameConfig,
}

impl GameBuilder {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            config: GameConfig::default(),
        }
    }

    pub fn with_config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn with_max_players(mut self, max_players: usize) -> Self {
        self.config.max_players = max_players;
        self
    }

    pub fn with_hand_size(mut self, hand_size: usize) -> Self {
        self.config.hand_size = hand_size;
        self
    }

    pub fn with_reshuffle(mut self, enabled: bool) -> Self {
        self.config.reshuffle_discard = enabled;
        self
    }

    pub fn build(self) -> Result<Game, GameError> {
        self.config.validate()?;
        let code = self.code.trim().to_ascii_uppercase();
        if code.is_empty() {
            return Err(GameError::InvalidConfiguration("session code must not be empty"));
        }
        Ok(Game {
            code,
            config: self.config,
            status: GameStatus::Waiting,
            players: Vec::with_capacity(self.config.max_players),
            current_player: 0,
            direction: Direction::Forward,
            current_color: None,
            current_value: None,
            deck: Deck::default(),
            discard_pile: Vec::new(),
            card_total: 0,
            reshuffles: 0,
        })
    }
}

/// Cards forced onto the player after the actor by a draw-two or wild-draw-four.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Penalty {
    pub player_index: usize,
    /// May be fewer than the card demands when the deck runs dry.
    pub cards_drawn: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayOutcome {
    pub card: Card,
    pub status: GameStatus,
    /// Color set by this play. `None` only for a finishing wild played without a nomination;
    /// the session then keeps the previous color.
    pub active_color: Option<Color>,
    pub next_player_index: usize,
    pub direction: Direction,
    pub penalty: Option<Penalty>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawOutcome {
    pub player_index: usize,
    pub drawn_card: Card,
    pub next_player_index: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveOutcome {
    pub player_id: PlayerId,
    pub name: String,
    pub room_empty: bool,
    pub status: GameStatus,
    pub current_player_index: usize,
}

/// Result of [`Game::apply_action`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    Played(PlayOutcome),
    Drew(DrawOutcome),
    Passed { next_player_index: usize },
}

/// One room's authoritative state and the turn engine that mutates it.
///
/// Every transition validates all of its preconditions before touching any field, so a
/// returned error always leaves the game exactly as it was.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    code: String,
    config: GameConfig,
    status: GameStatus,
    players: Vec<Player>,
    current_player: usize,
    direction: Direction,
    current_color: Option<Color>,
    current_value: Option<Face>,
    deck: Deck,
    discard_pile: Vec<Card>,
    card_total: usize,
    reshuffles: u64,
}

impl Game {
    pub fn builder(code: impl Into<String>) -> GameBuilder {
        GameBuilder::new(code)
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|player| player.answers_to(name))
    }

    pub fn current_player_index(&self) -> usize {
        self.current_player
    }

    pub fn current_player(&self) -> Option<&Player> {
        match self.status {
            GameStatus::Playing => self.players.get(self.current_player),
            _ => None,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn current_color(&self) -> Option<Color> {
        self.current_color
    }

    pub fn current_value(&self) -> Option<Face> {
        self.current_value
    }

    pub fn top_card(&self) -> Option<Card> {
        self.discard_pile.last().copied()
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn discard_pile(&self) -> &[Card] {
        &self.discard_pile
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, GameStatus::Finished { .. })
    }

    pub fn winner(&self) -> Option<PlayerId> {
        match self.status {
            GameStatus::Finished { winner } => Some(winner),
            _ => None,
        }
    }

    /// Cards across all hands, the deck and the discard pile.
    pub fn total_cards(&self) -> usize {
        let in_hands: usize = self.players.iter().map(|player| player.hand.len()).sum();
        in_hands + self.deck.len() + self.discard_pile.len()
    }

    pub fn join(&mut self, name: &str) -> Result<PlayerId, GameError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(InvalidAction::InvalidName.into());
        }
        if self.status != GameStatus::Waiting {
            return Err(GameError::NotWaiting);
        }
        if self.players.len() >= self.config.max_players {
            return Err(GameError::RoomFull {
                max_players: self.config.max_players,
            });
        }
        if self.player(name).is_some() {
            return Err(GameError::NameTaken(name.to_string()));
        }
        let player = Player::new(name, self.players.len());
        let id = player.id;
        debug!(code = %self.code, player = %name, position = player.position, "player joined");
        self.players.push(player);
        Ok(id)
    }

    pub fn set_ready(&mut self, name: &str, is_ready: bool) -> Result<bool, GameError> {
        if self.status != GameStatus::Waiting {
            return Err(GameError::NotWaiting);
        }
        let index = self.player_index(name)?;
        self.players[index].is_ready = is_ready;
        Ok(is_ready)
    }

    /// Shuffles a standard deck from the session seed and starts the game.
    pub fn start(&mut self, name: &str) -> Result<(), GameError> {
        self.check_can_start(name)?;
        let mut deck = Deck::standard();
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        deck.shuffle(&mut rng);
        self.start_with_deck(name, deck)
    }

    /// Starts the game with an already-ordered deck. The last card of the deck is dealt first.
    pub fn start_with_deck(&mut self, name: &str, deck: Deck) -> Result<(), GameError> {
        self.check_can_start(name)?;
        let card_total = deck.len();
        let mut deck = deck;
        let mut hands = Vec::with_capacity(self.players.len());
        for _ in 0..self.players.len() {
            let mut hand = Vec::with_capacity(self.config.hand_size);
            for _ in 0..self.config.hand_size {
                hand.push(deck.draw()?);
            }
            hands.push(hand);
        }
        // Wild cards never set the opening color: bury them until a colored card shows.
        let mut discard_pile = vec![deck.draw()?];
        while discard_pile.last().is_some_and(Card::is_wild) {
            discard_pile.push(deck.draw()?);
        }
        let top = *discard_pile.last().ok_or(GameError::EmptyDeck)?;

        for (player, hand) in self.players.iter_mut().zip(hands) {
            player.hand = hand;
        }
        self.deck = deck;
        self.discard_pile = discard_pile;
        self.current_color = top.color();
        self.current_value = Some(top.face());
        self.current_player = 0;
        self.direction = Direction::Forward;
        self.card_total = card_total;
        self.status = GameStatus::Playing;
        debug!(code = %self.code, players = self.players.len(), top = %top, "game started");
        self.check_card_total();
        Ok(())
    }

    pub fn play_card(
        &mut self,
        name: &str,
        hand_index: usize,
        chosen_color: Option<Color>,
    ) -> Result<PlayOutcome, GameError> {
        let actor = self.acting_player(name)?;
        let hand = &self.players[actor].hand;
        let card = *hand
            .get(hand_index)
            .ok_or(InvalidAction::CardIndex(hand_index))?;
        let top = self.top_card().ok_or(GameError::NotPlaying)?;
        let active = self.current_color.ok_or(GameError::NotPlaying)?;
        if !can_play(&card, &top, active) {
            return Err(InvalidAction::IllegalMove {
                card,
                top,
                color: active,
            }
            .into());
        }
        let wins = hand.len() == 1;
        let next_color = match card.color() {
            Some(color) => Some(color),
            None if wins => chosen_color,
            None => Some(chosen_color.ok_or(InvalidAction::ColorRequired)?),
        };

        let card = self.players[actor].hand.remove(hand_index);
        self.discard_pile.push(card);
        self.current_value = Some(card.face());
        if next_color.is_some() {
            self.current_color = next_color;
        }

        if self.players[actor].hand.is_empty() {
            self.finish(actor);
            return Ok(PlayOutcome {
                card,
                status: self.status,
                active_color: next_color,
                next_player_index: self.current_player,
                direction: self.direction,
                penalty: None,
            });
        }

        let count = self.players.len();
        let mut penalty = None;
        let steps = match card {
            Card::Number { .. } | Card::Wild => 1,
            Card::Skip(_) => 2,
            Card::Reverse(_) => {
                self.direction = self.direction.reversed();
                // Heads-up, a reverse hands the turn straight back.
                if count == 2 { 2 } else { 1 }
            }
            Card::DrawTwo(_) | Card::WildDrawFour => {
                let victim = next_index(actor, self.direction, count);
                let cards_drawn = self.deal_penalty(victim, card.penalty());
                penalty = Some(Penalty {
                    player_index: victim,
                    cards_drawn,
                });
                2
            }
        };
        self.current_player = advance(actor, self.direction, count, steps);
        debug!(
            code = %self.code,
            card = %card,
            next = self.current_player,
            "card played"
        );
        self.check_card_total();

        Ok(PlayOutcome {
            card,
            status: self.status,
            active_color: self.current_color,
            next_player_index: self.current_player,
            direction: self.direction,
            penalty,
        })
    }

    pub fn draw_card(&mut self, name: &str) -> Result<DrawOutcome, GameError> {
        let actor = self.acting_player(name)?;
        let card = self.take_from_deck().ok_or(GameError::EmptyDeck)?;
        self.players[actor].hand.push(card);
        self.current_player = next_index(actor, self.direction, self.players.len());
        self.check_card_total();
        Ok(DrawOutcome {
            player_index: actor,
            drawn_card: card,
            next_player_index: self.current_player,
        })
    }

    /// Ends the turn without playing. Only allowed once the deck is exhausted for good.
    pub fn pass_turn(&mut self, name: &str) -> Result<usize, GameError> {
        let actor = self.acting_player(name)?;
        if self.can_draw() {
            return Err(InvalidAction::MustDraw.into());
        }
        self.current_player = next_index(actor, self.direction, self.players.len());
        Ok(self.current_player)
    }

    pub fn apply_action(&mut self, name: &str, action: Action) -> Result<ActionOutcome, GameError> {
        match action {
            Action::Play {
                hand_index,
                chosen_color,
            } => self
                .play_card(name, hand_index, chosen_color)
                .map(ActionOutcome::Played),
            Action::Draw => self.draw_card(name).map(ActionOutcome::Drew),
            Action::Pass => self
                .pass_turn(name)
                .map(|next_player_index| ActionOutcome::Passed { next_player_index }),
        }
    }

    /// Removes a player in any state.
    ///
    /// Mid-game, the player due to act is re-derived by identity: the current player if
    /// someone else left, otherwise whoever was next in the current direction. The leaver's
    /// hand goes under the deck so no card leaves the game. A lone survivor wins.
    pub fn leave(&mut self, name: &str) -> Result<LeaveOutcome, GameError> {
        let index = self.player_index(name)?;
        let count = self.players.len();
        let playing = self.status == GameStatus::Playing;
        let resume = if playing && count > 1 {
            let target = if index == self.current_player {
                next_index(self.current_player, self.direction, count)
            } else {
                self.current_player
            };
            Some(self.players[target].id)
        } else {
            None
        };

        let removed = self.players.remove(index);
        for (position, player) in self.players.iter_mut().enumerate() {
            player.position = position;
        }

        if playing {
            self.deck.put_under(removed.hand.iter().copied());
            self.current_player = resume
                .and_then(|id| self.players.iter().position(|player| player.id == id))
                .unwrap_or(0);
            if self.players.len() == 1 {
                self.finish(0);
            }
        } else if self.current_player >= self.players.len() {
            self.current_player = 0;
        }
        debug!(code = %self.code, player = %removed.name, remaining = self.players.len(), "player left");

        Ok(LeaveOutcome {
            player_id: removed.id,
            name: removed.name,
            room_empty: self.players.is_empty(),
            status: self.status,
            current_player_index: self.current_player,
        })
    }

    /// Every action the named player may take right now. Empty when no game is running.
    pub fn legal_actions(&self, name: &str) -> Result<Vec<Action>, GameError> {
        if self.status != GameStatus::Playing {
            return Ok(Vec::new());
        }
        let actor = self.player_index(name)?;
        if actor != self.current_player {
            return Err(GameError::NotYourTurn);
        }
        let (Some(top), Some(active)) = (self.top_card(), self.current_color) else {
            return Ok(Vec::new());
        };
        let mut actions = Vec::new();
        for (hand_index, card) in self.players[actor].hand.iter().enumerate() {
            if !can_play(card, &top, active) {
                continue;
            }
            if card.is_wild() {
                for color in Color::ALL {
                    actions.push(Action::Play {
                        hand_index,
                        chosen_color: Some(color),
                    });
                }
            } else {
                actions.push(Action::Play {
                    hand_index,
                    chosen_color: None,
                });
            }
        }
        if self.can_draw() {
            actions.push(Action::Draw);
        } else {
            actions.push(Action::Pass);
        }
        Ok(actions)
    }

    /// Full-state view. Hands, deck and discard contents are only exposed mid-game.
    pub fn snapshot(&self) -> SessionSnapshot {
        let playing = self.status == GameStatus::Playing;
        let players = self
            .players
            .iter()
            .enumerate()
            .map(|(index, player)| PlayerView {
                id: player.id,
                name: player.name.clone(),
                position: player.position,
                is_ready: player.is_ready,
                hand_size: player.hand.len(),
                is_current: playing && index == self.current_player,
                hand: playing.then(|| player.hand.clone()),
            })
            .collect();
        SessionSnapshot {
            code: self.code.clone(),
            status: self.status,
            max_players: self.config.max_players,
            players,
            current_player_index: self.current_player,
            direction: self.direction,
            current_color: self.current_color,
            current_value: self.current_value,
            top_card: self.top_card(),
            deck_count: self.deck.len(),
            deck: playing.then(|| self.deck.cards().to_vec()),
            discard_pile: playing.then(|| self.discard_pile.clone()),
        }
    }

    fn player_index(&self, name: &str) -> Result<usize, GameError> {
        self.players
            .iter()
            .position(|player| player.answers_to(name))
            .ok_or_else(|| GameError::PlayerNotFound(name.trim().to_string()))
    }

    fn acting_player(&self, name: &str) -> Result<usize, GameError> {
        if self.status != GameStatus::Playing {
            return Err(GameError::NotPlaying);
        }
        let index = self.player_index(name)?;
        if index != self.current_player {
            return Err(GameError::NotYourTurn);
        }
        Ok(index)
    }

    fn check_can_start(&self, name: &str) -> Result<(), GameError> {
        if self.status != GameStatus::Waiting {
            return Err(GameError::NotWaiting);
        }
        self.player_index(name)?;
        if self.players.len() < MIN_PLAYERS {
            return Err(GameError::InsufficientPlayers {
                required: MIN_PLAYERS,
                present: self.players.len(),
            });
        }
        if !self.players.iter().all(|player| player.is_ready) {
            return Err(GameError::PlayersNotReady);
        }
        Ok(())
    }

    fn finish(&mut self, winner: usize) {
        let id = self.players[winner].id;
        self.status = GameStatus::Finished { winner: id };
        self.current_player = winner;
        debug!(code = %self.code, winner = %self.players[winner].name, "game finished");
    }

    fn can_draw(&self) -> bool {
        !self.deck.is_empty() || (self.config.reshuffle_discard && self.discard_pile.len() > 1)
    }

    fn take_from_deck(&mut self) -> Option<Card> {
        if self.deck.is_empty() && self.config.reshuffle_discard {
            self.recycle_discard();
        }
        self.deck.draw().ok()
    }

    /// Gives up to `count` cards to the player, stopping quietly when the deck is empty.
    fn deal_penalty(&mut self, player: usize, count: usize) -> usize {
        let mut drawn = 0;
        while drawn < count {
            match self.take_from_deck() {
                Some(card) => self.players[player].hand.push(card),
                None => break,
            }
            drawn += 1;
        }
        drawn
    }

    fn recycle_discard(&mut self) {
        if self.discard_pile.len() <= 1 {
            return;
        }
        let top = self.discard_pile.split_off(self.discard_pile.len() - 1);
        let recycled = std::mem::replace(&mut self.discard_pile, top);
        self.reshuffles += 1;
        let mut rng =
            StdRng::seed_from_u64(self.config.seed ^ self.reshuffles.wrapping_mul(RESHUFFLE_SALT));
        let mut deck = Deck::new(recycled);
        deck.shuffle(&mut rng);
        debug!(code = %self.code, cards = deck.len(), "discard pile reshuffled into deck");
        self.deck = deck;
    }

    fn check_card_total(&self) {
        debug_assert_eq!(
            self.total_cards(),
            self.card_total,
            "cards were created or destroyed"
        );
    }
}
