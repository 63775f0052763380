use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{GameError, InvalidAction};

pub const MAX_NUMBER_VALUE: u8 = 9;
pub const COPIES_PER_NUMBER: usize = 2;
pub const COPIES_PER_ACTION: usize = 2;
pub const WILD_COUNT: usize = 4;
pub const WILD_DRAW_FOUR_COUNT: usize = 4;
pub const DECK_SIZE: usize = 108;
pub const HAND_SIZE: usize = 7;
pub const DRAW_TWO_PENALTY: usize = 2;
pub const WILD_DRAW_FOUR_PENALTY: usize = 4;

/// One of the four base colors. Wild cards carry no color of their own.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
}

impl Color {
    pub const ALL: [Color; 4] = [Color::Red, Color::Blue, Color::Green, Color::Yellow];

    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Red => "RED",
            Color::Blue => "BLUE",
            Color::Green => "GREEN",
            Color::Yellow => "YELLOW",
        }
    }

    /// Case-insensitive parse of a color name.
    pub fn parse(raw: &str) -> Option<Color> {
        Color::ALL
            .into_iter()
            .find(|color| color.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Card type tag.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardKind {
    Number,
    Skip,
    Reverse,
    DrawTwo,
    Wild,
    WildDrawFour,
}

impl CardKind {
    fn as_str(&self) -> &'static str {
        match self {
            CardKind::Number => "NUMBER",
            CardKind::Skip => "SKIP",
            CardKind::Reverse => "REVERSE",
            CardKind::DrawTwo => "DRAW_TWO",
            CardKind::Wild => "WILD",
            CardKind::WildDrawFour => "WILD_DRAW_FOUR",
        }
    }
}

/// The "value" of a card: its rank for number cards, its special name otherwise.
/// Two cards match by value when their faces are equal.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Face {
    Number(u8),
    Skip,
    Reverse,
    DrawTwo,
    Wild,
    WildDrawFour,
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Face::Number(value) => write!(f, "{value}"),
            Face::Skip => f.write_str("SKIP"),
            Face::Reverse => f.write_str("REVERSE"),
            Face::DrawTwo => f.write_str("DRAW_TWO"),
            Face::Wild => f.write_str("WILD"),
            Face::WildDrawFour => f.write_str("WILD_DRAW_FOUR"),
        }
    }
}

/// A single card. Colored specials and numbers carry their color, wild cards carry none.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(into = "CardRecord", try_from = "CardRecord")]
pub enum Card {
    /// Number card between 0 and 9.
    Number { color: Color, value: u8 },
    Skip(Color),
    Reverse(Color),
    DrawTwo(Color),
    /// Changes the active color to one nominated by the player.
    Wild,
    /// Nominates a color and makes the next player draw four.
    WildDrawFour,
}

impl Card {
    pub fn number(color: Color, value: u8) -> Result<Card, GameError> {
        if value > MAX_NUMBER_VALUE {
            return Err(InvalidAction::InvalidCard.into());
        }
        Ok(Card::Number { color, value })
    }

    #[inline]
    pub fn is_wild(&self) -> bool {
        matches!(self, Card::Wild | Card::WildDrawFour)
    }

    /// Base color, `None` for wild cards.
    #[inline]
    pub fn color(&self) -> Option<Color> {
        match self {
            Card::Number { color, .. }
            | Card::Skip(color)
            | Card::Reverse(color)
            | Card::DrawTwo(color) => Some(*color),
            Card::Wild | Card::WildDrawFour => None,
        }
    }

    #[inline]
    pub fn face(&self) -> Face {
        match self {
            Card::Number { value, .. } => Face::Number(*value),
            Card::Skip(_) => Face::Skip,
            Card::Reverse(_) => Face::Reverse,
            Card::DrawTwo(_) => Face::DrawTwo,
            Card::Wild => Face::Wild,
            Card::WildDrawFour => Face::WildDrawFour,
        }
    }

    #[inline]
    pub fn kind(&self) -> CardKind {
        match self {
            Card::Number { .. } => CardKind::Number,
            Card::Skip(_) => CardKind::Skip,
            Card::Reverse(_) => CardKind::Reverse,
            Card::DrawTwo(_) => CardKind::DrawTwo,
            Card::Wild => CardKind::Wild,
            Card::WildDrawFour => CardKind::WildDrawFour,
        }
    }

    /// Number of cards the next player must take when this card is played.
    pub fn penalty(&self) -> usize {
        match self {
            Card::DrawTwo(_) => DRAW_TWO_PENALTY,
            Card::WildDrawFour => WILD_DRAW_FOUR_PENALTY,
            _ => 0,
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.color() {
            Some(color) => write!(f, "{color} {}", self.face()),
            None => write!(f, "{}", self.face()),
        }
    }
}

/// Flat `{color, value, type}` record used on the wire.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct CardRecord {
    color: String,
    value: String,
    #[serde(rename = "type")]
    kind: CardKind,
}

impl From<Card> for CardRecord {
    fn from(card: Card) -> Self {
        let color = card
            .color()
            .map(|color| color.as_str())
            .unwrap_or("WILD")
            .to_string();
        let value = match card.face() {
            Face::Number(value) => value.to_string(),
            _ => card.kind().as_str().to_string(),
        };
        CardRecord {
            color,
            value,
            kind: card.kind(),
        }
    }
}

impl TryFrom<CardRecord> for Card {
    type Error = InvalidAction;

    fn try_from(record: CardRecord) -> Result<Self, Self::Error> {
        let color = Color::parse(&record.color);
        let card = match (record.kind, color) {
            (CardKind::Number, Some(color)) => {
                let value = record
                    .value
                    .parse::<u8>()
                    .map_err(|_| InvalidAction::InvalidCard)?;
                if value > MAX_NUMBER_VALUE {
                    return Err(InvalidAction::InvalidCard);
                }
                return Ok(Card::Number { color, value });
            }
            (CardKind::Skip, Some(color)) => Card::Skip(color),
            (CardKind::Reverse, Some(color)) => Card::Reverse(color),
            (CardKind::DrawTwo, Some(color)) => Card::DrawTwo(color),
            (CardKind::Wild, None) if record.color == "WILD" => Card::Wild,
            (CardKind::WildDrawFour, None) if record.color == "WILD" => Card::WildDrawFour,
            _ => return Err(InvalidAction::InvalidCard),
        };
        if record.value != record.kind.as_str() {
            return Err(InvalidAction::InvalidCard);
        }
        Ok(card)
    }
}

/// Builds the full 108-card deck in canonical (unshuffled) order: number cards per color,
/// then colored action cards per color, then the wild cards.
pub fn full_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(DECK_SIZE);
    for color in Color::ALL {
        deck.push(Card::Number { color, value: 0 });
        for value in 1..=MAX_NUMBER_VALUE {
            for _ in 0..COPIES_PER_NUMBER {
                deck.push(Card::Number { color, value });
            }
        }
    }
    for color in Color::ALL {
        for action in [Card::Skip(color), Card::Reverse(color), Card::DrawTwo(color)] {
            deck.extend(std::iter::repeat(action).take(COPIES_PER_ACTION));
        }
    }
    deck.extend(std::iter::repeat(Card::Wild).take(WILD_COUNT));
    deck.extend(std::iter::repeat(Card::WildDrawFour).take(WILD_DRAW_FOUR_COUNT));
    deck
}

/// Fisher-Yates shuffle: walks from the end, swapping each slot with a uniformly chosen
/// slot at or before it.
pub fn shuffle<R: Rng + ?Sized>(cards: &mut [Card], rng: &mut R) {
    for i in (1..cards.len()).rev() {
        let j = rng.gen_range(0..=i);
        cards.swap(i, j);
    }
}

/// Draw pile. The top of the deck is the end of the vector.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    pub fn new(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn standard() -> Self {
        Self::new(full_deck())
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        shuffle(&mut self.cards, rng);
    }

    pub fn draw(&mut self) -> Result<Card, GameError> {
        self.cards.pop().ok_or(GameError::EmptyDeck)
    }

    /// Places cards underneath the current deck so they are drawn last.
    pub fn put_under(&mut self, cards: impl IntoIterator<Item = Card>) {
        let mut bottom: Vec<Card> = cards.into_iter().collect();
        bottom.append(&mut self.cards);
        self.cards = bottom;
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn into_cards(self) -> Vec<Card> {
        self.cards
    }
}

impl From<Vec<Card>> for Deck {
    fn from(cards: Vec<Card>) -> Self {
        Self::new(cards)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn counts(cards: &[Card]) -> HashMap<Card, usize> {
        let mut map = HashMap::new();
        for card in cards {
            *map.entry(*card).or_insert(0) += 1;
        }
        map
    }

    #[test]
    fn standard_deck_composition() {
        let deck = full_deck();
        assert_eq!(deck.len(), DECK_SIZE);
        let counts = counts(&deck);
        for color in Color::ALL {
            assert_eq!(counts[&Card::Number { color, value: 0 }], 1);
            for value in 1..=9 {
                assert_eq!(counts[&Card::Number { color, value }], 2);
            }
            assert_eq!(counts[&Card::Skip(color)], 2);
            assert_eq!(counts[&Card::Reverse(color)], 2);
            assert_eq!(counts[&Card::DrawTwo(color)], 2);
        }
        assert_eq!(counts[&Card::Wild], 4);
        assert_eq!(counts[&Card::WildDrawFour], 4);
        let numbers = deck.iter().filter(|c| c.kind() == CardKind::Number).count();
        assert_eq!(numbers, 76);
        assert_eq!(deck.iter().filter(|c| c.is_wild()).count(), 8);
    }

    #[test]
    fn canonical_order_is_stable() {
        let deck = full_deck();
        assert_eq!(deck[0], Card::Number { color: Color::Red, value: 0 });
        assert_eq!(deck[1], Card::Number { color: Color::Red, value: 1 });
        assert_eq!(deck[19], Card::Number { color: Color::Blue, value: 0 });
        assert_eq!(deck[76], Card::Skip(Color::Red));
        assert_eq!(deck[107], Card::WildDrawFour);
        assert_eq!(full_deck(), deck);
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        let original = full_deck();
        let mut shuffled = original.clone();
        shuffle(&mut shuffled, &mut rng);
        assert_ne!(shuffled, original);
        assert_eq!(counts(&shuffled), counts(&original));
    }

    #[test]
    fn shuffle_has_no_positional_bias() {
        // Track where the element starting at slot 0 lands across many shuffles of 5 slots.
        const SLOTS: usize = 5;
        const TRIALS: usize = 20_000;
        let mut rng = StdRng::seed_from_u64(0xD3C4);
        let mut landed = [0usize; SLOTS];
        for _ in 0..TRIALS {
            let mut cards: Vec<Card> = (0..SLOTS as u8)
                .map(|value| Card::Number { color: Color::Red, value })
                .collect();
            shuffle(&mut cards, &mut rng);
            let slot = cards
                .iter()
                .position(|card| card.face() == Face::Number(0))
                .expect("marker card present");
            landed[slot] += 1;
        }
        let expected = (TRIALS / SLOTS) as f64;
        let chi_square: f64 = landed
            .iter()
            .map(|&observed| {
                let diff = observed as f64 - expected;
                diff * diff / expected
            })
            .sum();
        // 4 degrees of freedom, p = 0.001 critical value is 18.47.
        assert!(chi_square < 18.47, "biased shuffle: {landed:?}");
    }

    #[test]
    fn draw_takes_from_the_end_and_reports_empty() {
        let mut deck = Deck::new(vec![Card::Wild, Card::Skip(Color::Green)]);
        assert_eq!(deck.draw().unwrap(), Card::Skip(Color::Green));
        assert_eq!(deck.draw().unwrap(), Card::Wild);
        assert!(matches!(deck.draw(), Err(GameError::EmptyDeck)));
    }

    #[test]
    fn put_under_keeps_existing_top() {
        let mut deck = Deck::new(vec![Card::Skip(Color::Red)]);
        deck.put_under([Card::Wild]);
        assert_eq!(deck.cards(), &[Card::Wild, Card::Skip(Color::Red)]);
    }

    #[test]
    fn number_constructor_rejects_out_of_range() {
        assert!(Card::number(Color::Blue, 9).is_ok());
        assert!(matches!(
            Card::number(Color::Blue, 10),
            Err(GameError::InvalidAction(InvalidAction::InvalidCard))
        ));
    }

    #[test]
    fn wire_format_matches_flat_record() {
        let json = serde_json::to_string(&Card::Number { color: Color::Red, value: 5 }).unwrap();
        assert_eq!(json, r#"{"color":"RED","value":"5","type":"NUMBER"}"#);
        let json = serde_json::to_string(&Card::WildDrawFour).unwrap();
        assert_eq!(
            json,
            r#"{"color":"WILD","value":"WILD_DRAW_FOUR","type":"WILD_DRAW_FOUR"}"#
        );
        let parsed: Card =
            serde_json::from_str(r#"{"color":"BLUE","value":"SKIP","type":"SKIP"}"#).unwrap();
        assert_eq!(parsed, Card::Skip(Color::Blue));
    }

    #[test]
    fn wire_format_rejects_illegal_shapes() {
        let colored_wild = r#"{"color":"RED","value":"WILD","type":"WILD"}"#;
        assert!(serde_json::from_str::<Card>(colored_wild).is_err());
        let big_number = r#"{"color":"RED","value":"12","type":"NUMBER"}"#;
        assert!(serde_json::from_str::<Card>(big_number).is_err());
        let mismatched = r#"{"color":"RED","value":"SKIP","type":"REVERSE"}"#;
        assert!(serde_json::from_str::<Card>(mismatched).is_err());
    }
}
