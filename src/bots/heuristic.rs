use crate::action::Action;
use crate::bot::Bot;
use crate::card::{Card, Color};
use crate::rules::next_index;
use crate::state::SessionSnapshot;

/// Rule-based bot that plays "sensible" moves without search.
///
/// In plain English:
/// - Hold on to wild cards; play them only when nothing else fits.
/// - Prefer cards of the color the bot holds most of, so future turns stay playable.
/// - When the next player is close to going out, prefer cards that hurt them
///   (draw-two, skip, reverse).
/// - Nominate the color the bot holds most of when a wild is played.
/// - Draw only when there is no legal play.
#[derive(Default)]
pub struct HeuristicBot;

impl HeuristicBot {
    pub fn new() -> Self {
        Self
    }

    fn color_counts(hand: &[Card]) -> [usize; 4] {
        let mut counts = [0usize; 4];
        for card in hand {
            if let Some(color) = card.color() {
                let slot = Color::ALL.iter().position(|c| *c == color).unwrap_or(0);
                counts[slot] += 1;
            }
        }
        counts
    }

    fn favourite_color(hand: &[Card]) -> Color {
        let counts = Self::color_counts(hand);
        Color::ALL
            .into_iter()
            .zip(counts)
            .max_by_key(|(_, count)| *count)
            .map(|(color, _)| color)
            .unwrap_or(Color::Red)
    }

    fn score(card: &Card, chosen: Option<Color>, hand: &[Card], threat: bool) -> i32 {
        let counts = Self::color_counts(hand);
        let color_weight = |color: Color| {
            Color::ALL
                .iter()
                .position(|c| *c == color)
                .map(|slot| counts[slot] as i32)
                .unwrap_or(0)
        };
        match card {
            Card::Wild | Card::WildDrawFour => {
                let base = if threat && matches!(card, Card::WildDrawFour) {
                    50
                } else {
                    -100
                };
                base + chosen.map(color_weight).unwrap_or(0)
            }
            Card::DrawTwo(color) | Card::Skip(color) | Card::Reverse(color) => {
                let aggression = if threat { 40 } else { 5 };
                aggression + color_weight(*color) * 2
            }
            Card::Number { color, value } => color_weight(*color) * 2 + i32::from(*value) / 3,
        }
    }
}

impl Bot for HeuristicBot {
    fn select_action(
        &mut self,
        state: &SessionSnapshot,
        seat: usize,
        legal_actions: &[Action],
    ) -> Action {
        let hand: &[Card] = state
            .players
            .get(seat)
            .and_then(|player| player.hand.as_deref())
            .unwrap_or(&[]);
        let next = next_index(seat, state.direction, state.players.len().max(1));
        let threat = state
            .players
            .get(next)
            .is_some_and(|player| player.hand_size <= 2);
        let favourite = Self::favourite_color(hand);

        let best_play = legal_actions
            .iter()
            .filter_map(|action| match action {
                Action::Play {
                    hand_index,
                    chosen_color,
                } => {
                    let card = hand.get(*hand_index)?;
                    // Only consider the favourite nomination for wilds.
                    if card.is_wild() && *chosen_color != Some(favourite) {
                        return None;
                    }
                    Some((Self::score(card, *chosen_color, hand, threat), *action))
                }
                _ => None,
            })
            .max_by_key(|(score, _)| *score)
            .map(|(_, action)| action);

        best_play
            .or_else(|| legal_actions.iter().find(|a| !matches!(a, Action::Play { .. })).copied())
            .or_else(|| legal_actions.first().copied())
            .unwrap_or(Action::Draw)
    }
}
