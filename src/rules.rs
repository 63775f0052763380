//! Move legality and turn-order arithmetic.

use crate::card::{Card, Color};
use crate::state::Direction;

/// Returns true when `card` may be played on `top` while `active_color` is in effect.
///
/// Wild cards are always playable. Otherwise the card must match the active color, or
/// match the top card's face (same number, or same special type across colors).
pub fn can_play(card: &Card, top: &Card, active_color: Color) -> bool {
    if card.is_wild() {
        return true;
    }
    if card.color() == Some(active_color) {
        return true;
    }
    card.face() == top.face()
}

/// Index of the player one step away from `current` in `direction`, wrapping around the table.
pub fn next_index(current: usize, direction: Direction, player_count: usize) -> usize {
    debug_assert!(player_count > 0);
    let count = player_count as isize;
    let mut next = (current as isize + direction.step()) % count;
    if next < 0 {
        next += count;
    }
    next as usize
}

/// Index reached after moving `steps` players away from `current`.
pub fn advance(current: usize, direction: Direction, player_count: usize, steps: usize) -> usize {
    (0..steps).fold(current, |index, _| next_index(index, direction, player_count))
}
