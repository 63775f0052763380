use crate::action::Action;
use crate::state::SessionSnapshot;

/// Interface for automated players.
///
/// `seat` is the bot's index in `state.players`; `legal_actions` is never empty while the
/// bot is the current player.
pub trait Bot {
    fn select_action(&mut self, state: &SessionSnapshot, seat: usize, legal_actions: &[Action])
    -> Action;
}
