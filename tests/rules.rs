use rand::SeedableRng;
use rand::rngs::StdRng;

use cardroom::card::DECK_SIZE;
use cardroom::{
    Action, Bot, Card, Color, Deck, Direction, Face, Game, GameError, GameStatus, InvalidAction,
    RandomBot,
};

const RED_5: Card = Card::Number {
    color: Color::Red,
    value: 5,
};

fn red(value: u8) -> Card {
    Card::Number {
        color: Color::Red,
        value,
    }
}

fn blue(value: u8) -> Card {
    Card::Number {
        color: Color::Blue,
        value,
    }
}

/// Orders a deck so player `i` is dealt `hands[i]` in order, the opening discard draws follow
/// `opening` in order, and `rest` remains as the draw pile (its last card drawn first).
fn stacked_deck(hands: &[Vec<Card>], opening: &[Card], rest: &[Card]) -> Deck {
    let mut cards = rest.to_vec();
    cards.extend(opening.iter().rev());
    for hand in hands.iter().rev() {
        cards.extend(hand.iter().rev());
    }
    Deck::new(cards)
}

const NAMES: [&str; 4] = ["ann", "bob", "cy", "dee"];

fn started(hands: &[Vec<Card>], opening: &[Card], rest: &[Card]) -> Result<Game, GameError> {
    let hand_size = hands[0].len();
    let mut game = Game::builder("rules1")
        .with_hand_size(hand_size)
        .build()?;
    for name in &NAMES[..hands.len()] {
        game.join(name)?;
        game.set_ready(name, true)?;
    }
    game.start_with_deck("ann", stacked_deck(hands, opening, rest))?;
    Ok(game)
}

#[test]
fn skip_passes_over_the_next_player() -> Result<(), GameError> {
    let hands = vec![
        vec![Card::Skip(Color::Red), red(1), red(2)],
        vec![blue(1), blue(2), blue(3)],
        vec![blue(4), blue(5), blue(6)],
    ];
    let mut game = started(&hands, &[RED_5], &[blue(9); 5])?;
    let outcome = game.play_card("ann", 0, None)?;
    assert_eq!(outcome.next_player_index, 2);
    assert_eq!(game.current_player_index(), 2);
    assert_eq!(game.direction(), Direction::Forward);
    assert_eq!(game.current_value(), Some(Face::Skip));
    Ok(())
}

#[test]
fn reverse_flips_direction_with_four_players() -> Result<(), GameError> {
    let hands = vec![
        vec![red(1), red(2), red(3)],
        vec![Card::Reverse(Color::Red), red(4), red(6)],
        vec![blue(1), blue(2), blue(3)],
        vec![blue(4), blue(5), blue(6)],
    ];
    let mut game = started(&hands, &[RED_5], &[blue(9); 5])?;
    game.play_card("ann", 0, None)?;
    assert_eq!(game.current_player_index(), 1);
    let outcome = game.play_card("bob", 0, None)?;
    assert_eq!(outcome.direction, Direction::Backward);
    assert_eq!(outcome.next_player_index, 0);
    assert_eq!(game.direction(), Direction::Backward);
    Ok(())
}

#[test]
fn reverse_heads_up_acts_as_skip() -> Result<(), GameError> {
    let hands = vec![
        vec![Card::Reverse(Color::Red), red(1)],
        vec![blue(1), blue(2)],
    ];
    let mut game = started(&hands, &[RED_5], &[blue(9); 3])?;
    let outcome = game.play_card("ann", 0, None)?;
    assert_eq!(outcome.next_player_index, 0);
    assert_eq!(game.direction(), Direction::Backward);
    // Playing again succeeds: it really is still ann's turn.
    game.play_card("ann", 0, None)?;
    Ok(())
}

#[test]
fn draw_two_truncates_at_empty_deck() -> Result<(), GameError> {
    let hands = vec![
        vec![Card::DrawTwo(Color::Red), red(1), red(2)],
        vec![blue(1), blue(2), blue(3)],
        vec![blue(4), blue(5), blue(6)],
    ];
    let mut game = started(&hands, &[RED_5], &[blue(7)])?;
    assert_eq!(game.deck().len(), 1);
    let outcome = game.play_card("ann", 0, None)?;
    let penalty = outcome.penalty.expect("draw two penalizes");
    assert_eq!(penalty.player_index, 1);
    assert_eq!(penalty.cards_drawn, 1);
    assert_eq!(game.players()[1].hand.len(), 4);
    assert_eq!(game.players()[1].hand.last(), Some(&blue(7)));
    assert!(game.deck().is_empty());
    assert_eq!(game.current_player_index(), 2);
    Ok(())
}

#[test]
fn wild_draw_four_nominates_and_penalizes() -> Result<(), GameError> {
    let hands = vec![
        vec![Card::WildDrawFour, red(1), red(2)],
        vec![blue(1), blue(2), blue(3)],
        vec![blue(4), blue(5), blue(6)],
    ];
    let mut game = started(&hands, &[RED_5], &[blue(9); 6])?;
    let outcome = game.play_card("ann", 0, Some(Color::Yellow))?;
    assert_eq!(outcome.active_color, Some(Color::Yellow));
    assert_eq!(outcome.penalty.map(|p| p.cards_drawn), Some(4));
    assert_eq!(game.players()[1].hand.len(), 7);
    assert_eq!(game.current_player_index(), 2);
    assert_eq!(game.current_color(), Some(Color::Yellow));
    assert_eq!(game.current_value(), Some(Face::WildDrawFour));
    assert_eq!(game.deck().len(), 2);
    Ok(())
}

#[test]
fn plain_wild_changes_color_and_advances_once() -> Result<(), GameError> {
    let hands = vec![
        vec![Card::Wild, red(1)],
        vec![blue(1), blue(2)],
        vec![blue(4), blue(5)],
    ];
    let mut game = started(&hands, &[RED_5], &[blue(9); 2])?;
    let outcome = game.play_card("ann", 0, Some(Color::Green))?;
    assert_eq!(outcome.next_player_index, 1);
    assert_eq!(outcome.penalty, None);
    assert_eq!(game.current_color(), Some(Color::Green));
    // Blue no longer matches after the nomination.
    let err = game.play_card("bob", 0, None).unwrap_err();
    assert!(matches!(
        err,
        GameError::InvalidAction(InvalidAction::IllegalMove { .. })
    ));
    Ok(())
}

#[test]
fn wild_without_color_is_rejected_without_mutation() -> Result<(), GameError> {
    let hands = vec![vec![Card::Wild, red(1)], vec![blue(1), blue(2)]];
    let mut game = started(&hands, &[RED_5], &[blue(9); 2])?;
    let before = game.clone();
    let err = game.play_card("ann", 0, None).unwrap_err();
    assert!(matches!(
        err,
        GameError::InvalidAction(InvalidAction::ColorRequired)
    ));
    assert_eq!(game, before);
    Ok(())
}

#[test]
fn winning_play_ends_the_game_without_effects() -> Result<(), GameError> {
    let hands = vec![vec![Card::DrawTwo(Color::Red)], vec![blue(1)], vec![blue(2)]];
    let mut game = started(&hands, &[RED_5], &[blue(9); 4])?;
    let ann = game.players()[0].id;
    let outcome = game.play_card("ann", 0, None)?;
    assert_eq!(outcome.status, GameStatus::Finished { winner: ann });
    assert_eq!(outcome.penalty, None);
    assert_eq!(game.winner(), Some(ann));
    assert_eq!(game.current_player_index(), 0);
    assert_eq!(game.players()[1].hand.len(), 1);
    assert_eq!(game.deck().len(), 4);
    assert!(matches!(game.draw_card("bob"), Err(GameError::NotPlaying)));
    assert!(matches!(game.start("ann"), Err(GameError::NotWaiting)));
    Ok(())
}

#[test]
fn finishing_wild_reports_only_a_nominated_color() -> Result<(), GameError> {
    let hands = vec![vec![Card::Wild], vec![blue(1)]];
    let mut game = started(&hands, &[RED_5], &[blue(9)])?;
    let outcome = game.play_card("ann", 0, None)?;
    assert!(matches!(outcome.status, GameStatus::Finished { .. }));
    assert_eq!(outcome.active_color, None);
    assert_eq!(game.current_color(), Some(Color::Red));
    assert_eq!(game.current_value(), Some(Face::Wild));

    let mut game = started(&hands, &[RED_5], &[blue(9)])?;
    let outcome = game.play_card("ann", 0, Some(Color::Blue))?;
    assert_eq!(outcome.active_color, Some(Color::Blue));
    assert_eq!(game.current_color(), Some(Color::Blue));
    Ok(())
}

#[test]
fn wild_opening_cards_are_buried() -> Result<(), GameError> {
    let green_4 = Card::Number {
        color: Color::Green,
        value: 4,
    };
    let hands = vec![vec![red(1), red(2)], vec![blue(1), blue(2)]];
    let mut game = started(
        &hands,
        &[Card::Wild, Card::WildDrawFour, green_4],
        &[blue(9); 3],
    )?;
    assert_eq!(
        game.discard_pile(),
        &[Card::Wild, Card::WildDrawFour, green_4]
    );
    assert_eq!(game.top_card(), Some(green_4));
    assert_eq!(game.current_color(), Some(Color::Green));
    assert_eq!(game.current_value(), Some(Face::Number(4)));
    assert_eq!(game.total_cards(), 4 + 3 + 3);
    // Nothing matches green 4, but a wild would.
    assert!(game.play_card("ann", 0, None).is_err());
    Ok(())
}

#[test]
fn rejected_moves_leave_state_untouched() -> Result<(), GameError> {
    let hands = vec![vec![blue(3), red(1)], vec![blue(1), blue(2)]];
    let mut game = started(&hands, &[RED_5], &[blue(9); 2])?;
    let before = game.clone();

    let err = game.play_card("ann", 0, None).unwrap_err();
    assert_eq!(err.kind(), "illegal_move");
    let err = game.play_card("ann", 5, None).unwrap_err();
    assert!(matches!(
        err,
        GameError::InvalidAction(InvalidAction::CardIndex(5))
    ));
    assert!(matches!(game.play_card("bob", 0, None), Err(GameError::NotYourTurn)));
    assert!(matches!(game.draw_card("bob"), Err(GameError::NotYourTurn)));
    assert!(matches!(
        game.play_card("zed", 0, None),
        Err(GameError::PlayerNotFound(_))
    ));
    assert_eq!(game, before);
    Ok(())
}

#[test]
fn value_match_crosses_colors() -> Result<(), GameError> {
    let green_5 = Card::Number {
        color: Color::Green,
        value: 5,
    };
    let hands = vec![vec![green_5, red(1)], vec![blue(1), blue(2)]];
    let mut game = started(&hands, &[blue(5)], &[blue(9); 2])?;
    let outcome = game.play_card("ann", 0, None)?;
    assert_eq!(outcome.active_color, Some(Color::Green));
    Ok(())
}

#[test]
fn drawing_consumes_the_turn() -> Result<(), GameError> {
    let hands = vec![vec![blue(3), blue(4)], vec![blue(1), blue(2)]];
    let mut game = started(&hands, &[RED_5], &[red(8), red(7)])?;
    let outcome = game.draw_card("ann")?;
    assert_eq!(outcome.drawn_card, red(7));
    assert_eq!(outcome.next_player_index, 1);
    assert_eq!(game.players()[0].hand, vec![blue(3), blue(4), red(7)]);
    assert!(matches!(game.draw_card("ann"), Err(GameError::NotYourTurn)));
    Ok(())
}

#[test]
fn empty_deck_blocks_drawing_and_allows_passing() -> Result<(), GameError> {
    let hands = vec![vec![blue(3), blue(4)], vec![blue(1), blue(2)]];
    let mut game = started(&hands, &[RED_5], &[red(8)])?;
    let err = game.pass_turn("ann").unwrap_err();
    assert!(matches!(err, GameError::InvalidAction(InvalidAction::MustDraw)));
    game.draw_card("ann")?;

    let before = game.clone();
    assert!(matches!(game.draw_card("bob"), Err(GameError::EmptyDeck)));
    assert_eq!(game, before);
    assert_eq!(game.legal_actions("bob")?, vec![Action::Pass]);
    assert_eq!(game.pass_turn("bob")?, 0);
    assert_eq!(game.current_player_index(), 0);
    Ok(())
}

#[test]
fn reshuffle_refills_the_deck_from_discards() -> Result<(), GameError> {
    let hands = vec![vec![red(1), red(2), red(3)], vec![blue(1), blue(2), blue(3)]];
    let mut game = Game::builder("shuf01")
        .with_hand_size(3)
        .with_reshuffle(true)
        .build()?;
    for name in ["ann", "bob"] {
        game.join(name)?;
        game.set_ready(name, true)?;
    }
    game.start_with_deck("ann", stacked_deck(&hands, &[RED_5], &[]))?;
    assert!(game.deck().is_empty());
    game.play_card("ann", 0, None)?;
    let top = game.top_card();
    let drawn = game.draw_card("bob")?;
    assert_eq!(drawn.drawn_card, RED_5);
    assert_eq!(game.discard_pile().len(), 1);
    assert_eq!(game.top_card(), top);
    assert_eq!(game.total_cards(), 3 + 3 + 1);
    Ok(())
}

#[test]
fn leaving_before_the_current_player_keeps_the_turn_holder() -> Result<(), GameError> {
    let hands = vec![
        vec![red(1), red(2)],
        vec![red(3), red(4)],
        vec![blue(1), blue(2)],
        vec![blue(3), blue(4)],
    ];
    let mut game = started(&hands, &[RED_5], &[blue(9); 4])?;
    game.play_card("ann", 0, None)?;
    game.play_card("bob", 0, None)?;
    assert_eq!(game.current_player_index(), 2);
    let outcome = game.leave("ann")?;
    assert!(!outcome.room_empty);
    assert_eq!(game.current_player_index(), 1);
    assert_eq!(game.current_player().map(|p| p.name.as_str()), Some("cy"));
    let positions: Vec<usize> = game.players().iter().map(|p| p.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);
    // ann's remaining card went under the deck.
    assert_eq!(game.deck().cards().first(), Some(&red(2)));
    assert_eq!(game.total_cards(), 4 * 2 + 1 + 4);
    Ok(())
}

#[test]
fn current_player_leaving_hands_turn_to_next_in_direction() -> Result<(), GameError> {
    let hands = vec![
        vec![Card::Reverse(Color::Red), red(2)],
        vec![red(3), red(4)],
        vec![blue(1), blue(2)],
        vec![blue(3), blue(4)],
    ];
    let mut game = started(&hands, &[RED_5], &[blue(9); 4])?;
    game.play_card("ann", 0, None)?;
    assert_eq!(game.current_player().map(|p| p.name.as_str()), Some("dee"));
    game.leave("dee")?;
    assert_eq!(game.current_player().map(|p| p.name.as_str()), Some("cy"));
    assert_eq!(game.current_player_index(), 2);

    let mut game = started(&hands, &[RED_5], &[blue(9); 4])?;
    game.leave("ann")?;
    assert_eq!(game.current_player().map(|p| p.name.as_str()), Some("bob"));
    assert_eq!(game.current_player_index(), 0);
    Ok(())
}

#[test]
fn last_opponent_leaving_is_a_walkover() -> Result<(), GameError> {
    let hands = vec![vec![red(1), red(2)], vec![blue(1), blue(2)]];
    let mut game = started(&hands, &[RED_5], &[blue(9); 2])?;
    let bob = game.players()[1].id;
    let outcome = game.leave("ann")?;
    assert_eq!(outcome.status, GameStatus::Finished { winner: bob });
    let outcome = game.leave("bob")?;
    assert!(outcome.room_empty);
    Ok(())
}

#[test]
fn join_failures_leave_the_room_unchanged() -> Result<(), GameError> {
    let mut game = Game::builder("join01").with_max_players(2).build()?;
    game.join("Ann")?;
    let before = game.clone();
    assert!(matches!(game.join("aNN"), Err(GameError::NameTaken(_))));
    assert!(matches!(
        game.join("   "),
        Err(GameError::InvalidAction(InvalidAction::InvalidName))
    ));
    assert_eq!(game, before);

    game.join("bob")?;
    let before = game.clone();
    assert!(matches!(
        game.join("cy"),
        Err(GameError::RoomFull { max_players: 2 })
    ));
    assert_eq!(game, before);

    for name in ["ann", "bob"] {
        game.set_ready(name, true)?;
    }
    game.start("ann")?;
    game.leave("bob")?;
    let before = game.clone();
    assert!(matches!(game.join("cy"), Err(GameError::NotWaiting)));
    assert_eq!(game, before);
    Ok(())
}

#[test]
fn start_requires_two_ready_players() -> Result<(), GameError> {
    let mut game = Game::builder("start1").build()?;
    game.join("ann")?;
    game.set_ready("ann", true)?;
    assert!(matches!(
        game.start("ann"),
        Err(GameError::InsufficientPlayers {
            required: 2,
            present: 1
        })
    ));
    game.join("bob")?;
    assert!(matches!(game.start("ann"), Err(GameError::PlayersNotReady)));
    assert!(matches!(game.start("zed"), Err(GameError::PlayerNotFound(_))));
    game.set_ready("bob", true)?;
    game.set_ready("bob", false)?;
    assert!(matches!(game.start("bob"), Err(GameError::PlayersNotReady)));
    assert_eq!(game.status(), GameStatus::Waiting);
    Ok(())
}

#[test]
fn card_count_is_conserved_through_a_random_game() -> Result<(), GameError> {
    for seed in 0..8u64 {
        let mut game = Game::builder("rand01").with_seed(seed).build()?;
        for name in NAMES {
            game.join(name)?;
            game.set_ready(name, true)?;
        }
        game.start("ann")?;
        let mut bot = RandomBot::new(StdRng::seed_from_u64(seed));
        for _ in 0..500 {
            if game.is_finished() {
                break;
            }
            let seat = game.current_player_index();
            let name = game.players()[seat].name.clone();
            let legal = game.legal_actions(&name)?;
            let action = bot.select_action(&game.snapshot(), seat, &legal);
            game.apply_action(&name, action)?;
            assert_eq!(game.total_cards(), DECK_SIZE);
            let status = game.status();
            if status == GameStatus::Playing {
                assert!(game.current_player_index() < game.players().len());
            }
        }
    }
    Ok(())
}
