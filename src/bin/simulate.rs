use std::error::Error;
use std::process;
use std::sync::Arc;

use clap::{ArgAction, Parser};
use tracing::{info, warn};

use cardroom::{
    Action, Bot, GameStatus, MemoryStore, ServiceConfig, SessionService, create_bot_from_spec,
};

const DEFAULT_SEED: u64 = 0xDEC0_1DED_5EED_F00D;

#[derive(Parser, Debug)]
#[command(
    name = "simulate",
    about = "Play a full session between bots through the session service."
)]
struct Args {
    /// Seed for the deck shuffle and bot RNGs
    #[arg(short = 's', long = "seed", default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Stop after this many turns; the game is reported as unfinished
    #[arg(long = "max-turns", default_value_t = 1000)]
    max_turns: usize,

    /// Reshuffle the discard pile into the deck when it runs out
    #[arg(long = "reshuffle", action = ArgAction::SetTrue)]
    reshuffle: bool,

    /// Print every fan-out event as JSON
    #[arg(long = "events", action = ArgAction::SetTrue)]
    events: bool,

    /// Player bot specs: e.g., heuristic random:7 (2-10 total)
    bots: Vec<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();
    if let Err(err) = run(Args::parse()).await {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let bot_specs = if args.bots.is_empty() {
        vec![String::from("heuristic"), String::from("random")]
    } else {
        args.bots.clone()
    };
    let config = ServiceConfig::from_env()?
        .with_seed(args.seed)
        .with_max_players(bot_specs.len())
        .with_reshuffle(args.reshuffle);
    config.validate()?;

    let mut bots: Vec<Box<dyn Bot + Send>> = Vec::with_capacity(bot_specs.len());
    for (index, spec) in bot_specs.iter().enumerate() {
        bots.push(create_bot_from_spec(spec, index, args.seed)?);
    }
    let names: Vec<String> = bot_specs
        .iter()
        .enumerate()
        .map(|(index, spec)| format!("{}-{index}", cardroom::label_for_spec(spec)))
        .collect();

    let service = SessionService::new(config, Arc::new(MemoryStore::new()));
    let created = service.create_session(&names[0]).await?;
    let code = created.code;
    for name in &names[1..] {
        service.join_session(&code, name).await?;
    }

    if args.events {
        let mut events = service.subscribe(&code)?;
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                match serde_json::to_string(&event) {
                    Ok(json) => println!("{json}"),
                    Err(err) => warn!(error = %err, "failed to encode event"),
                }
            }
        });
    }

    for name in &names {
        service.set_ready(&code, name, true).await?;
    }
    service.start_game(&code, &names[0]).await?;
    info!(%code, players = names.len(), "simulation started");

    let mut turns = 0usize;
    loop {
        let state = service.get_state(&code).await?;
        if let GameStatus::Finished { winner } = state.status {
            let winner = state
                .players
                .iter()
                .find(|player| player.id == winner)
                .map(|player| player.name.as_str())
                .unwrap_or("unknown");
            println!("Game finished after {turns} turns. Winner: {winner}.");
            break;
        }
        if turns >= args.max_turns {
            println!("Max turn limit {} reached. Stopping simulation.", args.max_turns);
            break;
        }
        let seat = state.current_player_index;
        let name = &names[seat];
        let legal_actions = service.legal_actions(&code, name).await?;
        let action = bots[seat].select_action(&state, seat, &legal_actions);
        match action {
            Action::Play {
                hand_index,
                chosen_color,
            } => {
                service
                    .play_card(&code, name, hand_index, chosen_color)
                    .await?;
            }
            Action::Draw => {
                service.draw_card(&code, name).await?;
            }
            Action::Pass => {
                service.pass_turn(&code, name).await?;
            }
        }
        turns += 1;
    }

    Ok(())
}
