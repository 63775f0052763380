pub mod heuristic;
pub mod random;
pub mod registry;

pub use heuristic::HeuristicBot;
pub use random::RandomBot;
pub use registry::{create_bot_from_spec, label_for_spec};
