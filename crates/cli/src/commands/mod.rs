mod replay;
mod show_state;

pub use replay::Replay;
pub use show_state::ShowState;
