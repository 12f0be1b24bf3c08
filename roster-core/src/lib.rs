mod lineup;
mod stats;

pub use lineup::{BENCH_RANK, batting_order_rank, pitcher_slot_rank};
pub use stats::{batting_average, ops, slugging, win_rate};

/// The two mutually exclusive player variants. A player's type is fixed at
/// creation and decides which counting stats and ratings apply to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayerType {
    Batter,
    Pitcher,
}

impl PlayerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerType::Batter => "batter",
            PlayerType::Pitcher => "pitcher",
        }
    }

    pub fn parse(s: &str) -> Option<PlayerType> {
        match s {
            "batter" => Some(PlayerType::Batter),
            "pitcher" => Some(PlayerType::Pitcher),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
