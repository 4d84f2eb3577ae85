use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "baccarat",
    version,
    about = "Baccarat table with Lucky Six side bets"
)]
pub struct BaccaratCli {
    /// TOML configuration file (overrides BACCARAT_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the resolved configuration with the source of each value
    Cfg,
    /// Manage player accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Play private rounds for one user
    Play {
        #[arg(long)]
        user: i64,
        #[command(flatten)]
        wagers: WagerArgs,
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        times: u32,
    },
    /// Place bets on the open lobby round
    Bet {
        #[arg(long)]
        user: i64,
        /// Lobby round id; defaults to the round currently taking bets
        #[arg(long)]
        round: Option<String>,
        #[command(flatten)]
        wagers: WagerArgs,
    },
    /// Show a stored round with its bets
    Round {
        #[arg(long)]
        id: String,
    },
    /// Deal one round without any wagers
    Deal {
        #[arg(long)]
        seed: Option<u64>,
        /// Append the round to a JSONL log
        #[arg(long)]
        log: Option<String>,
    },
    /// Run the lobby scheduler
    Lobby {
        /// Stop after this many rounds (runs until Ctrl+C otherwise)
        #[arg(long)]
        rounds: Option<usize>,
        #[arg(long)]
        interval_secs: Option<u64>,
        #[arg(long)]
        window_secs: Option<u64>,
    },
    /// Re-derive every stored round and check its payouts
    Verify,
}

#[derive(Subcommand, Debug)]
pub enum UserAction {
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 0)]
        balance: u64,
    },
    Deposit {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        amount: u64,
    },
    Balance {
        #[arg(long)]
        id: i64,
    },
}

#[derive(Args, Debug, Clone, Copy, Default)]
pub struct WagerArgs {
    #[arg(long, default_value_t = 0)]
    pub player: u64,
    #[arg(long, default_value_t = 0)]
    pub banker: u64,
    #[arg(long, default_value_t = 0)]
    pub tie: u64,
    #[arg(long = "lucky-six", default_value_t = 0)]
    pub lucky_six: u64,
}

impl WagerArgs {
    pub fn to_wagers(self) -> baccarat_engine::payout::WagerSet {
        baccarat_engine::payout::WagerSet {
            player: self.player,
            banker: self.banker,
            tie: self.tie,
            lucky_six: self.lucky_six,
        }
    }
}
