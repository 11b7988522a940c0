use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

mod commands;

#[derive(Parser)]
#[command(name = "glimpse-cli", version, about = "Glimpse CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the rotation service
    Serve {
        /// Override the rotation interval in seconds
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Run one rotation cycle and print the selections
    Rotate {
        /// Rotate a single session instead of all of them
        #[arg(long)]
        device: Option<String>,
        /// Hand the payloads to the logging deliverer
        #[arg(long)]
        deliver: bool,
    },
    /// Score all presentations for a hand-built context
    Score {
        /// Hour of day (0-23)
        #[arg(long)]
        hour: u8,
        /// Number of meetings today
        #[arg(long, default_value_t = 0)]
        meetings: u32,
        /// Minutes until the next meeting
        #[arg(long)]
        next_meeting: Option<i64>,
        /// Unread message count
        #[arg(long, default_value_t = 0)]
        unread: u32,
        /// Jitter seed (jitter is disabled when omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Emit the ranking as JSON
        #[arg(long)]
        json: bool,
    },
    /// Session registry management
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Serve { interval } => commands::serve::run(interval),
        Commands::Rotate { device, deliver } => commands::rotate::run(device, deliver),
        Commands::Score {
            hour,
            meetings,
            next_meeting,
            unread,
            seed,
            json,
        } => commands::score::run(hour, meetings, next_meeting, unread, seed, json),
        Commands::Session { action } => commands::session::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "glimpse-cli", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
