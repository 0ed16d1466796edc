use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "fluide", version, about = "Fluide: daily French speaking practice")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the plan for a day
    Plan {
        /// Day name ("monday", "sat"); defaults to today
        day: Option<String>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Custom chunk library
    Chunks {
        #[command(subcommand)]
        action: commands::chunks::ChunksAction,
    },
    /// Practice history
    History {
        #[command(subcommand)]
        action: commands::history::HistoryAction,
    },
    /// Grammar-check API key
    Key {
        #[command(subcommand)]
        action: commands::key::KeyAction,
    },
    /// Check a sentence built around a chunk
    Check {
        /// The chunk being practised
        chunk: String,
        /// The sentence to check
        sentence: String,
    },
    /// Run a drill or monologue countdown in the terminal
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Walk through today's routine interactively
    Practice {
        /// Day to practise; defaults to today
        #[arg(long)]
        day: Option<String>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("FLUIDE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_logging();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Plan { day, json } => commands::plan::run(day.as_deref(), json),
        Commands::Chunks { action } => commands::chunks::run(action),
        Commands::History { action } => commands::history::run(action),
        Commands::Key { action } => commands::key::run(action),
        Commands::Check { chunk, sentence } => commands::check::run(&chunk, &sentence),
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Practice { day } => commands::practice::run(day.as_deref()),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
