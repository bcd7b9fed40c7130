use anyhow::Result;
use clap::{Parser, Subcommand};

mod cli;

#[derive(Parser)]
#[command(name = "kudos")]
#[command(about = "Gamified profile engine - XP, levels and badges from app state")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the total XP derived from the loaded rules
    Xp,

    /// Show the current level and progress toward the next one
    Level,

    /// List badges and whether they are achieved
    Badges {
        /// Only show achieved badges
        #[arg(long)]
        achieved_only: bool,
    },

    /// Set one state variable for an app and report what changed
    Set {
        app: String,
        variable: String,
        /// JSON scalar (number, bool or string)
        value: String,
    },

    /// Increment a numeric state variable for an app
    Increment {
        app: String,
        variable: String,
        #[arg(default_value_t = 1.0)]
        delta: f64,
    },

    /// Create the default config file and data directories
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    match cli.command {
        Commands::Xp => cli::show::xp_command(),
        Commands::Level => cli::show::level_command(),
        Commands::Badges { achieved_only } => cli::show::badges_command(achieved_only),
        Commands::Set {
            app,
            variable,
            value,
        } => cli::state::set_command(&app, &variable, &value),
        Commands::Increment {
            app,
            variable,
            delta,
        } => cli::state::increment_command(&app, &variable, delta),
        Commands::Init { force } => cli::init::init_command(force),
    }
}
