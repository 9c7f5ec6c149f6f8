use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "messfeed", version, about = "Rate your mess meals from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in, log out, show the current student
    #[command(flatten)]
    Session(commands::session::SessionAction),
    /// Today's meals and ratings
    Meals {
        #[command(subcommand)]
        action: commands::meals::MealsAction,
    },
    /// Feedback history
    History {
        #[command(subcommand)]
        action: commands::history::HistoryAction,
    },
    /// Mess type and caterer
    Mess {
        #[command(subcommand)]
        action: commands::mess::MessAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions {
        shell: Shell,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("MESSFEED_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Session(action) => commands::session::run(action),
        Commands::Meals { action } => commands::meals::run(action),
        Commands::History { action } => commands::history::run(action),
        Commands::Mess { action } => commands::mess::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "messfeed", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
