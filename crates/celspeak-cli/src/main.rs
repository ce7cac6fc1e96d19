use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "celspeak", version, about = "CELPIP speaking practice timer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive practice session
    Practice(commands::practice::PracticeArgs),
    /// Browse the task catalog
    Tasks {
        #[command(subcommand)]
        action: commands::tasks::TasksAction,
    },
    /// Practice counter
    Counter {
        #[command(subcommand)]
        action: commands::counter::CounterAction,
    },
    /// Saved custom prompt
    Custom {
        #[command(subcommand)]
        action: commands::custom::CustomAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate a model answer for one prompt
    Answer(commands::answer::AnswerArgs),
    /// Print shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("CELSPEAK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Practice(args) => commands::practice::run(args),
        Commands::Tasks { action } => commands::tasks::run(action),
        Commands::Counter { action } => commands::counter::run(action),
        Commands::Custom { action } => commands::custom::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Answer(args) => commands::answer::run(args),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "celspeak", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
