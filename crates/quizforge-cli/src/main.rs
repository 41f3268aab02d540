//! quizforge command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "quizforge",
    version,
    about = "Adaptive quiz item selection and mastery tracking"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that touches the engine.
#[derive(Args, Clone, Debug, Default)]
pub struct EngineArgs {
    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory holding the state snapshot (overrides the config)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Generator provider name from the config, or "ollama" / "offline"
    #[arg(long)]
    pub provider: Option<String>,

    /// Model passed to the generator
    #[arg(long)]
    pub model: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create starter config and example item bank
    Init,

    /// Validate item bank TOML files
    Validate {
        /// Path to bank file or directory
        #[arg(long)]
        bank: PathBuf,
    },

    /// Run the item parser over raw generator output
    Parse {
        /// File holding the raw output (JSON, optionally in a markdown fence)
        #[arg(long)]
        input: PathBuf,

        /// Topic used for seed ids of candidates without an id
        #[arg(long, default_value = "general")]
        topic: String,
    },

    /// Import item bank files into the data directory
    Import {
        /// Path to bank file or directory
        #[arg(long)]
        bank: PathBuf,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Resolve a generation request through the cache
    Generate {
        #[arg(long)]
        topic: String,

        #[arg(long, default_value = "0")]
        easy: u32,

        #[arg(long, default_value = "0")]
        medium: u32,

        #[arg(long, default_value = "0")]
        hard: u32,

        /// Publish the batch into the item bank
        #[arg(long)]
        save: bool,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Select items for a learner without starting a session
    Select {
        #[command(flatten)]
        selection: commands::SelectionArgs,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Run an interactive quiz session, reading answers from stdin
    Quiz {
        #[command(flatten)]
        selection: commands::SelectionArgs,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Show a learner's mastery per topic
    Mastery {
        #[arg(long)]
        learner: String,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// List available models
    ListModels {
        /// Filter to specific provider
        #[arg(long)]
        provider: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quizforge=info".parse().expect("valid directive")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::Parse { input, topic } => commands::parse::execute(input, topic),
        Commands::Import { bank, engine } => commands::import::execute(bank, engine).await,
        Commands::Generate {
            topic,
            easy,
            medium,
            hard,
            save,
            engine,
        } => commands::generate::execute(topic, easy, medium, hard, save, engine).await,
        Commands::Select { selection, engine } => {
            commands::select::execute(selection, engine).await
        }
        Commands::Quiz { selection, engine } => commands::quiz::execute(selection, engine).await,
        Commands::Mastery { learner, engine } => {
            commands::mastery::execute(learner, engine).await
        }
        Commands::ListModels { provider, config } => {
            commands::list_models::execute(provider, config).await
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
