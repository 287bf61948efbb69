//! civicquiz — citizenship-test practice API server.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "civicquiz", version, about = "U.S. citizenship test practice API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Config file path (default: ./civicquiz.toml if present)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Port to listen on (overrides config and PORT)
        #[arg(long)]
        port: Option<u16>,

        /// Question data file (overrides config and CIVICQUIZ_QUESTIONS)
        #[arg(long)]
        questions: Option<PathBuf>,

        /// Browser client directory (overrides config and CIVICQUIZ_STATIC)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Check a question data file and summarize its categories
    Validate {
        /// Path to the question JSON file
        #[arg(long, default_value = "questions.json")]
        questions: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("civicquiz=info".parse().unwrap())
                .add_directive("civicquiz_server=info".parse().unwrap())
                .add_directive("civicquiz_core=info".parse().unwrap())
                .add_directive("civicquiz_providers=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve {
            config,
            port,
            questions,
            static_dir,
        } => commands::serve::execute(config, port, questions, static_dir).await,
        Commands::Validate { questions } => commands::validate::execute(questions),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
