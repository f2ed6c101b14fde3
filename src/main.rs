use std::path::PathBuf;
use std::sync::Arc;

use agentlab::config::Config;
use agentlab::console::StdConsole;
use agentlab::tutorials::{self, GenaiProvider, Workbench};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Agentlab - agent, graph and retrieval tutorials
#[derive(Parser, Debug)]
#[command(name = "agentlab")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to ~/.config/agentlab/config.toml)
    #[arg(short, long, global = true, env = "AGENTLAB_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Chat with a greeting agent
    Greeting,
    /// Agent with factorial and current-time tools
    Tools,
    /// Agent that spins the fortunate wheel
    Wheel,
    /// Structured paragraph on a topic, with its word count
    Paragraph,
    /// Question answering over session state about Newton's laws
    SessionQa,
    /// Single-node graph returning a compliment
    Compliment {
        #[arg(long, default_value = "Alice")]
        name: String,
    },
    /// Sum or product of a list of values
    Calculator {
        #[arg(long, default_value = "Vedanga")]
        name: String,
        #[arg(long, num_args = 1.., default_values = ["1", "2", "3", "4"])]
        values: Vec<i64>,
        #[arg(long, default_value = "+")]
        operation: String,
    },
    /// Three-node sequence building a profile message
    Profile {
        #[arg(long, default_value = "Bob")]
        name: String,
        #[arg(long, default_value = "30")]
        age: String,
        #[arg(long, num_args = 1.., default_values = ["Python", "Machine Learning", "LangGraph"])]
        skills: Vec<String>,
    },
    /// Two routed arithmetic operations over four numbers
    Arithmetic,
    /// Number guessing game with a looping graph
    GuessingGame {
        #[arg(long, default_value = "Student")]
        player: String,
        /// Seed for a reproducible target number
        #[arg(long)]
        seed: Option<u64>,
    },
    /// One-shot chat, no memory
    Chat,
    /// Chat that keeps the conversation history
    MemoryChat,
    /// Rewrite a question, then answer the rewrite
    TwoStep,
    /// Route questions to a Python or general expert
    Router,
    /// ReAct agent with arithmetic tools
    React,
    /// Draft and save a document
    Drafter,
    /// RAG agent over the session slides
    Rag {
        /// Slides as a PDF, or a text export with pages separated by form feeds
        document: PathBuf,
    },
    /// Question answering over restaurant reviews
    Reviews {
        /// CSV with Title, Date, Rating and Review columns
        #[arg(default_value = "realistic_restaurant_reviews.csv")]
        csv: PathBuf,
    },
    /// Summarize a paragraph
    Summarize,
    /// Continue a starting line
    Generate,
    /// Star ratings for five movie reviews
    Sentiment,
}

fn init_logging(config: &Config) -> Result<()> {
    let log_file = std::fs::File::create(&config.general.log_file)
        .with_context(|| {
            format!("Failed to create log file: {}", config.general.log_file.display())
        })?;
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("AGENTLAB_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(log_file).with_ansi(false))
        .init();
    Ok(())
}

async fn run(bench: &Workbench, command: Command) -> Result<()> {
    match command {
        Command::Greeting => tutorials::adk::greeting(bench).await,
        Command::Tools => tutorials::adk::tools(bench).await,
        Command::Wheel => tutorials::adk::wheel(bench).await,
        Command::Paragraph => tutorials::adk::paragraph(bench).await,
        Command::SessionQa => tutorials::adk::session_qa(bench).await,
        Command::Compliment { name } => tutorials::basics::compliment(bench, &name).await,
        Command::Calculator {
            name,
            values,
            operation,
        } => tutorials::basics::calculator(bench, &name, &values, &operation).await,
        Command::Profile { name, age, skills } => {
            tutorials::basics::profile(bench, &name, &age, &skills).await
        },
        Command::Arithmetic => tutorials::basics::arithmetic(bench).await,
        Command::GuessingGame { player, seed } => {
            tutorials::basics::guessing_game(bench, &player, seed)
                .await
                .map(|_| ())
        },
        Command::Chat => tutorials::chat::chat(bench).await,
        Command::MemoryChat => tutorials::chat::memory_chat(bench).await,
        Command::TwoStep => tutorials::chat::two_step(bench).await,
        Command::Router => tutorials::chat::router(bench).await,
        Command::React => tutorials::react::react(bench).await,
        Command::Drafter => tutorials::drafter::drafter(bench).await.map(|_| ()),
        Command::Rag { document } => tutorials::rag::rag(bench, &document).await,
        Command::Reviews { csv } => tutorials::reviews::reviews(bench, &csv).await,
        Command::Summarize => tutorials::text::summarize(bench).await,
        Command::Generate => tutorials::text::generate(bench).await,
        Command::Sentiment => tutorials::text::sentiment(bench).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env files (local first, then home directory)
    // Errors are ignored - files are optional
    let _ = dotenvy::from_filename(".env");
    if let Some(home) = dirs::home_dir() {
        let _ = dotenvy::from_path(home.join(".env"));
    }

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;
    init_logging(&config)?;
    info!("Running {:?}", args.command);

    let console = Arc::new(StdConsole::default());
    let provider = Arc::new(GenaiProvider::new(config.clone()));
    let bench = Workbench::new(config, console, provider);
    run(&bench, args.command).await
}
