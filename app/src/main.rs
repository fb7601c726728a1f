#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

mod command;

use clap::{Parser, Subcommand};
use command::{
    BotStrategy, ChatInput, ChatStrategy, CommandStrategy, HandlerKind, InfoStrategy,
    IngestStrategy, InitStrategy, InvokeInput, InvokeStrategy, SessionBackend, VersionStrategy,
};
use helpdesk_config::{Config, LogLevel};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "helpdesk")]
#[command(about = "Knowledge-base help desk bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve bot fulfillment requests (Lambda)
    Bot,
    /// Serve upload-triggered ingestion (Lambda)
    Ingest,
    /// Run one event through a handler and print the response
    Invoke {
        /// Handler to run
        #[arg(long, value_enum)]
        handler: HandlerKind,

        /// Event JSON file (reads stdin when omitted)
        #[arg(short, long)]
        event: Option<PathBuf>,

        /// Keep sessions in memory instead of the session table
        #[arg(long)]
        memory_store: bool,
    },
    /// Chat with the knowledge base from the terminal
    Chat {
        /// Single message to send
        #[arg(short = 'm', long)]
        message: Option<String>,

        /// Session ID to resume
        #[arg(short, long)]
        session: Option<String>,

        /// Keep sessions in memory instead of the session table
        #[arg(long)]
        memory_store: bool,
    },
    /// Show resolved configuration
    Info,
    /// Initialize configuration
    Init,
    /// Show version
    Version,
}

/// Level used when none is configured. The bot handler logs each turn at
/// info.
const fn default_log_level(command: &Commands) -> LogLevel {
    match command {
        Commands::Bot => LogLevel::Info,
        _ => LogLevel::Error,
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over `level`.
fn init_tracing(level: LogLevel) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_ansi(std::io::stdout().is_terminal())
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load();
    let fallback = default_log_level(&cli.command);
    init_tracing(
        config
            .as_ref()
            .map_or(fallback, |c| c.log_level_or(fallback)),
    )?;

    match cli.command {
        Commands::Bot => BotStrategy.execute(config?).await,
        Commands::Ingest => IngestStrategy.execute(config?).await,
        Commands::Invoke {
            handler,
            event,
            memory_store,
        } => {
            InvokeStrategy
                .execute(InvokeInput {
                    config: config?,
                    handler,
                    event,
                    session_backend: SessionBackend::from_flag(memory_store),
                })
                .await
        }
        Commands::Chat {
            message,
            session,
            memory_store,
        } => {
            ChatStrategy
                .execute(ChatInput {
                    config: config?,
                    session_id: session,
                    message,
                    session_backend: SessionBackend::from_flag(memory_store),
                })
                .await
        }
        Commands::Info => InfoStrategy.execute(config?).await,
        Commands::Init => InitStrategy.execute(()).await,
        Commands::Version => VersionStrategy.execute(()).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_parse_invoke() {
        let cli = Cli::try_parse_from([
            "helpdesk",
            "invoke",
            "--handler",
            "ingest",
            "--event",
            "upload.json",
        ])
        .expect("invoke should parse");

        match cli.command {
            Commands::Invoke {
                handler,
                event,
                memory_store,
            } => {
                assert_eq!(handler, HandlerKind::Ingest);
                assert_eq!(event, Some(PathBuf::from("upload.json")));
                assert!(!memory_store);
            }
            _ => panic!("expected invoke command"),
        }
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_parse_chat_memory_store() {
        let cli = Cli::try_parse_from(["helpdesk", "chat", "--memory-store", "-m", "hi"])
            .expect("chat should parse");

        match cli.command {
            Commands::Chat {
                message,
                session,
                memory_store,
            } => {
                assert_eq!(message.as_deref(), Some("hi"));
                assert_eq!(session, None);
                assert_eq!(SessionBackend::from_flag(memory_store), SessionBackend::Memory);
            }
            _ => panic!("expected chat command"),
        }
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_bot_logs_at_info_by_default() {
        let bot = Cli::try_parse_from(["helpdesk", "bot"]).expect("bot should parse");
        assert_eq!(default_log_level(&bot.command), LogLevel::Info);

        let ingest = Cli::try_parse_from(["helpdesk", "ingest"]).expect("ingest should parse");
        assert_eq!(default_log_level(&ingest.command), LogLevel::Error);

        let config = Config::default();
        assert_eq!(
            config.log_level_or(default_log_level(&bot.command)),
            LogLevel::Info
        );
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
