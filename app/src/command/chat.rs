//! Terminal conversation against the knowledge base.
//!
//! Every line is sent as a knowledge-base turn on one session, so the
//! continuation handle carries context between questions the same way it
//! does behind the bot runtime.

use helpdesk_config::Config;
use helpdesk_core::intent::{FALLBACK_INTENT, GREETING_INTENT};
use helpdesk_core::{IntentEvent, SessionAttributes};
use std::io::Write;
use tracing::info;
use uuid::Uuid;

use super::{Bot, SessionBackend};

/// Input parameters for the Chat command strategy.
#[derive(Debug, Clone)]
pub struct ChatInput {
    pub config: Config,
    /// Session ID to resume (a new one is generated if not provided)
    pub session_id: Option<String>,
    /// Single message to send (non-interactive mode)
    pub message: Option<String>,
    pub session_backend: SessionBackend,
}

#[derive(Debug, Clone, Copy)]
pub struct ChatStrategy;

/// Send one line as a bot turn and return the reply text.
async fn turn(
    bot: &Bot,
    session_id: &str,
    attributes: &mut SessionAttributes,
    text: &str,
) -> anyhow::Result<String> {
    let intent = if text.eq_ignore_ascii_case("/hello") {
        GREETING_INTENT
    } else {
        FALLBACK_INTENT
    };

    let event = IntentEvent::new(session_id, Some(intent), text)
        .with_session_attributes(attributes.clone());
    let response = bot.handle(&event).await?;

    attributes.clone_from(&response.session_state.session_attributes);
    Ok(response.content().unwrap_or_default().to_string())
}

impl super::CommandStrategy for ChatStrategy {
    type Input = ChatInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let bot = super::build_bot(&input.config, input.session_backend).await?;
        let session_id = input
            .session_id
            .unwrap_or_else(|| Uuid::now_v7().to_string());
        let mut attributes = SessionAttributes::new();

        info!("Starting conversation session: {session_id}");

        if let Some(msg) = input.message {
            println!("{}", turn(&bot, &session_id, &mut attributes, &msg).await?);
            return Ok(());
        }

        println!("=== Conversation Session: {session_id} ===");
        println!("Type 'exit', 'quit', or Ctrl+C to end the session. '/hello' sends a greeting.\n");

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let mut line = String::new();
            if std::io::stdin().read_line(&mut line)? == 0 {
                break;
            }
            let line = line.trim();

            if matches!(line, "exit" | "quit" | "q") {
                break;
            }
            if line.is_empty() {
                continue;
            }

            match turn(&bot, &session_id, &mut attributes, line).await {
                Ok(reply) => println!("\n{reply}\n"),
                Err(e) => eprintln!("Error: {e}"),
            }
        }

        println!("\nSession ended: {session_id}");
        Ok(())
    }
}
