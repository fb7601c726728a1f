use helpdesk_config::Config;

fn show(value: Option<&String>) -> &str {
    value.map_or("(not set)", String::as_str)
}

fn status(result: anyhow::Result<impl Sized>) -> String {
    match result {
        Ok(_) => "ready".to_string(),
        Err(e) => format!("incomplete ({e})"),
    }
}

/// Strategy for displaying the resolved configuration.
///
/// Shows file values after environment overrides, and whether each
/// handler has everything it needs to start.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = Config;

    async fn execute(&self, config: Self::Input) -> anyhow::Result<()> {
        println!("=== helpdesk Configuration ===\n");

        match Config::config_path() {
            Some(path) if path.exists() => println!("Config file: {}", path.display()),
            Some(path) => println!("Config file: {} (not present)", path.display()),
            None => println!("Config file: (no home directory)"),
        }
        match config.log_level {
            Some(level) => println!("Log level: {level:?}"),
            None => println!("Log level: (not set, INFO for bot, ERROR otherwise)"),
        }
        println!();

        println!("Bot:");
        println!(
            "  Knowledge base: {}",
            show(config.bot.knowledge_base_id.as_ref())
        );
        println!("  Model ARN: {}", show(config.bot.model_arn.as_ref()));
        println!(
            "  Session table: {}",
            show(config.bot.session_table.as_ref())
        );
        println!("  On store error: {:?}", config.bot.on_store_error);
        println!(
            "  Status: {}",
            status(config.bot_config().and_then(|_| config.session_table()))
        );
        println!();

        println!("Ingestion:");
        println!(
            "  Knowledge base: {}",
            show(config.ingestion.knowledge_base_id.as_ref())
        );
        println!(
            "  Data source: {}",
            show(config.ingestion.data_source_id.as_ref())
        );
        println!("  Status: {}", status(config.ingestion_target()));

        Ok(())
    }
}
