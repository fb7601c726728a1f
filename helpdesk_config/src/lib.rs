mod schema;

pub use schema::{BotSection, Config, IngestionSection, LogLevel, env};
