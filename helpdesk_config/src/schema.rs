use helpdesk_core::{BotConfig, IngestionTarget, StoreErrorPolicy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variables read by [`Config::load`].
pub mod env {
    pub const KNOWLEDGE_BASE_ID: &str = "KBID";
    pub const MODEL_ARN: &str = "MODEL_ARN";
    pub const SESSION_TABLE: &str = "DDB_Name";
    pub const ON_STORE_ERROR: &str = "ON_STORE_ERROR";
    pub const INGESTION_KNOWLEDGE_BASE_ID: &str = "KNOWLEDGEBASEID";
    pub const DATA_SOURCE_ID: &str = "DATASOURCEID";
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
}

/// Log level as configured by operators.
///
/// Unknown values fall back to `Error`. An unset level is resolved per
/// entry point with [`Config::log_level_or`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", from = "String")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    #[default]
    Error,
    Critical,
}

impl LogLevel {
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "DEBUG" => Self::Debug,
            "INFO" => Self::Info,
            "WARNING" | "WARN" => Self::Warning,
            "CRITICAL" => Self::Critical,
            _ => Self::Error,
        }
    }

    /// Directive for `tracing_subscriber::EnvFilter`.
    #[must_use]
    pub const fn as_filter(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error | Self::Critical => "error",
        }
    }
}

impl From<String> for LogLevel {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub bot: BotSection,
    #[serde(default)]
    pub ingestion: IngestionSection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct BotSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_base_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_table: Option<String>,
    #[serde(default)]
    pub on_store_error: StoreErrorPolicy,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct IngestionSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_base_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source_id: Option<String>,
}

fn require(value: Option<&String>, var: &str) -> anyhow::Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("{var} is not configured"))
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join("helpdesk").join("config.json"))
    }

    /// Load `~/helpdesk/config.json` when present, then apply environment
    /// overrides.
    pub fn load() -> anyhow::Result<Self> {
        let config = match Self::config_path() {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(&path)?;
                let config: Self = serde_json::from_str(&content).map_err(|e| {
                    anyhow::anyhow!("Invalid config file {}: {e}", path.display())
                })?;
                tracing::debug!("Loaded config from {}", path.display());
                config
            }
            _ => Self::default(),
        };

        config.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by the names in [`env`].
    pub fn with_overrides<F>(mut self, lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(env::KNOWLEDGE_BASE_ID) {
            self.bot.knowledge_base_id = Some(v);
        }
        if let Some(v) = lookup(env::MODEL_ARN) {
            self.bot.model_arn = Some(v);
        }
        if let Some(v) = lookup(env::SESSION_TABLE) {
            self.bot.session_table = Some(v);
        }
        if let Some(v) = lookup(env::ON_STORE_ERROR) {
            self.bot.on_store_error = v.parse()?;
        }
        if let Some(v) = lookup(env::INGESTION_KNOWLEDGE_BASE_ID) {
            self.ingestion.knowledge_base_id = Some(v);
        }
        if let Some(v) = lookup(env::DATA_SOURCE_ID) {
            self.ingestion.data_source_id = Some(v);
        }
        if let Some(v) = lookup(env::LOG_LEVEL) {
            self.log_level = Some(LogLevel::parse(&v));
        }
        Ok(self)
    }

    /// Configured level, or `fallback` when none was set.
    #[must_use]
    pub fn log_level_or(&self, fallback: LogLevel) -> LogLevel {
        self.log_level.unwrap_or(fallback)
    }

    pub fn bot_config(&self) -> anyhow::Result<BotConfig> {
        Ok(BotConfig {
            knowledge_base_id: require(
                self.bot.knowledge_base_id.as_ref(),
                env::KNOWLEDGE_BASE_ID,
            )?,
            model_arn: require(self.bot.model_arn.as_ref(), env::MODEL_ARN)?,
            on_store_error: self.bot.on_store_error,
        })
    }

    pub fn session_table(&self) -> anyhow::Result<String> {
        require(self.bot.session_table.as_ref(), env::SESSION_TABLE)
    }

    pub fn ingestion_target(&self) -> anyhow::Result<IngestionTarget> {
        Ok(IngestionTarget {
            knowledge_base_id: require(
                self.ingestion.knowledge_base_id.as_ref(),
                env::INGESTION_KNOWLEDGE_BASE_ID,
            )?,
            data_source_id: require(self.ingestion.data_source_id.as_ref(), env::DATA_SOURCE_ID)?,
        })
    }

    pub fn create_config() -> anyhow::Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?;

        if path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                path.display()
            );
        }
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let config_template = r#"{
  "bot": {
    "knowledge_base_id": "your-knowledge-base-id",
    "model_arn": "arn:aws:bedrock:us-east-1::foundation-model/anthropic.claude-3-haiku-20240307-v1:0",
    "session_table": "helpdesk-sessions",
    "on_store_error": "treat_as_missing"
  },
  "ingestion": {
    "knowledge_base_id": "your-knowledge-base-id",
    "data_source_id": "your-data-source-id"
  },
  "log_level": "INFO"
}"#;

        std::fs::write(&path, config_template)?;

        println!("Created config file at: {}", path.display());
        println!();
        println!("Next steps:");
        println!("   1. Fill in the knowledge base, data source and session table");
        println!("   2. Make sure AWS credentials are available to the SDK");
        println!("   3. Run 'helpdesk chat' to talk to the knowledge base");
        println!();
        println!("Environment variables override the file:");
        println!(
            "   {}, {}, {}, {}, {}, {}, {}",
            env::KNOWLEDGE_BASE_ID,
            env::MODEL_ARN,
            env::SESSION_TABLE,
            env::ON_STORE_ERROR,
            env::INGESTION_KNOWLEDGE_BASE_ID,
            env::DATA_SOURCE_ID,
            env::LOG_LEVEL
        );
        Ok(())
    }
}
