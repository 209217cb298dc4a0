use cadence_graph::{GraphKind, LlmConfig, StreamMode};
use cadence_voice::RunnerOptions;
use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub agent: AgentConfig,
    pub llm: LlmSettings,
    pub tools: ToolsConfig,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub openai_api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    pub graph: GraphKind,
    pub stream_mode: StreamMode,
    /// Node whose output is spoken in updates mode
    pub node: String,
    pub greeting: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub include_system: bool,
    pub max_iterations: usize,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl AgentConfig {
    pub fn runner_options(&self) -> RunnerOptions {
        RunnerOptions {
            mode: self.stream_mode,
            node: self.node.clone(),
            include_system: self.include_system,
            session_id: self.session_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    pub model: String,
    pub temperature: f32,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    pub streaming: bool,
    #[serde(default)]
    pub base_url: Option<String>,
}

impl From<&LlmSettings> for LlmConfig {
    fn from(settings: &LlmSettings) -> Self {
        let config = LlmConfig::new(settings.model.clone())
            .with_temperature(settings.temperature)
            .with_streaming(settings.streaming);
        match settings.max_tokens {
            Some(tokens) => config.with_max_tokens(tokens),
            None => config,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolsConfig {
    pub mtg_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables such as `LLM__MODEL` or `AGENT__STREAM_MODE`
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let mut builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false));

        for prefix in ["AGENT", "LLM", "TOOLS", "LOGGING"] {
            builder = builder.add_source(
                Environment::with_prefix(prefix)
                    .separator("__")
                    .keep_prefix(true)
                    .try_parsing(true),
            );
        }

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        cfg.openai_api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            ConfigError::Message("OPENAI_API_KEY environment variable is required".to_string())
        })?;

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        ConfigLoader::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }
}
