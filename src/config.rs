use crate::llm::orchestrator::{DEFAULT_MODEL, DEFAULT_SYSTEM_PROMPT, DEFAULT_TEMPERATURE};
use crate::llm::{ChatDefaults, LlmSettings, Provider};
use crate::session::DEFAULT_MAX_HISTORY;
use clap::Parser;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;

/// Config file picked up from the working directory when none is named.
const CWD_CONFIG_FILE: &str = "config.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long)]
    pub port: Option<u16>,

    /// Default model sent to the completion backend
    #[arg(long)]
    pub model: Option<String>,

    /// Log output format (pretty or json)
    #[arg(long)]
    pub log_format: Option<LogFormat>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub session: SessionConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding `index.html` and the PWA assets.
    pub static_dir: String,
    pub request_timeout_secs: u64,
}

#[derive(Deserialize, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub system_prompt: String,
    pub timeout_secs: u64,
    #[serde(default)]
    pub azure_deployment: Option<String>,
    #[serde(default)]
    pub azure_api_version: Option<String>,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .field("azure_deployment", &self.azure_deployment)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub max_history: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Default filter directive, overridden by `RUST_LOG`.
    pub filter: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn as_str(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

/// Conventional environment names mapped onto config keys.
const DIRECT_ENV: &[(&str, &str)] = &[
    ("OPENAI_API_KEY", "llm.api_key"),
    ("OPENAI_BASE_URL", "llm.base_url"),
    ("OPENAI_MODEL", "llm.model"),
    ("SYSTEM_PROMPT", "llm.system_prompt"),
    ("AZURE_DEPLOYMENT_NAME", "llm.azure_deployment"),
    ("AZURE_API_VERSION", "llm.azure_api_version"),
];

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args).map_err(|e| ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder();

        // 1. Defaults
        builder = builder
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("server.static_dir", "static")?
            .set_default("server.request_timeout_secs", 90)?
            .set_default("llm.base_url", "https://api.openai.com")?
            .set_default("llm.model", DEFAULT_MODEL)?
            .set_default("llm.temperature", f64::from(DEFAULT_TEMPERATURE))?
            .set_default("llm.system_prompt", DEFAULT_SYSTEM_PROMPT)?
            .set_default("llm.timeout_secs", 60)?
            .set_default("session.max_history", DEFAULT_MAX_HISTORY as u64)?
            .set_default("log.format", "pretty")?
            .set_default("log.filter", "info")?;

        // 2. Config file: explicit path, else ./config.yaml if present
        if let Some(path) = &cli.config {
            builder = builder.add_source(File::new(path, FileFormat::Yaml).required(true));
        } else if Path::new(CWD_CONFIG_FILE).exists() {
            builder = builder.add_source(File::new(CWD_CONFIG_FILE, FileFormat::Yaml));
        }

        // 3. Prefixed environment, e.g. JARVIS_SERVER__PORT=9000
        builder = builder.add_source(
            Environment::with_prefix("JARVIS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // 4. Conventional direct names
        for (var, key) in DIRECT_ENV {
            if let Ok(val) = env::var(var) {
                builder = builder.set_override(*key, val)?;
            }
        }
        if let Ok(val) = env::var("MAX_HISTORY") {
            let parsed = val
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::Message(format!("MAX_HISTORY: {e}")))?;
            builder = builder.set_override("session.max_history", parsed)?;
        }
        if let Ok(val) = env::var("PORT") {
            let parsed = val
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::Message(format!("PORT: {e}")))?;
            builder = builder.set_override("server.port", u64::from(parsed))?;
        }

        // 5. CLI flags
        if let Some(host) = cli.host {
            builder = builder.set_override("server.host", host)?;
        }
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", u64::from(port))?;
        }
        if let Some(model) = cli.model {
            builder = builder.set_override("llm.model", model)?;
        }
        if let Some(format) = cli.log_format {
            builder = builder.set_override("log.format", format.as_str())?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validated()
    }

    fn validated(mut self) -> Result<Self, ConfigError> {
        if self.session.max_history < 2 {
            return Err(ConfigError::Message(format!(
                "session.max_history must be at least 2, got {}",
                self.session.max_history
            )));
        }

        url::Url::parse(&self.llm.base_url).map_err(|e| {
            ConfigError::Message(format!("llm.base_url {:?} is not a URL: {e}", self.llm.base_url))
        })?;

        if self.llm.model.trim().is_empty() {
            self.llm.model = DEFAULT_MODEL.to_string();
        }
        if self.llm.system_prompt.trim().is_empty() {
            self.llm.system_prompt = DEFAULT_SYSTEM_PROMPT.to_string();
        }
        self.llm.api_key = self.llm.api_key.take().filter(|k| !k.trim().is_empty());

        Ok(self)
    }

    /// Request defaults handed to the orchestrator.
    #[must_use]
    pub fn chat_defaults(&self) -> ChatDefaults {
        ChatDefaults {
            model: self.llm.model.clone(),
            temperature: self.llm.temperature,
            system_prompt: self.llm.system_prompt.clone(),
        }
    }

    /// Backend connection settings, or `None` when no API key is configured.
    #[must_use]
    pub fn llm_settings(&self) -> Option<LlmSettings> {
        let api_key = self.llm.api_key.clone()?;
        let provider = Provider::detect_from_url(&self.llm.base_url).with_azure_deployment(
            self.llm.azure_deployment.clone(),
            self.llm.azure_api_version.clone(),
        );

        Some(LlmSettings {
            base_url: self.llm.base_url.clone(),
            api_key,
            provider,
            timeout: Duration::from_secs(self.llm.timeout_secs),
        })
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}
