//! Application configuration.
//!
//! Priority: CLI flag > CLI env var > `CAMPUSLY_*` env > config file >
//! `./config.*` > defaults.

use std::time::Duration;

use clap::Parser;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::conversation::{DEFAULT_IDLE_TIMEOUT, DEFAULT_WELCOME};

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
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Responder endpoint that receives `{"query": ...}`
    #[arg(long, env = "RESPONDER_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Responder request timeout in seconds (unset waits indefinitely)
    #[arg(long, env = "RESPONDER_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub responder: ResponderConfig,
    pub widget: WidgetConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Conversations idle for longer than this are dropped.
    pub idle_timeout_secs: u64,
}

impl ServerConfig {
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResponderConfig {
    pub endpoint: Url,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ResponderConfig {
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Text shown by the widget.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct WidgetConfig {
    pub assistant_name: String,
    pub tagline: String,
    pub welcome: String,
    #[serde(default = "default_quick_prompts")]
    pub quick_prompts: Vec<String>,
    #[serde(default = "default_resources")]
    pub resources: Vec<Resource>,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            assistant_name: "Campusly".to_string(),
            tagline: "AI-Powered Campus Assistant".to_string(),
            welcome: DEFAULT_WELCOME.to_string(),
            quick_prompts: default_quick_prompts(),
            resources: default_resources(),
        }
    }
}

/// A contact line in the sidebar.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Resource {
    pub label: String,
    pub contact: String,
}

fn default_quick_prompts() -> Vec<String> {
    [
        "Library hours",
        "Today's campus events",
        "How to register for courses",
        "Report a facility issue",
    ]
    .map(String::from)
    .to_vec()
}

fn default_resources() -> Vec<Resource> {
    [
        ("IT Support", "it-support@vit.ac.in"),
        ("Health Center (24/7)", "220"),
        ("Security (24/7)", "199"),
    ]
    .map(|(label, contact)| Resource {
        label: label.to_string(),
        contact: contact.to_string(),
    })
    .to_vec()
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let widget = WidgetConfig::default();

        // 1. Defaults
        let mut builder = Config::builder()
            .set_default("server.port", 3000)?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.idle_timeout_secs", DEFAULT_IDLE_TIMEOUT.as_secs())?
            .set_default("responder.endpoint", "http://localhost:5000/chat")?
            .set_default("widget.assistant_name", widget.assistant_name)?
            .set_default("widget.tagline", widget.tagline)?
            .set_default("widget.welcome", widget.welcome)?;

        // 2. ./config.{yaml,toml,json} if present, then an explicit file
        builder = builder.add_source(File::with_name("config").required(false));
        if let Some(path) = &cli.config {
            builder = builder.add_source(File::with_name(path));
        }

        // 3. Environment (e.g. CAMPUSLY_SERVER__PORT=8000)
        builder = builder.add_source(
            Environment::with_prefix("CAMPUSLY")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("widget.quick_prompts")
                .try_parsing(true),
        );

        // 4. CLI overrides (clap has already folded in its own env vars)
        if let Some(host) = cli.host {
            builder = builder.set_override("server.host", host)?;
        }
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(endpoint) = cli.endpoint {
            builder = builder.set_override("responder.endpoint", endpoint)?;
        }
        if let Some(secs) = cli.timeout_secs {
            builder = builder.set_override("responder.timeout_secs", secs)?;
        }

        builder.build()?.try_deserialize()
    }
}
