//! Server configuration: TOML file, then environment overrides, then
//! validation. Nothing here is process-global; the loaded [`AppConfig`] is
//! handed to [`crate::app::run`].

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::a1::A1Range;
use crate::record::{self, Field};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub google: GoogleSettings,
    pub dashboard: DashboardSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Directory served under `/static`.
    pub static_dir: PathBuf,
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 3000,
            static_dir: PathBuf::from("static"),
        }
    }
}

/// Service-account credentials and endpoints for the Sheets API.
///
/// Missing credentials are not a startup error: every proxied request
/// fails instead.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    pub client_email: Option<String>,
    pub private_key: Option<String>,
    pub token_uri: String,
    pub api_base: String,
}

impl Default for GoogleSettings {
    fn default() -> Self {
        GoogleSettings {
            client_email: None,
            private_key: None,
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
            api_base: "https://sheets.googleapis.com/v4".to_string(),
        }
    }
}

impl fmt::Debug for GoogleSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleSettings")
            .field("client_email", &self.client_email)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("token_uri", &self.token_uri)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Which spreadsheet and tab the dashboard page works on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    pub sheet_id: String,
    pub sheet_name: String,
    /// Overrides the default `<sheet_name>!A2:K` read range.
    pub range: Option<String>,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        DashboardSettings {
            sheet_id: String::new(),
            sheet_name: "Sheet1".to_string(),
            range: None,
        }
    }
}

impl DashboardSettings {
    pub fn read_range(&self) -> String {
        self.range
            .clone()
            .unwrap_or_else(|| record::default_read_range(&self.sheet_name))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            level: "info".to_string(),
        }
    }
}

const VALID_LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

impl AppConfig {
    /// Load `.env`, the optional config file and environment overrides, then
    /// validate the result.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        if let Ok(env_file) = dotenvy::dotenv() {
            log::debug!("Loaded environment from {}", env_file.display());
        }

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply overrides from an environment-like lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(email) = lookup("GOOGLE_CLIENT_EMAIL") {
            self.google.client_email = Some(email);
        }
        if let Some(key) = lookup("GOOGLE_PRIVATE_KEY") {
            self.google.private_key = Some(key);
        }
        if let Some(sheet_id) = lookup("DASHBOARD_SHEET_ID") {
            self.dashboard.sheet_id = sheet_id;
        }
        if let Some(sheet_name) = lookup("DASHBOARD_SHEET_NAME") {
            self.dashboard.sheet_name = sheet_name;
        }
        if let Some(host) = lookup("DASHBOARD_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("DASHBOARD_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("DASHBOARD_PORT '{}' is not a valid port", port))?;
        }
        if let Some(level) = lookup("DASHBOARD_LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }
        Ok(())
    }

    /// Validate configuration settings
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                VALID_LOG_LEVELS.join(", ")
            ));
        }

        if self.dashboard.sheet_name.trim().is_empty() {
            return Err(anyhow::anyhow!("dashboard.sheet_name cannot be empty"));
        }

        if let Some(range) = &self.dashboard.range {
            let parsed = A1Range::parse(range)
                .ok_or_else(|| anyhow::anyhow!("dashboard.range '{}' is not A1 notation", range))?;
            // saves are addressed at sheet_name, so reads must come from the same tab
            if parsed.sheet.as_deref() != Some(self.dashboard.sheet_name.as_str()) {
                return Err(anyhow::anyhow!(
                    "dashboard.range '{}' must read from tab '{}'",
                    range,
                    self.dashboard.sheet_name
                ));
            }
            // positional mapping starts at column A
            if parsed.start.col != Field::Id.column_index() as u32 + 1 {
                return Err(anyhow::anyhow!(
                    "dashboard.range '{}' must start at column A",
                    range
                ));
            }
        }

        if self.dashboard.sheet_id.is_empty() {
            log::warn!("dashboard.sheet_id is not set; the dashboard page will fail to load");
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
