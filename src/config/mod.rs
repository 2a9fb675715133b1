use crate::dialogs::{DialogLabels, DEFAULT_CANCEL_LABEL, DEFAULT_CONFIRM_LABEL};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const KNOWN_THEMES: [&str; 2] = ["dark", "light"];

/// Application configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Alert confirm label used when a dialog does not set its own
    pub confirm_label: String,

    /// Alert cancel label used when a dialog does not set its own
    pub cancel_label: String,

    /// Input poll interval in milliseconds
    pub tick_rate_ms: u64,

    /// Enable mouse support
    pub mouse_enabled: bool,

    /// Rows fetched per page by the transaction list
    pub page_size: usize,

    /// Currency code shown next to amounts
    pub currency: String,

    /// Theme name, `dark` or `light`
    pub theme: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            confirm_label: DEFAULT_CONFIRM_LABEL.to_string(),
            cancel_label: DEFAULT_CANCEL_LABEL.to_string(),
            tick_rate_ms: 250,
            mouse_enabled: true,
            page_size: 20,
            currency: "USD".to_string(),
            theme: "dark".to_string(),
        }
    }
}

impl Config {
    /// Build the configuration from defaults, a config file and the environment
    pub async fn init(explicit: Option<&Path>) -> Result<Self> {
        debug!("Initializing configuration");

        let mut config = Self::load_from_file(explicit).await?.unwrap_or_default();
        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Candidate config files, most specific first
    pub fn search_paths() -> Vec<PathBuf> {
        let mut config_paths = vec![
            PathBuf::from("./.ledgerdesk.json"),
            PathBuf::from("./ledgerdesk.json"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            config_paths.push(config_dir.join("ledgerdesk").join("ledgerdesk.json"));
        }
        config_paths
    }

    /// Load the first config file found.
    ///
    /// An explicit path must exist; the search paths are optional.
    pub async fn load_from_file(explicit: Option<&Path>) -> Result<Option<Self>> {
        if let Some(path) = explicit {
            return Self::read_file(path).await.map(Some);
        }

        for path in Self::search_paths() {
            if path.exists() {
                return Self::read_file(&path).await.map(Some);
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    async fn read_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from: {}", path.display());
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Load configuration from environment variables
    pub fn load_from_env(&mut self) {
        self.apply_env(|key| std::env::var(key).ok());
    }

    /// Apply `LEDGERDESK_*` overrides; unparsable numbers are ignored
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(label) = lookup("LEDGERDESK_CONFIRM_LABEL") {
            self.confirm_label = label;
        }
        if let Some(label) = lookup("LEDGERDESK_CANCEL_LABEL") {
            self.cancel_label = label;
        }
        if let Some(tick) = lookup("LEDGERDESK_TICK_RATE_MS").and_then(|v| v.parse().ok()) {
            self.tick_rate_ms = tick;
        }
        if let Some(mouse) = lookup("LEDGERDESK_MOUSE") {
            self.mouse_enabled = matches!(mouse.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        if let Some(size) = lookup("LEDGERDESK_PAGE_SIZE").and_then(|v| v.parse().ok()) {
            self.page_size = size;
        }
        if let Some(currency) = lookup("LEDGERDESK_CURRENCY") {
            self.currency = currency;
        }
        if let Some(theme) = lookup("LEDGERDESK_THEME") {
            self.theme = theme.to_lowercase();
        }
    }

    /// Provider-wide alert labels
    pub fn dialog_labels(&self) -> DialogLabels {
        DialogLabels::new(self.confirm_label.clone(), self.cancel_label.clone())
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.confirm_label.trim().is_empty() {
            return Err(anyhow!("confirm_label must not be empty"));
        }
        if self.cancel_label.trim().is_empty() {
            return Err(anyhow!("cancel_label must not be empty"));
        }
        if self.tick_rate_ms == 0 {
            return Err(anyhow!("tick_rate_ms must be greater than 0"));
        }
        if self.page_size == 0 {
            return Err(anyhow!("page_size must be greater than 0"));
        }
        if !KNOWN_THEMES.contains(&self.theme.as_str()) {
            return Err(anyhow!(
                "Unknown theme '{}', expected one of: {}",
                self.theme,
                KNOWN_THEMES.join(", ")
            ));
        }
        Ok(())
    }
}
