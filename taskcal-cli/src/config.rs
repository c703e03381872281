use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Everything the two gateways need, built once at startup and passed by
/// reference. The engine itself takes no configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub airtable: AirtableConfig,
    pub google: GoogleConfig,
}

#[derive(Debug, Deserialize)]
pub struct AirtableConfig {
    /// Personal access token; usually supplied via AIRTABLE_API_KEY.
    #[serde(default)]
    pub api_key: String,
    /// Base id (appXXXXXXXXXXXXXX).
    pub base: String,
    /// Table name within the base.
    pub table: String,
}

#[derive(Debug, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    /// OAuth refresh token; usually supplied via GOOGLE_REFRESH_TOKEN.
    #[serde(default)]
    pub refresh_token: String,
    pub calendar_id: String,
}

/// Get the config directory path (~/.config/taskcal)
pub fn config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("taskcal");
    Ok(config_dir)
}

/// Get the config file path (~/.config/taskcal/config.toml)
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load config from ~/.config/taskcal/config.toml, then apply env
/// overrides for the secrets.
pub fn load_config() -> Result<Config> {
    let path = config_path()?;

    if !path.exists() {
        anyhow::bail!(
            "Config file not found at {}\n\n\
            Create it with your Airtable and Google credentials:\n\n\
            [airtable]\n\
            base = \"appXXXXXXXXXXXXXX\"\n\
            table = \"Tasks\"\n\n\
            [google]\n\
            client_id = \"your-client-id.apps.googleusercontent.com\"\n\
            client_secret = \"your-client-secret\"\n\
            calendar_id = \"your-calendar-id\"\n\n\
            Secrets go in the environment: AIRTABLE_API_KEY and\n\
            GOOGLE_REFRESH_TOKEN (or in the file, if you must).",
            path.display()
        );
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;

    let mut config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

    if let Ok(key) = std::env::var("AIRTABLE_API_KEY") {
        config.airtable.api_key = key;
    }
    if let Ok(token) = std::env::var("GOOGLE_REFRESH_TOKEN") {
        config.google.refresh_token = token;
    }

    if config.airtable.api_key.is_empty() {
        anyhow::bail!("No Airtable API key: set AIRTABLE_API_KEY or airtable.api_key in config.toml");
    }
    if config.google.refresh_token.is_empty() {
        anyhow::bail!(
            "No Google refresh token: set GOOGLE_REFRESH_TOKEN or google.refresh_token in config.toml"
        );
    }

    Ok(config)
}
