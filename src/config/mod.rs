mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Environment variable overriding `providers.tmdb.api_key`.
pub const TMDB_API_KEY_ENV: &str = "REELSHELF_TMDB_API_KEY";
/// Environment variable overriding `providers.omdb.api_key`.
pub const OMDB_API_KEY_ENV: &str = "REELSHELF_OMDB_API_KEY";

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = ["./reelshelf.toml", "~/.config/reelshelf/config.toml"];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    let mut config = Config::default();
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    validate_config(&config)?;
    Ok(config)
}

/// Replace provider API keys with values from the environment, when set.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = lookup(TMDB_API_KEY_ENV) {
        tracing::debug!(var = TMDB_API_KEY_ENV, "Using TMDB API key from environment");
        config.providers.tmdb.api_key = Some(key);
    }
    if let Some(key) = lookup(OMDB_API_KEY_ENV) {
        tracing::debug!(var = OMDB_API_KEY_ENV, "Using OMDb API key from environment");
        config.providers.omdb.api_key = Some(key);
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if !(1..=16).contains(&config.scan.lookup_concurrency) {
        anyhow::bail!(
            "scan.lookup_concurrency must be between 1 and 16, got {}",
            config.scan.lookup_concurrency
        );
    }

    if !(1..=60).contains(&config.scan.lookup_timeout_secs) {
        anyhow::bail!(
            "scan.lookup_timeout_secs must be between 1 and 60, got {}",
            config.scan.lookup_timeout_secs
        );
    }

    if config.providers.omdb.daily_limit == 0 {
        anyhow::bail!("providers.omdb.daily_limit cannot be 0");
    }

    for (name, key) in [
        ("tmdb", &config.providers.tmdb.api_key),
        ("omdb", &config.providers.omdb.api_key),
    ] {
        if key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            anyhow::bail!("Provider '{}' has an empty API key", name);
        }
    }

    if config.library.extensions.is_empty() {
        anyhow::bail!("library.extensions cannot be empty");
    }

    for folder in config.library.folder_paths() {
        if !folder.exists() {
            tracing::warn!("Library folder does not exist: {:?}", folder);
        }
    }

    Ok(())
}
