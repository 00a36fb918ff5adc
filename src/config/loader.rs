// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::core::AppConfig;
use super::validation::ConfigValidator;

pub struct ConfigLoader {
    config_path: PathBuf,
    format: ConfigFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigLoader {
    pub fn new<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let path = config_path.as_ref().to_path_buf();
        let format = Self::detect_format(&path)?;

        Ok(Self {
            config_path: path,
            format,
        })
    }

    pub fn with_format<P: AsRef<Path>>(config_path: P, format: ConfigFormat) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            format,
        }
    }

    pub fn detect_format(path: &Path) -> Result<ConfigFormat> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| anyhow::anyhow!("Could not determine config file format"))?;

        match extension {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "toml" => Ok(ConfigFormat::Toml),
            "json" => Ok(ConfigFormat::Json),
            _ => Err(anyhow::anyhow!("Unsupported config file format: {}", extension)),
        }
    }

    /// Parse the file without applying environment overrides
    pub fn parse(&self) -> Result<AppConfig> {
        let content = std::fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read config file: {:?}", self.config_path))?;

        let config: AppConfig = match self.format {
            ConfigFormat::Yaml => serde_yaml::from_str(&content)
                .context("Failed to parse YAML config")?,
            ConfigFormat::Toml => toml::from_str(&content)
                .context("Failed to parse TOML config")?,
            ConfigFormat::Json => serde_json::from_str(&content)
                .context("Failed to parse JSON config")?,
        };

        Ok(config)
    }

    /// File, then process environment, then validation
    pub fn load_config(&self) -> Result<AppConfig> {
        let mut config = self.parse()?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        ConfigValidator::validate_app_config(&config)?;
        Ok(config)
    }
}

/// Defaults, optionally overlaid by a config file, then environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => ConfigLoader::new(path)?.load_config(),
        None => {
            let config = AppConfig::from_env()?;
            ConfigValidator::validate_app_config(&config)?;
            Ok(config)
        }
    }
}

impl AppConfig {
    /// Defaults plus process environment overrides
    pub fn from_env() -> Result<Self> {
        let mut config = AppConfig::default();
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SERVER_HOST") {
            self.server.host = host;
        }

        if let Some(port) = lookup("SERVER_PORT") {
            self.server.port = port.parse()
                .context("Invalid SERVER_PORT")?;
        }

        if let Some(timeout) = lookup("REQUEST_TIMEOUT_SECS") {
            self.scanner.request_timeout_secs = timeout.parse()
                .context("Invalid REQUEST_TIMEOUT_SECS")?;
        }

        if let Some(timeout) = lookup("TLS_TIMEOUT_SECS") {
            self.scanner.tls_timeout_secs = timeout.parse()
                .context("Invalid TLS_TIMEOUT_SECS")?;
        }

        if let Some(delay) = lookup("PACING_DELAY_MS") {
            self.scanner.pacing_delay_ms = delay.parse()
                .context("Invalid PACING_DELAY_MS")?;
        }

        if let Some(flag) = lookup("ACCEPT_INVALID_CERTS") {
            self.scanner.accept_invalid_certs = parse_flag(&flag)
                .context("Invalid ACCEPT_INVALID_CERTS")?;
        }

        if let Some(flag) = lookup("DEMO_MODE") {
            self.admission.demo_mode = parse_flag(&flag)
                .context("Invalid DEMO_MODE")?;
        }

        if let Some(targets) = lookup("ALLOWED_TARGETS") {
            self.admission.allowed_targets = targets
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
        }

        if let Some(log_level) = lookup("LOG_LEVEL") {
            self.observability.log_level = log_level;
        }

        Ok(())
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow::anyhow!("expected a boolean, got '{}'", other)),
    }
}
