// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use tracing::{error, info, warn};
use validator::Validate;

use super::core::AppConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate_app_config(config: &AppConfig) -> Result<()> {
        config.validate()
            .context("Configuration validation failed")?;

        Self::validate_admission_config(config)?;
        Self::validate_observability_config(config)?;

        Ok(())
    }

    fn validate_admission_config(config: &AppConfig) -> Result<()> {
        if !config.admission.demo_mode {
            return Ok(());
        }

        if config.admission.allowed_targets.is_empty() {
            return Err(anyhow::anyhow!(
                "Demo mode requires at least one allowed target"
            ));
        }

        for target in &config.admission.allowed_targets {
            if target.trim().is_empty() {
                return Err(anyhow::anyhow!("Allowed target entries cannot be empty"));
            }
        }

        Ok(())
    }

    fn validate_observability_config(config: &AppConfig) -> Result<()> {
        let level = config.observability.log_level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(anyhow::anyhow!(
                "Unknown log level '{}', expected one of {:?}",
                config.observability.log_level,
                LOG_LEVELS
            ));
        }

        Ok(())
    }

    pub fn generate_validation_report(config: &AppConfig) -> ValidationReport {
        let mut report = ValidationReport::new();

        if let Err(e) = Self::validate_app_config(config) {
            report.add_error("app_config", &format!("{:#}", e));
        }

        if !config.admission.demo_mode {
            report.add_warning(
                "admission.demo_mode",
                "Demo mode is off, any reachable host may be scanned"
            );
        }

        if config.scanner.accept_invalid_certs {
            report.add_info(
                "scanner.accept_invalid_certs",
                "HTTP probes accept self-signed and expired certificates"
            );
        }

        if config.scanner.pacing_delay_ms == 0 {
            report.add_warning(
                "scanner.pacing_delay_ms",
                "Pacing is disabled, probes will hit the target back to back"
            );
        }

        report
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: BTreeMap<String, Vec<String>>,
    pub warnings: BTreeMap<String, Vec<String>>,
    pub info: BTreeMap<String, Vec<String>>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn add_info(&mut self, field: &str, message: &str) {
        self.info
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Emit every entry at its level; call once logging is initialised
    pub fn log(&self) {
        for (field, messages) in &self.errors {
            for message in messages {
                error!(field = field.as_str(), "{}", message);
            }
        }
        for (field, messages) in &self.warnings {
            for message in messages {
                warn!(field = field.as_str(), "{}", message);
            }
        }
        for (field, messages) in &self.info {
            for message in messages {
                info!(field = field.as_str(), "{}", message);
            }
        }
    }
}
