// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

pub mod core;
pub mod loader;
pub mod validation;

pub use self::core::{AdmissionConfig, AppConfig, ObservabilityConfig, ScannerConfig, ServerConfig};

pub use loader::{load_config, ConfigFormat, ConfigLoader};

pub use validation::{ConfigValidator, ValidationReport};
