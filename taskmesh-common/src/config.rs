// Copyright 2025 The Taskmesh Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Worker configuration.
//!
//! A plain struct with defaults, optionally overlaid from a JSON string
//! passed by the launcher and then from environment variables
//! `TASKMESH_<UPPER_SNAKE_CASE_NAME>`.

use std::sync::OnceLock;

use serde::Deserialize;

/// Global worker configuration singleton.
static WORKER_CONFIG: OnceLock<WorkerConfig> = OnceLock::new();

/// Get the global `WorkerConfig`. Panics if not initialized.
pub fn worker_config() -> &'static WorkerConfig {
    WORKER_CONFIG
        .get()
        .expect("WorkerConfig not initialized. Call initialize_config() first.")
}

/// Initialize the global `WorkerConfig` from an optional JSON string.
/// Returns an error if already initialized.
pub fn initialize_config(config_str: Option<&str>) -> Result<(), String> {
    let config = match config_str {
        Some(s) if !s.is_empty() => WorkerConfig::from_json(s)?,
        _ => {
            let mut config = WorkerConfig::default();
            config.apply_env_overrides();
            config
        }
    };
    WORKER_CONFIG
        .set(config)
        .map_err(|_| "WorkerConfig already initialized".to_string())
}

/// Configuration parameters for one worker process.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Whether to install the tracing subscriber at context construction.
    pub logging_enabled: bool,
    /// Directory for per-worker log files; `None` logs to stderr.
    pub log_dir: Option<String>,
    /// Fallback log verbosity when no env filter is set (0=info, 1=debug, 2+=trace).
    pub log_verbosity: i32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            logging_enabled: true,
            log_dir: None,
            log_verbosity: 0,
        }
    }
}

/// JSON overlay with every field optional, so launchers only set what they
/// need.
#[derive(Debug, Deserialize)]
struct PartialConfig {
    logging_enabled: Option<bool>,
    log_dir: Option<String>,
    log_verbosity: Option<i32>,
}

impl WorkerConfig {
    /// Build a config from defaults, a JSON overlay, and env overrides, in
    /// that order (later layers win).
    pub fn from_json(json: &str) -> Result<Self, String> {
        let partial: PartialConfig = serde_json::from_str(json)
            .map_err(|e| format!("invalid worker config JSON: {e}"))?;
        let mut config = Self::default();
        if let Some(v) = partial.logging_enabled {
            config.logging_enabled = v;
        }
        if let Some(v) = partial.log_dir {
            config.log_dir = Some(v);
        }
        if let Some(v) = partial.log_verbosity {
            config.log_verbosity = v;
        }
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply `TASKMESH_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("TASKMESH_LOGGING_ENABLED") {
            if let Ok(parsed) = v.parse() {
                self.logging_enabled = parsed;
            }
        }
        if let Ok(v) = std::env::var("TASKMESH_LOG_DIR") {
            if !v.is_empty() {
                self.log_dir = Some(v);
            }
        }
        if let Ok(v) = std::env::var("TASKMESH_LOG_VERBOSITY") {
            if let Ok(parsed) = v.parse() {
                self.log_verbosity = parsed;
            }
        }
    }
}
