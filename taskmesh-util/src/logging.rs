// Copyright 2025 The Taskmesh Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Logging setup for taskmesh workers using the `tracing` ecosystem.

use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize logging for one worker process.
///
/// Sets up tracing-subscriber with:
/// - Environment filter (TASKMESH_LOG_LEVEL or RUST_LOG)
/// - Optional per-worker file output (`worker_<rank>.log`)
///
/// A second call is a no-op, so embedding code (including tests) may
/// construct more than one worker context per process.
pub fn init_worker_logging(rank: i32, log_dir: Option<&Path>, verbosity: i32) {
    let filter = EnvFilter::try_from_env("TASKMESH_LOG_LEVEL")
        .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
        .unwrap_or_else(|_| {
            let level = match verbosity {
                0 => "info",
                1 => "debug",
                _ => "trace",
            };
            EnvFilter::new(level)
        });

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    let installed = if let Some(dir) = log_dir {
        let log_file = dir.join(format!("worker_{rank}.log"));
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
        {
            Ok(file) => subscriber.with_writer(file).try_init().is_ok(),
            Err(err) => {
                eprintln!("failed to open {}: {err}", log_file.display());
                false
            }
        }
    } else {
        subscriber.try_init().is_ok()
    };

    if installed {
        tracing::info!(rank, "taskmesh logging initialized");
    }
}
