// Copyright 2025 The Taskmesh Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Worker startup options.

use std::path::PathBuf;

use taskmesh_common::config::worker_config;
use taskmesh_common::Rank;

/// Options for constructing a [`crate::context::WorkerContext`].
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    /// This process's rank within the job.
    pub rank: Rank,
    /// Number of cooperating processes in the job.
    pub world_size: usize,
    pub session_name: String,
    /// Install the tracing subscriber at context construction.
    pub logging_enabled: bool,
    /// Directory for the per-worker log file; `None` logs to stderr.
    pub log_dir: Option<PathBuf>,
    /// Fallback log verbosity (0=info, 1=debug, 2+=trace).
    pub verbosity: i32,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            rank: 0,
            world_size: 1,
            session_name: String::new(),
            logging_enabled: false,
            log_dir: None,
            verbosity: 0,
        }
    }
}

impl WorkerOptions {
    /// Build options for `rank` from the global [`worker_config`].
    ///
    /// Requires `taskmesh_common::config::initialize_config` to have run.
    pub fn from_config(rank: Rank, world_size: usize) -> Self {
        let config = worker_config();
        Self {
            rank,
            world_size,
            session_name: String::new(),
            logging_enabled: config.logging_enabled,
            log_dir: config.log_dir.as_ref().map(PathBuf::from),
            verbosity: config.log_verbosity,
        }
    }
}
