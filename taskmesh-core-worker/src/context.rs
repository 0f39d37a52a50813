// Copyright 2025 The Taskmesh Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Per-process worker context.
//!
//! One `WorkerContext` is constructed at worker startup and passed by
//! reference to every call site that needs the object store or the send
//! tracker (scheduling loop, transport callbacks). There is no process-wide
//! singleton.

use std::sync::Arc;

use taskmesh_common::Rank;

use crate::codec::Codec;
use crate::error::WorkerResult;
use crate::object_store::ObjectStore;
use crate::options::WorkerOptions;
use crate::scheduler::TaskNotifier;
use crate::send_tracker::AsyncSendTracker;
use crate::transport::Transport;

/// Owns the per-process runtime state of one worker.
pub struct WorkerContext {
    options: WorkerOptions,
    object_store: Arc<ObjectStore>,
    send_tracker: Arc<AsyncSendTracker>,
}

impl WorkerContext {
    /// Create the context from startup options and injected collaborators.
    pub fn new(
        options: WorkerOptions,
        transport: Arc<dyn Transport>,
        codec: Arc<dyn Codec>,
        notifier: Arc<dyn TaskNotifier>,
    ) -> Self {
        if options.logging_enabled {
            taskmesh_util::logging::init_worker_logging(
                options.rank,
                options.log_dir.as_deref(),
                options.verbosity,
            );
        }
        let object_store = Arc::new(ObjectStore::new(transport.clone(), codec, notifier));
        let send_tracker = Arc::new(AsyncSendTracker::new(transport));
        Self {
            options,
            object_store,
            send_tracker,
        }
    }

    pub fn rank(&self) -> Rank {
        self.options.rank
    }

    pub fn world_size(&self) -> usize {
        self.options.world_size
    }

    pub fn session_name(&self) -> &str {
        &self.options.session_name
    }

    pub fn object_store(&self) -> &Arc<ObjectStore> {
        &self.object_store
    }

    pub fn send_tracker(&self) -> &Arc<AsyncSendTracker> {
        &self.send_tracker
    }

    /// Finalize every outstanding send. Called once during worker teardown;
    /// blocks until the transport has cancelled or completed each handle.
    pub fn shutdown(&self) -> WorkerResult<()> {
        tracing::info!(rank = self.options.rank, "worker context shutting down");
        self.send_tracker.drain_and_cancel()
    }
}
