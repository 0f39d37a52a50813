// Copyright 2025 The Taskmesh Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Worker error types.

/// Errors surfaced by the worker core.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// The requested id is absent from the value map, owner map, or
    /// serialized-bytes cache. Never defaulted: a missing id indicates a
    /// scheduling or ordering bug upstream.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// Failure reported by the transport while testing, waiting on, or
    /// cancelling a transfer handle. Not retried here; retry policy belongs
    /// to the transport and scheduler layers.
    #[error("transfer fault: {0}")]
    TransferFault(String),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for worker operations.
pub type WorkerResult<T> = Result<T, WorkerError>;
