// Copyright 2025 The Taskmesh Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Per-process runtime state for a taskmesh worker.
//!
//! Two components: the [`object_store::ObjectStore`], holding local object
//! values, ownership metadata, and in-flight receives, and the
//! [`send_tracker::AsyncSendTracker`], keeping send buffers alive until
//! their non-blocking transfers complete. The transport, codec, and task
//! scheduler are external collaborators reached through the traits in
//! [`transport`], [`codec`], and [`scheduler`].

pub mod codec;
pub mod context;
pub mod error;
pub mod object_store;
pub mod options;
pub mod scheduler;
pub mod send_tracker;
pub mod transport;

#[cfg(test)]
mod test_support;

// Re-export primary types.
pub use context::WorkerContext;
pub use error::{WorkerError, WorkerResult};
pub use object_store::{DataObject, DataRef, ObjectStore, PendingRequest, StoreEntry};
pub use options::WorkerOptions;
pub use send_tracker::{AsyncSendTracker, SendGroup};
pub use transport::TransferHandle;
