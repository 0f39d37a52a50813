// Copyright 2025 The Taskmesh Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Transport collaborator interface.
//!
//! The worker core never talks to the network itself; it holds completion
//! tokens handed out by the transport when a non-blocking transfer was
//! issued, and tests, waits on, or cancels them through this trait.

use crate::error::WorkerResult;

/// Opaque completion token for one non-blocking transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransferHandle(pub u64);

/// Point-to-point transfer operations consumed by the worker core.
///
/// Sends come in two flavors matching how they were issued: *managed* sends
/// carry a value whose memory belongs to the runtime's value model, *buffer*
/// sends carry a raw byte buffer whose lifetime the caller must extend. A
/// handle must be finalized through the same flavor that created it.
pub trait Transport: Send + Sync {
    /// Non-blocking test that every handle in the batch has completed.
    fn test_all(&self, handles: &[TransferHandle]) -> WorkerResult<bool>;

    /// Block until every handle in the batch has completed.
    fn wait_all(&self, handles: &[TransferHandle]) -> WorkerResult<()>;

    /// Request cancellation of a managed-value send.
    fn cancel_managed(&self, handle: TransferHandle) -> WorkerResult<()>;

    /// Block until a managed-value send is finalized (cancelled or complete).
    fn wait_managed(&self, handle: TransferHandle) -> WorkerResult<()>;

    /// Request cancellation of a raw-buffer send.
    fn cancel_buffer(&self, handle: TransferHandle) -> WorkerResult<()>;

    /// Block until a raw-buffer send is finalized (cancelled or complete).
    fn wait_buffer(&self, handle: TransferHandle) -> WorkerResult<()>;
}
