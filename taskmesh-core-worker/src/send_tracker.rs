// Copyright 2025 The Taskmesh Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Tracking of outstanding non-blocking sends.
//!
//! A group holds the completion handles of one logical multi-part send
//! (header plus payload buffers) together with the raw buffers whose
//! lifetime must extend until the transfer completes. Groups are released
//! all-or-nothing: buffers are freed only once every handle in the group has
//! completed.

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;

use crate::error::WorkerResult;
use crate::transport::{TransferHandle, Transport};

/// One logical multi-part send: `(handle, buffer)` pairs in issue order.
///
/// A `None` buffer marks a send whose payload memory is managed by the
/// runtime's value model; `Some` carries the raw buffer being kept alive.
#[derive(Debug)]
pub struct SendGroup {
    pairs: Vec<(TransferHandle, Option<Bytes>)>,
}

impl SendGroup {
    pub fn new(pairs: Vec<(TransferHandle, Option<Bytes>)>) -> Self {
        Self { pairs }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    fn handles(&self) -> Vec<TransferHandle> {
        self.pairs.iter().map(|(handle, _)| *handle).collect()
    }
}

/// Tracks outstanding non-blocking sends and releases their buffers on
/// completion.
///
/// One instance per worker process, driven from the scheduling loop; every
/// operation except [`AsyncSendTracker::drain_and_cancel`] is non-blocking.
pub struct AsyncSendTracker {
    transport: Arc<dyn Transport>,
    /// Tracked groups in registration order.
    groups: Mutex<Vec<SendGroup>>,
}

impl AsyncSendTracker {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            groups: Mutex::new(Vec::new()),
        }
    }

    /// Track a send group until every handle in it completes.
    pub fn record(&self, group: SendGroup) {
        debug_assert!(!group.is_empty(), "send group must be non-empty");
        if group.is_empty() {
            return;
        }
        self.groups.lock().push(group);
    }

    /// Test every tracked group without blocking and release the groups
    /// whose handles have all completed. Partially-complete groups are
    /// retained unchanged. Safe to call once per scheduler tick.
    pub fn poll_and_release(&self) -> WorkerResult<()> {
        let mut groups = self.groups.lock();
        let mut index = 0;
        while index < groups.len() {
            let handles = groups[index].handles();
            if self.transport.test_all(&handles)? {
                tracing::debug!(handles = handles.len(), "send group complete, releasing");
                groups.remove(index);
            } else {
                tracing::debug!(handles = handles.len(), "send group still in flight");
                index += 1;
            }
        }
        Ok(())
    }

    /// Cancel and finalize every tracked send. Called once during shutdown;
    /// blocks until each handle is finalized and clears all tracking.
    ///
    /// Groups are processed newest-first: a later-registered send is an
    /// "intermediate" part of some larger exchange, and cancelling it after
    /// its primary would let a peer's receive match the wrong in-flight
    /// send.
    pub fn drain_and_cancel(&self) -> WorkerResult<()> {
        let drained: Vec<SendGroup> = {
            let mut groups = self.groups.lock();
            groups.drain(..).collect()
        };
        for group in drained.into_iter().rev() {
            for (handle, buffer) in group.pairs {
                match buffer {
                    // Managed-value sends are finalized through the
                    // value-oriented transport path, raw buffers through the
                    // buffer-oriented one; a handle must be finalized by the
                    // flavor that issued it.
                    None => {
                        self.transport.cancel_managed(handle)?;
                        self.transport.wait_managed(handle)?;
                    }
                    Some(_) => {
                        self.transport.cancel_buffer(handle)?;
                        self.transport.wait_buffer(handle)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Number of groups still tracked.
    pub fn num_outstanding(&self) -> usize {
        self.groups.lock().len()
    }
}
