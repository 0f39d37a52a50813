// Copyright 2025 The Taskmesh Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Deterministic stand-ins for the worker core's external collaborators.
//!
//! The fakes complete transfers only when told to, record the exact order of
//! cancel/wait calls, and count codec and scheduler invocations, so tests
//! can assert the contracts precisely.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;

use taskmesh_common::id::DataId;
use taskmesh_core_worker::codec::Codec;
use taskmesh_core_worker::error::{WorkerError, WorkerResult};
use taskmesh_core_worker::object_store::DataObject;
use taskmesh_core_worker::scheduler::TaskNotifier;
use taskmesh_core_worker::transport::{TransferHandle, Transport};

/// Create a random `DataId` for testing.
pub fn random_data_id() -> DataId {
    DataId::from_random()
}

/// A cancel or finalization call observed by the fake transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeOp {
    CancelManaged(TransferHandle),
    WaitManaged(TransferHandle),
    CancelBuffer(TransferHandle),
    WaitBuffer(TransferHandle),
}

/// Transport double with manually driven completion.
///
/// Handles complete only via [`FakeTransport::complete`] or a blocking wait;
/// `wait_all` marks its handles complete, mimicking a blocking transport
/// call that returns once the transfer finishes.
pub struct FakeTransport {
    next_handle: AtomicU64,
    completed: Mutex<HashSet<TransferHandle>>,
    ops: Mutex<Vec<FakeOp>>,
    fail_next_test: AtomicBool,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            next_handle: AtomicU64::new(1),
            completed: Mutex::new(HashSet::new()),
            ops: Mutex::new(Vec::new()),
            fail_next_test: AtomicBool::new(false),
        }
    }

    /// Hand out a fresh in-flight handle.
    pub fn issue(&self) -> TransferHandle {
        TransferHandle(self.next_handle.fetch_add(1, Ordering::Relaxed))
    }

    /// Mark a handle as completed.
    pub fn complete(&self, handle: TransferHandle) {
        self.completed.lock().insert(handle);
    }

    /// Make the next `test_all` call fail with a transfer fault.
    pub fn fail_next_test(&self) {
        self.fail_next_test.store(true, Ordering::Relaxed);
    }

    /// The cancel/wait calls observed so far, in order.
    pub fn ops(&self) -> Vec<FakeOp> {
        self.ops.lock().clone()
    }
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for FakeTransport {
    fn test_all(&self, handles: &[TransferHandle]) -> WorkerResult<bool> {
        if self.fail_next_test.swap(false, Ordering::Relaxed) {
            return Err(WorkerError::TransferFault(
                "injected test fault".to_string(),
            ));
        }
        let completed = self.completed.lock();
        Ok(handles.iter().all(|h| completed.contains(h)))
    }

    fn wait_all(&self, handles: &[TransferHandle]) -> WorkerResult<()> {
        let mut completed = self.completed.lock();
        for handle in handles {
            completed.insert(*handle);
        }
        Ok(())
    }

    fn cancel_managed(&self, handle: TransferHandle) -> WorkerResult<()> {
        self.ops.lock().push(FakeOp::CancelManaged(handle));
        Ok(())
    }

    fn wait_managed(&self, handle: TransferHandle) -> WorkerResult<()> {
        self.ops.lock().push(FakeOp::WaitManaged(handle));
        self.completed.lock().insert(handle);
        Ok(())
    }

    fn cancel_buffer(&self, handle: TransferHandle) -> WorkerResult<()> {
        self.ops.lock().push(FakeOp::CancelBuffer(handle));
        Ok(())
    }

    fn wait_buffer(&self, handle: TransferHandle) -> WorkerResult<()> {
        self.ops.lock().push(FakeOp::WaitBuffer(handle));
        self.completed.lock().insert(handle);
        Ok(())
    }
}

/// Codec double: concatenates the raw buffers into the value's data and
/// carries the header through as metadata. Counts invocations so tests can
/// assert a value is deserialized exactly once.
pub struct FakeCodec {
    calls: AtomicUsize,
}

impl FakeCodec {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Default for FakeCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for FakeCodec {
    fn deserialize(
        &self,
        raw_buffers: &[Bytes],
        buffer_count: usize,
        header_buffer: &Bytes,
    ) -> WorkerResult<DataObject> {
        if raw_buffers.len() != buffer_count {
            return Err(WorkerError::Codec(format!(
                "expected {} buffers, got {}",
                buffer_count,
                raw_buffers.len()
            )));
        }
        self.calls.fetch_add(1, Ordering::Relaxed);
        let mut data = BytesMut::new();
        for buffer in raw_buffers {
            data.extend_from_slice(buffer);
        }
        Ok(DataObject::new(data.freeze(), header_buffer.clone()))
    }
}

/// Scheduler double counting re-evaluation nudges.
pub struct RecordingNotifier {
    tasks: AtomicUsize,
    actor_tasks: AtomicUsize,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            tasks: AtomicUsize::new(0),
            actor_tasks: AtomicUsize::new(0),
        }
    }

    pub fn tasks(&self) -> usize {
        self.tasks.load(Ordering::Relaxed)
    }

    pub fn actor_tasks(&self) -> usize {
        self.actor_tasks.load(Ordering::Relaxed)
    }
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskNotifier for RecordingNotifier {
    fn check_pending_tasks(&self) {
        self.tasks.fetch_add(1, Ordering::Relaxed);
    }

    fn check_pending_actor_tasks(&self) {
        self.actor_tasks.fetch_add(1, Ordering::Relaxed);
    }
}
