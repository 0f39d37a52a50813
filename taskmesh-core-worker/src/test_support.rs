// Copyright 2025 The Taskmesh Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Collaborator doubles for this crate's unit tests.
//!
//! The `taskmesh-test-utils` crate provides the same doubles for `tests/`
//! directories and downstream crates; these local copies exist because a
//! dev-dependency cannot implement this crate's traits for its own unit
//! test build.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;

use taskmesh_common::id::DataId;

use crate::codec::Codec;
use crate::error::{WorkerError, WorkerResult};
use crate::object_store::DataObject;
use crate::scheduler::TaskNotifier;
use crate::transport::{TransferHandle, Transport};

pub(crate) fn random_data_id() -> DataId {
    DataId::from_random()
}

/// A cancel or finalization call observed by the fake transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FakeOp {
    CancelManaged(TransferHandle),
    WaitManaged(TransferHandle),
    CancelBuffer(TransferHandle),
    WaitBuffer(TransferHandle),
}

/// Transport double with manually driven completion.
pub(crate) struct FakeTransport {
    next_handle: AtomicU64,
    completed: Mutex<HashSet<TransferHandle>>,
    ops: Mutex<Vec<FakeOp>>,
    fail_next_test: AtomicBool,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self {
            next_handle: AtomicU64::new(1),
            completed: Mutex::new(HashSet::new()),
            ops: Mutex::new(Vec::new()),
            fail_next_test: AtomicBool::new(false),
        }
    }

    pub(crate) fn issue(&self) -> TransferHandle {
        TransferHandle(self.next_handle.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn complete(&self, handle: TransferHandle) {
        self.completed.lock().insert(handle);
    }

    pub(crate) fn fail_next_test(&self) {
        self.fail_next_test.store(true, Ordering::Relaxed);
    }

    pub(crate) fn ops(&self) -> Vec<FakeOp> {
        self.ops.lock().clone()
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

/// Codec double: concatenates raw buffers into the value's data, header
/// becomes metadata, invocations counted.
pub(crate) struct FakeCodec {
    calls: AtomicUsize,
}

impl FakeCodec {
    pub(crate) fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
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
pub(crate) struct RecordingNotifier {
    tasks: AtomicUsize,
    actor_tasks: AtomicUsize,
}

impl RecordingNotifier {
    pub(crate) fn new() -> Self {
        Self {
            tasks: AtomicUsize::new(0),
            actor_tasks: AtomicUsize::new(0),
        }
    }

    pub(crate) fn tasks(&self) -> usize {
        self.tasks.load(Ordering::Relaxed)
    }

    pub(crate) fn actor_tasks(&self) -> usize {
        self.actor_tasks.load(Ordering::Relaxed)
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
