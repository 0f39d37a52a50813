// Copyright 2025 The Taskmesh Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Local object store for one worker process.
//!
//! Holds object values (final or still arriving), owner ranks, the canonical
//! interned handle per data id, and a cache of serialized bytes. A value
//! whose transfer is still in flight is stored as a [`PendingRequest`]
//! placeholder; readers poll it without blocking, and the first poll that
//! observes completion deserializes the buffers, replaces the placeholder in
//! place, and nudges the scheduler. An entry never reverts from resolved to
//! pending.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use bytes::Bytes;
use parking_lot::Mutex;

use taskmesh_common::id::DataId;
use taskmesh_common::Rank;

use crate::codec::Codec;
use crate::error::{WorkerError, WorkerResult};
use crate::scheduler::TaskNotifier;
use crate::transport::{TransferHandle, Transport};

/// An object value held in the store.
#[derive(Debug, Clone)]
pub struct DataObject {
    pub data: Bytes,
    pub metadata: Bytes,
}

impl DataObject {
    pub fn new(data: Bytes, metadata: Bytes) -> Self {
        Self { data, metadata }
    }

    /// Create a data-only object.
    pub fn from_data(data: Bytes) -> Self {
        Self::new(data, Bytes::new())
    }
}

/// Placeholder for a value whose multi-part transfer has been issued but not
/// yet confirmed complete. Cheap to clone: handles are tokens and buffers
/// are reference-counted.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    /// Completion tokens for every part of the transfer.
    pub requests: Vec<TransferHandle>,
    /// Raw payload buffers, in sender order.
    pub raw_buffers: Vec<Bytes>,
    /// Number of raw buffers the sender split the payload into.
    pub buffer_count: usize,
    /// Serialized header describing the payload.
    pub header_buffer: Bytes,
}

/// A value-map entry: either a final value or an in-flight placeholder.
///
/// `Pending` doubles as the non-blocking retry sentinel returned by
/// [`ObjectStore::get`]; callers that receive it poll again later.
#[derive(Debug, Clone)]
pub enum StoreEntry {
    Resolved(DataObject),
    Pending(PendingRequest),
}

impl StoreEntry {
    pub fn is_pending(&self) -> bool {
        matches!(self, StoreEntry::Pending(_))
    }

    /// The final value, if resolved.
    pub fn resolved(&self) -> Option<&DataObject> {
        match self {
            StoreEntry::Resolved(value) => Some(value),
            StoreEntry::Pending(_) => None,
        }
    }
}

impl From<DataObject> for StoreEntry {
    fn from(value: DataObject) -> Self {
        StoreEntry::Resolved(value)
    }
}

impl From<PendingRequest> for StoreEntry {
    fn from(request: PendingRequest) -> Self {
        StoreEntry::Pending(request)
    }
}

struct StoreInner {
    /// DataId -> value or pending placeholder.
    values: HashMap<DataId, StoreEntry>,
    /// DataId -> rank holding the authoritative copy. Independent lifecycle
    /// from the value map; last write wins.
    owners: HashMap<DataId, Rank>,
    /// DataId -> outstanding [`DataRef`] handle count. One slot per
    /// value-equal id; reaching zero reclaims the id everywhere.
    interned: HashMap<DataId, usize>,
    /// DataId -> serialized bytes, written once per id.
    serialized: HashMap<DataId, Bytes>,
}

/// Canonical handle for an interned data id.
///
/// All holders of value-equal ids share one slot in the store; cloning a
/// `DataRef` increments that slot's count and dropping decrements it. When
/// the last handle goes away the id's value, owner, and serialized-cache
/// entries are reclaimed. Handles outlive the store safely.
pub struct DataRef {
    id: DataId,
    inner: Weak<Mutex<StoreInner>>,
}

impl DataRef {
    pub fn id(&self) -> DataId {
        self.id
    }
}

impl Clone for DataRef {
    fn clone(&self) -> Self {
        if let Some(inner) = self.inner.upgrade() {
            let mut inner = inner.lock();
            if let Some(count) = inner.interned.get_mut(&self.id) {
                *count += 1;
            }
        }
        Self {
            id: self.id,
            inner: self.inner.clone(),
        }
    }
}

impl Drop for DataRef {
    fn drop(&mut self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut inner = inner.lock();
        let Some(count) = inner.interned.get_mut(&self.id) else {
            return;
        };
        *count = count.saturating_sub(1);
        if *count == 0 {
            inner.interned.remove(&self.id);
            inner.values.remove(&self.id);
            inner.owners.remove(&self.id);
            inner.serialized.remove(&self.id);
            tracing::debug!(data_id = %self.id, "reclaimed id with no remaining handles");
        }
    }
}

impl PartialEq for DataRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for DataRef {}

impl std::fmt::Debug for DataRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DataRef({})", self.id)
    }
}

/// The authoritative local view of object values, ownership, and caching
/// for one worker process.
pub struct ObjectStore {
    inner: Arc<Mutex<StoreInner>>,
    transport: Arc<dyn Transport>,
    codec: Arc<dyn Codec>,
    notifier: Arc<dyn TaskNotifier>,
}

impl ObjectStore {
    pub fn new(
        transport: Arc<dyn Transport>,
        codec: Arc<dyn Codec>,
        notifier: Arc<dyn TaskNotifier>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                values: HashMap::new(),
                owners: HashMap::new(),
                interned: HashMap::new(),
                serialized: HashMap::new(),
            })),
            transport,
            codec,
            notifier,
        }
    }

    /// Store a value under `data_id`, overwriting any prior entry. The value
    /// may itself be a pending placeholder.
    pub fn put(&self, data_id: DataId, entry: impl Into<StoreEntry>) {
        self.inner.lock().values.insert(data_id, entry.into());
    }

    /// Record `rank` as the current owner of `data_id`. Last write wins.
    pub fn put_data_owner(&self, data_id: DataId, rank: Rank) {
        self.inner.lock().owners.insert(data_id, rank);
    }

    /// Get the entry stored under `data_id`.
    ///
    /// A resolved value returns immediately. A pending entry is tested
    /// without blocking, or waited on when `force` is set; on completion the
    /// buffers are deserialized, the placeholder is replaced in place, the
    /// scheduler is nudged, and the final value is returned. A pending entry
    /// that is not yet complete (and not forced) is returned as the
    /// [`StoreEntry::Pending`] sentinel, unchanged.
    pub fn get(&self, data_id: DataId, force: bool) -> WorkerResult<StoreEntry> {
        let request = {
            let inner = self.inner.lock();
            match inner.values.get(&data_id) {
                None => return Err(WorkerError::KeyNotFound(data_id.hex())),
                Some(StoreEntry::Resolved(value)) => {
                    return Ok(StoreEntry::Resolved(value.clone()))
                }
                Some(StoreEntry::Pending(request)) => request.clone(),
            }
        };

        // Transport calls happen outside the store lock; a forced wait may
        // block for as long as the transfer takes.
        let ready = if force {
            self.transport.wait_all(&request.requests)?;
            true
        } else {
            self.transport.test_all(&request.requests)?
        };
        if !ready {
            tracing::debug!(data_id = %data_id, "pending transfer not ready");
            return Ok(StoreEntry::Pending(request));
        }

        let value = self.codec.deserialize(
            &request.raw_buffers,
            request.buffer_count,
            &request.header_buffer,
        )?;

        let (value, resolved_now) = {
            let mut inner = self.inner.lock();
            match inner.values.get_mut(&data_id) {
                // Another caller resolved the entry while the lock was
                // released; keep the first value so the entry never changes
                // once resolved.
                Some(StoreEntry::Resolved(existing)) => (existing.clone(), false),
                Some(entry @ StoreEntry::Pending(_)) => {
                    *entry = StoreEntry::Resolved(value.clone());
                    (value, true)
                }
                // The last handle to the id was dropped mid-resolution; hand
                // the value to the caller without resurrecting the entry.
                None => (value, true),
            }
        };

        if resolved_now {
            tracing::debug!(data_id = %data_id, "pending transfer resolved");
            self.notifier.check_pending_tasks();
            self.notifier.check_pending_actor_tasks();
        }
        Ok(StoreEntry::Resolved(value))
    }

    /// Get the owner rank recorded for `data_id`.
    pub fn get_data_owner(&self, data_id: DataId) -> WorkerResult<Rank> {
        self.inner
            .lock()
            .owners
            .get(&data_id)
            .copied()
            .ok_or_else(|| WorkerError::KeyNotFound(data_id.hex()))
    }

    /// Check if a value-map entry exists for `data_id`.
    pub fn contains(&self, data_id: DataId) -> bool {
        self.inner.lock().values.contains_key(&data_id)
    }

    /// Check if an owner is recorded for `data_id`.
    pub fn contains_data_owner(&self, data_id: DataId) -> bool {
        self.inner.lock().owners.contains_key(&data_id)
    }

    /// Get the canonical handle for `data_id`, registering it on first
    /// sight.
    ///
    /// Any code path that intends to hold a long-lived reference to an id
    /// must go through this, so that reclamation triggers when the last
    /// handle drops.
    pub fn get_unique_data_id(&self, data_id: DataId) -> DataRef {
        let mut inner = self.inner.lock();
        *inner.interned.entry(data_id).or_insert(0) += 1;
        DataRef {
            id: data_id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Release hook for a batch of ids.
    ///
    /// Intentionally a no-op: reclamation is driven by [`DataRef`] drops,
    /// and a second eviction authority could invalidate live handles. The
    /// ids in `cleanup_list` are collected once their last handle goes away.
    pub fn clear(&self, cleanup_list: &[DataId]) {
        tracing::debug!(
            count = cleanup_list.len(),
            "clear requested; ids are reclaimed when their last handle drops"
        );
    }

    /// Cache the serialized form of a locally-owned value. The first write
    /// for an id wins; later writes are ignored.
    pub fn cache_serialized_data(&self, data_id: DataId, bytes: Bytes) {
        self.inner.lock().serialized.entry(data_id).or_insert(bytes);
    }

    /// Check if serialized bytes are cached for `data_id`.
    pub fn is_already_serialized(&self, data_id: DataId) -> bool {
        self.inner.lock().serialized.contains_key(&data_id)
    }

    /// Get the cached serialized bytes for `data_id`.
    pub fn get_serialized_data(&self, data_id: DataId) -> WorkerResult<Bytes> {
        self.inner
            .lock()
            .serialized
            .get(&data_id)
            .cloned()
            .ok_or_else(|| WorkerError::KeyNotFound(data_id.hex()))
    }

    /// Number of value-map entries.
    pub fn num_objects(&self) -> usize {
        self.inner.lock().values.len()
    }

    /// Number of interned ids with outstanding handles.
    pub fn num_interned(&self) -> usize {
        self.inner.lock().interned.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;

    use crate::test_support::{random_data_id, FakeCodec, FakeTransport, RecordingNotifier};

    use super::*;

    struct Fixture {
        transport: Arc<FakeTransport>,
        codec: Arc<FakeCodec>,
        notifier: Arc<RecordingNotifier>,
        store: ObjectStore,
    }

    fn make_store() -> Fixture {
        let transport = Arc::new(FakeTransport::new());
        let codec = Arc::new(FakeCodec::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let store = ObjectStore::new(transport.clone(), codec.clone(), notifier.clone());
        Fixture {
            transport,
            codec,
            notifier,
            store,
        }
    }

    fn make_pending(fx: &Fixture, parts: &[&[u8]], header: &[u8]) -> PendingRequest {
        PendingRequest {
            requests: parts.iter().map(|_| fx.transport.issue()).collect(),
            raw_buffers: parts.iter().map(|p| Bytes::copy_from_slice(p)).collect(),
            buffer_count: parts.len(),
            header_buffer: Bytes::copy_from_slice(header),
        }
    }

    #[test]
    fn test_put_and_get_resolved() {
        let fx = make_store();
        let id = random_data_id();
        fx.store.put(id, DataObject::from_data(Bytes::from_static(b"42")));

        let entry = fx.store.get(id, false).unwrap();
        assert_eq!(entry.resolved().unwrap().data.as_ref(), b"42");
        // A resolved value never touches the pending-resolution path.
        assert_eq!(fx.codec.calls(), 0);
        assert_eq!(fx.notifier.tasks(), 0);
        assert_eq!(fx.notifier.actor_tasks(), 0);
    }

    #[test]
    fn test_get_missing_id() {
        let fx = make_store();
        let err = fx.store.get(random_data_id(), false).unwrap_err();
        assert!(matches!(err, WorkerError::KeyNotFound(_)));
    }

    #[test]
    fn test_pending_not_ready_returns_sentinel() {
        let fx = make_store();
        let id = random_data_id();
        let request = make_pending(&fx, &[b"abc"], b"hdr");
        let handles = request.requests.clone();
        fx.store.put(id, request);

        let entry = fx.store.get(id, false).unwrap();
        match entry {
            StoreEntry::Pending(req) => assert_eq!(req.requests, handles),
            StoreEntry::Resolved(_) => panic!("entry should still be pending"),
        }
        // The value map is untouched and the codec was never invoked.
        assert!(fx.store.get(id, false).unwrap().is_pending());
        assert_eq!(fx.codec.calls(), 0);
        assert_eq!(fx.notifier.tasks(), 0);
    }

    #[test]
    fn test_pending_resolves_when_complete() {
        let fx = make_store();
        let id = random_data_id();
        let request = make_pending(&fx, &[b"hello ", b"world"], b"hdr");
        let handles = request.requests.clone();
        fx.store.put(id, request);

        // One part done is not enough.
        fx.transport.complete(handles[0]);
        assert!(fx.store.get(id, false).unwrap().is_pending());

        fx.transport.complete(handles[1]);
        let entry = fx.store.get(id, false).unwrap();
        assert_eq!(entry.resolved().unwrap().data.as_ref(), b"hello world");
        assert_eq!(fx.notifier.tasks(), 1);
        assert_eq!(fx.notifier.actor_tasks(), 1);

        // Subsequent reads return the same value without re-deserializing.
        let again = fx.store.get(id, false).unwrap();
        assert_eq!(again.resolved().unwrap().data.as_ref(), b"hello world");
        assert_eq!(fx.codec.calls(), 1);
        assert_eq!(fx.notifier.tasks(), 1);
    }

    #[test]
    fn test_forced_get_always_resolves() {
        let fx = make_store();
        let id = random_data_id();
        fx.store.put(id, make_pending(&fx, &[b"payload"], b"hdr"));

        // Nothing completed yet; force blocks until the transport reports
        // completion and must never hand back the sentinel.
        let entry = fx.store.get(id, true).unwrap();
        assert_eq!(entry.resolved().unwrap().data.as_ref(), b"payload");
        assert_eq!(fx.notifier.tasks(), 1);
        assert_eq!(fx.notifier.actor_tasks(), 1);
    }

    #[test]
    fn test_owner_map_independent_of_value_map() {
        let fx = make_store();
        let id = random_data_id();

        fx.store.put_data_owner(id, 3);
        assert!(fx.store.contains_data_owner(id));
        assert!(!fx.store.contains(id));
        assert_eq!(fx.store.get_data_owner(id).unwrap(), 3);

        // Last write wins.
        fx.store.put_data_owner(id, 5);
        assert_eq!(fx.store.get_data_owner(id).unwrap(), 5);

        // Value arrives later, owner unaffected.
        fx.store.put(id, DataObject::from_data(Bytes::from_static(b"v")));
        assert!(fx.store.contains(id));
        assert_eq!(fx.store.get_data_owner(id).unwrap(), 5);
    }

    #[test]
    fn test_get_data_owner_missing() {
        let fx = make_store();
        let err = fx.store.get_data_owner(random_data_id()).unwrap_err();
        assert!(matches!(err, WorkerError::KeyNotFound(_)));
    }

    #[test]
    fn test_unique_data_id_interning() {
        let fx = make_store();
        let id = random_data_id();
        let copy = taskmesh_common::id::DataId::from_binary(id.as_bytes());

        let r1 = fx.store.get_unique_data_id(id);
        let r2 = fx.store.get_unique_data_id(copy);
        assert_eq!(r1, r2);
        assert_eq!(r1.id(), r2.id());
        // Value-equal ids share one slot.
        assert_eq!(fx.store.num_interned(), 1);
    }

    #[test]
    fn test_last_handle_drop_reclaims_everything() {
        let fx = make_store();
        let id = random_data_id();

        fx.store.put(id, DataObject::from_data(Bytes::from_static(b"v")));
        fx.store.put_data_owner(id, 2);
        fx.store.cache_serialized_data(id, Bytes::from_static(b"ser"));

        let r1 = fx.store.get_unique_data_id(id);
        let r2 = r1.clone();

        drop(r1);
        assert!(fx.store.contains(id));
        assert!(fx.store.contains_data_owner(id));

        drop(r2);
        assert!(!fx.store.contains(id));
        assert!(!fx.store.contains_data_owner(id));
        assert!(!fx.store.is_already_serialized(id));
        assert_eq!(fx.store.num_interned(), 0);
    }

    #[test]
    fn test_dataref_outlives_store() {
        let fx = make_store();
        let id = random_data_id();
        let handle = fx.store.get_unique_data_id(id);
        drop(fx.store);
        // Dropping the handle after the store is gone must be inert.
        drop(handle);
    }

    #[test]
    fn test_clear_is_a_noop() {
        let fx = make_store();
        let id = random_data_id();
        fx.store.put(id, DataObject::from_data(Bytes::from_static(b"v")));
        let _handle = fx.store.get_unique_data_id(id);

        fx.store.clear(&[id]);
        assert!(fx.store.contains(id));
        assert_eq!(fx.store.num_interned(), 1);
    }

    #[test]
    fn test_serialization_cache_write_once() {
        let fx = make_store();
        let id = random_data_id();
        assert!(!fx.store.is_already_serialized(id));

        fx.store.cache_serialized_data(id, Bytes::from_static(b"first"));
        assert!(fx.store.is_already_serialized(id));
        assert_eq!(fx.store.get_serialized_data(id).unwrap().as_ref(), b"first");

        // Later writes for the same id are ignored.
        fx.store.cache_serialized_data(id, Bytes::from_static(b"second"));
        assert_eq!(fx.store.get_serialized_data(id).unwrap().as_ref(), b"first");
    }

    #[test]
    fn test_get_serialized_data_missing() {
        let fx = make_store();
        let err = fx.store.get_serialized_data(random_data_id()).unwrap_err();
        assert!(matches!(err, WorkerError::KeyNotFound(_)));
    }

    #[test]
    fn test_transfer_fault_leaves_entry_pending() {
        let fx = make_store();
        let id = random_data_id();
        let request = make_pending(&fx, &[b"x"], b"hdr");
        let handles = request.requests.clone();
        fx.store.put(id, request);

        fx.transport.fail_next_test();
        let err = fx.store.get(id, false).unwrap_err();
        assert!(matches!(err, WorkerError::TransferFault(_)));

        // The poll is safe to retry once the fault clears.
        fx.transport.complete(handles[0]);
        let entry = fx.store.get(id, false).unwrap();
        assert_eq!(entry.resolved().unwrap().data.as_ref(), b"x");
    }

    #[test]
    fn test_put_overwrites_prior_entry() {
        let fx = make_store();
        let id = random_data_id();
        fx.store.put(id, DataObject::from_data(Bytes::from_static(b"old")));
        fx.store.put(id, DataObject::from_data(Bytes::from_static(b"new")));
        let entry = fx.store.get(id, false).unwrap();
        assert_eq!(entry.resolved().unwrap().data.as_ref(), b"new");
        assert_eq!(fx.store.num_objects(), 1);
    }
}
