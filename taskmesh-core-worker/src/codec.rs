// Copyright 2025 The Taskmesh Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Wire codec collaborator interface.

use bytes::Bytes;

use crate::error::WorkerResult;
use crate::object_store::DataObject;

/// Deserializes a value from the buffers of a completed multi-part transfer.
pub trait Codec: Send + Sync {
    /// Reassemble a value from its raw buffers and header buffer.
    ///
    /// Pure and side-effect-free given complete buffers; `buffer_count` is
    /// the number of raw buffers the sender split the payload into.
    fn deserialize(
        &self,
        raw_buffers: &[Bytes],
        buffer_count: usize,
        header_buffer: &Bytes,
    ) -> WorkerResult<DataObject>;
}
