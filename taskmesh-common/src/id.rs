// Copyright 2025 The Taskmesh Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! The `DataId` type identifying one logical object across the cluster.
//!
//! Layout (16 bytes):
//! - 4 bytes: big-endian producer rank (the process that first created the value)
//! - 8 bytes: big-endian per-process sequence number
//! - 4 bytes: random entropy
//!
//! Two ids compare equal iff all 16 bytes match; the owner rank embedded in
//! the id is informational and may differ from the current owner recorded in
//! the object store's owner map.

use std::fmt;

use crate::constants::DATA_ID_SIZE;
use crate::Rank;

const RANK_BYTES: usize = 4;
const SEQ_BYTES: usize = 8;

/// Cluster-unique identifier for one logical object.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct DataId {
    data: [u8; DATA_ID_SIZE],
}

impl DataId {
    /// The fixed byte size of a `DataId`.
    pub const SIZE: usize = DATA_ID_SIZE;

    /// Create a nil id (all 0xFF bytes).
    pub const fn nil() -> Self {
        Self {
            data: [0xFF; DATA_ID_SIZE],
        }
    }

    /// Mint an id on the producing process from its rank and a local
    /// sequence number. The entropy tail keeps ids unique even if a process
    /// restarts and reuses sequence numbers within one job.
    pub fn of(producer: Rank, sequence: u64) -> Self {
        let mut data = [0u8; DATA_ID_SIZE];
        data[..RANK_BYTES].copy_from_slice(&producer.to_be_bytes());
        data[RANK_BYTES..RANK_BYTES + SEQ_BYTES].copy_from_slice(&sequence.to_be_bytes());
        taskmesh_util::random::fill_random(&mut data[RANK_BYTES + SEQ_BYTES..]);
        Self { data }
    }

    /// Create an id from raw bytes. Panics if `bytes.len() != SIZE`.
    pub fn from_binary(bytes: &[u8]) -> Self {
        assert_eq!(
            bytes.len(),
            DATA_ID_SIZE,
            "expected {} bytes for DataId, got {}",
            DATA_ID_SIZE,
            bytes.len()
        );
        let mut data = [0u8; DATA_ID_SIZE];
        data.copy_from_slice(bytes);
        Self { data }
    }

    /// Create an id from a hex string. Returns `nil` on invalid input.
    pub fn from_hex(hex_str: &str) -> Self {
        if hex_str.len() != DATA_ID_SIZE * 2 {
            tracing::error!(
                "incorrect hex string length for DataId: expected {}, got {}",
                DATA_ID_SIZE * 2,
                hex_str.len()
            );
            return Self::nil();
        }
        match hex::decode(hex_str) {
            Ok(bytes) => Self::from_binary(&bytes),
            Err(_) => {
                tracing::error!("invalid hex string for DataId");
                Self::nil()
            }
        }
    }

    /// Create a fully random id.
    pub fn from_random() -> Self {
        let mut data = [0u8; DATA_ID_SIZE];
        taskmesh_util::random::fill_random(&mut data);
        Self { data }
    }

    /// Returns true if this is the nil id (all 0xFF).
    pub fn is_nil(&self) -> bool {
        self.data == [0xFF; DATA_ID_SIZE]
    }

    /// The rank embedded at mint time.
    pub fn owner_rank(&self) -> Rank {
        let mut bytes = [0u8; RANK_BYTES];
        bytes.copy_from_slice(&self.data[..RANK_BYTES]);
        Rank::from_be_bytes(bytes)
    }

    /// Raw byte array reference.
    pub fn data(&self) -> &[u8; DATA_ID_SIZE] {
        &self.data
    }

    /// Raw bytes as `&[u8]`.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Owned copy of the bytes.
    pub fn binary(&self) -> Vec<u8> {
        self.data.to_vec()
    }

    /// Hex-encoded string (lowercase).
    pub fn hex(&self) -> String {
        hex::encode(self.data)
    }
}

impl Default for DataId {
    fn default() -> Self {
        Self::nil()
    }
}

impl fmt::Debug for DataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataId({})", self.hex())
    }
}

impl fmt::Display for DataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hex())
    }
}

impl AsRef<[u8]> for DataId {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
