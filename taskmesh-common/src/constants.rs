// Copyright 2025 The Taskmesh Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Shared constants.

/// Byte size of a [`crate::id::DataId`].
pub const DATA_ID_SIZE: usize = 16;
