// Copyright 2025 The Taskmesh Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Common types for taskmesh: data identifiers, constants, configuration.

pub mod config;
pub mod constants;
pub mod id;

/// A cluster member index, following the MPI rank convention.
pub type Rank = i32;
