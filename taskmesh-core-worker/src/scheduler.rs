// Copyright 2025 The Taskmesh Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Task scheduler collaborator interface.
//!
//! The object store nudges the scheduler when a pending value resolves,
//! since dependent work may have become runnable. The notifier is injected
//! at store construction so the dependency stays one-way.

/// Re-evaluation triggers exposed by the external task scheduler.
///
/// Both methods are idempotent and safe to call redundantly; the store makes
/// no assumption about what they do beyond that.
pub trait TaskNotifier: Send + Sync {
    /// Re-evaluate queued ordinary tasks.
    fn check_pending_tasks(&self);

    /// Re-evaluate queued actor-bound tasks.
    fn check_pending_actor_tasks(&self);
}

/// Notifier for workers running without a scheduler attached.
pub struct NoopNotifier;

impl TaskNotifier for NoopNotifier {
    fn check_pending_tasks(&self) {}

    fn check_pending_actor_tasks(&self) {}
}
