// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scoped release guards and the shared teardown ledger.
//!
//! Every protocol object and EGL handle the client acquires is wrapped in a
//! [`Guard`]. Owning structs declare their guards in release order, so Rust's
//! field drop order performs the teardown sequence described in
//! [`cadence_core::teardown`] without any manual bookkeeping.

use std::cell::RefCell;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use cadence_core::teardown::{Stage, TeardownOrder};

/// Shared record of which client resources were released, and in what order.
///
/// Clones share the same record. Keep a clone past the client's lifetime to
/// inspect the completed teardown.
#[derive(Clone, Debug, Default)]
pub struct TeardownLedger(Rc<RefCell<TeardownOrder>>);

impl TeardownLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the current record.
    #[must_use]
    pub fn snapshot(&self) -> TeardownOrder {
        self.0.borrow().clone()
    }

    pub(crate) fn release(&self, stage: Stage) {
        match self.0.borrow_mut().release(stage) {
            Ok(()) => tracing::debug!(?stage, "released"),
            Err(violation) => tracing::error!(%violation, "out-of-order teardown"),
        }
    }
}

/// Owns one resource and releases it on drop, reporting to the ledger.
pub(crate) struct Guard<T> {
    value: T,
    stage: Stage,
    ledger: TeardownLedger,
    release: fn(&T),
}

impl<T> Guard<T> {
    /// Wraps `value`; `release` runs on drop, before `value` itself drops.
    pub(crate) fn new(value: T, stage: Stage, ledger: &TeardownLedger, release: fn(&T)) -> Self {
        Self {
            value,
            stage,
            ledger: ledger.clone(),
            release,
        }
    }

    /// Wraps a value whose own [`Drop`] is its release.
    pub(crate) fn dropping(value: T, stage: Stage, ledger: &TeardownLedger) -> Self {
        Self::new(value, stage, ledger, |_| {})
    }
}

impl<T> Deref for Guard<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for Guard<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T> Drop for Guard<T> {
    fn drop(&mut self) {
        (self.release)(&self.value);
        self.ledger.release(self.stage);
    }
}

impl<T: fmt::Debug> fmt::Debug for Guard<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard")
            .field("stage", &self.stage)
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}
