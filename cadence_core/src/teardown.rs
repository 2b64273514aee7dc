// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Release ordering for client resources.
//!
//! Every protocol object and rendering handle depends on the ones acquired
//! before it. Releasing a resource while a dependent still references it is
//! undefined at the protocol level, so teardown must run in exactly the
//! reverse of acquisition:
//!
//! ```text
//! Context → Surface → NativeWindow → Display
//!         → Toplevel → ShellSurface → Drawable → FrameCallback
//!         → Capabilities → Registry → Connection
//! ```
//!
//! Platform crates wrap each resource in a scoped guard whose declaration
//! order makes Rust's drop order match the list above. Each guard reports its
//! [`Stage`] to a [`TeardownOrder`] as it releases, which flags any guard that
//! was released after a stage that should have outlived it.

use alloc::vec::Vec;
use core::fmt;

/// One release step, ordered from first released to last released.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Rendering context (unbound from the thread first).
    Context,
    /// Presentable drawing surface.
    Surface,
    /// Native window wrapping the drawable for the rendering API.
    NativeWindow,
    /// Rendering display connection (terminated).
    Display,
    /// Top-level window role object.
    Toplevel,
    /// Shell-level surface wrapper.
    ShellSurface,
    /// Raw drawable surface.
    Drawable,
    /// Pending one-shot frame notification, if any.
    FrameCallback,
    /// Bound compositor and shell globals.
    Capabilities,
    /// Global registry.
    Registry,
    /// Transport connection to the compositor.
    Connection,
}

impl Stage {
    /// Every stage in release order.
    pub const ORDER: [Self; 11] = [
        Self::Context,
        Self::Surface,
        Self::NativeWindow,
        Self::Display,
        Self::Toplevel,
        Self::ShellSurface,
        Self::Drawable,
        Self::FrameCallback,
        Self::Capabilities,
        Self::Registry,
        Self::Connection,
    ];
}

/// A release that happened after a stage that must outlive it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutOfOrder {
    /// Stage being released now.
    pub stage: Stage,
    /// Latest stage released before it.
    pub after: Stage,
}

impl fmt::Display for OutOfOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} released after {:?}, which depends on it",
            self.stage, self.after
        )
    }
}

impl core::error::Error for OutOfOrder {}

/// Records releases and checks that they follow [`Stage::ORDER`].
///
/// Stages may be skipped (a resource that was never acquired is never
/// released), but never revisited or reversed.
#[derive(Clone, Debug, Default)]
pub struct TeardownOrder {
    released: Vec<Stage>,
    violations: Vec<OutOfOrder>,
}

impl TeardownOrder {
    /// Creates an empty record.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            released: Vec::new(),
            violations: Vec::new(),
        }
    }

    /// Records that `stage` was released.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfOrder`] if a stage at or beyond `stage` was already
    /// released. The violation is also kept for [`violations`](Self::violations).
    pub fn release(&mut self, stage: Stage) -> Result<(), OutOfOrder> {
        let latest = self.released.last().copied();
        self.released.push(stage);
        match latest {
            Some(after) if after >= stage => {
                let violation = OutOfOrder { stage, after };
                self.violations.push(violation);
                Err(violation)
            }
            _ => Ok(()),
        }
    }

    /// Stages in the order they were released.
    #[must_use]
    pub fn released(&self) -> &[Stage] {
        &self.released
    }

    /// Every ordering violation seen so far.
    #[must_use]
    pub fn violations(&self) -> &[OutOfOrder] {
        &self.violations
    }

    /// Returns `true` when every stage was released exactly once, in order.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.violations.is_empty() && self.released == Stage::ORDER
    }
}
