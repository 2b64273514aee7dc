// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Protocol events consumed by the [`Lifecycle`](crate::lifecycle::Lifecycle).
//!
//! Platform crates translate each compositor message they receive into one
//! [`ShellEvent`] and push it through
//! [`Lifecycle::handle`](crate::lifecycle::Lifecycle::handle), in the order
//! the messages were queued. No reordering or coalescing happens here.

use core::fmt;

/// Compositor-supplied frame time in milliseconds.
///
/// The base is undefined, but values increase monotonically for a given
/// surface. Wraps after roughly 49 days.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(pub u32);

impl Timestamp {
    /// Timestamp passed to the eager bootstrap frame.
    pub const BOOTSTRAP: Self = Self(0);

    /// Animation phase in seconds.
    #[must_use]
    pub fn as_secs_f32(self) -> f32 {
        self.0 as f32 / 1000.0
    }

    /// Milliseconds elapsed since `earlier`, or [`None`] if time did not
    /// advance.
    #[must_use]
    pub fn since(self, earlier: Self) -> Option<u32> {
        self.0.checked_sub(earlier.0).filter(|delta| *delta > 0)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// One compositor message relevant to the surface lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShellEvent {
    /// Shell liveness check; must be answered with the same serial.
    Ping {
        /// Token to echo back.
        serial: u32,
    },
    /// Shell-surface configure; must be acknowledged with the same serial.
    SurfaceConfigure {
        /// Token to acknowledge.
        serial: u32,
    },
    /// Proposed top-level size. Zero means "no preference".
    ToplevelConfigure {
        /// Proposed width.
        width: i32,
        /// Proposed height.
        height: i32,
    },
    /// The user or compositor asked the window to close.
    ToplevelClose,
    /// The one-shot frame notification fired.
    FrameDone {
        /// Compositor frame time.
        time: Timestamp,
    },
}
