// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Observed frame-interval statistics.
//!
//! Frame-done timestamps come from the compositor, which ties them to its own
//! repaint cycle. The spacing between consecutive timestamps is therefore a
//! direct reading of the refresh interval the client is actually paced at.

use crate::event::Timestamp;
use crate::queue::BoundedQueue;

/// Rolling record of frame-done timestamps.
#[derive(Debug, Clone)]
pub struct FramePacing {
    last: Option<Timestamp>,
    intervals: BoundedQueue<u32>,
    frames: u64,
    non_monotonic: u64,
}

impl FramePacing {
    /// Number of intervals kept by [`Default`].
    pub const DEFAULT_HISTORY: usize = 64;

    /// Creates an empty record keeping at most `history` intervals.
    ///
    /// `history == 0` is promoted to `1`.
    #[must_use]
    pub fn with_history(history: usize) -> Self {
        Self {
            last: None,
            intervals: BoundedQueue::with_capacity(history),
            frames: 0,
            non_monotonic: 0,
        }
    }

    /// Records one frame-done timestamp and returns the interval since the
    /// previous one.
    ///
    /// A timestamp that does not move forward is counted in
    /// [`non_monotonic`](Self::non_monotonic) and contributes no interval.
    pub fn record(&mut self, time: Timestamp) -> Option<u32> {
        self.frames += 1;
        let previous = self.last.replace(time)?;
        match time.since(previous) {
            Some(interval) => {
                self.intervals.push(interval);
                Some(interval)
            }
            None => {
                self.non_monotonic += 1;
                tracing::warn!(?previous, ?time, "frame timestamp did not advance");
                None
            }
        }
    }

    /// Number of timestamps recorded.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Number of timestamps that failed to advance.
    #[must_use]
    pub fn non_monotonic(&self) -> u64 {
        self.non_monotonic
    }

    /// Most recent timestamp recorded.
    #[must_use]
    pub fn last(&self) -> Option<Timestamp> {
        self.last
    }

    /// Mean of the retained intervals in milliseconds.
    #[must_use]
    pub fn mean_interval_ms(&self) -> Option<f32> {
        let count = self.intervals.len();
        if count == 0 {
            return None;
        }
        let total: u64 = self.intervals.iter().map(|ms| u64::from(*ms)).sum();
        Some(total as f32 / count as f32)
    }
}

impl Default for FramePacing {
    fn default() -> Self {
        Self::with_history(Self::DEFAULT_HISTORY)
    }
}

#[cfg(test)]
mod tests {
    use super::FramePacing;
    use crate::event::Timestamp;

    #[test]
    fn first_timestamp_has_no_interval() {
        let mut pacing = FramePacing::default();
        assert_eq!(pacing.record(Timestamp(1000)), None);
        assert_eq!(pacing.mean_interval_ms(), None);
        assert_eq!(pacing.frames(), 1);
    }

    #[test]
    fn mean_tracks_recent_intervals() {
        let mut pacing = FramePacing::default();
        for ms in [1000, 1016, 1033, 1050] {
            let _ = pacing.record(Timestamp(ms));
        }
        let mean = pacing.mean_interval_ms().unwrap();
        assert!((mean - 50.0 / 3.0).abs() < 1e-3, "mean was {mean}");
    }

    #[test]
    fn history_drops_oldest_interval() {
        let mut pacing = FramePacing::with_history(1);
        let _ = pacing.record(Timestamp(0));
        let _ = pacing.record(Timestamp(100));
        let _ = pacing.record(Timestamp(116));
        assert_eq!(pacing.mean_interval_ms(), Some(16.0));
    }

    #[test]
    fn stalled_timestamp_is_counted_not_averaged() {
        let mut pacing = FramePacing::default();
        let _ = pacing.record(Timestamp(1000));
        assert_eq!(pacing.record(Timestamp(1000)), None);
        assert_eq!(pacing.record(Timestamp(1016)), Some(16));
        assert_eq!(pacing.non_monotonic(), 1);
        assert_eq!(pacing.mean_interval_ms(), Some(16.0));
        assert_eq!(pacing.last(), Some(Timestamp(1016)));
    }
}
