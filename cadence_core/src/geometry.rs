// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Surface geometry and the resize policy.

use core::fmt;

/// Authoritative size of the rendering surface, in surface-local pixels.
///
/// Both dimensions are always non-zero.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Geometry {
    width: u32,
    height: u32,
}

impl Geometry {
    /// Size used until the compositor proposes another one.
    pub const DEFAULT: Self = Self {
        width: 512,
        height: 512,
    };

    /// Creates a geometry, returning [`None`] if either dimension is zero.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            None
        } else {
            Some(Self { width, height })
        }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(self) -> u32 {
        self.height
    }

    /// Width as the signed integer native windowing and GL calls expect.
    ///
    /// Saturates at `i32::MAX`.
    #[must_use]
    pub fn width_i32(self) -> i32 {
        i32::try_from(self.width).unwrap_or(i32::MAX)
    }

    /// Height as the signed integer native windowing and GL calls expect.
    ///
    /// Saturates at `i32::MAX`.
    #[must_use]
    pub fn height_i32(self) -> i32 {
        i32::try_from(self.height).unwrap_or(i32::MAX)
    }

    /// Applies the resize policy to a compositor-proposed size.
    ///
    /// Returns the new geometry only when the proposal is a genuine change:
    ///
    /// - a zero (or negative) dimension means "no preference" and is ignored
    /// - a proposal equal to `self` is an idempotent no-op
    #[must_use]
    pub fn propose(self, width: i32, height: i32) -> Option<Self> {
        let width = u32::try_from(width).ok()?;
        let height = u32::try_from(height).ok()?;
        Self::new(width, height).filter(|proposed| *proposed != self)
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Debug for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::Geometry;

    #[test]
    fn default_is_512_square() {
        let geometry = Geometry::default();
        assert_eq!(geometry.width(), 512);
        assert_eq!(geometry.height(), 512);
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert_eq!(Geometry::new(0, 10), None);
        assert_eq!(Geometry::new(10, 0), None);
        assert_eq!(Geometry::new(0, 0), None);
    }

    #[test]
    fn propose_ignores_zero_and_negative_dimensions() {
        let current = Geometry::DEFAULT;
        assert_eq!(current.propose(0, 300), None);
        assert_eq!(current.propose(300, 0), None);
        assert_eq!(current.propose(-1, 300), None);
        assert_eq!(current.propose(300, -20), None);
    }

    #[test]
    fn propose_ignores_unchanged_size() {
        assert_eq!(Geometry::DEFAULT.propose(512, 512), None);
    }

    #[test]
    fn propose_accepts_genuine_change() {
        let next = Geometry::DEFAULT.propose(300, 200);
        assert_eq!(next, Geometry::new(300, 200));
    }

    #[test]
    fn signed_accessors_saturate() {
        let huge = Geometry::new(u32::MAX, 1).unwrap();
        assert_eq!(huge.width_i32(), i32::MAX);
        assert_eq!(huge.height_i32(), 1);
    }
}
