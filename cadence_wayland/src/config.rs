// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Client configuration.

use cadence_core::geometry::Geometry;

use crate::context::{ContextRequest, PixelFormat};

/// Settings for [`Client`](crate::Client).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Top-level window title.
    pub title: String,
    /// Application id reported to the compositor (used for icons, rules).
    pub app_id: String,
    /// Size used until the compositor proposes one.
    pub initial_geometry: Geometry,
    /// Required EGL framebuffer configuration.
    pub pixel_format: PixelFormat,
    /// Requested OpenGL context.
    pub context: ContextRequest,
}

impl ClientConfig {
    /// Replaces the window title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Replaces the application id.
    #[must_use]
    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = app_id.into();
        self
    }

    /// Replaces the initial geometry.
    #[must_use]
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.initial_geometry = geometry;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            title: String::from("cadence"),
            app_id: String::from("cadence"),
            initial_geometry: Geometry::DEFAULT,
            pixel_format: PixelFormat::RGBA8,
            context: ContextRequest::GL_4_6_CORE_DEBUG,
        }
    }
}
