// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wayland + EGL client for cadence.
//!
//! This crate drives a single `xdg_toplevel` window through the lifecycle
//! modelled by [`cadence_core::lifecycle`]:
//!
//! - Binds `wl_compositor` and `xdg_wm_base` from the registry
//! - Negotiates `wl_surface` + `xdg_surface` + `xdg_toplevel` with
//!   configure/ack
//! - Binds an EGL display, `wl_egl_window`, window surface and OpenGL context
//! - Redraws once per `wl_surface.frame` notification
//! - Releases everything in reverse acquisition order on drop
//!
//! Rendering itself is left to a [`FrameHandler`] over [`RenderContext`].

mod client;
mod config;
mod context;
mod error;
mod guard;
mod state;
#[cfg(test)]
mod testing;
mod window;

pub use cadence_core::lifecycle::FrameHandler;
pub use client::Client;
pub use config::ClientConfig;
pub use context::{ContextError, ContextRequest, PixelFormat, RenderContext};
pub use error::ClientError;
pub use guard::TeardownLedger;
