// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The negotiated top-level window.

use std::fmt;

use cadence_core::teardown::Stage;
use wayland_client::protocol::wl_callback::WlCallback;
use wayland_client::protocol::wl_compositor::WlCompositor;
use wayland_client::protocol::wl_surface::WlSurface;
use wayland_client::{Dispatch, QueueHandle};
use wayland_protocols::xdg::shell::client::xdg_surface::XdgSurface;
use wayland_protocols::xdg::shell::client::xdg_toplevel::XdgToplevel;
use wayland_protocols::xdg::shell::client::xdg_wm_base::XdgWmBase;

use crate::config::ClientConfig;
use crate::guard::{Guard, TeardownLedger};

/// Drawable surface with its `xdg_surface` and `xdg_toplevel` roles.
///
/// Fields are in release order: the role objects go before the drawable
/// they wrap, and the pending frame token goes last.
pub(crate) struct Window {
    toplevel: Guard<XdgToplevel>,
    shell_surface: Guard<XdgSurface>,
    drawable: Guard<WlSurface>,
    pending_frame: Guard<Option<WlCallback>>,
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("toplevel", &self.toplevel)
            .field("shell_surface", &self.shell_surface)
            .field("drawable", &self.drawable)
            .field("pending_frame", &self.pending_frame)
            .finish()
    }
}

impl Window {
    /// Creates the drawable and wraps it in the shell roles.
    ///
    /// Nothing is committed yet; the lifecycle issues the initial commit.
    pub(crate) fn create<D>(
        compositor: &WlCompositor,
        shell: &XdgWmBase,
        config: &ClientConfig,
        qh: &QueueHandle<D>,
        ledger: &TeardownLedger,
    ) -> Self
    where
        D: Dispatch<WlSurface, ()> + Dispatch<XdgSurface, ()> + Dispatch<XdgToplevel, ()> + 'static,
    {
        let pending_frame = Guard::dropping(None, Stage::FrameCallback, ledger);
        let drawable = Guard::new(
            compositor.create_surface(qh, ()),
            Stage::Drawable,
            ledger,
            WlSurface::destroy,
        );
        let shell_surface = Guard::new(
            shell.get_xdg_surface(&drawable, qh, ()),
            Stage::ShellSurface,
            ledger,
            XdgSurface::destroy,
        );
        let toplevel = Guard::new(
            shell_surface.get_toplevel(qh, ()),
            Stage::Toplevel,
            ledger,
            XdgToplevel::destroy,
        );
        toplevel.set_title(config.title.clone());
        toplevel.set_app_id(config.app_id.clone());
        tracing::debug!(title = %config.title, app_id = %config.app_id, "window created");

        Self {
            toplevel,
            shell_surface,
            drawable,
            pending_frame,
        }
    }

    pub(crate) fn drawable(&self) -> &WlSurface {
        &self.drawable
    }

    pub(crate) fn ack_configure(&self, serial: u32) {
        self.shell_surface.ack_configure(serial);
    }

    pub(crate) fn commit(&self) {
        self.drawable.commit();
    }

    /// Requests the next one-shot frame notification, replacing any token
    /// still held.
    pub(crate) fn request_frame<D>(&mut self, qh: &QueueHandle<D>)
    where
        D: Dispatch<WlCallback, ()> + 'static,
    {
        *self.pending_frame = Some(self.drawable.frame(qh, ()));
    }

    /// Forgets the pending token once its notification fired.
    pub(crate) fn frame_done(&mut self, callback: &WlCallback) {
        if self.pending_frame.as_ref() == Some(callback) {
            *self.pending_frame = None;
        }
    }
}

#[cfg(test)]
impl Window {
    pub(crate) fn shell_surface(&self) -> &XdgSurface {
        &self.shell_surface
    }

    pub(crate) fn toplevel(&self) -> &XdgToplevel {
        &self.toplevel
    }

    pub(crate) fn pending_frame(&self) -> Option<&WlCallback> {
        self.pending_frame.as_ref()
    }
}
