// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Owned-queue client driver.
//!
//! [`Client`] owns the connection, one event queue and all dispatch state.
//! A session walks through four steps, each requiring the previous one:
//!
//! ```text
//! Client::connect       registry roundtrip, bind wl_compositor + xdg_wm_base
//!   -> negotiate        wl_surface + xdg_surface + xdg_toplevel, wait for configure
//!   -> bind_context     EGL display, wl_egl_window, window surface, GL context
//!   -> run              bootstrap frame, then frame-callback paced redraws
//! drop                  reverse-order release of everything acquired
//! ```
//!
//! All objects are created with this client's queue handle; events for
//! objects created on another queue are never delivered here.

use std::ffi::c_void;
use std::fmt;

use cadence_core::capability::{Capability, MissingCapability};
use cadence_core::lifecycle::{FrameHandler, Lifecycle};
use cadence_core::teardown::Stage;
use wayland_client::{Connection, DispatchError, EventQueue};

use crate::config::ClientConfig;
use crate::context::RenderContext;
use crate::error::ClientError;
use crate::guard::{Guard, TeardownLedger};
use crate::state::ClientState;

/// Sends queued destructor requests before the socket closes.
fn flush_connection(connection: &Connection) {
    if let Err(error) = connection.flush() {
        tracing::warn!(%error, "final flush failed");
    }
}

/// A single-window Wayland client rendering through EGL.
///
/// Dropping the client releases every acquired resource in reverse
/// acquisition order; [`Self::teardown_ledger`] records the sequence.
pub struct Client<H>
where
    H: FrameHandler<RenderContext> + 'static,
{
    state: ClientState<H>,
    event_queue: EventQueue<ClientState<H>>,
    connection: Guard<Connection>,
}

impl<H> fmt::Debug for Client<H>
where
    H: FrameHandler<RenderContext> + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("state", &self.state)
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}

impl<H> Client<H>
where
    H: FrameHandler<RenderContext> + 'static,
{
    /// Connects to the compositor named by the environment and binds the
    /// required globals.
    ///
    /// # Errors
    ///
    /// Fails if no compositor is reachable, the connection breaks during the
    /// registry roundtrips, or `wl_compositor` or `xdg_wm_base` is not
    /// advertised.
    pub fn connect(config: ClientConfig, handler: H) -> Result<Self, ClientError> {
        let mut client = Self::attach(Connection::connect_to_env()?, config, handler);
        tracing::debug!("connected");
        // Globals arrive on the first roundtrip.
        client.roundtrip()?;
        client.state.binder.require()?;
        // Events raised by the binds themselves.
        client.roundtrip()?;
        Ok(client)
    }

    /// Takes ownership of `connection` and requests the registry.
    ///
    /// Only queues requests; nothing is read from the socket.
    fn attach(connection: Connection, config: ClientConfig, handler: H) -> Self {
        let ledger = TeardownLedger::new();
        let connection = Guard::new(connection, Stage::Connection, &ledger, flush_connection);
        let event_queue = connection.new_event_queue();
        let qh = event_queue.handle();
        let registry = Guard::dropping(
            connection.display().get_registry(&qh, ()),
            Stage::Registry,
            &ledger,
        );
        Self {
            state: ClientState::new(config, handler, registry, qh, ledger),
            event_queue,
            connection,
        }
    }

    /// Creates the window and blocks until the compositor configures it.
    ///
    /// # Errors
    ///
    /// Fails if called twice or if dispatch fails while waiting.
    pub fn negotiate(&mut self) -> Result<(), ClientError> {
        if self.state.window.is_some() {
            return Err(ClientError::NotReady("negotiate"));
        }
        if !self.state.create_window() {
            let missing = if self.state.capabilities.compositor.is_none() {
                Capability::Compositor
            } else {
                Capability::Shell
            };
            return Err(MissingCapability(missing).into());
        }
        self.state.initial_commit();
        while !self.state.lifecycle.is_configured() {
            self.blocking_dispatch()?;
        }
        tracing::debug!(geometry = ?self.state.lifecycle.geometry(), "negotiated");
        Ok(())
    }

    /// Binds the rendering context to the configured window.
    ///
    /// # Errors
    ///
    /// Fails if the window is not configured yet, a context is already
    /// bound, or any EGL step fails.
    pub fn bind_context(&mut self) -> Result<(), ClientError> {
        if !self.state.lifecycle.is_configured() || self.state.render.is_some() {
            return Err(ClientError::NotReady("bind_context"));
        }
        let Some(window) = &self.state.window else {
            return Err(ClientError::NotReady("bind_context"));
        };
        let display: *mut c_void = self.connection.backend().display_ptr().cast();
        let context = RenderContext::bind(
            display,
            window.drawable(),
            self.state.lifecycle.geometry(),
            &self.state.config.pixel_format,
            &self.state.config.context,
            &self.state.ledger,
        )?;
        self.state.render = Some(context);
        Ok(())
    }

    /// Renders the bootstrap frame, then redraws on every frame notification
    /// until the compositor asks the window to close.
    ///
    /// # Errors
    ///
    /// Fails if no context is bound or the connection breaks.
    pub fn run(&mut self) -> Result<(), ClientError> {
        if self.state.render.is_none() {
            return Err(ClientError::NotReady("run"));
        }
        self.state.bootstrap();
        self.roundtrip()?;
        while self.state.lifecycle.is_running() {
            self.blocking_dispatch()?;
        }
        let lifecycle = &self.state.lifecycle;
        tracing::info!(
            frames = lifecycle.frames_rendered(),
            mean_interval_ms = lifecycle.pacing().mean_interval_ms(),
            non_monotonic = lifecycle.pacing().non_monotonic(),
            "frame loop finished"
        );
        Ok(())
    }

    /// Runs one iteration of the client loop: sends queued requests, waits
    /// for at least one event and dispatches the batch.
    ///
    /// A close request handled in the batch only clears the running flag;
    /// callers observe it once this returns.
    pub fn blocking_dispatch(&mut self) -> Result<usize, DispatchError> {
        self.event_queue.blocking_dispatch(&mut self.state)
    }

    /// Blocks until the compositor has processed every request sent so far,
    /// dispatching the events it produced.
    pub fn roundtrip(&mut self) -> Result<usize, DispatchError> {
        self.event_queue.roundtrip(&mut self.state)
    }

    /// Sends queued requests without waiting for events.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Flush`] if the socket rejected the write.
    pub fn flush(&self) -> Result<(), ClientError> {
        self.event_queue.flush()?;
        Ok(())
    }

    /// Returns the surface lifecycle.
    #[must_use]
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.state.lifecycle
    }

    /// Returns the frame handler.
    #[must_use]
    pub fn handler(&self) -> &H {
        &self.state.handler
    }

    /// Returns a handle to the teardown record.
    ///
    /// The record fills in as the client drops.
    #[must_use]
    pub fn teardown_ledger(&self) -> TeardownLedger {
        self.state.ledger.clone()
    }
}

impl<H> Drop for Client<H>
where
    H: FrameHandler<RenderContext> + 'static,
{
    fn drop(&mut self) {
        tracing::debug!("tearing down");
        self.state.lifecycle.begin_teardown();
    }
}
