// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatch state shared by every proxy on the client's queue.
//!
//! Protocol events are translated into [`ShellEvent`]s and handed to the
//! [`Lifecycle`]; the lifecycle answers through [`WaylandPeer`], which turns
//! its decisions back into requests.

use std::fmt;

use cadence_core::capability::{Capability, CapabilityBinder};
use cadence_core::event::{ShellEvent, Timestamp};
use cadence_core::geometry::Geometry;
use cadence_core::lifecycle::{FrameHandler, Lifecycle, SurfacePeer};
use cadence_core::teardown::Stage;
use wayland_client::protocol::wl_callback::{self, WlCallback};
use wayland_client::protocol::wl_compositor::{self, WlCompositor};
use wayland_client::protocol::wl_registry::{self, WlRegistry};
use wayland_client::protocol::wl_surface::{self, WlSurface};
use wayland_client::{Connection, Dispatch, QueueHandle};
use wayland_egl::WlEglSurface;
use wayland_protocols::xdg::shell::client::xdg_surface::{self, XdgSurface};
use wayland_protocols::xdg::shell::client::xdg_toplevel::{self, XdgToplevel};
use wayland_protocols::xdg::shell::client::xdg_wm_base::{self, XdgWmBase};

use crate::config::ClientConfig;
use crate::context::RenderContext;
use crate::guard::{Guard, TeardownLedger};
use crate::window::Window;

/// Bound globals.
#[derive(Debug, Default)]
pub(crate) struct Capabilities {
    pub(crate) compositor: Option<WlCompositor>,
    pub(crate) shell: Option<XdgWmBase>,
}

/// `wl_compositor` has no destructor request; only the shell is destroyed.
fn release_capabilities(capabilities: &Capabilities) {
    if let Some(shell) = &capabilities.shell {
        shell.destroy();
    }
}

/// Everything the event handlers touch.
///
/// The first five fields are in release order.
pub(crate) struct ClientState<H> {
    pub(crate) handler: H,
    pub(crate) render: Option<RenderContext>,
    pub(crate) window: Option<Window>,
    pub(crate) capabilities: Guard<Capabilities>,
    pub(crate) registry: Guard<WlRegistry>,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) binder: CapabilityBinder,
    pub(crate) config: ClientConfig,
    pub(crate) ledger: TeardownLedger,
    pub(crate) qh: QueueHandle<Self>,
}

impl<H> fmt::Debug for ClientState<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientState")
            .field("render", &self.render)
            .field("window", &self.window)
            .field("capabilities", &self.capabilities)
            .field("registry", &self.registry)
            .field("lifecycle", &self.lifecycle)
            .field("binder", &self.binder)
            .finish_non_exhaustive()
    }
}

impl<H> ClientState<H>
where
    H: FrameHandler<RenderContext> + 'static,
{
    pub(crate) fn new(
        config: ClientConfig,
        handler: H,
        registry: Guard<WlRegistry>,
        qh: QueueHandle<Self>,
        ledger: TeardownLedger,
    ) -> Self {
        Self {
            handler,
            render: None,
            window: None,
            capabilities: Guard::new(
                Capabilities::default(),
                Stage::Capabilities,
                &ledger,
                release_capabilities,
            ),
            registry,
            lifecycle: Lifecycle::new(config.initial_geometry),
            binder: CapabilityBinder::new(),
            config,
            ledger,
            qh,
        }
    }

    /// Creates the window from the bound globals.
    ///
    /// Returns `false` if a required global is not bound.
    pub(crate) fn create_window(&mut self) -> bool {
        let (Some(compositor), Some(shell)) = (
            self.capabilities.compositor.as_ref(),
            self.capabilities.shell.as_ref(),
        ) else {
            return false;
        };
        self.window = Some(Window::create(
            compositor,
            shell,
            &self.config,
            &self.qh,
            &self.ledger,
        ));
        true
    }

    pub(crate) fn initial_commit(&mut self) {
        let (lifecycle, mut peer, _) = self.split();
        lifecycle.initial_commit(&mut peer);
    }

    pub(crate) fn bootstrap(&mut self) {
        let (lifecycle, mut peer, target) = self.split();
        if let Some((context, handler)) = target {
            lifecycle.bootstrap(&mut peer, context, handler);
        }
    }

    fn handle(&mut self, event: ShellEvent) {
        let (lifecycle, mut peer, target) = self.split();
        lifecycle.handle(event, &mut peer, target);
    }

    fn split(
        &mut self,
    ) -> (
        &mut Lifecycle,
        WaylandPeer<'_, H>,
        Option<(&RenderContext, &mut H)>,
    ) {
        let Self {
            handler,
            render,
            window,
            capabilities,
            lifecycle,
            qh,
            ..
        } = self;
        let peer = WaylandPeer {
            shell: capabilities.shell.as_ref(),
            window: window.as_mut(),
            native: render.as_ref().map(RenderContext::native_window),
            qh,
        };
        let target = render.as_ref().map(move |context| (context, handler));
        (lifecycle, peer, target)
    }
}

/// Requests issued on behalf of the lifecycle.
struct WaylandPeer<'a, H: 'static> {
    shell: Option<&'a XdgWmBase>,
    window: Option<&'a mut Window>,
    native: Option<&'a WlEglSurface>,
    qh: &'a QueueHandle<ClientState<H>>,
}

impl<H> SurfacePeer for WaylandPeer<'_, H>
where
    H: FrameHandler<RenderContext> + 'static,
{
    fn pong(&mut self, serial: u32) {
        match self.shell {
            Some(shell) => shell.pong(serial),
            None => tracing::warn!(serial, "ping without a bound shell"),
        }
    }

    fn ack_configure(&mut self, serial: u32) {
        if let Some(window) = &self.window {
            window.ack_configure(serial);
        }
    }

    fn request_frame(&mut self) {
        if let Some(window) = self.window.as_deref_mut() {
            window.request_frame(self.qh);
        }
    }

    fn commit(&mut self) {
        if let Some(window) = &self.window {
            window.commit();
        }
    }

    fn resize_native(&mut self, geometry: Geometry) {
        if let Some(native) = self.native {
            native.resize(geometry.width_i32(), geometry.height_i32(), 0, 0);
        }
    }
}

impl<H> Dispatch<WlRegistry, ()> for ClientState<H>
where
    H: FrameHandler<RenderContext> + 'static,
{
    fn event(
        state: &mut Self,
        registry: &WlRegistry,
        event: wl_registry::Event,
        _: &(),
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        match event {
            wl_registry::Event::Global {
                name,
                interface,
                version,
            } => {
                let Some(bind) = state.binder.offer(name, &interface, version) else {
                    tracing::trace!(name, %interface, version, "global ignored");
                    return;
                };
                tracing::debug!(?bind, "binding global");
                match bind.capability {
                    Capability::Compositor => {
                        state.capabilities.compositor =
                            Some(registry.bind::<WlCompositor, _, _>(bind.name, bind.version, qh, ()));
                    }
                    Capability::Shell => {
                        state.capabilities.shell =
                            Some(registry.bind::<XdgWmBase, _, _>(bind.name, bind.version, qh, ()));
                    }
                }
            }
            wl_registry::Event::GlobalRemove { name } => {
                if let Some(capability) = state.binder.withdraw(name) {
                    tracing::warn!(?capability, name, "bound global removed");
                }
            }
            _ => {}
        }
    }
}

impl<H> Dispatch<WlCompositor, ()> for ClientState<H>
where
    H: FrameHandler<RenderContext> + 'static,
{
    fn event(
        _: &mut Self,
        _: &WlCompositor,
        _: wl_compositor::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
    }
}

impl<H> Dispatch<WlSurface, ()> for ClientState<H>
where
    H: FrameHandler<RenderContext> + 'static,
{
    fn event(
        _: &mut Self,
        _: &WlSurface,
        event: wl_surface::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        tracing::trace!(?event, "surface event");
    }
}

impl<H> Dispatch<XdgWmBase, ()> for ClientState<H>
where
    H: FrameHandler<RenderContext> + 'static,
{
    fn event(
        state: &mut Self,
        _: &XdgWmBase,
        event: xdg_wm_base::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let xdg_wm_base::Event::Ping { serial } = event {
            state.handle(ShellEvent::Ping { serial });
        }
    }
}

impl<H> Dispatch<XdgSurface, ()> for ClientState<H>
where
    H: FrameHandler<RenderContext> + 'static,
{
    fn event(
        state: &mut Self,
        _: &XdgSurface,
        event: xdg_surface::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let xdg_surface::Event::Configure { serial } = event {
            state.handle(ShellEvent::SurfaceConfigure { serial });
        }
    }
}

impl<H> Dispatch<XdgToplevel, ()> for ClientState<H>
where
    H: FrameHandler<RenderContext> + 'static,
{
    fn event(
        state: &mut Self,
        _: &XdgToplevel,
        event: xdg_toplevel::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        match event {
            xdg_toplevel::Event::Configure { width, height, .. } => {
                state.handle(ShellEvent::ToplevelConfigure { width, height });
            }
            xdg_toplevel::Event::Close => state.handle(ShellEvent::ToplevelClose),
            _ => {}
        }
    }
}

impl<H> Dispatch<WlCallback, ()> for ClientState<H>
where
    H: FrameHandler<RenderContext> + 'static,
{
    fn event(
        state: &mut Self,
        callback: &WlCallback,
        event: wl_callback::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let wl_callback::Event::Done { callback_data } = event {
            if let Some(window) = state.window.as_mut() {
                window.frame_done(callback);
            }
            state.handle(ShellEvent::FrameDone {
                time: Timestamp(callback_data),
            });
        }
    }
}
