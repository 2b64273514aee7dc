// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wayland demo: a window whose clear color pulses with frame time.
//!
//! Every `wl_surface.frame` notification redraws once, so the pulse runs at
//! the compositor's pace and stops while the window is hidden. Set
//! `RUST_LOG=cadence_wayland=debug` to see the EGL negotiation and the
//! teardown sequence.
//!
//! Run with: `cargo run -p cadence_pulse`

#![expect(unsafe_code, reason = "OpenGL calls through glow are unsafe")]

use core::f32::consts::FRAC_PI_4;

use anyhow::{Context as _, bail};
use cadence_core::event::Timestamp;
use cadence_core::geometry::Geometry;
use cadence_wayland::{Client, ClientConfig, FrameHandler, RenderContext};
use glow::HasContext as _;
use tracing_subscriber::EnvFilter;

/// Clear color at `time`: each channel follows its own phase.
fn pulse_color(time: Timestamp) -> [f32; 4] {
    let t = time.as_secs_f32();
    [
        t.sin().abs(),
        (t + FRAC_PI_4).sin().abs(),
        t.cos().abs(),
        1.0,
    ]
}

/// Frame handler that loads OpenGL on first use.
#[derive(Default)]
struct Pulse {
    gl: Option<glow::Context>,
    redraws: u64,
}

impl core::fmt::Debug for Pulse {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pulse")
            .field("loaded", &self.gl.is_some())
            .field("redraws", &self.redraws)
            .finish()
    }
}

impl Pulse {
    fn gl(&mut self, context: &RenderContext) -> &glow::Context {
        self.gl.get_or_insert_with(|| {
            // SAFETY: `context` is current on this thread, so the loaded
            // entry points belong to it.
            let gl = unsafe {
                glow::Context::from_loader_function(|name| context.get_proc_address(name))
            };
            // SAFETY: plain string queries on the current context.
            unsafe {
                tracing::info!(
                    version = %gl.get_parameter_string(glow::VERSION),
                    glsl = %gl.get_parameter_string(glow::SHADING_LANGUAGE_VERSION),
                    vendor = %gl.get_parameter_string(glow::VENDOR),
                    renderer = %gl.get_parameter_string(glow::RENDERER),
                    "OpenGL loaded"
                );
            }
            gl
        })
    }
}

impl FrameHandler<RenderContext> for Pulse {
    fn on_resize(&mut self, context: &RenderContext, geometry: Geometry) {
        let gl = self.gl(context);
        let (width, height) = (geometry.width_i32(), geometry.height_i32());
        // SAFETY: the context is current and the arguments are in range.
        unsafe {
            gl.viewport(0, 0, width, height);
            gl.scissor(0, 0, width, height);
        }
    }

    fn on_redraw(&mut self, context: &RenderContext, time: Timestamp) {
        self.redraws += 1;
        let gl = self.gl(context);
        let [r, g, b, a] = pulse_color(time);
        // SAFETY: the context is current on this thread.
        unsafe {
            gl.clear_color(r, g, b, a);
            gl.clear(glow::COLOR_BUFFER_BIT);
        }
        if let Err(error) = context.swap_buffers() {
            tracing::warn!(%error, ?time, "eglSwapBuffers failed");
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ClientConfig::default()
        .with_title("cadence pulse")
        .with_app_id("org.cadence.pulse");
    let mut client = Client::connect(config, Pulse::default()).context("connecting")?;
    let ledger = client.teardown_ledger();
    client.negotiate().context("negotiating the window")?;
    tracing::info!(geometry = ?client.lifecycle().geometry(), "window configured");
    client.bind_context().context("binding OpenGL")?;
    client.run().context("frame loop")?;
    tracing::info!(
        redraws = client.handler().redraws,
        last_geometry = ?client.lifecycle().geometry(),
        "window closed"
    );
    drop(client);

    let order = ledger.snapshot();
    if let Some(violation) = order.violations().first() {
        bail!("teardown ran out of order: {violation}");
    }
    tracing::info!(
        released = order.released().len(),
        complete = order.is_complete(),
        "torn down"
    );
    Ok(())
}
