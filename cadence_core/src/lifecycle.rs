// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Surface lifecycle, frame scheduling and resize/close handling.
//!
//! [`Lifecycle`] is the single owner of the client's mutable state:
//! [`Geometry`], the configured and running flags, and whether a frame
//! notification is outstanding. Every compositor message reaches it through
//! [`Lifecycle::handle`], which runs inside the platform's dispatch call and
//! never blocks.
//!
//! # Negotiation state machine
//!
//! ```text
//!   Created ──initial_commit()──► AwaitingConfigure
//!                                        │ SurfaceConfigure { serial }
//!                                        │   → ack_configure(serial)
//!                                        ▼
//!                                   Configured ──begin_teardown()──► Destroying
//! ```
//!
//! Only the shell-surface configure drives the transition. A top-level
//! configure may arrive before or between shell-surface configures and only
//! updates [`Geometry`].
//!
//! # Frame pacing
//!
//! Once a rendering context exists the platform calls
//! [`Lifecycle::bootstrap`], which renders one frame eagerly (nothing has
//! requested a notification yet) and arms the first frame request. From then
//! on every [`ShellEvent::FrameDone`] renders, re-arms, and commits:
//!
//! ```text
//!   FrameDone(t) → on_redraw(t) → request_frame() → commit()
//! ```
//!
//! Re-arming before the commit means the commit that carries the new frame
//! always carries the next request too, so no refresh cycle goes unobserved.

use crate::event::{ShellEvent, Timestamp};
use crate::geometry::Geometry;
use crate::pacing::FramePacing;

/// Negotiation state of the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfacePhase {
    /// Drawable and role objects exist; nothing committed yet.
    Created,
    /// Initial commit sent; waiting for the first shell-surface configure.
    AwaitingConfigure,
    /// At least one configure was acknowledged; rendering may begin.
    Configured,
    /// Teardown started; only liveness pings are still answered.
    Destroying,
}

/// Requests the lifecycle issues to the compositor side.
///
/// Implemented by platform crates over real protocol objects and by test
/// doubles that record calls.
pub trait SurfacePeer {
    /// Answers a shell ping with the same serial.
    fn pong(&mut self, serial: u32);
    /// Acknowledges a shell-surface configure with its serial.
    fn ack_configure(&mut self, serial: u32);
    /// Requests a one-shot frame notification for the drawable.
    fn request_frame(&mut self);
    /// Commits pending drawable state.
    fn commit(&mut self);
    /// Resizes the native window backing the rendering surface.
    ///
    /// Only called once a rendering context exists. Offsets are fixed at the
    /// origin.
    fn resize_native(&mut self, geometry: Geometry);
}

/// Application callbacks for viewport updates and drawing.
///
/// `C` is whatever rendering context the platform hands out; the handler
/// uses it to issue drawing commands and present.
pub trait FrameHandler<C: ?Sized> {
    /// The surface changed size; update the viewport and clip region.
    fn on_resize(&mut self, context: &C, geometry: Geometry);

    /// Draw one frame for `time` and present it.
    ///
    /// Must not block.
    fn on_redraw(&mut self, context: &C, time: Timestamp);
}

/// Surface lifecycle and frame-pacing state.
#[derive(Clone, Debug)]
pub struct Lifecycle {
    phase: SurfacePhase,
    geometry: Geometry,
    running: bool,
    configures_received: u32,
    acks_sent: u32,
    frame_pending: bool,
    frames_rendered: u64,
    pacing: FramePacing,
}

impl Lifecycle {
    /// Creates a lifecycle in [`SurfacePhase::Created`].
    #[must_use]
    pub fn new(geometry: Geometry) -> Self {
        Self {
            phase: SurfacePhase::Created,
            geometry,
            running: true,
            configures_received: 0,
            acks_sent: 0,
            frame_pending: false,
            frames_rendered: 0,
            pacing: FramePacing::default(),
        }
    }

    /// Current negotiation phase.
    #[must_use]
    pub fn phase(&self) -> SurfacePhase {
        self.phase
    }

    /// Authoritative surface size.
    #[must_use]
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Returns `true` once the first configure was acknowledged.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        matches!(
            self.phase,
            SurfacePhase::Configured | SurfacePhase::Destroying
        ) && self.acks_sent > 0
    }

    /// Returns `false` once a close request arrived or teardown began.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Returns `true` while a frame notification is outstanding.
    #[must_use]
    pub fn frame_pending(&self) -> bool {
        self.frame_pending
    }

    /// Number of frames rendered, including the bootstrap frame.
    #[must_use]
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Number of shell-surface configures received.
    #[must_use]
    pub fn configures_received(&self) -> u32 {
        self.configures_received
    }

    /// Number of configure acknowledgements sent.
    #[must_use]
    pub fn acks_sent(&self) -> u32 {
        self.acks_sent
    }

    /// Observed frame-interval statistics.
    #[must_use]
    pub fn pacing(&self) -> &FramePacing {
        &self.pacing
    }

    /// Issues the initial commit that asks the compositor for a configure.
    ///
    /// Has no effect outside [`SurfacePhase::Created`].
    pub fn initial_commit<P: SurfacePeer>(&mut self, peer: &mut P) {
        if self.phase != SurfacePhase::Created {
            return;
        }
        peer.commit();
        self.phase = SurfacePhase::AwaitingConfigure;
    }

    /// Renders the eager first frame and arms the first frame request.
    ///
    /// The bootstrap frame is not paced by the compositor: no notification
    /// could have been requested before the rendering context existed.
    pub fn bootstrap<P, C, H>(&mut self, peer: &mut P, context: &C, handler: &mut H)
    where
        P: SurfacePeer,
        C: ?Sized,
        H: FrameHandler<C>,
    {
        debug_assert!(
            self.is_configured(),
            "bootstrap frame rendered before the surface was configured"
        );
        if self.phase == SurfacePhase::Destroying {
            return;
        }
        self.render_frame(Timestamp::BOOTSTRAP, peer, context, handler);
    }

    /// Marks the start of teardown. No further frames are rendered.
    pub fn begin_teardown(&mut self) {
        self.phase = SurfacePhase::Destroying;
        self.running = false;
    }

    /// Handles one compositor event.
    ///
    /// `target` is the rendering context and handler, or [`None`] while the
    /// context is not bound yet. Without a target, resizes only update
    /// [`Geometry`] and frame notifications render nothing.
    pub fn handle<P, C, H>(
        &mut self,
        event: ShellEvent,
        peer: &mut P,
        target: Option<(&C, &mut H)>,
    ) where
        P: SurfacePeer,
        C: ?Sized,
        H: FrameHandler<C>,
    {
        if let ShellEvent::Ping { serial } = event {
            peer.pong(serial);
            return;
        }
        if self.phase == SurfacePhase::Destroying {
            tracing::trace!(?event, "ignored during teardown");
            return;
        }

        match event {
            ShellEvent::Ping { .. } => {}
            ShellEvent::SurfaceConfigure { serial } => {
                self.configures_received += 1;
                peer.ack_configure(serial);
                self.acks_sent += 1;
                if self.phase != SurfacePhase::Configured {
                    tracing::debug!(serial, geometry = ?self.geometry, "surface configured");
                }
                self.phase = SurfacePhase::Configured;
            }
            ShellEvent::ToplevelConfigure { width, height } => {
                self.resize(width, height, peer, target);
            }
            ShellEvent::ToplevelClose => {
                tracing::debug!("close requested");
                self.running = false;
            }
            ShellEvent::FrameDone { time } => {
                self.frame_pending = false;
                let interval = self.pacing.record(time);
                tracing::trace!(?time, ?interval, "frame done");
                match target {
                    Some((context, handler)) => {
                        self.render_frame(time, peer, context, handler);
                    }
                    None => tracing::trace!("frame done without a rendering context"),
                }
            }
        }
    }

    fn resize<P, C, H>(
        &mut self,
        width: i32,
        height: i32,
        peer: &mut P,
        target: Option<(&C, &mut H)>,
    ) where
        P: SurfacePeer,
        C: ?Sized,
        H: FrameHandler<C>,
    {
        let Some(next) = self.geometry.propose(width, height) else {
            tracing::trace!(width, height, current = ?self.geometry, "resize ignored");
            return;
        };
        tracing::debug!(from = ?self.geometry, to = ?next, "resize");
        self.geometry = next;
        if let Some((context, handler)) = target {
            peer.resize_native(next);
            handler.on_resize(context, next);
        }
    }

    fn render_frame<P, C, H>(&mut self, time: Timestamp, peer: &mut P, context: &C, handler: &mut H)
    where
        P: SurfacePeer,
        C: ?Sized,
        H: FrameHandler<C>,
    {
        handler.on_redraw(context, time);
        self.frames_rendered += 1;
        peer.request_frame();
        self.frame_pending = true;
        peer.commit();
    }
}

#[cfg(test)]
mod tests {
    use super::{FrameHandler, Lifecycle, SurfacePeer, SurfacePhase};
    use crate::event::{ShellEvent, Timestamp};
    use crate::geometry::Geometry;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    #[derive(Clone, Copy, Debug, PartialEq)]
    enum Call {
        Pong(u32),
        Ack(u32),
        RequestFrame,
        Commit,
        ResizeNative(Geometry),
        Viewport(Geometry),
        Redraw(Timestamp, f32),
    }

    /// Shared call log; also serves as the rendering context.
    type Log = RefCell<Vec<Call>>;

    struct RecordingPeer<'a>(&'a Log);

    impl SurfacePeer for RecordingPeer<'_> {
        fn pong(&mut self, serial: u32) {
            self.0.borrow_mut().push(Call::Pong(serial));
        }
        fn ack_configure(&mut self, serial: u32) {
            self.0.borrow_mut().push(Call::Ack(serial));
        }
        fn request_frame(&mut self) {
            self.0.borrow_mut().push(Call::RequestFrame);
        }
        fn commit(&mut self) {
            self.0.borrow_mut().push(Call::Commit);
        }
        fn resize_native(&mut self, geometry: Geometry) {
            self.0.borrow_mut().push(Call::ResizeNative(geometry));
        }
    }

    struct RecordingHandler;

    impl FrameHandler<Log> for RecordingHandler {
        fn on_resize(&mut self, log: &Log, geometry: Geometry) {
            log.borrow_mut().push(Call::Viewport(geometry));
        }
        fn on_redraw(&mut self, log: &Log, time: Timestamp) {
            log.borrow_mut().push(Call::Redraw(time, time.as_secs_f32()));
        }
    }

    fn negotiating(log: &Log) -> Lifecycle {
        let mut lifecycle = Lifecycle::new(Geometry::DEFAULT);
        lifecycle.initial_commit(&mut RecordingPeer(log));
        lifecycle
    }

    /// Feeds events with no rendering context bound.
    fn feed_unbound(lifecycle: &mut Lifecycle, log: &Log, events: &[ShellEvent]) {
        for event in events {
            lifecycle.handle::<_, Log, RecordingHandler>(*event, &mut RecordingPeer(log), None);
        }
    }

    /// Feeds events with the log bound as the rendering context.
    fn feed_bound(lifecycle: &mut Lifecycle, log: &Log, events: &[ShellEvent]) {
        let mut handler = RecordingHandler;
        for event in events {
            lifecycle.handle(*event, &mut RecordingPeer(log), Some((log, &mut handler)));
        }
    }

    fn rendering(log: &Log) -> Lifecycle {
        let mut lifecycle = negotiating(log);
        feed_unbound(
            &mut lifecycle,
            log,
            &[ShellEvent::SurfaceConfigure { serial: 1 }],
        );
        lifecycle.bootstrap(&mut RecordingPeer(log), log, &mut RecordingHandler);
        log.borrow_mut().clear();
        lifecycle
    }

    #[test]
    fn initial_commit_awaits_configure() {
        let log = Log::default();
        let lifecycle = negotiating(&log);
        assert_eq!(lifecycle.phase(), SurfacePhase::AwaitingConfigure);
        assert!(!lifecycle.is_configured());
        assert_eq!(*log.borrow(), [Call::Commit]);
    }

    #[test]
    fn initial_commit_is_issued_once() {
        let log = Log::default();
        let mut lifecycle = negotiating(&log);
        lifecycle.initial_commit(&mut RecordingPeer(&log));
        assert_eq!(*log.borrow(), [Call::Commit]);
    }

    #[test]
    fn toplevel_configure_alone_does_not_configure() {
        let log = Log::default();
        let mut lifecycle = negotiating(&log);
        feed_unbound(
            &mut lifecycle,
            &log,
            &[ShellEvent::ToplevelConfigure {
                width: 640,
                height: 480,
            }],
        );
        assert_eq!(lifecycle.phase(), SurfacePhase::AwaitingConfigure);
        assert_eq!(lifecycle.geometry(), Geometry::new(640, 480).unwrap());
    }

    #[test]
    fn every_configure_is_acknowledged_with_its_own_serial() {
        let log = Log::default();
        let mut lifecycle = negotiating(&log);
        log.borrow_mut().clear();

        feed_unbound(
            &mut lifecycle,
            &log,
            &[
                ShellEvent::SurfaceConfigure { serial: 3 },
                ShellEvent::SurfaceConfigure { serial: 9 },
                ShellEvent::SurfaceConfigure { serial: 4 },
            ],
        );

        assert_eq!(*log.borrow(), [Call::Ack(3), Call::Ack(9), Call::Ack(4)]);
        assert_eq!(lifecycle.configures_received(), 3);
        assert_eq!(lifecycle.acks_sent(), 3);
        assert!(lifecycle.is_configured());
    }

    #[test]
    fn startup_configure_before_first_dispatch_returns() {
        // Compositor sends configure(7) and a 300x300 top-level configure in
        // the same batch as the initial commit's reply.
        let log = Log::default();
        let mut lifecycle = negotiating(&log);
        log.borrow_mut().clear();

        feed_unbound(
            &mut lifecycle,
            &log,
            &[
                ShellEvent::SurfaceConfigure { serial: 7 },
                ShellEvent::ToplevelConfigure {
                    width: 300,
                    height: 300,
                },
            ],
        );

        assert_eq!(*log.borrow(), [Call::Ack(7)]);
        assert_eq!(lifecycle.phase(), SurfacePhase::Configured);
        assert_eq!(lifecycle.geometry(), Geometry::new(300, 300).unwrap());
    }

    #[test]
    fn bootstrap_renders_eagerly_then_arms_and_commits() {
        let log = Log::default();
        let mut lifecycle = negotiating(&log);
        feed_unbound(
            &mut lifecycle,
            &log,
            &[ShellEvent::SurfaceConfigure { serial: 1 }],
        );
        log.borrow_mut().clear();

        lifecycle.bootstrap(&mut RecordingPeer(&log), &log, &mut RecordingHandler);

        assert_eq!(
            *log.borrow(),
            [
                Call::Redraw(Timestamp::BOOTSTRAP, 0.0),
                Call::RequestFrame,
                Call::Commit,
            ]
        );
        assert!(lifecycle.frame_pending());
        assert_eq!(lifecycle.frames_rendered(), 1);
    }

    #[test]
    fn frame_done_renders_then_rearms_once_before_commit() {
        let log = Log::default();
        let mut lifecycle = rendering(&log);

        feed_bound(
            &mut lifecycle,
            &log,
            &[ShellEvent::FrameDone {
                time: Timestamp(1000),
            }],
        );

        assert_eq!(
            *log.borrow(),
            [
                Call::Redraw(Timestamp(1000), 1.0),
                Call::RequestFrame,
                Call::Commit,
            ]
        );
        assert!(lifecycle.frame_pending());
        assert_eq!(lifecycle.frames_rendered(), 2);
    }

    #[test]
    fn frame_done_without_context_renders_nothing() {
        let log = Log::default();
        let mut lifecycle = negotiating(&log);
        log.borrow_mut().clear();
        feed_unbound(
            &mut lifecycle,
            &log,
            &[ShellEvent::FrameDone {
                time: Timestamp(16),
            }],
        );
        assert!(log.borrow().is_empty());
        assert!(!lifecycle.frame_pending());
    }

    #[test]
    fn zero_dimension_resize_is_a_no_op() {
        let log = Log::default();
        let mut lifecycle = rendering(&log);

        feed_bound(
            &mut lifecycle,
            &log,
            &[
                ShellEvent::ToplevelConfigure {
                    width: 0,
                    height: 720,
                },
                ShellEvent::ToplevelConfigure {
                    width: 1280,
                    height: 0,
                },
            ],
        );

        assert!(log.borrow().is_empty());
        assert_eq!(lifecycle.geometry(), Geometry::DEFAULT);
    }

    #[test]
    fn unchanged_resize_is_idempotent() {
        let log = Log::default();
        let mut lifecycle = rendering(&log);

        feed_bound(
            &mut lifecycle,
            &log,
            &[ShellEvent::ToplevelConfigure {
                width: 512,
                height: 512,
            }],
        );

        assert!(log.borrow().is_empty());
    }

    #[test]
    fn genuine_resize_updates_once_before_next_render() {
        let log = Log::default();
        let mut lifecycle = rendering(&log);
        let next = Geometry::new(800, 600).unwrap();

        feed_bound(
            &mut lifecycle,
            &log,
            &[
                ShellEvent::ToplevelConfigure {
                    width: 800,
                    height: 600,
                },
                ShellEvent::FrameDone {
                    time: Timestamp(16),
                },
            ],
        );

        assert_eq!(lifecycle.geometry(), next);
        assert_eq!(
            *log.borrow(),
            [
                Call::ResizeNative(next),
                Call::Viewport(next),
                Call::Redraw(Timestamp(16), 0.016),
                Call::RequestFrame,
                Call::Commit,
            ]
        );
    }

    #[test]
    fn ping_is_answered_regardless_of_position() {
        let log = Log::default();
        let mut lifecycle = rendering(&log);

        feed_bound(
            &mut lifecycle,
            &log,
            &[
                ShellEvent::ToplevelConfigure {
                    width: 640,
                    height: 480,
                },
                ShellEvent::Ping { serial: 42 },
                ShellEvent::SurfaceConfigure { serial: 8 },
            ],
        );

        let pongs: Vec<_> = log
            .borrow()
            .iter()
            .filter(|call| matches!(call, Call::Pong(_)))
            .copied()
            .collect();
        assert_eq!(pongs, [Call::Pong(42)]);
        assert_eq!(log.borrow()[2], Call::Pong(42));
    }

    #[test]
    fn close_stops_running_but_keeps_state() {
        let log = Log::default();
        let mut lifecycle = rendering(&log);

        feed_bound(&mut lifecycle, &log, &[ShellEvent::ToplevelClose]);

        assert!(!lifecycle.is_running());
        assert_eq!(lifecycle.phase(), SurfacePhase::Configured);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn teardown_ignores_everything_but_ping() {
        let log = Log::default();
        let mut lifecycle = rendering(&log);
        lifecycle.begin_teardown();

        feed_bound(
            &mut lifecycle,
            &log,
            &[
                ShellEvent::FrameDone {
                    time: Timestamp(16),
                },
                ShellEvent::ToplevelConfigure {
                    width: 100,
                    height: 100,
                },
                ShellEvent::SurfaceConfigure { serial: 5 },
                ShellEvent::Ping { serial: 6 },
            ],
        );

        assert_eq!(*log.borrow(), [Call::Pong(6)]);
        assert_eq!(lifecycle.phase(), SurfacePhase::Destroying);
        assert!(!lifecycle.is_running());
    }

    #[test]
    fn pacing_records_frame_done_times() {
        let log = Log::default();
        let mut lifecycle = rendering(&log);

        feed_bound(
            &mut lifecycle,
            &log,
            &[
                ShellEvent::FrameDone {
                    time: Timestamp(100),
                },
                ShellEvent::FrameDone {
                    time: Timestamp(116),
                },
            ],
        );

        assert_eq!(lifecycle.pacing().frames(), 2);
        assert_eq!(lifecycle.pacing().mean_interval_ms(), Some(16.0));
    }
}
