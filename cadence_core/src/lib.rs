// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Protocol-agnostic state machines for a frame-paced compositor client.
//!
//! `cadence_core` holds everything about the client that can be decided
//! without talking to a real compositor or GPU driver. Platform crates feed
//! it protocol events and carry out the requests it issues.
//!
//! # Architecture
//!
//! ```text
//!   registry globals ──► CapabilityBinder ──► bind compositor + shell
//!
//!   protocol events ──► ShellEvent ──► Lifecycle::handle()
//!                                           │
//!                 ┌─────────────────────────┼──────────────────────┐
//!                 ▼                         ▼                      ▼
//!   SurfacePeer (pong, ack,       FrameHandler (viewport,    Geometry / phase /
//!   frame, commit, resize)        redraw + swap)             running flag
//!
//!   guards dropped ──► TeardownOrder::release() ──► OutOfOrder on violation
//! ```
//!
//! **[`capability`]** — Selects which advertised globals to bind and reports
//! a missing required capability.
//!
//! **[`event`]** — Tagged protocol events and the compositor [`Timestamp`](event::Timestamp).
//!
//! **[`geometry`]** — Authoritative surface size and the resize policy.
//!
//! **[`lifecycle`]** — The negotiation state machine, frame scheduler and
//! resize/close handling behind a single event entry point.
//!
//! **[`pacing`]** — Observed frame-interval statistics.
//!
//! **[`teardown`]** — Release stages and order checking for scoped guards.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod capability;
pub mod event;
pub mod geometry;
pub mod lifecycle;
pub mod pacing;
mod queue;
pub mod teardown;
