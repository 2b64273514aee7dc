// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Socket-pair fixtures for driving dispatch without a compositor.
//!
//! The client end of a `UnixStream` pair becomes a real [`Connection`];
//! requests are only buffered and flushed into the other end, where
//! [`ServerEnd::requests`] decodes their headers.

use std::io::{ErrorKind, Read};
use std::os::unix::net::UnixStream;

use cadence_core::event::Timestamp;
use cadence_core::geometry::Geometry;
use cadence_core::lifecycle::FrameHandler;
use wayland_client::{Connection, Dispatch, Proxy};

use crate::context::RenderContext;
use crate::state::ClientState;

/// Frame handler for tests that never bind a rendering context.
#[derive(Debug, Default)]
pub(crate) struct Idle;

impl FrameHandler<RenderContext> for Idle {
    fn on_resize(&mut self, _: &RenderContext, _: Geometry) {}

    fn on_redraw(&mut self, _: &RenderContext, _: Timestamp) {}
}

/// One decoded request: sender object, opcode and raw argument words.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Request {
    pub(crate) object: u32,
    pub(crate) opcode: u16,
    pub(crate) args: Vec<u32>,
}

/// The compositor side of the socket pair.
#[derive(Debug)]
pub(crate) struct ServerEnd(UnixStream);

impl ServerEnd {
    /// Returns a client connection and the socket end it writes to.
    pub(crate) fn pair() -> (Connection, Self) {
        let (client, server) = UnixStream::pair().unwrap();
        server.set_nonblocking(true).unwrap();
        (Connection::from_socket(client).unwrap(), Self(server))
    }

    /// Flushes `connection` and decodes every request received since the
    /// last call.
    pub(crate) fn requests(&mut self, connection: &Connection) -> Vec<Request> {
        connection.flush().unwrap();
        let mut bytes = Vec::new();
        let mut chunk = [0_u8; 4096];
        loop {
            match self.0.read(&mut chunk) {
                Ok(0) => break,
                Ok(read) => bytes.extend_from_slice(&chunk[..read]),
                Err(error) if error.kind() == ErrorKind::WouldBlock => break,
                Err(error) => panic!("reading requests failed: {error}"),
            }
        }
        let words: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|word| u32::from_ne_bytes([word[0], word[1], word[2], word[3]]))
            .collect();

        let mut requests = Vec::new();
        let mut rest = words.as_slice();
        while let [object, header, ..] = *rest {
            let size = (header >> 16) as usize / 4;
            assert!(size >= 2 && size <= rest.len(), "truncated request");
            requests.push(Request {
                object,
                opcode: u16::try_from(header & 0xffff).unwrap(),
                args: rest[2..size].to_vec(),
            });
            rest = &rest[size..];
        }
        requests
    }
}

/// Delivers `event` for `proxy` exactly as the event queue would.
pub(crate) fn dispatch<I>(
    state: &mut ClientState<Idle>,
    connection: &Connection,
    proxy: &I,
    event: I::Event,
) where
    I: Proxy,
    ClientState<Idle>: Dispatch<I, ()>,
{
    let qh = state.qh.clone();
    <ClientState<Idle> as Dispatch<I, ()>>::event(state, proxy, event, &(), connection, &qh);
}

/// Finds the request `opcode` sent by `proxy`.
pub(crate) fn sent_by<'a, I: Proxy>(
    requests: &'a [Request],
    proxy: &I,
    opcode: u16,
) -> Option<&'a Request> {
    let object = proxy.id().protocol_id();
    requests
        .iter()
        .find(|request| request.object == object && request.opcode == opcode)
}
