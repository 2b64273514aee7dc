// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Client errors.

use std::fmt;

use cadence_core::capability::MissingCapability;
use wayland_client::backend::WaylandError;
use wayland_client::{ConnectError, DispatchError};

use crate::context::ContextError;

/// Fatal errors from [`Client`](crate::Client).
///
/// Every variant ends the session: there is no retry path.
#[derive(Debug)]
pub enum ClientError {
    /// No compositor could be reached (`WAYLAND_DISPLAY` / socket).
    Connect(ConnectError),
    /// The connection failed while dispatching events.
    Dispatch(DispatchError),
    /// Outgoing requests could not be flushed.
    Flush(WaylandError),
    /// A required global was never advertised.
    MissingCapability(MissingCapability),
    /// A step was called out of order (for example, binding a context before
    /// the surface was configured).
    NotReady(&'static str),
    /// Binding the rendering context failed.
    Context(ContextError),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect(error) => write!(f, "cannot connect to compositor: {error}"),
            Self::Dispatch(error) => write!(f, "event dispatch failed: {error}"),
            Self::Flush(error) => write!(f, "flushing requests failed: {error}"),
            Self::MissingCapability(error) => fmt::Display::fmt(error, f),
            Self::NotReady(step) => write!(f, "{step} called before its prerequisites"),
            Self::Context(error) => write!(f, "rendering context: {error}"),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Connect(error) => Some(error),
            Self::Dispatch(error) => Some(error),
            Self::Flush(error) => Some(error),
            Self::MissingCapability(error) => Some(error),
            Self::NotReady(_) => None,
            Self::Context(error) => Some(error),
        }
    }
}

impl From<ConnectError> for ClientError {
    fn from(error: ConnectError) -> Self {
        Self::Connect(error)
    }
}

impl From<DispatchError> for ClientError {
    fn from(error: DispatchError) -> Self {
        Self::Dispatch(error)
    }
}

impl From<WaylandError> for ClientError {
    fn from(error: WaylandError) -> Self {
        Self::Flush(error)
    }
}

impl From<MissingCapability> for ClientError {
    fn from(error: MissingCapability) -> Self {
        Self::MissingCapability(error)
    }
}

impl From<ContextError> for ClientError {
    fn from(error: ContextError) -> Self {
        Self::Context(error)
    }
}

#[cfg(test)]
mod tests {
    use super::ClientError;
    use crate::context::ContextError;
    use cadence_core::capability::{Capability, MissingCapability};
    use std::error::Error as _;
    use std::io;
    use wayland_client::backend::WaylandError;

    #[test]
    fn missing_capability_names_the_interface() {
        let error = ClientError::from(MissingCapability(Capability::Shell));
        assert!(error.to_string().contains("xdg_wm_base"));
        assert!(error.source().is_some());
    }

    #[test]
    fn context_errors_chain_to_their_step() {
        let error = ClientError::from(ContextError::NoMatchingConfig);
        assert_eq!(
            error.to_string(),
            "rendering context: no EGL config matches the pixel format"
        );
    }

    #[test]
    fn flush_failures_keep_the_io_cause() {
        let error = ClientError::from(WaylandError::Io(io::Error::from(
            io::ErrorKind::BrokenPipe,
        )));
        assert!(matches!(error, ClientError::Flush(_)));
        assert!(error.to_string().starts_with("flushing requests failed"));
        assert!(error.source().is_some());
    }
}
