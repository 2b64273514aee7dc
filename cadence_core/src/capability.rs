// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Selection of the compositor globals the client binds.
//!
//! The compositor advertises every global it supports. The client binds
//! exactly two of them and discards the rest:
//!
//! | Capability | Interface | Highest version bound |
//! |---|---|---|
//! | [`Capability::Compositor`] | `wl_compositor` | 4 |
//! | [`Capability::Shell`] | `xdg_wm_base` | 1 |
//!
//! [`CapabilityBinder`] only decides *what* to bind. Issuing the bind request
//! and waiting on the round-trip barrier is the platform crate's job; once the
//! barrier returns, [`CapabilityBinder::require`] turns an absent global into
//! a fatal [`MissingCapability`] error.

use core::fmt;

/// A compositor service the client cannot run without.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Surface allocation (`wl_compositor`).
    Compositor,
    /// Desktop shell (`xdg_wm_base`).
    Shell,
}

impl Capability {
    /// All required capabilities, in binding order.
    pub const ALL: [Self; 2] = [Self::Compositor, Self::Shell];

    /// Protocol interface name advertised by the registry.
    #[must_use]
    pub const fn interface(self) -> &'static str {
        match self {
            Self::Compositor => "wl_compositor",
            Self::Shell => "xdg_wm_base",
        }
    }

    /// Highest interface version the client understands.
    #[must_use]
    pub const fn max_version(self) -> u32 {
        match self {
            Self::Compositor => 4,
            Self::Shell => 1,
        }
    }

    /// Looks up the capability for an advertised interface name.
    #[must_use]
    pub fn from_interface(interface: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|capability| capability.interface() == interface)
    }
}

/// A bind decision returned by [`CapabilityBinder::offer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Bind {
    /// Which capability to bind.
    pub capability: Capability,
    /// Registry name of the global.
    pub name: u32,
    /// Version to request: the lower of advertised and supported.
    pub version: u32,
}

/// Error returned when the compositor does not advertise a required global.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MissingCapability(pub Capability);

impl fmt::Display for MissingCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "compositor does not advertise required global `{}`",
            self.0.interface()
        )
    }
}

impl core::error::Error for MissingCapability {}

/// Tracks registry advertisements and decides which globals to bind.
#[derive(Clone, Debug, Default)]
pub struct CapabilityBinder {
    compositor: Option<u32>,
    shell: Option<u32>,
    discarded: u32,
}

impl CapabilityBinder {
    /// Creates a binder with nothing bound.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            compositor: None,
            shell: None,
            discarded: 0,
        }
    }

    /// Handles one registry advertisement.
    ///
    /// Returns the bind to issue for a required capability seen for the first
    /// time. Unrelated globals and repeat advertisements return [`None`].
    pub fn offer(&mut self, name: u32, interface: &str, version: u32) -> Option<Bind> {
        let Some(capability) = Capability::from_interface(interface) else {
            self.discarded += 1;
            return None;
        };
        let slot = self.slot_mut(capability);
        if slot.is_some() {
            tracing::trace!(interface, name, "ignoring repeated advertisement");
            return None;
        }
        *slot = Some(name);
        Some(Bind {
            capability,
            name,
            version: version.min(capability.max_version()),
        })
    }

    /// Handles a registry removal.
    ///
    /// Returns the capability whose global disappeared, if it was bound. The
    /// bound handle stays owned until teardown; the compositor simply stops
    /// honouring new requests on it.
    pub fn withdraw(&mut self, name: u32) -> Option<Capability> {
        Capability::ALL
            .into_iter()
            .find(|capability| self.bound_name(*capability) == Some(name))
    }

    /// Registry name of a bound capability.
    #[must_use]
    pub fn bound_name(&self, capability: Capability) -> Option<u32> {
        match capability {
            Capability::Compositor => self.compositor,
            Capability::Shell => self.shell,
        }
    }

    /// Number of advertised globals that were not required.
    #[must_use]
    pub fn discarded(&self) -> u32 {
        self.discarded
    }

    /// Checks that every required capability was bound.
    ///
    /// # Errors
    ///
    /// Returns [`MissingCapability`] for the first required global that the
    /// compositor never advertised.
    pub fn require(&self) -> Result<(), MissingCapability> {
        match Capability::ALL
            .into_iter()
            .find(|capability| self.bound_name(*capability).is_none())
        {
            Some(missing) => Err(MissingCapability(missing)),
            None => Ok(()),
        }
    }

    fn slot_mut(&mut self, capability: Capability) -> &mut Option<u32> {
        match capability {
            Capability::Compositor => &mut self.compositor,
            Capability::Shell => &mut self.shell,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Bind, Capability, CapabilityBinder, MissingCapability};

    #[test]
    fn binds_required_globals_and_discards_others() {
        let mut binder = CapabilityBinder::new();

        assert_eq!(binder.offer(1, "wl_shm", 1), None);
        assert_eq!(
            binder.offer(2, "wl_compositor", 6),
            Some(Bind {
                capability: Capability::Compositor,
                name: 2,
                version: 4,
            })
        );
        assert_eq!(binder.offer(3, "wl_seat", 9), None);
        assert_eq!(
            binder.offer(4, "xdg_wm_base", 6),
            Some(Bind {
                capability: Capability::Shell,
                name: 4,
                version: 1,
            })
        );

        assert_eq!(binder.discarded(), 2);
        assert_eq!(binder.require(), Ok(()));
    }

    #[test]
    fn version_is_capped_but_never_raised() {
        let mut binder = CapabilityBinder::new();
        let bind = binder.offer(7, "wl_compositor", 3).unwrap();
        assert_eq!(bind.version, 3);
    }

    #[test]
    fn first_advertisement_wins() {
        let mut binder = CapabilityBinder::new();
        assert!(binder.offer(1, "xdg_wm_base", 1).is_some());
        assert_eq!(binder.offer(9, "xdg_wm_base", 1), None);
        assert_eq!(binder.bound_name(Capability::Shell), Some(1));
    }

    #[test]
    fn missing_shell_is_reported() {
        let mut binder = CapabilityBinder::new();
        let _ = binder.offer(1, "wl_compositor", 4);
        assert_eq!(
            binder.require(),
            Err(MissingCapability(Capability::Shell))
        );
    }

    #[test]
    fn empty_registry_reports_compositor_first() {
        let binder = CapabilityBinder::new();
        assert_eq!(
            binder.require(),
            Err(MissingCapability(Capability::Compositor))
        );
    }

    #[test]
    fn withdraw_reports_only_bound_globals() {
        let mut binder = CapabilityBinder::new();
        let _ = binder.offer(5, "wl_compositor", 4);
        assert_eq!(binder.withdraw(5), Some(Capability::Compositor));
        assert_eq!(binder.withdraw(6), None);
    }

    #[test]
    fn interface_lookup_round_trips() {
        for capability in Capability::ALL {
            assert_eq!(
                Capability::from_interface(capability.interface()),
                Some(capability)
            );
        }
        assert_eq!(Capability::from_interface("wl_output"), None);
    }
}
