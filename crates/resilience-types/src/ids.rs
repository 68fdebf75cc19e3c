//! Type-safe identifiers for swarm members, subscribers, and disasters.
//!
//! Agents are addressed by a small positional integer in `[1, N]` so the
//! id doubles as the grid coordinate. Subscribers and disaster reports are
//! minted at runtime and use UUID v7 (time-ordered) wrappers.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

define_id! {
    /// Identifier for one connected observer on the streaming channel.
    SubscriberId
}

define_id! {
    /// Identifier assigned to a reported disaster.
    DisasterId
}

/// Positional identifier of a swarm member.
///
/// Valid ids form the contiguous range `[1, N]` where `N` is the
/// configured swarm size. Construction does not validate the range;
/// the registry rejects ids outside it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct AgentId(pub u32);

impl AgentId {
    /// Return the raw integer id.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Zero-based position of this id in a registry of any size.
    ///
    /// Returns `None` for id `0`, which is never valid.
    pub const fn index(self) -> Option<usize> {
        match self.0.checked_sub(1) {
            Some(i) => Some(i as usize),
            None => None,
        }
    }
}

impl core::fmt::Display for AgentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for AgentId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}
