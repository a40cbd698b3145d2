//! Typed snowflake identifiers for remote chat entities.
//!
//! The remote service hands out 64-bit snowflakes for every entity. Each kind
//! gets its own newtype so a channel ID can never be passed where a community
//! ID is expected. They're transparent on the wire (plain integers) and
//! display as the bare number for logging.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A community (guild/server) identifier.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommunityId(u64);

/// A channel identifier.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(u64);

/// A message identifier.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(u64);

/// A user (account) identifier.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

/// A role identifier.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(u64);

// ── Shared behavior ─────────────────────────────────────────────────────────

macro_rules! impl_snowflake_id {
    ($T:ident, $name:literal) => {
        impl $T {
            /// Wrap a raw snowflake.
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// The raw snowflake value.
            pub const fn get(&self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $T {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl From<$T> for u64 {
            fn from(id: $T) -> u64 {
                id.0
            }
        }

        impl FromStr for $T {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }

        impl fmt::Display for $T {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl fmt::Debug for $T {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $name, self.0)
            }
        }
    };
}

impl_snowflake_id!(CommunityId, "CommunityId");
impl_snowflake_id!(ChannelId, "ChannelId");
impl_snowflake_id!(MessageId, "MessageId");
impl_snowflake_id!(UserId, "UserId");
impl_snowflake_id!(RoleId, "RoleId");
