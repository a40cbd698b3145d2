//! Remote chat record types for chatfs.
//!
//! This crate is the leaf of the workspace: typed snowflake IDs and the
//! records the remote session client hands back. It has **no internal chatfs
//! dependencies**.
//!
//! ```text
//! Community (CommunityId)  → directory
//!     └── CommunityDetail (roles, for display colors)
//!     └── Member (UserId, nickname, role_ids)
//!     └── Channel (ChannelId, kind) → file, when text-bearing
//!           └── Message (MessageId, author, content, attachments, embeds)
//! ```

pub mod chat;
pub mod ids;

pub use chat::{
    Attachment, Channel, ChannelKind, Community, CommunityDetail, Embed, EmbedField, Member,
    Message, Role, User, member_color,
};
pub use ids::{ChannelId, CommunityId, MessageId, RoleId, UserId};
