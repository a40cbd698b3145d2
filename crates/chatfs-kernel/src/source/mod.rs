//! Remote chat data source.
//!
//! The tree never talks to the network itself. Everything it knows about
//! communities, channels and messages comes through [`ChatSource`], which is
//! implemented by whatever session client the bootstrap layer wires in. That
//! client owns caching, authentication and connection lifecycle; the tree
//! calls it on every listing and never retries on its own.
//!
//! [`MemorySource`] is an in-process implementation used by tests and by the
//! snapshot-backed CLI.

mod memory;

pub use memory::{
    FailPoint, MemorySource, Snapshot, SnapshotChannel, SnapshotCommunity, SnapshotMessage,
};

use async_trait::async_trait;
use chatfs_types::{
    Channel, ChannelId, Community, CommunityDetail, CommunityId, Member, Message, UserId,
};
use thiserror::Error;

/// Errors reported by a remote source.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// The remote service could not be reached or timed out.
    #[error("remote unavailable: {0}")]
    Unavailable(String),

    /// The requested entity does not exist remotely.
    #[error("not found remotely: {0}")]
    NotFound(String),

    /// The remote service refused the request.
    #[error("rejected by remote: {0}")]
    Rejected(String),
}

impl SourceError {
    /// Create an Unavailable error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a NotFound error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a Rejected error.
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }
}

/// Source result type.
pub type SourceResult<T> = Result<T, SourceError>;

/// Remote chat operations consumed by the filesystem tree.
///
/// Listing calls return the full current set every time; the tree merges
/// them with what it already knows. Message history is returned most recent
/// first.
#[async_trait]
pub trait ChatSource: Send + Sync {
    // ========================================================================
    // Listing
    // ========================================================================

    /// All communities visible to the session.
    async fn communities(&self) -> SourceResult<Vec<Community>>;

    /// All channels of one community, of every kind.
    async fn channels(&self, community: CommunityId) -> SourceResult<Vec<Channel>>;

    /// Full fetched message history of a channel, most recent first.
    async fn messages(&self, channel: ChannelId) -> SourceResult<Vec<Message>>;

    // ========================================================================
    // Writing
    // ========================================================================

    /// Post `text` as a new message in `channel`.
    async fn post_message(&self, channel: ChannelId, text: &str) -> SourceResult<()>;

    // ========================================================================
    // Cosmetic lookups (used only for display formatting)
    // ========================================================================

    /// A user's membership record in a community.
    async fn member(&self, community: CommunityId, user: UserId) -> SourceResult<Member>;

    /// Community detail, including its role table.
    async fn community(&self, community: CommunityId) -> SourceResult<CommunityDetail>;
}
