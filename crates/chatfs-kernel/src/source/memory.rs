//! In-memory chat source.
//!
//! Holds communities, channels, members and message histories in process.
//! Used by tests (with per-operation failure injection) and by the CLI,
//! which loads a JSON [`Snapshot`] of an account into it.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chatfs_types::{
    Attachment, Channel, ChannelId, Community, CommunityDetail, CommunityId, Embed, Member,
    Message, MessageId, Role, User, UserId,
};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ChatSource, SourceError, SourceResult};

/// Operations that can be made to fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Communities,
    Channels,
    Messages,
    Post,
    Member,
    Community,
}

#[derive(Debug)]
struct CommunityState {
    detail: CommunityDetail,
    channels: Vec<Channel>,
    members: HashMap<UserId, Member>,
}

#[derive(Debug)]
struct MemoryState {
    me: User,
    /// Communities in listing order.
    communities: Vec<CommunityState>,
    /// Message histories, most recent first.
    messages: HashMap<ChannelId, Vec<Message>>,
    next_message: u64,
    failing: HashSet<FailPoint>,
}

impl MemoryState {
    fn community(&self, id: CommunityId) -> Option<&CommunityState> {
        self.communities.iter().find(|c| c.detail.id == id)
    }

    fn community_mut(&mut self, id: CommunityId) -> Option<&mut CommunityState> {
        self.communities.iter_mut().find(|c| c.detail.id == id)
    }

    /// Community owning `channel`, if the channel is known at all.
    fn owner_of(&self, channel: ChannelId) -> Option<CommunityId> {
        self.communities
            .iter()
            .find(|c| c.channels.iter().any(|ch| ch.id == channel))
            .map(|c| c.detail.id)
    }

    fn check(&self, point: FailPoint) -> SourceResult<()> {
        if self.failing.contains(&point) {
            return Err(SourceError::unavailable(format!("injected failure: {:?}", point)));
        }
        Ok(())
    }
}

/// In-memory [`ChatSource`].
///
/// Thread-safe via an internal `RwLock`; no lock is held across an await.
#[derive(Debug)]
pub struct MemorySource {
    state: RwLock<MemoryState>,
}

impl MemorySource {
    /// Create an empty source whose posts are authored by `me`.
    pub fn new(me: User) -> Self {
        Self {
            state: RwLock::new(MemoryState {
                me,
                communities: Vec::new(),
                messages: HashMap::new(),
                next_message: 1,
                failing: HashSet::new(),
            }),
        }
    }

    /// Build a source from a snapshot.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let source = Self::new(snapshot.user);

        for community in snapshot.communities {
            let id = community.id;
            source.add_community(Community::new(id, community.name));
            source.set_roles(id, community.roles);
            for member in community.members {
                source.add_member(id, member);
            }
            for entry in community.channels {
                let channel_id = entry.channel.id;
                source.add_channel(id, entry.channel);
                for message in entry.messages {
                    source.push_message(message.into_message(channel_id, Some(id)));
                }
            }
        }

        source
    }

    /// Add a community. Re-adding a known ID is a no-op.
    pub fn add_community(&self, community: Community) {
        let mut state = self.state.write();
        if state.community(community.id).is_some() {
            return;
        }
        state.communities.push(CommunityState {
            detail: CommunityDetail {
                id: community.id,
                name: community.name,
                roles: Vec::new(),
            },
            channels: Vec::new(),
            members: HashMap::new(),
        });
    }

    /// Drop a community from future listings.
    pub fn remove_community(&self, id: CommunityId) {
        self.state.write().communities.retain(|c| c.detail.id != id);
    }

    /// Replace a community's role table.
    pub fn set_roles(&self, id: CommunityId, roles: Vec<Role>) {
        if let Some(community) = self.state.write().community_mut(id) {
            community.detail.roles = roles;
        }
    }

    /// Add a channel to a community. Unknown communities are ignored.
    pub fn add_channel(&self, id: CommunityId, channel: Channel) {
        if let Some(community) = self.state.write().community_mut(id) {
            community.channels.push(channel);
        }
    }

    /// Drop a channel from future listings. Its history is kept.
    pub fn remove_channel(&self, id: CommunityId, channel: ChannelId) {
        if let Some(community) = self.state.write().community_mut(id) {
            community.channels.retain(|c| c.id != channel);
        }
    }

    /// Register a member of a community.
    pub fn add_member(&self, id: CommunityId, member: Member) {
        if let Some(community) = self.state.write().community_mut(id) {
            community.members.insert(member.user.id, member);
        }
    }

    /// Append a message as the most recent one in its channel.
    pub fn push_message(&self, message: Message) {
        let mut state = self.state.write();
        state.next_message = state.next_message.max(message.id.get() + 1);
        state
            .messages
            .entry(message.channel_id)
            .or_default()
            .insert(0, message);
    }

    /// Make `point` fail until [`heal`](Self::heal) is called.
    pub fn fail(&self, point: FailPoint) {
        self.state.write().failing.insert(point);
    }

    /// Stop failing `point`.
    pub fn heal(&self, point: FailPoint) {
        self.state.write().failing.remove(&point);
    }
}

#[async_trait]
impl ChatSource for MemorySource {
    async fn communities(&self) -> SourceResult<Vec<Community>> {
        let state = self.state.read();
        state.check(FailPoint::Communities)?;

        Ok(state
            .communities
            .iter()
            .map(|c| Community::new(c.detail.id, c.detail.name.clone()))
            .collect())
    }

    async fn channels(&self, id: CommunityId) -> SourceResult<Vec<Channel>> {
        let state = self.state.read();
        state.check(FailPoint::Channels)?;

        state
            .community(id)
            .map(|c| c.channels.clone())
            .ok_or_else(|| SourceError::not_found(format!("community {}", id)))
    }

    async fn messages(&self, channel: ChannelId) -> SourceResult<Vec<Message>> {
        let state = self.state.read();
        state.check(FailPoint::Messages)?;

        if state.owner_of(channel).is_none() {
            return Err(SourceError::not_found(format!("channel {}", channel)));
        }
        Ok(state.messages.get(&channel).cloned().unwrap_or_default())
    }

    async fn post_message(&self, channel: ChannelId, text: &str) -> SourceResult<()> {
        let mut state = self.state.write();
        state.check(FailPoint::Post)?;

        let community_id = state
            .owner_of(channel)
            .ok_or_else(|| SourceError::not_found(format!("channel {}", channel)))?;

        let id = MessageId::new(state.next_message);
        state.next_message += 1;

        let message = Message {
            id,
            channel_id: channel,
            community_id: Some(community_id),
            author: state.me.clone(),
            content: text.to_string(),
            attachments: Vec::new(),
            embeds: Vec::new(),
            timestamp: Utc::now(),
        };
        state.messages.entry(channel).or_default().insert(0, message);

        debug!(%channel, %id, len = text.len(), "posted message");
        Ok(())
    }

    async fn member(&self, id: CommunityId, user: UserId) -> SourceResult<Member> {
        let state = self.state.read();
        state.check(FailPoint::Member)?;

        state
            .community(id)
            .and_then(|c| c.members.get(&user))
            .cloned()
            .ok_or_else(|| SourceError::not_found(format!("member {} of {}", user, id)))
    }

    async fn community(&self, id: CommunityId) -> SourceResult<CommunityDetail> {
        let state = self.state.read();
        state.check(FailPoint::Community)?;

        state
            .community(id)
            .map(|c| c.detail.clone())
            .ok_or_else(|| SourceError::not_found(format!("community {}", id)))
    }
}

// ============================================================================
// Snapshots
// ============================================================================

/// A serialized account: the user, and every community it can see.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub user: User,
    #[serde(default)]
    pub communities: Vec<SnapshotCommunity>,
}

/// One community within a [`Snapshot`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotCommunity {
    pub id: CommunityId,
    pub name: String,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub channels: Vec<SnapshotChannel>,
}

/// One channel within a [`SnapshotCommunity`], with its history listed
/// oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotChannel {
    #[serde(flatten)]
    pub channel: Channel,
    #[serde(default)]
    pub messages: Vec<SnapshotMessage>,
}

/// A message as written in a snapshot; channel and community are implied
/// by where it sits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMessage {
    pub id: MessageId,
    pub author: User,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub embeds: Vec<Embed>,
    pub timestamp: DateTime<Utc>,
}

impl SnapshotMessage {
    fn into_message(self, channel_id: ChannelId, community_id: Option<CommunityId>) -> Message {
        Message {
            id: self.id,
            channel_id,
            community_id,
            author: self.author,
            content: self.content,
            attachments: self.attachments,
            embeds: self.embeds,
            timestamp: self.timestamp,
        }
    }
}
