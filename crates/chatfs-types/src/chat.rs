//! Remote chat records.
//!
//! These mirror what the remote session client hands back: communities and
//! their channels, members with role assignments, and messages with their
//! attachments and embeds. They are plain data; nothing here talks to the
//! network.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::EnumString;

use crate::ids::{ChannelId, CommunityId, MessageId, RoleId, UserId};

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

impl User {
    pub fn new(id: impl Into<UserId>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
        }
    }
}

/// A community (guild/server) as listed by the remote source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
    pub id: CommunityId,
    pub name: String,
}

impl Community {
    pub fn new(id: impl Into<CommunityId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A role defined within a community.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    #[serde(default)]
    pub name: String,
    /// 24-bit RGB color; zero means "no color".
    #[serde(default)]
    pub color: u32,
    /// Higher positions sit above lower ones in the role hierarchy.
    #[serde(default)]
    pub position: i32,
}

/// Full community detail, including the role table used for colors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityDetail {
    pub id: CommunityId,
    pub name: String,
    #[serde(default)]
    pub roles: Vec<Role>,
}

/// A user's membership in a community.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user: User,
    /// Per-community nickname, if one is set.
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub role_ids: Vec<RoleId>,
}

impl Member {
    /// The name shown for this member: nickname when set and non-empty,
    /// otherwise the account username.
    pub fn display_name(&self) -> &str {
        match self.nickname.as_deref() {
            Some(nick) if !nick.is_empty() => nick,
            _ => &self.user.username,
        }
    }
}

/// Effective display color of a member within a community.
///
/// Picks the highest-positioned role the member holds that carries a
/// non-zero color. Returns zero when no held role has a color.
pub fn member_color(community: &CommunityDetail, member: &Member) -> u32 {
    let mut color = 0;
    let mut position = 0;

    for role in &community.roles {
        if !member.role_ids.contains(&role.id) {
            continue;
        }
        if role.color > 0 && role.position > position {
            color = role.color;
            position = role.position;
        }
    }

    color
}

/// Kind of a remote channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum ChannelKind {
    /// Plain text channel inside a community.
    #[strum(serialize = "text")]
    Text,
    /// One-to-one direct message.
    #[serde(rename = "dm")]
    #[strum(serialize = "dm", serialize = "direct_message")]
    DirectMessage,
    #[strum(serialize = "voice")]
    Voice,
    /// Multi-party direct message.
    #[serde(rename = "group_dm")]
    #[strum(serialize = "group_dm", serialize = "group_direct_message")]
    GroupDirectMessage,
    #[strum(serialize = "category")]
    Category,
    #[strum(serialize = "news")]
    News,
    #[strum(serialize = "stage")]
    Stage,
    #[strum(serialize = "forum")]
    Forum,
}

impl ChannelKind {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Text => "text",
            ChannelKind::DirectMessage => "dm",
            ChannelKind::Voice => "voice",
            ChannelKind::GroupDirectMessage => "group_dm",
            ChannelKind::Category => "category",
            ChannelKind::News => "news",
            ChannelKind::Stage => "stage",
            ChannelKind::Forum => "forum",
        }
    }

    /// Whether channels of this kind carry a readable message history.
    pub fn is_text_bearing(&self) -> bool {
        matches!(
            self,
            ChannelKind::Text | ChannelKind::DirectMessage | ChannelKind::GroupDirectMessage
        )
    }

    /// Whether this is a direct-message kind (named by its participants).
    pub fn is_direct(&self) -> bool {
        matches!(
            self,
            ChannelKind::DirectMessage | ChannelKind::GroupDirectMessage
        )
    }
}

/// A channel as listed by the remote source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub kind: ChannelKind,
    #[serde(default)]
    pub name: String,
    /// Parent category, when the channel is filed under one.
    #[serde(default)]
    pub category: Option<ChannelId>,
    #[serde(default)]
    pub position: i32,
    /// Recipients of a direct-message channel.
    #[serde(default)]
    pub participants: Vec<User>,
}

impl Channel {
    /// Create a plain text channel.
    pub fn text(id: impl Into<ChannelId>, name: impl Into<String>) -> Self {
        Self::new(id, ChannelKind::Text, name)
    }

    pub fn new(id: impl Into<ChannelId>, kind: ChannelKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            category: None,
            position: 0,
            participants: Vec::new(),
        }
    }

    pub fn with_position(mut self, position: i32) -> Self {
        self.position = position;
        self
    }

    pub fn with_category(mut self, category: impl Into<ChannelId>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_participants(mut self, participants: Vec<User>) -> Self {
        self.participants = participants;
        self
    }
}

/// A file attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub filename: String,
    pub url: String,
}

/// One name/value field inside an embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

/// Rich embed attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
}

/// A chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub channel_id: ChannelId,
    /// Owning community; `None` for direct messages.
    #[serde(default)]
    pub community_id: Option<CommunityId>,
    pub author: User,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub embeds: Vec<Embed>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Message text followed by each attachment URL, space separated.
    pub fn content_with_attachments(&self) -> String {
        let mut out = String::with_capacity(
            self.content.len() + self.attachments.iter().map(|a| a.url.len() + 1).sum::<usize>(),
        );
        out.push_str(&self.content);
        for attachment in &self.attachments {
            out.push(' ');
            out.push_str(&attachment.url);
        }
        out
    }
}
