//! Community directories.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chatfs_types::{Community, CommunityId};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{ChannelFile, FsShared, sanitize_name};
use crate::vfs::{DirEntry, DirectoryOps, FileAttr, FsError, FsResult, Inode, Node};

/// One remote community, exposed as a directory of channel files.
pub struct CommunityDir {
    inode: Inode,
    id: CommunityId,
    name: String,
    shared: Arc<FsShared>,
    channels: Mutex<Vec<Arc<ChannelFile>>>,
}

impl CommunityDir {
    pub(crate) fn new(shared: Arc<FsShared>, community: &Community) -> Self {
        Self {
            inode: shared.next_inode(),
            id: community.id,
            name: sanitize_name(&community.name),
            shared,
            channels: Mutex::new(Vec::new()),
        }
    }

    pub fn inode(&self) -> Inode {
        self.inode
    }

    pub fn id(&self) -> CommunityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> FileAttr {
        FileAttr::directory(self.inode, self.shared.created())
    }

    /// Known channels, in discovery order. Does not refresh.
    pub async fn channels(&self) -> Vec<Arc<ChannelFile>> {
        self.channels.lock().await.clone()
    }

    /// Fetch the channel list and append channels not seen before.
    ///
    /// Only text, direct-message and group direct-message channels are
    /// admitted. Returns how many were added.
    pub async fn refresh_channels(&self) -> FsResult<usize> {
        let mut channels = self.channels.lock().await;

        let remote = self
            .shared
            .source()
            .channels(self.id)
            .await
            .map_err(|e| FsError::remote_fetch(format!("channels of {}", self.name), e))?;

        let mut known: HashSet<_> = channels.iter().map(|c| c.id()).collect();
        let before = channels.len();

        for channel in &remote {
            if !channel.kind.is_text_bearing() {
                continue;
            }
            if !known.insert(channel.id) {
                continue;
            }
            channels.push(Arc::new(ChannelFile::new(self.shared.clone(), channel)));
        }

        let added = channels.len() - before;
        if added > 0 {
            info!(community = %self.id, added, total = channels.len(), "discovered channels");
        } else {
            debug!(community = %self.id, total = channels.len(), "no new channels");
        }
        Ok(added)
    }
}

#[async_trait]
impl DirectoryOps for CommunityDir {
    async fn list_entries(&self) -> FsResult<Vec<DirEntry>> {
        self.refresh_channels().await?;

        let channels = self.channels.lock().await;
        Ok(channels.iter().map(|c| DirEntry::file(c.name())).collect())
    }

    async fn lookup(&self, name: &str) -> FsResult<Node> {
        let channels = self.channels.lock().await;
        channels
            .iter()
            .find(|c| c.name() == name)
            .map(|c| Node::Channel(c.clone()))
            .ok_or_else(|| FsError::not_found(name))
    }
}

impl fmt::Debug for CommunityDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommunityDir")
            .field("inode", &self.inode)
            .field("id", &self.id)
            .field("name", &self.name)
            .field("channels", &"<locked>")
            .finish()
    }
}
