//! The filesystem root.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{CommunityDir, FsShared};
use crate::config::ChatFsConfig;
use crate::format::Formatter;
use crate::source::ChatSource;
use crate::vfs::{DirEntry, DirectoryOps, FileAttr, FsError, FsResult, Inode, Node};

/// Root of one session's tree: a directory of communities.
pub struct ChatFs {
    inode: Inode,
    shared: Arc<FsShared>,
    background_hydration: bool,
    communities: Mutex<Vec<Arc<CommunityDir>>>,
}

impl ChatFs {
    /// Build the tree and list communities once.
    ///
    /// Fails if the templates don't compile or the source can't be reached;
    /// a session that can't list communities is not worth mounting.
    pub async fn new(source: Arc<dyn ChatSource>, config: &ChatFsConfig) -> FsResult<Arc<Self>> {
        let formatter = Arc::new(Formatter::new(source.clone(), &config.formatter)?);
        let shared = Arc::new(FsShared::new(source, formatter));

        let fs = Arc::new(Self {
            inode: shared.next_inode(),
            shared,
            background_hydration: config.background_hydration,
            communities: Mutex::new(Vec::new()),
        });
        fs.refresh_communities().await?;
        Ok(fs)
    }

    pub fn inode(&self) -> Inode {
        self.inode
    }

    pub fn attributes(&self) -> FileAttr {
        FileAttr::directory(self.inode, self.shared.created())
    }

    /// The root as a node.
    pub fn root(self: &Arc<Self>) -> Node {
        Node::Root(self.clone())
    }

    pub fn formatter(&self) -> &Arc<Formatter> {
        self.shared.formatter()
    }

    pub fn shared(&self) -> &Arc<FsShared> {
        &self.shared
    }

    /// Known communities, in discovery order. Does not refresh.
    pub async fn communities(&self) -> Vec<Arc<CommunityDir>> {
        self.communities.lock().await.clone()
    }

    /// Fetch the community list and append communities not seen before.
    ///
    /// Each new community's channels are hydrated in a background task
    /// (or inline, when background hydration is off). Returns how many
    /// communities were added.
    pub async fn refresh_communities(&self) -> FsResult<usize> {
        let mut communities = self.communities.lock().await;

        let remote = self
            .shared
            .source()
            .communities()
            .await
            .map_err(|e| FsError::remote_fetch("communities", e))?;

        let mut known: HashSet<_> = communities.iter().map(|c| c.id()).collect();
        let mut discovered = Vec::new();

        for community in &remote {
            if !known.insert(community.id) {
                continue;
            }
            let dir = Arc::new(CommunityDir::new(self.shared.clone(), community));
            communities.push(dir.clone());
            discovered.push(dir);
        }

        if discovered.is_empty() {
            debug!(total = communities.len(), "no new communities");
            return Ok(0);
        }
        info!(added = discovered.len(), total = communities.len(), "discovered communities");

        let added = discovered.len();
        if self.background_hydration {
            for dir in discovered {
                tokio::spawn(hydrate(dir));
            }
        } else {
            join_all(discovered.into_iter().map(hydrate)).await;
        }
        Ok(added)
    }

    /// Resolve a `/`-separated path the way a shell would through a
    /// transport: list each directory, then look the component up.
    pub async fn walk(self: &Arc<Self>, path: &str) -> FsResult<Node> {
        let mut node = self.root();
        for component in path.split('/').filter(|c| !c.is_empty()) {
            let dir = node.directory()?;
            dir.list_entries().await?;
            let child = dir.lookup(component).await?;
            node = child;
        }
        Ok(node)
    }
}

async fn hydrate(dir: Arc<CommunityDir>) {
    if let Err(e) = dir.refresh_channels().await {
        warn!(community = %dir.id(), "channel hydration failed: {}", e);
    }
}

#[async_trait]
impl DirectoryOps for ChatFs {
    async fn list_entries(&self) -> FsResult<Vec<DirEntry>> {
        self.refresh_communities().await?;

        let communities = self.communities.lock().await;
        Ok(communities
            .iter()
            .map(|c| DirEntry::directory(c.name()))
            .collect())
    }

    async fn lookup(&self, name: &str) -> FsResult<Node> {
        let communities = self.communities.lock().await;
        communities
            .iter()
            .find(|c| c.name() == name)
            .map(|c| Node::Community(c.clone()))
            .ok_or_else(|| FsError::not_found(name))
    }
}

impl fmt::Debug for ChatFs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatFs")
            .field("inode", &self.inode)
            .field("shared", &self.shared)
            .field("communities", &"<locked>")
            .finish()
    }
}
