//! Node capabilities.
//!
//! A node is either a directory (the root, a community) or a file (a
//! channel). Transports don't inspect concrete types: they ask a [`Node`]
//! for its directory or file capability and dispatch on that.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use super::inode::Inode;
use super::types::{DirEntry, FileAttr, FileType};
use super::{FsError, FsResult};
use crate::tree::{ChannelFile, ChatFs, CommunityDir};

/// Directory capability.
#[async_trait]
pub trait DirectoryOps: Send + Sync {
    /// Refresh from the remote source, then list every known child.
    async fn list_entries(&self) -> FsResult<Vec<DirEntry>>;

    /// Find a known child by exact name. Does not refresh.
    async fn lookup(&self, name: &str) -> FsResult<Node>;
}

/// File capability. Whole-file semantics only: no offsets.
#[async_trait]
pub trait FileOps: Send + Sync {
    /// Render and return the full content.
    async fn read(&self) -> FsResult<Vec<u8>>;

    /// Submit `data` as new content. Returns the number of bytes accepted.
    async fn write(&self, data: &[u8]) -> FsResult<usize>;
}

/// A node of the tree.
#[derive(Clone)]
pub enum Node {
    Root(Arc<ChatFs>),
    Community(Arc<CommunityDir>),
    Channel(Arc<ChannelFile>),
}

impl Node {
    pub fn inode(&self) -> Inode {
        match self {
            Node::Root(fs) => fs.inode(),
            Node::Community(dir) => dir.inode(),
            Node::Channel(file) => file.inode(),
        }
    }

    /// Entry name; empty for the root.
    pub fn name(&self) -> &str {
        match self {
            Node::Root(_) => "",
            Node::Community(dir) => dir.name(),
            Node::Channel(file) => file.name(),
        }
    }

    pub fn kind(&self) -> FileType {
        match self {
            Node::Root(_) | Node::Community(_) => FileType::Directory,
            Node::Channel(_) => FileType::File,
        }
    }

    /// Current attributes. For channels this renders the content.
    pub async fn attributes(&self) -> FsResult<FileAttr> {
        match self {
            Node::Root(fs) => Ok(fs.attributes()),
            Node::Community(dir) => Ok(dir.attributes()),
            Node::Channel(file) => file.attributes().await,
        }
    }

    pub fn as_directory(&self) -> Option<&dyn DirectoryOps> {
        match self {
            Node::Root(fs) => Some(fs.as_ref()),
            Node::Community(dir) => Some(dir.as_ref()),
            Node::Channel(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&dyn FileOps> {
        match self {
            Node::Channel(file) => Some(file.as_ref()),
            _ => None,
        }
    }

    /// Open a file. The handle is the node itself.
    pub fn open(&self) -> FsResult<Node> {
        match self {
            Node::Channel(file) => Ok(Node::Channel(file.open())),
            other => Err(FsError::is_a_directory(other.name())),
        }
    }

    /// Directory capability, or `NotADirectory`.
    pub fn directory(&self) -> FsResult<&dyn DirectoryOps> {
        self.as_directory()
            .ok_or_else(|| FsError::not_a_directory(self.name()))
    }

    /// File capability, or `IsADirectory`.
    pub fn file(&self) -> FsResult<&dyn FileOps> {
        self.as_file()
            .ok_or_else(|| FsError::is_a_directory(self.name()))
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = match self {
            Node::Root(_) => "Root",
            Node::Community(_) => "Community",
            Node::Channel(_) => "Channel",
        };
        f.debug_struct(variant)
            .field("inode", &self.inode())
            .field("name", &self.name())
            .finish()
    }
}
