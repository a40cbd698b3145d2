//! The chat tree: root, community directories, channel files.
//!
//! ```text
//! /                      ChatFs        (one per session)
//! ├── lounge/            CommunityDir  (one per community)
//! │   ├── general        ChannelFile   (text, dm, group dm only)
//! │   └── random
//! └── ops/
//!     └── alerts
//! ```
//!
//! Collections only grow. An entry observed once keeps its position, name
//! and inode for the life of the session, even if the remote side later
//! stops listing it; new entries append in remote order.
//!
//! Every node holds an `Arc<FsShared>` for the services it delegates to:
//! the remote source, the shared formatter, the inode allocator and the
//! session's creation time.

mod channel;
mod community;
mod root;

pub use channel::ChannelFile;
pub use community::CommunityDir;
pub use root::ChatFs;

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use crate::format::Formatter;
use crate::source::ChatSource;
use crate::vfs::{Inode, InodeAllocator};

/// Make a remote display name safe as a path component.
///
/// Path separators and NUL become `_`. Idempotent.
pub fn sanitize_name(name: &str) -> String {
    name.replace(['/', '\0'], "_")
}

/// Services shared by every node of one tree.
pub struct FsShared {
    source: Arc<dyn ChatSource>,
    formatter: Arc<Formatter>,
    inodes: InodeAllocator,
    created: SystemTime,
}

impl FsShared {
    pub fn new(source: Arc<dyn ChatSource>, formatter: Arc<Formatter>) -> Self {
        Self {
            source,
            formatter,
            inodes: InodeAllocator::new(),
            created: SystemTime::now(),
        }
    }

    pub fn source(&self) -> &Arc<dyn ChatSource> {
        &self.source
    }

    pub fn formatter(&self) -> &Arc<Formatter> {
        &self.formatter
    }

    /// Allocate an inode for a new node.
    pub fn next_inode(&self) -> Inode {
        self.inodes.next()
    }

    /// When the tree was created; reported as every node's creation time.
    pub fn created(&self) -> SystemTime {
        self.created
    }
}

impl fmt::Debug for FsShared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsShared")
            .field("formatter", &self.formatter)
            .field("inodes", &self.inodes)
            .field("created", &self.created)
            .finish_non_exhaustive()
    }
}
