//! Core VFS types.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use super::inode::Inode;

/// File type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

impl FileType {
    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, FileType::File)
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, FileType::Directory)
    }
}

/// File attributes (metadata).
#[derive(Debug, Clone)]
pub struct FileAttr {
    pub inode: Inode,
    /// Size in bytes; zero for directories.
    pub size: u64,
    pub kind: FileType,
    /// Unix permissions (e.g., 0o664).
    pub perm: u32,
    /// Last modification time.
    pub mtime: SystemTime,
    /// Status change time.
    pub ctime: SystemTime,
    /// Creation time.
    pub crtime: SystemTime,
    /// Number of hard links.
    pub nlink: u32,
}

impl FileAttr {
    /// Attributes for a channel file.
    pub fn file(inode: Inode, size: u64, mtime: SystemTime, created: SystemTime) -> Self {
        Self {
            inode,
            size,
            kind: FileType::File,
            perm: 0o664,
            mtime,
            ctime: created,
            crtime: created,
            nlink: 1,
        }
    }

    /// Attributes for a directory.
    pub fn directory(inode: Inode, created: SystemTime) -> Self {
        Self {
            inode,
            size: 0,
            kind: FileType::Directory,
            perm: 0o755,
            mtime: created,
            ctime: created,
            crtime: created,
            nlink: 2, // . and ..
        }
    }

    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }
}

/// Directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Entry name (not full path).
    pub name: String,
    /// Entry type.
    pub kind: FileType,
}

impl DirEntry {
    /// Create a file entry.
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FileType::File,
        }
    }

    /// Create a directory entry.
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FileType::Directory,
        }
    }
}
