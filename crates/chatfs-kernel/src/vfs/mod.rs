//! Virtual filesystem contract.
//!
//! This module provides the node-level contract a filesystem transport
//! (FUSE, 9P, ...) drives:
//!
//! - [`Node`] - Tagged node: root, community directory, or channel file
//! - [`DirectoryOps`] / [`FileOps`] - Capabilities a node may expose
//! - [`InodeAllocator`] - Stable, never-reused inode numbers
//! - [`FsError`] - Errors, convertible to `std::io::Error` for errno replies
//!
//! ## Design Decisions
//!
//! - **Inodes, not paths**: every node gets an inode at creation and keeps
//!   it for the session, so transports can cache by number.
//! - **Whole-file I/O**: channel files are rendered in full on every read;
//!   there are no offsets or partial writes.
//! - **Capability dispatch**: transports call `as_directory()` /
//!   `as_file()` instead of matching on concrete node types.

mod error;
mod inode;
mod ops;
mod types;

pub use error::{FsError, FsResult};
pub use inode::{Inode, InodeAllocator};
pub use ops::{DirectoryOps, FileOps, Node};
pub use types::{DirEntry, FileAttr, FileType};
