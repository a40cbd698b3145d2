//! # chatfs-kernel
//!
//! A chat account as a filesystem tree.
//!
//! The root lists communities as directories; each community lists its
//! text-bearing channels as files; reading a channel file renders its
//! message history as delimited text, one row per message, and writing to
//! it posts a message.
//!
//! - [`source`] - the remote collaborator contract ([`ChatSource`]) and an
//!   in-memory implementation
//! - [`tree`] - the nodes: [`ChatFs`], [`CommunityDir`], [`ChannelFile`]
//! - [`vfs`] - what a transport drives: [`Node`], capability traits, errors
//! - [`format`] - the shared [`Formatter`] (templates, pools, row encoding)
//! - [`config`] - rhai-script configuration

pub mod config;
pub mod format;
pub mod source;
pub mod tree;
pub mod vfs;

pub use config::{ChatFsConfig, ConfigError, load_config};
pub use format::{FormatError, FormatResult, Formatter, FormatterConfig, RenderOrder};
pub use source::{ChatSource, FailPoint, MemorySource, Snapshot, SourceError, SourceResult};
pub use tree::{ChannelFile, ChatFs, CommunityDir, FsShared, sanitize_name};
pub use vfs::{
    DirEntry, DirectoryOps, FileAttr, FileOps, FileType, FsError, FsResult, Inode, InodeAllocator,
    Node,
};
