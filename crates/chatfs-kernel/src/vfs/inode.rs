//! Inode numbering for tree nodes.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Inode number of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Inode(u64);

impl Inode {
    /// The raw inode number.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<Inode> for u64 {
    fn from(ino: Inode) -> u64 {
        ino.0
    }
}

impl fmt::Display for Inode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out inode numbers.
///
/// Numbers start at 1 (the root, by FUSE convention), strictly increase,
/// and are never reused. Safe to share between any number of callers.
#[derive(Debug, Default)]
pub struct InodeAllocator {
    last: AtomicU64,
}

impl InodeAllocator {
    /// Create an allocator whose first number is 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next inode number.
    pub fn next(&self) -> Inode {
        Inode(self.last.fetch_add(1, Ordering::Relaxed) + 1)
    }
}
