//! Command implementations. Output goes to any `Write` so tests can capture it.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chatfs_kernel::{ChatFs, ChatFsConfig, FileType, MemorySource, Node, Snapshot};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Load the config script, if any, and apply command-line template overrides.
pub fn load_config(script: Option<&Path>, templates: Vec<String>) -> Result<ChatFsConfig> {
    let mut config = match script {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            chatfs_kernel::load_config(&text)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => ChatFsConfig::default(),
    };

    if !templates.is_empty() {
        debug!(count = templates.len(), "templates from command line");
        config.formatter.templates = templates;
    }
    // One-shot commands want a settled tree before they walk it.
    config.background_hydration = false;
    Ok(config)
}

/// Build the tree over a snapshot file.
pub async fn open(snapshot: &Path, config: &ChatFsConfig) -> Result<Arc<ChatFs>> {
    let text = std::fs::read_to_string(snapshot)
        .with_context(|| format!("failed to read snapshot {}", snapshot.display()))?;
    let snapshot: Snapshot = serde_json::from_str(&text)
        .with_context(|| format!("invalid snapshot {}", snapshot.display()))?;

    info!(user = %snapshot.user.username, communities = snapshot.communities.len(), "loaded snapshot");
    let source = Arc::new(MemorySource::from_snapshot(snapshot));
    ChatFs::new(source, config)
        .await
        .context("failed to build tree")
}

pub async fn ls(fs: &Arc<ChatFs>, path: &str, out: &mut impl Write) -> Result<()> {
    let node = fs.walk(path).await?;
    match node.as_directory() {
        Some(dir) => {
            for entry in dir.list_entries().await? {
                let suffix = if entry.kind.is_dir() { "/" } else { "" };
                writeln!(out, "{}{}", entry.name, suffix)?;
            }
        }
        None => writeln!(out, "{}", node.name())?,
    }
    Ok(())
}

pub async fn cat(fs: &Arc<ChatFs>, path: &str, out: &mut impl Write) -> Result<()> {
    let node = fs.walk(path).await?.open()?;
    let bytes = node.file()?.read().await?;
    out.write_all(&bytes)?;
    Ok(())
}

pub async fn stat(fs: &Arc<ChatFs>, path: &str, out: &mut impl Write) -> Result<()> {
    let node = fs.walk(path).await?;
    let attr = node.attributes().await?;
    let kind = match attr.kind {
        FileType::File => "file",
        FileType::Directory => "directory",
    };

    writeln!(out, "  name: {}", display_name(&node))?;
    writeln!(out, " inode: {}", attr.inode)?;
    writeln!(out, "  kind: {}", kind)?;
    writeln!(out, "  size: {}", attr.size)?;
    writeln!(out, "  perm: {:o}", attr.perm)?;
    writeln!(out, " mtime: {}", DateTime::<Utc>::from(attr.mtime).to_rfc3339())?;
    writeln!(out, "crtime: {}", DateTime::<Utc>::from(attr.crtime).to_rfc3339())?;
    Ok(())
}

pub async fn post(fs: &Arc<ChatFs>, path: &str, text: &str, out: &mut impl Write) -> Result<()> {
    let node = fs.walk(path).await?.open()?;
    let written = node.file()?.write(text.as_bytes()).await?;
    writeln!(out, "posted {} bytes to {}", written, node.name())?;
    Ok(())
}

fn display_name(node: &Node) -> &str {
    match node {
        Node::Root(_) => "/",
        other => other.name(),
    }
}
