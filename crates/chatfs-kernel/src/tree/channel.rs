//! Channel files.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use chatfs_types::{Channel, ChannelId, ChannelKind};
use tracing::debug;

use super::{FsShared, sanitize_name};
use crate::vfs::{FileAttr, FileOps, FsError, FsResult, Inode};

/// A text-bearing channel, exposed as a file of rendered rows.
///
/// Reads render the full history every time. The last render's size and
/// time are kept as advisory metadata; concurrent renders may race on them.
pub struct ChannelFile {
    inode: Inode,
    id: ChannelId,
    kind: ChannelKind,
    category: Option<ChannelId>,
    position: i32,
    name: String,
    shared: Arc<FsShared>,
    last_size: AtomicU64,
    /// Nanoseconds since the epoch; zero until the first render.
    last_modified: AtomicU64,
}

impl ChannelFile {
    pub(crate) fn new(shared: Arc<FsShared>, channel: &Channel) -> Self {
        Self {
            inode: shared.next_inode(),
            id: channel.id,
            kind: channel.kind,
            category: channel.category,
            position: channel.position,
            name: sanitize_name(&display_name(channel)),
            shared,
            last_size: AtomicU64::new(0),
            last_modified: AtomicU64::new(0),
        }
    }

    pub fn inode(&self) -> Inode {
        self.inode
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn category(&self) -> Option<ChannelId> {
        self.category
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Byte length of the last successful render.
    pub fn last_size(&self) -> u64 {
        self.last_size.load(Ordering::Relaxed)
    }

    /// Time of the last successful render, or the tree's creation time.
    pub fn last_modified(&self) -> SystemTime {
        match self.last_modified.load(Ordering::Relaxed) {
            0 => self.shared.created(),
            nanos => UNIX_EPOCH + Duration::from_nanos(nanos),
        }
    }

    /// Render, then report size and mtime of that render.
    pub async fn attributes(&self) -> FsResult<FileAttr> {
        self.render().await?;
        Ok(FileAttr::file(
            self.inode,
            self.last_size(),
            self.last_modified(),
            self.shared.created(),
        ))
    }

    /// Open the file. The handle is the file itself.
    pub fn open(self: &Arc<Self>) -> Arc<Self> {
        self.clone()
    }

    async fn render(&self) -> FsResult<Vec<u8>> {
        let messages = self
            .shared
            .source()
            .messages(self.id)
            .await
            .map_err(|e| FsError::remote_fetch(format!("messages of {}", self.name), e))?;

        let text = self.shared.formatter().render_records(&messages).await?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(1);
        self.last_size.store(text.len() as u64, Ordering::Relaxed);
        self.last_modified.store(now.max(1), Ordering::Relaxed);

        debug!(channel = %self.id, messages = messages.len(), bytes = text.len(), "rendered channel");
        Ok(text.into_bytes())
    }
}

#[async_trait]
impl FileOps for ChannelFile {
    async fn read(&self) -> FsResult<Vec<u8>> {
        self.render().await
    }

    async fn write(&self, data: &[u8]) -> FsResult<usize> {
        let text = String::from_utf8_lossy(data);
        self.shared
            .source()
            .post_message(self.id, &text)
            .await
            .map_err(|e| FsError::remote_post(&self.name, e))?;

        debug!(channel = %self.id, bytes = data.len(), "posted");
        Ok(data.len())
    }
}

impl fmt::Debug for ChannelFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelFile")
            .field("inode", &self.inode)
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("last_size", &self.last_size())
            .finish_non_exhaustive()
    }
}

/// Remote name, or for unnamed direct messages the participants' usernames.
/// Falls back to the channel ID so the name is never empty.
fn display_name(channel: &Channel) -> String {
    let name = if channel.kind.is_direct() && channel.name.is_empty() {
        channel
            .participants
            .iter()
            .map(|u| u.username.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        channel.name.clone()
    };

    if name.is_empty() {
        channel.id.to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{Formatter, FormatterConfig};
    use crate::source::{FailPoint, MemorySource};
    use chatfs_types::{Community, CommunityId, User, UserId};

    fn me() -> User {
        User::new(UserId::new(1), "me")
    }

    fn setup(channel: Channel) -> (Arc<MemorySource>, Arc<ChannelFile>) {
        let source = Arc::new(MemorySource::new(me()));
        source.add_community(Community::new(CommunityId::new(10), "lounge"));
        source.add_channel(CommunityId::new(10), channel.clone());

        let config = FormatterConfig {
            templates: vec!["{{username}}".into(), "{{content}}".into()],
            ..Default::default()
        };
        let formatter = Arc::new(Formatter::new(source.clone(), &config).unwrap());
        let shared = Arc::new(FsShared::new(source.clone(), formatter));
        (source, Arc::new(ChannelFile::new(shared, &channel)))
    }

    #[test]
    fn test_direct_message_name_from_participants() {
        let dm = Channel::new(5u64, ChannelKind::GroupDirectMessage, "").with_participants(vec![
            User::new(UserId::new(2), "bob"),
            User::new(UserId::new(3), "carol"),
        ]);
        assert_eq!(display_name(&dm), "bob carol");

        let named = Channel::new(6u64, ChannelKind::DirectMessage, "pals");
        assert_eq!(display_name(&named), "pals");

        let empty = Channel::new(7u64, ChannelKind::DirectMessage, "");
        assert_eq!(display_name(&empty), "7");
        assert_eq!(display_name(&Channel::text(8u64, "")), "8");
    }

    #[tokio::test]
    async fn test_name_is_sanitized() {
        let (_, file) = setup(Channel::text(5u64, "news/updates"));
        assert_eq!(file.name(), "news_updates");
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let (_, file) = setup(Channel::text(5u64, "general"));
        assert_eq!(file.read().await.unwrap(), b"");

        assert_eq!(file.write(b"hello").await.unwrap(), 5);
        assert_eq!(file.read().await.unwrap(), b"me,hello\n");
    }

    #[tokio::test]
    async fn test_attributes_track_last_render() {
        let (_, file) = setup(Channel::text(5u64, "general"));
        file.write(b"hello").await.unwrap();
        assert_eq!(file.last_size(), 0);

        let attr = file.attributes().await.unwrap();
        assert!(attr.is_file());
        assert_eq!(attr.size, "me,hello\n".len() as u64);
        assert_eq!(file.last_size(), attr.size);
        assert!(file.last_modified() >= attr.crtime);
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates_and_keeps_metadata() {
        let (source, file) = setup(Channel::text(5u64, "general"));
        file.write(b"hi").await.unwrap();
        file.attributes().await.unwrap();
        let size = file.last_size();

        source.fail(FailPoint::Messages);
        let err = file.read().await.unwrap_err();
        assert!(matches!(err, FsError::RemoteFetch { .. }));
        assert!(file.attributes().await.is_err());
        assert_eq!(file.last_size(), size);

        // Nothing is cached: recovery is immediate.
        source.heal(FailPoint::Messages);
        assert_eq!(file.read().await.unwrap(), b"me,hi\n");
    }

    #[tokio::test]
    async fn test_post_failure_is_remote_post() {
        let (source, file) = setup(Channel::text(5u64, "general"));
        source.fail(FailPoint::Post);
        let err = file.write(b"lost").await.unwrap_err();
        assert!(matches!(err, FsError::RemotePost { .. }));

        source.heal(FailPoint::Post);
        assert_eq!(file.read().await.unwrap(), b"");
    }

    #[tokio::test]
    async fn test_open_returns_same_file() {
        let (_, file) = setup(Channel::text(5u64, "general"));
        let handle = file.open();
        assert!(Arc::ptr_eq(&file, &handle));
    }
}
