//! End-to-end tests driving the tree the way a transport would.
//!
//! Everything goes through [`Node`] capabilities (`as_directory`,
//! `as_file`, `attributes`) against a [`MemorySource`], so these cover the
//! path from a directory listing down to rendered channel bytes.

use std::collections::HashSet;
use std::sync::Arc;

use chatfs_kernel::{
    ChatFs, ChatFsConfig, DirectoryOps, FailPoint, FormatError, FormatterConfig, FsError,
    MemorySource, Node, RenderOrder,
};
use chatfs_types::{
    Channel, ChannelId, ChannelKind, Community, CommunityId, Message, MessageId, User, UserId,
};
use chrono::{TimeZone, Utc};

// ============================================================================
// Shared test setup
// ============================================================================

const LOUNGE: CommunityId = CommunityId::new(100);
const GENERAL: ChannelId = ChannelId::new(200);

fn alice() -> User {
    User::new(UserId::new(2), "alice")
}

fn config(templates: &[&str]) -> ChatFsConfig {
    ChatFsConfig {
        formatter: FormatterConfig {
            templates: templates.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        },
        background_hydration: false,
    }
}

fn message(id: u64, content: &str) -> Message {
    Message {
        id: MessageId::new(id),
        channel_id: GENERAL,
        community_id: Some(LOUNGE),
        author: alice(),
        content: content.into(),
        attachments: vec![],
        embeds: vec![],
        timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
    }
}

/// One community with one text channel.
fn lounge() -> Arc<MemorySource> {
    let source = Arc::new(MemorySource::new(User::new(UserId::new(1), "me")));
    source.add_community(Community::new(LOUNGE, "lounge"));
    source.add_channel(LOUNGE, Channel::text(GENERAL, "general"));
    source
}

async fn read(node: &Node) -> String {
    let bytes = node.as_file().expect("channel node").read().await.unwrap();
    String::from_utf8(bytes).unwrap()
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_row_quotes_delimiter() {
    let source = lounge();
    source.push_message(message(1, "hi, there"));
    let fs = ChatFs::new(source, &config(&["{{username}}", "{{content}}"]))
        .await
        .unwrap();

    let general = fs.walk("lounge/general").await.unwrap();
    assert_eq!(read(&general).await, "alice,\"hi, there\"\n");
}

#[tokio::test]
async fn test_only_text_channel_becomes_file() {
    let source = Arc::new(MemorySource::new(alice()));
    source.add_community(Community::new(LOUNGE, "lounge"));
    source.add_channel(LOUNGE, Channel::new(1u64, ChannelKind::Voice, "chat-a"));
    source.add_channel(LOUNGE, Channel::new(2u64, ChannelKind::Voice, "chat-b"));
    source.add_channel(LOUNGE, Channel::text(3u64, "general"));
    let fs = ChatFs::new(source, &config(&["{{content}}"])).await.unwrap();

    let dir = fs.walk("lounge").await.unwrap();
    let entries = dir.as_directory().unwrap().list_entries().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "general");
    assert!(entries[0].kind.is_file());
}

#[tokio::test]
async fn test_repeated_listing_keeps_identity() {
    let fs = ChatFs::new(lounge(), &config(&["{{content}}"])).await.unwrap();
    let root = fs.root();
    let dir = root.as_directory().unwrap();

    let first = dir.list_entries().await.unwrap();
    let first_inode = dir.lookup("lounge").await.unwrap().inode();
    let second = dir.list_entries().await.unwrap();
    let second_inode = dir.lookup("lounge").await.unwrap().inode();

    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
    assert_eq!(first_inode, second_inode);
}

#[tokio::test]
async fn test_write_then_read() {
    let fs = ChatFs::new(lounge(), &config(&["{{username}}", "{{content}}"]))
        .await
        .unwrap();
    let general = fs.walk("lounge/general").await.unwrap().open().unwrap();
    let file = general.as_file().unwrap();

    assert_eq!(file.write(b"hello").await.unwrap(), 5);
    assert_eq!(read(&general).await, "me,hello\n");
}

// ============================================================================
// Collections
// ============================================================================

#[tokio::test]
async fn test_superset_appends_tail() {
    let source = lounge();
    let fs = ChatFs::new(source.clone(), &config(&["{{content}}"])).await.unwrap();
    fs.walk("lounge").await.unwrap();
    let before: Vec<_> = fs.communities().await.iter().map(|c| (c.id(), c.inode())).collect();

    source.add_community(Community::new(101u64, "ops/alerts"));
    source.add_community(Community::new(102u64, "zeta"));
    let entries = fs.list_entries_names().await;
    assert_eq!(entries, vec!["lounge", "ops_alerts", "zeta"]);

    let after = fs.communities().await;
    assert_eq!((after[0].id(), after[0].inode()), before[0]);
    assert!(after[1].inode() > before[0].1);
    assert!(after[2].inode() > after[1].inode());
}

#[tokio::test]
async fn test_vanished_community_is_kept() {
    let source = lounge();
    let fs = ChatFs::new(source.clone(), &config(&["{{content}}"])).await.unwrap();
    source.remove_community(LOUNGE);
    assert_eq!(fs.list_entries_names().await, vec!["lounge"]);
}

#[tokio::test]
async fn test_inodes_unique_across_tree() {
    let source = lounge();
    source.add_community(Community::new(101u64, "ops"));
    source.add_channel(CommunityId::new(101), Channel::text(300u64, "alerts"));
    source.add_channel(
        CommunityId::new(101),
        Channel::new(301u64, ChannelKind::GroupDirectMessage, "")
            .with_participants(vec![alice(), User::new(UserId::new(3), "bob")]),
    );
    let fs = ChatFs::new(source, &config(&["{{content}}"])).await.unwrap();

    let mut seen = HashSet::new();
    assert!(seen.insert(fs.inode()));
    for community in fs.communities().await {
        assert!(seen.insert(community.inode()));
        for channel in community.channels().await {
            assert!(seen.insert(channel.inode()));
        }
    }
    assert_eq!(seen.len(), 6);
    assert!(fs.walk("ops/alice bob").await.is_ok());
}

#[tokio::test]
async fn test_background_hydration_eventually_lists() {
    let source = lounge();
    let config = ChatFsConfig {
        background_hydration: true,
        ..config(&["{{content}}"])
    };
    let fs = ChatFs::new(source, &config).await.unwrap();

    let lounge = fs.communities().await.remove(0);
    for _ in 0..100 {
        if !lounge.channels().await.is_empty() {
            break;
        }
        tokio::task::yield_now().await;
    }
    // Listing refreshes anyway, so the channel is visible either way.
    assert!(fs.walk("lounge/general").await.is_ok());
}

// ============================================================================
// Rendering
// ============================================================================

#[tokio::test]
async fn test_render_is_deterministic() {
    let source = lounge();
    for (i, text) in ["one", "two, three", "four \"quoted\""].iter().enumerate() {
        source.push_message(message(i as u64 + 1, text));
    }
    let fs = ChatFs::new(source, &config(&["{{id}}", "{{content}}", "{{ nickname(msg) }}"]))
        .await
        .unwrap();
    let general = fs.walk("lounge/general").await.unwrap();

    let first = read(&general).await;
    let second = read(&general).await;
    assert_eq!(first, second);
    assert_eq!(first, "1,one,alice\n2,\"two, three\",alice\n3,\"four \"\"quoted\"\"\",alice\n");
}

#[tokio::test]
async fn test_newest_first_order() {
    let source = lounge();
    source.push_message(message(1, "old"));
    source.push_message(message(2, "new"));
    let mut config = config(&["{{content}}"]);
    config.formatter.order = RenderOrder::NewestFirst;
    let fs = ChatFs::new(source, &config).await.unwrap();

    assert_eq!(read(&fs.walk("lounge/general").await.unwrap()).await, "new\nold\n");
}

#[tokio::test]
async fn test_rows_decode_with_standard_reader() {
    let source = lounge();
    let awkward = "a,b \"c\"\nnext line";
    source.push_message(message(1, awkward));
    let fs = ChatFs::new(source, &config(&["{{username}}", "{{content}}"]))
        .await
        .unwrap();
    let text = read(&fs.walk("lounge/general").await.unwrap()).await;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(text.as_bytes());
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][0], "alice");
    assert_eq!(&rows[0][1], "a,b \"c\"\\nnext line");
}

#[tokio::test]
async fn test_attributes_report_rendered_size() {
    let source = lounge();
    source.push_message(message(1, "hello"));
    let fs = ChatFs::new(source, &config(&["{{content}}"])).await.unwrap();
    let general = fs.walk("lounge/general").await.unwrap();

    let attr = general.attributes().await.unwrap();
    assert!(attr.is_file());
    assert_eq!(attr.size, "hello\n".len() as u64);
    assert_eq!(attr.crtime, fs.attributes().crtime);
}

#[tokio::test]
async fn test_failed_install_keeps_previous_templates() {
    let source = lounge();
    source.push_message(message(1, "hi"));
    let fs = ChatFs::new(source, &config(&["{{content}}"])).await.unwrap();

    let err = fs
        .formatter()
        .install_templates(&["{{username}}", "{{content}}", "{{ broken"])
        .unwrap_err();
    assert!(matches!(err, FormatError::TemplateSyntax { index: 2, .. }));

    assert_eq!(read(&fs.walk("lounge/general").await.unwrap()).await, "hi\n");
}

#[tokio::test]
async fn test_concurrent_reads_share_formatter() {
    let source = lounge();
    for i in 1..=20 {
        source.push_message(message(i, &format!("line {}", i)));
    }
    let fs = ChatFs::new(source, &config(&["{{id}}", "{{content}}"])).await.unwrap();
    let expected = read(&fs.walk("lounge/general").await.unwrap()).await;

    let mut handles = Vec::new();
    for _ in 0..16 {
        let fs = fs.clone();
        handles.push(tokio::spawn(async move {
            let node = fs.walk("lounge/general").await.unwrap();
            read(&node).await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), expected);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_listings_add_each_node_once() {
    let source = lounge();
    let fs = ChatFs::new(source.clone(), &config(&["{{content}}"])).await.unwrap();

    for id in 101..=108u64 {
        source.add_community(Community::new(id, format!("c{}", id)));
        source.add_channel(CommunityId::new(id), Channel::text(id * 10, "general"));
    }
    for id in 201..=204u64 {
        source.add_channel(LOUNGE, Channel::text(id, format!("extra{}", id)));
    }

    let mut handles = Vec::new();
    for _ in 0..16 {
        let fs = fs.clone();
        handles.push(tokio::spawn(async move {
            let root = fs.list_entries().await.unwrap().len();
            let lounge = fs.walk("lounge").await.unwrap();
            let channels = lounge.directory().unwrap().list_entries().await.unwrap().len();
            (root, channels)
        }));
    }
    for handle in handles {
        let (root, channels) = handle.await.unwrap();
        assert_eq!(root, 9);
        assert_eq!(channels, 5);
    }

    let communities = fs.communities().await;
    let ids: HashSet<_> = communities.iter().map(|c| c.id()).collect();
    assert_eq!(ids.len(), 9);

    let mut inodes = HashSet::new();
    assert!(inodes.insert(fs.inode()));
    for community in &communities {
        assert!(inodes.insert(community.inode()));
        let channels = community.channels().await;
        let channel_ids: HashSet<_> = channels.iter().map(|c| c.id()).collect();
        assert_eq!(channel_ids.len(), channels.len());
        for channel in channels {
            assert!(inodes.insert(channel.inode()));
        }
    }
    // root + 9 communities + 5 lounge channels + 8 others
    assert_eq!(inodes.len(), 23);
}

// ============================================================================
// Errors
// ============================================================================

#[tokio::test]
async fn test_fetch_errors_propagate_without_caching() {
    let source = lounge();
    let fs = ChatFs::new(source.clone(), &config(&["{{content}}"])).await.unwrap();
    let root = fs.root();

    source.fail(FailPoint::Communities);
    let err = root.as_directory().unwrap().list_entries().await.unwrap_err();
    assert!(matches!(err, FsError::RemoteFetch { .. }));
    let io: std::io::Error = err.into();
    assert_eq!(io.kind(), std::io::ErrorKind::Other);

    source.heal(FailPoint::Communities);
    assert_eq!(fs.list_entries_names().await, vec!["lounge"]);
}

#[tokio::test]
async fn test_node_capability_errors() {
    let fs = ChatFs::new(lounge(), &config(&["{{content}}"])).await.unwrap();

    let dir = fs.walk("lounge").await.unwrap();
    assert!(dir.as_file().is_none());
    assert!(matches!(dir.open(), Err(FsError::IsADirectory(_))));

    let file = fs.walk("lounge/general").await.unwrap();
    assert!(file.as_directory().is_none());
    assert!(matches!(file.directory(), Err(FsError::NotADirectory(_))));

    let missing = fs.walk("nowhere").await.unwrap_err();
    let io: std::io::Error = missing.into();
    assert_eq!(io.kind(), std::io::ErrorKind::NotFound);
}

// ============================================================================
// Helpers
// ============================================================================

trait ListNames {
    async fn list_entries_names(&self) -> Vec<String>;
}

impl ListNames for Arc<ChatFs> {
    async fn list_entries_names(&self) -> Vec<String> {
        self.list_entries()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect()
    }
}
