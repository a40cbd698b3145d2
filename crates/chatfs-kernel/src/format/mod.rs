//! Record formatter.
//!
//! Turns messages into delimited-text rows. Each installed template yields
//! one column; a message renders to one row; a channel renders to the
//! concatenation of its rows.
//!
//! ## Lifecycle
//!
//! A [`Formatter`] always holds a compiled template set: construction
//! installs the configured list and fails if it doesn't compile. Later
//! [`install_templates`](Formatter::install_templates) calls swap the whole
//! set at once or leave the previous one active.
//!
//! ## Sharing
//!
//! One formatter serves every channel. Renders snapshot the active template
//! set, resolve display names and colors from the source, then borrow a row
//! encoder and a text buffer from pools for the synchronous encode pass.

mod delimited;
mod error;
mod functions;
mod pool;
mod template;

pub use delimited::{RowEncoder, delimiter_byte};
pub use error::{FormatError, FormatResult};
pub use functions::{JSON_FALLBACK, MessageTime, MessageView};
pub use pool::{Lease, Pool, Reset};
pub use template::{Template, TemplateSet};

use std::collections::HashMap;
use std::sync::Arc;

use chatfs_types::{CommunityId, Message, User, UserId, member_color};
use parking_lot::RwLock;
use rhai::Engine;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, info};

use crate::source::ChatSource;

/// Templates installed when no configuration overrides them.
pub const DEFAULT_TEMPLATES: &[&str] = &[
    "{{ nickname(msg) }}",
    "{{ color(msg) }}",
    "{{ format_time(timestamp, \"%-I:%M%p\") }}",
    "{{ content(msg) }}",
    "{{ json(embeds) }}",
];

/// Default column delimiter.
pub const DEFAULT_DELIMITER: char = ',';

/// Default number of idle encoders and buffers kept per pool.
pub const DEFAULT_POOL_CAPACITY: usize = 16;

/// Row order of a rendered channel.
///
/// Sources return history most recent first; `OldestFirst` reverses it so
/// a channel file reads like a transcript.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RenderOrder {
    #[default]
    OldestFirst,
    NewestFirst,
}

impl RenderOrder {
    /// Parse from string, returning None for unknown values.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        s.parse().ok()
    }
}

/// Formatter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatterConfig {
    pub delimiter: char,
    pub order: RenderOrder,
    pub pool_capacity: usize,
    pub templates: Vec<String>,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            order: RenderOrder::default(),
            pool_capacity: DEFAULT_POOL_CAPACITY,
            templates: DEFAULT_TEMPLATES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Display name and color of one author within one community.
#[derive(Debug, Clone)]
struct Cosmetics {
    display_name: String,
    color: String,
}

impl Cosmetics {
    fn plain(user: &User) -> Self {
        Self {
            display_name: user.username.clone(),
            color: user.username.clone(),
        }
    }
}

type CosmeticsCache = HashMap<(CommunityId, UserId), Cosmetics>;

/// Shared message-to-row renderer.
pub struct Formatter {
    engine: Engine,
    source: Arc<dyn ChatSource>,
    templates: RwLock<Arc<TemplateSet>>,
    encoders: Pool<RowEncoder>,
    buffers: Pool<String>,
    delimiter: char,
    order: RenderOrder,
}

impl Formatter {
    /// Create a formatter and install `config.templates`.
    pub fn new(source: Arc<dyn ChatSource>, config: &FormatterConfig) -> FormatResult<Self> {
        let delimiter = delimiter_byte(config.delimiter)?;
        let formatter = Self {
            engine: functions::create_engine(),
            source,
            templates: RwLock::new(Arc::new(TemplateSet::default())),
            encoders: Pool::new(config.pool_capacity, move || RowEncoder::new(delimiter)),
            buffers: Pool::new(config.pool_capacity, String::new),
            delimiter: config.delimiter,
            order: config.order,
        };
        formatter.install_templates(&config.templates)?;
        Ok(formatter)
    }

    /// Compile and activate a new template list.
    ///
    /// All-or-nothing: if any template fails to compile, the error names its
    /// position and the previously installed set stays active.
    pub fn install_templates<S: AsRef<str>>(&self, sources: &[S]) -> FormatResult<()> {
        if sources.is_empty() {
            return Err(FormatError::NoTemplates);
        }
        let set = TemplateSet::compile(&self.engine, sources)
            .map_err(|(index, reason)| FormatError::syntax(index, reason))?;

        info!(count = set.len(), "installed templates");
        *self.templates.write() = Arc::new(set);
        Ok(())
    }

    /// Source text of the active templates, in column order.
    pub fn templates(&self) -> Vec<String> {
        self.active().sources()
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn order(&self) -> RenderOrder {
        self.order
    }

    /// Idle row encoders, for pool inspection.
    pub fn idle_encoders(&self) -> usize {
        self.encoders.idle()
    }

    /// Idle text buffers, for pool inspection.
    pub fn idle_buffers(&self) -> usize {
        self.buffers.idle()
    }

    /// Render one message as a terminated row.
    pub async fn render_record(&self, message: &Message) -> FormatResult<String> {
        let set = self.active();
        let mut cache = CosmeticsCache::new();
        let view = self.view_of(message, &mut cache).await;

        let mut encoder = self.encoders.acquire();
        let row = self.encode_row(&set, &view, &mut encoder)?;
        Ok(row.to_string())
    }

    /// Render a most-recent-first history in the configured order.
    pub async fn render_records(&self, messages: &[Message]) -> FormatResult<String> {
        self.render_records_in(messages, self.order).await
    }

    /// Render a most-recent-first history in `order`.
    pub async fn render_records_in(
        &self,
        messages: &[Message],
        order: RenderOrder,
    ) -> FormatResult<String> {
        let set = self.active();
        let mut cache = CosmeticsCache::new();

        let mut ordered: Vec<&Message> = messages.iter().collect();
        if order == RenderOrder::OldestFirst {
            ordered.reverse();
        }

        let mut views = Vec::with_capacity(ordered.len());
        for message in ordered {
            views.push(self.view_of(message, &mut cache).await);
        }

        let mut block = self.buffers.acquire();
        let mut encoder = self.encoders.acquire();
        for view in &views {
            let row = self.encode_row(&set, view, &mut encoder)?;
            block.push_str(row);
        }
        debug!(rows = views.len(), bytes = block.len(), "rendered records");
        Ok(block.as_str().to_owned())
    }

    fn active(&self) -> Arc<TemplateSet> {
        self.templates.read().clone()
    }

    fn encode_row<'e>(
        &self,
        set: &TemplateSet,
        view: &MessageView,
        encoder: &'e mut RowEncoder,
    ) -> FormatResult<&'e str> {
        let scope = functions::message_scope(view);
        let mut columns = Vec::with_capacity(set.len());

        for (index, template) in set.iter().enumerate() {
            let mut column = String::new();
            template
                .render(&self.engine, &scope, &mut column)
                .map_err(|reason| FormatError::render(index, view.message().id, reason))?;
            columns.push(escape_newlines(column));
        }

        encoder.encode(&columns)
    }

    async fn view_of(&self, message: &Message, cache: &mut CosmeticsCache) -> MessageView {
        let cosmetics = match message.community_id {
            None => Cosmetics::plain(&message.author),
            Some(community) => {
                let key = (community, message.author.id);
                match cache.get(&key) {
                    Some(hit) => hit.clone(),
                    None => {
                        let resolved = self.cosmetics(community, &message.author).await;
                        cache.insert(key, resolved.clone());
                        resolved
                    }
                }
            }
        };
        MessageView::new(
            Arc::new(message.clone()),
            cosmetics.display_name,
            cosmetics.color,
        )
    }

    async fn cosmetics(&self, community: CommunityId, author: &User) -> Cosmetics {
        let member = match self.source.member(community, author.id).await {
            Ok(member) => member,
            Err(e) => {
                debug!(%community, user = %author.id, "member lookup failed: {}", e);
                return Cosmetics::plain(author);
            }
        };
        let display_name = member.display_name().to_string();

        let color = match self.source.community(community).await {
            Ok(detail) => format!("#{:06X}", member_color(&detail, &member)),
            Err(e) => {
                debug!(%community, "community lookup failed: {}", e);
                author.username.clone()
            }
        };

        Cosmetics {
            display_name,
            color,
        }
    }
}

impl std::fmt::Debug for Formatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Formatter")
            .field("templates", &self.templates())
            .field("delimiter", &self.delimiter)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

/// Replace raw line breaks with the two-character sequence `\n`.
fn escape_newlines(column: String) -> String {
    if column.contains('\n') {
        column.replace('\n', "\\n")
    } else {
        column
    }
}
