//! Template engine and function namespace.
//!
//! Templates run as rhai expressions against a per-message scope. The
//! function set is fixed and registered once per engine:
//!
//! | Function | Returns |
//! |----------|---------|
//! | `nickname(msg)` | per-community nickname, else username |
//! | `color(msg)` | effective role color as `#RRGGBB` |
//! | `content(msg)` | content followed by attachment URLs, space-separated |
//! | `format_time(ts, pattern)` | strftime rendering in UTC |
//! | `json(value)` | JSON text, or `ERR` if the value can't be serialized |
//!
//! Remote lookups (members, community roles) are resolved before the
//! engine runs, so every function here is synchronous.

use std::fmt::Write as _;
use std::sync::Arc;

use chatfs_types::Message;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use rhai::{Dynamic, Engine, EvalAltResult, Scope};
use tracing::warn;

/// Rendered in place of a value `json()` can't serialize.
pub const JSON_FALLBACK: &str = "ERR";

/// A message as templates see it, with its cosmetics already resolved.
#[derive(Debug, Clone)]
pub struct MessageView {
    message: Arc<Message>,
    display_name: String,
    color: String,
}

impl MessageView {
    pub fn new(message: Arc<Message>, display_name: String, color: String) -> Self {
        Self {
            message,
            display_name,
            color,
        }
    }

    pub fn message(&self) -> &Message {
        &self.message
    }
}

/// Message timestamp as a template value.
#[derive(Debug, Clone, Copy)]
pub struct MessageTime(pub DateTime<Utc>);

/// Build the template engine.
pub fn create_engine() -> Engine {
    let mut engine = Engine::new();

    // Templates are single expressions over one message
    engine.set_max_expr_depths(32, 32);
    engine.set_max_operations(10_000);
    engine.set_max_string_size(1 << 20);
    engine.set_max_array_size(10_000);
    engine.set_max_map_size(10_000);

    engine
        .register_type_with_name::<MessageView>("Message")
        .register_get("id", |m: &mut MessageView| m.message.id.to_string())
        .register_get("author_id", |m: &mut MessageView| {
            m.message.author.id.to_string()
        })
        .register_get("username", |m: &mut MessageView| {
            m.message.author.username.clone()
        })
        .register_get("content", |m: &mut MessageView| m.message.content.clone())
        .register_get("timestamp", |m: &mut MessageView| {
            MessageTime(m.message.timestamp)
        });

    engine
        .register_type_with_name::<MessageTime>("Timestamp")
        .register_fn("to_string", |t: &mut MessageTime| t.0.to_rfc3339())
        .register_fn("unix", |t: &mut MessageTime| t.0.timestamp());

    // nickname(msg) → "Ally"
    engine.register_fn("nickname", |m: &mut MessageView| m.display_name.clone());

    // color(msg) → "#FF0000"
    engine.register_fn("color", |m: &mut MessageView| m.color.clone());

    // content(msg) → content with attachment URLs appended
    engine.register_fn("content", |m: &mut MessageView| {
        m.message.content_with_attachments()
    });

    // format_time(ts, "%-I:%M%p") → "3:04PM"
    engine.register_fn("format_time", format_time);

    // json(value) → "[{\"title\":...}]"
    engine.register_fn("json", json);

    engine
}

/// Scope variables for one message.
pub fn message_scope(view: &MessageView) -> Scope<'static> {
    let message = view.message();
    let mut scope = Scope::new();

    scope.push("id", message.id.to_string());
    scope.push("author_id", message.author.id.to_string());
    scope.push("username", message.author.username.clone());
    scope.push("content", message.content.clone());
    scope.push("timestamp", MessageTime(message.timestamp));
    scope.push(
        "guild_id",
        message
            .community_id
            .map(|id| id.to_string())
            .unwrap_or_default(),
    );

    let attachments: rhai::Array = message
        .attachments
        .iter()
        .map(|a| Dynamic::from(a.url.clone()))
        .collect();
    scope.push("attachments", attachments);

    let embeds = rhai::serde::to_dynamic(&message.embeds).unwrap_or_else(|e| {
        warn!(message = %message.id, "embeds not representable in templates: {}", e);
        Dynamic::UNIT
    });
    scope.push_dynamic("embeds", embeds);

    scope.push("msg", view.clone());
    scope
}

/// Turn an expression result into column text.
pub fn stringify(value: Dynamic) -> String {
    if value.is_unit() {
        return String::new();
    }
    if value.is::<MessageTime>() {
        if let Some(time) = value.clone().try_cast::<MessageTime>() {
            return time.0.to_rfc3339();
        }
    }
    if value.is_string() {
        return value.into_string().unwrap_or_default();
    }
    value.to_string()
}

fn format_time(time: &mut MessageTime, pattern: &str) -> Result<String, Box<EvalAltResult>> {
    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(format!("invalid time pattern {:?}", pattern).into());
    }

    let mut out = String::new();
    write!(out, "{}", time.0.format_with_items(items.into_iter()))
        .map_err(|_| format!("time pattern {:?} can't render this timestamp", pattern))?;
    Ok(out)
}

fn json(value: Dynamic) -> String {
    match rhai::serde::from_dynamic::<serde_json::Value>(&value) {
        Ok(json) => json.to_string(),
        Err(e) => {
            warn!("json: cannot serialize {}: {}", value.type_name(), e);
            JSON_FALLBACK.to_string()
        }
    }
}
