//! Rhai-driven configuration.
//!
//! Evaluates a `chatfs.rhai` script and reads its top-level variables into
//! a typed [`ChatFsConfig`]. Every variable is optional:
//!
//! ```rhai
//! let delimiter = ",";
//! let order = "oldest_first";          // or "newest_first"
//! let pool_capacity = 16;
//! let background_hydration = true;
//! let templates = [
//!     "{{ nickname(msg) }}",
//!     "{{ content(msg) }}",
//! ];
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::format::{FormatterConfig, RenderOrder, delimiter_byte};

/// Configuration error type.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The script didn't parse.
    #[error("config parse error: {0}")]
    Parse(String),

    /// The script failed while running.
    #[error("config evaluation error: {0}")]
    Eval(String),

    /// A variable has the wrong type or an unusable value.
    #[error("config variable `{name}`: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            name,
            reason: reason.into(),
        }
    }
}

/// Tree and formatter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatFsConfig {
    pub formatter: FormatterConfig,
    /// Hydrate newly discovered communities in background tasks. When off,
    /// hydration runs inline before the listing returns.
    pub background_hydration: bool,
}

impl Default for ChatFsConfig {
    fn default() -> Self {
        Self {
            formatter: FormatterConfig::default(),
            background_hydration: true,
        }
    }
}

/// Parse a `chatfs.rhai` script and extract configuration.
pub fn load_config(script: &str) -> Result<ChatFsConfig, ConfigError> {
    let engine = rhai::Engine::new();
    let ast = engine
        .compile(script)
        .map_err(|e| ConfigError::Parse(e.to_string()))?;

    let mut scope = rhai::Scope::new();
    engine
        .run_ast_with_scope(&mut scope, &ast)
        .map_err(|e| ConfigError::Eval(e.to_string()))?;

    let mut config = ChatFsConfig::default();

    if let Some(value) = scope.get_value::<rhai::Dynamic>("delimiter") {
        config.formatter.delimiter = extract_delimiter(value)?;
    }

    if let Some(value) = scope.get_value::<rhai::Dynamic>("order") {
        let order = string_of("order", value)?;
        config.formatter.order = RenderOrder::from_str(&order)
            .ok_or_else(|| ConfigError::invalid("order", format!("unknown order {:?}", order)))?;
    }

    if let Some(value) = scope.get_value::<rhai::Dynamic>("pool_capacity") {
        let capacity = value
            .as_int()
            .map_err(|t| ConfigError::invalid("pool_capacity", format!("expected integer, got {}", t)))?;
        config.formatter.pool_capacity = usize::try_from(capacity)
            .ok()
            .filter(|&c| c > 0)
            .ok_or_else(|| ConfigError::invalid("pool_capacity", "must be positive"))?;
    }

    if let Some(value) = scope.get_value::<rhai::Dynamic>("background_hydration") {
        config.background_hydration = value.as_bool().map_err(|t| {
            ConfigError::invalid("background_hydration", format!("expected bool, got {}", t))
        })?;
    }

    if let Some(value) = scope.get_value::<rhai::Dynamic>("templates") {
        config.formatter.templates = extract_templates(value)?;
    }

    Ok(config)
}

fn string_of(name: &'static str, value: rhai::Dynamic) -> Result<String, ConfigError> {
    value
        .into_string()
        .map_err(|t| ConfigError::invalid(name, format!("expected string, got {}", t)))
}

fn extract_delimiter(value: rhai::Dynamic) -> Result<char, ConfigError> {
    let delimiter = if value.is_char() {
        value
            .as_char()
            .map_err(|t| ConfigError::invalid("delimiter", format!("expected char, got {}", t)))?
    } else {
        let s = string_of("delimiter", value)?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => {
                return Err(ConfigError::invalid(
                    "delimiter",
                    format!("expected one character, got {:?}", s),
                ));
            }
        }
    };

    delimiter_byte(delimiter).map_err(|e| ConfigError::invalid("delimiter", e.to_string()))?;
    Ok(delimiter)
}

fn extract_templates(value: rhai::Dynamic) -> Result<Vec<String>, ConfigError> {
    let array = value
        .into_array()
        .map_err(|t| ConfigError::invalid("templates", format!("expected array, got {}", t)))?;
    if array.is_empty() {
        return Err(ConfigError::invalid("templates", "at least one template is required"));
    }

    array
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            item.into_string().map_err(|t| {
                ConfigError::invalid("templates", format!("item {} is {}, expected string", i, t))
            })
        })
        .collect()
}
