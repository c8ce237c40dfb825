//! Strips stale tool-use records from chat history before each LLM request.
//!
//! Agents that call tools leave two kinds of residue in the conversation: an
//! assistant message carrying `tool_calls`, and one `tool` message per call
//! carrying the result. Once the model has acted on them they are mostly dead
//! weight, yet they are re-sent on every later request. `tool-use-cleaner`
//! removes them from older turns while optionally keeping the most recent
//! rounds intact.
//!
//! The core is a pure transform over an ordered list of [`Message`]s:
//!
//! ```
//! use tool_use_cleaner::{Message, ToolCall};
//! use tool_use_cleaner::context::clean;
//!
//! let history = vec![
//!     Message::user("weather in Oslo?"),
//!     Message::assistant_with_tool_calls(
//!         "Checking.",
//!         vec![ToolCall::function("c1", "weather", r#"{"city":"Oslo"}"#)],
//!     ),
//!     Message::tool_result("c1", "4°C, rain"),
//!     Message::assistant_text("It's 4°C and raining."),
//! ];
//!
//! let cleaned = clean(history, 0);
//! assert_eq!(cleaned.len(), 3);
//! assert!(cleaned.iter().all(|m| m.tool_calls.is_none()));
//! ```
//!
//! # Where to find things
//!
//! - **The algorithm:** [`context::rounds`] detects round boundaries and the
//!   cutoff index; [`context::cleaner`] applies the per-message strip rule.
//! - **Configuration:** [`config::CleanerConfig`] with the two recognised keys
//!   `enable_function_call_cleaner` and `tool_context_keep_rounds`.
//! - **Host integration:** [`plugin::ToolUseCleanerPlugin`] implements
//!   [`plugin::LlmRequestHook`] and rewrites [`ProviderRequest::contexts`] in
//!   place. Reports go to an optional [`observer::CleanObserver`].
//! - **Log capture:** [`logging::PluginLogLayer`] routes this crate's
//!   `tracing` output into a buffer the host can drain.

pub mod config;
pub mod context;
pub mod logging;
pub mod observer;
pub mod plugin;
pub mod prelude;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

// Re-export schemars for downstream crates.
pub use schemars;

// ── Schema generation ──────────────────────────────────────────────

/// Generate a JSON Schema `serde_json::Value` from a type that implements
/// `schemars::JsonSchema`.
///
/// # Example
///
/// ```
/// use tool_use_cleaner::json_schema_for;
/// use tool_use_cleaner::config::CleanerConfig;
///
/// let schema = json_schema_for::<CleanerConfig>();
/// assert_eq!(schema["type"], "object");
/// ```
pub fn json_schema_for<T: JsonSchema>() -> serde_json::Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema)
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}))
}

// ── Message types ──────────────────────────────────────────────────

/// Role of a message in the conversation.
///
/// Unrecognised role strings are kept verbatim in [`MessageRole::Other`] so
/// they survive a round-trip through the cleaner.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
    Other(String),
}

impl MessageRole {
    pub fn as_str(&self) -> &str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Tool => "tool",
            MessageRole::Other(s) => s,
        }
    }
}

impl From<String> for MessageRole {
    fn from(s: String) -> Self {
        match s.as_str() {
            "system" => MessageRole::System,
            "user" => MessageRole::User,
            "assistant" => MessageRole::Assistant,
            "tool" => MessageRole::Tool,
            _ => MessageRole::Other(s),
        }
    }
}

impl From<&str> for MessageRole {
    fn from(s: &str) -> Self {
        MessageRole::from(s.to_string())
    }
}

impl From<MessageRole> for String {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message content: plain text, a list of content parts, or anything else a
/// provider put there.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<serde_json::Value>),
    Structured(serde_json::Value),
}

impl MessageContent {
    /// Whether the content carries nothing. Empty strings, empty part lists,
    /// `null`, `false`, zero, and empty objects all count as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            MessageContent::Text(s) => s.is_empty(),
            MessageContent::Parts(parts) => parts.is_empty(),
            MessageContent::Structured(v) => match v {
                serde_json::Value::Null => true,
                serde_json::Value::Bool(b) => !b,
                serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
                serde_json::Value::String(s) => s.is_empty(),
                serde_json::Value::Array(a) => a.is_empty(),
                serde_json::Value::Object(o) => o.is_empty(),
            },
        }
    }

    /// The text of a [`MessageContent::Text`] payload.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<String> for MessageContent {
    fn from(s: String) -> Self {
        MessageContent::Text(s)
    }
}

impl From<&str> for MessageContent {
    fn from(s: &str) -> Self {
        MessageContent::Text(s.to_string())
    }
}

/// Deserialize a field that is present in the input, keeping an explicit
/// `null` as a value instead of collapsing it into `None`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// A message in the conversation.
///
/// Every field is optional so that partially-formed history from a host still
/// decodes. Fields this crate does not interpret (`name`, `reasoning`, ...)
/// land in `extra` and are written back unchanged. A key that was present
/// stays present on output, even when its value is `null`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Message {
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub role: Option<MessageRole>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub content: Option<MessageContent>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub tool_calls: Option<ToolCalls>,
    /// Kept as raw JSON: some providers send numeric call ids.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub tool_call_id: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Message {
    fn with_role(role: MessageRole) -> Self {
        Self {
            role: Some(role),
            ..Default::default()
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            content: Some(MessageContent::Text(content.into())),
            ..Self::with_role(MessageRole::System)
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            content: Some(MessageContent::Text(content.into())),
            ..Self::with_role(MessageRole::User)
        }
    }

    pub fn assistant_text(content: impl Into<String>) -> Self {
        Self {
            content: Some(MessageContent::Text(content.into())),
            ..Self::with_role(MessageRole::Assistant)
        }
    }

    /// An assistant turn that only requests tools (no text).
    pub fn assistant_tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: Some(ToolCalls::Calls(calls)),
            ..Self::with_role(MessageRole::Assistant)
        }
    }

    /// An assistant turn with both text and tool requests.
    pub fn assistant_with_tool_calls(content: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            content: Some(MessageContent::Text(content.into())),
            tool_calls: Some(ToolCalls::Calls(calls)),
            ..Self::with_role(MessageRole::Assistant)
        }
    }

    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: Some(MessageContent::Text(content.into())),
            tool_call_id: Some(serde_json::Value::String(call_id.into())),
            ..Self::with_role(MessageRole::Tool)
        }
    }

    /// A message whose role could not be decoded. It has no role, so the
    /// cleaner passes it through untouched; serialization writes `fields`
    /// back as they were.
    pub fn opaque(fields: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            extra: fields,
            ..Default::default()
        }
    }

    pub fn is_role(&self, role: &MessageRole) -> bool {
        self.role.as_ref() == Some(role)
    }

    pub fn is_assistant(&self) -> bool {
        self.is_role(&MessageRole::Assistant)
    }

    pub fn is_tool(&self) -> bool {
        self.is_role(&MessageRole::Tool)
    }

    /// `user` or `system`: the roles that open a new round.
    pub fn opens_round(&self) -> bool {
        matches!(self.role, Some(MessageRole::User | MessageRole::System))
    }

    /// Whether the message carries non-empty content.
    pub fn has_content(&self) -> bool {
        self.content.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// Content as text, if it is a text payload.
    pub fn text(&self) -> Option<&str> {
        self.content.as_ref().and_then(MessageContent::as_text)
    }

    /// The `tool_call_id` of a tool result, when it is a string.
    pub fn call_id(&self) -> Option<&str> {
        self.tool_call_id.as_ref().and_then(serde_json::Value::as_str)
    }
}

/// Decode a host-supplied JSON array of messages without failing.
///
/// Only a non-string `role` stops an object from decoding; such entries
/// become [`Message::opaque`] and pass through the cleaner untouched. Every
/// other field decodes leniently, so a malformed `tool_calls` or
/// `tool_call_id` never hides the role. Entries that are not JSON objects
/// cannot be messages and are skipped with a warning. A non-array value
/// yields an empty list.
pub fn decode_contexts(value: &serde_json::Value) -> Vec<Message> {
    let Some(entries) = value.as_array() else {
        warn!("Expected a JSON array of context messages, got {value}");
        return Vec::new();
    };

    entries
        .iter()
        .enumerate()
        .filter_map(|(idx, entry)| {
            let serde_json::Value::Object(fields) = entry else {
                warn!("Skipping context entry {idx}: not a JSON object");
                return None;
            };
            match serde_json::from_value::<Message>(entry.clone()) {
                Ok(msg) => Some(msg),
                Err(e) => {
                    warn!("Context entry {idx} kept as-is, failed to decode: {e}");
                    Some(Message::opaque(fields.clone()))
                }
            }
        })
        .collect()
}

// ── Tool call types ────────────────────────────────────────────────

/// The `tool_calls` field of an assistant message.
///
/// Well-formed OpenAI-style calls decode into [`ToolCall`]s. Anything else a
/// provider sends (object arguments, numeric ids, a non-list value, `null`)
/// is kept verbatim as [`ToolCalls::Raw`]. Either form is removed by the
/// strip rule.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum ToolCalls {
    Calls(Vec<ToolCall>),
    Raw(serde_json::Value),
}

impl ToolCalls {
    /// The typed calls, if the field decoded as a list of them.
    pub fn as_calls(&self) -> Option<&[ToolCall]> {
        match self {
            ToolCalls::Calls(calls) => Some(calls),
            ToolCalls::Raw(_) => None,
        }
    }
}

/// The type of a tool call. Currently always `Function`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub enum CallType {
    #[default]
    #[serde(rename = "function")]
    Function,
}

/// A tool call requested by the model.
///
/// Provider extras such as `index` or `extra_content` are kept in `extra`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: CallType,
    pub function: FunctionCallData,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ToolCall {
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            call_type: CallType::Function,
            function: FunctionCallData {
                name: name.into(),
                arguments: arguments.into(),
                extra: serde_json::Map::new(),
            },
            extra: serde_json::Map::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct FunctionCallData {
    pub name: String,
    /// JSON-encoded arguments.
    pub arguments: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Request type ───────────────────────────────────────────────────

/// The request object a host assembles before calling a model provider.
///
/// [`LlmRequestHook`](plugin::LlmRequestHook)s receive it mutably right before
/// dispatch. `contexts` holds prior turns only; the new user input lives in
/// `prompt`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ProviderRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, deserialize_with = "deserialize_contexts")]
    pub contexts: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

fn deserialize_contexts<'de, D>(deserializer: D) -> Result<Vec<Message>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(decode_contexts(&value))
}

impl ProviderRequest {
    pub fn new(prompt: impl Into<String>, contexts: Vec<Message>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            contexts,
            ..Default::default()
        }
    }
}
