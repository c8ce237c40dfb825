//! Convenience re-exports for host integrations.
//!
//! ```ignore
//! use tool_use_cleaner::prelude::*;
//! ```

// ── Core types ──────────────────────────────────────────────────────
pub use crate::{
    Message, MessageContent, MessageRole, ProviderRequest, ToolCall, ToolCalls, decode_contexts,
};

// ── Cleaning ────────────────────────────────────────────────────────
pub use crate::config::CleanerConfig;
pub use crate::context::{CleanMode, CleanReport, ToolContextCleaner, clean};

// ── Host integration ────────────────────────────────────────────────
pub use crate::logging::{LogBuffer, PluginLogLayer};
pub use crate::observer::{CleanObserver, FnObserver, NoopObserver};
pub use crate::plugin::{HookChain, LlmRequestHook, ToolUseCleanerPlugin};
