//! Host integration: the request hook and the plugin that implements it.
//!
//! A chatbot host calls every registered [`LlmRequestHook`] right before it
//! dispatches a [`ProviderRequest`] to a model provider. Hooks receive the
//! request mutably and may rewrite it.
//!
//! [`ToolUseCleanerPlugin`] is the hook this crate provides. It runs the
//! pure [`ToolContextCleaner`] over `req.contexts` and writes the result
//! back. Hosts that run several hooks can chain them with [`HookChain`].
//!
//! ```
//! use tool_use_cleaner::prelude::*;
//!
//! let plugin = ToolUseCleanerPlugin::new(CleanerConfig::new().with_keep_rounds(1));
//!
//! let mut req = ProviderRequest::new("next question", vec![
//!     Message::user("first"),
//!     Message::assistant_tool_calls(vec![ToolCall::function("c1", "search", "{}")]),
//!     Message::tool_result("c1", "results"),
//!     Message::assistant_text("answer"),
//! ]);
//! plugin.on_llm_request(&mut req);
//! assert_eq!(req.contexts.len(), 2);
//! ```

use crate::ProviderRequest;
use crate::config::CleanerConfig;
use crate::context::{CleanReport, ToolContextCleaner};
use crate::observer::CleanObserver;
use tracing::info;

// ── Hook trait ─────────────────────────────────────────────────────

/// Called by the host immediately before a request goes to the model.
pub trait LlmRequestHook: Send + Sync {
    fn on_llm_request(&self, req: &mut ProviderRequest);
}

impl<H: LlmRequestHook + ?Sized> LlmRequestHook for Box<H> {
    fn on_llm_request(&self, req: &mut ProviderRequest) {
        (**self).on_llm_request(req)
    }
}

/// Runs several hooks in registration order.
///
/// ```ignore
/// let chain = HookChain::new()
///     .with(ToolUseCleanerPlugin::new(config))
///     .with_if(debug, RequestDumper::new());
/// ```
pub struct HookChain {
    hooks: Vec<Box<dyn LlmRequestHook>>,
}

impl HookChain {
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Add a hook to the chain.
    pub fn with(mut self, hook: impl LlmRequestHook + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Add a hook only when `condition` holds.
    pub fn with_if(self, condition: bool, hook: impl LlmRequestHook + 'static) -> Self {
        if condition { self.with(hook) } else { self }
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl Default for HookChain {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmRequestHook for HookChain {
    fn on_llm_request(&self, req: &mut ProviderRequest) {
        for hook in &self.hooks {
            hook.on_llm_request(req);
        }
    }
}

// ── Plugin ─────────────────────────────────────────────────────────

/// Registration metadata the host shows in its plugin list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginInfo {
    pub name: &'static str,
    pub author: &'static str,
    pub description: &'static str,
    pub version: &'static str,
}

/// Metadata for [`ToolUseCleanerPlugin`].
pub const PLUGIN_INFO: PluginInfo = PluginInfo {
    name: "tool_use_cleaner",
    author: "tool-use-cleaner contributors",
    description: "Before each LLM request, removes tool calls and tool results of earlier \
                  rounds from the request context to cut token waste",
    version: env!("CARGO_PKG_VERSION"),
};

/// Strips stale tool-use records from every outgoing request.
///
/// The configuration is read once at construction; the plugin itself holds
/// no mutable state and can serve concurrent requests.
pub struct ToolUseCleanerPlugin {
    config: CleanerConfig,
    cleaner: ToolContextCleaner,
    observer: Option<Box<dyn CleanObserver>>,
}

impl ToolUseCleanerPlugin {
    pub fn new(config: CleanerConfig) -> Self {
        let cleaner = config.build_cleaner();
        info!(
            "Tool use cleaner initialized ({}, function call cleaner {})",
            cleaner.mode(),
            if config.enable_function_call_cleaner {
                "on"
            } else {
                "off"
            }
        );
        Self {
            config,
            cleaner,
            observer: None,
        }
    }

    /// Forward each cleaning report to `observer`.
    pub fn with_observer(mut self, observer: impl CleanObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn info(&self) -> &'static PluginInfo {
        &PLUGIN_INFO
    }

    pub fn config(&self) -> &CleanerConfig {
        &self.config
    }

    /// Clean a request's history in place and return the report. An empty
    /// history is left alone and yields `None`.
    pub fn clean_request(&self, req: &mut ProviderRequest) -> Option<CleanReport> {
        if req.contexts.is_empty() {
            return None;
        }
        let (cleaned, report) = self.cleaner.clean(std::mem::take(&mut req.contexts));
        req.contexts = cleaned;
        if let Some(observer) = &self.observer {
            observer.on_clean(&report);
        }
        Some(report)
    }

    /// Called by the host when the plugin is unloaded.
    pub fn terminate(&self) {
        info!("Tool use cleaner unloaded");
    }
}

impl LlmRequestHook for ToolUseCleanerPlugin {
    fn on_llm_request(&self, req: &mut ProviderRequest) {
        self.clean_request(req);
    }
}
