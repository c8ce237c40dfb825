//! Tool-use stripping: drop tool results and tool-call stubs from old rounds.
//!
//! Two modes:
//!
//! - [`CleanMode::StripAll`] applies the strip rule to every message.
//! - [`CleanMode::Windowed`] finds the cutoff with
//!   [`cutoff_index`](super::rounds::cutoff_index) and applies the rule only
//!   at or before it. Everything after the cutoff is returned as it came in.
//!
//! The strip rule for one message:
//!
//! | Message | Result |
//! |---------|--------|
//! | `tool` role | dropped |
//! | `assistant`, empty content | dropped |
//! | `assistant` with `tool_calls` | kept, `tool_calls` removed |
//! | anything else | kept |

use super::rounds::{cutoff_index, round_ends};
use crate::Message;
use std::num::NonZeroUsize;
use tracing::{debug, info};

/// How much of the history the cleaner touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanMode {
    /// Strip tool content from every message.
    #[default]
    StripAll,
    /// Keep the most recent `keep_rounds` rounds untouched.
    Windowed { keep_rounds: NonZeroUsize },
}

impl CleanMode {
    /// Map a configured round count to a mode. Zero and negative values mean
    /// strip-all.
    pub fn from_keep_rounds(keep_rounds: i64) -> Self {
        usize::try_from(keep_rounds)
            .ok()
            .and_then(NonZeroUsize::new)
            .map_or(CleanMode::StripAll, |keep_rounds| CleanMode::Windowed {
                keep_rounds,
            })
    }

    /// The retention window size (`0` for strip-all).
    pub fn keep_rounds(&self) -> usize {
        match self {
            CleanMode::StripAll => 0,
            CleanMode::Windowed { keep_rounds } => keep_rounds.get(),
        }
    }
}

impl std::fmt::Display for CleanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CleanMode::StripAll => write!(f, "strip-all"),
            CleanMode::Windowed { keep_rounds } => write!(f, "keep last {keep_rounds} round(s)"),
        }
    }
}

/// Which parts of the strip rule are active.
///
/// `tool` messages are always dropped. With `strip_assistant_tool_calls`
/// off, assistant messages are left as they are: no empty-content drop and
/// no `tool_calls` removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripRule {
    pub strip_assistant_tool_calls: bool,
}

impl Default for StripRule {
    fn default() -> Self {
        Self {
            strip_assistant_tool_calls: true,
        }
    }
}

/// Apply the strip rule to one message. `None` means the message is dropped.
pub fn strip_message(mut msg: Message, rule: StripRule) -> Option<Message> {
    if msg.is_tool() {
        return None;
    }
    if rule.strip_assistant_tool_calls && msg.is_assistant() {
        if !msg.has_content() {
            return None;
        }
        msg.tool_calls = None;
    }
    Some(msg)
}

/// Outcome of one cleaning pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanReport {
    pub mode: CleanMode,
    pub original_count: usize,
    pub cleaned_count: usize,
    /// Round-end indices found in the input (empty in strip-all mode).
    pub round_ends: Vec<usize>,
    /// Last input index the strip rule was applied to. `None` if nothing
    /// was eligible.
    pub cutoff: Option<usize>,
}

impl CleanReport {
    /// Number of messages dropped.
    pub fn removed(&self) -> usize {
        self.original_count.saturating_sub(self.cleaned_count)
    }
}

/// Removes tool-use records from conversation history.
///
/// Holds only read-only configuration, so one instance can serve any number
/// of concurrent requests.
///
/// # Example
///
/// ```
/// use tool_use_cleaner::Message;
/// use tool_use_cleaner::context::{CleanMode, ToolContextCleaner};
///
/// let cleaner = ToolContextCleaner::new(CleanMode::from_keep_rounds(1));
/// let history = vec![Message::user("hi"), Message::assistant_text("hello")];
/// let (cleaned, report) = cleaner.clean(history);
/// assert_eq!(cleaned.len(), 2);
/// assert_eq!(report.removed(), 0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolContextCleaner {
    mode: CleanMode,
    rule: StripRule,
}

impl ToolContextCleaner {
    pub fn new(mode: CleanMode) -> Self {
        Self {
            mode,
            rule: StripRule::default(),
        }
    }

    pub fn with_rule(mut self, rule: StripRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn mode(&self) -> CleanMode {
        self.mode
    }

    pub fn rule(&self) -> StripRule {
        self.rule
    }

    /// Clean `messages`, returning the rewritten list and a report.
    pub fn clean(&self, messages: Vec<Message>) -> (Vec<Message>, CleanReport) {
        let original_count = messages.len();

        let (ends, cutoff) = match self.mode {
            CleanMode::StripAll => (Vec::new(), original_count.checked_sub(1)),
            CleanMode::Windowed { keep_rounds } => {
                let ends = round_ends(&messages);
                let cutoff = cutoff_index(&ends, keep_rounds);
                debug!(
                    "Tool context window: keeping last {} round(s), {} round end(s), cutoff={:?}",
                    keep_rounds,
                    ends.len(),
                    cutoff
                );
                (ends, cutoff)
            }
        };

        let cleaned: Vec<Message> = match cutoff {
            None => messages,
            Some(cutoff) => messages
                .into_iter()
                .enumerate()
                .filter_map(|(i, msg)| {
                    if i > cutoff {
                        Some(msg)
                    } else {
                        strip_message(msg, self.rule)
                    }
                })
                .collect(),
        };

        let report = CleanReport {
            mode: self.mode,
            original_count,
            cleaned_count: cleaned.len(),
            round_ends: ends,
            cutoff,
        };

        if report.removed() > 0 {
            info!(
                "Context cleaned: removed {} tool call message(s) and responses",
                report.removed()
            );
        }

        (cleaned, report)
    }
}

/// Clean `messages` with the default strip rule.
///
/// `keep_rounds == 0` strips tool content everywhere; a positive value keeps
/// the most recent `keep_rounds` rounds untouched.
pub fn clean(messages: Vec<Message>, keep_rounds: usize) -> Vec<Message> {
    let mode = NonZeroUsize::new(keep_rounds)
        .map_or(CleanMode::StripAll, |keep_rounds| CleanMode::Windowed {
            keep_rounds,
        });
    ToolContextCleaner::new(mode).clean(messages).0
}
