//! Conversation context rewriting.
//!
//! Cleaning runs in two passes so each can be tested on its own:
//!
//! 1. **[`rounds`]** finds round boundaries in the flat message list and
//!    turns the retention window into a cutoff index.
//! 2. **[`cleaner`]** applies the strip rule to every message at or before
//!    the cutoff and leaves the rest alone.

pub mod cleaner;
pub mod rounds;

// Re-export commonly used items at the module level.
pub use cleaner::{CleanMode, CleanReport, StripRule, ToolContextCleaner, clean, strip_message};
pub use rounds::{Round, cutoff_index, round_ends, rounds};
