//! Property tests for the cleaning transform.
//!
//! For arbitrary histories and window sizes:
//! 1. **Length** - the output is never longer than the input
//! 2. **Order** - surviving messages keep their relative order
//! 3. **Idempotence** - strip-all mode is a fixed point on its own output
//! 4. **Window** - everything after the cutoff is returned unchanged

use proptest::prelude::*;
use tool_use_cleaner::prelude::*;

// ============================================================================
// GENERATORS
// ============================================================================

fn message_strategy() -> impl Strategy<Value = Message> {
    prop_oneof![
        Just(Message::user("")),
        Just(Message::system("")),
        Just(Message::assistant_text("")),
        Just(Message::assistant_with_tool_calls(
            "",
            vec![ToolCall::function("c", "grep", "{}")]
        )),
        Just(Message::assistant_tool_calls(vec![ToolCall::function(
            "c", "grep", "{}"
        )])),
        Just(Message::tool_result("c", "")),
        Just(Message::opaque(serde_json::Map::new())),
    ]
}

/// A history whose messages carry their input position in an `idx` field,
/// so survivors can be traced back. Some content-less assistants get text.
fn history_strategy() -> impl Strategy<Value = Vec<Message>> {
    prop::collection::vec(message_strategy(), 0..40).prop_map(|msgs| {
        msgs.into_iter()
            .enumerate()
            .map(|(i, mut m)| {
                if m.content.is_some() || (m.is_assistant() && i % 3 == 0) {
                    m.content = Some(MessageContent::Text(i.to_string()));
                }
                m.extra.insert("idx".into(), serde_json::json!(i));
                m
            })
            .collect()
    })
}

fn index_of(m: &Message) -> u64 {
    m.extra["idx"].as_u64().unwrap()
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #[test]
    fn output_never_longer(history in history_strategy(), keep in 0usize..6) {
        let out = clean(history.clone(), keep);
        prop_assert!(out.len() <= history.len());
    }

    #[test]
    fn survivors_keep_order(history in history_strategy(), keep in 0usize..6) {
        let out = clean(history, keep);
        let indices: Vec<u64> = out.iter().map(index_of).collect();
        prop_assert!(indices.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn strip_all_is_idempotent(history in history_strategy()) {
        let once = clean(history, 0);
        let twice = clean(once.clone(), 0);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn strip_all_leaves_no_tool_content(history in history_strategy()) {
        let out = clean(history, 0);
        prop_assert!(out.iter().all(|m| !m.is_tool()));
        prop_assert!(out.iter().all(|m| m.tool_calls.is_none()));
        prop_assert!(out.iter().all(|m| !m.is_assistant() || m.has_content()));
    }

    #[test]
    fn tail_after_cutoff_is_untouched(history in history_strategy(), keep in 1i64..6) {
        let cleaner = ToolContextCleaner::new(CleanMode::from_keep_rounds(keep));
        let (out, report) = cleaner.clean(history.clone());
        let tail_start = report.cutoff.map_or(0, |c| c + 1);
        let tail = &history[tail_start..];
        prop_assert!(out.len() >= tail.len());
        prop_assert_eq!(&out[out.len() - tail.len()..], tail);

        let head = &out[..out.len() - tail.len()];
        prop_assert!(head.iter().all(|m| !m.is_tool()));
        prop_assert!(head.iter().all(|m| !m.is_assistant() || m.has_content()));
    }
}
