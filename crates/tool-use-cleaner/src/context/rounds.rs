//! Round boundary detection over a flat message list.
//!
//! A round ends at an `assistant` message that is followed by a `user` or
//! `system` message, or at the final message if it is an `assistant` one.
//! This module only finds those boundaries and the cutoff they imply; the
//! strip pass in [`cleaner`](super::cleaner) decides what happens to each
//! message.

use crate::Message;
use std::num::NonZeroUsize;

/// A contiguous span of messages forming one round. Both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Round {
    pub start: usize,
    pub end: usize,
}

impl Round {
    /// Number of messages in the round.
    pub fn message_count(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start..=self.end).contains(&index)
    }
}

/// Indices of every round-ending message, in ascending order.
pub fn round_ends(messages: &[Message]) -> Vec<usize> {
    let mut ends: Vec<usize> = messages
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[0].is_assistant() && pair[1].opens_round())
        .map(|(i, _)| i)
        .collect();

    if let Some(last) = messages.last()
        && last.is_assistant()
    {
        ends.push(messages.len() - 1);
    }

    ends
}

/// Materialize the rounds delimited by [`round_ends`].
///
/// Messages after the last round end (an in-progress turn such as a trailing
/// user message or pending tool results) belong to no round.
pub fn rounds(messages: &[Message]) -> Vec<Round> {
    let mut start = 0;
    round_ends(messages)
        .into_iter()
        .map(|end| {
            let round = Round { start, end };
            start = end + 1;
            round
        })
        .collect()
}

/// Last index whose tool content may be stripped when keeping the most
/// recent `keep_rounds` rounds. `None` means nothing is old enough.
///
/// - no round ends: `None`;
/// - at most `keep_rounds` round ends: the first round end;
/// - otherwise the end of the round just before the `keep_rounds` most
///   recent ones.
pub fn cutoff_index(round_ends: &[usize], keep_rounds: NonZeroUsize) -> Option<usize> {
    let keep = keep_rounds.get();
    let count = round_ends.len();
    if count <= keep {
        round_ends.first().copied()
    } else {
        Some(round_ends[count - keep - 1])
    }
}
