// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation history shaping for the model call.
//!
//! The model API requires the first turn to come from the user and forbids
//! two consecutive turns with the same role.

use seatbot_core::{ChatMessage, ConversationTurn, Speaker, TurnRole};

/// Stored messages sent as history by default.
pub const DEFAULT_HISTORY_TURNS: usize = 20;

fn role_of(speaker: Speaker) -> TurnRole {
    match speaker {
        Speaker::Bot | Speaker::Agent => TurnRole::Assistant,
        Speaker::Customer => TurnRole::User,
    }
}

/// Builds model turns from the last `limit` stored messages plus the
/// current inbound text.
///
/// `stored` must not already contain the current message.
pub fn normalize_history<'a, I>(stored: I, current: &str, limit: usize) -> Vec<ConversationTurn>
where
    I: IntoIterator<Item = &'a ChatMessage>,
    I::IntoIter: DoubleEndedIterator,
{
    let mut recent: Vec<ConversationTurn> = stored
        .into_iter()
        .rev()
        .take(limit)
        .map(|m| ConversationTurn {
            role: role_of(m.from),
            text: m.text.clone(),
        })
        .collect();
    recent.reverse();
    recent.push(ConversationTurn::user(current));
    normalize_turns(recent)
}

/// Drops leading assistant turns and merges same-role neighbours with `\n`.
pub fn normalize_turns(turns: impl IntoIterator<Item = ConversationTurn>) -> Vec<ConversationTurn> {
    let mut normalized: Vec<ConversationTurn> = Vec::new();

    for turn in turns {
        if normalized.is_empty() && turn.role == TurnRole::Assistant {
            continue;
        }
        match normalized.last_mut() {
            Some(last) if last.role == turn.role => {
                last.text.push('\n');
                last.text.push_str(&turn.text);
            }
            _ => normalized.push(turn),
        }
    }

    normalized
}
