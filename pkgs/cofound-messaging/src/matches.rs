//! Mutual matches that can start a conversation

use crate::models::{Conversation, MatchSummary};

/// True when some conversation already covers this match, either by match
/// id or by the counterpart's user id
pub fn has_conversation(conversations: &[Conversation], candidate: &MatchSummary) -> bool {
    let candidate_user = candidate
        .profile
        .as_ref()
        .and_then(|p| p.user_id.as_deref());

    conversations.iter().any(|conv| {
        if !conv.match_id.is_empty() && conv.match_id == candidate.match_id {
            return true;
        }
        let conv_user = conv
            .other_profile
            .as_ref()
            .and_then(|p| p.user_id.as_deref());
        matches!((conv_user, candidate_user), (Some(a), Some(b)) if a == b)
    })
}

/// Matches without a conversation, in the order given
pub fn available_matches(
    conversations: &[Conversation],
    matches: &[MatchSummary],
) -> Vec<MatchSummary> {
    matches
        .iter()
        .filter(|m| m.profile.is_some())
        .filter(|m| !has_conversation(conversations, m))
        .cloned()
        .collect()
}

/// Placeholder conversation for a match, seeded with the match profile
pub fn temporary_conversation(candidate: &MatchSummary) -> Conversation {
    Conversation::temporary(&candidate.match_id, candidate.profile.clone())
}
