//! Text derivation for the conversation list and message view

use crate::models::{Conversation, Message};

pub const NO_MESSAGES: &str = "No messages yet";

/// Up to two uppercase initials, `??` for an empty name
pub fn initials(name: &str) -> String {
    let letters: String = name
        .split_whitespace()
        .filter_map(|part| part.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect();

    if letters.is_empty() {
        "??".to_string()
    } else {
        letters
    }
}

/// Cut `text` to `max_chars` characters, marking the cut with `…`
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push('…');
    cut
}

/// Title shown for a conversation in the list and header
pub fn display_name(conversation: &Conversation) -> String {
    if let Some(title) = conversation.group.as_ref().and_then(|g| g.title.as_deref()) {
        return title.to_string();
    }
    conversation
        .other_profile
        .as_ref()
        .and_then(|p| p.name.as_deref().or(p.current_role.as_deref()))
        .unwrap_or("User")
        .to_string()
}

/// One-line preview of the latest message.
///
/// Group previews are prefixed with `You`, the sender's first name, or
/// `Someone` when the sender is not on the roster.
pub fn preview_line(
    conversation: &Conversation,
    me: Option<&str>,
    direct_len: usize,
    group_len: usize,
) -> String {
    let Some(last) = conversation.preview.as_ref() else {
        return NO_MESSAGES.to_string();
    };

    if !conversation.is_group() {
        return truncate(&last.body, direct_len);
    }

    let sender = if me == Some(last.sender_id.as_str()) {
        "You"
    } else {
        conversation
            .participant(&last.sender_id)
            .and_then(|p| p.first_name())
            .unwrap_or("Someone")
    };
    truncate(&format!("{}: {}", sender, last.body), group_len)
}

/// `Ada, Grace, Linus +2` style roster summary
pub fn participant_summary(conversation: &Conversation) -> String {
    let participants = conversation.participants();
    let mut summary = participants
        .iter()
        .take(3)
        .map(|p| p.first_name().unwrap_or("User"))
        .collect::<Vec<_>>()
        .join(", ");

    if participants.len() > 3 {
        summary.push_str(&format!(" +{}", participants.len() - 3));
    }
    summary
}

/// Whether a group message starts a new run from another sender and so
/// gets a name label. Own messages are never labelled.
pub fn shows_sender_label(messages: &[Message], index: usize, is_own: bool) -> bool {
    if is_own {
        return false;
    }
    match (index.checked_sub(1).and_then(|i| messages.get(i)), messages.get(index)) {
        (_, None) => false,
        (None, Some(_)) => true,
        (Some(prev), Some(current)) => prev.sender_id != current.sender_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GroupConversation, Participant, ParticipantRole, ProfileSummary};

    fn participant(id: &str, name: &str) -> Participant {
        Participant {
            profile_id: id.to_string(),
            name: Some(name.to_string()),
            photo_url: None,
            current_role: None,
            role: ParticipantRole::Member,
        }
    }

    fn message(sender: &str, body: &str) -> Message {
        Message {
            id: format!("{sender}-{body}"),
            conversation_id: None,
            sender_id: sender.to_string(),
            body: body.to_string(),
            created_at: None,
        }
    }

    fn team(names: &[&str]) -> Conversation {
        GroupConversation {
            id: "g1".to_string(),
            title: Some("Rocket Team".to_string()),
            participants: names
                .iter()
                .enumerate()
                .map(|(i, n)| participant(&format!("p{i}"), n))
                .collect(),
            ..Default::default()
        }
        .into_conversation()
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("ada lovelace byron"), "AL");
        assert_eq!(initials("Grace"), "G");
        assert_eq!(initials("   "), "??");
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("héllo world", 5), "héllo…");
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(display_name(&team(&[])), "Rocket Team");

        let mut direct = Conversation::temporary("m1", None);
        assert_eq!(display_name(&direct), "User");
        direct.other_profile = Some(ProfileSummary {
            current_role: Some("CTO".to_string()),
            ..Default::default()
        });
        assert_eq!(display_name(&direct), "CTO");
    }

    #[test]
    fn test_group_preview_labels() {
        let mut conv = team(&["Ada Lovelace", "Grace Hopper"]);
        assert_eq!(preview_line(&conv, Some("p0"), 35, 32), NO_MESSAGES);

        conv.preview = Some(message("p1", "ship it"));
        assert_eq!(preview_line(&conv, Some("p0"), 35, 32), "Grace: ship it");

        conv.preview = Some(message("p0", "ok"));
        assert_eq!(preview_line(&conv, Some("p0"), 35, 32), "You: ok");

        conv.preview = Some(message("stranger", "hi"));
        assert_eq!(preview_line(&conv, Some("p0"), 35, 32), "Someone: hi");
    }

    #[test]
    fn test_participant_summary_overflow() {
        let conv = team(&["Ada L", "Grace H", "Linus T", "Ken T", "Dennis R"]);
        assert_eq!(participant_summary(&conv), "Ada, Grace, Linus +2");
    }

    #[test]
    fn test_sender_label_runs() {
        let messages = vec![message("a", "1"), message("a", "2"), message("b", "3")];
        assert!(shows_sender_label(&messages, 0, false));
        assert!(!shows_sender_label(&messages, 1, false));
        assert!(shows_sender_label(&messages, 2, false));
        assert!(!shows_sender_label(&messages, 2, true));
    }
}
