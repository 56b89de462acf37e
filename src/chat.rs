//! Conversation and message state for the chat screens.
//!
//! Deliberately thin: it speaks the same fetch/response contract as the
//! vehicle endpoints and accepts realtime messages pushed in by the shell's
//! socket. Ordering, delivery guarantees and read receipts beyond the
//! fetched flags are the backend's business.

use serde::{Deserialize, Serialize};

use crate::{ConversationId, UserId, VehicleId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(rename = "_id")]
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    pub sender: UserId,
    pub content: String,
    #[serde(default)]
    pub read: bool,
    /// RFC 3339, as sent by the API. Lexicographic order is time order.
    #[serde(rename = "createdAt", default)]
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePreview {
    pub content: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub read: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(rename = "_id")]
    pub id: ConversationId,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(rename = "vehicleId", default)]
    pub vehicle_id: Option<VehicleId>,
    #[serde(rename = "lastMessage", default)]
    pub last_message: Option<MessagePreview>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Conversation {
    /// The counterpart shown in the list row.
    #[must_use]
    pub fn other_participant(&self, me: &UserId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id != me)
    }

    #[must_use]
    pub fn has_unread_from_others(&self, me: &UserId) -> bool {
        if self
            .messages
            .iter()
            .any(|m| !m.read && &m.sender != me)
        {
            return true;
        }
        // List rows often arrive without the message history.
        self.messages.is_empty()
            && self.last_message.as_ref().map_or(false, |m| !m.read)
    }

    /// Insert keeping timestamp order; duplicates (same id) are dropped, so
    /// a realtime push racing the fetch cannot double a message.
    pub fn push_message(&mut self, message: Message) {
        if let Some(id) = &message.id {
            if self
                .messages
                .iter()
                .any(|m| m.id.as_deref() == Some(id.as_str()))
            {
                return;
            }
        }

        self.last_message = Some(MessagePreview {
            content: message.content.clone(),
            timestamp: message.created_at.clone(),
            read: message.read,
        });

        let position = self
            .messages
            .iter()
            .position(|m| m.created_at > message.created_at)
            .unwrap_or(self.messages.len());
        self.messages.insert(position, message);
    }

    pub fn mark_read(&mut self, me: &UserId) {
        for message in &mut self.messages {
            if &message.sender != me {
                message.read = true;
            }
        }
        if let Some(preview) = &mut self.last_message {
            preview.read = true;
        }
    }
}

#[must_use]
pub fn unread_count(conversations: &[Conversation], me: &UserId) -> usize {
    conversations
        .iter()
        .filter(|c| c.has_unread_from_others(me))
        .count()
}

/// Case-insensitive participant-name search over the conversation list.
#[must_use]
pub fn search<'a>(
    conversations: &'a [Conversation],
    me: &UserId,
    query: &str,
) -> Vec<&'a Conversation> {
    let query = query.trim().to_lowercase();
    conversations
        .iter()
        .filter(|c| {
            if query.is_empty() {
                return true;
            }
            c.other_participant(me)
                .map_or(false, |p| p.name.to_lowercase().contains(&query))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn me() -> UserId {
        UserId::new("me")
    }

    fn conversation(id: &str, other_name: &str) -> Conversation {
        serde_json::from_value(serde_json::json!({
            "_id": id,
            "participants": [
                {"_id": "me", "name": "You"},
                {"_id": format!("other-{id}"), "name": other_name}
            ]
        }))
        .unwrap()
    }

    fn message(id: &str, sender: &str, at: &str) -> Message {
        Message {
            id: Some(id.into()),
            sender: UserId::new(sender),
            content: format!("msg {id}"),
            read: false,
            created_at: at.into(),
        }
    }

    #[test]
    fn messages_stay_in_timestamp_order() {
        let mut conv = conversation("c1", "Seller");
        conv.push_message(message("m2", "other", "2024-04-02T10:00:00Z"));
        conv.push_message(message("m1", "other", "2024-04-01T10:00:00Z"));
        conv.push_message(message("m3", "me", "2024-04-03T10:00:00Z"));

        let ids: Vec<&str> = conv
            .messages
            .iter()
            .map(|m| m.id.as_deref().unwrap())
            .collect();
        assert_eq!(ids, ["m1", "m2", "m3"]);
        assert_eq!(conv.last_message.as_ref().unwrap().content, "msg m3");
    }

    #[test]
    fn duplicate_push_is_ignored() {
        let mut conv = conversation("c1", "Seller");
        conv.push_message(message("m1", "other", "2024-04-01T10:00:00Z"));
        conv.push_message(message("m1", "other", "2024-04-01T10:00:00Z"));
        assert_eq!(conv.messages.len(), 1);
    }

    #[test]
    fn unread_counts_only_messages_from_others() {
        let mut a = conversation("a", "Seller A");
        a.push_message(message("m1", "other-a", "2024-04-01T10:00:00Z"));

        let mut b = conversation("b", "Seller B");
        b.push_message(message("m2", "me", "2024-04-01T10:00:00Z"));

        assert_eq!(unread_count(&[a.clone(), b], &me()), 1);

        a.mark_read(&me());
        assert!(!a.has_unread_from_others(&me()));
    }

    #[test]
    fn search_matches_the_counterpart_name() {
        let conversations = vec![
            conversation("a", "Vinhanmobile"),
            conversation("b", "Chợ Tốt"),
        ];

        assert_eq!(search(&conversations, &me(), "vinhan").len(), 1);
        assert_eq!(search(&conversations, &me(), "").len(), 2);
        assert_eq!(search(&conversations, &me(), "nobody").len(), 0);
    }
}
