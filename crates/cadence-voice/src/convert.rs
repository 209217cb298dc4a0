use cadence_llm::Message;

use crate::chat::{ChatMessage, ChatRole};
use crate::error::AdapterError;

/// Assistant messages stay assistant messages; every other role becomes a
/// human message. Only the content survives.
pub fn to_engine_message(message: &ChatMessage) -> Message {
    match message.role {
        ChatRole::Assistant => Message::ai(message.content.clone()),
        ChatRole::User | ChatRole::System | ChatRole::Tool => Message::human(message.content.clone()),
    }
}

/// Inverse of [`to_engine_message`], collapsing non-assistant roles to `user`.
///
/// An id that is not an integer timestamp leaves `timestamp` empty.
pub fn from_engine_message(message: &Message) -> ChatMessage {
    let role = if message.is_assistant() {
        ChatRole::Assistant
    } else {
        ChatRole::User
    };

    let timestamp = message.id().and_then(|id| match parse_timestamp(id) {
        Ok(ts) => Some(ts),
        Err(e) => {
            tracing::debug!("Dropping timestamp: {}", e);
            None
        }
    });

    ChatMessage {
        role,
        content: message.text(),
        timestamp,
    }
}

pub fn parse_timestamp(id: &str) -> Result<i64, AdapterError> {
    id.trim()
        .parse::<i64>()
        .map_err(|_| AdapterError::MalformedTimestamp { id: id.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_keeps_content_and_assistant_flag() {
        let cases = [
            ChatMessage::user("hi"),
            ChatMessage::assistant("Hello there"),
            ChatMessage::system("rules"),
            ChatMessage::new(ChatRole::Tool, "{\"ok\":true}"),
            ChatMessage::user(""),
        ];

        for original in cases {
            let back = from_engine_message(&to_engine_message(&original));
            assert_eq!(back.content, original.content);
            assert_eq!(
                back.role == ChatRole::Assistant,
                original.role == ChatRole::Assistant
            );
        }
    }

    #[test]
    fn test_non_assistant_roles_collapse_to_user() {
        let back = from_engine_message(&to_engine_message(&ChatMessage::system("rules")));
        assert_eq!(back.role, ChatRole::User);
    }

    #[test]
    fn test_numeric_id_becomes_timestamp() {
        let message = Message::ai("Hi").with_id("1700000000000");
        assert_eq!(from_engine_message(&message).timestamp, Some(1_700_000_000_000));
    }

    #[test]
    fn test_opaque_id_is_not_fatal() {
        let message = Message::ai("Hi").with_id("run-5f2c");
        let converted = from_engine_message(&message);
        assert_eq!(converted.timestamp, None);
        assert_eq!(converted.content, "Hi");

        assert!(matches!(
            parse_timestamp("run-5f2c"),
            Err(AdapterError::MalformedTimestamp { id }) if id == "run-5f2c"
        ));
    }
}
