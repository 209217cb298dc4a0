use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a message in the voice pipeline's chat context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
    Tool,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role = match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
            Self::Tool => "tool",
        };
        f.write_str(role)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    /// Milliseconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Ordered, append-only conversation history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatContext {
    pub messages: Vec<ChatMessage>,
}

impl ChatContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        let mut ctx = Self::new();
        ctx.append(ChatMessage::system(prompt));
        ctx
    }

    /// Append a message, stamping it with the current time if unstamped
    pub fn append(&mut self, mut message: ChatMessage) -> &mut Self {
        if message.timestamp.is_none() {
            message.timestamp = Some(chrono::Utc::now().timestamp_millis());
        }
        self.messages.push(message);
        self
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// One assistant reply fragment produced by the adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatDelta {
    pub index: u64,
    pub role: ChatRole,
    pub content: String,
}

/// Streaming chat-completion chunk handed to the voice pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatChunk {
    pub request_id: String,
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub index: u64,
    pub delta: ChoiceDelta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceDelta {
    pub role: ChatRole,
    pub content: String,
}

impl ChatChunk {
    pub fn from_delta(request_id: impl Into<String>, delta: ChatDelta) -> Self {
        Self {
            request_id: request_id.into(),
            choices: vec![Choice {
                index: delta.index,
                delta: ChoiceDelta {
                    role: delta.role,
                    content: delta.content,
                },
            }],
        }
    }

    /// Text of every choice, in order
    pub fn content(&self) -> String {
        self.choices.iter().map(|c| c.delta.content.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_wire_shape() {
        let chunk = ChatChunk::from_delta(
            "session-1",
            ChatDelta {
                index: 1,
                role: ChatRole::Assistant,
                content: "Hello".to_string(),
            },
        );
        let json = serde_json::to_value(&chunk).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "request_id": "session-1",
                "choices": [{"index": 1, "delta": {"role": "assistant", "content": "Hello"}}]
            })
        );
        assert_eq!(chunk.content(), "Hello");
    }

    #[test]
    fn test_append_stamps_messages() {
        let mut ctx = ChatContext::with_system_prompt("Be brief.");
        ctx.append(ChatMessage::user("hi").with_timestamp(42));
        assert_eq!(ctx.len(), 2);
        assert!(ctx.messages[0].timestamp.is_some());
        assert_eq!(ctx.messages[1].timestamp, Some(42));
    }
}
