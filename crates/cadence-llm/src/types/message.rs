use serde::{Deserialize, Serialize};
use super::content::Content;
use super::tool::ToolCall;

/// Cadence message types (high-level, provider-agnostic)
///
/// Every variant carries an optional `id`. Callers usually leave it empty;
/// the graph engine assigns one when the message enters graph state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    /// System prompt (instructions)
    System {
        content: Content,

        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,

        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// User/Human message
    #[serde(rename = "user")]
    Human {
        content: Content,

        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,

        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// Assistant/AI message, possibly a partial chunk
    #[serde(rename = "assistant")]
    AI {
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<Content>,

        #[serde(skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<ToolCall>>,

        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,

        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// Tool result message
    Tool {
        tool_call_id: String,
        content: Content,

        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
}

impl Message {
    pub fn system(content: impl Into<Content>) -> Self {
        Self::System {
            content: content.into(),
            name: None,
            id: None,
        }
    }

    pub fn human(content: impl Into<Content>) -> Self {
        Self::Human {
            content: content.into(),
            name: None,
            id: None,
        }
    }

    pub fn ai(content: impl Into<Content>) -> Self {
        Self::AI {
            content: Some(content.into()),
            tool_calls: None,
            name: None,
            id: None,
        }
    }

    pub fn ai_with_tools(tool_calls: Vec<ToolCall>) -> Self {
        Self::AI {
            content: None,
            tool_calls: Some(tool_calls),
            name: None,
            id: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<Content>) -> Self {
        Self::Tool {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
            id: None,
        }
    }

    /// Builder-style id assignment
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.set_id(id);
        self
    }

    pub fn role(&self) -> &str {
        match self {
            Self::System { .. } => "system",
            Self::Human { .. } => "user",
            Self::AI { .. } => "assistant",
            Self::Tool { .. } => "tool",
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Self::System { id, .. }
            | Self::Human { id, .. }
            | Self::AI { id, .. }
            | Self::Tool { id, .. } => id.as_deref(),
        }
    }

    pub fn set_id(&mut self, new_id: impl Into<String>) {
        match self {
            Self::System { id, .. }
            | Self::Human { id, .. }
            | Self::AI { id, .. }
            | Self::Tool { id, .. } => *id = Some(new_id.into()),
        }
    }

    /// Text of the message; empty when an assistant message carries no content
    pub fn text(&self) -> String {
        match self {
            Self::System { content, .. }
            | Self::Human { content, .. }
            | Self::Tool { content, .. } => content.to_text(),
            Self::AI { content, .. } => content
                .as_ref()
                .map(Content::to_text)
                .unwrap_or_default(),
        }
    }

    pub fn is_assistant(&self) -> bool {
        matches!(self, Self::AI { .. })
    }

    /// Tool results, and assistant messages that request tool calls.
    ///
    /// These report tool traffic and never carry user-facing text.
    pub fn is_tool_invocation(&self) -> bool {
        match self {
            Self::Tool { .. } => true,
            Self::AI { tool_calls: Some(calls), .. } => !calls.is_empty(),
            _ => false,
        }
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Self::AI { tool_calls: Some(calls), .. } => calls,
            _ => &[],
        }
    }
}
