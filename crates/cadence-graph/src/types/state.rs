use crate::error::GraphError;
use cadence_llm::{Message, ToolCall};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Name and description of a node, as shown to a supervisor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetadata {
    pub name: String,
    pub description: String,
}

impl NodeMetadata {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphState {
    pub thread_id: String,
    pub run_id: String,
    pub messages: Vec<Message>,
    #[serde(default)]
    pub node_registry: BTreeMap<String, NodeMetadata>,
    #[serde(default)]
    pub context: Map<String, Value>,
}

impl GraphState {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            run_id: uuid::Uuid::new_v4().to_string(),
            messages: Vec::new(),
            node_registry: BTreeMap::new(),
            context: Map::new(),
        }
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Append a message, assigning an id when it has none
    pub fn add_message(&mut self, mut message: Message) -> &Message {
        if message.id().is_none() {
            message.set_id(uuid::Uuid::new_v4().to_string());
        }
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    pub fn has_pending_tool_calls(&self) -> bool {
        self.last_message()
            .map(|msg| !msg.tool_calls().is_empty())
            .unwrap_or(false)
    }

    pub fn get_pending_tool_calls(&self) -> Vec<ToolCall> {
        self.last_message()
            .map(|msg| msg.tool_calls().to_vec())
            .unwrap_or_default()
    }

    pub fn register_nodes(&mut self, nodes: impl IntoIterator<Item = NodeMetadata>) {
        for node in nodes {
            self.node_registry.insert(node.name.clone(), node);
        }
    }

    pub fn context_str(&self, key: &str) -> Option<&str> {
        self.context.get(key).and_then(Value::as_str)
    }

    /// Merge a run's initial payload into the state.
    ///
    /// Messages are appended, or replace the history when the input carries
    /// the full conversation. `node_registry` replaces registry entries,
    /// `context` is merged, and any other extra key lands in `context`.
    pub fn apply_input(&mut self, input: GraphInput) -> Result<(), GraphError> {
        if input.replace_history {
            self.messages.clear();
        }
        for message in input.messages {
            self.add_message(message);
        }

        for (key, value) in input.extra {
            match key.as_str() {
                "node_registry" => {
                    let registry: BTreeMap<String, NodeMetadata> = serde_json::from_value(value)
                        .map_err(|e| GraphError::InvalidInput(format!("node_registry: {}", e)))?;
                    self.register_nodes(registry.into_values());
                }
                "context" => match value {
                    Value::Object(entries) => self.context.extend(entries),
                    Value::Null => {}
                    other => {
                        return Err(GraphError::InvalidInput(format!(
                            "context must be an object, got {}",
                            other
                        )))
                    }
                },
                _ => {
                    self.context.insert(key, value);
                }
            }
        }

        Ok(())
    }

    /// Apply a node's update and return the messages as stored (with ids)
    pub fn apply_update(&mut self, node: &str, update: NodeUpdate) -> Vec<Message> {
        let added: Vec<Message> = update
            .messages
            .into_iter()
            .map(|message| self.add_message(message).clone())
            .collect();

        self.context.extend(update.context);
        self.context
            .insert("last_node".to_string(), Value::String(node.to_string()));
        if let Some(last) = added.last() {
            self.context
                .insert("last_output".to_string(), Value::String(last.text()));
        }

        added
    }
}

/// Initial payload of a run: new messages plus arbitrary extra state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphInput {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub extra: Map<String, Value>,
    /// `messages` is the whole conversation and replaces restored history
    #[serde(default)]
    pub replace_history: bool,
}

impl GraphInput {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            extra: Map::new(),
            replace_history: false,
        }
    }

    pub fn with_full_history(mut self) -> Self {
        self.replace_history = true;
        self
    }

    pub fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra.extend(extra);
        self
    }

    pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// What a node hands back to the engine
#[derive(Debug, Clone, Default)]
pub struct NodeUpdate {
    pub messages: Vec<Message>,
    pub context: Map<String, Value>,
}

impl NodeUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_messages(mut self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_message_assigns_missing_ids() {
        let mut state = GraphState::new("t1");
        state.add_message(Message::human("hi"));
        state.add_message(Message::ai("hello").with_id("keep-me"));

        assert!(state.messages[0].id().is_some());
        assert_eq!(state.messages[1].id(), Some("keep-me"));
    }

    #[test]
    fn test_apply_input_routes_extra_keys() {
        let mut state = GraphState::new("t1");
        let input = GraphInput::new(vec![Message::human("hi")])
            .with_value(
                "node_registry",
                json!({"llm_node": {"name": "llm_node", "description": "Talks."}}),
            )
            .with_value("context", json!({"mood": "curious"}))
            .with_value("locale", json!("en"));

        state.apply_input(input).unwrap();

        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.node_registry["llm_node"].description, "Talks.");
        assert_eq!(state.context_str("mood"), Some("curious"));
        assert_eq!(state.context_str("locale"), Some("en"));
    }

    #[test]
    fn test_full_history_input_replaces_messages_and_keeps_context() {
        let mut state = GraphState::new("room");
        state.add_message(Message::human("hi"));
        state.add_message(Message::ai("hello"));
        state.context.insert("mood".to_string(), json!("curious"));

        let input = GraphInput::new(vec![
            Message::human("hi"),
            Message::ai("hello"),
            Message::human("tell me more"),
        ])
        .with_full_history();
        state.apply_input(input).unwrap();

        assert_eq!(state.messages.len(), 3);
        assert_eq!(state.messages[2].text(), "tell me more");
        assert_eq!(state.context_str("mood"), Some("curious"));

        state
            .apply_input(GraphInput::new(vec![Message::human("and more")]))
            .unwrap();
        assert_eq!(state.messages.len(), 4);
    }

    #[test]
    fn test_apply_input_rejects_bad_registry() {
        let mut state = GraphState::new("t1");
        let input = GraphInput::default().with_value("node_registry", json!(["llm_node"]));
        assert!(matches!(
            state.apply_input(input),
            Err(GraphError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_apply_update_records_last_node() {
        let mut state = GraphState::new("t1");
        let added = state.apply_update(
            "llm_node",
            NodeUpdate::new()
                .with_message(Message::ai("The answer"))
                .with_context("score", json!(3)),
        );

        assert_eq!(added.len(), 1);
        assert!(added[0].id().is_some());
        assert_eq!(state.context_str("last_node"), Some("llm_node"));
        assert_eq!(state.context_str("last_output"), Some("The answer"));
        assert_eq!(state.context["score"], json!(3));
    }

    #[test]
    fn test_pending_tool_calls() {
        let mut state = GraphState::new("t1");
        assert!(!state.has_pending_tool_calls());

        state.add_message(Message::ai_with_tools(vec![ToolCall::function(
            "call_1",
            "mtg_search",
            "{}",
        )]));
        assert!(state.has_pending_tool_calls());
        assert_eq!(state.get_pending_tool_calls()[0].id, "call_1");
    }
}
