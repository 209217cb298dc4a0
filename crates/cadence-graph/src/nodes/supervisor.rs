use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use cadence_llm::{ChatClient, ChatOptions, ChatRequest, Message};
use serde_json::Value;

use crate::node::{Node, StreamWriter};
use crate::types::{GraphState, NodeUpdate};

/// Asks the model which registered node should run next
pub struct SupervisorNode {
    client: Arc<dyn ChatClient>,
    model: String,
}

impl SupervisorNode {
    pub fn new(client: Arc<dyn ChatClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub(crate) fn build_prompt(state: &GraphState) -> String {
        let conversation = state
            .messages
            .iter()
            .map(Message::text)
            .collect::<Vec<_>>()
            .join("\n");
        let last_node = state.context_str("last_node").unwrap_or("None");
        let last_output = state
            .context_str("last_output")
            .unwrap_or("No output available");
        let node_list = state
            .node_registry
            .values()
            .map(|meta| format!("- {}: {}", meta.name, meta.description))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "You are a workflow supervisor. Based on the following details, decide which node should run next.\n\n\
             Conversation so far:\n{}\n\n\
             Last node executed: {}\n\
             Output from last node: {}\n\n\
             Available nodes:\n{}\n\n\
             Please output ONLY the exact name of the node that should execute next.",
            conversation, last_node, last_output, node_list
        )
    }
}

#[async_trait]
impl Node for SupervisorNode {
    async fn execute(&self, state: &GraphState, _writer: &StreamWriter) -> Result<NodeUpdate> {
        let request = ChatRequest::new(
            self.model.clone(),
            vec![Message::system(Self::build_prompt(state))],
        )
        .with_options(ChatOptions::new().temperature(0.0));

        let response = self.client.chat(request).await?;
        let decision = response.content.unwrap_or_default().trim().to_string();
        tracing::info!("SUPERVISOR: next node = '{}'", decision);

        Ok(NodeUpdate::new()
            .with_context("supervisor_decision", Value::String(decision.clone()))
            .with_message(Message::human(format!("[Supervisor] Next node: {}", decision))))
    }
}
