use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use cadence_llm::{
    ChatClient, ChatOptions, ChatRequest, EventStream, Message, StreamEvent, ToolCall, ToolChoice,
};
use futures::StreamExt;

use crate::node::{Node, StreamWriter};
use crate::tools::ToolExecutor;
use crate::types::{GraphState, LlmConfig, NodeMetadata, NodeUpdate};

/// Generates the next assistant message from the conversation so far
pub struct LlmNode {
    name: String,
    description: String,
    client: Arc<dyn ChatClient>,
    config: LlmConfig,
    system_prompt: Option<String>,
    tools: Option<Arc<dyn ToolExecutor>>,
}

impl LlmNode {
    pub fn new(client: Arc<dyn ChatClient>, config: LlmConfig) -> Self {
        Self {
            name: "llm_node".to_string(),
            description: "Generates responses using an LLM based on conversation history."
                .to_string(),
            client,
            config,
            system_prompt: None,
            tools: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_tools(mut self, tools: Arc<dyn ToolExecutor>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn metadata(&self) -> NodeMetadata {
        NodeMetadata::new(self.name.clone(), self.description.clone())
    }

    fn build_request(&self, state: &GraphState) -> ChatRequest {
        let mut messages = Vec::with_capacity(state.messages.len() + 1);
        if let Some(prompt) = &self.system_prompt {
            messages.push(Message::system(prompt.clone()));
        }
        messages.extend(state.messages.iter().cloned());

        let mut options = ChatOptions::new();
        if let Some(temp) = self.config.temperature {
            options = options.temperature(temp);
        }
        if let Some(max_tokens) = self.config.max_tokens {
            options = options.max_tokens(max_tokens);
        }
        if let Some(tools) = &self.tools {
            let definitions = tools.list_tools();
            if !definitions.is_empty() {
                options = options.tools(definitions).tool_choice(ToolChoice::auto());
            }
        }

        ChatRequest::new(self.config.model.clone(), messages).with_options(options)
    }

    /// Forward chunks through the writer and reassemble the final message
    async fn process_stream(&self, mut stream: EventStream, writer: &StreamWriter) -> Result<Message> {
        let message_id = uuid::Uuid::new_v4().to_string();
        let mut content = String::new();
        // index -> (id, name, arguments)
        let mut tool_call_buffers: BTreeMap<u32, (Option<String>, Option<String>, String)> =
            BTreeMap::new();

        while let Some(event) = stream.next().await {
            match event? {
                StreamEvent::Message { content: chunk } => {
                    if chunk.is_empty() {
                        continue;
                    }
                    content.push_str(&chunk);
                    writer
                        .emit_message(Message::ai(chunk).with_id(message_id.clone()))
                        .await?;
                }
                StreamEvent::ToolCall {
                    index,
                    id,
                    name,
                    arguments,
                } => {
                    let entry = tool_call_buffers
                        .entry(index)
                        .or_insert((None, None, String::new()));
                    if let Some(id) = &id {
                        entry.0 = Some(id.clone());
                    }
                    if let Some(name) = &name {
                        entry.1 = Some(name.clone());
                    }
                    if let Some(args) = &arguments {
                        entry.2.push_str(args);
                    }

                    let fragment = ToolCall::function(
                        id.unwrap_or_default(),
                        name.unwrap_or_default(),
                        arguments.unwrap_or_default(),
                    );
                    writer
                        .emit_message(Message::ai_with_tools(vec![fragment]).with_id(message_id.clone()))
                        .await?;
                }
                StreamEvent::Done { finish_reason } => {
                    tracing::debug!("LLM stream done: {:?}", finish_reason);
                }
            }
        }

        let tool_calls: Vec<ToolCall> = tool_call_buffers
            .into_values()
            .filter_map(|(id, name, arguments)| match (id, name) {
                (Some(id), Some(name)) => Some(ToolCall::function(id, name, arguments)),
                _ => None,
            })
            .collect();

        Ok(Message::AI {
            content: (!content.is_empty()).then(|| content.into()),
            tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
            name: None,
            id: Some(message_id),
        })
    }
}

#[async_trait]
impl Node for LlmNode {
    async fn execute(&self, state: &GraphState, writer: &StreamWriter) -> Result<NodeUpdate> {
        let request = self.build_request(state);
        tracing::info!(
            "LLM_NODE: model={}, messages={}, streaming={}",
            self.config.model,
            request.messages.len(),
            self.config.streaming
        );

        let message = if self.config.streaming {
            let stream = self.client.chat_stream(request).await?;
            self.process_stream(stream, writer).await?
        } else {
            self.client.chat(request).await?.into_message()
        };

        Ok(NodeUpdate::new().with_message(message))
    }
}
