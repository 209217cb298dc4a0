use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;
use cadence_llm::Message;

use crate::node::{Node, StreamWriter};
use crate::tools::ToolExecutor;
use crate::types::{GraphState, NodeUpdate};

/// Runs every tool call of the last assistant message
pub struct ToolNode {
    executor: Arc<dyn ToolExecutor>,
}

impl ToolNode {
    pub fn new(executor: Arc<dyn ToolExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl Node for ToolNode {
    async fn execute(&self, state: &GraphState, _writer: &StreamWriter) -> Result<NodeUpdate> {
        let tool_calls = state.get_pending_tool_calls();
        let mut update = NodeUpdate::new();

        for tool_call in tool_calls {
            let start = Instant::now();

            let outcome = match tool_call.arguments_value() {
                Ok(args) => self.executor.execute(&tool_call.function.name, args).await,
                Err(e) => Err(anyhow::anyhow!("invalid arguments: {}", e)),
            };

            // Tool failures go back to the model instead of failing the run
            let result = match outcome {
                Ok(result) => result,
                Err(e) => {
                    tracing::warn!("Tool '{}' failed: {}", tool_call.function.name, e);
                    format!("Tool execution failed: {}", e)
                }
            };

            tracing::info!(
                tool = %tool_call.function.name,
                duration_ms = start.elapsed().as_millis() as u64,
                "Tool call finished"
            );

            update = update.with_message(Message::tool_result(tool_call.id, result));
        }

        Ok(update)
    }
}
