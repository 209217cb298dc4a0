pub mod card_search;

pub use card_search::{CardFilter, CardSearchTool};

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use cadence_llm::Tool;
use serde_json::Value;

/// Trait for executing tools
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, tool_name: &str, arguments: Value) -> Result<String>;

    /// Definitions to bind to the model
    fn list_tools(&self) -> Vec<Tool>;
}

/// A single callable tool
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn definition(&self) -> Tool;

    async fn call(&self, arguments: Value) -> Result<String>;
}

/// Tool executor backed by in-process handlers, keyed by tool name
#[derive(Default, Clone)]
pub struct ToolRegistry {
    handlers: BTreeMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: impl ToolHandler + 'static) {
        let name = handler.definition().name().to_string();
        if self.handlers.insert(name.clone(), Arc::new(handler)).is_some() {
            tracing::warn!("Tool '{}' registered twice, keeping the last one", name);
        }
    }

    pub fn with_tool(mut self, handler: impl ToolHandler + 'static) -> Self {
        self.register(handler);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    async fn execute(&self, tool_name: &str, arguments: Value) -> Result<String> {
        let handler = self
            .handlers
            .get(tool_name)
            .ok_or_else(|| anyhow::anyhow!("Tool '{}' not found", tool_name))?;
        handler.call(arguments).await
    }

    fn list_tools(&self) -> Vec<Tool> {
        self.handlers.values().map(|h| h.definition()).collect()
    }
}
