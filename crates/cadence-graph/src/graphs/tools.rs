use std::sync::Arc;

use serde_json::{json, Map, Value};

use super::{BuiltGraph, GraphDeps, LLM_NODE, TOOL_NODE};
use crate::builder::START;
use crate::error::GraphError;
use crate::factory::GraphFactory;
use crate::nodes::{LlmNode, ToolNode};
use crate::router::ToolsRouter;
use crate::tools::{CardSearchTool, ToolExecutor, ToolRegistry};

pub const TOOLS_PROMPT: &str = "You are a helpful assistant.";

/// `START -> llm_node`, then `llm_node <-> tool_node` until no tool calls remain
pub fn tools_graph(factory: &GraphFactory, deps: &GraphDeps) -> Result<BuiltGraph, GraphError> {
    let tools: Arc<dyn ToolExecutor> = match &deps.tools {
        Some(tools) => Arc::clone(tools),
        None => Arc::new(ToolRegistry::new().with_tool(CardSearchTool::new())),
    };
    let prompt = deps.system_prompt.as_deref().unwrap_or(TOOLS_PROMPT);

    let llm_node = LlmNode::new(deps.client.clone(), deps.llm.clone())
        .with_description(
            "Generates responses using an LLM with bound tools based on the conversation history.",
        )
        .with_system_prompt(prompt)
        .with_tools(Arc::clone(&tools));
    let tool_node = ToolNode::new(tools);

    let graph = factory.create_graph(|graph| {
        graph.add_node(LLM_NODE, llm_node)?;
        graph.add_node(TOOL_NODE, tool_node)?;
        graph
            .add_edge(START, LLM_NODE)?
            .add_conditional_edges(LLM_NODE, ToolsRouter::new(TOOL_NODE))?
            .add_edge(TOOL_NODE, LLM_NODE)?;
        Ok(())
    })?;

    let mut initial_state = Map::new();
    initial_state.insert(
        "node_registry".to_string(),
        json!({
            LLM_NODE: {"name": LLM_NODE, "description": "Generates LLM responses with bound tools."},
            TOOL_NODE: {"name": TOOL_NODE, "description": "Executes MTG search tool calls."}
        }),
    );
    initial_state.insert("context".to_string(), Value::Object(Map::new()));

    Ok(BuiltGraph {
        graph,
        initial_state,
    })
}
