use serde_json::Map;

use super::{BuiltGraph, GraphDeps, LLM_NODE};
use crate::builder::{END, START};
use crate::error::GraphError;
use crate::factory::GraphFactory;
use crate::nodes::LlmNode;

pub const SIMPLE_PROMPT: &str = "You are a helpful assistant that provides interesting facts.";

/// `START -> llm_node -> END`
pub fn simple_graph(factory: &GraphFactory, deps: &GraphDeps) -> Result<BuiltGraph, GraphError> {
    let prompt = deps.system_prompt.as_deref().unwrap_or(SIMPLE_PROMPT);
    let llm_node = LlmNode::new(deps.client.clone(), deps.llm.clone()).with_system_prompt(prompt);

    let graph = factory.create_graph(|graph| {
        graph.add_node(LLM_NODE, llm_node)?;
        graph.add_edge(START, LLM_NODE)?.add_edge(LLM_NODE, END)?;
        Ok(())
    })?;

    Ok(BuiltGraph {
        graph,
        initial_state: Map::new(),
    })
}
