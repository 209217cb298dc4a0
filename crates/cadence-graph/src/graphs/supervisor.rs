use serde_json::{json, Map};

use super::{BuiltGraph, GraphDeps, LLM_NODE, SUPERVISOR_NODE};
use crate::builder::{END, START};
use crate::error::GraphError;
use crate::factory::GraphFactory;
use crate::nodes::{LlmNode, SupervisorNode};
use crate::router::SupervisorRouter;

/// `START -> supervisor`, which picks a registered worker; workers go to `END`
pub fn supervisor_graph(factory: &GraphFactory, deps: &GraphDeps) -> Result<BuiltGraph, GraphError> {
    let supervisor = SupervisorNode::new(deps.client.clone(), deps.llm.model.clone());
    let mut worker = LlmNode::new(deps.client.clone(), deps.llm.clone());
    if let Some(prompt) = &deps.system_prompt {
        worker = worker.with_system_prompt(prompt.clone());
    }
    let worker_meta = worker.metadata();

    let graph = factory.create_graph(|graph| {
        graph.add_node(SUPERVISOR_NODE, supervisor)?;
        graph.add_node(LLM_NODE, worker)?;
        graph
            .add_edge(START, SUPERVISOR_NODE)?
            .add_conditional_edges(SUPERVISOR_NODE, SupervisorRouter)?
            .add_edge(LLM_NODE, END)?;
        Ok(())
    })?;

    let mut initial_state = Map::new();
    initial_state.insert(
        "node_registry".to_string(),
        json!({ LLM_NODE: worker_meta }),
    );

    Ok(BuiltGraph {
        graph,
        initial_state,
    })
}
