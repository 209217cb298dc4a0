use std::collections::HashMap;
use std::sync::Arc;

use crate::checkpoint::Checkpointer;
use crate::error::GraphError;
use crate::graph::CompiledGraph;
use crate::node::Node;
use crate::router::Router;
use crate::types::GraphConfig;

/// Virtual entry node
pub const START: &str = "__start__";
/// Virtual exit node
pub const END: &str = "__end__";

#[derive(Clone)]
pub(crate) enum Edge {
    Direct(String),
    Conditional(Arc<dyn Router>),
}

/// Mutable graph definition; `compile` turns it into a runnable graph
#[derive(Default)]
pub struct StateGraph {
    nodes: HashMap<String, Arc<dyn Node>>,
    edges: HashMap<String, Edge>,
}

impl StateGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        node: impl Node + 'static,
    ) -> Result<&mut Self, GraphError> {
        let name = name.into();
        if name == START || name == END || self.nodes.contains_key(&name) {
            return Err(GraphError::DuplicateNode(name));
        }
        self.nodes.insert(name, Arc::new(node));
        Ok(self)
    }

    pub fn add_edge(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Result<&mut Self, GraphError> {
        let (from, to) = (from.into(), to.into());
        if to == START {
            return Err(GraphError::InvalidEdge(format!("'{}' cannot target START", from)));
        }
        self.insert_edge(from, Edge::Direct(to))
    }

    /// Route out of `from` with `router` after every execution of `from`
    pub fn add_conditional_edges(
        &mut self,
        from: impl Into<String>,
        router: impl Router + 'static,
    ) -> Result<&mut Self, GraphError> {
        self.insert_edge(from.into(), Edge::Conditional(Arc::new(router)))
    }

    fn insert_edge(&mut self, from: String, edge: Edge) -> Result<&mut Self, GraphError> {
        if from == END {
            return Err(GraphError::InvalidEdge("END has no outgoing edges".to_string()));
        }
        if self.edges.contains_key(&from) {
            return Err(GraphError::InvalidEdge(format!(
                "'{}' already has an outgoing edge",
                from
            )));
        }
        self.edges.insert(from, edge);
        Ok(self)
    }

    /// Compile without a checkpointer and with the default config
    pub fn compile(self) -> Result<CompiledGraph, GraphError> {
        self.compile_with(None, GraphConfig::default())
    }

    pub fn compile_with(
        self,
        checkpointer: Option<Arc<dyn Checkpointer>>,
        config: GraphConfig,
    ) -> Result<CompiledGraph, GraphError> {
        if !self.edges.contains_key(START) {
            return Err(GraphError::NoEntryPoint);
        }

        for (from, edge) in &self.edges {
            if from != START && !self.nodes.contains_key(from) {
                return Err(GraphError::UnknownNode(from.clone()));
            }
            if let Edge::Direct(to) = edge {
                if to != END && !self.nodes.contains_key(to) {
                    return Err(GraphError::UnknownNode(to.clone()));
                }
            }
        }

        tracing::debug!(
            "Compiled graph with {} nodes and {} edges",
            self.nodes.len(),
            self.edges.len()
        );

        Ok(CompiledGraph::new(self.nodes, self.edges, checkpointer, config))
    }
}
