use std::sync::Arc;

use crate::builder::StateGraph;
use crate::checkpoint::{Checkpointer, MemorySaver};
use crate::error::GraphError;
use crate::graph::CompiledGraph;
use crate::types::GraphConfig;

/// Compiles graphs that share one checkpointer and config
#[derive(Clone)]
pub struct GraphFactory {
    checkpointer: Arc<dyn Checkpointer>,
    config: GraphConfig,
}

impl GraphFactory {
    /// Factory backed by a fresh `MemorySaver`
    pub fn new() -> Self {
        Self::with_checkpointer(Arc::new(MemorySaver::new()))
    }

    pub fn with_checkpointer(checkpointer: Arc<dyn Checkpointer>) -> Self {
        Self {
            checkpointer,
            config: GraphConfig::default(),
        }
    }

    pub fn with_config(mut self, config: GraphConfig) -> Self {
        self.config = config;
        self
    }

    pub fn checkpointer(&self) -> Arc<dyn Checkpointer> {
        Arc::clone(&self.checkpointer)
    }

    pub fn create_graph<F>(&self, build: F) -> Result<CompiledGraph, GraphError>
    where
        F: FnOnce(&mut StateGraph) -> Result<(), GraphError>,
    {
        let mut graph = StateGraph::new();
        build(&mut graph)?;
        graph.compile_with(Some(self.checkpointer()), self.config.clone())
    }
}

impl Default for GraphFactory {
    fn default() -> Self {
        Self::new()
    }
}
