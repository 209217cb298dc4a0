use std::sync::Arc;

use cadence_graph::{GraphExecutor, StreamMode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::chat::ChatContext;
use crate::error::AdapterError;
use crate::stream::{GraphStream, DEFAULT_NODE};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerOptions {
    pub mode: StreamMode,
    /// Node read in updates mode
    pub node: String,
    pub include_system: bool,
    /// Pin every turn to one checkpoint thread instead of a fresh one
    pub session_id: Option<String>,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            mode: StreamMode::Messages,
            node: DEFAULT_NODE.to_string(),
            include_system: false,
            session_id: None,
        }
    }
}

/// Chat-completion facade over a compiled graph: one `GraphStream` per turn
#[derive(Clone)]
pub struct GraphRunner {
    graph: Arc<dyn GraphExecutor>,
    initial_state: Map<String, Value>,
    options: RunnerOptions,
}

impl GraphRunner {
    pub fn new(graph: Arc<dyn GraphExecutor>) -> Self {
        Self {
            graph,
            initial_state: Map::new(),
            options: RunnerOptions::default(),
        }
    }

    pub fn with_initial_state(mut self, initial_state: Map<String, Value>) -> Self {
        self.initial_state = initial_state;
        self
    }

    pub fn with_options(mut self, options: RunnerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &RunnerOptions {
        &self.options
    }

    pub fn chat(&self, ctx: &ChatContext) -> Result<GraphStream, AdapterError> {
        let mut builder = GraphStream::builder()
            .graph(Arc::clone(&self.graph))
            .chat_context(ctx)
            .extra(self.initial_state.clone())
            .mode(self.options.mode)
            .node(self.options.node.clone())
            .include_system(self.options.include_system);
        if let Some(session_id) = &self.options.session_id {
            builder = builder.session_id(session_id.clone());
        }
        builder.build()
    }
}
