//! Ready-made graphs: a single LLM call, an LLM/tool loop, and a
//! supervisor dispatching to a worker.

pub mod simple;
pub mod supervisor;
pub mod tools;

pub use simple::simple_graph;
pub use supervisor::supervisor_graph;
pub use tools::tools_graph;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use cadence_llm::ChatClient;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::GraphError;
use crate::factory::GraphFactory;
use crate::graph::CompiledGraph;
use crate::tools::ToolExecutor;
use crate::types::LlmConfig;

pub const LLM_NODE: &str = "llm_node";
pub const TOOL_NODE: &str = "tool_node";
pub const SUPERVISOR_NODE: &str = "supervisor";

/// What the example graphs are built from
#[derive(Clone)]
pub struct GraphDeps {
    pub client: Arc<dyn ChatClient>,
    pub llm: LlmConfig,
    /// Tools for the tools graph; the card search tool when absent
    pub tools: Option<Arc<dyn ToolExecutor>>,
    /// Overrides the graph's own system prompt
    pub system_prompt: Option<String>,
}

impl GraphDeps {
    pub fn new(client: Arc<dyn ChatClient>, llm: LlmConfig) -> Self {
        Self {
            client,
            llm,
            tools: None,
            system_prompt: None,
        }
    }

    pub fn with_tools(mut self, tools: Arc<dyn ToolExecutor>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

/// A compiled graph plus the extra payload each run should start with
#[derive(Clone)]
pub struct BuiltGraph {
    pub graph: CompiledGraph,
    pub initial_state: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphKind {
    Simple,
    Tools,
    Supervisor,
}

impl GraphKind {
    pub fn build(self, factory: &GraphFactory, deps: &GraphDeps) -> Result<BuiltGraph, GraphError> {
        match self {
            Self::Simple => simple_graph(factory, deps),
            Self::Tools => tools_graph(factory, deps),
            Self::Supervisor => supervisor_graph(factory, deps),
        }
    }
}

impl fmt::Display for GraphKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple => f.write_str("simple"),
            Self::Tools => f.write_str("tools"),
            Self::Supervisor => f.write_str("supervisor"),
        }
    }
}

impl FromStr for GraphKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "tools" => Ok(Self::Tools),
            "supervisor" => Ok(Self::Supervisor),
            other => Err(format!("unknown graph kind '{}'", other)),
        }
    }
}
