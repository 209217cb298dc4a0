pub mod error;
pub mod types;
pub mod node;
pub mod router;
pub mod builder;
pub mod graph;
pub mod streaming;
pub mod checkpoint;
pub mod nodes;
pub mod tools;
pub mod graphs;
pub mod factory;

pub use error::GraphError;
pub use types::{
    GraphConfig, GraphInput, GraphState, LlmConfig, MessageMetadata, NodeMetadata, NodeOutput,
    NodeUpdate, RunConfig, StreamMode, UpdateEvent,
};
pub use node::{Node, StreamWriter};
pub use router::{Router, SupervisorRouter, ToolsRouter};
pub use builder::{StateGraph, END, START};
pub use graph::CompiledGraph;
pub use streaming::{GraphExecutor, UpdateStream};
pub use checkpoint::{Checkpointer, MemorySaver};
pub use nodes::{LlmNode, SupervisorNode, ToolNode};
pub use tools::{CardFilter, CardSearchTool, ToolExecutor, ToolHandler, ToolRegistry};
pub use graphs::{BuiltGraph, GraphDeps, GraphKind};
pub use factory::GraphFactory;
