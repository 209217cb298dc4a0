pub mod llm_node;
pub mod supervisor;
pub mod tool_node;

pub use llm_node::LlmNode;
pub use supervisor::SupervisorNode;
pub use tool_node::ToolNode;
