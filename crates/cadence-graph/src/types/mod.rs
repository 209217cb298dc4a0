pub mod state;
pub mod config;
pub mod events;

pub use state::{GraphState, GraphInput, NodeMetadata, NodeUpdate};
pub use config::{GraphConfig, LlmConfig, RunConfig};
pub use events::{StreamMode, UpdateEvent, MessageMetadata, NodeOutput};
