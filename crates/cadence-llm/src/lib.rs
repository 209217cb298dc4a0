pub mod types;
pub mod traits;
pub mod streaming;
pub mod config;
pub mod openai;

pub use traits::{ChatClient, ChatRequest, ChatResponse, ChatOptions, EventStream, TokenUsage};

pub use streaming::StreamEvent;
pub use config::ProviderConfig;
pub use openai::OpenAIClient;
pub use types::{Message, Content, Tool, ToolCall, ToolChoice};
