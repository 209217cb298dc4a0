//! Bridges graph runs to voice pipelines that consume streaming
//! chat-completion chunks.

pub mod chat;
pub mod convert;
pub mod error;
pub mod runner;
pub mod stream;

pub use chat::{ChatChunk, ChatContext, ChatDelta, ChatMessage, ChatRole, Choice, ChoiceDelta};
pub use convert::{from_engine_message, parse_timestamp, to_engine_message};
pub use error::AdapterError;
pub use runner::{GraphRunner, RunnerOptions};
pub use stream::{GraphStream, GraphStreamBuilder, DEFAULT_NODE};
