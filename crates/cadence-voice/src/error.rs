use cadence_graph::{GraphError, StreamMode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Graph engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Graph execution failed: {0}")]
    UpstreamExecution(#[source] GraphError),

    #[error("Message id '{id}' is not an integer timestamp")]
    MalformedTimestamp { id: String },

    #[error("Expected {expected} events, received {received} event")]
    ModeMismatch {
        expected: StreamMode,
        received: StreamMode,
    },
}
