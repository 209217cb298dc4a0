use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Graph has no entry point: add an edge from START")]
    NoEntryPoint,

    #[error("Unknown node: {0}")]
    UnknownNode(String),

    #[error("Node already defined: {0}")]
    DuplicateNode(String),

    #[error("Invalid edge: {0}")]
    InvalidEdge(String),

    #[error("Invalid graph input: {0}")]
    InvalidInput(String),

    #[error("Max iterations ({0}) reached")]
    RecursionLimit(usize),

    #[error("Node '{node}' failed: {source}")]
    NodeFailed {
        node: String,
        #[source]
        source: BoxError,
    },

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("Update stream closed by consumer")]
    StreamClosed,

    #[error("Graph streams must be started inside a tokio runtime")]
    Runtime,
}

impl GraphError {
    pub(crate) fn node_failed(node: impl Into<String>, source: anyhow::Error) -> Self {
        Self::NodeFailed {
            node: node.into(),
            source: source.into(),
        }
    }
}
