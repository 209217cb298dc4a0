use cadence_llm::Message;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Which kind of update events a run emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamMode {
    /// `(message, metadata)` tuples: token chunks from streaming nodes,
    /// whole messages from the rest
    Messages,
    /// One `{node: output}` map per node execution
    Updates,
}

impl fmt::Display for StreamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Messages => f.write_str("messages"),
            Self::Updates => f.write_str("updates"),
        }
    }
}

impl FromStr for StreamMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "messages" => Ok(Self::Messages),
            "updates" => Ok(Self::Updates),
            other => Err(format!("unknown stream mode '{}'", other)),
        }
    }
}

/// Where a streamed message came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageMetadata {
    pub node: String,
    pub step: usize,
    pub thread_id: String,
}

/// Partial output of a single node execution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeOutput {
    pub messages: Vec<Message>,
}

/// One item of a graph run's update stream
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateEvent {
    MessageTuple(Message, MessageMetadata),
    NodeKeyed(BTreeMap<String, NodeOutput>),
}

impl UpdateEvent {
    pub fn node_keyed(node: impl Into<String>, messages: Vec<Message>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(node.into(), NodeOutput { messages });
        Self::NodeKeyed(map)
    }

    /// The stream mode that produces this variant
    pub fn mode(&self) -> StreamMode {
        match self {
            Self::MessageTuple(..) => StreamMode::Messages,
            Self::NodeKeyed(_) => StreamMode::Updates,
        }
    }
}
