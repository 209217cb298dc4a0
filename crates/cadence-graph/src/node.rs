use crate::error::GraphError;
use crate::types::{GraphState, MessageMetadata, NodeUpdate, StreamMode, UpdateEvent};
use anyhow::Result;
use async_trait::async_trait;
use cadence_llm::Message;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

pub type EventSender = mpsc::Sender<std::result::Result<UpdateEvent, GraphError>>;

/// Core abstraction for a unit of computation in the graph
#[async_trait]
pub trait Node: Send + Sync {
    /// Read the current state, optionally stream message chunks through
    /// `writer`, and return the update the engine should apply.
    async fn execute(&self, state: &GraphState, writer: &StreamWriter) -> Result<NodeUpdate>;
}

/// Handle a node uses to publish events for the run it belongs to
#[derive(Clone)]
pub struct StreamWriter {
    sink: Option<(StreamMode, EventSender)>,
    metadata: MessageMetadata,
    streamed: Arc<AtomicBool>,
}

impl StreamWriter {
    pub(crate) fn new(sink: Option<(StreamMode, EventSender)>, metadata: MessageMetadata) -> Self {
        Self {
            sink,
            metadata,
            streamed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A writer that drops everything
    pub fn noop(metadata: MessageMetadata) -> Self {
        Self::new(None, metadata)
    }

    pub fn metadata(&self) -> &MessageMetadata {
        &self.metadata
    }

    pub fn streams_messages(&self) -> bool {
        matches!(self.sink, Some((StreamMode::Messages, _)))
    }

    /// Emit a message chunk. Ignored unless the run streams messages.
    pub async fn emit_message(&self, message: Message) -> Result<()> {
        if let Some((StreamMode::Messages, tx)) = &self.sink {
            self.streamed.store(true, Ordering::Relaxed);
            tx.send(Ok(UpdateEvent::MessageTuple(message, self.metadata.clone())))
                .await
                .map_err(|_| GraphError::StreamClosed)?;
        }
        Ok(())
    }

    pub(crate) fn has_streamed(&self) -> bool {
        self.streamed.load(Ordering::Relaxed)
    }

    /// Publish what a finished node added to the state.
    ///
    /// Messages mode only forwards messages the node did not already stream.
    pub(crate) async fn publish(
        &self,
        added: &[Message],
    ) -> std::result::Result<(), GraphError> {
        match &self.sink {
            Some((StreamMode::Messages, tx)) if !self.has_streamed() => {
                for message in added {
                    tx.send(Ok(UpdateEvent::MessageTuple(
                        message.clone(),
                        self.metadata.clone(),
                    )))
                    .await
                    .map_err(|_| GraphError::StreamClosed)?;
                }
            }
            Some((StreamMode::Updates, tx)) => {
                tx.send(Ok(UpdateEvent::node_keyed(
                    self.metadata.node.clone(),
                    added.to_vec(),
                )))
                .await
                .map_err(|_| GraphError::StreamClosed)?;
            }
            _ => {}
        }
        Ok(())
    }
}
