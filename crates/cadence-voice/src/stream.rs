use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};

use cadence_graph::{
    GraphExecutor, GraphInput, RunConfig, StreamMode, UpdateEvent, UpdateStream,
};
use futures::{Stream, StreamExt};
use serde_json::{Map, Value};

use crate::chat::{ChatChunk, ChatContext, ChatDelta, ChatMessage, ChatRole};
use crate::convert::to_engine_message;
use crate::error::AdapterError;

pub const DEFAULT_NODE: &str = "llm_node";

/// One assistant turn: graph update events in, chat deltas out.
///
/// The graph run starts when the stream is built. Deltas are pulled lazily,
/// and the run is released as soon as it ends, fails, or the stream is dropped.
pub struct GraphStream {
    updates: Option<UpdateStream>,
    mode: StreamMode,
    node: String,
    session_id: String,
    index: u64,
}

impl GraphStream {
    pub fn builder() -> GraphStreamBuilder {
        GraphStreamBuilder::default()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn mode(&self) -> StreamMode {
        self.mode
    }

    /// Whether the underlying run has been released
    pub fn is_released(&self) -> bool {
        self.updates.is_none()
    }

    /// Next non-empty assistant fragment, or `None` at end of stream
    pub async fn next_delta(&mut self) -> Option<Result<ChatDelta, AdapterError>> {
        futures::future::poll_fn(|cx| self.poll_next_delta(cx)).await
    }

    pub fn poll_next_delta(
        &mut self,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<ChatDelta, AdapterError>>> {
        loop {
            let Some(updates) = self.updates.as_mut() else {
                return Poll::Ready(None);
            };

            let event = match ready!(updates.poll_next_unpin(cx)) {
                Some(Ok(event)) => event,
                Some(Err(e)) => {
                    self.release();
                    return Poll::Ready(Some(Err(AdapterError::UpstreamExecution(e))));
                }
                None => {
                    self.release();
                    return Poll::Ready(None);
                }
            };

            match self.extract(event) {
                Ok(Some(content)) => {
                    self.index += 1;
                    return Poll::Ready(Some(Ok(ChatDelta {
                        index: self.index,
                        role: ChatRole::Assistant,
                        content,
                    })));
                }
                Ok(None) => continue,
                Err(e) => {
                    self.release();
                    return Poll::Ready(Some(Err(e)));
                }
            }
        }
    }

    /// Assistant-visible text of an event, if it has any
    fn extract(&self, event: UpdateEvent) -> Result<Option<String>, AdapterError> {
        if event.mode() != self.mode {
            return Err(AdapterError::ModeMismatch {
                expected: self.mode,
                received: event.mode(),
            });
        }

        let message = match event {
            UpdateEvent::MessageTuple(message, _) => message,
            UpdateEvent::NodeKeyed(mut outputs) => {
                match outputs
                    .remove(&self.node)
                    .and_then(|output| output.messages.into_iter().last())
                {
                    Some(message) => message,
                    None => return Ok(None),
                }
            }
        };

        if message.is_tool_invocation() || !message.is_assistant() {
            return Ok(None);
        }

        let content = message.text();
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(content))
    }

    fn release(&mut self) {
        if self.updates.take().is_some() {
            tracing::debug!(session_id = %self.session_id, deltas = self.index, "Released graph stream");
        }
    }
}

impl Stream for GraphStream {
    type Item = Result<ChatChunk, AdapterError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let next = ready!(this.poll_next_delta(cx));
        Poll::Ready(next.map(|delta| delta.map(|d| ChatChunk::from_delta(this.session_id.clone(), d))))
    }
}

pub struct GraphStreamBuilder {
    graph: Option<Arc<dyn GraphExecutor>>,
    history: Vec<ChatMessage>,
    extra: Map<String, Value>,
    mode: StreamMode,
    node: String,
    session_id: Option<String>,
    include_system: bool,
}

impl Default for GraphStreamBuilder {
    fn default() -> Self {
        Self {
            graph: None,
            history: Vec::new(),
            extra: Map::new(),
            mode: StreamMode::Messages,
            node: DEFAULT_NODE.to_string(),
            session_id: None,
            include_system: false,
        }
    }
}

impl GraphStreamBuilder {
    pub fn graph(mut self, graph: Arc<dyn GraphExecutor>) -> Self {
        self.graph = Some(graph);
        self
    }

    pub fn history(mut self, history: impl IntoIterator<Item = ChatMessage>) -> Self {
        self.history = history.into_iter().collect();
        self
    }

    pub fn chat_context(self, ctx: &ChatContext) -> Self {
        self.history(ctx.messages.iter().cloned())
    }

    /// Extra initial payload merged next to `messages`
    pub fn extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra = extra;
        self
    }

    pub fn mode(mut self, mode: StreamMode) -> Self {
        self.mode = mode;
        self
    }

    /// Node whose output is read in updates mode
    pub fn node(mut self, node: impl Into<String>) -> Self {
        self.node = node.into();
        self
    }

    /// Checkpoint scope of the run. When unset a fresh id is generated and
    /// the run keeps no checkpoint.
    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Keep system messages from the history
    pub fn include_system(mut self, include: bool) -> Self {
        self.include_system = include;
        self
    }

    /// Start the graph run. The engine is called exactly once, here.
    pub fn build(self) -> Result<GraphStream, AdapterError> {
        let graph = self
            .graph
            .ok_or_else(|| AdapterError::EngineUnavailable("no graph configured".to_string()))?;

        let include_system = self.include_system;
        let messages = self
            .history
            .iter()
            .filter(|m| include_system || m.role != ChatRole::System)
            .map(to_engine_message)
            .collect::<Vec<_>>();
        // Only a pinned session is worth checkpointing; a generated one is
        // never addressed again.
        let (session_id, run) = match self.session_id {
            Some(session_id) => (session_id.clone(), RunConfig::new(session_id)),
            None => {
                let session_id = uuid::Uuid::new_v4().to_string();
                let run = RunConfig::new(session_id.clone()).without_checkpoint();
                (session_id, run)
            }
        };

        tracing::info!(
            session_id = %session_id,
            mode = %self.mode,
            messages = messages.len(),
            "Starting graph stream"
        );

        // The history is the whole conversation every turn
        let input = GraphInput::new(messages)
            .with_extra(self.extra)
            .with_full_history();
        let updates = graph
            .stream(input, run, self.mode)
            .map_err(|e| AdapterError::EngineUnavailable(e.to_string()))?;

        Ok(GraphStream {
            updates: Some(updates),
            mode: self.mode,
            node: self.node,
            session_id,
            index: 0,
        })
    }
}
