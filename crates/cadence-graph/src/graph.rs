use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use crate::builder::{Edge, END, START};
use crate::checkpoint::Checkpointer;
use crate::error::GraphError;
use crate::node::{EventSender, Node, StreamWriter};
use crate::streaming::UpdateStream;
use crate::types::{GraphConfig, GraphInput, GraphState, MessageMetadata, RunConfig, StreamMode};

struct GraphInner {
    nodes: HashMap<String, Arc<dyn Node>>,
    edges: HashMap<String, Edge>,
    checkpointer: Option<Arc<dyn Checkpointer>>,
    config: GraphConfig,
}

/// A validated graph, cheap to clone and share across sessions
#[derive(Clone)]
pub struct CompiledGraph {
    inner: Arc<GraphInner>,
}

impl CompiledGraph {
    pub(crate) fn new(
        nodes: HashMap<String, Arc<dyn Node>>,
        edges: HashMap<String, Edge>,
        checkpointer: Option<Arc<dyn Checkpointer>>,
        config: GraphConfig,
    ) -> Self {
        Self {
            inner: Arc::new(GraphInner {
                nodes,
                edges,
                checkpointer,
                config,
            }),
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.inner.config
    }

    pub fn node_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.inner.nodes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Spawn a run in the background and return its update stream.
    ///
    /// Dropping the stream aborts the run.
    pub fn stream(
        &self,
        input: GraphInput,
        run: RunConfig,
        mode: StreamMode,
    ) -> Result<UpdateStream, GraphError> {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| GraphError::Runtime)?;
        let (tx, rx) = mpsc::channel(self.inner.config.channel_capacity);
        let inner = Arc::clone(&self.inner);

        let task = handle.spawn(async move {
            match inner.execute_loop(input, run, Some((mode, tx.clone()))).await {
                Ok(_) => {}
                Err(GraphError::StreamClosed) => {
                    tracing::debug!("Update stream consumer went away, stopping run");
                }
                Err(e) => {
                    tracing::error!("Graph run failed: {}", e);
                    let _ = tx.send(Err(e)).await;
                }
            }
        });

        Ok(UpdateStream::from_channel(rx, task))
    }

    /// Run to completion and return the final state
    pub async fn invoke(&self, input: GraphInput, run: RunConfig) -> Result<GraphState, GraphError> {
        self.inner.execute_loop(input, run, None).await
    }

    /// Latest checkpointed state of a thread
    pub async fn get_state(&self, thread_id: &str) -> Result<Option<GraphState>, GraphError> {
        match &self.inner.checkpointer {
            Some(checkpointer) => checkpointer.get(thread_id).await,
            None => Ok(None),
        }
    }
}

impl GraphInner {
    async fn execute_loop(
        &self,
        input: GraphInput,
        run: RunConfig,
        sink: Option<(StreamMode, EventSender)>,
    ) -> Result<GraphState, GraphError> {
        let start_time = Instant::now();

        let checkpointer = self.checkpointer.as_ref().filter(|_| run.checkpoint);
        let mut state = match checkpointer {
            Some(checkpointer) => checkpointer
                .get(&run.thread_id)
                .await?
                .unwrap_or_else(|| GraphState::new(run.thread_id.clone())),
            None => GraphState::new(run.thread_id.clone()),
        };
        state.run_id = uuid::Uuid::new_v4().to_string();
        state.apply_input(input)?;

        tracing::info!(
            thread_id = %state.thread_id,
            run_id = %state.run_id,
            messages = state.messages.len(),
            "Graph run started"
        );

        let mut current = self.next_node(START, &state)?;
        let mut step = 0;

        while current != END {
            // Guardrail: max iterations
            if step >= self.config.max_iterations {
                return Err(GraphError::RecursionLimit(self.config.max_iterations));
            }

            let node = self
                .nodes
                .get(&current)
                .ok_or_else(|| GraphError::UnknownNode(current.clone()))?;

            let writer = StreamWriter::new(
                sink.clone(),
                MessageMetadata {
                    node: current.clone(),
                    step,
                    thread_id: state.thread_id.clone(),
                },
            );

            let node_start = Instant::now();
            let update = node
                .execute(&state, &writer)
                .await
                .map_err(|e| match e.downcast::<GraphError>() {
                    Ok(GraphError::StreamClosed) => GraphError::StreamClosed,
                    Ok(other) => GraphError::node_failed(current.as_str(), other.into()),
                    Err(e) => GraphError::node_failed(current.as_str(), e),
                })?;

            let added = state.apply_update(&current, update);
            tracing::debug!(
                node = %current,
                step,
                added = added.len(),
                duration_ms = node_start.elapsed().as_millis() as u64,
                "Node finished"
            );

            writer.publish(&added).await?;

            if let Some(checkpointer) = checkpointer {
                checkpointer.put(&state).await?;
            }

            current = self.next_node(&current, &state)?;
            step += 1;
        }

        tracing::info!(
            thread_id = %state.thread_id,
            run_id = %state.run_id,
            steps = step,
            total_duration_ms = start_time.elapsed().as_millis() as u64,
            "Graph run finished"
        );

        Ok(state)
    }

    fn next_node(&self, from: &str, state: &GraphState) -> Result<String, GraphError> {
        match self.edges.get(from) {
            None => Ok(END.to_string()),
            Some(Edge::Direct(to)) => Ok(to.clone()),
            Some(Edge::Conditional(router)) => {
                let to = router.route(state);
                if to == END || self.nodes.contains_key(&to) {
                    Ok(to)
                } else {
                    Err(GraphError::UnknownNode(to))
                }
            }
        }
    }
}
