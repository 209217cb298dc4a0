use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::GraphError;
use crate::graph::CompiledGraph;
use crate::types::{GraphInput, RunConfig, StreamMode, UpdateEvent};

/// Anything that can start a streamed graph run
pub trait GraphExecutor: Send + Sync {
    fn stream(
        &self,
        input: GraphInput,
        run: RunConfig,
        mode: StreamMode,
    ) -> Result<UpdateStream, GraphError>;
}

impl GraphExecutor for CompiledGraph {
    fn stream(
        &self,
        input: GraphInput,
        run: RunConfig,
        mode: StreamMode,
    ) -> Result<UpdateStream, GraphError> {
        CompiledGraph::stream(self, input, run, mode)
    }
}

/// Update events of one run. Dropping it aborts the run if still going.
pub struct UpdateStream {
    inner: Pin<Box<dyn Stream<Item = Result<UpdateEvent, GraphError>> + Send>>,
    task: Option<JoinHandle<()>>,
}

impl UpdateStream {
    pub(crate) fn from_channel(
        rx: mpsc::Receiver<Result<UpdateEvent, GraphError>>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            inner: Box::pin(ReceiverStream::new(rx)),
            task: Some(task),
        }
    }

    /// Wrap a stream that has no background task behind it
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<UpdateEvent, GraphError>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
            task: None,
        }
    }
}

impl Stream for UpdateStream {
    type Item = Result<UpdateEvent, GraphError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl Drop for UpdateStream {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            if !task.is_finished() {
                tracing::debug!("Update stream dropped before run finished, aborting");
                task.abort();
            }
        }
    }
}
