use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::GraphError;
use crate::types::GraphState;

/// Stores graph state per thread between runs
#[async_trait]
pub trait Checkpointer: Send + Sync {
    async fn get(&self, thread_id: &str) -> Result<Option<GraphState>, GraphError>;

    async fn put(&self, state: &GraphState) -> Result<(), GraphError>;
}

/// In-process checkpointer; state lives as long as the saver
#[derive(Default)]
pub struct MemorySaver {
    threads: RwLock<HashMap<String, GraphState>>,
}

impl MemorySaver {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn thread_count(&self) -> usize {
        self.threads.read().await.len()
    }
}

#[async_trait]
impl Checkpointer for MemorySaver {
    async fn get(&self, thread_id: &str) -> Result<Option<GraphState>, GraphError> {
        Ok(self.threads.read().await.get(thread_id).cloned())
    }

    async fn put(&self, state: &GraphState) -> Result<(), GraphError> {
        self.threads
            .write()
            .await
            .insert(state.thread_id.clone(), state.clone());
        Ok(())
    }
}
