use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Upper bound on node executions per run
    pub max_iterations: usize,
    /// Buffered update events between the run task and its consumer
    pub channel_capacity: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_iterations: 25,
            channel_capacity: 1000,
        }
    }
}

impl GraphConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Use the streaming chat endpoint and forward token chunks
    #[serde(default = "default_streaming")]
    pub streaming: bool,
}

fn default_streaming() -> bool {
    true
}

impl LlmConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            max_tokens: None,
            streaming: true,
        }
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self::new("gpt-4o-mini").with_temperature(0.7)
    }
}

/// Per-run configuration. The thread id scopes checkpointed state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub thread_id: String,
    /// Read and write the graph's checkpointer for this run
    #[serde(default = "default_checkpoint")]
    pub checkpoint: bool,
}

fn default_checkpoint() -> bool {
    true
}

impl RunConfig {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            checkpoint: true,
        }
    }

    /// Run in a thread of its own
    pub fn fresh() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }

    /// Neither restore nor store state; nothing outlives the run
    pub fn without_checkpoint(mut self) -> Self {
        self.checkpoint = false;
        self
    }
}
