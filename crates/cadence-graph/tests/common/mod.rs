use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use cadence_llm::{ChatClient, ChatRequest, ChatResponse, EventStream, StreamEvent, ToolCall};

/// Chat client that replays scripted responses in order and records requests
#[derive(Default)]
pub struct ScriptedClient {
    responses: Mutex<VecDeque<Vec<StreamEvent>>>,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedClient {
    pub fn new(responses: Vec<Vec<StreamEvent>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn next_response(&self, request: ChatRequest) -> Result<Vec<StreamEvent>> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no scripted response left"))
    }
}

pub fn text(chunks: &[&str]) -> Vec<StreamEvent> {
    let mut events: Vec<StreamEvent> = chunks
        .iter()
        .map(|c| StreamEvent::Message {
            content: c.to_string(),
        })
        .collect();
    events.push(StreamEvent::Done {
        finish_reason: Some("stop".to_string()),
    });
    events
}

pub fn tool_call(id: &str, name: &str, arguments: &str) -> Vec<StreamEvent> {
    vec![
        StreamEvent::ToolCall {
            index: 0,
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            arguments: Some(String::new()),
        },
        StreamEvent::ToolCall {
            index: 0,
            id: None,
            name: None,
            arguments: Some(arguments.to_string()),
        },
        StreamEvent::Done {
            finish_reason: Some("tool_calls".to_string()),
        },
    ]
}

#[async_trait]
impl ChatClient for ScriptedClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let events = self.next_response(request)?;
        let mut content = String::new();
        let mut tool_calls = Vec::new();
        for event in events {
            match event {
                StreamEvent::Message { content: chunk } => content.push_str(&chunk),
                StreamEvent::ToolCall {
                    id: Some(id),
                    name: Some(name),
                    arguments,
                    ..
                } => tool_calls.push(ToolCall::function(id, name, arguments.unwrap_or_default())),
                _ => {}
            }
        }
        Ok(ChatResponse {
            content: Some(content),
            tool_calls: Some(tool_calls),
            usage: None,
            finish_reason: Some("stop".to_string()),
        })
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<EventStream> {
        let events = self.next_response(request)?;
        Ok(Box::pin(futures::stream::iter(events.into_iter().map(Ok))))
    }
}
