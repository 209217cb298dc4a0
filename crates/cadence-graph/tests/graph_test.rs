mod common;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use cadence_graph::graphs::{LLM_NODE, TOOL_NODE};
use cadence_graph::{
    GraphConfig, GraphDeps, GraphError, GraphFactory, GraphInput, GraphKind, GraphState, LlmConfig,
    Node, NodeUpdate, RunConfig, StateGraph, StreamMode, StreamWriter, ToolHandler, ToolRegistry,
    UpdateEvent, END, START,
};
use cadence_llm::{Message, Tool};
use common::{text, tool_call, ScriptedClient};
use futures::StreamExt;
use serde_json::{json, Value};

async fn collect(mut stream: cadence_graph::UpdateStream) -> Vec<Result<UpdateEvent, GraphError>> {
    let mut events = Vec::new();
    while let Some(event) = stream.next().await {
        events.push(event);
    }
    events
}

fn deps(client: Arc<ScriptedClient>) -> GraphDeps {
    GraphDeps::new(client, LlmConfig::default())
}

#[tokio::test]
async fn test_messages_mode_streams_token_chunks() {
    let client = ScriptedClient::new(vec![text(&["Octopuses", " have three hearts."])]);
    let factory = GraphFactory::new();
    let built = GraphKind::Simple.build(&factory, &deps(client.clone())).unwrap();

    let run = RunConfig::new("thread-a");
    let stream = built
        .graph
        .stream(GraphInput::new(vec![Message::human("fact?")]), run, StreamMode::Messages)
        .unwrap();
    let events = collect(stream).await;

    let chunks: Vec<String> = events
        .iter()
        .map(|e| match e {
            Ok(UpdateEvent::MessageTuple(msg, meta)) => {
                assert_eq!(meta.node, LLM_NODE);
                assert_eq!(meta.thread_id, "thread-a");
                msg.text()
            }
            other => panic!("unexpected event: {:?}", other),
        })
        .collect();
    assert_eq!(chunks, vec!["Octopuses", " have three hearts."]);

    // the system prompt is prepended to the request
    let requests = client.requests.lock().unwrap();
    assert!(matches!(requests[0].messages[0], Message::System { .. }));

    let state = built.graph.get_state("thread-a").await.unwrap().unwrap();
    assert_eq!(state.messages.len(), 2);
    assert_eq!(state.messages[1].text(), "Octopuses have three hearts.");
    // chunks and the stored message share one id
    let chunk_ids: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            Ok(UpdateEvent::MessageTuple(msg, _)) => msg.id().map(str::to_string),
            _ => None,
        })
        .collect();
    assert!(chunk_ids.iter().all(|id| Some(id.as_str()) == state.messages[1].id()));
}

#[tokio::test]
async fn test_updates_mode_emits_one_event_per_node() {
    let client = ScriptedClient::new(vec![text(&["Hello", " world"])]);
    let built = GraphKind::Simple
        .build(&GraphFactory::new(), &deps(client))
        .unwrap();

    let stream = built
        .graph
        .stream(
            GraphInput::new(vec![Message::human("hi")]),
            RunConfig::fresh(),
            StreamMode::Updates,
        )
        .unwrap();
    let events = collect(stream).await;

    assert_eq!(events.len(), 1);
    match &events[0] {
        Ok(UpdateEvent::NodeKeyed(map)) => {
            assert_eq!(map.len(), 1);
            assert_eq!(map[LLM_NODE].messages[0].text(), "Hello world");
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

struct Echo;

#[async_trait]
impl ToolHandler for Echo {
    fn definition(&self) -> Tool {
        Tool::new("echo", "Echo the input", json!({"type": "object"}))
    }

    async fn call(&self, arguments: Value) -> Result<String> {
        Ok(format!("echo: {}", arguments["text"].as_str().unwrap_or_default()))
    }
}

#[tokio::test]
async fn test_tools_graph_loops_through_tool_node() {
    let client = ScriptedClient::new(vec![
        tool_call("call_1", "echo", r#"{"text":"ping"}"#),
        text(&["Got pong"]),
    ]);
    let deps = deps(client.clone()).with_tools(Arc::new(ToolRegistry::new().with_tool(Echo)));
    let built = GraphKind::Tools.build(&GraphFactory::new(), &deps).unwrap();

    let input = GraphInput::new(vec![Message::human("ping it")]).with_extra(built.initial_state);
    let stream = built
        .graph
        .stream(input, RunConfig::new("tools-1"), StreamMode::Updates)
        .unwrap();
    let events = collect(stream).await;

    let nodes: Vec<String> = events
        .iter()
        .map(|e| match e {
            Ok(UpdateEvent::NodeKeyed(map)) => map.keys().next().cloned().unwrap(),
            other => panic!("unexpected event: {:?}", other),
        })
        .collect();
    assert_eq!(nodes, vec![LLM_NODE, TOOL_NODE, LLM_NODE]);

    if let Ok(UpdateEvent::NodeKeyed(map)) = &events[1] {
        let result = &map[TOOL_NODE].messages[0];
        assert!(matches!(result, Message::Tool { tool_call_id, .. } if tool_call_id == "call_1"));
        assert_eq!(result.text(), "echo: ping");
    }

    let requests = client.requests.lock().unwrap();
    assert_eq!(requests[0].options.tools.as_ref().unwrap()[0].name(), "echo");

    let state = built.graph.get_state("tools-1").await.unwrap().unwrap();
    assert!(state.node_registry.contains_key(TOOL_NODE));
    assert_eq!(state.context["last_node"], json!(LLM_NODE));
}

#[tokio::test]
async fn test_tool_failure_is_reported_to_the_model() {
    let client = ScriptedClient::new(vec![
        tool_call("call_1", "missing_tool", "{}"),
        text(&["Sorry"]),
    ]);
    let deps = deps(client).with_tools(Arc::new(ToolRegistry::new().with_tool(Echo)));
    let built = GraphKind::Tools.build(&GraphFactory::new(), &deps).unwrap();

    let state = built
        .graph
        .invoke(GraphInput::new(vec![Message::human("go")]), RunConfig::fresh())
        .await
        .unwrap();

    let tool_message = &state.messages[2];
    assert!(tool_message.text().starts_with("Tool execution failed:"));
    assert_eq!(state.last_message().unwrap().text(), "Sorry");
}

#[tokio::test]
async fn test_messages_mode_tool_graph_emits_tool_call_chunks() {
    let client = ScriptedClient::new(vec![
        tool_call("call_1", "echo", r#"{"text":"x"}"#),
        text(&["Done"]),
    ]);
    let deps = deps(client).with_tools(Arc::new(ToolRegistry::new().with_tool(Echo)));
    let built = GraphKind::Tools.build(&GraphFactory::new(), &deps).unwrap();

    let stream = built
        .graph
        .stream(
            GraphInput::new(vec![Message::human("go")]),
            RunConfig::fresh(),
            StreamMode::Messages,
        )
        .unwrap();
    let events = collect(stream).await;

    let kinds: Vec<(String, bool)> = events
        .into_iter()
        .map(|e| match e {
            Ok(UpdateEvent::MessageTuple(msg, meta)) => (meta.node, msg.is_tool_invocation()),
            other => panic!("unexpected event: {:?}", other),
        })
        .collect();

    assert_eq!(
        kinds,
        vec![
            (LLM_NODE.to_string(), true),
            (LLM_NODE.to_string(), true),
            // tool node does not stream, so its result arrives whole
            (TOOL_NODE.to_string(), true),
            (LLM_NODE.to_string(), false),
        ]
    );
}

#[tokio::test]
async fn test_supervisor_graph_dispatches_to_worker() {
    let client = ScriptedClient::new(vec![text(&["llm_node"]), text(&["Here is a fact."])]);
    let built = GraphKind::Supervisor
        .build(&GraphFactory::new(), &deps(client.clone()))
        .unwrap();

    let input = GraphInput::new(vec![Message::human("tell me")]).with_extra(built.initial_state);
    let state = built.graph.invoke(input, RunConfig::fresh()).await.unwrap();

    assert_eq!(state.context["supervisor_decision"], json!("llm_node"));
    assert_eq!(state.messages[1].text(), "[Supervisor] Next node: llm_node");
    assert_eq!(state.last_message().unwrap().text(), "Here is a fact.");

    let requests = client.requests.lock().unwrap();
    assert_eq!(requests[0].options.temperature, Some(0.0));
}

#[tokio::test]
async fn test_supervisor_unknown_decision_ends_run() {
    let client = ScriptedClient::new(vec![text(&["weather_node"])]);
    let built = GraphKind::Supervisor
        .build(&GraphFactory::new(), &deps(client))
        .unwrap();

    let input = GraphInput::new(vec![Message::human("tell me")]).with_extra(built.initial_state);
    let state = built.graph.invoke(input, RunConfig::fresh()).await.unwrap();
    assert_eq!(state.messages.len(), 2);
}

#[tokio::test]
async fn test_checkpoint_carries_history_across_runs() {
    let client = ScriptedClient::new(vec![text(&["First"]), text(&["Second"])]);
    let built = GraphKind::Simple
        .build(&GraphFactory::new(), &deps(client.clone()))
        .unwrap();

    let run = RunConfig::new("same-thread");
    built
        .graph
        .invoke(GraphInput::new(vec![Message::human("one")]), run.clone())
        .await
        .unwrap();
    let state = built
        .graph
        .invoke(GraphInput::new(vec![Message::human("two")]), run)
        .await
        .unwrap();

    assert_eq!(state.messages.len(), 4);
    // system prompt + 3 prior messages
    assert_eq!(client.requests.lock().unwrap()[1].messages.len(), 4);
}

#[tokio::test]
async fn test_run_without_checkpoint_neither_restores_nor_stores() {
    let client = ScriptedClient::new(vec![text(&["First"]), text(&["Second"])]);
    let built = GraphKind::Simple
        .build(&GraphFactory::new(), &deps(client.clone()))
        .unwrap();

    built
        .graph
        .invoke(
            GraphInput::new(vec![Message::human("one")]),
            RunConfig::new("kept"),
        )
        .await
        .unwrap();
    let state = built
        .graph
        .invoke(
            GraphInput::new(vec![Message::human("two")]),
            RunConfig::new("kept").without_checkpoint(),
        )
        .await
        .unwrap();

    assert_eq!(state.messages.len(), 2);
    let stored = built.graph.get_state("kept").await.unwrap().unwrap();
    assert_eq!(stored.messages.len(), 2);
    assert_eq!(stored.messages[0].text(), "one");
}

struct Repeat;

#[async_trait]
impl Node for Repeat {
    async fn execute(&self, _: &GraphState, _: &StreamWriter) -> Result<NodeUpdate> {
        Ok(NodeUpdate::new().with_message(Message::ai("again")))
    }
}

#[tokio::test]
async fn test_recursion_limit_ends_stream_with_error() {
    let mut graph = StateGraph::new();
    graph.add_node("loop", Repeat).unwrap();
    graph
        .add_edge(START, "loop")
        .unwrap()
        .add_conditional_edges("loop", |_: &GraphState| "loop".to_string())
        .unwrap();
    let graph = graph
        .compile_with(None, GraphConfig::default().with_max_iterations(3))
        .unwrap();

    let stream = graph
        .stream(GraphInput::default(), RunConfig::fresh(), StreamMode::Updates)
        .unwrap();
    let events = collect(stream).await;

    assert_eq!(events.len(), 4);
    assert!(events[..3].iter().all(|e| e.is_ok()));
    assert!(matches!(events[3], Err(GraphError::RecursionLimit(3))));
}

struct Failing;

#[async_trait]
impl Node for Failing {
    async fn execute(&self, _: &GraphState, _: &StreamWriter) -> Result<NodeUpdate> {
        anyhow::bail!("model unavailable")
    }
}

#[tokio::test]
async fn test_node_failure_is_reported() {
    let mut graph = StateGraph::new();
    graph.add_node("broken", Failing).unwrap();
    graph.add_edge(START, "broken").unwrap().add_edge("broken", END).unwrap();
    let graph = graph.compile().unwrap();

    let err = graph
        .invoke(GraphInput::default(), RunConfig::fresh())
        .await
        .unwrap_err();
    match err {
        GraphError::NodeFailed { node, source } => {
            assert_eq!(node, "broken");
            assert_eq!(source.to_string(), "model unavailable");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

struct Hang {
    guard: std::sync::Mutex<Option<tokio::sync::oneshot::Sender<()>>>,
}

#[async_trait]
impl Node for Hang {
    async fn execute(&self, _: &GraphState, writer: &StreamWriter) -> Result<NodeUpdate> {
        let _guard = self.guard.lock().unwrap().take();
        writer.emit_message(Message::ai("partial")).await?;
        futures::future::pending::<()>().await;
        Ok(NodeUpdate::new())
    }
}

#[tokio::test]
async fn test_dropping_stream_aborts_run() {
    let (guard_tx, guard_rx) = tokio::sync::oneshot::channel();
    let mut graph = StateGraph::new();
    graph
        .add_node(
            "hang",
            Hang {
                guard: std::sync::Mutex::new(Some(guard_tx)),
            },
        )
        .unwrap();
    graph.add_edge(START, "hang").unwrap();
    let graph = graph.compile().unwrap();

    let mut stream = graph
        .stream(GraphInput::default(), RunConfig::fresh(), StreamMode::Messages)
        .unwrap();
    assert!(matches!(stream.next().await, Some(Ok(UpdateEvent::MessageTuple(..)))));

    drop(stream);
    // the run's guard is released when the task is aborted
    assert!(guard_rx.await.is_err());
}

#[tokio::test]
async fn test_stream_outside_runtime_fails() {
    let mut graph = StateGraph::new();
    graph.add_node("loop", Repeat).unwrap();
    graph.add_edge(START, "loop").unwrap();
    let graph = graph.compile().unwrap();

    let result = std::thread::spawn(move || {
        graph
            .stream(GraphInput::default(), RunConfig::fresh(), StreamMode::Updates)
            .map(|_| ())
    })
    .join()
    .unwrap();
    assert!(matches!(result, Err(GraphError::Runtime)));
}
