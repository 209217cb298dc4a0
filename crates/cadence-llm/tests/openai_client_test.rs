use cadence_llm::{ChatClient, ChatRequest, Message, OpenAIClient, StreamEvent};
use futures::StreamExt;

const SSE_BODY: &str = concat!(
    "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"content\":\"\"},\"finish_reason\":null}]}\n\n",
    "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hello\"},\"finish_reason\":null}]}\n\n",
    "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\" there\"},\"finish_reason\":null}]}\n\n",
    "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
    "data: [DONE]\n\n",
);

#[tokio::test]
async fn test_chat_stream_against_fake_server() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(SSE_BODY)
        .create_async()
        .await;

    let client = OpenAIClient::new("test-key").unwrap().with_base_url(server.url());
    let request = ChatRequest::new("gpt-4o-mini", vec![Message::human("hi")]);

    let events: Vec<StreamEvent> = client
        .chat_stream(request)
        .await
        .unwrap()
        .map(|e| e.unwrap())
        .collect()
        .await;

    mock.assert_async().await;
    assert_eq!(
        events,
        vec![
            StreamEvent::Message { content: "Hello".to_string() },
            StreamEvent::Message { content: " there".to_string() },
            StreamEvent::Done { finish_reason: Some("stop".to_string()) },
            StreamEvent::Done { finish_reason: None },
        ]
    );
}

#[tokio::test]
async fn test_chat_non_streaming() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "id": "c2",
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "llm_node"}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 10, "completion_tokens": 2, "total_tokens": 12}
            }"#,
        )
        .create_async()
        .await;

    let client = OpenAIClient::new("test-key").unwrap().with_base_url(server.url());
    let response = client
        .chat(ChatRequest::new("gpt-4o-mini", vec![Message::system("pick a node")]))
        .await
        .unwrap();

    assert_eq!(response.content.as_deref(), Some("llm_node"));
    assert_eq!(response.finish_reason.as_deref(), Some("stop"));
    assert_eq!(response.usage.unwrap().total_tokens, 12);
}

#[tokio::test]
async fn test_api_error_status_is_reported() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(401)
        .with_body(r#"{"error": {"message": "bad key"}}"#)
        .create_async()
        .await;

    let client = OpenAIClient::new("wrong").unwrap().with_base_url(server.url());
    let err = match client
        .chat_stream(ChatRequest::new("gpt-4o-mini", vec![Message::human("hi")]))
        .await
    {
        Ok(_) => panic!("Expected an API error"),
        Err(e) => e,
    };

    assert!(err.to_string().contains("401"));
}
