use anyhow::Result;
use cadence_voice::{ChatContext, ChatMessage, GraphRunner};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Text stand-in for the voice pipeline: one line in, one streamed reply out.
///
/// Returns the conversation once the input ends or the user says `exit`.
pub async fn run_console<R, W>(
    runner: &GraphRunner,
    greeting: &str,
    input: R,
    mut output: W,
) -> Result<ChatContext>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut ctx = ChatContext::new();
    ctx.append(ChatMessage::assistant(greeting));
    output.write_all(format!("{}\n", greeting).as_bytes()).await?;
    output.flush().await?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        ctx.append(ChatMessage::user(line));

        let mut stream = match runner.chat(&ctx) {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!("Could not start turn: {}", e);
                continue;
            }
        };

        let mut reply = String::new();
        while let Some(delta) = stream.next_delta().await {
            match delta {
                Ok(delta) => {
                    output.write_all(delta.content.as_bytes()).await?;
                    output.flush().await?;
                    reply.push_str(&delta.content);
                }
                Err(e) => {
                    tracing::error!(session_id = %stream.session_id(), "Turn ended with error: {}", e);
                    break;
                }
            }
        }
        output.write_all(b"\n").await?;
        output.flush().await?;

        if !reply.is_empty() {
            ctx.append(ChatMessage::assistant(reply));
        }
    }

    Ok(ctx)
}
