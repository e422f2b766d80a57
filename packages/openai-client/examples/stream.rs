//! Streamed chat completion against Groq, printing tokens as they arrive

use futures::StreamExt;
use openai_client::{ChatRequest, Message, OpenAIClient, StreamEvent};
use std::io::Write;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = OpenAIClient::groq_from_env()?;

    let mut stream = client
        .chat_completion_stream(
            ChatRequest::new("llama-3.3-70b-versatile")
                .message(Message::system("You are a concise legal assistant."))
                .message(Message::user("Explain a force majeure clause in two sentences.")),
        )
        .await?;

    while let Some(event) = stream.next().await {
        match event? {
            StreamEvent::Delta(text) => {
                print!("{}", text);
                std::io::stdout().flush()?;
            }
            StreamEvent::Done => break,
        }
    }
    println!();

    Ok(())
}
