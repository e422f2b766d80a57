//! Basic chat completion against Groq

use openai_client::{ChatRequest, Message, OpenAIClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = OpenAIClient::groq_from_env()?;

    let response = client
        .chat_completion(
            ChatRequest::new("llama-3.3-70b-versatile")
                .message(Message::system("You are a concise legal assistant."))
                .message(Message::user("What is an indemnification clause, in one sentence?"))
                .temperature(0.2)
                .max_completion_tokens(200),
        )
        .await?;

    println!("Response: {}", response.content);
    if let Some(usage) = response.usage {
        println!("Tokens used: {}", usage.total_tokens);
    }

    Ok(())
}
