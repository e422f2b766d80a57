//! Server-sent events for streamed chat completions.
//!
//! [`ChatCompletionStream`] turns the response body of a `stream: true`
//! request into text deltas. Lines may be split across network chunks;
//! [`SseDecoder`] buffers until a full line is available.

use bytes::Bytes;
use futures::stream::Stream;
use serde::Deserialize;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::OpenAIError;

/// One decoded event from a streamed completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Text appended to the answer (may be empty)
    Delta(String),
    /// `data: [DONE]`
    Done,
}

#[derive(Debug, Deserialize)]
struct StreamChunkRaw {
    #[serde(default)]
    choices: Vec<StreamChoiceRaw>,
    #[serde(default)]
    error: Option<StreamErrorRaw>,
}

#[derive(Debug, Deserialize)]
struct StreamChoiceRaw {
    delta: DeltaRaw,
}

#[derive(Debug, Deserialize)]
struct DeltaRaw {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamErrorRaw {
    message: String,
}

/// Incremental SSE line decoder.
///
/// Buffers bytes, so a UTF-8 sequence split between network chunks is
/// decoded once its line is complete.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw body bytes.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Next complete event, or `None` until more bytes arrive.
    ///
    /// With `eof` set, a final line without a trailing newline is decoded too.
    pub fn next_event(&mut self, eof: bool) -> Option<Result<StreamEvent, OpenAIError>> {
        loop {
            let line: Vec<u8> = match self.buffer.iter().position(|&b| b == b'\n') {
                Some(pos) => self.buffer.drain(..=pos).collect(),
                None if eof && !self.buffer.is_empty() => std::mem::take(&mut self.buffer),
                None => return None,
            };

            let line = match std::str::from_utf8(&line) {
                Ok(line) => line.trim(),
                Err(e) => {
                    return Some(Err(OpenAIError::Parse(format!(
                        "Invalid UTF-8 in stream: {}",
                        e
                    ))))
                }
            };

            // Blank separators, comments and event:/id:/retry: fields
            let Some(data) = line.strip_prefix("data:") else {
                continue;
            };
            return Some(parse_data(data.trim()));
        }
    }
}

fn parse_data(data: &str) -> Result<StreamEvent, OpenAIError> {
    if data == "[DONE]" {
        return Ok(StreamEvent::Done);
    }

    let raw: StreamChunkRaw = serde_json::from_str(data).map_err(|e| {
        OpenAIError::Parse(format!(
            "Failed to parse stream chunk: {} (data: {})",
            e,
            data.chars().take(200).collect::<String>()
        ))
    })?;

    if let Some(error) = raw.error {
        return Err(OpenAIError::Api(error.message));
    }

    Ok(StreamEvent::Delta(
        raw.choices
            .into_iter()
            .next()
            .and_then(|c| c.delta.content)
            .unwrap_or_default(),
    ))
}

/// Stream of [`StreamEvent`]s over a response body.
///
/// Ends after [`StreamEvent::Done`] or when the body ends.
pub struct ChatCompletionStream {
    inner: Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>,
    decoder: SseDecoder,
    finished: bool,
}

impl ChatCompletionStream {
    pub(crate) fn new(
        byte_stream: impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    ) -> Self {
        Self {
            inner: Box::pin(byte_stream),
            decoder: SseDecoder::new(),
            finished: false,
        }
    }
}

impl Stream for ChatCompletionStream {
    type Item = Result<StreamEvent, OpenAIError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(event) = this.decoder.next_event(this.finished) {
                return Poll::Ready(Some(event));
            }
            if this.finished {
                return Poll::Ready(None);
            }

            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => this.decoder.push(&bytes),
                Poll::Ready(Some(Err(e))) => {
                    return Poll::Ready(Some(Err(OpenAIError::from_transport(e))));
                }
                Poll::Ready(None) => this.finished = true,
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
