//! Server-sent events subscription for beacon node `block` events.
//!
//! The subscription runs as a producer task that frames the response body with [`SseDecoder`],
//! decodes `block` events and forwards them over a bounded channel. The receiving half is a
//! [`BlockEventStream`].

use std::{
    pin::Pin,
    task::{Context, Poll},
};

use dummy_prover_types::{BLOCK_TOPIC, BlockNotification};
use futures::{Stream, StreamExt};
use reqwest::header::ACCEPT;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::{
    Error, Result,
    http::{base_url, cancellable, protocol_error},
};

/// One dispatched server-sent event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    /// Value of the last `event:` line, empty if none was sent.
    pub event: String,
    /// Values of all `data:` lines joined with `\n`.
    pub data: String,
}

/// Longest line [`SseDecoder`] buffers. A longer line is dropped together with its frame.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Incremental `text/event-stream` decoder.
///
/// Bytes may arrive split at arbitrary points; incomplete lines are buffered until the rest
/// arrives.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    /// Length of the prefix of `buffer` known to contain no newline.
    scanned: usize,
    /// Discarding the remainder of an oversized line.
    skipping_line: bool,
    /// The current frame lost a line and is not dispatched.
    truncated: bool,
    event: String,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk of the body and returns every frame it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        let mut start = 0;
        let mut search_from = self.scanned;
        while let Some(offset) = self.buffer[search_from..].iter().position(|b| *b == b'\n') {
            let end = search_from + offset;
            let line = self.buffer[start..end]
                .strip_suffix(b"\r")
                .unwrap_or(&self.buffer[start..end]);
            let line = String::from_utf8_lossy(line).into_owned();
            start = end + 1;
            search_from = start;

            if std::mem::take(&mut self.skipping_line) {
                continue;
            }
            if let Some(frame) = self.line(&line) {
                frames.push(frame);
            }
        }
        self.buffer.drain(..start);
        self.scanned = self.buffer.len();

        if self.buffer.len() > MAX_LINE_BYTES {
            warn!(
                buffered = self.buffer.len(),
                max = MAX_LINE_BYTES,
                "Dropping oversized event stream line"
            );
            self.buffer.clear();
            self.scanned = 0;
            self.skipping_line = true;
            self.truncated = true;
        }
        frames
    }

    fn line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        match field {
            "event" => self.event = value.trim().to_string(),
            "data" => self.data.push(value.trim().to_string()),
            // `id:`, `retry:` and unknown fields
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = std::mem::take(&mut self.event);
        let data = std::mem::take(&mut self.data);
        if std::mem::take(&mut self.truncated) || (event.is_empty() && data.is_empty()) {
            return None;
        }
        Some(SseFrame {
            event,
            data: data.join("\n"),
        })
    }
}

/// Message delivered by a [`BlockEventStream`].
#[derive(Debug)]
pub enum StreamMessage {
    /// A decoded `block` event, in arrival order.
    Event(BlockNotification),
    /// The subscription failed. Sent at most once, as the last message.
    Failed(Error),
}

/// Lifecycle of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Connecting,
    Streaming,
    /// Stopped by cancellation.
    Closed,
    Failed,
}

/// Receiving half of a `block` event subscription.
///
/// The channel ends without a [`StreamMessage::Failed`] when the subscription was cancelled.
/// Dropping the stream stops the producer task.
#[derive(Debug)]
pub struct BlockEventStream {
    rx: mpsc::Receiver<StreamMessage>,
    state: watch::Receiver<StreamState>,
    handle: JoinHandle<()>,
}

impl BlockEventStream {
    /// Receives the next message, `None` once the producer has stopped.
    pub async fn recv(&mut self) -> Option<StreamMessage> {
        self.rx.recv().await
    }

    pub fn state(&self) -> StreamState {
        *self.state.borrow()
    }
}

impl Stream for BlockEventStream {
    type Item = StreamMessage;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl Drop for BlockEventStream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Subscribe to `block` events of the beacon node at `url`.
///
/// Must be called within a tokio runtime. At most `capacity` decoded events are buffered; when
/// the buffer is full the producer waits for the consumer or for `cancel`.
pub fn subscribe_block_events(
    name: impl Into<String>,
    url: &Url,
    cancel: CancellationToken,
    capacity: usize,
) -> Result<BlockEventStream> {
    let url = build_events_url(url)?;
    // No total timeout, the response body never completes.
    let http_client = reqwest::Client::builder().build()?;

    let (tx, rx) = mpsc::channel(capacity.max(1));
    let (state_tx, state) = watch::channel(StreamState::Connecting);

    let producer = Producer {
        name: name.into(),
        url,
        http_client,
        tx,
        state: state_tx,
        cancel,
    };
    let handle = tokio::spawn(producer.run());

    Ok(BlockEventStream { rx, state, handle })
}

fn build_events_url(base: &Url) -> Result<Url> {
    Ok(base_url(base.clone()).join(&format!("eth/v1/events?topics={BLOCK_TOPIC}"))?)
}

struct Producer {
    name: String,
    url: Url,
    http_client: reqwest::Client,
    tx: mpsc::Sender<StreamMessage>,
    state: watch::Sender<StreamState>,
    cancel: CancellationToken,
}

impl Producer {
    async fn run(self) {
        let error = match self.stream().await {
            Err(error) if !error.is_cancelled() && !self.cancel.is_cancelled() => error,
            _ => {
                self.state.send_replace(StreamState::Closed);
                debug!(name = %self.name, "Event stream closed");
                return;
            }
        };

        self.state.send_replace(StreamState::Failed);
        warn!(name = %self.name, url = %self.url, %error, "Event stream failed");
        // A cancelled or departed consumer no longer needs the report.
        let _ = self.deliver(StreamMessage::Failed(error)).await;
    }

    async fn stream(&self) -> Result<()> {
        let response = cancellable(&self.cancel, async {
            Ok(self
                .http_client
                .get(self.url.clone())
                .header(ACCEPT, "text/event-stream")
                .send()
                .await?)
        })
        .await?;

        if !response.status().is_success() {
            return Err(protocol_error(self.url.clone(), response).await);
        }

        self.state.send_replace(StreamState::Streaming);
        info!(name = %self.name, url = %self.url, "Subscribed to block events");

        let mut body = response.bytes_stream();
        let mut decoder = SseDecoder::new();
        loop {
            let chunk = tokio::select! {
                biased;

                _ = self.cancel.cancelled() => return Err(Error::Cancelled),
                chunk = body.next() => chunk,
            };
            let Some(chunk) = chunk else {
                return Err(Error::StreamEnded);
            };

            for frame in decoder.push(&chunk?) {
                if let Some(event) = self.decode(&frame) {
                    self.deliver(StreamMessage::Event(event)).await?;
                }
            }
        }
    }

    fn decode(&self, frame: &SseFrame) -> Option<BlockNotification> {
        if frame.event != BLOCK_TOPIC || frame.data.is_empty() {
            trace!(name = %self.name, event = %frame.event, "Skipping event");
            return None;
        }

        match BlockNotification::from_json(&frame.data) {
            Ok(event) => Some(event),
            Err(error) => {
                warn!(
                    name = %self.name,
                    %error,
                    data = %frame.data,
                    "Dropping malformed block event"
                );
                None
            }
        }
    }

    async fn deliver(&self, message: StreamMessage) -> Result<()> {
        tokio::select! {
            biased;

            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            // Receiver dropped: nobody is consuming anymore.
            sent = self.tx.send(message) => sent.map_err(|_| Error::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_events_url_adds_path_without_trailing_slash() {
        let url = build_events_url(&Url::parse("http://localhost:5052").unwrap()).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5052/eth/v1/events?topics=block"
        );
    }

    #[test]
    fn build_events_url_adds_path_with_trailing_slash() {
        let url = build_events_url(&Url::parse("http://localhost:5052/").unwrap()).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5052/eth/v1/events?topics=block"
        );
    }

    #[test]
    fn decoder_emits_frame_on_blank_line() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push(b"event: block\ndata: {\"slot\":\"1\"}\n\n");
        assert_eq!(
            frames,
            vec![SseFrame {
                event: "block".to_string(),
                data: "{\"slot\":\"1\"}".to_string(),
            }]
        );
    }

    #[test]
    fn decoder_buffers_partial_lines() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"eve").is_empty());
        assert!(decoder.push(b"nt: blo").is_empty());
        assert!(decoder.push(b"ck\ndata: ab").is_empty());
        assert!(decoder.push(b"c\n").is_empty());

        let frames = decoder.push(b"\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "block");
        assert_eq!(frames[0].data, "abc");
    }

    #[test]
    fn decoder_accepts_crlf_and_ignores_comments() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push(b": keep-alive\r\nevent:block\r\nid: 7\r\ndata:x\r\n\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "block");
        assert_eq!(frames[0].data, "x");
    }

    #[test]
    fn decoder_joins_data_lines() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push(b"event: block\ndata: {\"a\":\ndata: 1}\n\n");
        assert_eq!(frames[0].data, "{\"a\":\n1}");
    }

    #[test]
    fn decoder_resets_between_frames() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push(b"event: head\ndata: 1\n\ndata: 2\n\n\n\n");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].event, "head");
        assert_eq!(frames[1].event, "");
        assert_eq!(frames[1].data, "2");
    }

    #[test]
    fn decoder_matches_field_names_exactly() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push(b"event: block\n  data: x\ndata : y\ndata: z\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "z");
    }

    #[test]
    fn decoder_drops_oversized_line_with_its_frame() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: block\ndata: ").is_empty());
        let chunk = vec![b'a'; 64 * 1024];
        for _ in 0..(MAX_LINE_BYTES / chunk.len() + 1) {
            assert!(decoder.push(&chunk).is_empty());
        }
        assert!(decoder.buffer.len() <= MAX_LINE_BYTES);

        assert!(decoder.push(b"aaaa\n\n").is_empty());

        let frames = decoder.push(b"event: block\ndata: ok\n\n");
        assert_eq!(
            frames,
            vec![SseFrame {
                event: "block".to_string(),
                data: "ok".to_string(),
            }]
        );
    }
}
