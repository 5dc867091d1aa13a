//! Status stream sink.
//!
//! Every stage reports progress through a [`LogSink`] instead of writing to
//! the terminal itself. [`ChannelSink`] funnels all messages through one
//! bounded queue drained by a single consumer task, so concurrent producers
//! can never interleave partial lines.

use async_trait::async_trait;
use colored::Colorize;
use std::sync::Mutex;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// One message on the status stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    /// A full line; a newline is appended on output.
    Line(String),
    /// A line that is overwritten by the next transient message.
    Transient(String),
    /// Written exactly as given (tables, prompts).
    Raw(String),
}

impl StatusMessage {
    /// `[*]` step announcement.
    pub fn step(text: impl AsRef<str>) -> Self {
        Self::Line(format!("{} {}", "[*]".cyan(), text.as_ref()))
    }

    /// `[+]` positive result.
    pub fn info(text: impl AsRef<str>) -> Self {
        Self::Line(format!("{} {}", "[+]".green(), text.as_ref()))
    }

    /// `[-]` negative result or failure.
    pub fn warn(text: impl AsRef<str>) -> Self {
        Self::Line(format!("{} {}", "[-]".red(), text.as_ref()))
    }

    /// Text of the message without any line framing.
    pub fn text(&self) -> &str {
        match self {
            Self::Line(text) | Self::Transient(text) | Self::Raw(text) => text,
        }
    }

    fn render(&self) -> String {
        match self {
            Self::Line(text) => format!("{text}\n"),
            Self::Transient(text) => format!("\r{text}"),
            Self::Raw(text) => text.clone(),
        }
    }
}

/// Fire-and-forget receiver of status messages.
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn send(&self, message: StatusMessage);

    /// Wait until everything sent so far has reached the output.
    async fn flush(&self) {}
}

enum SinkCommand {
    Message(StatusMessage),
    Flush(oneshot::Sender<()>),
    Close,
}

/// Sink backed by a bounded queue and a single writer task.
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<SinkCommand>,
}

/// Handle to the consumer task of a [`ChannelSink`].
pub struct SinkConsumer<W> {
    handle: JoinHandle<std::io::Result<W>>,
}

impl ChannelSink {
    /// Start the consumer task writing to `writer`.
    pub fn spawn<W>(writer: W, capacity: usize) -> (Self, SinkConsumer<W>)
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(consume(rx, writer));
        (Self { tx }, SinkConsumer { handle })
    }

    /// Stop accepting messages. Messages already queued are still written.
    pub async fn close(&self) {
        let _ = self.tx.send(SinkCommand::Close).await;
    }
}

impl<W> SinkConsumer<W> {
    /// Wait for the consumer to drain the queue and hand back the writer.
    pub async fn finish(self) -> std::io::Result<W> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(std::io::Error::other(e)),
        }
    }
}

async fn consume<W>(mut rx: mpsc::Receiver<SinkCommand>, mut writer: W) -> std::io::Result<W>
where
    W: AsyncWrite + Unpin,
{
    while let Some(command) = rx.recv().await {
        match command {
            SinkCommand::Message(message) => {
                writer.write_all(message.render().as_bytes()).await?;
                if !matches!(message, StatusMessage::Line(_)) {
                    writer.flush().await?;
                }
            }
            SinkCommand::Flush(ack) => {
                writer.flush().await?;
                let _ = ack.send(());
            }
            SinkCommand::Close => rx.close(),
        }
    }
    writer.flush().await?;
    Ok(writer)
}

#[async_trait]
impl LogSink for ChannelSink {
    async fn send(&self, message: StatusMessage) {
        if self.tx.send(SinkCommand::Message(message)).await.is_err() {
            tracing::trace!("status sink closed, message dropped");
        }
    }

    async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(SinkCommand::Flush(ack_tx)).await.is_ok() {
            let _ = ack_rx.await;
        }
    }
}

/// Sink that keeps every message in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    messages: Mutex<Vec<StatusMessage>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<StatusMessage> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }

    /// Whether any message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.messages().iter().any(|m| m.text().contains(needle))
    }
}

#[async_trait]
impl LogSink for MemorySink {
    async fn send(&self, message: StatusMessage) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message);
        }
    }
}
