//! Confirmation gate between probing and scanning.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;

use super::sink::{LogSink, StatusMessage};
use crate::error::{IoOperation, LseError, Result};

pub const PROMPT: &str = "\nDo you wish to proceed with testing? (Y/N): ";

/// Decides whether the scan stage may start.
#[async_trait]
pub trait ConfirmationGate: Send + Sync {
    async fn confirm(&self, sink: &dyn LogSink) -> Result<bool>;
}

/// Gate used in quiet mode: always proceeds without asking.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoProceed;

#[async_trait]
impl ConfirmationGate for AutoProceed {
    async fn confirm(&self, _sink: &dyn LogSink) -> Result<bool> {
        Ok(true)
    }
}

/// Gate that asks on the status stream and reads the answer from `input`.
pub struct PromptGate<R> {
    input: Mutex<R>,
}

impl PromptGate<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> PromptGate<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(input: R) -> Self {
        Self {
            input: Mutex::new(input),
        }
    }
}

#[async_trait]
impl<R> ConfirmationGate for PromptGate<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn confirm(&self, sink: &dyn LogSink) -> Result<bool> {
        let mut input = self.input.lock().await;
        prompt_yes_no(&mut *input, sink, PROMPT).await
    }
}

/// Ask until a `Y` or `N` answer (any case) arrives.
///
/// End of input counts as a negative answer.
pub async fn prompt_yes_no<R>(input: &mut R, sink: &dyn LogSink, prompt: &str) -> Result<bool>
where
    R: AsyncBufRead + Unpin + Send,
{
    loop {
        sink.send(StatusMessage::Raw(prompt.to_string())).await;
        sink.flush().await;

        let mut answer = String::new();
        let read = input
            .read_line(&mut answer)
            .await
            .map_err(|source| LseError::Io {
                path: "<stdin>".into(),
                operation: IoOperation::Read,
                source,
            })?;
        if read == 0 {
            sink.send(StatusMessage::Line(String::new())).await;
            return Ok(false);
        }

        match answer.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            _ => {
                sink.send(StatusMessage::Line(
                    "Invalid input. Please enter 'Y' or 'N'.".to_string(),
                ))
                .await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::sink::MemorySink;

    #[tokio::test]
    async fn test_yes() {
        let sink = MemorySink::new();
        let mut input: &[u8] = b"y\n";
        assert!(prompt_yes_no(&mut input, &sink, PROMPT).await.unwrap());
    }

    #[tokio::test]
    async fn test_no_uppercase() {
        let sink = MemorySink::new();
        let mut input: &[u8] = b"N\n";
        assert!(!prompt_yes_no(&mut input, &sink, PROMPT).await.unwrap());
    }

    #[tokio::test]
    async fn test_reprompts_until_valid() {
        let sink = MemorySink::new();
        let mut input: &[u8] = b"maybe\n\nyes\n  Y  \n";
        assert!(prompt_yes_no(&mut input, &sink, "ok? ").await.unwrap());

        let prompts = sink
            .messages()
            .iter()
            .filter(|m| m.text() == "ok? ")
            .count();
        assert_eq!(prompts, 4);
        let complaints = sink
            .messages()
            .iter()
            .filter(|m| m.text().contains("Invalid input"))
            .count();
        assert_eq!(complaints, 3);
    }

    #[tokio::test]
    async fn test_end_of_input_declines() {
        let sink = MemorySink::new();
        let mut input: &[u8] = b"";
        assert!(!prompt_yes_no(&mut input, &sink, PROMPT).await.unwrap());
    }

    #[tokio::test]
    async fn test_prompt_gate_reads_from_input() {
        let sink = MemorySink::new();
        let gate = PromptGate::new(&b"n\n"[..]);
        assert!(!gate.confirm(&sink).await.unwrap());
        assert!(sink.contains("Do you wish to proceed"));
    }

    #[tokio::test]
    async fn test_auto_proceed_never_prompts() {
        let sink = MemorySink::new();
        assert!(AutoProceed.confirm(&sink).await.unwrap());
        assert!(sink.messages().is_empty());
    }
}
