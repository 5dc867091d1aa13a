#[cfg(test)]
pub mod fixtures {
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::error::Result as LseResult;
    use crate::runtime::executor::{ExecError, ExecOutput, ExecStatus, RemoteExecutor};
    use crate::runtime::gate::ConfirmationGate;
    use crate::runtime::sink::LogSink;
    use crate::types::{CapabilityResult, ContainerRef};

    enum Reply {
        Output(ExecOutput),
        Transport,
    }

    /// One recorded `exec` call.
    #[derive(Debug, Clone)]
    pub struct RecordedCall {
        pub target: ContainerRef,
        pub command: String,
        pub stdin: Option<Vec<u8>>,
    }

    /// In-memory executor answering from a script of canned replies.
    ///
    /// Unscripted commands answer `CommandNotFound`.
    #[derive(Default)]
    pub struct ScriptedExecutor {
        replies: HashMap<(String, String, String), Reply>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl ScriptedExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(mut self, pod: &str, container: &str, command: &str, output: ExecOutput) -> Self {
            self.replies.insert(key(pod, container, command), Reply::Output(output));
            self
        }

        pub fn fail_transport(mut self, pod: &str, container: &str, command: &str) -> Self {
            self.replies.insert(key(pod, container, command), Reply::Transport);
            self
        }

        /// Script a container with a shell and every listed utility.
        pub fn healthy(self, pod: &str, container: &str, utilities: &[&str]) -> Self {
            utilities.iter().fold(
                self.respond(pod, container, "sh --version", ExecOutput::success("")),
                |executor, utility| executor.respond(pod, container, utility, ExecOutput::success("")),
            )
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn was_called(&self, pod: &str, container: &str, command: &str) -> bool {
            self.calls().iter().any(|c| {
                c.target.pod == pod && c.target.container == container && c.command == command
            })
        }
    }

    fn key(pod: &str, container: &str, command: &str) -> (String, String, String) {
        (pod.to_string(), container.to_string(), command.to_string())
    }

    #[async_trait]
    impl RemoteExecutor for ScriptedExecutor {
        async fn exec(
            &self,
            target: &ContainerRef,
            command: &[String],
            stdin: Option<Vec<u8>>,
        ) -> Result<ExecOutput, ExecError> {
            let command = command.join(" ");
            self.calls.lock().unwrap().push(RecordedCall {
                target: target.clone(),
                command: command.clone(),
                stdin,
            });

            match self.replies.get(&key(&target.pod, &target.container, &command)) {
                Some(Reply::Output(output)) => Ok(output.clone()),
                Some(Reply::Transport) => Err(ExecError::Stream {
                    target: target.to_string(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        "connection reset by peer",
                    ),
                }),
                None => Ok(ExecOutput::new(ExecStatus::CommandNotFound)
                    .with_stderr(format!("{command}: not found"))),
            }
        }
    }

    pub fn testable(pod: &str, container: &str, shell: &str) -> CapabilityResult {
        CapabilityResult::new(ContainerRef::new(pod, container), Some(shell.to_string()), true)
    }

    /// Gate with a fixed answer that counts how often it was asked.
    #[derive(Debug)]
    pub struct RecordingGate {
        answer: bool,
        asked: AtomicUsize,
    }

    impl RecordingGate {
        pub fn answering(answer: bool) -> Self {
            Self {
                answer,
                asked: AtomicUsize::new(0),
            }
        }

        pub fn times_asked(&self) -> usize {
            self.asked.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ConfirmationGate for RecordingGate {
        async fn confirm(&self, _sink: &dyn LogSink) -> LseResult<bool> {
            self.asked.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer)
        }
    }
}
