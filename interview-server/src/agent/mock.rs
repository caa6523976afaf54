//! Scripted in-process agent for tests.
//!
//! Returns queued runs in order and records every call, so tests can drive
//! whole interview flows without the agent service and then assert on what
//! was sent to it.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{AgentError, AgentGateway, AgentRun, RunInput};

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub thread_id: String,
    pub assistant_id: String,
    pub route: Option<&'static str>,
    pub message: Option<String>,
}

pub struct MockAgent {
    script: Mutex<VecDeque<AgentRun>>,
    calls: Mutex<Vec<RecordedCall>>,
    threads: AtomicUsize,
}

impl MockAgent {
    pub fn new(script: Vec<AgentRun>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
            threads: AtomicUsize::new(0),
        })
    }

    /// Calls recorded so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Append another scripted run.
    pub fn push_run(&self, run: AgentRun) {
        self.script.lock().unwrap().push_back(run);
    }
}

#[async_trait]
impl AgentGateway for MockAgent {
    async fn create_thread(&self) -> Result<String, AgentError> {
        let n = self.threads.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("thread-{n}"))
    }

    async fn run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        input: RunInput,
    ) -> Result<AgentRun, AgentError> {
        self.calls.lock().unwrap().push(RecordedCall {
            thread_id: thread_id.to_string(),
            assistant_id: assistant_id.to_string(),
            route: input.route,
            message: input.messages.first().map(|m| m.content.clone()),
        });

        self.script
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(AgentError::NoReply)
    }
}
