//! In-memory fakes for the agent and validator seams (testing only).
//!
//! `ScriptedAgent` and `ScriptedValidator` satisfy the trait contracts
//! without spawning any subprocess: replies are queued up front and
//! consumed in order, and every invocation is journaled so tests can
//! assert on counts, prompts, and session threading.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::agent::{AgentClient, AgentInvocation, AgentOutcome};
use crate::error::{ForgeError, Result};
use crate::validator::{LessonValidator, ValidationOutcome};

enum AgentReply {
    Outcome(AgentOutcome),
    Error(String),
}

/// Agent fake that replays a scripted sequence of outcomes.
#[derive(Default)]
pub struct ScriptedAgent {
    replies: Mutex<VecDeque<AgentReply>>,
    journal: Mutex<Vec<AgentInvocation>>,
}

impl ScriptedAgent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful invocation reporting the given session id.
    pub fn push_success(&self, session_id: Option<&str>) {
        self.replies
            .lock()
            .unwrap()
            .push_back(AgentReply::Outcome(AgentOutcome {
                succeeded: true,
                session_id: session_id.map(str::to_string),
            }));
    }

    /// Queue a self-reported failure (the invocation still completes).
    pub fn push_failure(&self, session_id: Option<&str>) {
        self.replies
            .lock()
            .unwrap()
            .push_back(AgentReply::Outcome(AgentOutcome {
                succeeded: false,
                session_id: session_id.map(str::to_string),
            }));
    }

    /// Queue an invocation-level error (spawn failure etc.).
    pub fn push_error(&self, message: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(AgentReply::Error(message.to_string()));
    }

    /// All invocations observed so far, in order.
    pub fn invocations(&self) -> Vec<AgentInvocation> {
        self.journal.lock().unwrap().clone()
    }

    /// Number of invocations observed so far.
    pub fn invocation_count(&self) -> usize {
        self.journal.lock().unwrap().len()
    }
}

#[async_trait]
impl AgentClient for ScriptedAgent {
    async fn invoke(&self, invocation: &AgentInvocation) -> Result<AgentOutcome> {
        self.journal.lock().unwrap().push(invocation.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("ScriptedAgent: no reply queued for invocation");
        match reply {
            AgentReply::Outcome(outcome) => Ok(outcome),
            AgentReply::Error(message) => Err(ForgeError::Agent(message)),
        }
    }
}

/// Validator fake that replays a scripted sequence of outcomes.
#[derive(Default)]
pub struct ScriptedValidator {
    outcomes: Mutex<VecDeque<ValidationOutcome>>,
    calls: Mutex<Vec<PathBuf>>,
}

impl ScriptedValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a passing outcome.
    pub fn push_pass(&self) {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(ValidationOutcome::passed(String::new()));
    }

    /// Queue a failing outcome with the given diagnostic text.
    pub fn push_fail(&self, raw_output: &str, error_count: usize) {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(ValidationOutcome::failed(raw_output.to_string(), error_count));
    }

    /// Paths validated so far, in order.
    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of validator invocations so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl LessonValidator for ScriptedValidator {
    async fn validate(&self, document: &Path) -> ValidationOutcome {
        self.calls.lock().unwrap().push(document.to_path_buf());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .expect("ScriptedValidator: no outcome queued for invocation")
    }
}
