//! Generative agent adapter.
//!
//! Wraps one invocation of the agent CLI: spawn the process, consume its
//! newline-delimited JSON event stream sequentially, and fold the events
//! into a terminal [`AgentOutcome`]. Event kinds are decided once here as
//! a closed tagged union — the retry loop never inspects raw events.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::ForgeConfig;
use crate::error::{ForgeError, Result};

/// Terminal result of one agent invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentOutcome {
    /// Whether the agent reported terminal success.
    pub succeeded: bool,

    /// Session identifier captured from the event stream; passing it back
    /// resumes the same conversational context.
    pub session_id: Option<String>,
}

/// One invocation of the agent.
#[derive(Debug, Clone)]
pub struct AgentInvocation {
    /// User prompt text.
    pub prompt: String,

    /// System/persona prompt text.
    pub system_prompt: String,

    /// Session to resume, if any.
    pub resume: Option<String>,
}

impl AgentInvocation {
    pub fn new(prompt: String, system_prompt: String) -> Self {
        Self {
            prompt,
            system_prompt,
            resume: None,
        }
    }

    /// Resume a prior session.
    pub fn resuming(mut self, session_id: Option<String>) -> Self {
        self.resume = session_id;
        self
    }
}

/// A content block inside an assistant message.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        name: String,
    },
    #[serde(other)]
    Other,
}

/// Assistant message payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

/// Closed union over the agent's stream-JSON event kinds.
///
/// Unrecognized kinds deserialize to [`AgentEvent::Unknown`] and are
/// ignored, not errors.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Lifecycle events; the `init` subtype carries the session id.
    System {
        #[serde(default)]
        subtype: String,
        #[serde(default)]
        session_id: Option<String>,
    },

    /// Assistant output (text and tool-use blocks).
    Assistant {
        #[serde(default)]
        message: AssistantMessage,
    },

    /// Terminal result; subtype `success` marks a successful run.
    Result {
        #[serde(default)]
        subtype: String,
        #[serde(default)]
        session_id: Option<String>,
    },

    #[serde(other)]
    Unknown,
}

/// Fold a sequence of events into a terminal [`AgentOutcome`].
///
/// Success iff a `Result` event with subtype `success` was seen. The
/// session id comes from the first event that carries one.
pub fn fold_outcome(events: impl IntoIterator<Item = AgentEvent>) -> AgentOutcome {
    let mut succeeded = false;
    let mut session_id: Option<String> = None;

    for event in events {
        match event {
            AgentEvent::System {
                session_id: sid, ..
            } => {
                if session_id.is_none() {
                    session_id = sid;
                }
            }
            AgentEvent::Result {
                subtype,
                session_id: sid,
            } => {
                if session_id.is_none() {
                    session_id = sid;
                }
                succeeded = subtype == "success";
            }
            AgentEvent::Assistant { .. } | AgentEvent::Unknown => {}
        }
    }

    AgentOutcome {
        succeeded,
        session_id,
    }
}

/// Client for one-shot agent invocations.
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Run a single invocation to its terminal outcome.
    async fn invoke(&self, invocation: &AgentInvocation) -> Result<AgentOutcome>;
}

/// Subprocess-backed agent client speaking the stream-JSON protocol.
pub struct CliAgentClient {
    program: String,
    model: String,
    max_turns: u32,
    cwd: PathBuf,
    allowed_tools: Vec<String>,
    permission_mode: String,
}

impl CliAgentClient {
    /// Build a client from the shared configuration.
    pub fn from_config(config: &ForgeConfig) -> Self {
        Self {
            program: config.agent_program.clone(),
            model: config.model.clone(),
            max_turns: config.max_turns,
            cwd: config.project_root.clone(),
            allowed_tools: ["Read", "Write", "Edit", "Bash", "Glob", "Grep"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            permission_mode: "acceptEdits".to_string(),
        }
    }
}

#[async_trait]
impl AgentClient for CliAgentClient {
    async fn invoke(&self, invocation: &AgentInvocation) -> Result<AgentOutcome> {
        let mut command = Command::new(&self.program);
        command
            .arg("-p")
            .arg(&invocation.prompt)
            .arg("--output-format")
            .arg("stream-json")
            .arg("--verbose")
            .arg("--system-prompt")
            .arg(&invocation.system_prompt)
            .arg("--model")
            .arg(&self.model)
            .arg("--max-turns")
            .arg(self.max_turns.to_string())
            .arg("--allowed-tools")
            .arg(self.allowed_tools.join(","))
            .arg("--permission-mode")
            .arg(&self.permission_mode)
            .current_dir(&self.cwd)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(session) = &invocation.resume {
            command.arg("--resume").arg(session);
        }

        let mut child = command
            .spawn()
            .map_err(|e| ForgeError::Agent(format!("failed to spawn '{}': {e}", self.program)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ForgeError::Agent("agent stdout not captured".to_string()))?;

        // stderr must be drained while stdout is consumed, or the child
        // blocks writing to a full pipe and never reaches its terminal
        // event.
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ForgeError::Agent("agent stderr not captured".to_string()))?;
        let stderr_drain = tokio::spawn(async move {
            let mut sink = tokio::io::sink();
            let _ = tokio::io::copy(&mut stderr, &mut sink).await;
        });

        // Sequential consumption: the loop never proceeds while events are
        // still in flight.
        let mut events = Vec::new();
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let event: AgentEvent = match serde_json::from_str(&line) {
                Ok(event) => event,
                Err(e) => {
                    debug!(error = %e, "skipping unparseable agent event line");
                    continue;
                }
            };

            if let AgentEvent::Assistant { message } = &event {
                for block in &message.content {
                    match block {
                        ContentBlock::Text { text } => info!(target: "agent", "{text}"),
                        ContentBlock::ToolUse { name } => {
                            info!(target: "agent", tool = %name, "tool use")
                        }
                        ContentBlock::Other => {}
                    }
                }
            }
            if let AgentEvent::Result { subtype, .. } = &event {
                if subtype != "success" {
                    warn!(status = %subtype, "agent finished with non-success status");
                }
            }

            events.push(event);
        }

        let status = child
            .wait()
            .await
            .map_err(|e| ForgeError::Agent(format!("agent process error: {e}")))?;
        stderr_drain.await.ok();
        if !status.success() {
            debug!(code = ?status.code(), "agent process exited non-zero");
        }

        Ok(fold_outcome(events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> AgentEvent {
        serde_json::from_str(line).expect("event should parse")
    }

    #[test]
    fn test_fold_success_with_session() {
        let events = vec![
            parse(r#"{"type":"system","subtype":"init","session_id":"sess-1"}"#),
            parse(r#"{"type":"assistant","message":{"content":[{"type":"text","text":"writing"}]}}"#),
            parse(r#"{"type":"result","subtype":"success"}"#),
        ];
        let outcome = fold_outcome(events);
        assert!(outcome.succeeded);
        assert_eq!(outcome.session_id.as_deref(), Some("sess-1"));
    }

    #[test]
    fn test_fold_failure_subtype() {
        let events = vec![
            parse(r#"{"type":"system","subtype":"init","session_id":"sess-2"}"#),
            parse(r#"{"type":"result","subtype":"error_max_turns"}"#),
        ];
        let outcome = fold_outcome(events);
        assert!(!outcome.succeeded);
        assert_eq!(outcome.session_id.as_deref(), Some("sess-2"));
    }

    #[test]
    fn test_fold_no_terminal_event_is_failure() {
        let events = vec![parse(r#"{"type":"system","subtype":"init","session_id":"s"}"#)];
        assert!(!fold_outcome(events).succeeded);
    }

    #[test]
    fn test_unknown_event_kinds_ignored() {
        let events = vec![
            parse(r#"{"type":"telemetry","blob":42}"#),
            parse(r#"{"type":"result","subtype":"success","session_id":"s-3"}"#),
        ];
        assert!(matches!(events[0], AgentEvent::Unknown));
        let outcome = fold_outcome(events);
        assert!(outcome.succeeded);
        assert_eq!(outcome.session_id.as_deref(), Some("s-3"));
    }

    #[test]
    fn test_session_id_from_first_carrier_wins() {
        let events = vec![
            parse(r#"{"type":"system","subtype":"init","session_id":"first"}"#),
            parse(r#"{"type":"result","subtype":"success","session_id":"second"}"#),
        ];
        let outcome = fold_outcome(events);
        assert_eq!(outcome.session_id.as_deref(), Some("first"));
    }

    #[test]
    fn test_tool_use_block_parses() {
        let event =
            parse(r#"{"type":"assistant","message":{"content":[{"type":"tool_use","name":"Write","input":{}}]}}"#);
        match event {
            AgentEvent::Assistant { message } => {
                assert!(matches!(&message.content[0], ContentBlock::ToolUse { name } if name == "Write"));
            }
            other => panic!("expected Assistant, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stderr_flood_does_not_block_invoke() {
        use std::os::unix::fs::PermissionsExt;
        use std::time::Duration;

        // An agent that floods stderr well past the OS pipe buffer before
        // emitting its terminal stdout event.
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("agent.sh");
        std::fs::write(
            &script,
            concat!(
                "#!/bin/sh\n",
                "i=0\n",
                "while [ $i -lt 20000 ]; do\n",
                "  echo \"stderr noise line $i\" >&2\n",
                "  i=$((i+1))\n",
                "done\n",
                "echo '{\"type\":\"system\",\"subtype\":\"init\",\"session_id\":\"s-9\"}'\n",
                "echo '{\"type\":\"result\",\"subtype\":\"success\"}'\n",
            ),
        )
        .unwrap();
        let mut perms = std::fs::metadata(&script).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&script, perms).unwrap();

        let mut config =
            ForgeConfig::new(dir.path().to_path_buf(), PathBuf::from("cli.js")).with_max_turns(1);
        config.agent_program = script.to_string_lossy().to_string();
        let client = CliAgentClient::from_config(&config);

        let invocation = AgentInvocation::new("go".to_string(), "persona".to_string());
        let outcome = tokio::time::timeout(Duration::from_secs(30), client.invoke(&invocation))
            .await
            .expect("invoke must not hang on a stderr-heavy agent")
            .unwrap();

        assert!(outcome.succeeded);
        assert_eq!(outcome.session_id.as_deref(), Some("s-9"));
    }

    #[test]
    fn test_invocation_resuming() {
        let inv = AgentInvocation::new("go".to_string(), "persona".to_string())
            .resuming(Some("sess".to_string()));
        assert_eq!(inv.resume.as_deref(), Some("sess"));
    }
}
