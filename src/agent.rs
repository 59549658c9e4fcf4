//! Bounded tool-using agent loop.
//!
//! Each run seeds a fresh transcript with the agent system prompt and the
//! user goal, then alternates model calls and tool executions until the
//! model answers without a tool tag, a model call fails, or the step budget
//! runs out. Tool failures are fed back into the transcript as tool messages
//! so the model can correct itself; only backend failures are fatal to the
//! run.

use std::sync::Arc;

use crate::logging::DisplaySink;
use crate::model::{Message, Mode, ModelBackend, ModelCallError};
use crate::parser::{self, strip_think_segments};
use crate::tools::ToolExecutor;

/// Upper bound on tool-executing steps in one agent run.
pub const MAX_AGENT_STEPS: usize = 3000;

/// System prompt establishing the single-tag tool protocol.
pub const AGENT_SYSTEM_PROMPT: &str = "\
You are an expert CLI agent. Your goal is to satisfy the user's request using tools. \
You MUST strictly adhere to the following rules:\n\n\
1. TOOL USAGE (CRITICAL): Output ONLY ONE single, self-closing XML tag per turn. \
It MUST be in the form: <tool_call function=\"TOOL_NAME\" ARG1=\"value\" ARG2=\"value\"/>. \
NEVER use separate opening and closing tags (e.g., `<tool_call>...</tool_call>`).\n\
2. ESCAPING (CRITICAL): Arguments MUST use double quotes. For `write_file` content, \
use literal backslash sequences: newline MUST be `\\n`, tab MUST be `\\t`, and a double \
quote inside a value MUST be `&quot;`.\n\
3. AVAILABLE TOOLS:\n\
   - write_file(path, content): Writes a file under the project folder. Content must be \
escaped and provided as a single attribute value.\n\
   - run_code(command): Executes shell commands (e.g., `python file.py`).\n\
4. CODE OUTPUT MANDATE (CRITICAL): All code that returns a value intended for the user \
MUST be wrapped in an explicit `print()` call so the output reaches STDOUT.\n\
5. DEBUG MANDATE (CRITICAL): Treat any `TOOL:ERROR` or empty output from `run_code` as \
a failure and rewrite the file to correct the logic. Do not declare success on empty output.\n\
6. AUTONOMY: Do not ask for human permission. Persist until the mission is completed. \
Stop only with a final, non-tool answer.";

/// How one agent run ended.
#[derive(Debug)]
pub enum AgentOutcome {
    /// The model answered without requesting a tool.
    FinalAnswer(String),
    /// The step budget ran out; the model was asked for one closing summary.
    BudgetExceeded(String),
    /// A backend call failed; the run stopped where it was.
    ModelCallFailed(ModelCallError),
}

/// Completed run: outcome plus the full transcript for inspection.
#[derive(Debug)]
pub struct AgentRun {
    pub outcome: AgentOutcome,
    pub transcript: Vec<Message>,
    /// Number of tool executions performed.
    pub steps: usize,
}

pub struct AgentLoop {
    backend: Arc<dyn ModelBackend>,
    display: Arc<dyn DisplaySink>,
    max_steps: usize,
}

impl AgentLoop {
    pub fn new(backend: Arc<dyn ModelBackend>, display: Arc<dyn DisplaySink>) -> Self {
        Self {
            backend,
            display,
            max_steps: MAX_AGENT_STEPS,
        }
    }

    /// Budget of zero makes no sense; it is clamped to one.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// Drives one goal from start to terminal state. Performs at most
    /// `max_steps + 1` backend calls.
    pub fn run(
        &self,
        executor: &mut dyn ToolExecutor,
        model_name: &str,
        prompt: &str,
    ) -> AgentRun {
        self.display.write_line("[AGENT:INFO] Starting agent cycle...");

        let mut transcript = vec![Message::system(AGENT_SYSTEM_PROMPT), Message::user(prompt)];

        for step in 1..=self.max_steps {
            self.display
                .write_line(&format!("[AGENT:STEP {step}] Reasoning and calling model..."));

            let reply = match self.backend.call(model_name, &transcript, Mode::Agent) {
                Ok(reply) => reply,
                Err(error) => {
                    self.display
                        .write_line(&format!("[AGENT:ERROR] Model call failed: {error}"));
                    return AgentRun {
                        outcome: AgentOutcome::ModelCallFailed(error),
                        transcript,
                        steps: step - 1,
                    };
                }
            };
            transcript.push(Message::assistant(reply.clone()));

            let mut warnings = Vec::new();
            let call = parser::tool_calls(&reply, &mut warnings).next();
            for warning in &warnings {
                self.display.write_line(&format!("[PARSE:WARN] {warning}"));
            }

            let Some(call) = call else {
                let final_answer = strip_think_segments(&reply);
                self.display.write_line(&format!("[ASSISTANT] {final_answer}"));
                return AgentRun {
                    outcome: AgentOutcome::FinalAnswer(final_answer),
                    transcript,
                    steps: step - 1,
                };
            };

            self.display
                .write_line(&format!("[AGENT:TOOL CALL] {}", call.describe()));
            let output = executor.execute(call);
            self.display.write_line(&format!(
                "[AGENT:TOOL OUTPUT] {}...",
                output.content.lines().next().unwrap_or("")
            ));
            transcript.push(Message::tool(output.content));

            if step == self.max_steps {
                return self.solicit_summary(transcript, model_name, step);
            }
        }

        unreachable!("loop exits through a terminal state")
    }

    /// One closing call after the budget is spent. The reply is emitted
    /// verbatim as the final answer and never parsed for tool tags.
    fn solicit_summary(
        &self,
        mut transcript: Vec<Message>,
        model_name: &str,
        steps: usize,
    ) -> AgentRun {
        self.display.write_line(&format!(
            "[AGENT:WARN] Maximum steps ({}) reached. Terminating.",
            self.max_steps
        ));
        transcript.push(Message::tool(format!(
            "AGENT:WARN: Maximum steps ({}) reached. Provide a final summary of progress.",
            self.max_steps
        )));

        match self.backend.call(model_name, &transcript, Mode::Agent) {
            Ok(reply) => {
                transcript.push(Message::assistant(reply.clone()));
                let summary = strip_think_segments(&reply);
                self.display.write_line(&format!("[ASSISTANT] {summary}"));
                AgentRun {
                    outcome: AgentOutcome::BudgetExceeded(summary),
                    transcript,
                    steps,
                }
            }
            Err(error) => {
                self.display
                    .write_line(&format!("[AGENT:ERROR] Model call failed: {error}"));
                AgentRun {
                    outcome: AgentOutcome::ModelCallFailed(error),
                    transcript,
                    steps,
                }
            }
        }
    }
}
