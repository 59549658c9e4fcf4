//! Interactive session: mode, model override, chat history, and dispatch.
//!
//! The session owns no I/O of its own; everything user-visible goes through
//! the display sink, which keeps the whole layer testable with scripted
//! backends and recording executors.

use std::sync::Arc;

use agent_config::{AgentConfig, PermissionGate};

use crate::agent::AgentLoop;
use crate::commands::Command;
use crate::history::CommandHistory;
use crate::logging::DisplaySink;
use crate::model::{Message, Mode, ModelBackend};
use crate::parser::strip_think_segments;
use crate::tools::ToolExecutor;

/// Chat mode sends only this many trailing messages as context.
pub const CHAT_CONTEXT_WINDOW: usize = 5;

pub struct Session {
    mode: Mode,
    model_override: Option<String>,
    chat_history: Vec<Message>,
    config: AgentConfig,
    backend: Arc<dyn ModelBackend>,
    agent: AgentLoop,
    executor: Box<dyn ToolExecutor>,
    permissions: Arc<dyn PermissionGate>,
    display: Arc<dyn DisplaySink>,
    history: CommandHistory,
}

impl Session {
    pub fn new(
        config: AgentConfig,
        backend: Arc<dyn ModelBackend>,
        executor: Box<dyn ToolExecutor>,
        permissions: Arc<dyn PermissionGate>,
        display: Arc<dyn DisplaySink>,
        history: CommandHistory,
    ) -> Self {
        let agent = AgentLoop::new(backend.clone(), display.clone());
        Self {
            mode: Mode::Agent,
            model_override: None,
            chat_history: Vec::new(),
            config,
            backend,
            agent,
            executor,
            permissions,
            display,
            history,
        }
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Model that would serve `mode` right now: the temporary override when
    /// set, otherwise the configured default for that mode.
    #[must_use]
    pub fn current_model(&self, mode: Mode) -> String {
        if let Some(model) = &self.model_override {
            return model.clone();
        }
        match mode {
            Mode::Chat => self.config.default_chat_model.clone(),
            Mode::Agent => self.config.default_agent_model.clone(),
        }
    }

    /// Prompt line shown before each read.
    #[must_use]
    pub fn status_line(&self) -> String {
        format!(
            "Current Mode: /{} (Model: {})",
            self.mode.label(),
            self.current_model(self.mode)
        )
    }

    /// Handles one line of user input from parse to completion.
    pub fn handle_input(&mut self, input: &str) {
        let input = input.trim();
        if input.is_empty() {
            return;
        }

        self.display.write_line(&format!("[YOU] {input}"));
        if let Err(error) = self.history.record(input) {
            self.display
                .write_line(&format!("[ERROR] Failed to save history file: {error}"));
        }

        match Command::parse(input) {
            Command::Model { argument } => self.handle_model_command(argument),
            Command::SetMode { mode, prompt } => {
                self.mode = mode;
                match prompt {
                    Some(prompt) => self.run_query(mode, &prompt),
                    None => self.display.write_line(&format!(
                        "[STATUS] Mode set to /{}. Provide a prompt after the command to run one.",
                        mode.label()
                    )),
                }
            }
            Command::Reset => self.reset(),
            Command::Tools => self.show_tools(),
            Command::Query { prompt } => self.run_query(self.mode, &prompt),
        }
    }

    fn handle_model_command(&mut self, argument: Option<String>) {
        let Some(argument) = argument else {
            let current = self
                .model_override
                .as_deref()
                .unwrap_or("default (from config)");
            self.display.write_line(&format!(
                "Current temporary model: {current}. Usage: /model <model-name> or /model reset"
            ));
            return;
        };

        if matches!(argument.as_str(), "reset" | "clear" | "default") {
            self.model_override = None;
            self.display
                .write_line("Model override cleared. Reverting to default configuration.");
        } else {
            self.display.write_line(&format!(
                "Temporary model switched to: {argument} for both chat and agent modes."
            ));
            self.model_override = Some(argument);
        }
    }

    fn run_query(&mut self, mode: Mode, prompt: &str) {
        let model = self.current_model(mode);
        match mode {
            Mode::Chat => self.handle_chat_query(&model, prompt),
            Mode::Agent => {
                self.agent.run(self.executor.as_mut(), &model, prompt);
            }
        }
    }

    fn handle_chat_query(&mut self, model_name: &str, prompt: &str) {
        self.chat_history.push(Message::user(prompt));

        let start = self.chat_history.len().saturating_sub(CHAT_CONTEXT_WINDOW);
        let context = &self.chat_history[start..];

        match self.backend.call(model_name, context, Mode::Chat) {
            Ok(reply) => {
                let reply = strip_think_segments(&reply);
                self.chat_history.push(Message::assistant(reply.clone()));
                self.display.write_line(&format!("[ASSISTANT] {reply}"));
            }
            Err(error) => {
                self.display.write_line(&format!("[ERROR] Chat failed: {error}"));
            }
        }
    }

    /// Clears the chat history; mode and model override survive.
    pub fn reset(&mut self) {
        self.chat_history.clear();
        self.display
            .write_line("[STATUS] Session and chat history reset.");
    }

    fn show_tools(&self) {
        self.display.write_line("[AVAILABLE TOOLS]");
        self.display.write_line(&format!(
            "  run_code: Executes shell commands. Requires 'allow_code_execution': {}",
            self.permissions.is_allowed("allow_code_execution")
        ));
        self.display.write_line(&format!(
            "  write_file: Writes content to the project folder. Requires 'allow_file_io': {}",
            self.permissions.is_allowed("allow_file_io")
        ));
        self.display
            .write_line("[STATUS] Use /agent to enable tool calling mode.");
    }
}
