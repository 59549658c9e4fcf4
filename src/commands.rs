//! Slash-command parsing for session input.
//!
//! Only three commands exist: `/chat`, `/agent`, and `/model`. Anything else
//! starting with `/` is deliberately treated as ordinary prompt text so a
//! typo never swallows a query.

use crate::model::Mode;

/// One parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/model` with no argument shows the current override; with `reset`,
    /// `clear` or `default` it clears the override; otherwise it sets one.
    Model { argument: Option<String> },
    /// `/chat` or `/agent`, optionally followed by a prompt to run right away.
    SetMode { mode: Mode, prompt: Option<String> },
    /// `/reset`: clear the chat history.
    Reset,
    /// `/tools`: list the available tools and their permission state.
    Tools,
    /// Plain prompt text for the current mode.
    Query { prompt: String },
}

impl Command {
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        let (head, rest) = match input.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (input, ""),
        };

        match head.to_lowercase().as_str() {
            "/model" => Command::Model {
                argument: (!rest.is_empty()).then(|| rest.to_string()),
            },
            "/chat" => Command::SetMode {
                mode: Mode::Chat,
                prompt: (!rest.is_empty()).then(|| rest.to_string()),
            },
            "/agent" => Command::SetMode {
                mode: Mode::Agent,
                prompt: (!rest.is_empty()).then(|| rest.to_string()),
            },
            "/reset" if rest.is_empty() => Command::Reset,
            "/tools" if rest.is_empty() => Command::Tools,
            _ => Command::Query {
                prompt: input.to_string(),
            },
        }
    }
}
