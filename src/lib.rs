//! Local-model CLI agent: chat plus a tool-using agent loop.
//!
//! The binary drives an interactive session against a locally-hosted model
//! (Ollama's chat API). In agent mode the model requests side effects by
//! emitting one self-closing `<tool_call .../>` tag per turn; the loop
//! parses it, executes it inside a sandboxed project folder under a
//! permission policy, feeds the result back as a tool message, and repeats
//! until the model answers without a tag or the step budget runs out.
//!
//! Layering:
//!
//! - [`parser`]: extracts tool invocations from free-text model replies.
//! - [`tools`]: executes invocations under the sandbox and permission gate.
//! - [`model`]: the backend seam plus the Ollama implementation.
//! - [`agent`]: the bounded orchestration loop.
//! - [`app`]: session state and command dispatch.
//!
//! Provider catalog and permissions live in the `agent_config` crate; the
//! HTTP transport lives in `ollama_api`.

pub mod agent;
pub mod app;
pub mod commands;
pub mod history;
pub mod logging;
pub mod model;
pub mod parser;
pub mod tools;
