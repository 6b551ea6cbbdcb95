//! Financi is a terminal-first client for a multi-agent financial answering
//! service.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the conversation: agent classification, response parsing,
//!   the request-cycle state machine, presentation metadata, and the runtime
//!   services that run queries and grace timers.
//! - [`ui`] renders the terminal interface and runs the interactive event loop
//!   that drives user input and display updates.
//! - [`commands`] implements slash-command parsing and execution used by the
//!   chat loop.
//! - [`api`] defines the wire payloads and the HTTP transport.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which dispatches into [`core::app`] and
//! [`ui::chat_loop`] for interactive sessions.

pub mod api;
pub mod cli;
pub mod commands;
pub mod core;
pub mod ui;
pub mod utils;
