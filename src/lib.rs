//! Terminal code debugger: run code on a remote execution backend, review
//! errors and auto-corrections, replay execution steps and chat with an
//! assistant.

pub mod chat;
pub mod cli;
pub mod client;
pub mod config;
pub mod handlers;
pub mod highlight;
pub mod history;
pub mod llm;
pub mod logging;
pub mod printer;
pub mod session;
pub mod store;
pub mod tui;
pub mod utils;
pub mod visualizer;
