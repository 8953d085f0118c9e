//! Browse and triage GitHub pull request review threads from the terminal.

pub mod app;
pub mod config;
pub mod filter;
pub mod github;
pub mod output;
pub mod render;
pub mod term;
pub mod ui;
