//! Shared helpers for the command handlers.

pub mod output;
