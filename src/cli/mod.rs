//! Command-line interface
//!
//! `args` holds the clap definitions; `commands` the handlers.

pub mod args;
pub mod commands;
