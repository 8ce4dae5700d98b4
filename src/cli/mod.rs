//! CLI module for the imgly-bgedit library
//!
//! This module is only available when the "cli" feature is enabled.

mod config;
#[path = "main.rs"]
mod main_impl;

pub use main_impl::{main, CaptureArgs, Cli, CliTool, Command, EditArgs};
