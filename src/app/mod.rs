//! The command line front end: parses arguments, runs the core, writes output.

pub mod cli;
pub mod tasks;
