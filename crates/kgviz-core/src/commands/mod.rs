//! Commands module - all operations as library functions
//!
//! These commands are used by the CLI and the web API envelope.

pub mod graph;
