//! Paddock CLI
//!
//! Command-line interface for bundling the application, serving a bundle
//! and inspecting the route table.

pub mod commands;
pub mod output;
