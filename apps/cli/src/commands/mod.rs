//! Command implementations for the traintrack CLI.

pub mod list;
pub mod plan;
pub mod resolve;
