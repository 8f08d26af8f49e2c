//! Discord tools exposed to MCP clients.
//!
//! This module contains:
//! - The catalogue (names, descriptions, argument schemas)
//! - Typed, validated tool invocations and their execution
//! - The dispatcher that gates calls on upstream readiness

pub mod call;
pub mod dispatcher;
pub mod execution;
pub mod registry;
pub mod tool_defs;

pub use dispatcher::ToolDispatcher;
