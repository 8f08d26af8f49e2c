//! Tool definitions organized by category.
//!
//! Each submodule provides a registration function that adds its tools to
//! the registry.

mod channels;
mod messages;
mod reactions;
mod roles;
mod servers;

use std::collections::HashMap;

use super::registry::{ToolMetadata, ToolName};

/// Register all tools from all categories into the registry.
pub fn register_all_tools(registry: &mut HashMap<ToolName, ToolMetadata>) {
    messages::register(registry);
    servers::register(registry);
    roles::register(registry);
    channels::register(registry);
    reactions::register(registry);
}
