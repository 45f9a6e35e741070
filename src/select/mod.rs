// SSHE — Selection Module
//
// Operator prompts and the rules that turn "all nodes at an IP" into exactly
// one node, or a fresh username into a non-conflicting one.

mod error;
mod prompt;
mod resolver;

pub use error::SelectError;
#[cfg(test)]
pub use prompt::mock;
pub use prompt::{Prompter, TerminalPrompter};
pub use resolver::{resolve_new_username, select_node, DEFAULT_USERNAME};
