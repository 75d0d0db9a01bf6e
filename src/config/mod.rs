//! Configuration module: prompts, task scripts and runtime resolution.

mod prompts;
mod resolve;
mod tasks;

pub use prompts::{build_system_prompt, SYSTEM_PROMPT};
pub use resolve::{ConfigError, RuntimeConfig};
pub use tasks::{load_task_script, parse_task_script, TASK_SEPARATOR};
