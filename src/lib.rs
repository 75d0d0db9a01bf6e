// Copyright 2025 The desktop-agent Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Desktop Agent
//!
//! AI-powered agent that operates a desktop GUI through a screenshot/action loop.
//!
//! A remote model sees screenshots and the conversation so far, and requests
//! discrete input actions (clicks, typing, key chords, scrolling) through the
//! `computer` tool. The agent runs those actions locally with `cliclick` or
//! `xdotool`, attaches a fresh screenshot to each result and loops. When the
//! model answers with text only, control passes to the human operator.
//!
//! ## Example
//!
//! ```rust,no_run
//! use desktop_agent::{
//!     ActionHandler, AppSettings, ConsoleOperator, DesktopAgent, ModelClient, RuntimeConfig,
//! };
//! use std::io;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let config = RuntimeConfig::from_env(&AppSettings::load())?;
//!
//!     let model = ModelClient::new(config.model_config())?;
//!     let device = config.input_backend.create(config.command_runner());
//!     let handler = ActionHandler::new(device, config.executor_config());
//!     let operator = ConsoleOperator::new(io::stdin().lock(), io::stdout());
//!
//!     let mut agent = DesktopAgent::new(
//!         model,
//!         operator,
//!         handler,
//!         config.agent_config("Open the calculator and compute 12 * 7."),
//!     );
//!     let end = agent.run().await;
//!
//!     println!("Session ended: {:?}", end);
//!     Ok(())
//! }
//! ```

pub mod actions;
pub mod agent;
pub mod config;
pub mod conversation;
pub mod desktop;
pub mod model;
pub mod settings;

pub use actions::{ActionError, ActionHandler, ComputerAction, ExecutorConfig};
pub use agent::{AgentConfig, ConsoleOperator, DesktopAgent, Operator, OperatorReply, SessionEnd};
pub use config::{ConfigError, RuntimeConfig};
pub use conversation::{trim_conversation, ContentItem, ConversationStore, Role, Turn};
pub use desktop::{InputBackend, InputDevice};
pub use model::{ModelClient, ModelConfig, ModelError, ModelResponse, ModelService};
pub use settings::AppSettings;
