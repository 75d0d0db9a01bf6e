//! Agent module: the orchestration loop and the operator seam.

mod operator;
mod session;

pub use operator::{ConsoleOperator, Operator, OperatorReply};
pub use session::{AgentConfig, DesktopAgent, SessionEnd};
