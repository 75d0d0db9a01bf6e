//! Actions module: validation and execution of model-requested desktop actions.

mod handler;
mod request;

pub use handler::{
    ActionHandler, ExecutorConfig, DEFAULT_CLICK_SETTLE_MS, DEFAULT_COORDINATE_SCALE,
    MAX_SCROLL_PRESSES, SCROLL_STEP_PX, TYPE_CHUNK_CHARS,
};
pub use request::{parse_chord, ActionError, ComputerAction};
