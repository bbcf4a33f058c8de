mod expect;
mod monitor;
mod send_input;
mod try_block;

pub use expect::Expect;
pub use monitor::{DRY_RUN_PREVIEW_LINES, INDEFINITE, Monitor, MonitorBound};
pub use send_input::SendInput;
pub use try_block::Try;
