pub mod app;
pub mod event;
pub mod render;
pub mod terminal;

pub use app::{Action, App};
pub use event::{AppEvent, EventLoop};
pub use render::{render, view_lines};
pub use terminal::{TerminalGuard, install_panic_hook};
