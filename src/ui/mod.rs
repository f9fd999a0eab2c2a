//! Terminal rendering for the `aether` CLI.

pub mod board;
pub mod icons;
pub mod progress;

pub use board::{render_board, render_notice, render_task};
pub use progress::GenerationSpinner;
