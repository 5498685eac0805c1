//! Domain types for the board.

mod task;

pub use task::{Task, TaskId, TaskUpdate};
