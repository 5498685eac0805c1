//! Task-storage core.
//!
//! Data flows one way: repository → resolver/store → codec/extractor →
//! filesystem. The bridge and any REST caller sit on top of
//! [`TaskRepository`]; nothing below it knows about lanes as a product
//! concept beyond "a directory under the board root".

pub mod filename;
pub mod lanes;
pub mod repository;
pub mod resolver;
pub mod tags;

pub use filename::TaskFilename;
pub use lanes::LaneStore;
pub use repository::{Lane, TaskRepository};
pub use resolver::{ResolvedTask, TaskResolver};
