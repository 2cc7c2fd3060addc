pub mod config;
pub mod error;
pub mod model;
pub mod repository;

pub use config::{Backend, StoreConfig};
pub use error::StoreError;
pub use model::task::{NewTask, Task, TaskUpdate};
pub use repository::{open_store, unique_title, JsonTaskStore, SqliteTaskStore, TaskStore};
