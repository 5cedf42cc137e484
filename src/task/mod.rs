//! Task entities and the layers that serve them over HTTP.
//!
//! Every layer takes the [`RequestScope`](crate::scope::RequestScope) of the
//! current request explicitly and logs through its logger.

pub mod handler;
pub mod model;
pub mod repository;
pub mod service;

pub use model::{Task, TaskError, STATUS_NEW};
pub use repository::{InMemoryTaskRepository, TaskRepository};
pub use service::TaskService;
