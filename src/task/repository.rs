use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::fields;
use crate::scope::RequestScope;
use crate::task::model::{Task, TaskError};

/// Storage of tasks.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Store a new task and return it with its assigned id.
    async fn create(&self, scope: &RequestScope, title: &str, status: &str) -> Result<Task, TaskError>;

    /// Look up a task by its id in text form.
    async fn get_by_id(&self, scope: &RequestScope, id: &str) -> Result<Task, TaskError>;

    /// Page through tasks in creation order, optionally only those with
    /// `status`.
    async fn get_all(
        &self,
        scope: &RequestScope,
        status: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Task>, TaskError>;
}

#[derive(Default)]
struct Tables {
    by_id: HashMap<i64, Task>,
    by_status: HashMap<String, Vec<i64>>,
    all_ids: Vec<i64>,
    counter: i64,
}

/// In-memory repository. Reads share the lock; a create holds it exclusively
/// while it bumps the id counter and updates every index.
pub struct InMemoryTaskRepository {
    tables: RwLock<Tables>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }
}

impl Default for InMemoryTaskRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn create(&self, scope: &RequestScope, title: &str, status: &str) -> Result<Task, TaskError> {
        let log = scope.logger().with(&fields!["where", "repository"]);
        log.debug("repository: creating task", &fields!["title", title]);

        let mut tables = self.tables.write().await;
        tables.counter += 1;
        let task = Task {
            id: tables.counter,
            title: title.to_owned(),
            status: status.to_owned(),
        };
        tables.by_id.insert(task.id, task.clone());
        tables
            .by_status
            .entry(task.status.clone())
            .or_default()
            .push(task.id);
        tables.all_ids.push(task.id);
        drop(tables);

        log.debug("repository: task created successfully", &fields!["id", task.id]);
        Ok(task)
    }

    async fn get_by_id(&self, scope: &RequestScope, id: &str) -> Result<Task, TaskError> {
        let log = scope.logger().with(&fields!["where", "repository"]);
        log.debug("repository: getting task by id", &fields!["id", id]);

        let task_id: i64 = id.parse()?;
        let task = self
            .tables
            .read()
            .await
            .by_id
            .get(&task_id)
            .cloned()
            .ok_or(TaskError::NotFound)?;

        log.debug("repository: task retrieved from repository", &fields!["id", task.id]);
        Ok(task)
    }

    async fn get_all(
        &self,
        scope: &RequestScope,
        status: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Task>, TaskError> {
        let log = scope.logger().with(&fields!["where", "repository"]);
        log.debug(
            "repository: getting all tasks",
            &fields!["status_filter", status.unwrap_or(""), "limit", limit, "offset", offset],
        );

        let tables = self.tables.read().await;
        let ids: &[i64] = match status {
            Some(status) => tables.by_status.get(status).map(Vec::as_slice).unwrap_or(&[]),
            None => &tables.all_ids,
        };
        let page: Vec<Task> = ids
            .iter()
            .skip(offset)
            .take(limit)
            .filter_map(|id| tables.by_id.get(id).cloned())
            .collect();
        drop(tables);

        log.debug("repository: tasks retrieved from repository", &fields!["count", page.len()]);
        Ok(page)
    }
}
