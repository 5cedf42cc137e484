use std::sync::Arc;

use crate::fields;
use crate::scope::RequestScope;
use crate::task::model::{Task, TaskError, STATUS_NEW};
use crate::task::repository::TaskRepository;
use crate::value::Value;

/// Task use cases on top of a [`TaskRepository`].
#[derive(Clone)]
pub struct TaskService {
    repository: Arc<dyn TaskRepository>,
}

impl TaskService {
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self { repository }
    }

    pub async fn create_task(&self, scope: &RequestScope, title: &str) -> Result<Task, TaskError> {
        let log = scope.logger().with(&fields!["where", "service"]);
        log.debug("service: creating task", &fields!["title", title]);

        let task = self
            .repository
            .create(scope, title, STATUS_NEW)
            .await
            .inspect_err(|err| {
                log.debug("service: error creating task", &[Value::from("error"), Value::error(err)])
            })?;

        log.debug(
            "service: task created successfully",
            &fields!["id", task.id, "title", title],
        );
        Ok(task)
    }

    pub async fn get_task(&self, scope: &RequestScope, id: &str) -> Result<Task, TaskError> {
        let log = scope.logger().with(&fields!["where", "service"]);
        log.debug("service: getting task by id", &fields!["id", id]);

        let task = self
            .repository
            .get_by_id(scope, id)
            .await
            .inspect_err(|err| {
                log.debug("service: error getting task", &[Value::from("error"), Value::error(err)])
            })?;

        log.debug("service: task retrieved from repository", &fields!["id", task.id]);
        Ok(task)
    }

    pub async fn list_tasks(
        &self,
        scope: &RequestScope,
        status: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Task>, TaskError> {
        let log = scope.logger().with(&fields!["where", "service"]);
        log.debug(
            "service: getting all tasks",
            &fields!["status_filter", status.unwrap_or(""), "limit", limit, "offset", offset],
        );

        let tasks = self
            .repository
            .get_all(scope, status, limit, offset)
            .await
            .inspect_err(|err| {
                log.debug("service: error getting all tasks", &[Value::from("error"), Value::error(err)])
            })?;

        log.debug("service: tasks retrieved from repository", &fields!["count", tasks.len()]);
        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Severity;
    use crate::logger::ScopedLogger;
    use crate::shutdown::Shutdown;
    use crate::sink::MemorySink;
    use crate::task::repository::InMemoryTaskRepository;
    use crate::writer::{AsyncWriter, WriterConfig};

    #[tokio::test]
    async fn create_task_sets_new_status_and_logs_each_layer() {
        let sink = MemorySink::new();
        let writer = Arc::new(
            AsyncWriter::spawn(Arc::new(sink.clone()), WriterConfig::default(), &Shutdown::new())
                .unwrap(),
        );
        let scope = RequestScope::new().attach(
            ScopedLogger::new(Arc::clone(&writer), Severity::Debug, false)
                .with(&fields!["traceparent", "00-abc-def-01"]),
        );
        let service = TaskService::new(Arc::new(InMemoryTaskRepository::new()));

        let task = service.create_task(&scope, "write docs").await.unwrap();
        assert_eq!(task.status, STATUS_NEW);
        assert_eq!(task.id, 1);

        writer.terminate();
        let lines = sink.lines();
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().all(|l| l.contains("traceparent=00-abc-def-01")));
        assert!(lines[0]
            .contains("service: creating task traceparent=00-abc-def-01 where=service title=write docs"));
        assert!(lines[1].contains("where=repository"));
    }

    #[tokio::test]
    async fn get_task_propagates_repository_errors() {
        let service = TaskService::new(Arc::new(InMemoryTaskRepository::new()));
        let scope = RequestScope::new();
        assert_eq!(service.get_task(&scope, "1").await, Err(TaskError::NotFound));
        assert!(service.list_tasks(&scope, None, 10, 0).await.unwrap().is_empty());
    }
}
