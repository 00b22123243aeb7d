//! TODO store service.
//!
//! # Responsibility
//! - Own all read/write access to persistent storage for TODO items.
//! - Run exactly one logical repository operation per call.
//! - Translate storage outcomes into `TodoItem` results or `RepoError`.
//!
//! # Invariants
//! - The service holds no mutable state besides the shared connection handle.
//! - Dropping a call's future cancels its in-flight storage work; a cancelled
//!   write is rolled back rather than committed.
//! - Structural validation (empty subject, zero id, empty id set) is the
//!   caller's job; existence checks happen here.

use crate::db::SharedConnection;
use crate::model::todo::{TodoId, TodoItem};
use crate::repo::todo_repo::{
    RepoError, RepoResult, SqliteTodoRepository, TodoPageQuery, TodoRepository,
};
use log::{error, info, warn};
use rusqlite::Connection;
use std::time::Instant;

/// Async CRUD entry points over the shared store connection.
#[derive(Clone)]
pub struct TodoService {
    db: SharedConnection,
}

impl TodoService {
    /// Creates a service that owns a freshly opened, migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self::with_shared(SharedConnection::new(conn))
    }

    /// Creates a service over an already shared connection handle.
    pub fn with_shared(db: SharedConnection) -> Self {
        Self { db }
    }

    /// Inserts a new item and returns it as stored, timestamps included.
    pub async fn create_todo(
        &self,
        subject: impl Into<String>,
        description: impl Into<String>,
    ) -> RepoResult<TodoItem> {
        let subject = subject.into();
        let description = description.into();
        self.call("todo_create", move |repo| {
            repo.create_todo(&subject, &description)
        })
        .await
    }

    /// Returns up to `size` items older than `prev_id`, newest first.
    ///
    /// `prev_id == 0` starts from the newest item. An exhausted cursor yields
    /// an empty vector, never an error.
    pub async fn read_todos(&self, prev_id: TodoId, size: i64) -> RepoResult<Vec<TodoItem>> {
        let query = TodoPageQuery { prev_id, size };
        self.call("todo_read", move |repo| repo.list_todos(&query))
            .await
    }

    /// Replaces subject and description of an existing item.
    ///
    /// Returns `RepoError::NotFound` when no row has this `id`.
    pub async fn update_todo(
        &self,
        id: TodoId,
        subject: impl Into<String>,
        description: impl Into<String>,
    ) -> RepoResult<TodoItem> {
        let subject = subject.into();
        let description = description.into();
        self.call("todo_update", move |repo| {
            repo.update_todo(id, &subject, &description)
        })
        .await
    }

    /// Deletes every item whose id is in `ids`; unknown ids are ignored.
    ///
    /// Returns the number of rows actually removed.
    pub async fn delete_todos(&self, ids: Vec<TodoId>) -> RepoResult<usize> {
        self.call("todo_delete", move |repo| repo.delete_todos(&ids))
            .await
    }

    async fn call<T, F>(&self, event: &'static str, op: F) -> RepoResult<T>
    where
        F: FnOnce(&SqliteTodoRepository<'_>) -> RepoResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let started_at = Instant::now();
        let result = match self
            .db
            .run(move |conn, cancel| {
                op(&SqliteTodoRepository::with_cancel(conn, cancel.clone()))
            })
            .await
        {
            Ok(result) => result,
            Err(err) => Err(RepoError::from(err)),
        };
        let duration_ms = started_at.elapsed().as_millis();

        match &result {
            Ok(_) => info!("event={event} module=service status=ok duration_ms={duration_ms}"),
            Err(err) if err.is_not_found() => warn!(
                "event={event} module=service status=not_found duration_ms={duration_ms} error={err}"
            ),
            Err(err) if err.is_cancelled() => warn!(
                "event={event} module=service status=cancelled duration_ms={duration_ms} error={err}"
            ),
            Err(err) => error!(
                "event={event} module=service status=error duration_ms={duration_ms} error={err}"
            ),
        }

        result
    }
}
