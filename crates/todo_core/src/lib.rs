//! Core storage and use-case logic for the TODO service.
//! This crate is the single source of truth for persistence invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, CancelFlag, DbError, SharedConnection, WorkerError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::todo::{TodoId, TodoItem};
pub use repo::todo_repo::{
    normalize_page_size, NotFoundError, RepoError, RepoResult, SqliteTodoRepository,
    TodoPageQuery, TodoRepository, DEFAULT_PAGE_SIZE,
};
pub use service::todo_service::TodoService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
