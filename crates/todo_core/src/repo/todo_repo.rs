//! TODO repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the five CRUD primitives over the `todos` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Each write runs in one immediate transaction; a failed step leaves no
//!   partially visible row behind.
//! - A write whose call was cancelled never commits, even when every
//!   statement already ran.
//! - Pages are ordered by `id DESC` and bounded by an exclusive `prev_id`
//!   cursor.
//! - Only `update_todo` reports `NotFound`; reads and deletes treat missing
//!   rows as a normal empty outcome.

use crate::db::{CancelFlag, DbError, WorkerError};
use crate::model::todo::{TodoId, TodoItem};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const TODO_SELECT_SQL: &str = "SELECT
    id,
    subject,
    description,
    created_at,
    updated_at
FROM todos";

/// Store clock as unix epoch milliseconds.
const NOW_EPOCH_MS_SQL: &str =
    "CAST(ROUND((julianday('now') - 2440587.5) * 86400000.0) AS INTEGER)";

/// Page length used when the caller asks for a non-positive size.
pub const DEFAULT_PAGE_SIZE: i64 = 5;
// Well below SQLITE_MAX_VARIABLE_NUMBER on every supported build.
const DELETE_CHUNK_SIZE: usize = 500;

pub type RepoResult<T> = Result<T, RepoError>;

/// Named error for a well-formed request that targets a nonexistent row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFoundError {
    pub id: TodoId,
    pub occurred_at: DateTime<Utc>,
    pub message: String,
}

impl NotFoundError {
    pub fn new(id: TodoId) -> Self {
        Self {
            id,
            occurred_at: Utc::now(),
            message: format!("todo {id} not found"),
        }
    }
}

impl Display for NotFoundError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (at {})",
            self.message,
            self.occurred_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }
}

impl Error for NotFoundError {}

/// Repository error for TODO persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(NotFoundError),
    InvalidData(String),
    Worker(WorkerError),
}

impl RepoError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns whether the call was cancelled or interrupted by its caller.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Db(err) => err.is_interrupted(),
            Self::Worker(WorkerError::Cancelled) => true,
            _ => false,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted todo data: {message}"),
            Self::Worker(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(err) => Some(err),
            Self::InvalidData(_) => None,
            Self::Worker(err) => Some(err),
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<WorkerError> for RepoError {
    fn from(value: WorkerError) -> Self {
        Self::Worker(value)
    }
}

/// Cursor query for one page of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TodoPageQuery {
    /// Exclusive upper bound on `id`; `0` starts from the newest item.
    pub prev_id: TodoId,
    /// Requested page length, normalized with [`normalize_page_size`].
    pub size: i64,
}

impl Default for TodoPageQuery {
    fn default() -> Self {
        Self {
            prev_id: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Normalizes a requested page length.
///
/// `size <= 0` falls back to [`DEFAULT_PAGE_SIZE`]; positive sizes are
/// passed through unbounded.
pub fn normalize_page_size(size: i64) -> i64 {
    if size <= 0 {
        DEFAULT_PAGE_SIZE
    } else {
        size
    }
}

/// Repository interface for TODO CRUD operations.
pub trait TodoRepository {
    fn create_todo(&self, subject: &str, description: &str) -> RepoResult<TodoItem>;
    fn get_todo(&self, id: TodoId) -> RepoResult<Option<TodoItem>>;
    fn list_todos(&self, query: &TodoPageQuery) -> RepoResult<Vec<TodoItem>>;
    fn update_todo(&self, id: TodoId, subject: &str, description: &str) -> RepoResult<TodoItem>;
    fn delete_todos(&self, ids: &[TodoId]) -> RepoResult<usize>;
}

/// SQLite-backed TODO repository.
pub struct SqliteTodoRepository<'conn> {
    conn: &'conn Connection,
    cancel: CancelFlag,
}

impl<'conn> SqliteTodoRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self::with_cancel(conn, CancelFlag::default())
    }

    /// Creates a repository whose writes roll back once `cancel` is set.
    pub fn with_cancel(conn: &'conn Connection, cancel: CancelFlag) -> Self {
        Self { conn, cancel }
    }
}

impl TodoRepository for SqliteTodoRepository<'_> {
    fn create_todo(&self, subject: &str, description: &str) -> RepoResult<TodoItem> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO todos (subject, description) VALUES (?1, ?2);",
            params![subject, description],
        )?;
        let id = tx.last_insert_rowid();

        let todo = load_todo(&tx, id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("inserted todo {id} could not be read back"))
        })?;
        commit_unless_cancelled(tx, &self.cancel)?;

        Ok(todo)
    }

    fn get_todo(&self, id: TodoId) -> RepoResult<Option<TodoItem>> {
        load_todo(self.conn, id)
    }

    fn list_todos(&self, query: &TodoPageQuery) -> RepoResult<Vec<TodoItem>> {
        let limit = normalize_page_size(query.size);
        let mut stmt = self.conn.prepare(&format!(
            "{TODO_SELECT_SQL}
             WHERE (?1 = 0 OR id < ?1)
             ORDER BY id DESC
             LIMIT ?2;"
        ))?;

        let mut rows = stmt.query(params![query.prev_id, limit])?;
        let mut todos = Vec::new();
        while let Some(row) = rows.next()? {
            todos.push(parse_todo_row(row)?);
        }

        Ok(todos)
    }

    fn update_todo(&self, id: TodoId, subject: &str, description: &str) -> RepoResult<TodoItem> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            &format!(
                "UPDATE todos
                 SET
                    subject = ?1,
                    description = ?2,
                    updated_at = MAX(updated_at + 1, {NOW_EPOCH_MS_SQL})
                 WHERE id = ?3;"
            ),
            params![subject, description, id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(NotFoundError::new(id)));
        }

        let todo = load_todo(&tx, id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("updated todo {id} could not be read back"))
        })?;
        commit_unless_cancelled(tx, &self.cancel)?;

        Ok(todo)
    }

    fn delete_todos(&self, ids: &[TodoId]) -> RepoResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut removed = 0;
        for chunk in ids.chunks(DELETE_CHUNK_SIZE) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            removed += tx.execute(
                &format!("DELETE FROM todos WHERE id IN ({placeholders});"),
                params_from_iter(chunk.iter()),
            )?;
        }
        commit_unless_cancelled(tx, &self.cancel)?;

        Ok(removed)
    }
}

/// Dropping `tx` on the cancelled path rolls it back.
fn commit_unless_cancelled(tx: Transaction<'_>, cancel: &CancelFlag) -> RepoResult<()> {
    cancel.check()?;
    tx.commit()?;
    Ok(())
}

fn load_todo(conn: &Connection, id: TodoId) -> RepoResult<Option<TodoItem>> {
    let mut stmt = conn.prepare(&format!("{TODO_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_todo_row(row)?));
    }

    Ok(None)
}

fn parse_todo_row(row: &Row<'_>) -> RepoResult<TodoItem> {
    Ok(TodoItem {
        id: row.get("id")?,
        subject: row.get("subject")?,
        description: row.get("description")?,
        created_at: parse_epoch_ms(row.get("created_at")?, "created_at")?,
        updated_at: parse_epoch_ms(row.get("updated_at")?, "updated_at")?,
    })
}

fn parse_epoch_ms(value: i64, column: &str) -> RepoResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid timestamp `{value}` in todos.{column}"))
    })
}
