//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose session and task list actions to Dart via FRB.
//! - Rehydrate the relevant store on every call so the durable store is
//!   the only state shared between calls.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Store actions are serialized through one process-wide lock.
//! - Degraded persistence is reported through `persisted=false`, not `ok=false`.

use log::warn;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock, PoisonError};
use tasklet_core::db::open_db;
use tasklet_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    request_headers, ApiConfig, Outcome, SessionStore, SqliteKvStore, Task, TaskId,
    TaskListStore,
};

const DB_FILE_NAME: &str = "tasklet.sqlite3";
const DB_PATH_ENV: &str = "TASKLET_DB_PATH";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static STORE_LOCK: Mutex<()> = Mutex::new(());

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Exposes core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and the error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Base URL the Dart HTTP client should target.
#[flutter_rust_bridge::frb(sync)]
pub fn api_base_url() -> String {
    ApiConfig::from_env().base_url.clone()
}

/// One HTTP header name/value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderEntry {
    pub name: String,
    pub value: String,
}

/// Headers for an authenticated API request.
#[flutter_rust_bridge::frb(sync)]
pub fn api_request_headers(token: String) -> Vec<HeaderEntry> {
    request_headers(&token)
        .into_iter()
        .map(|(name, value)| HeaderEntry {
            name: name.to_string(),
            value,
        })
        .collect()
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether the action took effect in memory.
    pub ok: bool,
    /// Whether the durable store reflects the result.
    pub persisted: bool,
    /// Task id created or targeted, when applicable.
    pub task_id: Option<String>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn from_outcome<T>(
        outcome: Outcome<T>,
        ok: impl FnOnce(&T) -> bool,
        task_id: Option<String>,
        message: &str,
    ) -> Self {
        let ok = ok(&outcome.value);
        let persisted = outcome.is_persisted();
        let message = match outcome.warnings.first() {
            Some(warning) => format!("{message} (not saved: {warning})"),
            None => message.to_string(),
        };
        Self {
            ok,
            persisted,
            task_id,
            message,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            persisted: false,
            task_id: None,
            message: message.into(),
        }
    }
}

/// Current authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub authenticated: bool,
    /// Empty when logged out.
    pub email: String,
    pub message: String,
}

/// Task list row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: String,
    pub task: String,
    pub completed: bool,
}

/// Task list response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListResponse {
    pub ok: bool,
    pub items: Vec<TaskItem>,
    pub message: String,
}

/// Task list projection selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskView {
    All,
    Pending,
    Completed,
}

/// Stores the login result of the external auth call.
///
/// The token is opaque and stored exactly as given; only the email is trimmed.
#[flutter_rust_bridge::frb(sync)]
pub fn session_login(token: String, email: String) -> ActionResponse {
    session_login_at(&resolve_db_path(), &token, email.trim())
}

/// Logs out and clears the persisted session.
#[flutter_rust_bridge::frb(sync)]
pub fn session_logout() -> ActionResponse {
    session_logout_at(&resolve_db_path())
}

/// Returns the rehydrated session state.
#[flutter_rust_bridge::frb(sync)]
pub fn session_status() -> SessionStatus {
    session_status_at(&resolve_db_path())
}

/// Appends a task and returns its id.
#[flutter_rust_bridge::frb(sync)]
pub fn task_add(task: String) -> ActionResponse {
    task_add_at(&resolve_db_path(), task.trim())
}

/// Flips completion of one task. `ok=false` when the id is unknown.
#[flutter_rust_bridge::frb(sync)]
pub fn task_toggle(id: String) -> ActionResponse {
    task_toggle_at(&resolve_db_path(), id.trim())
}

/// Removes one task. `ok=false` when the id is unknown.
#[flutter_rust_bridge::frb(sync)]
pub fn task_remove(id: String) -> ActionResponse {
    task_remove_at(&resolve_db_path(), id.trim())
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_list() -> TaskListResponse {
    task_view_at(&resolve_db_path(), TaskView::All)
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_pending() -> TaskListResponse {
    task_view_at(&resolve_db_path(), TaskView::Pending)
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_completed() -> TaskListResponse {
    task_view_at(&resolve_db_path(), TaskView::Completed)
}

fn session_login_at(db_path: &Path, token: &str, email: &str) -> ActionResponse {
    let result = with_session_store(db_path, |store| {
        let outcome = store.set_session(token, email);
        let authenticated = store.is_authenticated();
        ActionResponse::from_outcome(outcome, |_| authenticated, None, "Logged in.")
    });
    result.unwrap_or_else(|err| ActionResponse::failure(format!("session_login failed: {err}")))
}

fn session_logout_at(db_path: &Path) -> ActionResponse {
    let result = with_session_store(db_path, |store| {
        ActionResponse::from_outcome(store.clear_session(), |_| true, None, "Logged out.")
    });
    result.unwrap_or_else(|err| ActionResponse::failure(format!("session_logout failed: {err}")))
}

fn session_status_at(db_path: &Path) -> SessionStatus {
    match with_session_store(db_path, |store| {
        (store.is_authenticated(), store.identity().to_string())
    }) {
        Ok((authenticated, email)) => SessionStatus {
            authenticated,
            email,
            message: if authenticated {
                "Authenticated.".to_string()
            } else {
                "Not authenticated.".to_string()
            },
        },
        Err(err) => SessionStatus {
            authenticated: false,
            email: String::new(),
            message: format!("session_status failed: {err}"),
        },
    }
}

fn task_add_at(db_path: &Path, task: &str) -> ActionResponse {
    if task.is_empty() {
        return ActionResponse::failure("Task text cannot be empty.");
    }
    let result = with_task_store(db_path, |store| {
        let outcome = store.add_task(task);
        let task_id = outcome.value.to_string();
        ActionResponse::from_outcome(outcome, |_| true, Some(task_id), "Task added.")
    });
    result.unwrap_or_else(|err| ActionResponse::failure(format!("task_add failed: {err}")))
}

fn task_toggle_at(db_path: &Path, id: &str) -> ActionResponse {
    let result = with_task_store(db_path, |store| {
        let outcome = store.toggle_task(&TaskId::from(id));
        let message = if outcome.value {
            "Task updated."
        } else {
            "Task not found."
        };
        ActionResponse::from_outcome(outcome, |found| *found, Some(id.to_string()), message)
    });
    result.unwrap_or_else(|err| ActionResponse::failure(format!("task_toggle failed: {err}")))
}

fn task_remove_at(db_path: &Path, id: &str) -> ActionResponse {
    let result = with_task_store(db_path, |store| {
        let outcome = store.remove_task(&TaskId::from(id));
        let message = if outcome.value {
            "Task removed."
        } else {
            "Task not found."
        };
        ActionResponse::from_outcome(outcome, |removed| *removed, Some(id.to_string()), message)
    });
    result.unwrap_or_else(|err| ActionResponse::failure(format!("task_remove failed: {err}")))
}

fn task_view_at(db_path: &Path, view: TaskView) -> TaskListResponse {
    let result = with_task_store(db_path, |store| {
        let items: Vec<TaskItem> = match view {
            TaskView::All => store.tasks().iter().map(to_task_item).collect(),
            TaskView::Pending => store.pending().map(to_task_item).collect(),
            TaskView::Completed => store.completed().map(to_task_item).collect(),
        };
        items
    });
    match result {
        Ok(items) => {
            let message = if items.is_empty() {
                "No tasks.".to_string()
            } else {
                format!("Found {} task(s).", items.len())
            };
            TaskListResponse {
                ok: true,
                items,
                message,
            }
        }
        Err(err) => TaskListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("task_list failed: {err}"),
        },
    }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn with_session_store<T>(
    db_path: &Path,
    f: impl FnOnce(&mut SessionStore<SqliteKvStore<'_>>) -> T,
) -> Result<T, String> {
    let _guard = STORE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    let conn = open_db(db_path).map_err(|err| format!("store DB open failed: {err}"))?;
    let outcome = SessionStore::open(SqliteKvStore::new(&conn));
    log_open_warnings("session_open", &outcome);
    let mut store = outcome.into_value();
    Ok(f(&mut store))
}

fn with_task_store<T>(
    db_path: &Path,
    f: impl FnOnce(&mut TaskListStore<SqliteKvStore<'_>>) -> T,
) -> Result<T, String> {
    let _guard = STORE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    let conn = open_db(db_path).map_err(|err| format!("store DB open failed: {err}"))?;
    let outcome = TaskListStore::open(SqliteKvStore::new(&conn));
    log_open_warnings("tasks_open", &outcome);
    let mut store = outcome.into_value();
    Ok(f(&mut store))
}

fn log_open_warnings<T>(event: &str, outcome: &Outcome<T>) {
    for warning in &outcome.warnings {
        warn!(
            "event={event} module=ffi status=degraded key={} error_code={}",
            warning.key(),
            warning.code()
        );
    }
}

fn to_task_item(task: &Task) -> TaskItem {
    TaskItem {
        id: task.id.to_string(),
        task: task.description.clone(),
        completed: task.completed,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        api_request_headers, core_version, init_logging, ping, session_login_at,
        session_logout_at, session_status_at, task_add_at, task_remove_at, task_toggle_at,
        task_view_at, TaskView,
    };
    use std::path::{Path, PathBuf};
    use tasklet_core::db::open_db;

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_bad_input() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "/tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn request_headers_are_exposed_in_order() {
        let headers = api_request_headers("t0k".to_string());
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0].name, "Authorization");
        assert_eq!(headers[0].value, "Bearer t0k");
        assert_eq!(headers[1].name, "Content-Type");
    }

    #[test]
    fn session_login_status_logout_flow() {
        let dir = tempfile::tempdir().unwrap();
        let db = db_path(dir.path());

        assert!(!session_status_at(&db).authenticated);

        let login = session_login_at(&db, "token-1", "ada@example.com");
        assert!(login.ok, "{}", login.message);
        assert!(login.persisted);

        let status = session_status_at(&db);
        assert!(status.authenticated);
        assert_eq!(status.email, "ada@example.com");

        let logout = session_logout_at(&db);
        assert!(logout.ok && logout.persisted);
        assert!(!session_status_at(&db).authenticated);
        assert_eq!(raw_value(&db, "auth_token"), None);
    }

    #[test]
    fn session_login_keeps_token_bytes_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let db = db_path(dir.path());

        let login = session_login_at(&db, " tok en\t", "ada@example.com");
        assert!(login.ok, "{}", login.message);
        assert_eq!(raw_value(&db, "auth_token").as_deref(), Some(" tok en\t"));
    }

    #[test]
    fn session_login_with_empty_email_is_not_ok() {
        let dir = tempfile::tempdir().unwrap();
        let db = db_path(dir.path());

        let login = session_login_at(&db, "token-1", "");
        assert!(!login.ok);
        assert!(!session_status_at(&db).authenticated);
    }

    #[test]
    fn task_flow_persists_between_calls() {
        let dir = tempfile::tempdir().unwrap();
        let db = db_path(dir.path());

        let added = task_add_at(&db, "buy milk");
        assert!(added.ok && added.persisted, "{}", added.message);
        let id = added.task_id.expect("task_add should return task_id");
        task_add_at(&db, "call mom");

        let toggled = task_toggle_at(&db, &id);
        assert!(toggled.ok);

        let completed = task_view_at(&db, TaskView::Completed);
        assert_eq!(completed.items.len(), 1);
        assert_eq!(completed.items[0].id, id);
        assert_eq!(task_view_at(&db, TaskView::Pending).items.len(), 1);
        assert_eq!(task_view_at(&db, TaskView::All).items.len(), 2);

        let removed = task_remove_at(&db, &id);
        assert!(removed.ok);
        let remaining = task_view_at(&db, TaskView::All);
        assert_eq!(remaining.items.len(), 1);
        assert_eq!(remaining.items[0].task, "call mom");
        assert!(raw_value(&db, "todos").unwrap().contains("call mom"));
    }

    #[test]
    fn unknown_task_ids_and_empty_text_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let db = db_path(dir.path());

        assert!(!task_add_at(&db, "").ok);
        let toggled = task_toggle_at(&db, "missing");
        assert!(!toggled.ok);
        assert_eq!(toggled.message, "Task not found.");
        assert!(!task_remove_at(&db, "missing").ok);
    }

    #[test]
    fn corrupt_task_data_lists_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let db = db_path(dir.path());
        let conn = open_db(&db).unwrap();
        conn.execute(
            "INSERT INTO kv_entries (key, value) VALUES ('todos', 'garbage');",
            [],
        )
        .unwrap();
        drop(conn);

        let listed = task_view_at(&db, TaskView::All);
        assert!(listed.ok);
        assert!(listed.items.is_empty());
    }

    fn db_path(dir: &Path) -> PathBuf {
        dir.join("tasklet.sqlite3")
    }

    fn raw_value(db: &Path, key: &str) -> Option<String> {
        let conn = open_db(db).unwrap();
        read_raw(&conn, key)
    }

    fn read_raw(conn: &rusqlite::Connection, key: &str) -> Option<String> {
        conn.query_row("SELECT value FROM kv_entries WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .ok()
    }
}
