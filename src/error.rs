use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotInitialized,
    TicketNotFound,
    TaskNotFound,
    AmbiguousRef,
    InvalidParent,
    ValidationError,
    ConfigError,
    DatabaseError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::TicketNotFound => "TICKET_NOT_FOUND",
            Self::TaskNotFound => "TASK_NOT_FOUND",
            Self::AmbiguousRef => "AMBIGUOUS_REF",
            Self::InvalidParent => "INVALID_PARENT",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::DatabaseError => "DATABASE_ERROR",
        }
    }
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct TasktimeError {
    pub code: ErrorCode,
    pub message: String,
}

impl TasktimeError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_initialized() -> Self {
        Self::new(
            ErrorCode::NotInitialized,
            "tasktime is not initialized. Run `tasktime init` first.",
        )
    }

    pub fn ticket_not_found(reference: &str) -> Self {
        Self::new(
            ErrorCode::TicketNotFound,
            format!("Ticket not found: {reference}"),
        )
    }

    pub fn task_not_found(reference: &str) -> Self {
        Self::new(
            ErrorCode::TaskNotFound,
            format!("Task not found: {reference}"),
        )
    }

    pub fn ambiguous_ref(reference: &str, candidates: &[String]) -> Self {
        Self::new(
            ErrorCode::AmbiguousRef,
            format!(
                "Ambiguous reference '{}'. Candidates: {}",
                reference,
                candidates.join(", ")
            ),
        )
    }

    pub fn parent_cycle(task_id: &str, parent_id: &str) -> Self {
        Self::new(
            ErrorCode::InvalidParent,
            format!("Task {parent_id} is a descendant of {task_id}; parent links must not form a cycle"),
        )
    }

    pub fn tree_too_deep(max_depth: usize) -> Self {
        Self::new(
            ErrorCode::InvalidParent,
            format!("Task trees are limited to {max_depth} levels"),
        )
    }

    pub fn cross_ticket_parent() -> Self {
        Self::new(
            ErrorCode::InvalidParent,
            "A parent task must belong to the same ticket",
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }
}

impl From<rusqlite::Error> for TasktimeError {
    fn from(e: rusqlite::Error) -> Self {
        Self::database(e.to_string())
    }
}
