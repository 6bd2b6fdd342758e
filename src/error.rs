use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, NavError>;

/// Errors produced while propagating check states over the navigator tree.
#[derive(Debug, Error)]
pub enum NavError {
    /// Lazy children materialization failed in the tree model.
    #[error("data access error: {0}")]
    DataAccess(String),

    /// The user cancelled the traversal. Internal control flow only;
    /// `SelectionPropagator` absorbs this and never reports it.
    #[error("cancelled")]
    Cancelled,

    /// The view-owner executor has shut down.
    #[error("view channel closed")]
    ViewClosed,

    /// The background worker failed to complete.
    #[error("background task failed: {0}")]
    Task(String),
}

impl NavError {
    /// Whether this error is a user cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, NavError::Cancelled)
    }
}

/// Collaborator that surfaces a traversal failure to the user.
///
/// Called at most once per failed propagation run. Cancellation is never
/// reported here.
pub trait ErrorPresenter: Send + Sync {
    fn show_error(&self, message: &str, error: &NavError);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_access_error_display() {
        let err = NavError::DataAccess("connection lost".into());
        assert_eq!(err.to_string(), "data access error: connection lost");
    }

    #[test]
    fn view_closed_error_display() {
        assert_eq!(NavError::ViewClosed.to_string(), "view channel closed");
    }

    #[test]
    fn cancelled_is_cancelled() {
        assert!(NavError::Cancelled.is_cancelled());
        assert!(!NavError::DataAccess("x".into()).is_cancelled());
    }
}
