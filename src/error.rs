//! Error taxonomy shared by the repository, storage gateway and web layer.
//!
//! Internal plumbing (queries, the S3 client) reports `anyhow::Error` with
//! context. Those errors are classified into a [`ShareError`] at the
//! repository and gateway boundary so callers can decide how to present them.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Result alias used across the public API.
pub type ShareResult<T> = Result<T, ShareError>;

#[derive(Debug, Error)]
pub enum ShareError {
    /// Bad user input. Recoverable, shown inline next to the form.
    #[error("validation failed: {0}")]
    Validation(String),
    /// The backend could not be reached or the request deadline elapsed.
    #[error("backend unreachable: {0}")]
    Connectivity(String),
    /// The backend rejected a write.
    #[error("write rejected: {0}")]
    Write(String),
    /// The backend rejected a read.
    #[error("query rejected: {0}")]
    Query(String),
    /// A single-row lookup missed.
    #[error("not found: {0}")]
    NotFound(String),
    /// The operation needs a signed-in user.
    #[error("sign-in required")]
    Unauthorized,
}

/// Which side of the backend an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

impl ShareError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Classify a backend failure coming out of the query layer.
    #[must_use]
    pub fn from_backend(err: &anyhow::Error, access: Access) -> Self {
        let detail = format!("{err:#}");

        if let Some(sqlx_err) = err.downcast_ref::<sqlx::Error>() {
            match sqlx_err {
                sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::Io(_)
                | sqlx::Error::Tls(_)
                | sqlx::Error::WorkerCrashed => return Self::Connectivity(detail),
                sqlx::Error::RowNotFound => return Self::NotFound(detail),
                _ => {}
            }
        }

        if err.downcast_ref::<tokio::time::error::Elapsed>().is_some() {
            return Self::Connectivity(detail);
        }

        match access {
            Access::Read => Self::Query(detail),
            Access::Write => Self::Write(detail),
        }
    }

    /// Whether the whole view should switch to an error state.
    #[must_use]
    pub const fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }

    /// Message suitable for showing to the user.
    ///
    /// Backend details stay in the logs.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::Connectivity(_) => {
                "The service is unreachable right now. Please reload in a moment.".to_string()
            }
            Self::Write(_) => "Your change could not be saved. Please try again.".to_string(),
            Self::Query(_) => "Failed to load content. Please try again.".to_string(),
            Self::NotFound(_) => "Nothing here.".to_string(),
            Self::Unauthorized => "Please sign in first.".to_string(),
        }
    }
}

/// Run a backend call under the fixed request deadline.
///
/// An elapsed deadline is a terminal connectivity failure; nothing is retried.
pub async fn with_deadline<T, F>(timeout: Duration, access: Access, fut: F) -> ShareResult<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(ShareError::from_backend(&e, access)),
        Err(_) => Err(ShareError::Connectivity(format!(
            "request timed out after {}s",
            timeout.as_secs()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Context;

    use super::*;

    #[test]
    fn test_pool_timeout_is_connectivity() {
        let err = Err::<(), _>(sqlx::Error::PoolTimedOut)
            .context("Failed to list media")
            .unwrap_err();
        assert!(ShareError::from_backend(&err, Access::Read).is_connectivity());
    }

    #[test]
    fn test_row_not_found_is_not_found() {
        let err = Err::<(), _>(sqlx::Error::RowNotFound)
            .context("Failed to fetch media")
            .unwrap_err();
        assert!(matches!(
            ShareError::from_backend(&err, Access::Write),
            ShareError::NotFound(_)
        ));
    }

    #[test]
    fn test_other_errors_follow_access() {
        let err = anyhow::anyhow!("syntax error near ORDER");
        assert!(matches!(
            ShareError::from_backend(&err, Access::Read),
            ShareError::Query(_)
        ));
        assert!(matches!(
            ShareError::from_backend(&err, Access::Write),
            ShareError::Write(_)
        ));
    }

    #[test]
    fn test_user_message_hides_backend_detail() {
        let err = ShareError::Write("UNIQUE constraint failed: likes.media_id".to_string());
        assert!(!err.user_message().contains("UNIQUE"));

        let err = ShareError::validation("Title is required");
        assert_eq!(err.user_message(), "Title is required");
    }

    #[tokio::test]
    async fn test_deadline_elapsed_is_connectivity() {
        let result: ShareResult<()> =
            with_deadline(Duration::from_millis(10), Access::Read, async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert!(result.unwrap_err().is_connectivity());
    }
}
