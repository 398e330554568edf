//! Defines the app level error type and its conversion to JSON error responses.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The caller supplied a value that can never be valid, e.g. a negative
    /// budget limit, a non-positive recurring amount or an unknown frequency.
    ///
    /// The string describes which argument was rejected and why.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The requested resource was not found.
    ///
    /// Records that belong to another owner are also reported as not found.
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The owner already has a budget for the category.
    #[error("a budget for the category \"{0}\" already exists")]
    DuplicateBudget(String),

    /// Two processors tried to advance the same recurring schedule.
    ///
    /// The schedule update is conditional on the due date that was read, so
    /// the losing writer rolls back its ledger entry and sees this error.
    #[error("the recurring schedule was modified concurrently")]
    ConcurrencyConflict,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    PersistenceFailure(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// A blocking task panicked or was cancelled before it finished.
    #[error("a background task failed: {0}")]
    TaskJoinError(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::PersistenceFailure(error)
            }
        }
    }
}

impl Error {
    /// The HTTP status code that best describes the error to a client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::DuplicateBudget(_) | Error::ConcurrencyConflict => StatusCode::CONFLICT,
            Error::PersistenceFailure(_)
            | Error::DatabaseLockError
            | Error::TaskJoinError(_)
            | Error::InvalidTimezoneError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        let message = if status_code.is_server_error() {
            // The details of server errors are for the logs, not the client.
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status_code, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use super::Error;

    #[test]
    fn no_rows_maps_to_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NotFound);
    }

    #[test]
    fn other_sql_errors_map_to_persistence_failure() {
        let error: Error = rusqlite::Error::InvalidQuery.into();

        assert_eq!(
            error,
            Error::PersistenceFailure(rusqlite::Error::InvalidQuery)
        );
    }

    #[test]
    fn client_errors_get_4xx_status_codes() {
        assert_eq!(
            Error::InvalidArgument("limit".to_owned())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(Error::NotFound.into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(
            Error::DuplicateBudget("Food".to_owned())
                .into_response()
                .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            Error::ConcurrencyConflict.into_response().status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn server_errors_get_500() {
        assert_eq!(
            Error::DatabaseLockError.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            Error::TaskJoinError("task panicked".to_owned())
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
