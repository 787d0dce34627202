//! Conversions from external infrastructure errors into domain errors.

use listsync_domain::ListSyncError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub ListSyncError);

impl From<InfraError> for ListSyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ListSyncError> for InfraError {
    fn from(value: ListSyncError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoListSyncError {
    fn into_listsync(self) -> ListSyncError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → ListSyncError */
/* -------------------------------------------------------------------------- */

impl IntoListSyncError for SqlError {
    fn into_listsync(self) -> ListSyncError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        ListSyncError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        ListSyncError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        ListSyncError::Database("unique constraint violation".into())
                    }
                    (ErrorCode::DiskFull, _) => ListSyncError::Database("disk is full".into()),
                    (ErrorCode::CannotOpen, _) => {
                        ListSyncError::Database(format!("unable to open database: {message}"))
                    }
                    _ => ListSyncError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => ListSyncError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                ListSyncError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                ListSyncError::Database(format!("invalid column type: {ty}"))
            }
            RE::InvalidPath(path) => ListSyncError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => ListSyncError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_listsync())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → ListSyncError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(ListSyncError::Database(format!("connection pool error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → ListSyncError */
/* -------------------------------------------------------------------------- */

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(ListSyncError::Internal(format!("invalid JSON payload: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ListSyncError */
/* -------------------------------------------------------------------------- */

/// Only client construction reaches this conversion. Request failures are
/// classified into transport codes by `rpc::errors::transport_error`.
impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(ListSyncError::Config(format!("invalid HTTP client setup: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use reqwest::Client;
    use rusqlite::ffi::{Error as FfiError, ErrorCode};
    use rusqlite::Error as SqlError;

    use super::*;

    #[test]
    fn sqlite_busy_maps_to_database_error() {
        let err = SqlError::SqliteFailure(
            FfiError { code: ErrorCode::DatabaseBusy, extended_code: 5 },
            Some("database is locked".into()),
        );

        let mapped: ListSyncError = InfraError::from(err).into();
        match mapped {
            ListSyncError::Database(msg) => {
                assert!(msg.contains("busy") || msg.contains("locked"));
            }
            other => panic!("expected database error, got {:?}", other),
        }
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        let mapped: ListSyncError = InfraError::from(SqlError::QueryReturnedNoRows).into();
        assert!(matches!(mapped, ListSyncError::NotFound(_)));
    }

    #[test]
    fn json_errors_map_to_internal() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let mapped: ListSyncError = InfraError::from(err).into();
        assert!(matches!(mapped, ListSyncError::Internal(msg) if msg.contains("JSON")));
    }

    #[test]
    fn http_client_setup_errors_map_to_config() {
        let error = Client::builder().user_agent("bad\nagent").build().unwrap_err();

        let mapped: ListSyncError = InfraError::from(error).into();
        match mapped {
            ListSyncError::Config(msg) => assert!(msg.contains("HTTP client setup")),
            other => panic!("expected config error, got {:?}", other),
        }
    }
}
