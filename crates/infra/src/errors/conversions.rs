//! Conversions from external infrastructure errors into domain errors.

use dealbridge_common::KeychainError;
use dealbridge_domain::DealBridgeError;
use keyring::Error as KeyringError;
use rusqlite::Error as SqlError;
use tiberius::error::Error as TdsDriverError;
use tracing::warn;

use crate::erp::TdsError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub DealBridgeError);

impl From<InfraError> for DealBridgeError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<DealBridgeError> for InfraError {
    fn from(value: DealBridgeError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoDealBridgeError {
    fn into_dealbridge(self) -> DealBridgeError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → DealBridgeError */
/* -------------------------------------------------------------------------- */

impl IntoDealBridgeError for SqlError {
    fn into_dealbridge(self) -> DealBridgeError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        DealBridgeError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        DealBridgeError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        DealBridgeError::Database("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        DealBridgeError::Database("foreign key constraint violation".into())
                    }
                    _ => DealBridgeError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => {
                DealBridgeError::NotFound("no rows returned by query".into())
            }
            RE::FromSqlConversionFailure(_, _, cause) => {
                DealBridgeError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                DealBridgeError::Database(format!("invalid column type: {ty}"))
            }
            RE::InvalidPath(path) => DealBridgeError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => DealBridgeError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_dealbridge())
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(DealBridgeError::Database(format!("local store pool: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* keyring::Error → DealBridgeError */
/* -------------------------------------------------------------------------- */

impl IntoDealBridgeError for KeyringError {
    fn into_dealbridge(self) -> DealBridgeError {
        use KeyringError::*;

        let description = self.to_string();

        match self {
            NoEntry => DealBridgeError::NotFound("keychain entry not found".into()),
            BadEncoding(_) => {
                DealBridgeError::Credentials("credential in keychain is not valid UTF-8".into())
            }
            TooLong(name, limit) => DealBridgeError::Credentials(format!(
                "keychain attribute '{name}' exceeds platform limit ({limit})"
            )),
            PlatformFailure(err) => {
                DealBridgeError::Credentials(format!("keychain platform error: {err}"))
            }
            NoStorageAccess(err) => {
                DealBridgeError::Credentials(format!("unable to access secure storage: {err}"))
            }
            _ => DealBridgeError::Credentials(description),
        }
    }
}

impl From<KeyringError> for InfraError {
    fn from(value: KeyringError) -> Self {
        InfraError(value.into_dealbridge())
    }
}

impl IntoDealBridgeError for KeychainError {
    fn into_dealbridge(self) -> DealBridgeError {
        match self {
            KeychainError::NotFound => {
                DealBridgeError::NotFound("keychain entry not found".into())
            }
            KeychainError::AccessFailed(message) => DealBridgeError::Credentials(message),
            KeychainError::Keyring(err) => err.into_dealbridge(),
        }
    }
}

impl From<KeychainError> for InfraError {
    fn from(value: KeychainError) -> Self {
        InfraError(value.into_dealbridge())
    }
}

/* -------------------------------------------------------------------------- */
/* tiberius::error::Error → DealBridgeError */
/* -------------------------------------------------------------------------- */

// Server-side errors (constraint, deadlock, invalid object) fail the running
// statement; everything below the protocol layer means the link is gone.
impl IntoDealBridgeError for TdsDriverError {
    fn into_dealbridge(self) -> DealBridgeError {
        match self {
            TdsDriverError::Server(token) => server_error(token.code(), token.message()),
            TdsDriverError::Conversion(_)
            | TdsDriverError::Encoding(_)
            | TdsDriverError::Utf8
            | TdsDriverError::Utf16
            | TdsDriverError::ParseInt(_)
            | TdsDriverError::BulkInput(_) => DealBridgeError::Transaction(self.to_string()),
            other => DealBridgeError::Connection(other.to_string()),
        }
    }
}

/// The server's message is passed on unchanged; the error number goes to the log.
fn server_error(code: u32, message: &str) -> DealBridgeError {
    warn!(code, "ERP server rejected the statement");
    DealBridgeError::Transaction(message.to_string())
}

impl From<TdsDriverError> for InfraError {
    fn from(value: TdsDriverError) -> Self {
        InfraError(value.into_dealbridge())
    }
}

impl IntoDealBridgeError for TdsError {
    fn into_dealbridge(self) -> DealBridgeError {
        match self {
            TdsError::Driver(err) => err.into_dealbridge(),
            TdsError::Io(err) => DealBridgeError::Connection(err.to_string()),
            TdsError::Timeout(limit) => DealBridgeError::Connection(format!(
                "ERP did not respond within {}s",
                limit.as_secs()
            )),
        }
    }
}

impl From<TdsError> for InfraError {
    fn from(value: TdsError) -> Self {
        InfraError(value.into_dealbridge())
    }
}

/* -------------------------------------------------------------------------- */
/* bb8::RunError → DealBridgeError */
/* -------------------------------------------------------------------------- */

// A pooled checkout only fails while establishing a link, so even server
// errors (failed login) count as connection failures here.
impl IntoDealBridgeError for bb8::RunError<TdsError> {
    fn into_dealbridge(self) -> DealBridgeError {
        match self {
            bb8::RunError::User(err) => match err.into_dealbridge() {
                DealBridgeError::Transaction(message) => DealBridgeError::Connection(message),
                other => other,
            },
            bb8::RunError::TimedOut => {
                DealBridgeError::Connection("timed out waiting for an ERP connection".into())
            }
        }
    }
}

impl From<bb8::RunError<TdsError>> for InfraError {
    fn from(value: bb8::RunError<TdsError>) -> Self {
        InfraError(value.into_dealbridge())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
