//! Transaction boundary: commit on success, roll back on error or panic.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use modelsql_core::errors::ExecError;
use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::statement::sqlite_error;

/// Run `body` inside a `BEGIN IMMEDIATE` transaction on `conn`.
///
/// A panic in `body` is recovered into [`ExecError::Panicked`] after the
/// rollback; it never escapes this function.
pub fn transact<T, F>(conn: &Connection, body: F) -> Result<T, ExecError>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, ExecError>,
{
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate).map_err(|e| {
        ExecError::SqliteError {
            message: format!("failed to begin transaction: {e}"),
        }
    })?;

    match panic::catch_unwind(AssertUnwindSafe(|| body(&tx))) {
        Ok(Ok(value)) => {
            tx.commit().map_err(|e| ExecError::SqliteError {
                message: format!("failed to commit: {e}"),
            })?;
            Ok(value)
        }
        Ok(Err(err)) => {
            rollback(tx, &err.to_string());
            Err(err)
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            rollback(tx, &message);
            Err(ExecError::Panicked { message })
        }
    }
}

/// Run `body` outside any transaction, recovering a panic into
/// [`ExecError::Panicked`].
pub fn catch_panic<T>(body: impl FnOnce() -> T) -> Result<T, ExecError> {
    panic::catch_unwind(AssertUnwindSafe(body)).map_err(|payload| ExecError::Panicked {
        message: panic_message(payload.as_ref()),
    })
}

fn rollback(tx: Transaction<'_>, cause: &str) {
    tracing::debug!(cause, "rolling back transaction");
    if let Err(e) = tx.rollback() {
        tracing::warn!(error = %sqlite_error(e), "rollback failed");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
