//! The transaction scope for store mutations.
//!
//! Every mutating store call runs its work inside [`with_transaction`]: an
//! error (or panic) anywhere inside the closure rolls the whole transaction
//! back via rusqlite's drop behavior and the error is re-raised; on success
//! the transaction commits exactly once.

use rusqlite::{Connection, Transaction};

use super::error::StoreError;

pub(crate) fn with_transaction<T, F>(conn: &Connection, f: F) -> Result<T, StoreError>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, StoreError>,
{
    let tx = conn.unchecked_transaction()?;
    let value = f(&tx)?;
    tx.commit()?;
    Ok(value)
}
