use chrono::{DateTime, Utc};
use fgs_common::Pesewa;
use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{EntryType, NewTransaction, Transaction, TransactionStatus},
    se_api::TransactionQueryFilter,
    traits::LedgerError,
};

/// Appends the entry to the ledger, returning the stored row with its database-assigned id and
/// `created_at`. The txid UNIQUE constraint is the idempotency guard: a retried append maps onto
/// `DuplicateTransaction` and no second row is written.
pub async fn append(entry: NewTransaction, conn: &mut SqliteConnection) -> Result<Transaction, LedgerError> {
    if entry.amount.is_negative() {
        return Err(LedgerError::InvalidAmount(entry.amount));
    }
    let txid = entry.txid.clone();
    let tx = sqlx::query_as(
        r#"
            INSERT INTO ledger (txid, entry_type, status, amount, description, related_id, payment_method)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(entry.txid)
    .bind(entry.entry_type.to_string())
    .bind(entry.status.to_string())
    .bind(entry.amount)
    .bind(entry.description)
    .bind(entry.related_id)
    .bind(entry.payment_method.to_string())
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => LedgerError::DuplicateTransaction(txid),
        _ => LedgerError::from(e),
    })?;
    Ok(tx)
}

/// Moves a `Pending`/`OnHold` entry to `Completed` or `Failed`. The status guard lives in the
/// WHERE clause, so a concurrent finalization cannot flip a terminal entry.
pub async fn finalize(
    txid: &str,
    status: TransactionStatus,
    completed_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Transaction, LedgerError> {
    if !status.is_terminal() {
        return Err(LedgerError::IllegalTransactionTransition(format!(
            "Transaction {txid} may only finalize to Completed or Failed, not {status}"
        )));
    }
    let updated: Option<Transaction> = sqlx::query_as(
        "UPDATE ledger SET status = $1, completed_at = $2 WHERE txid = $3 AND status IN ('Pending', 'OnHold') RETURNING *",
    )
    .bind(status.to_string())
    .bind(completed_at)
    .bind(txid)
    .fetch_optional(&mut *conn)
    .await?;
    match updated {
        Some(tx) => Ok(tx),
        None => match fetch(txid, conn).await? {
            Some(tx) => Err(LedgerError::IllegalTransactionTransition(format!(
                "Transaction {txid} is already {} and cannot change to {status}",
                tx.status
            ))),
            None => Err(LedgerError::UnknownTransaction(txid.to_string())),
        },
    }
}

pub async fn fetch(txid: &str, conn: &mut SqliteConnection) -> Result<Option<Transaction>, LedgerError> {
    let tx = sqlx::query_as("SELECT * FROM ledger WHERE txid = $1").bind(txid).fetch_optional(conn).await?;
    Ok(tx)
}

/// Fetches ledger entries according to criteria specified in the `TransactionQueryFilter`.
///
/// Resulting entries are ordered by `created_at` in ascending order.
pub async fn search(query: TransactionQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Transaction>, LedgerError> {
    let mut builder = QueryBuilder::new(
        r#"
    SELECT * FROM ledger
    "#,
    );
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(txid) = query.txid {
        where_clause.push("txid = ");
        where_clause.push_bind_unseparated(txid);
    }
    if let Some(entry_type) = query.entry_type {
        where_clause.push("entry_type = ");
        where_clause.push_bind_unseparated(entry_type.to_string());
    }
    if let Some(related_id) = query.related_id {
        where_clause.push("related_id = ");
        where_clause.push_bind_unseparated(related_id);
    }
    if query.status.as_ref().map(|s| !s.is_empty()).unwrap_or(false) {
        let mut statuses = vec![];
        query.status.as_ref().unwrap().iter().for_each(|s| {
            statuses.push(format!("'{s}'"));
        });
        let status_clause = statuses.join(",");
        where_clause.push(format!("status IN ({status_clause})"));
    }
    if let Some(since) = query.since {
        where_clause.push("datetime(created_at) >= datetime(");
        where_clause.push_bind_unseparated(since);
        where_clause.push_unseparated(")");
    }
    if let Some(until) = query.until {
        where_clause.push("datetime(created_at) <= datetime(");
        where_clause.push_bind_unseparated(until);
        where_clause.push_unseparated(")");
    }
    builder.push(" ORDER BY created_at ASC, id ASC");

    trace!("🧾️ Executing query: {}", builder.sql());
    let query = builder.build_query_as::<Transaction>();
    let entries = query.fetch_all(conn).await?;
    trace!("🧾️ Result of ledger search: {} entries", entries.len());
    Ok(entries)
}

/// Aggregate sum over entries of a given type and status.
pub async fn total_for_entry_type(
    entry_type: EntryType,
    status: TransactionStatus,
    conn: &mut SqliteConnection,
) -> Result<Pesewa, LedgerError> {
    let total: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(amount), 0) FROM ledger WHERE entry_type = $1 AND status = $2")
        .bind(entry_type.to_string())
        .bind(status.to_string())
        .fetch_one(conn)
        .await?;
    Ok(Pesewa::from(total))
}
