use chrono::{DateTime, Utc};
use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewPayout, Payout},
    se_api::PayoutQueryFilter,
    traits::SettlementError,
};

/// Inserts a new payout in `PendingApproval` status (the schema default). This is not atomic on
/// its own; embed it in a transaction together with the ledger append.
pub async fn insert(payout: NewPayout, conn: &mut SqliteConnection) -> Result<Payout, SettlementError> {
    let payout = sqlx::query_as(
        r#"
            INSERT INTO payouts (
                farmer_id,
                farmer_name,
                email,
                total_amount,
                commission,
                net_amount,
                payment_method,
                account_number,
                txid,
                requested_at,
                holding_period_days,
                release_date,
                notes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *;
        "#,
    )
    .bind(payout.farmer_id)
    .bind(payout.farmer_name)
    .bind(payout.email)
    .bind(payout.total_amount)
    .bind(payout.commission)
    .bind(payout.net_amount)
    .bind(payout.payment_method.to_string())
    .bind(payout.account_number)
    .bind(payout.txid)
    .bind(payout.requested_at)
    .bind(i64::from(payout.holding_period_days))
    .bind(payout.release_date)
    .bind(payout.notes)
    .fetch_one(conn)
    .await?;
    Ok(payout)
}

pub async fn fetch(payout_id: i64, conn: &mut SqliteConnection) -> Result<Option<Payout>, SettlementError> {
    let payout = sqlx::query_as("SELECT * FROM payouts WHERE id = $1").bind(payout_id).fetch_optional(conn).await?;
    Ok(payout)
}

pub async fn fetch_for_farmer(farmer_id: &str, conn: &mut SqliteConnection) -> Result<Vec<Payout>, SettlementError> {
    let payouts = sqlx::query_as("SELECT * FROM payouts WHERE farmer_id = $1 ORDER BY requested_at ASC, id ASC")
        .bind(farmer_id)
        .fetch_all(conn)
        .await?;
    Ok(payouts)
}

/// Fetches payouts according to criteria specified in the `PayoutQueryFilter`.
///
/// Resulting payouts are ordered by `requested_at` in ascending order.
pub async fn search(query: PayoutQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Payout>, SettlementError> {
    let mut builder = QueryBuilder::new(
        r#"
    SELECT * FROM payouts
    "#,
    );
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(farmer_id) = query.farmer_id {
        where_clause.push("farmer_id = ");
        where_clause.push_bind_unseparated(farmer_id);
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
        where_clause.push("datetime(requested_at) >= datetime(");
        where_clause.push_bind_unseparated(since);
        where_clause.push_unseparated(")");
    }
    if let Some(until) = query.until {
        where_clause.push("datetime(requested_at) <= datetime(");
        where_clause.push_bind_unseparated(until);
        where_clause.push_unseparated(")");
    }
    builder.push(" ORDER BY requested_at ASC, id ASC");

    trace!("💸️ Executing query: {}", builder.sql());
    let query = builder.build_query_as::<Payout>();
    let payouts = query.fetch_all(conn).await?;
    trace!("💸️ Result of payout search: {} payouts", payouts.len());
    Ok(payouts)
}

/// `PendingApproval -> Approved`. The status guard lives in the WHERE clause; `None` means the
/// payout was not in `PendingApproval` (or does not exist) and nothing was written.
pub(crate) async fn mark_approved(
    payout_id: i64,
    approved_by: &str,
    approved_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Payout>, SettlementError> {
    let payout = sqlx::query_as(
        "UPDATE payouts SET status = 'Approved', approved_at = $1, approved_by = $2 \
         WHERE id = $3 AND status = 'PendingApproval' RETURNING *",
    )
    .bind(approved_at)
    .bind(approved_by)
    .bind(payout_id)
    .fetch_optional(conn)
    .await?;
    Ok(payout)
}

/// `Approved -> Processing`. Holding-period and dispute gates are the caller's responsibility —
/// this only enforces the status precondition.
pub(crate) async fn mark_processing(
    payout_id: i64,
    processed_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Payout>, SettlementError> {
    let payout = sqlx::query_as(
        "UPDATE payouts SET status = 'Processing', processed_at = $1 WHERE id = $2 AND status = 'Approved' RETURNING *",
    )
    .bind(processed_at)
    .bind(payout_id)
    .fetch_optional(conn)
    .await?;
    Ok(payout)
}

/// `Processing -> Completed`.
pub(crate) async fn mark_completed(
    payout_id: i64,
    completed_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Payout>, SettlementError> {
    let payout = sqlx::query_as(
        "UPDATE payouts SET status = 'Completed', completed_at = $1 WHERE id = $2 AND status = 'Processing' RETURNING *",
    )
    .bind(completed_at)
    .bind(payout_id)
    .fetch_optional(conn)
    .await?;
    Ok(payout)
}

/// `Processing | PendingApproval -> Failed`, appending the reason to the payout's notes.
pub(crate) async fn mark_failed(
    payout_id: i64,
    reason: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payout>, SettlementError> {
    let payout = sqlx::query_as(
        "UPDATE payouts SET status = 'Failed', notes = COALESCE(notes || '; ', '') || $1 \
         WHERE id = $2 AND status IN ('Processing', 'PendingApproval') RETURNING *",
    )
    .bind(reason)
    .bind(payout_id)
    .fetch_optional(conn)
    .await?;
    Ok(payout)
}
