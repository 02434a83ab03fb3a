use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::{
    db_types::{Dispute, DisputeStatus, NewDispute, OrderId},
    traits::SettlementError,
};

/// Inserts a new dispute in `Open` status (the schema default).
pub async fn insert(dispute: NewDispute, conn: &mut SqliteConnection) -> Result<Dispute, SettlementError> {
    let dispute = sqlx::query_as(
        r#"
            INSERT INTO disputes (order_id, buyer_id, buyer_name, farmer_id, farmer_name, amount, reason)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(dispute.order_id)
    .bind(dispute.buyer_id)
    .bind(dispute.buyer_name)
    .bind(dispute.farmer_id)
    .bind(dispute.farmer_name)
    .bind(dispute.amount)
    .bind(dispute.reason)
    .fetch_one(conn)
    .await?;
    Ok(dispute)
}

pub async fn fetch(dispute_id: i64, conn: &mut SqliteConnection) -> Result<Option<Dispute>, SettlementError> {
    let dispute = sqlx::query_as("SELECT * FROM disputes WHERE id = $1").bind(dispute_id).fetch_optional(conn).await?;
    Ok(dispute)
}

pub async fn fetch_for_order(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Vec<Dispute>, SettlementError> {
    let disputes = sqlx::query_as("SELECT * FROM disputes WHERE order_id = $1 ORDER BY created_at ASC, id ASC")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(disputes)
}

pub async fn fetch_for_farmer(farmer_id: &str, conn: &mut SqliteConnection) -> Result<Vec<Dispute>, SettlementError> {
    let disputes = sqlx::query_as("SELECT * FROM disputes WHERE farmer_id = $1 ORDER BY created_at ASC, id ASC")
        .bind(farmer_id)
        .fetch_all(conn)
        .await?;
    Ok(disputes)
}

/// Counts the disputes currently blocking the given farmer's payouts.
pub async fn count_blocking(farmer_id: &str, conn: &mut SqliteConnection) -> Result<i64, SettlementError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM disputes WHERE farmer_id = $1 AND status IN ('Open', 'Investigating')")
            .bind(farmer_id)
            .fetch_one(conn)
            .await?;
    Ok(count)
}

/// `Open -> Investigating`. `None` means the dispute was not `Open` (or does not exist).
pub(crate) async fn mark_investigating(
    dispute_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Dispute>, SettlementError> {
    let dispute =
        sqlx::query_as("UPDATE disputes SET status = 'Investigating' WHERE id = $1 AND status = 'Open' RETURNING *")
            .bind(dispute_id)
            .fetch_optional(conn)
            .await?;
    Ok(dispute)
}

/// Closes a dispute from `Open` or `Investigating` to the given terminal status, stamping
/// `resolved_at` and the resolution text. `None` means the dispute was already terminal (or does
/// not exist) and nothing was written.
pub(crate) async fn mark_closed(
    dispute_id: i64,
    status: DisputeStatus,
    resolution: &str,
    resolved_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Dispute>, SettlementError> {
    let dispute = sqlx::query_as(
        "UPDATE disputes SET status = $1, resolution = $2, resolved_at = $3 \
         WHERE id = $4 AND status IN ('Open', 'Investigating') RETURNING *",
    )
    .bind(status.to_string())
    .bind(resolution)
    .bind(resolved_at)
    .bind(dispute_id)
    .fetch_optional(conn)
    .await?;
    Ok(dispute)
}
