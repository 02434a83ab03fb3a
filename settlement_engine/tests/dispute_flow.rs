mod support;

use fgs_common::{CommissionRate, Pesewa};
use settlement_engine::{
    db_types::{DisputeStatus, EntryType, NewDispute, OrderId, PaymentMethod, PayoutStatus, TransactionStatus},
    events::EventProducers,
    traits::SettlementError,
    PayoutRequest, ReportsApi, SettlementApi, SqliteDatabase, TransactionQueryFilter,
};
use tokio::runtime::Runtime;

fn rate() -> CommissionRate {
    CommissionRate::from_percent(5.0).unwrap()
}

fn payout_request(farmer_id: &str, farmer_name: &str) -> PayoutRequest {
    PayoutRequest::new(
        farmer_id.to_string(),
        farmer_name.to_string(),
        format!("{farmer_id}@farmgate.example"),
        Pesewa::from(1000),
    )
    .with_payment_method(PaymentMethod::MobileMoney, "0244-000-111".to_string())
}

fn dispute_against(order_id: &str, farmer_id: &str, farmer_name: &str, amount: i64) -> NewDispute {
    NewDispute::new(
        OrderId::from(order_id.to_string()),
        "buyer-042".to_string(),
        "Kofi Boateng".to_string(),
        farmer_id.to_string(),
        farmer_name.to_string(),
        Pesewa::from(amount),
        "Item arrived damaged".to_string(),
    )
}

fn apis(db: SqliteDatabase) -> (SettlementApi<SqliteDatabase>, ReportsApi<SqliteDatabase>) {
    (SettlementApi::new(db.clone(), EventProducers::default()), ReportsApi::new(db))
}

#[test]
fn open_dispute_blocks_processing_until_resolved() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = support::random_db_path();
        let db = support::prepare_test_env(&url).await;
        let (api, reports) = apis(db);

        let payout = api.request_payout(payout_request("farmer-001", "Ama Mensah"), rate()).await.unwrap();
        api.approve_payout(payout.id, "admin").await.unwrap();

        // A dispute against an order of the same farmer lands while the payout is approved.
        let dispute = api.open_dispute(dispute_against("order-77", "farmer-001", "Ama Mensah", 200)).await.unwrap();
        assert_eq!(dispute.status, DisputeStatus::Open);
        assert_eq!(reports.blocking_disputes_for_farmer("farmer-001").await.unwrap(), 1);

        // The holding period has elapsed (0 days), yet the dispute still blocks processing.
        let err = api.process_payout(payout.id).await.unwrap_err();
        assert!(matches!(err, SettlementError::DisputeBlocksPayout { .. }), "got {err}");

        // Investigation does not lift the block.
        api.begin_investigation(dispute.id).await.unwrap();
        let err = api.process_payout(payout.id).await.unwrap_err();
        assert!(matches!(err, SettlementError::DisputeBlocksPayout { .. }), "got {err}");

        // A no-refund resolution lifts it.
        let (resolved, refund) = api.resolve_dispute(dispute.id, "admin", "buyer error", false).await.unwrap();
        assert_eq!(resolved.status, DisputeStatus::Resolved);
        assert_eq!(resolved.resolution.as_deref(), Some("buyer error"));
        assert!(refund.is_none());
        assert_eq!(reports.blocking_disputes_for_farmer("farmer-001").await.unwrap(), 0);

        let (payout, _) = api.process_payout(payout.id).await.expect("process should succeed after resolution");
        assert_eq!(payout.status, PayoutStatus::Processing);
    });
}

#[test]
fn disputes_against_other_farmers_do_not_block() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = support::random_db_path();
        let db = support::prepare_test_env(&url).await;
        let (api, _) = apis(db);

        let payout = api.request_payout(payout_request("farmer-001", "Ama Mensah"), rate()).await.unwrap();
        api.approve_payout(payout.id, "admin").await.unwrap();
        api.open_dispute(dispute_against("order-90", "farmer-002", "Yaw Darko", 150)).await.unwrap();

        let (payout, _) = api.process_payout(payout.id).await.expect("unrelated dispute must not block");
        assert_eq!(payout.status, PayoutStatus::Processing);
    });
}

#[test]
fn fast_track_refund_moves_exactly_the_disputed_amount() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = support::random_db_path();
        let db = support::prepare_test_env(&url).await;
        let (api, reports) = apis(db);

        // A payout for 1000Gp exists alongside; the refund must ignore it entirely.
        let payout = api.request_payout(payout_request("farmer-001", "Ama Mensah"), rate()).await.unwrap();

        let dispute = api.open_dispute(dispute_against("order-77", "farmer-001", "Ama Mensah", 200)).await.unwrap();
        let (dispute, refund) = api.resolve_dispute(dispute.id, "admin", "item damaged", true).await.unwrap();
        assert_eq!(dispute.status, DisputeStatus::Refunded);
        assert!(dispute.resolved_at.is_some());

        let refund = refund.expect("refund entry missing");
        assert_eq!(refund.entry_type, EntryType::Refund);
        assert_eq!(refund.status, TransactionStatus::Completed);
        assert_eq!(refund.amount, Pesewa::from(200));
        assert_ne!(refund.amount, payout.net_amount);
        assert_eq!(refund.related_id.as_deref(), Some("order-77"));

        // Reporting sees it, filtered by the disputed order.
        assert_eq!(reports.total_refunds().await.unwrap(), Pesewa::from(200));
        let entries = reports
            .search_transactions(TransactionQueryFilter::default().with_related_id("order-77".to_string()))
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
    });
}

#[test]
fn terminal_disputes_reject_further_mutation() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = support::random_db_path();
        let db = support::prepare_test_env(&url).await;
        let (api, reports) = apis(db);

        let dispute = api.open_dispute(dispute_against("order-12", "farmer-003", "Esi Owusu", 300)).await.unwrap();
        api.resolve_dispute(dispute.id, "admin", "goodwill refund", true).await.unwrap();

        let err = api.resolve_dispute(dispute.id, "admin", "changed my mind", false).await.unwrap_err();
        assert!(matches!(err, SettlementError::IllegalDisputeTransition { .. }), "got {err}");
        let err = api.begin_investigation(dispute.id).await.unwrap_err();
        assert!(matches!(err, SettlementError::IllegalDisputeTransition { .. }), "got {err}");

        // The failed attempts changed nothing: still exactly one refund entry.
        let unchanged = reports.dispute_by_id(dispute.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, DisputeStatus::Refunded);
        assert_eq!(unchanged.resolution.as_deref(), Some("goodwill refund"));
        assert_eq!(reports.total_refunds().await.unwrap(), Pesewa::from(300));
    });
}

#[test]
fn dispute_validation_and_unknown_ids() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = support::random_db_path();
        let db = support::prepare_test_env(&url).await;
        let (api, _) = apis(db);

        let err = api.open_dispute(dispute_against("order-1", "farmer-001", "Ama Mensah", 0)).await.unwrap_err();
        assert!(matches!(err, SettlementError::InvalidAmount(_)), "got {err}");
        let err = api.open_dispute(dispute_against("order-1", "farmer-001", "Ama Mensah", -50)).await.unwrap_err();
        assert!(matches!(err, SettlementError::InvalidAmount(_)), "got {err}");

        let err = api.begin_investigation(404).await.unwrap_err();
        assert!(matches!(err, SettlementError::UnknownDispute(404)), "got {err}");
        let err = api.resolve_dispute(404, "admin", "nothing here", false).await.unwrap_err();
        assert!(matches!(err, SettlementError::UnknownDispute(404)), "got {err}");
    });
}
