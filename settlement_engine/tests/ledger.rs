mod support;

use chrono::Utc;
use fgs_common::Pesewa;
use settlement_engine::{
    db_types::{EntryType, NewTransaction, OrderId, PaymentMethod, TransactionStatus},
    events::EventProducers,
    traits::{LedgerError, LedgerManagement, SettlementError},
    ReportsApi, SettlementApi, SqliteDatabase, TransactionQueryFilter,
};
use tokio::runtime::Runtime;

fn apis(db: SqliteDatabase) -> (SettlementApi<SqliteDatabase>, ReportsApi<SqliteDatabase>) {
    (SettlementApi::new(db.clone(), EventProducers::default()), ReportsApi::new(db))
}

#[test]
fn append_is_idempotent_on_txid() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = support::random_db_path();
        let db = support::prepare_test_env(&url).await;

        let entry = NewTransaction::new("deposit-retry-1".to_string(), EntryType::Deposit, Pesewa::from(500), PaymentMethod::MobileMoney)
            .completed();
        let stored = db.append_transaction(entry.clone()).await.expect("first append failed");
        assert_eq!(stored.txid, "deposit-retry-1");

        // A retried append with the same caller-supplied id fails and writes nothing.
        let err = db.append_transaction(entry).await.unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateTransaction(ref txid) if txid == "deposit-retry-1"), "got {err}");

        let matching = db
            .search_transactions(TransactionQueryFilter::default().with_txid("deposit-retry-1".to_string()))
            .await
            .unwrap();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].id, stored.id);
    });
}

#[test]
fn finalize_respects_the_transition_rules() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = support::random_db_path();
        let db = support::prepare_test_env(&url).await;

        let pending =
            NewTransaction::new("wd-1".to_string(), EntryType::Withdrawal, Pesewa::from(250), PaymentMethod::BankTransfer);
        db.append_transaction(pending).await.unwrap();

        let settled = db.finalize_transaction("wd-1", TransactionStatus::Completed, Utc::now()).await.unwrap();
        assert_eq!(settled.status, TransactionStatus::Completed);
        assert!(settled.completed_at.is_some());

        // Terminal entries never move again.
        let err = db.finalize_transaction("wd-1", TransactionStatus::Failed, Utc::now()).await.unwrap_err();
        assert!(matches!(err, LedgerError::IllegalTransactionTransition(_)), "got {err}");

        // OnHold entries may still settle.
        let mut held = NewTransaction::new("wd-2".to_string(), EntryType::Withdrawal, Pesewa::from(80), PaymentMethod::BankTransfer);
        held.status = TransactionStatus::OnHold;
        db.append_transaction(held).await.unwrap();
        let settled = db.finalize_transaction("wd-2", TransactionStatus::Failed, Utc::now()).await.unwrap();
        assert_eq!(settled.status, TransactionStatus::Failed);

        // Finalizing to a non-terminal status is refused outright.
        let err = db.finalize_transaction("wd-2", TransactionStatus::OnHold, Utc::now()).await.unwrap_err();
        assert!(matches!(err, LedgerError::IllegalTransactionTransition(_)), "got {err}");

        let err = db.finalize_transaction("no-such-txid", TransactionStatus::Completed, Utc::now()).await.unwrap_err();
        assert!(matches!(err, LedgerError::UnknownTransaction(_)), "got {err}");
    });
}

#[test]
fn negative_amounts_never_reach_the_ledger() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = support::random_db_path();
        let db = support::prepare_test_env(&url).await;

        let entry = NewTransaction::new("bad-1".to_string(), EntryType::Deposit, Pesewa::from(-10), PaymentMethod::MobileMoney);
        let err = db.append_transaction(entry).await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount(_)), "got {err}");
        assert!(db.fetch_transaction("bad-1").await.unwrap().is_none());
    });
}

#[test]
fn totals_are_reconstructable_by_replaying_the_ledger() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = support::random_db_path();
        let db = support::prepare_test_env(&url).await;
        let (api, reports) = apis(db.clone());

        api.record_order_payment(&OrderId::from("order-1".to_string()), "buyer-1", Pesewa::from(1200), PaymentMethod::MobileMoney)
            .await
            .unwrap();
        api.record_order_payment(&OrderId::from("order-2".to_string()), "buyer-2", Pesewa::from(800), PaymentMethod::BankTransfer)
            .await
            .unwrap();
        api.record_withdrawal("buyer-1", Pesewa::from(300), PaymentMethod::MobileMoney, "wallet cash-out").await.unwrap();

        assert_eq!(reports.total_revenue().await.unwrap(), Pesewa::from(2000));

        // Replaying the append log gives exactly the aggregate the backend reports.
        let deposits = db
            .search_transactions(
                TransactionQueryFilter::default()
                    .with_entry_type(EntryType::Deposit)
                    .with_status(TransactionStatus::Completed),
            )
            .await
            .unwrap();
        let replayed: Pesewa = deposits.iter().map(|t| t.amount).sum();
        assert_eq!(replayed, Pesewa::from(2000));
        // Ids are strictly increasing in append order.
        assert!(deposits.windows(2).all(|w| w[0].id < w[1].id));

        let err = api.record_order_payment(&OrderId::from("order-3".to_string()), "buyer-3", Pesewa::from(0), PaymentMethod::MobileMoney)
            .await
            .unwrap_err();
        assert!(matches!(err, SettlementError::InvalidAmount(_)), "got {err}");
    });
}
