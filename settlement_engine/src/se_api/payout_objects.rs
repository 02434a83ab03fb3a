use std::fmt::Display;

use chrono::{DateTime, Utc};
use fgs_common::Pesewa;
use serde::{Deserialize, Serialize};

use crate::db_types::{PaymentMethod, PayoutStatus};

//--------------------------------------    PayoutRequest    ---------------------------------------------------------
/// An incoming payout request, as supplied by the marketplace. The coordinator computes the
/// commission split, the ledger txid and the release date before anything is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutRequest {
    pub farmer_id: String,
    pub farmer_name: String,
    pub email: String,
    pub total_amount: Pesewa,
    pub payment_method: PaymentMethod,
    pub account_number: String,
    /// The dispute window between the request and the earliest allowed disbursement.
    pub holding_period_days: u32,
    pub notes: Option<String>,
}

impl PayoutRequest {
    pub fn new(farmer_id: String, farmer_name: String, email: String, total_amount: Pesewa) -> Self {
        Self {
            farmer_id,
            farmer_name,
            email,
            total_amount,
            payment_method: PaymentMethod::MobileMoney,
            account_number: String::new(),
            holding_period_days: 0,
            notes: None,
        }
    }

    pub fn with_payment_method(mut self, payment_method: PaymentMethod, account_number: String) -> Self {
        self.payment_method = payment_method;
        self.account_number = account_number;
        self
    }

    pub fn with_holding_period(mut self, days: u32) -> Self {
        self.holding_period_days = days;
        self
    }

    pub fn with_notes(mut self, notes: String) -> Self {
        self.notes = Some(notes);
        self
    }
}

//--------------------------------------  PayoutQueryFilter  ---------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PayoutQueryFilter {
    pub farmer_id: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub status: Option<Vec<PayoutStatus>>,
}

impl PayoutQueryFilter {
    pub fn with_farmer_id(mut self, farmer_id: String) -> Self {
        self.farmer_id = Some(farmer_id);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn with_status(mut self, status: PayoutStatus) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.farmer_id.is_none() && self.status.is_none() && self.since.is_none() && self.until.is_none()
    }
}

impl Display for PayoutQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "No filters.")?;
            return Ok(());
        }
        if let Some(farmer_id) = &self.farmer_id {
            write!(f, "farmer_id: {farmer_id}. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until {until}. ")?;
        }
        if let Some(statuses) = &self.status {
            let statuses = statuses.iter().map(|s| s.to_string()).collect::<Vec<String>>().join(",");
            write!(f, "statuses: [{statuses}]. ")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn request_survives_a_json_round_trip() {
        let request = PayoutRequest::new(
            "farmer-001".to_string(),
            "Ama Mensah".to_string(),
            "ama@farmgate.example".to_string(),
            Pesewa::from(1000),
        )
        .with_payment_method(PaymentMethod::BankTransfer, "GH-0001".to_string())
        .with_holding_period(7)
        .with_notes("first harvest of the season".to_string());
        let json = serde_json::to_string(&request).unwrap();
        let back: PayoutRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.total_amount, Pesewa::from(1000));
        assert_eq!(back.payment_method, PaymentMethod::BankTransfer);
        assert_eq!(back.holding_period_days, 7);
        assert_eq!(back.notes.as_deref(), Some("first harvest of the season"));
    }

    #[test]
    fn filter_rejects_unknown_fields() {
        let err = serde_json::from_str::<PayoutQueryFilter>(r#"{"farmer":"oops"}"#);
        assert!(err.is_err());
        let filter: PayoutQueryFilter = serde_json::from_str(r#"{"farmer_id":"farmer-001"}"#).unwrap();
        assert_eq!(filter.farmer_id.as_deref(), Some("farmer-001"));
    }
}
