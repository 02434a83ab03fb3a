use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{EntryType, TransactionStatus};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransactionQueryFilter {
    pub txid: Option<String>,
    pub entry_type: Option<EntryType>,
    pub related_id: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub status: Option<Vec<TransactionStatus>>,
}

impl TransactionQueryFilter {
    pub fn with_txid(mut self, txid: String) -> Self {
        self.txid = Some(txid);
        self
    }

    pub fn with_entry_type(mut self, entry_type: EntryType) -> Self {
        self.entry_type = Some(entry_type);
        self
    }

    pub fn with_related_id(mut self, related_id: String) -> Self {
        self.related_id = Some(related_id);
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

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.txid.is_none()
            && self.entry_type.is_none()
            && self.related_id.is_none()
            && self.status.is_none()
            && self.since.is_none()
            && self.until.is_none()
    }
}

impl Display for TransactionQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "No filters.")?;
            return Ok(());
        }
        if let Some(txid) = &self.txid {
            write!(f, "txid: {txid}. ")?;
        }
        if let Some(entry_type) = &self.entry_type {
            write!(f, "entry_type: {entry_type}. ")?;
        }
        if let Some(related_id) = &self.related_id {
            write!(f, "related_id: {related_id}. ")?;
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
    fn builders_accumulate() {
        let filter = TransactionQueryFilter::default()
            .with_entry_type(EntryType::Refund)
            .with_status(TransactionStatus::Completed)
            .with_status(TransactionStatus::Pending)
            .with_related_id("order-17".to_string());
        assert!(!filter.is_empty());
        assert_eq!(filter.entry_type, Some(EntryType::Refund));
        assert_eq!(filter.status.as_ref().map(Vec::len), Some(2));
        assert!(TransactionQueryFilter::default().is_empty());
    }
}
