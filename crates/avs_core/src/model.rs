use std::collections::BTreeSet;

use avs_logging::avs_warn;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::currency::{format_amount, parse_amount, ParseError};

/// Display format for dates printed on the document.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Fields scraped from one fiscal receipt page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptRecord {
    pub issuer: String,
    /// Literal total text in Brazilian notation; validated only at aggregation time.
    pub total: String,
    pub issued_at: Option<NaiveDateTime>,
    pub note_number: Option<String>,
    pub source_url: String,
}

/// One row of the item table on the generated document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub number: String,
    pub date: String,
    pub description: String,
    pub value: String,
}

impl LineItem {
    /// Derive the table row for `record`; `position` is 1-based and stands in for
    /// a missing note number.
    pub fn from_receipt(record: &ReceiptRecord, position: usize) -> Self {
        Self {
            number: record
                .note_number
                .clone()
                .unwrap_or_else(|| position.to_string()),
            date: record
                .issued_at
                .map(|ts| ts.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            description: record.issuer.clone(),
            value: record.total.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedUrl {
    pub url: String,
    pub reason: String,
}

/// Outcome of one aggregation run over the pending URL list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub items: Vec<LineItem>,
    pub combined_total: String,
    pub issuers: BTreeSet<String>,
    /// Timestamp of the last successful receipt in iteration order, not the latest in time.
    pub last_timestamp: Option<NaiveDateTime>,
    pub failed_urls: Vec<FailedUrl>,
}

impl AggregationResult {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Accumulates per-URL outcomes in submission order.
#[derive(Debug, Default)]
pub struct AggregationBuilder {
    items: Vec<LineItem>,
    sum: f64,
    issuers: BTreeSet<String>,
    last_timestamp: Option<NaiveDateTime>,
    failed_urls: Vec<FailedUrl>,
}

impl AggregationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a successfully extracted receipt. A total that does not parse is
    /// recorded as a failure for the receipt's URL, left out of the sum, and
    /// returned to the caller.
    pub fn record_receipt(&mut self, record: &ReceiptRecord) -> Result<(), ParseError> {
        let amount = match parse_amount(&record.total) {
            Ok(amount) => amount,
            Err(err) => {
                avs_warn!("Receipt {} has unusable total: {}", record.source_url, err);
                self.record_failure(&record.source_url, err.to_string());
                return Err(err);
            }
        };

        let position = self.items.len() + 1;
        self.items.push(LineItem::from_receipt(record, position));
        self.issuers.insert(record.issuer.clone());
        self.sum += amount;
        if record.issued_at.is_some() {
            self.last_timestamp = record.issued_at;
        }
        Ok(())
    }

    pub fn record_failure(&mut self, url: &str, reason: impl Into<String>) {
        self.failed_urls.push(FailedUrl {
            url: url.to_string(),
            reason: reason.into(),
        });
    }

    pub fn finish(self) -> AggregationResult {
        AggregationResult {
            items: self.items,
            combined_total: format_amount(self.sum),
            issuers: self.issuers,
            last_timestamp: self.last_timestamp,
            failed_urls: self.failed_urls,
        }
    }
}

/// Destination and request kind entered when the authorization was requested.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TripMetadata {
    pub destination: String,
    pub request_type: String,
}
