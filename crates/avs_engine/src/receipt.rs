use std::sync::Arc;

use avs_core::ReceiptRecord;
use avs_logging::{avs_info, avs_warn};
use chrono::{Local, NaiveDate, NaiveDateTime};
use scraper::Html;

use crate::decode::decode_page;
use crate::extract::{ReceiptFieldStrategy, SelectorStrategy};
use crate::fetch::{FetchSettings, Fetcher, ReqwestFetcher};
use crate::{ExtractionError, FetchError, FetchOutput, ReceiptField};

/// Source of "now" used when a receipt carries no readable issuance date.
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

const DATETIME_FORMATS: [&str; 2] = ["%d/%m/%Y %H:%M:%S", "%d/%m/%Y %H:%M"];
const DATE_FORMAT: &str = "%d/%m/%Y";

/// Anything that turns a receipt URL into a [`ReceiptRecord`].
#[async_trait::async_trait]
pub trait ReceiptSource: Send + Sync {
    async fn extract(&self, url: &str) -> Result<ReceiptRecord, ExtractionError>;
}

/// Fetches a receipt page once and reads its fields through a strategy.
pub struct ReceiptExtractor {
    fetcher: Arc<dyn Fetcher>,
    strategy: Arc<dyn ReceiptFieldStrategy>,
    clock: Clock,
}

impl ReceiptExtractor {
    pub fn new(fetcher: Arc<dyn Fetcher>, strategy: Arc<dyn ReceiptFieldStrategy>) -> Self {
        Self {
            fetcher,
            strategy,
            clock: Arc::new(|| Local::now().naive_local()),
        }
    }

    /// Reqwest fetcher plus the default portal selectors.
    pub fn with_settings(settings: FetchSettings) -> Result<Self, FetchError> {
        let fetcher = ReqwestFetcher::new(settings)?;
        Ok(Self::new(
            Arc::new(fetcher),
            Arc::new(SelectorStrategy::default()),
        ))
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    // Kept synchronous: the parsed document is not Send and must not live
    // across an await point.
    fn read_fields(&self, url: &str, output: &FetchOutput) -> Result<ReceiptRecord, ExtractionError> {
        let decoded = decode_page(output);
        let doc = Html::parse_document(&decoded.html);

        let missing = |field| ExtractionError::MissingField {
            url: url.to_string(),
            field,
        };
        let issuer = self
            .strategy
            .issuer(&doc)
            .ok_or_else(|| missing(ReceiptField::Issuer))?;
        let total = self
            .strategy
            .total(&doc)
            .ok_or_else(|| missing(ReceiptField::Total))?;
        let note_number = self.strategy.note_number(&doc);

        let issued_at = match self.strategy.issued_at(&doc) {
            Some(text) => match parse_issued_at(&text) {
                Some(ts) => ts,
                None => {
                    avs_warn!(
                        "Unreadable issuance date {:?} on {}; using current time",
                        text,
                        url
                    );
                    (self.clock)()
                }
            },
            None => {
                avs_warn!("No issuance date on {}; using current time", url);
                (self.clock)()
            }
        };

        Ok(ReceiptRecord {
            issuer,
            total,
            issued_at: Some(issued_at),
            note_number,
            source_url: url.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl ReceiptSource for ReceiptExtractor {
    async fn extract(&self, url: &str) -> Result<ReceiptRecord, ExtractionError> {
        let output = self
            .fetcher
            .fetch(url)
            .await
            .map_err(|source| ExtractionError::Fetch {
                url: url.to_string(),
                source,
            })?;
        let record = self.read_fields(url, &output)?;
        avs_info!(
            "Extracted receipt issuer={:?} total={} url={}",
            record.issuer,
            record.total,
            url
        );
        Ok(record)
    }
}

/// Parses `dd/mm/yyyy` with an optional `HH:MM[:SS]` time.
pub fn parse_issued_at(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
