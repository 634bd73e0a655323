use avs_logging::avs_info;

use crate::{AggregationResult, StoreError, TripMetadata};

/// Per-session key-value state consumed by the request handlers.
///
/// Nothing here is expected to outlive the session it belongs to.
pub trait SessionStore {
    fn pending_urls(&self) -> Result<Vec<String>, StoreError>;
    fn append_pending_url(&mut self, url: &str) -> Result<(), StoreError>;
    fn clear_pending_urls(&mut self) -> Result<(), StoreError>;
    fn save_aggregation(&mut self, result: &AggregationResult) -> Result<(), StoreError>;
    fn load_aggregation(&self) -> Result<Option<AggregationResult>, StoreError>;
    fn clear_aggregation(&mut self) -> Result<(), StoreError>;
    fn save_trip(&mut self, trip: &TripMetadata) -> Result<(), StoreError>;
    fn load_trip(&self) -> Result<Option<TripMetadata>, StoreError>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InMemorySession {
    pending: Vec<String>,
    aggregation: Option<AggregationResult>,
    trip: Option<TripMetadata>,
}

impl InMemorySession {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySession {
    fn pending_urls(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.pending.clone())
    }

    fn append_pending_url(&mut self, url: &str) -> Result<(), StoreError> {
        self.pending.push(url.to_string());
        Ok(())
    }

    fn clear_pending_urls(&mut self) -> Result<(), StoreError> {
        self.pending.clear();
        Ok(())
    }

    fn save_aggregation(&mut self, result: &AggregationResult) -> Result<(), StoreError> {
        self.aggregation = Some(result.clone());
        Ok(())
    }

    fn load_aggregation(&self) -> Result<Option<AggregationResult>, StoreError> {
        Ok(self.aggregation.clone())
    }

    fn clear_aggregation(&mut self) -> Result<(), StoreError> {
        self.aggregation = None;
        Ok(())
    }

    fn save_trip(&mut self, trip: &TripMetadata) -> Result<(), StoreError> {
        self.trip = Some(trip.clone());
        Ok(())
    }

    fn load_trip(&self) -> Result<Option<TripMetadata>, StoreError> {
        Ok(self.trip.clone())
    }
}

/// Explicit per-request view of one user's session.
pub struct SessionContext<'a> {
    store: &'a mut dyn SessionStore,
}

impl<'a> SessionContext<'a> {
    pub fn new(store: &'a mut dyn SessionStore) -> Self {
        Self { store }
    }

    /// Appends `url` (trimmed) and returns the number of pending URLs.
    /// Blank input is ignored.
    pub fn add_url(&mut self, url: &str) -> Result<usize, StoreError> {
        let url = url.trim();
        if !url.is_empty() {
            self.store.append_pending_url(url)?;
            avs_info!("Queued receipt url={}", url);
        }
        Ok(self.store.pending_urls()?.len())
    }

    /// Forgets the pending URLs and the last aggregation.
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.store.clear_pending_urls()?;
        self.store.clear_aggregation()?;
        avs_info!("Session cleared");
        Ok(())
    }

    pub fn pending_urls(&self) -> Result<Vec<String>, StoreError> {
        self.store.pending_urls()
    }

    /// Replaces any previous aggregation with `result` and remembers the trip.
    pub fn record_authorization(
        &mut self,
        result: &AggregationResult,
        trip: &TripMetadata,
    ) -> Result<(), StoreError> {
        self.store.save_aggregation(result)?;
        self.store.save_trip(trip)
    }

    pub fn aggregation(&self) -> Result<Option<AggregationResult>, StoreError> {
        self.store.load_aggregation()
    }

    pub fn trip(&self) -> Result<Option<TripMetadata>, StoreError> {
        self.store.load_trip()
    }
}
