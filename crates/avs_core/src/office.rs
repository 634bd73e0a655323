use avs_logging::avs_info;
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Singleton office record: static fields plus the document sequence counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficeConfig {
    pub office_name: String,
    pub responsible_name: String,
    pub responsible_title: String,
    pub departure_city: String,
    pub next_sequence: u32,
}

impl Default for OfficeConfig {
    fn default() -> Self {
        Self {
            office_name: String::new(),
            responsible_name: String::new(),
            responsible_title: String::new(),
            departure_city: String::new(),
            next_sequence: 1,
        }
    }
}

/// Access to the office record.
///
/// `consume_sequence` is a read-modify-write with no locking; two concurrent
/// callers may observe the same number.
pub trait OfficeConfigStore {
    fn load(&self) -> Result<OfficeConfig, StoreError>;
    fn save(&mut self, config: &OfficeConfig) -> Result<(), StoreError>;

    /// Returns the current sequence number and persists its successor.
    fn consume_sequence(&mut self) -> Result<u32, StoreError> {
        let mut config = self.load()?;
        let sequence = config.next_sequence;
        config.next_sequence = sequence.saturating_add(1);
        self.save(&config)?;
        avs_info!("Consumed document sequence {}", sequence);
        Ok(sequence)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryOfficeConfig {
    config: OfficeConfig,
}

impl InMemoryOfficeConfig {
    pub fn new(config: OfficeConfig) -> Self {
        Self { config }
    }

    pub fn next_sequence(&self) -> u32 {
        self.config.next_sequence
    }
}

impl OfficeConfigStore for InMemoryOfficeConfig {
    fn load(&self) -> Result<OfficeConfig, StoreError> {
        Ok(self.config.clone())
    }

    fn save(&mut self, config: &OfficeConfig) -> Result<(), StoreError> {
        self.config = config.clone();
        Ok(())
    }
}
