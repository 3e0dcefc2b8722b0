//! Per-session statement statistics.

use rewind_core::errors::StorageError;
use rewind_core::traits::BackupStore;
use rewind_core::types::{SourceIdent, StatCategory, StatisticsCounters};

use crate::dispatch::Classification;

/// Counts classified statements for one session.
#[derive(Debug, Default, Clone)]
pub struct StatisticsAggregator {
    counters: StatisticsCounters,
}

impl StatisticsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, classification: &Classification) {
        for category in &classification.categories {
            self.counters.increment(*category);
        }
    }

    pub fn get(&self, category: StatCategory) -> u64 {
        self.counters.get(category)
    }

    pub fn counters(&self) -> &StatisticsCounters {
        &self.counters
    }

    /// Persist the counters for `session_id`. Statistics are written once, at
    /// session teardown.
    pub fn persist(
        &self,
        store: &dyn BackupStore,
        source: &SourceIdent,
        session_id: u64,
    ) -> Result<(), StorageError> {
        store.write_statistics(source, session_id, &self.counters)?;
        tracing::info!(
            source = %source,
            session_id,
            statements = self.counters.total(),
            "persisted session statistics"
        );
        Ok(())
    }
}
