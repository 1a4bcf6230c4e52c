use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use once_cell::sync::Lazy;

use super::loader::RecordSource;
use super::model::GraduateDataset;

static GLOBAL: Lazy<DatasetCache> = Lazy::new(DatasetCache::default);

// ---------------------------------------------------------------------------
// DatasetCache – loaded tables keyed by source identity
// ---------------------------------------------------------------------------

/// Immutable datasets keyed by [`RecordSource::identity`].
///
/// An entry is filled on first request and then shared read-only for the
/// rest of the process. Failed loads are not cached. Tests build their own
/// cache instead of touching [`DatasetCache::global`].
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: Mutex<HashMap<String, Arc<GraduateDataset>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache used by the binaries.
    pub fn global() -> &'static DatasetCache {
        &GLOBAL
    }

    /// Return the cached dataset for `source`, loading it on first use.
    pub fn get_or_load(&self, source: &dyn RecordSource) -> Result<Arc<GraduateDataset>> {
        let key = source.identity();
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("dataset cache lock poisoned"))?;

        if let Some(ds) = entries.get(&key) {
            log::debug!("dataset cache hit for {key}");
            return Ok(Arc::clone(ds));
        }

        let ds = Arc::new(source.load_dataset()?);
        log::info!(
            "Loaded {} records ({} majors) from {key}",
            ds.len(),
            ds.majors.len()
        );
        entries.insert(key, Arc::clone(&ds));
        Ok(ds)
    }

    pub fn contains(&self, source: &dyn RecordSource) -> bool {
        self.entries
            .lock()
            .map(|e| e.contains_key(&source.identity()))
            .unwrap_or(false)
    }

    /// Drop every entry. Only an explicit reload should call this.
    pub fn clear(&self) -> Result<()> {
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("dataset cache lock poisoned"))?
            .clear();
        log::debug!("dataset cache cleared");
        Ok(())
    }
}
