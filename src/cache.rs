//! Process wide memo of analyzed record layouts.

use std::{
    collections::HashMap,
    sync::{Arc, OnceLock},
};

use log::debug;
use parking_lot::Mutex;

use crate::{compiled::CompiledRecord, errors::SchemaError, record::RecordType, schema};

/// Analyzed layouts keyed by record type, with hit statistics.
///
/// Analysis runs outside the lock because it recurses into the cache for base and nested
/// records. When two threads analyze the same type at once, the first layout stored wins.
#[derive(Debug, Default)]
pub struct SchemaCache {
    state: Mutex<CacheState>,
}

#[derive(Debug, Default)]
struct CacheState {
    layouts: HashMap<RecordType, Arc<CompiledRecord>>,
    lookups: u64,
    hits: u64,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache used by readers and writers that are not given one.
    pub fn global() -> &'static SchemaCache {
        static GLOBAL: OnceLock<SchemaCache> = OnceLock::new();
        GLOBAL.get_or_init(SchemaCache::new)
    }

    /// Returns the layout of `record_type`, analyzing it on first use.
    pub fn get_or_build(&self, record_type: RecordType) -> Result<Arc<CompiledRecord>, SchemaError> {
        self.resolve(record_type, &mut Vec::new())
    }

    pub(crate) fn resolve(
        &self,
        record_type: RecordType,
        path: &mut Vec<RecordType>,
    ) -> Result<Arc<CompiledRecord>, SchemaError> {
        {
            let mut state = self.state.lock();
            state.lookups += 1;
            if let Some(layout) = state.layouts.get(&record_type).cloned() {
                state.hits += 1;
                return Ok(layout);
            }
        }

        if path.contains(&record_type) {
            return Err(SchemaError::RecursiveLayout {
                record: record_type.name(),
            });
        }

        debug!("analyzing {}", record_type);
        path.push(record_type);
        let analyzed = schema::analyze_in(record_type, self, path);
        path.pop();
        let layout = Arc::new(analyzed?);

        let mut state = self.state.lock();
        Ok(state.layouts.entry(record_type).or_insert(layout).clone())
    }

    /// Fraction of lookups answered from the cache, or `None` before the first lookup.
    pub fn hit_rate(&self) -> Option<f64> {
        let state = self.state.lock();
        (state.lookups > 0).then(|| state.hits as f64 / state.lookups as f64)
    }

    /// Drops every layout and the hit statistics.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.layouts.clear();
        state.lookups = 0;
        state.hits = 0;
        debug!("schema cache reset");
    }

    /// Number of cached layouts.
    pub fn len(&self) -> usize {
        self.state.lock().layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
