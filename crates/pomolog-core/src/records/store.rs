//! Durable, append-only activity log.
//!
//! The log is a mapping from record id to [`Record`], kept materialized as a
//! sequence sorted by start instant. Every mutation writes the whole
//! sequence back under [`RECORDS_KEY`] before it becomes visible in memory.

use std::collections::{BTreeMap, HashSet};

use super::import::{self, ImportSource};
use super::record::Record;
use crate::error::Result;
use crate::format::{self, Locale, Zone};
use crate::storage::{self, SharedStore, RECORDS_KEY};

/// Outcome of an import batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MergeSummary {
    /// Sources offered.
    pub sources: usize,
    /// Sources that parsed as a record sequence or export payload.
    pub parsed: usize,
    /// Records not previously in the log.
    pub added: usize,
    /// Log size after the merge.
    pub total: usize,
}

pub struct RecordStore {
    store: SharedStore,
    device_id: String,
    zone: Zone,
    locale: Locale,
    records: Vec<Record>,
    ids: HashSet<String>,
}

impl RecordStore {
    /// Open the log, resolving this installation's device id.
    ///
    /// An unparsable log is treated as empty.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read, or if a new device id
    /// cannot be persisted.
    pub fn open(store: SharedStore, zone: Zone, locale: Locale) -> Result<Self> {
        let device_id = storage::device_id(store.as_ref())?;
        let records = match store.load(RECORDS_KEY)? {
            None => Vec::new(),
            Some(raw) => serde_json::from_str::<Vec<Record>>(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "record log is corrupt, starting empty");
                Vec::new()
            }),
        };
        let (records, ids) = normalize(records);
        tracing::debug!(count = records.len(), "record log loaded");
        Ok(Self {
            store,
            device_id,
            zone,
            locale,
            records,
            ids,
        })
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Build a record for a run on this device.
    pub fn new_record(&self, start_ms: i64, end_ms: i64, note: &str) -> Record {
        Record::from_run(&self.device_id, start_ms, end_ms, note, self.zone, self.locale)
    }

    /// Insert `record` unless its id is already present.
    ///
    /// Returns whether the record was added.
    pub fn append(&mut self, record: Record) -> Result<bool> {
        if self.contains(&record.id) {
            tracing::debug!(id = %record.id, "record already present");
            return Ok(false);
        }
        let pos = self
            .records
            .partition_point(|r| r.sort_key() <= record.sort_key());
        let id = record.id.clone();
        self.records.insert(pos, record);
        if let Err(e) = persist(&self.store, &self.records) {
            self.records.remove(pos);
            return Err(e);
        }
        self.ids.insert(id);
        Ok(true)
    }

    /// All records, ascending by start.
    pub fn list_all(&self) -> &[Record] {
        &self.records
    }

    /// Records that started on `date_key`, ascending by start.
    pub fn list_by_date(&self, date_key: &str) -> Vec<&Record> {
        self.records
            .iter()
            .filter(|r| r.date_key == date_key)
            .collect()
    }

    /// Records that started on the local date containing `now_ms`.
    pub fn list_today(&self, now_ms: i64) -> Vec<&Record> {
        self.list_by_date(&format::date_key(now_ms, self.zone))
    }

    /// Partition the log by date; keys ascend and each day ascends by start.
    pub fn group_by_date(&self) -> BTreeMap<&str, Vec<&Record>> {
        let mut groups: BTreeMap<&str, Vec<&Record>> = BTreeMap::new();
        for record in &self.records {
            groups.entry(record.date_key.as_str()).or_default().push(record);
        }
        groups
    }

    /// Merge records from several sources into the log.
    ///
    /// Malformed sources are skipped individually; the union of what did
    /// parse is always persisted. Records sharing an id are duplicates, so
    /// the copy already in the log is kept.
    pub fn import_merge<I>(&mut self, sources: I) -> Result<MergeSummary>
    where
        I: IntoIterator,
        I::Item: Into<ImportSource>,
    {
        let mut merged = self.records.clone();
        let mut ids = self.ids.clone();
        let mut summary = MergeSummary {
            sources: 0,
            parsed: 0,
            added: 0,
            total: 0,
        };

        for (index, source) in sources.into_iter().enumerate() {
            summary.sources += 1;
            let incoming = match import::parse_source(source.into()) {
                Ok(incoming) => incoming,
                Err(e) => {
                    tracing::warn!(source = index, error = %e, "skipping import source");
                    continue;
                }
            };
            summary.parsed += 1;
            for record in incoming {
                if ids.insert(record.id.clone()) {
                    merged.push(record);
                    summary.added += 1;
                }
            }
        }

        merged.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        persist(&self.store, &merged)?;
        summary.total = merged.len();
        self.records = merged;
        self.ids = ids;
        tracing::info!(
            parsed = summary.parsed,
            sources = summary.sources,
            added = summary.added,
            total = summary.total,
            "import merged"
        );
        Ok(summary)
    }
}

fn persist(store: &SharedStore, records: &[Record]) -> Result<()> {
    let json = serde_json::to_string(records)?;
    store.save(RECORDS_KEY, &json)?;
    tracing::debug!(count = records.len(), "record log persisted");
    Ok(())
}

/// Drop id-less entries and duplicates, then sort.
fn normalize(records: Vec<Record>) -> (Vec<Record>, HashSet<String>) {
    let mut ids = HashSet::with_capacity(records.len());
    let mut kept: Vec<Record> = records
        .into_iter()
        .filter(|r| !r.id.is_empty() && ids.insert(r.id.clone()))
        .collect();
    kept.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    (kept, ids)
}
