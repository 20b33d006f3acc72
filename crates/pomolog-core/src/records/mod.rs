//! The activity log: record type, store, export views and import merge.

mod export;
mod import;
mod record;
mod store;

pub use export::{
    all_file_name, build_csv, build_day_document, day_file_name, write_export, ExportPayload,
    CSV_HEADER, EXPORT_SCHEMA,
};
pub use import::{read_sources, ImportSource};
pub use record::Record;
pub use store::{MergeSummary, RecordStore};

use std::path::PathBuf;

use crate::error::Result;

impl RecordStore {
    /// Read the given files and merge them. Unreadable files count as
    /// unparsed sources.
    pub async fn import_files(&mut self, paths: &[PathBuf]) -> Result<MergeSummary> {
        let sources = read_sources(paths).await;
        self.import_merge(sources)
    }
}
