//! Export views of the record log.
//!
//! - Per-day document: a plain-text, markdown-flavoured numbered list
//! - Structured export: a self-describing JSON payload for round-trip import
//! - Tabular export: CSV with a fixed column order

use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::record::Record;
use super::store::RecordStore;
use crate::error::Result;
use crate::format::{self, Locale};

/// Schema tag written into every structured export.
pub const EXPORT_SCHEMA: &str = "pomodoro_local_v1";

pub const CSV_HEADER: [&str; 9] = [
    "id",
    "device_id",
    "date_key",
    "weekday",
    "start_ms",
    "end_ms",
    "start_hm",
    "end_hm",
    "note",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportPayload {
    pub schema: String,
    pub exported_at_ms: i64,
    pub device_id: String,
    pub records: Vec<Record>,
}

/// Render one day's records. `records` must already be that day's, ascending.
pub fn build_day_document(date_key: &str, records: &[&Record], locale: Locale) -> Result<String> {
    let weekday = format::weekday_name(date_key, locale)?;
    let mut out = match locale {
        Locale::En => format!("# {date_key} ({weekday})\n\n"),
        Locale::Zh => format!("# {date_key}（{weekday}）\n\n"),
    };
    if records.is_empty() {
        out.push_str(locale.no_records());
        out.push('\n');
        return Ok(out);
    }
    for (idx, record) in records.iter().enumerate() {
        let note = record.note.trim();
        let note = if note.is_empty() { locale.no_note() } else { note };
        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "{}. **{} - {}**  {}",
            idx + 1,
            record.start_hm,
            record.end_hm,
            note
        );
    }
    Ok(out)
}

/// Render records as CSV. The header is bare; every row field, `note`
/// included, is quoted with internal quotes doubled.
pub fn build_csv(records: &[Record]) -> Result<String> {
    let mut header = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    header.write_record(CSV_HEADER)?;
    let head = header.into_inner().map_err(|e| e.into_error())?;

    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(head);
    for r in records {
        let start_ms = r.start_ms.to_string();
        let end_ms = r.end_ms.to_string();
        wtr.write_record([
            r.id.as_str(),
            r.device_id.as_str(),
            r.date_key.as_str(),
            r.weekday.as_str(),
            start_ms.as_str(),
            end_ms.as_str(),
            r.start_hm.as_str(),
            r.end_hm.as_str(),
            r.note.as_str(),
        ])?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e).into())
}

/// `activity_<date>.md`
pub fn day_file_name(date_key: &str) -> String {
    format!("activity_{date_key}.md")
}

/// `pomodoro_all_<date>.<ext>`
pub fn all_file_name(today_key: &str, ext: &str) -> String {
    format!("pomodoro_all_{today_key}.{ext}")
}

impl RecordStore {
    /// Human-readable document for one day.
    ///
    /// # Errors
    /// Fails if `date_key` is not a `YYYY-MM-DD` date.
    pub fn export_day_document(&self, date_key: &str) -> Result<String> {
        build_day_document(date_key, &self.list_by_date(date_key), self.locale())
    }

    /// Structured payload of the whole log, stamped with `exported_at_ms`.
    pub fn export_all_structured(&self, exported_at_ms: i64) -> ExportPayload {
        ExportPayload {
            schema: EXPORT_SCHEMA.to_string(),
            exported_at_ms,
            device_id: self.device_id().to_string(),
            records: self.list_all().to_vec(),
        }
    }

    /// Pretty-printed JSON of [`RecordStore::export_all_structured`].
    pub fn export_all_json(&self, exported_at_ms: i64) -> Result<String> {
        Ok(serde_json::to_string_pretty(
            &self.export_all_structured(exported_at_ms),
        )?)
    }

    /// Flat CSV table of the whole log.
    pub fn export_all_table(&self) -> Result<String> {
        build_csv(self.list_all())
    }
}

/// Write an export document to `path`, creating parent directories.
pub async fn write_export(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, contents).await?;
    tracing::info!(path = %path.display(), bytes = contents.len(), "export written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Zone;

    const START: i64 = 1_792_397_100_000; // 2026-10-19T08:05:00Z

    fn rec(offset_min: i64, note: &str) -> Record {
        let start = START + offset_min * 60_000;
        Record::from_run("dev", start, start + 25 * 60_000, note, Zone::utc(), Locale::En)
    }

    #[test]
    fn day_document_lists_numbered_entries() {
        let a = rec(0, "write spec");
        let b = rec(30, "");
        let doc = build_day_document("2026-10-19", &[&a, &b], Locale::En).unwrap();
        assert_eq!(
            doc,
            "# 2026-10-19 (Monday)\n\n\
             1. **08:05 - 08:30**  write spec\n\
             2. **08:35 - 09:00**  (no note)\n"
        );
    }

    #[test]
    fn day_document_empty_marker() {
        let doc = build_day_document("2026-10-19", &[], Locale::En).unwrap();
        assert_eq!(doc, "# 2026-10-19 (Monday)\n\n(no records)\n");

        let doc = build_day_document("2026-10-19", &[], Locale::Zh).unwrap();
        assert_eq!(doc, "# 2026-10-19（星期一）\n\n（无记录）\n");
    }

    #[test]
    fn day_document_rejects_bad_date() {
        assert!(build_day_document("yesterday", &[], Locale::En).is_err());
    }

    #[test]
    fn csv_quotes_delimiters_and_quotes() {
        let csv = build_csv(&[rec(0, "a,b"), rec(30, "say \"hi\"")]).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "id,device_id,date_key,weekday,start_ms,end_ms,start_hm,end_hm,note"
        );
        assert!(lines[1].ends_with(",\"08:05\",\"08:30\",\"a,b\""));
        assert!(lines[2].ends_with(",\"08:35\",\"09:00\",\"say \"\"hi\"\"\""));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn csv_quotes_plain_and_empty_notes() {
        let csv = build_csv(&[rec(0, "plain"), rec(30, "")]).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert!(lines[1].ends_with(",\"plain\""));
        assert!(lines[2].ends_with(",\"\""));
        assert!(lines[1].starts_with("\"dev_"));
    }

    #[test]
    fn csv_reads_back_with_csv_reader() {
        let csv = build_csv(&[rec(0, "line one\nline two")]).unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][8], "line one\nline two");
        assert_eq!(&rows[0][4], START.to_string());
    }

    #[test]
    fn file_names() {
        assert_eq!(day_file_name("2026-10-19"), "activity_2026-10-19.md");
        assert_eq!(all_file_name("2026-10-19", "csv"), "pomodoro_all_2026-10-19.csv");
    }

    #[tokio::test]
    async fn write_export_creates_parents() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out/nested/all.json");
        write_export(&path, "{}").await.unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "{}");
    }
}
