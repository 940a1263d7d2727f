//! Where the sheet comes from, and the per-session snapshot cache.
//!
//! A `TableSource` hands back the raw header row and string cells. The
//! loader does all typing. `SourceCache` loads once and keeps the result
//! until someone explicitly asks for a refresh.

use crate::error::{DashboardError, Result};
use crate::loader::load_and_clean;
use crate::types::Dataset;
use calamine::{open_workbook_auto, Data, DataType, Reader};
use csv::ReaderBuilder;
use once_cell::sync::OnceCell;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Header row plus string cells; empty text means "no value".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub trait TableSource: Send {
    fn fetch(&self) -> Result<RawTable>;

    /// Human-readable origin used in log lines.
    fn describe(&self) -> String;
}

/// A CSV export of the sheet.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvSource { path: path.into() }
    }
}

impl TableSource for CsvSource {
    fn fetch(&self) -> Result<RawTable> {
        let file = std::fs::File::open(&self.path)?;
        read_csv_table(file)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

pub fn read_csv_table<R: Read>(reader: R) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(RawTable { headers, rows })
}

/// One named sheet of an xlsx/xls/ods workbook.
#[derive(Debug, Clone)]
pub struct WorkbookSource {
    path: PathBuf,
    sheet: String,
}

impl WorkbookSource {
    pub fn new(path: impl Into<PathBuf>, sheet: impl Into<String>) -> Self {
        WorkbookSource {
            path: path.into(),
            sheet: sheet.into(),
        }
    }
}

impl TableSource for WorkbookSource {
    fn fetch(&self) -> Result<RawTable> {
        let mut workbook = open_workbook_auto(&self.path)?;
        if !workbook.sheet_names().iter().any(|s| s == &self.sheet) {
            return Err(DashboardError::SheetNotFound(self.sheet.clone()));
        }
        let range = workbook.worksheet_range(&self.sheet)?;
        let mut rows = range.rows();
        let headers = rows
            .next()
            .map(|row| row.iter().map(|c| cell_text(c).trim().to_string()).collect())
            .unwrap_or_default();
        let rows = rows
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        Ok(RawTable { headers, rows })
    }

    fn describe(&self) -> String {
        format!("{} [{}]", self.path.display(), self.sheet)
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 {
                format!("{:.0}", f)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

/// Pick a source implementation from the file extension.
pub fn open_source(path: &Path, sheet: &str) -> Result<Box<dyn TableSource>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("csv") => Ok(Box::new(CsvSource::new(path))),
        Some("xlsx" | "xlsm" | "xlsb" | "xls" | "ods") => {
            Ok(Box::new(WorkbookSource::new(path, sheet)))
        }
        _ => Err(DashboardError::UnsupportedSource(path.to_path_buf())),
    }
}

/// Lazily loaded, session-scoped snapshot of the source.
pub struct SourceCache {
    source: Box<dyn TableSource>,
    snapshot: OnceCell<Arc<Dataset>>,
}

impl SourceCache {
    pub fn new(source: Box<dyn TableSource>) -> Self {
        SourceCache {
            source,
            snapshot: OnceCell::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot.get().is_some()
    }

    /// Returns the cached dataset, loading it on first use.
    pub fn snapshot(&self) -> Result<Arc<Dataset>> {
        self.snapshot
            .get_or_try_init(|| {
                info!(source = %self.source.describe(), "loading source table");
                let raw = self.source.fetch()?;
                load_and_clean(&raw).map(Arc::new)
            })
            .cloned()
    }

    /// Drop the cached snapshot and load again.
    pub fn refresh(&mut self) -> Result<Arc<Dataset>> {
        if self.snapshot.take().is_some() {
            debug!(source = %self.source.describe(), "snapshot invalidated");
        }
        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::parse_date_safe;
    use calamine::{CellErrorType, ExcelDateTime, ExcelDateTimeType};
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        fetches: Arc<AtomicUsize>,
    }

    impl TableSource for CountingSource {
        fn fetch(&self) -> Result<RawTable> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(RawTable {
                headers: vec!["日期".into(), "ASIN".into()],
                rows: vec![vec!["2024-01-01".into(), "B0001".into()]],
            })
        }

        fn describe(&self) -> String {
            "memory".into()
        }
    }

    #[test]
    fn snapshot_loads_once_until_refresh() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let mut cache = SourceCache::new(Box::new(CountingSource {
            fetches: fetches.clone(),
        }));
        assert!(!cache.is_loaded());

        let first = cache.snapshot().unwrap();
        let second = cache.snapshot().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetches.load(Ordering::SeqCst), 1);

        let refreshed = cache.refresh().unwrap();
        assert!(!Arc::ptr_eq(&first, &refreshed));
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn csv_reader_strips_bom_from_first_header() {
        let data = "\u{feff}日期,ASIN\n2024-01-01, B0001 \n";
        let table = read_csv_table(data.as_bytes()).unwrap();
        assert_eq!(table.headers, vec!["日期", "ASIN"]);
        assert_eq!(table.rows, vec![vec!["2024-01-01", "B0001"]]);
    }

    fn workbook_fixture() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/daily.xlsx")
    }

    #[test]
    fn cell_text_renders_numbers_blanks_and_errors() {
        assert_eq!(cell_text(&Data::Float(100.0)), "100");
        assert_eq!(cell_text(&Data::Float(0.125)), "0.125");
        assert_eq!(cell_text(&Data::Int(-7)), "-7");
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::Error(CellErrorType::Div0)), "");
        assert_eq!(cell_text(&Data::Bool(true)), "TRUE");
        assert_eq!(cell_text(&Data::String("12.34%".into())), "12.34%");
    }

    #[test]
    fn workbook_dates_parse_back_to_the_same_day() {
        // 45292 is 2024-01-01 in the 1900 date system.
        let cell = Data::DateTime(ExcelDateTime::new(45292.0, ExcelDateTimeType::DateTime, false));
        let text = cell_text(&cell);
        assert_eq!(
            parse_date_safe(Some(&text)),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
    }

    #[test]
    fn workbook_sheet_is_read_as_text() {
        let table = WorkbookSource::new(workbook_fixture(), "源").fetch().unwrap();
        assert_eq!(
            table.headers,
            vec!["日期", "ASIN", "品名", "销量", "Sessions-Total", "ACOS"]
        );
        assert_eq!(table.rows.len(), 2);
        assert_eq!(parse_date_safe(Some(&table.rows[0][0])), NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(table.rows[0][3], "12");
        assert_eq!(table.rows[1][3], "0.5");
        assert_eq!(table.rows[1][5], "--");
    }

    #[test]
    fn missing_sheet_is_reported_by_name() {
        let err = WorkbookSource::new(workbook_fixture(), "Sheet9").fetch().unwrap_err();
        assert!(matches!(err, DashboardError::SheetNotFound(ref name) if name == "Sheet9"));
    }

    #[test]
    fn source_kind_follows_extension() {
        assert!(open_source(Path::new("data.CSV"), "源").is_ok());
        assert!(open_source(Path::new("data.xlsx"), "源").is_ok());
        assert!(matches!(
            open_source(Path::new("data.txt"), "源"),
            Err(DashboardError::UnsupportedSource(_))
        ));
    }
}
