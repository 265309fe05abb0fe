use chrono::{NaiveDate, NaiveDateTime};

// ---------------------------------------------------------------------------
// VisitRecord – one row of the visit log
// ---------------------------------------------------------------------------

/// A single normalized visit-log row.
///
/// Every field is always present after loading: text fields default to the
/// empty string, counts to zero, and an unparseable visit time becomes
/// `None` (the null-sentinel timestamp).
#[derive(Debug, Clone, PartialEq)]
pub struct VisitRecord {
    /// Student identifier (`Username_TRNO`).
    pub username: String,
    /// Display name (`Student_FullName`).
    pub full_name: String,
    /// Class grouping key (`Student_Class`).
    pub class_name: String,
    /// Visited site grouping key (`Website_Address`).
    pub website: String,
    /// Visit count for this site (`Visits_to_Website`).
    pub visits_to_website: i64,
    /// Last visit timestamp; `None` when the source value was unparseable.
    pub last_visit_time: Option<NaiveDateTime>,
    /// Overall visit count for this student (`Total_Visits`).
    pub total_visits: i64,
}

// ---------------------------------------------------------------------------
// Lenient field coercion
// ---------------------------------------------------------------------------

/// Timestamp pattern used for every exported / wire-visible visit time.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];

/// Parse a count cell. Policy: anything that is not a number becomes 0.
/// Fractional values are truncated toward zero.
pub fn parse_count(raw: &str) -> i64 {
    let s = raw.trim();
    if s.is_empty() {
        return 0;
    }
    if let Ok(n) = s.parse::<i64>() {
        return n;
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() => f.trunc() as i64,
        _ => 0,
    }
}

/// Parse a timestamp cell leniently. Tries full datetime patterns first,
/// then date-only patterns (midnight). Policy: unparseable input becomes
/// `None` rather than an error.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Render a visit time in [`TIMESTAMP_FORMAT`]; the sentinel renders as "".
pub fn format_timestamp(ts: Option<NaiveDateTime>) -> String {
    match ts {
        Some(dt) => dt.format(TIMESTAMP_FORMAT).to_string(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded visit log
// ---------------------------------------------------------------------------

/// The full in-memory dataset from the most recent load.
///
/// Records keep their source order and are never mutated after loading;
/// a new upload replaces the whole dataset.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// All rows, in input order.
    pub records: Vec<VisitRecord>,
}

impl Dataset {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted distinct class names, for filter dropdowns.
    pub fn classes(&self) -> Vec<String> {
        let mut classes: Vec<String> = self
            .records
            .iter()
            .map(|r| r.class_name.clone())
            .filter(|c| !c.is_empty())
            .collect();
        classes.sort();
        classes.dedup();
        classes
    }
}

// ---------------------------------------------------------------------------
// DatasetBuilder – batch accumulator used by the loader
// ---------------------------------------------------------------------------

/// Accumulates normalized batches in input order.
///
/// The loader coerces one bounded batch of raw rows at a time and appends
/// it here, so only a single batch of raw CSV rows is alive at once.
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    records: Vec<VisitRecord>,
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one coerced batch; row order within and across batches is
    /// preserved.
    pub fn append_batch(&mut self, batch: Vec<VisitRecord>) {
        self.records.extend(batch);
    }

    /// Rows accumulated so far.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn finish(self) -> Dataset {
        Dataset {
            records: self.records,
        }
    }
}
