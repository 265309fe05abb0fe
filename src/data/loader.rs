use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use thiserror::Error;

use super::model::{parse_count, parse_timestamp, Dataset, DatasetBuilder, VisitRecord};

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Rows coerced per batch. Bounds how much raw CSV data is alive at once.
pub const DEFAULT_BATCH_ROWS: usize = 50_000;

/// Canonical column names, all required. A load fails when any of these is
/// still absent after header normalization.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "Username_TRNO",
    "Student_FullName",
    "Student_Class",
    "Website_Address",
    "Visits_to_Website",
    "Last_Visit_Time",
    "Total_Visits",
];

/// Known header variants seen in exported logs, normalized → canonical.
const COLUMN_SYNONYMS: &[(&str, &str)] = &[
    ("Visits__to_Website", "Visits_to_Website"),
    ("Visits__To__Website", "Visits_to_Website"),
    ("Total_Visits_By_User", "Total_Visits"),
];

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to open file: {0}")]
    Io(#[from] std::io::Error),
}

/// Trim, collapse spaces to underscores, then resolve known synonyms.
fn normalize_header(raw: &str) -> String {
    let name = raw.trim().replace(' ', "_");
    for (variant, canonical) in COLUMN_SYNONYMS {
        if name == *variant {
            return (*canonical).to_string();
        }
    }
    name
}

/// Positions of the required columns in the (normalized) header row.
struct ColumnIndex {
    username: usize,
    full_name: usize,
    class_name: usize,
    website: usize,
    visits_to_website: usize,
    last_visit_time: usize,
    total_visits: usize,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord) -> Result<Self, SchemaError> {
        let names: Vec<String> = headers.iter().map(normalize_header).collect();
        let find = |canonical: &str| {
            names
                .iter()
                .position(|n| n == canonical)
                .ok_or_else(|| SchemaError::MissingColumn(canonical.to_string()))
        };

        Ok(ColumnIndex {
            username: find("Username_TRNO")?,
            full_name: find("Student_FullName")?,
            class_name: find("Student_Class")?,
            website: find("Website_Address")?,
            visits_to_website: find("Visits_to_Website")?,
            last_visit_time: find("Last_Visit_Time")?,
            total_visits: find("Total_Visits")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a visit-log CSV from a file path.
pub fn load_csv_path(path: &Path) -> Result<Dataset, SchemaError> {
    let file = File::open(path)?;
    load_csv(file)
}

/// Load a visit-log CSV from any reader with the default batch size.
pub fn load_csv<R: Read>(source: R) -> Result<Dataset, SchemaError> {
    load_csv_batched(source, DEFAULT_BATCH_ROWS)
}

/// Load a visit-log CSV, coercing rows in batches of `batch_rows`.
///
/// The header is normalized and validated up front; every batch is then
/// coerced with the same column mapping and appended in input order, so
/// row order is preserved across batch boundaries.
pub fn load_csv_batched<R: Read>(source: R, batch_rows: usize) -> Result<Dataset, SchemaError> {
    // `flexible` lets short rows through; missing cells coerce to defaults.
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(source);

    let headers = reader.headers()?.clone();
    let cols = ColumnIndex::resolve(&headers)?;

    let batch_rows = batch_rows.max(1);
    let mut builder = DatasetBuilder::new();
    let mut batch: Vec<StringRecord> = Vec::new();

    for result in reader.records() {
        batch.push(result?);
        if batch.len() >= batch_rows {
            flush_batch(&mut builder, &cols, &mut batch);
        }
    }
    flush_batch(&mut builder, &cols, &mut batch);

    Ok(builder.finish())
}

fn flush_batch(builder: &mut DatasetBuilder, cols: &ColumnIndex, batch: &mut Vec<StringRecord>) {
    if batch.is_empty() {
        return;
    }
    let coerced = batch.drain(..).map(|rec| coerce_row(cols, &rec)).collect();
    builder.append_batch(coerced);
}

/// Coerce one raw row. Never fails: bad cells degrade to field defaults.
fn coerce_row(cols: &ColumnIndex, record: &StringRecord) -> VisitRecord {
    let cell = |idx: usize| record.get(idx).unwrap_or("");

    VisitRecord {
        username: cell(cols.username).to_string(),
        full_name: cell(cols.full_name).to_string(),
        class_name: cell(cols.class_name).to_string(),
        website: cell(cols.website).to_string(),
        visits_to_website: parse_count(cell(cols.visits_to_website)),
        last_visit_time: parse_timestamp(cell(cols.last_visit_time)),
        total_visits: parse_count(cell(cols.total_visits)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAN_CSV: &str = "\
Username_TRNO,Student_FullName,Student_Class,Website_Address,Visits_to_Website,Last_Visit_Time,Total_Visits
u001,Ada Moreno,10A,math.example.org,3,2024-03-01 10:00:00,12
u002,Ben Okafor,10B,news.example.com,5,2024-03-02 09:30:00,20
";

    #[test]
    fn loads_clean_csv() {
        let dataset = load_csv(CLEAN_CSV.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 2);
        let first = &dataset.records[0];
        assert_eq!(first.username, "u001");
        assert_eq!(first.full_name, "Ada Moreno");
        assert_eq!(first.website, "math.example.org");
        assert_eq!(first.visits_to_website, 3);
        assert_eq!(first.total_visits, 12);
        assert!(first.last_visit_time.is_some());
    }

    #[test]
    fn normalizes_spaced_headers_and_synonyms() {
        let csv = "\
 Username TRNO ,Student FullName,Student Class,Website Address,Visits  to Website,Last Visit Time,Total Visits By User
u001,Ada Moreno,10A,math.example.org,3,2024-03-01,12
";
        let dataset = load_csv(csv.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.records[0].visits_to_website, 3);
        assert_eq!(dataset.records[0].total_visits, 12);
    }

    #[test]
    fn second_visits_variant_maps_to_canonical() {
        let csv = "\
Username_TRNO,Student_FullName,Student_Class,Website_Address,Visits  To  Website,Last_Visit_Time,Total_Visits
u001,Ada Moreno,10A,math.example.org,7,2024-03-01,12
";
        let dataset = load_csv(csv.as_bytes()).unwrap();
        assert_eq!(dataset.records[0].visits_to_website, 7);
    }

    #[test]
    fn missing_column_fails_with_its_name() {
        let csv = "\
Username_TRNO,Student_FullName,Student_Class,Visits_to_Website,Last_Visit_Time,Total_Visits
u001,Ada Moreno,10A,3,2024-03-01,12
";
        let err = load_csv(csv.as_bytes()).unwrap_err();
        match err {
            SchemaError::MissingColumn(name) => assert_eq!(name, "Website_Address"),
            other => panic!("expected MissingColumn, got {other}"),
        }
    }

    #[test]
    fn bad_cells_degrade_to_defaults() {
        let csv = "\
Username_TRNO,Student_FullName,Student_Class,Website_Address,Visits_to_Website,Last_Visit_Time,Total_Visits
u001,Ada Moreno,10A,math.example.org,lots,whenever,
";
        let dataset = load_csv(csv.as_bytes()).unwrap();
        let rec = &dataset.records[0];
        assert_eq!(rec.visits_to_website, 0);
        assert_eq!(rec.last_visit_time, None);
        assert_eq!(rec.total_visits, 0);
    }

    #[test]
    fn short_rows_fill_with_defaults() {
        let csv = "\
Username_TRNO,Student_FullName,Student_Class,Website_Address,Visits_to_Website,Last_Visit_Time,Total_Visits
u001,Ada Moreno
";
        let dataset = load_csv(csv.as_bytes()).unwrap();
        let rec = &dataset.records[0];
        assert_eq!(rec.username, "u001");
        assert_eq!(rec.class_name, "");
        assert_eq!(rec.visits_to_website, 0);
        assert_eq!(rec.last_visit_time, None);
    }

    #[test]
    fn batching_preserves_row_order() {
        let mut csv = String::from(
            "Username_TRNO,Student_FullName,Student_Class,Website_Address,Visits_to_Website,Last_Visit_Time,Total_Visits\n",
        );
        for i in 0..7 {
            csv.push_str(&format!("u{i},Name {i},10A,site{i}.example.org,{i},2024-03-01,{i}\n"));
        }

        let dataset = load_csv_batched(csv.as_bytes(), 3).unwrap();
        assert_eq!(dataset.len(), 7);
        for (i, rec) in dataset.records.iter().enumerate() {
            assert_eq!(rec.username, format!("u{i}"));
        }
    }
}
