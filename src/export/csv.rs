use anyhow::{Context, Result};

use crate::data::filter::View;
use crate::data::loader::REQUIRED_COLUMNS;
use crate::data::model::{format_timestamp, Dataset};

/// Render a filtered view back to CSV bytes, canonical header first.
///
/// Timestamps use the fixed export pattern; sentinel timestamps become
/// empty cells, so a re-import coerces them straight back to the sentinel.
pub fn write_csv(dataset: &Dataset, view: &View) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buf);
        writer
            .write_record(REQUIRED_COLUMNS)
            .context("writing CSV header")?;

        for rec in view.records(dataset) {
            writer
                .write_record(&[
                    rec.username.as_str(),
                    rec.full_name.as_str(),
                    rec.class_name.as_str(),
                    rec.website.as_str(),
                    &rec.visits_to_website.to_string(),
                    &format_timestamp(rec.last_visit_time),
                    &rec.total_visits.to_string(),
                ])
                .context("writing CSV row")?;
        }
        writer.flush().context("flushing CSV writer")?;
    }
    Ok(buf)
}
