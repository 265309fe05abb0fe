//! Tabular PDF export.
//!
//! Assembles the PDF object graph by hand (catalog, page tree, Type1
//! fonts, one content stream per page, xref table) instead of pulling in
//! a document crate. The layout mirrors the CSV export: a grey header
//! band with the canonical column names, then one grid row per record,
//! paginated across as many pages as needed.

use crate::data::filter::View;
use crate::data::loader::REQUIRED_COLUMNS;
use crate::data::model::{format_timestamp, Dataset, VisitRecord};

// A4 portrait, in points.
const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 36.0;
const ROW_HEIGHT: f32 = 12.0;
const FONT_SIZE: f32 = 7.0;

/// Column widths in points; one per canonical column, summing to less
/// than the printable width.
const COLUMN_WIDTHS: [f32; 7] = [60.0, 95.0, 40.0, 125.0, 52.0, 92.0, 46.0];

/// Render a filtered view as a paginated table PDF.
pub fn write_pdf(dataset: &Dataset, view: &View) -> Vec<u8> {
    let rows: Vec<&VisitRecord> = view.records(dataset).collect();
    let per_page = rows_per_page();
    let pages: Vec<&[&VisitRecord]> = if rows.is_empty() {
        vec![&[][..]]
    } else {
        rows.chunks(per_page).collect()
    };

    // Object layout: 1 catalog, 2 page tree, 3/4 fonts, then a
    // (page, contents) pair per page.
    let page_obj = |i: usize| 5 + 2 * i;
    let kids: Vec<String> = (0..pages.len()).map(|i| format!("{} 0 R", page_obj(i))).collect();

    let mut doc = PdfWriter::new();
    doc.add_object("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    doc.add_object(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids.join(" "),
        pages.len()
    ));
    doc.add_object("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string());
    doc.add_object("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold >>".to_string());

    for (i, page_rows) in pages.iter().enumerate() {
        doc.add_object(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
             /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
            page_obj(i) + 1
        ));
        doc.add_stream(&page_stream(page_rows));
    }

    doc.finish()
}

fn rows_per_page() -> usize {
    let usable = PAGE_HEIGHT - 2.0 * MARGIN;
    // One line of the grid is the header band.
    (usable / ROW_HEIGHT) as usize - 1
}

/// Content stream for one page: header band, grid, then cell text.
fn page_stream(rows: &[&VisitRecord]) -> String {
    let table_width: f32 = COLUMN_WIDTHS.iter().sum();
    let line_count = rows.len() + 1;
    let y_top = PAGE_HEIGHT - MARGIN;
    let y_bottom = y_top - line_count as f32 * ROW_HEIGHT;

    let mut s = String::new();

    // Header band.
    s.push_str(&format!(
        "0.55 g {MARGIN:.1} {:.1} {table_width:.1} {ROW_HEIGHT:.1} re f\n",
        y_top - ROW_HEIGHT
    ));

    // Grid.
    s.push_str("0 G 0.5 w\n");
    for i in 0..=line_count {
        let y = y_top - i as f32 * ROW_HEIGHT;
        s.push_str(&format!(
            "{MARGIN:.1} {y:.1} m {:.1} {y:.1} l\n",
            MARGIN + table_width
        ));
    }
    let mut x = MARGIN;
    for width in COLUMN_WIDTHS.iter().chain(std::iter::once(&0.0)) {
        s.push_str(&format!("{x:.1} {y_top:.1} m {x:.1} {y_bottom:.1} l\n"));
        x += width;
    }
    s.push_str("S\n");

    // Header text: bold, near-white on the grey band.
    let header_y = y_top - ROW_HEIGHT + 3.5;
    let mut x = MARGIN;
    for (title, width) in REQUIRED_COLUMNS.iter().zip(COLUMN_WIDTHS.iter()) {
        s.push_str(&text_op("F2", x + 2.0, header_y, "1 1 1", title, *width));
        x += width;
    }

    // Data rows.
    for (row_idx, rec) in rows.iter().enumerate() {
        let y = y_top - (row_idx + 2) as f32 * ROW_HEIGHT + 3.5;
        let cells = [
            rec.username.clone(),
            rec.full_name.clone(),
            rec.class_name.clone(),
            rec.website.clone(),
            rec.visits_to_website.to_string(),
            format_timestamp(rec.last_visit_time),
            rec.total_visits.to_string(),
        ];
        let mut x = MARGIN;
        for (cell, width) in cells.iter().zip(COLUMN_WIDTHS.iter()) {
            s.push_str(&text_op("F1", x + 2.0, y, "0 0 0", cell, *width));
            x += width;
        }
    }

    s
}

/// One positioned text-show operation, truncated to the column width.
fn text_op(font: &str, x: f32, y: f32, rgb: &str, text: &str, width: f32) -> String {
    let max_chars = ((width - 4.0) / (FONT_SIZE * 0.55)) as usize;
    format!(
        "BT /{font} {FONT_SIZE:.1} Tf {rgb} rg 1 0 0 1 {x:.1} {y:.1} Tm ({}) Tj ET\n",
        escape_text(text, max_chars)
    )
}

/// Escape PDF string delimiters and clamp to the Latin-1 range the Type1
/// base fonts cover.
fn escape_text(text: &str, max_chars: usize) -> String {
    let mut out = String::new();
    for c in text.chars().take(max_chars) {
        match c {
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\\' => out.push_str("\\\\"),
            c if (c as u32) < 256 => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Low-level object/xref assembly
// ---------------------------------------------------------------------------

struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        PdfWriter {
            buf: b"%PDF-1.4\n".to_vec(),
            offsets: Vec::new(),
        }
    }

    /// Append the next numbered object; object numbers are assigned in
    /// call order starting at 1.
    fn add_object(&mut self, body: String) -> usize {
        self.offsets.push(self.buf.len());
        let num = self.offsets.len();
        self.buf
            .extend_from_slice(format!("{num} 0 obj\n{body}\nendobj\n").as_bytes());
        num
    }

    fn add_stream(&mut self, content: &str) -> usize {
        self.add_object(format!(
            "<< /Length {} >>\nstream\n{content}endstream",
            content.len()
        ))
    }

    /// Write the xref table and trailer; object 1 is the catalog.
    fn finish(mut self) -> Vec<u8> {
        let xref_offset = self.buf.len();
        let count = self.offsets.len() + 1;
        let mut xref = format!("xref\n0 {count}\n0000000000 65535 f \n");
        for offset in &self.offsets {
            xref.push_str(&format!("{offset:010} 00000 n \n"));
        }
        self.buf.extend_from_slice(xref.as_bytes());
        self.buf.extend_from_slice(
            format!(
                "trailer\n<< /Size {count} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n"
            )
            .as_bytes(),
        );
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::load_csv;

    fn sample(rows: usize) -> Dataset {
        let mut csv = String::from(
            "Username_TRNO,Student_FullName,Student_Class,Website_Address,Visits_to_Website,Last_Visit_Time,Total_Visits\n",
        );
        for i in 0..rows {
            csv.push_str(&format!(
                "u{i:03},Name (Nr. {i}),10A,site{i}.example.org,{i},2024-03-01 10:00:00,{i}\n"
            ));
        }
        load_csv(csv.as_bytes()).unwrap()
    }

    #[test]
    fn produces_a_wellformed_shell() {
        let ds = sample(3);
        let bytes = write_pdf(&ds, &View::all(&ds));
        let text = String::from_utf8_lossy(&bytes);

        assert!(text.starts_with("%PDF-1.4"));
        assert!(text.trim_end().ends_with("%%EOF"));
        assert!(text.contains("/Count 1"));
        assert!(text.contains("xref"));
    }

    #[test]
    fn table_contains_escaped_cell_text() {
        let ds = sample(2);
        let bytes = write_pdf(&ds, &View::all(&ds));
        let text = String::from_utf8_lossy(&bytes);

        assert!(text.contains("(u001)"));
        assert!(text.contains("(site1.example.org)"));
        // Parentheses in the full name must be escaped in the stream.
        assert!(text.contains("\\(Nr. 1\\)"));
        assert!(text.contains("(Username_TRNO)"));
    }

    #[test]
    fn long_views_paginate() {
        let per_page = rows_per_page();
        let ds = sample(per_page + 5);
        let bytes = write_pdf(&ds, &View::all(&ds));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Count 2"));
    }

    #[test]
    fn empty_view_still_renders_a_header_page() {
        let ds = Dataset::default();
        let bytes = write_pdf(&ds, &View::all(&ds));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Count 1"));
        assert!(text.contains("(Total_Visits)"));
    }
}
