//! CSV sink for term rows.
//!
//! The table always starts with the `ICD10CMCode,Term,Type` header, even when
//! no row is written.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::OutputResult;
use crate::models::TermRow;

/// Column names of the output table.
pub const CSV_HEADER: [&str; 3] = ["ICD10CMCode", "Term", "Type"];

/// Write rows as CSV to any writer. Returns the number of rows written.
pub fn write_terms<W: Write>(writer: W, rows: &[TermRow]) -> OutputResult<usize> {
    let mut csv_writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    csv_writer.write_record(CSV_HEADER)?;
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(rows.len())
}

/// Write rows to a UTF-8 CSV file, replacing it if present.
pub fn write_terms_csv(path: &Path, rows: &[TermRow]) -> OutputResult<usize> {
    let file = File::create(path)?;
    write_terms(file, rows)
}
