//! CSV reading into the core's [`RawTable`].

use std::io::Read;
use std::path::Path;

use health_insights_core::RawTable;

use crate::error::{ServerError, ServerResult};

/// Read a headed CSV document. Rows may be ragged; missing trailing cells
/// are treated as empty.
pub fn read_table<R: Read>(reader: R) -> ServerResult<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ServerError::BadRequest("CSV file has no header row".into()));
    }
    let mut table = RawTable::new(headers.iter());
    for record in reader.records() {
        let record = record?;
        let mut cells: Vec<&str> = record.iter().collect();
        cells.resize(table.headers.len(), "");
        table.push_row(cells);
    }
    Ok(table)
}

pub fn read_table_from_bytes(bytes: &[u8]) -> ServerResult<RawTable> {
    read_table(bytes)
}

pub fn read_table_from_path(path: &Path) -> ServerResult<RawTable> {
    let file = std::fs::File::open(path)
        .map_err(|e| ServerError::BadRequest(format!("cannot open {}: {e}", path.display())))?;
    read_table(file)
}

/// First non-empty `user_id` cell, if the column exists.
pub fn first_user_id(table: &RawTable) -> Option<String> {
    let column = table.column_index("user_id")?;
    (0..table.row_count()).find_map(|row| table.cell(row, column).map(str::to_string))
}
