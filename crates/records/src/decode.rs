use tracing::debug;

use crate::{error::DecodeError, record::TicketRecord};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode a complete CSV export into records.
///
/// Ragged rows are tolerated: missing trailing cells are simply absent from
/// the record, surplus cells are keyed `field{N}` by their 1-based column.
/// Cells are trimmed and invalid UTF-8 is replaced. A body holding only a
/// header (or nothing at all) yields no records.
pub fn decode(bytes: &[u8]) -> Result<Vec<TicketRecord>, DecodeError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = reader.byte_records();
    let header: Vec<String> = match rows.next() {
        Some(row) => row
            .map_err(to_decode_error)?
            .iter()
            .map(cell_text)
            .collect(),
        None => return Ok(Vec::new()),
    };

    let mut records = Vec::new();
    for row in rows {
        let row = row.map_err(to_decode_error)?;
        if row.iter().all(|cell| cell.iter().all(u8::is_ascii_whitespace)) {
            continue;
        }
        let record: TicketRecord = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let column = header
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("field{}", i + 1));
                (column, cell_text(cell))
            })
            .collect();
        records.push(record);
    }

    debug!(
        columns = header.len(),
        records = records.len(),
        "decoded CSV export"
    );
    Ok(records)
}

fn cell_text(cell: &[u8]) -> String {
    String::from_utf8_lossy(cell).trim().to_string()
}

fn to_decode_error(source: csv::Error) -> DecodeError {
    let line = source.position().map(|p| p.line()).unwrap_or_default();
    DecodeError::Csv { line, source }
}
