use crate::error::IngestError;
use std::io::Read;
use std::path::Path;

/// The uniform row set every source format is reduced to.
///
/// Cells are kept as text; the loader decides how to read them. Column order is
/// preserved because the classifier resolves ties by position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Position of `name` among the headers, compared after trimming.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name.trim())
    }

    /// The cell at (`row`, `column`), `None` for short rows.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    /// Reads a headed CSV file.
    pub fn from_csv_path(path: &Path) -> Result<Self, IngestError> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    /// Reads headed CSV from any reader. Ragged rows are tolerated.
    ///
    /// Cells are decoded lossily, so a stray non-UTF-8 byte only spoils its own
    /// cell and the loader skips that row like any other unparsable one.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, IngestError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader
            .byte_headers()?
            .iter()
            .map(|h| decode_cell(h).trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();
        for record in csv_reader.byte_records() {
            let record = record?;
            rows.push(record.iter().map(decode_cell).collect());
        }

        tracing::debug!(rows = rows.len(), "Read CSV table");
        Ok(Self { headers, rows })
    }
}

fn decode_cell(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_headers_and_ragged_rows() {
        let raw = "\u{feff}data,price,market_cap\n2024-01-01, 10 ,100\n2024-01-02,11\n";
        let table = RawTable::from_csv_reader(raw.as_bytes()).unwrap();
        assert_eq!(table.headers, vec!["data", "price", "market_cap"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.cell(0, 1), Some("10"));
        assert_eq!(table.cell(1, 2), None);
        assert_eq!(table.column_index("market_cap"), Some(2));
    }

    #[test]
    fn invalid_utf8_spoils_only_its_cell() {
        let raw = b"data,price\n2024-01-01,10\n2024-01-02,\xFF\xFE\n2024-01-03,12\n";
        let table = RawTable::from_csv_reader(&raw[..]).unwrap();
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.cell(0, 1), Some("10"));
        assert_eq!(table.cell(1, 1), Some("\u{fffd}\u{fffd}"));
        assert_eq!(table.cell(2, 1), Some("12"));
    }
}
