use crate::error::Result;
use crate::types::RawRow;
use csv::{ReaderBuilder, Trim};
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub parse_errors: usize,
}

/// Read every data row of a CSV file as header -> cell text.
///
/// Malformed rows are counted and skipped rather than failing the load; the
/// analysis decides later whether enough usable years remain.
pub fn load_rows(path: impl AsRef<Path>) -> Result<(Vec<RawRow>, LoadReport)> {
    let path = path.as_ref();
    debug!(path = %path.display(), "reading input CSV");
    let file = std::fs::File::open(path)?;
    read_rows(file)
}

/// Same as [`load_rows`] for any reader, e.g. an in-memory upload.
pub fn read_rows<R: Read>(reader: R) -> Result<(Vec<RawRow>, LoadReport)> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(reader);
    let mut report = LoadReport::default();
    let mut rows = Vec::new();

    for result in rdr.deserialize::<RawRow>() {
        report.total_rows += 1;
        match result {
            Ok(row) => rows.push(row),
            Err(e) => {
                report.parse_errors += 1;
                warn!(row = report.total_rows, error = %e, "skipping unreadable row");
            }
        }
    }
    debug!(rows = rows.len(), skipped = report.parse_errors, "input CSV read");
    Ok((rows, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_rows_keyed_by_header() {
        let data = "Year, Output \n2012,10\n2013,\n";
        let (rows, report) = read_rows(data.as_bytes()).unwrap();
        assert_eq!(report, LoadReport { total_rows: 2, parse_errors: 0 });
        assert_eq!(rows[0]["Year"], "2012");
        assert_eq!(rows[0]["Output"], "10");
        assert_eq!(rows[1]["Output"], "");
    }

    #[test]
    fn loads_from_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Year,Value").unwrap();
        writeln!(file, "2020,1.5").unwrap();
        let (rows, _) = load_rows(file.path()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Value"], "1.5");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_rows("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, crate::error::LmdiError::Io(_)));
    }
}
