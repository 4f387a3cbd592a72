use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use csv::{QuoteStyle, Terminator, Writer, WriterBuilder};

use crate::error::{Result, ScrapeError};
use crate::film::FilmRecord;

pub const HEADER: [&str; 4] = ["id", "name", "year", "letterboxd_url"];

/// CSV writer that quotes every field, ends rows with CRLF and flushes
/// after each row.
///
/// The underlying handle is closed when the sink is dropped.
pub struct CsvSink<W: Write> {
    writer: Writer<W>,
    rows: usize,
}

impl CsvSink<File> {
    /// Create (or truncate) the file at `path`, creating parent directories.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Self::from_writer(File::create(path)?)
    }
}

impl<W: Write> CsvSink<W> {
    /// Wrap a writer and emit the header row.
    pub fn from_writer(inner: W) -> Result<Self> {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .quote_style(QuoteStyle::Always)
            .terminator(Terminator::CRLF)
            .from_writer(inner);
        writer.write_record(HEADER)?;
        writer.flush()?;

        Ok(Self { writer, rows: 0 })
    }

    pub fn write(&mut self, record: &FilmRecord) -> Result<()> {
        self.writer.serialize(record)?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    /// Number of data rows written, header excluded.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| ScrapeError::Io(e.into_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str, year: &str, url: &str) -> FilmRecord {
        FilmRecord {
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            year: Some(year.to_string()),
            letterboxd_url: url.to_string(),
        }
    }

    fn written(sink: CsvSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_header_only() {
        let sink = CsvSink::from_writer(Vec::new()).unwrap();
        assert_eq!(sink.rows(), 0);
        assert_eq!(written(sink), "\"id\",\"name\",\"year\",\"letterboxd_url\"\r\n");
    }

    #[test]
    fn test_every_field_is_quoted() {
        let mut sink = CsvSink::from_writer(Vec::new()).unwrap();
        sink.write(&record("123", "Blade Runner", "1982", "/film/blade-runner/"))
            .unwrap();

        assert_eq!(
            written(sink),
            "\"id\",\"name\",\"year\",\"letterboxd_url\"\r\n\
             \"123\",\"Blade Runner\",\"1982\",\"/film/blade-runner/\"\r\n"
        );
    }

    #[test]
    fn test_missing_fields_are_empty_quoted() {
        let mut sink = CsvSink::from_writer(Vec::new()).unwrap();
        sink.write(&FilmRecord {
            id: None,
            name: Some("Untitled".to_string()),
            year: None,
            letterboxd_url: "/film/untitled/".to_string(),
        })
        .unwrap();

        let out = written(sink);
        assert!(out.ends_with("\"\",\"Untitled\",\"\",\"/film/untitled/\"\r\n"));
    }

    #[test]
    fn test_embedded_quotes_and_commas_round_trip() {
        let mut sink = CsvSink::from_writer(Vec::new()).unwrap();
        sink.write(&record("1", "Crouching Tiger, \"Hidden\" Dragon", "2000", "/film/cthd/"))
            .unwrap();
        let out = written(sink);

        let mut reader = csv::Reader::from_reader(out.as_bytes());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), HEADER);

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][1], "Crouching Tiger, \"Hidden\" Dragon");
    }
}
