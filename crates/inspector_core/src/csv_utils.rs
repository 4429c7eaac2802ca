use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use encoding_rs::{Encoding, UTF_8};
use encoding_rs_io::DecodeReaderBytesBuilder;

use crate::errors::InspectorError;

pub const FIXED_FIELDNAMES: [&str; 18] = [
    "Thumbnail",
    "DataSetID",
    "DataSetName",
    "Class",
    "Score",
    "Owner",
    "URL",
    "Type",
    "FormattedDate",
    "RawDate",
    "TriggerDate",
    "TriggerReference",
    "TriggerString",
    "Project",
    "Result",
    "Location",
    "Station",
    "Type",
];

pub const METADATA_COLUMNS: usize = 25;

pub fn header_row() -> Vec<String> {
    FIXED_FIELDNAMES
        .iter()
        .map(|name| name.to_string())
        .chain((0..METADATA_COLUMNS).map(|index| format!("Metadata{index}")))
        .collect()
}

pub fn resolve_encoding(label: &str) -> Result<&'static Encoding, InspectorError> {
    Encoding::for_label(label.as_bytes())
        .ok_or_else(|| InspectorError::Encoding(format!("unsupported encoding: {label}")))
}

/// Report sink. The header goes out before any row, and rows are written
/// at their natural length.
pub struct ReportWriter<W: Write> {
    writer: W,
    encoding: &'static Encoding,
    rows_written: usize,
}

impl ReportWriter<BufWriter<File>> {
    /// Creates (or truncates) the report at `path` and writes the header.
    pub fn create(path: &Path, encoding: &str) -> Result<Self, InspectorError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let encoding = resolve_encoding(encoding)?;
        let file = File::create(path)?;
        Self::new(BufWriter::new(file), encoding)
    }
}

impl<W: Write> ReportWriter<W> {
    pub fn new(writer: W, encoding: &'static Encoding) -> Result<Self, InspectorError> {
        let mut report = Self {
            writer,
            encoding,
            rows_written: 0,
        };
        let header = header_row();
        write_record(&mut report.writer, report.encoding, &header)?;
        Ok(report)
    }

    pub fn write_row(&mut self, row: &[String]) -> Result<(), InspectorError> {
        write_record(&mut self.writer, self.encoding, row)?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Flushes the sink and returns the number of data rows written.
    pub fn finish(mut self) -> Result<usize, InspectorError> {
        self.writer.flush()?;
        Ok(self.rows_written)
    }

    pub fn into_inner(mut self) -> Result<W, InspectorError> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

fn write_record<W: Write>(
    writer: &mut W,
    encoding: &'static Encoding,
    record: &[String],
) -> Result<(), InspectorError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(Vec::new());
    csv_writer.write_record(record)?;
    csv_writer.flush()?;
    let buffer = csv_writer
        .into_inner()
        .map_err(|err| InspectorError::Io(err.into_error()))?;
    if encoding == UTF_8 {
        writer.write_all(&buffer)?;
    } else {
        let utf8 =
            String::from_utf8(buffer).map_err(|err| InspectorError::Encoding(err.to_string()))?;
        let (encoded, _, had_errors) = encoding.encode(&utf8);
        if had_errors {
            return Err(InspectorError::Encoding(format!(
                "row cannot be represented in {}",
                encoding.name()
            )));
        }
        writer.write_all(&encoded)?;
    }
    Ok(())
}

/// Reads a report back, header included, one `Vec` per record.
pub fn read_report(path: &Path, encoding: &str) -> Result<Vec<Vec<String>>, InspectorError> {
    let enc = resolve_encoding(encoding)?;
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(
            DecodeReaderBytesBuilder::new()
                .encoding(Some(enc))
                .build(file),
        );
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}
