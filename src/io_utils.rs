//! Reading and writing campaign tables.
//!
//! All file I/O flows through this module:
//!
//! - **Delimiter resolution**: extension-based auto-detection (`.csv` → comma,
//!   `.tsv` → tab) with manual override support.
//! - **Encoding**: input decoding via `encoding_rs`, defaulting to UTF-8.
//! - **Loading**: the whole file is read into a [`Table`], null tokens become
//!   missing cells and short rows are padded.
//! - **stdin/stdout**: the `-` path convention routes through standard streams.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow, bail};
use encoding_rs::{Encoding, UTF_8};

use crate::{cli::BooleanFormat, data::Value, frame::Table};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn resolve_output_delimiter(path: Option<&Path>, provided: Option<u8>, fallback: u8) -> u8 {
    if let Some(delim) = provided {
        return delim;
    }
    if let Some(path) = path {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") => return DEFAULT_TSV_DELIMITER,
            Some(ext) if ext.eq_ignore_ascii_case("csv") => return DEFAULT_CSV_DELIMITER,
            _ => {}
        }
    }
    fallback
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    if is_dash(path) {
        Ok(Box::new(std::io::stdin().lock()))
    } else {
        Ok(Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        )))
    }
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

/// Reads a whole delimited table from any reader.
pub fn read_table_from<R>(reader: R, delimiter: u8, encoding: &'static Encoding) -> Result<Table>
where
    R: Read,
{
    let mut reader = open_csv_reader(reader, delimiter);
    let headers = decode_record(&reader.byte_headers()?.clone(), encoding)?;
    let width = headers.len();
    let mut rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        if record.len() > width {
            bail!(
                "Row {} has {} field(s) but the header declares {}",
                row_idx + 2,
                record.len(),
                width
            );
        }
        let decoded = decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {}", row_idx + 2))?;
        rows.push(decoded.iter().map(|cell| Value::from_raw(cell)).collect());
    }
    Ok(Table::from_rows(headers, rows))
}

pub fn read_table(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Table> {
    read_table_from(open_input(path)?, delimiter, encoding)
}

pub fn render_cell(value: &Value, boolean_format: BooleanFormat) -> String {
    match (value, boolean_format) {
        (Value::Boolean(b), BooleanFormat::OneZero) => String::from(if *b { "1" } else { "0" }),
        (other, _) => other.as_display(),
    }
}

/// Writes the table with a header row; `None` or `-` targets stdout.
pub fn write_table(
    table: &Table,
    path: Option<&Path>,
    delimiter: u8,
    boolean_format: BooleanFormat,
) -> Result<()> {
    let sink: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    };
    write_table_to(table, sink, delimiter, boolean_format)
}

pub fn write_table_to<W>(
    table: &Table,
    sink: W,
    delimiter: u8,
    boolean_format: BooleanFormat,
) -> Result<()>
where
    W: Write,
{
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .double_quote(true)
        .from_writer(sink);
    writer
        .write_record(table.headers())
        .context("Writing header row")?;
    for row in 0..table.row_count() {
        let record = (0..table.width())
            .map(|col| render_cell(&table.column_at(col)[row], boolean_format))
            .collect::<Vec<_>>();
        writer
            .write_record(&record)
            .with_context(|| format!("Writing row {}", row + 2))?;
    }
    writer.flush().context("Flushing output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tsv_extension_selects_tab() {
        assert_eq!(resolve_input_delimiter(Path::new("a.tsv"), None), b'\t');
        assert_eq!(resolve_input_delimiter(Path::new("a.csv"), None), b',');
        assert_eq!(resolve_input_delimiter(Path::new("a.tsv"), Some(b';')), b';');
        assert_eq!(resolve_output_delimiter(None, None, b'|'), b'|');
    }

    #[test]
    fn read_table_pads_short_rows_and_marks_nulls() {
        let input = "a,b,c\n1,NA\n,x,y\n";
        let table = read_table_from(input.as_bytes(), b',', UTF_8).unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column("b").unwrap()[0], Value::Missing);
        assert_eq!(table.column("c").unwrap()[0], Value::Missing);
        assert_eq!(table.column("a").unwrap()[1], Value::Missing);
    }

    #[test]
    fn read_table_rejects_long_rows() {
        let input = "a,b\n1,2,3\n";
        let err = read_table_from(input.as_bytes(), b',', UTF_8).unwrap_err();
        assert!(err.to_string().contains("Row 2 has 3 field(s)"));
    }

    #[test]
    fn write_table_honours_boolean_format() {
        let table = Table::from_rows(
            vec!["active".into(), "spend".into()],
            vec![vec![Value::Boolean(true), Value::Number(5.0)]],
        );
        let mut buffer = Vec::new();
        write_table_to(&table, &mut buffer, b',', BooleanFormat::OneZero).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "active,spend\n1,5.0\n");
    }

    #[test]
    fn unknown_encoding_is_rejected() {
        assert!(resolve_encoding(Some("klingon")).is_err());
        assert_eq!(resolve_encoding(None).unwrap(), UTF_8);
    }
}
