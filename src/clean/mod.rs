//! The cleaning pipeline and the `clean` command.
//!
//! Stages run in a fixed order over one table: header normalization with
//! duplicate resolution, then dates, channel, active flag and numeric fields.
//! Required columns are checked once headers are settled and before any cell
//! is rewritten, so a schema failure leaves the cells untouched.

pub mod active;
pub mod channel;
pub mod dates;
pub mod numeric;

use std::{collections::BTreeMap, path::Path};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    cli::CleanArgs,
    columns::{self, DuplicateResolution},
    config::CleanConfig,
    data::Value,
    error::CleanError,
    frame::Table,
    io_utils, metrics,
};

use self::channel::ChannelVocabulary;

pub const CHANNEL: &str = "channel";
pub const ACTIVE: &str = "active";
pub const START_DATE: &str = "start_date";
pub const END_DATE: &str = "end_date";
pub const SPEND: &str = "spend";
pub const IMPRESSIONS: &str = "impressions";
pub const CLICKS: &str = "clicks";
pub const CONVERSIONS: &str = "conversions";

pub const REQUIRED_COLUMNS: &[&str] = &[CHANNEL, ACTIVE, START_DATE, END_DATE, SPEND];
pub const COUNT_COLUMNS: &[&str] = &[IMPRESSIONS, CLICKS, CONVERSIONS];

/// What a cleaning run changed, for verification logging.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanSummary {
    pub rows: usize,
    pub columns: usize,
    pub duplicates: Vec<DuplicateResolution>,
    /// Present cells per column that could not be parsed and became missing.
    pub coerced_to_missing: BTreeMap<String, usize>,
    pub unknown_channels: usize,
    pub unrecognized_active_flags: usize,
    pub conversions_filled: usize,
    pub missing_count_columns: Vec<String>,
    /// Missing cells per column after cleaning, in header order.
    pub missing_per_column: Vec<(String, usize)>,
    /// Channel -> row count, after normalization.
    pub channels: BTreeMap<String, usize>,
    pub active_rows: usize,
    pub inactive_rows: usize,
}

/// Cleans `table` in place with the built-in channel vocabulary.
pub fn clean_table(table: &mut Table) -> Result<CleanSummary, CleanError> {
    clean_table_with(table, &ChannelVocabulary::default())
}

pub fn clean_table_with(
    table: &mut Table,
    vocabulary: &ChannelVocabulary,
) -> Result<CleanSummary, CleanError> {
    let mut summary = CleanSummary {
        duplicates: columns::normalize_columns(table),
        ..CleanSummary::default()
    };
    for name in REQUIRED_COLUMNS {
        table.require(name)?;
    }

    for name in [START_DATE, END_DATE] {
        let coerced = dates::normalize_dates(required_mut(table, name)?);
        summary.coerced_to_missing.insert(name.to_string(), coerced);
    }

    summary.unknown_channels =
        channel::normalize_channels(required_mut(table, CHANNEL)?, vocabulary);
    summary.unrecognized_active_flags = active::normalize_active(required_mut(table, ACTIVE)?);
    if summary.unrecognized_active_flags > 0 {
        warn!(
            "{} unrecognized '{ACTIVE}' value(s) defaulted to false",
            summary.unrecognized_active_flags
        );
    }

    let coerced = numeric::normalize_spend(required_mut(table, SPEND)?);
    summary.coerced_to_missing.insert(SPEND.to_string(), coerced);
    for name in COUNT_COLUMNS {
        match table.column_mut(name) {
            Some(cells) => {
                let coerced = numeric::normalize_count(cells);
                summary.coerced_to_missing.insert(name.to_string(), coerced);
            }
            None => {
                warn!("Column '{name}' not present; skipping numeric coercion");
                summary.missing_count_columns.push(name.to_string());
            }
        }
    }
    if let Some(cells) = table.column_mut(CONVERSIONS) {
        summary.conversions_filled = numeric::fill_missing_with_zero(cells);
    }

    for (name, count) in &summary.coerced_to_missing {
        debug!("Coerced {count} unparseable '{name}' value(s) to missing");
    }

    summary.rows = table.row_count();
    summary.columns = table.width();
    for cell in table.require(CHANNEL)? {
        if let Some(name) = cell.as_text() {
            *summary.channels.entry(name.to_string()).or_default() += 1;
        }
    }
    summary.active_rows = table
        .require(ACTIVE)?
        .iter()
        .filter(|cell| cell.as_bool() == Some(true))
        .count();
    summary.inactive_rows = summary.rows - summary.active_rows;
    summary.missing_per_column = table
        .headers()
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.clone(), table.row_count() - table.non_missing_count(idx)))
        .collect();
    Ok(summary)
}

fn required_mut<'a>(table: &'a mut Table, name: &str) -> Result<&'a mut Vec<Value>, CleanError> {
    table.column_mut(name).ok_or_else(|| CleanError::MissingColumn {
        column: name.to_string(),
    })
}

/// Loads, cleans and returns a table from `path`, logging the verification
/// summary.
pub fn load_clean_table(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
    config: &CleanConfig,
) -> Result<(Table, CleanSummary)> {
    let vocabulary = config.vocabulary()?;
    let mut table = io_utils::read_table(path, delimiter, encoding)
        .with_context(|| format!("Reading campaign table from {path:?}"))?;
    info!(
        "Loaded {} row(s) across {} column(s) from {:?}",
        table.row_count(),
        table.width(),
        path
    );
    let summary = clean_table_with(&mut table, &vocabulary)
        .with_context(|| format!("Cleaning campaign table from {path:?}"))?;
    log_summary(&summary);
    Ok((table, summary))
}

fn log_summary(summary: &CleanSummary) {
    info!(
        "Cleaned {} row(s); {} column(s) after resolving {} duplicate header(s)",
        summary.rows,
        summary.columns,
        summary.duplicates.len()
    );
    let missing = summary
        .coerced_to_missing
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(name, count)| format!("{name}={count}"))
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        info!("Unparseable values set to missing: {}", missing.join(", "));
    }
    info!(
        "Missing values per column: {}",
        summary
            .missing_per_column
            .iter()
            .map(|(name, count)| format!("{name}={count}"))
            .collect::<Vec<_>>()
            .join(", ")
    );
    info!(
        "Channels: {}",
        summary
            .channels
            .iter()
            .map(|(name, count)| format!("{name} ({count})"))
            .collect::<Vec<_>>()
            .join(", ")
    );
    info!(
        "Active campaigns: {} active, {} inactive; {} conversion value(s) filled with 0",
        summary.active_rows, summary.inactive_rows, summary.conversions_filled
    );
}

pub fn execute(args: &CleanArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let output_path = args.output.as_deref();
    let output_delimiter =
        io_utils::resolve_output_delimiter(output_path, args.output_delimiter, delimiter);
    let config = CleanConfig::load_or_default(args.config.as_deref())?;
    info!(
        "Cleaning '{}' -> {} (delimiter '{}', output '{}')",
        args.input.display(),
        output_path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "stdout".into()),
        crate::printable_delimiter(delimiter),
        crate::printable_delimiter(output_delimiter)
    );

    let (mut table, _summary) = load_clean_table(&args.input, delimiter, encoding, &config)?;
    if args.derive_metrics {
        metrics::append_metrics(&mut table, config.revenue_per_conversion)?;
        debug!("Appended derived metric columns");
    }

    io_utils::write_table(&table, output_path, output_delimiter, args.boolean_format)
        .with_context(|| format!("Writing cleaned table for {:?}", args.input))?;
    info!(
        "Wrote {} cleaned row(s) to {}",
        table.row_count(),
        output_path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "stdout".into())
    );
    Ok(())
}
