use anyhow::Result;
use log::info;

use crate::{clean, cli::PreviewArgs, config::CleanConfig, io_utils, table};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let config = CleanConfig::load_or_default(args.config.as_deref())?;
    let (cleaned, _summary) = clean::load_clean_table(&args.input, delimiter, encoding, &config)?;

    let rows = cleaned.display_rows().take(args.rows).collect::<Vec<_>>();
    table::print_table(cleaned.headers(), &rows);
    info!(
        "Displayed {} of {} cleaned row(s) from {:?}",
        rows.len(),
        cleaned.row_count(),
        args.input
    );
    Ok(())
}
